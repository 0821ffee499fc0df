//! ERC-20 reference data for tokens referenced by the pool registry.

pub mod erc20;
pub mod resolver;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::error::AppError;

pub use erc20::{Erc20MetadataFetcher, RpcErc20Reader};
pub use resolver::{TokenMetadataResolver, TokenStats};

/// Token metadata; each field is independently absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub name: Option<String>,
}

#[async_trait]
pub trait TokenMetadataFetcher: Send + Sync {
    /// `Err` means nothing could be learned about the token at all; a field
    /// the token simply does not expose is `None` in an `Ok` result.
    async fn fetch(&self, chain_id: i32, token: Address) -> Result<TokenMetadata, AppError>;
}
