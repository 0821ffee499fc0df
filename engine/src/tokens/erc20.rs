use alloy::{
    contract,
    primitives::{Address, B256, U256},
    providers::{ProviderBuilder, RootProvider},
    sol,
    transports::BoxTransport,
};
use async_trait::async_trait;

use super::{TokenMetadata, TokenMetadataFetcher};
use crate::error::AppError;

sol! {
    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

sol! {
    // Pre-standard tokens (MKR, SAI, ...) return fixed-size values.
    #[sol(rpc)]
    interface IERC20MetadataBytes32 {
        function name() external view returns (bytes32);
        function symbol() external view returns (bytes32);
        function decimals() external view returns (uint256);
    }
}

/// Raw ERC-20 metadata calls. `Ok(None)` is a contract-level miss (revert,
/// empty or undecodable return data); `Err` is a transport failure.
#[async_trait]
pub trait Erc20Reader: Send + Sync {
    async fn symbol(&self, token: Address) -> Result<Option<String>, AppError>;
    async fn name(&self, token: Address) -> Result<Option<String>, AppError>;
    async fn decimals(&self, token: Address) -> Result<Option<u8>, AppError>;

    async fn symbol_bytes32(&self, token: Address) -> Result<Option<B256>, AppError>;
    async fn name_bytes32(&self, token: Address) -> Result<Option<B256>, AppError>;
    async fn decimals_uint256(&self, token: Address) -> Result<Option<U256>, AppError>;
}

/// Standard ABI first; the legacy encoding only for fields still missing.
/// A failed call only loses its own field. The fetch fails when nothing was
/// learned and at least one call failed at the transport.
pub struct Erc20MetadataFetcher<R> {
    reader: R,
}

impl<R: Erc20Reader> Erc20MetadataFetcher<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: Erc20Reader> TokenMetadataFetcher for Erc20MetadataFetcher<R> {
    async fn fetch(&self, _chain_id: i32, token: Address) -> Result<TokenMetadata, AppError> {
        let mut failure = None;

        let mut symbol = normalize_text(settle(token, "symbol", self.reader.symbol(token).await, &mut failure));
        let mut name = normalize_text(settle(token, "name", self.reader.name(token).await, &mut failure));
        let mut decimals = settle(token, "decimals", self.reader.decimals(token).await, &mut failure);

        if symbol.is_none() {
            symbol = settle(token, "symbol", self.reader.symbol_bytes32(token).await, &mut failure)
                .and_then(bytes32_to_text);
        }
        if name.is_none() {
            name = settle(token, "name", self.reader.name_bytes32(token).await, &mut failure)
                .and_then(bytes32_to_text);
        }
        if decimals.is_none() {
            decimals = settle(token, "decimals", self.reader.decimals_uint256(token).await, &mut failure)
                .and_then(|value| u8::try_from(value).ok());
        }

        let metadata = TokenMetadata {
            symbol,
            decimals,
            name,
        };

        match failure {
            Some(err) if metadata == TokenMetadata::default() => Err(err),
            _ => Ok(metadata),
        }
    }
}

/// Turn a transport failure into a missing field, keeping the first error.
fn settle<T>(
    token: Address,
    call: &'static str,
    result: Result<Option<T>, AppError>,
    failure: &mut Option<AppError>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(%token, call, %err, "Metadata call failed");
            failure.get_or_insert(err);
            None
        }
    }
}

/// Strips NUL padding and whitespace; blank becomes `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Right-padded UTF-8 text; any other content is absent.
pub fn bytes32_to_text(value: B256) -> Option<String> {
    let bytes = value.as_slice();
    let end = bytes.iter().rposition(|byte| *byte != 0).map_or(0, |last| last + 1);
    let text = std::str::from_utf8(&bytes[..end]).ok()?;

    normalize_text(Some(text.to_string()))
}

/// JSON-RPC backed reader for one chain.
pub struct RpcErc20Reader {
    provider: RootProvider<BoxTransport>,
}

impl RpcErc20Reader {
    pub async fn connect(rpc_url: &str) -> Result<Self, AppError> {
        let provider = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .map_err(|err| AppError::RpcError(err.to_string()))?;

        Ok(Self { provider })
    }
}

/// Error responses from the node (reverts included) and ABI decoding
/// failures are per-call misses; only transport failures propagate.
fn classify<T>(result: Result<T, contract::Error>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(contract::Error::TransportError(err)) if err.as_error_resp().is_none() => {
            Err(AppError::RpcError(err.to_string()))
        }
        Err(err) => {
            tracing::trace!(%err, "Metadata call yielded no value");
            Ok(None)
        }
    }
}

#[async_trait]
impl Erc20Reader for RpcErc20Reader {
    async fn symbol(&self, token: Address) -> Result<Option<String>, AppError> {
        let contract = IERC20Metadata::new(token, &self.provider);
        Ok(classify(contract.symbol().call().await)?.map(|ret| ret._0))
    }

    async fn name(&self, token: Address) -> Result<Option<String>, AppError> {
        let contract = IERC20Metadata::new(token, &self.provider);
        Ok(classify(contract.name().call().await)?.map(|ret| ret._0))
    }

    async fn decimals(&self, token: Address) -> Result<Option<u8>, AppError> {
        let contract = IERC20Metadata::new(token, &self.provider);
        Ok(classify(contract.decimals().call().await)?.map(|ret| ret._0))
    }

    async fn symbol_bytes32(&self, token: Address) -> Result<Option<B256>, AppError> {
        let contract = IERC20MetadataBytes32::new(token, &self.provider);
        Ok(classify(contract.symbol().call().await)?.map(|ret| ret._0))
    }

    async fn name_bytes32(&self, token: Address) -> Result<Option<B256>, AppError> {
        let contract = IERC20MetadataBytes32::new(token, &self.provider);
        Ok(classify(contract.name().call().await)?.map(|ret| ret._0))
    }

    async fn decimals_uint256(&self, token: Address) -> Result<Option<U256>, AppError> {
        let contract = IERC20MetadataBytes32::new(token, &self.provider);
        Ok(classify(contract.decimals().call().await)?.map(|ret| ret._0))
    }
}
