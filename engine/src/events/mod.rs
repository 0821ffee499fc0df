//! Event decoders for the Uniswap v4 PoolManager
//!
//! - Initialize: pool registry entries
//! - Swap: per-wallet swap projection
//!
//! Both specialize [`abi::AbiEventDecoder`] and return a typed
//! [`DecodedEvent`] variant instead of a field map.

pub mod abi;
pub mod initialize;
pub mod swap;

use alloy::primitives::B256;
use indexer_db::EventLogRow;
use thiserror::Error;

pub use initialize::{InitializeDecoder, PoolInitialized};
pub use swap::{SwapDecoder, SwapEvent};

/// Why a log was not turned into a [`DecodedEvent`]. Never fatal: the
/// indexer drops the row and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeRejection {
    #[error("log has no topic0")]
    MissingTopic0,

    #[error("topic0 belongs to another event")]
    WrongEvent,

    #[error("topic{0} is required but absent")]
    MissingIndexedTopic(usize),

    #[error("topic{0} is not 32 bytes")]
    MalformedTopic(usize),

    #[error("payload does not match the declared types: {0}")]
    Payload(String),

    #[error("mandatory field `{0}` is missing or out of range")]
    MissingField(&'static str),
}

/// Borrowed view of the raw fields of one log.
#[derive(Debug, Clone, Copy)]
pub struct LogView<'a> {
    pub topic0: Option<&'a [u8]>,
    pub topic1: Option<&'a [u8]>,
    pub topic2: Option<&'a [u8]>,
    pub topic3: Option<&'a [u8]>,
    pub data: &'a [u8],
}

impl<'a> From<&'a EventLogRow> for LogView<'a> {
    fn from(row: &'a EventLogRow) -> Self {
        Self {
            topic0: row.topic0.as_deref(),
            topic1: row.topic1.as_deref(),
            topic2: row.topic2.as_deref(),
            topic3: row.topic3.as_deref(),
            data: &row.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    PoolInitialized(PoolInitialized),
    Swap(SwapEvent),
}

pub trait EventDecoder: Send + Sync {
    /// Signature hash, pushed down to storage as a filter.
    fn topic0(&self) -> B256;

    fn decode(&self, log: &LogView<'_>) -> Result<DecodedEvent, DecodeRejection>;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use alloy::primitives::{address, Address, I256, U256};

    pub const POOL_MANAGER_ABI: &str = include_str!("../../../abi/PoolManager.json");

    pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    pub const TOKEN_A: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const TOKEN_B: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const HOOKS: Address = address!("0000000000000000000000000000000000000000");

    pub fn word_u(value: u128) -> [u8; 32] {
        U256::from(value).to_be_bytes()
    }

    /// Two's complement, sign-extended to 32 bytes.
    pub fn word_i(value: i64) -> [u8; 32] {
        I256::try_from(value).unwrap_or_default().to_be_bytes()
    }

    pub fn word_addr(address: Address) -> [u8; 32] {
        address.into_word().0
    }
}
