//! Storage ports.
//!
//! Indexers and tasks only see these traits. `PgStore` backs them with
//! Postgres; tests use the in-memory adapter.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use indexer_db::{EventLogRow, EventSignature, Layer, Token};

use crate::{block_range::BlockRange, error::AppError};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// `(block_number, transaction_index, log_index)`, the deterministic order of
/// every source query and the keyset cursor for paging.
pub type LogPosition = (i64, i32, i32);

pub trait Positioned {
    fn position(&self) -> LogPosition;
}

impl Positioned for EventLogRow {
    fn position(&self) -> LogPosition {
        (self.block_number, self.transaction_index, self.log_index)
    }
}

/// Layers filled by a set-based `INSERT ... SELECT` from the layer below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLayer {
    /// `raw.*` into `staging.evm_event_logs`.
    Staging,
    /// `staging.evm_event_logs` into `analytics.evm_events`.
    Analytics,
}

impl std::fmt::Display for SetLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetLayer::Staging => f.write_str("staging.evm_event_logs"),
            SetLayer::Analytics => f.write_str("analytics.evm_events"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageQuery {
    pub chain_id: i32,
    pub range: BlockRange,
    pub topic0: Option<B256>,
    pub after: Option<LogPosition>,
    pub limit: usize,
}

#[async_trait]
pub trait BlockBounds: Send + Sync {
    async fn block_bounds(&self, chain_id: i32, layer: Layer) -> Result<Option<(i64, i64)>, AppError>;
}

#[async_trait]
pub trait SetProjectionStore: Send + Sync {
    /// Project one block range into `target` inside a single transaction.
    /// Returns the number of newly inserted rows.
    async fn project_range(&self, target: SetLayer, chain_id: i32, range: BlockRange) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Analytics events with a known block timestamp, ordered by
    /// [`LogPosition`] and strictly after `query.after`.
    async fn select_events(&self, query: &PageQuery) -> Result<Vec<EventLogRow>, AppError>;
}

#[async_trait]
pub trait ProjectionSink<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Insert-or-ignore on the target's unique key, one transaction per call.
    async fn insert_ignore(&self, rows: &[T]) -> Result<u64, AppError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn token_candidates(&self, chain_id: i32, limit: Option<usize>) -> Result<Vec<Address>, AppError>;

    /// Merge upsert: stored fields are only replaced by present values.
    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<u64, AppError>;
}

#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn insert_signatures(&self, signatures: &[EventSignature]) -> Result<u64, AppError>;
}
