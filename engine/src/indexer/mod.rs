//! Generic projection engines.
//!
//! [`RangeChunkedIndexer`] drives the set-based layers (raw to staging,
//! staging to analytics) one block sub-range per transaction.
//! [`BatchedSetIndexer`] drives the decoded domain layers: it pages source
//! rows in log order, projects each one and bulk inserts in batches.
//!
//! Every target write is insert-or-ignore, so any projector can be re-run
//! over overlapping ranges without duplicating rows.

pub mod batched;
pub mod chunked;

use alloy::primitives::B256;
use indexer_db::EventLogRow;

pub use batched::{BatchedSetIndexer, IndexStats};
pub use chunked::{ChunkStats, RangeChunkedIndexer};

/// A per-row decode and reshape step from an analytics event into a target
/// row. `None` means the row is not one this projection tracks.
pub trait Projection: Send + Sync {
    type Target: Send + Sync;

    fn name(&self) -> &'static str;

    /// Storage-side `topic0` filter, when the projection follows one event.
    fn topic0(&self) -> Option<B256>;

    fn project(&self, row: &EventLogRow) -> Option<Self::Target>;
}
