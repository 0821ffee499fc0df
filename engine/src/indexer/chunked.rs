use crate::{
    block_range::BlockRange,
    error::AppError,
    store::{SetLayer, SetProjectionStore},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub chunks: u64,
    pub inserted: u64,
}

pub struct RangeChunkedIndexer<'a, S: ?Sized> {
    store: &'a S,
    target: SetLayer,
    block_batch_size: u64,
}

impl<'a, S> RangeChunkedIndexer<'a, S>
where
    S: SetProjectionStore + ?Sized,
{
    pub fn new(store: &'a S, target: SetLayer, block_batch_size: u64) -> Result<Self, AppError> {
        if block_batch_size == 0 {
            return Err(AppError::InvalidInput("block_batch_size must be positive".into()));
        }

        Ok(Self {
            store,
            target,
            block_batch_size,
        })
    }

    /// Chunks commit independently. On failure the error propagates and
    /// chunks committed before it stay in place.
    pub async fn index_block_range(&self, chain_id: i32, range: BlockRange) -> Result<ChunkStats, AppError> {
        tracing::info!(
            chain_id,
            %range,
            target = %self.target,
            block_batch_size = self.block_batch_size,
            "Indexing block range"
        );

        let mut stats = ChunkStats::default();

        for chunk in range.chunks(self.block_batch_size) {
            let inserted = self.store.project_range(self.target, chain_id, chunk).await?;

            stats.chunks += 1;
            stats.inserted += inserted;

            tracing::debug!(chain_id, range = %chunk, inserted, "Chunk committed");
        }

        tracing::info!(
            chain_id,
            target = %self.target,
            chunks = stats.chunks,
            inserted = stats.inserted,
            "Finished block range"
        );

        Ok(stats)
    }
}
