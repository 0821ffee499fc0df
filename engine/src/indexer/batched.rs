use super::Projection;
use crate::{
    block_range::BlockRange,
    error::AppError,
    store::{EventSource, PageQuery, Positioned, ProjectionSink},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub scanned: u64,
    pub projected: u64,
    pub skipped: u64,
    pub inserted: u64,
    pub batches: u64,
}

pub struct BatchedSetIndexer<'a, S: ?Sized, P> {
    store: &'a S,
    projection: P,
    batch_size: usize,
}

impl<'a, S, P> BatchedSetIndexer<'a, S, P>
where
    P: Projection,
    S: EventSource + ProjectionSink<P::Target> + ?Sized,
{
    pub fn new(store: &'a S, projection: P, batch_size: usize) -> Result<Self, AppError> {
        if batch_size == 0 {
            return Err(AppError::InvalidInput("batch_size must be positive".into()));
        }

        Ok(Self {
            store,
            projection,
            batch_size,
        })
    }

    /// Page through source rows in log order, project each one and flush
    /// every `batch_size` projected rows. Rows the projection declines are
    /// counted as skipped, never treated as errors.
    pub async fn index_block_range(&self, chain_id: i32, range: BlockRange) -> Result<IndexStats, AppError> {
        let name = self.projection.name();
        tracing::info!(chain_id, %range, projection = name, batch_size = self.batch_size, "Indexing block range");

        let mut stats = IndexStats::default();
        let mut buffer: Vec<P::Target> = Vec::with_capacity(self.batch_size);
        let mut query = PageQuery {
            chain_id,
            range,
            topic0: self.projection.topic0(),
            after: None,
            limit: self.batch_size,
        };

        loop {
            let page = self.store.select_events(&query).await?;
            let Some(last) = page.last() else {
                break;
            };
            query.after = Some(last.position());
            let exhausted = page.len() < self.batch_size;

            for row in &page {
                stats.scanned += 1;

                match self.projection.project(row) {
                    Some(target) => {
                        buffer.push(target);
                        stats.projected += 1;
                    }
                    None => stats.skipped += 1,
                }

                if buffer.len() >= self.batch_size {
                    self.flush(&mut buffer, &mut stats).await?;
                }
            }

            if exhausted {
                break;
            }
        }

        self.flush(&mut buffer, &mut stats).await?;

        tracing::info!(
            chain_id,
            projection = name,
            scanned = stats.scanned,
            projected = stats.projected,
            skipped = stats.skipped,
            inserted = stats.inserted,
            batches = stats.batches,
            "Finished block range"
        );

        Ok(stats)
    }

    async fn flush(&self, buffer: &mut Vec<P::Target>, stats: &mut IndexStats) -> Result<(), AppError> {
        if buffer.is_empty() {
            return Ok(());
        }

        let inserted = self.store.insert_ignore(buffer.as_slice()).await?;
        stats.inserted += inserted;
        stats.batches += 1;

        tracing::debug!(
            projection = self.projection.name(),
            rows = buffer.len(),
            inserted,
            "Flushed batch"
        );
        buffer.clear();

        Ok(())
    }
}
