use sqlx::{Executor, Postgres};

/// Pipeline layers that carry a `(chain_id, block_number)` pair and can
/// therefore bound a block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Raw,
    Staging,
    Analytics,
}

impl Layer {
    pub fn table(&self) -> &'static str {
        match self {
            Layer::Raw => "raw.logs",
            Layer::Staging => "staging.evm_event_logs",
            Layer::Analytics => "analytics.evm_events",
        }
    }

    /// `MIN`/`MAX` of `block_number` for one chain, `None` when the layer
    /// holds no rows for it.
    pub async fn block_bounds<'c, E>(
        &self,
        chain_id: i32,
        connection: E,
    ) -> Result<Option<(i64, i64)>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        // The table name comes from the closed set above, never from input.
        let query = format!(
            "SELECT MIN(block_number), MAX(block_number) FROM {} WHERE chain_id = $1",
            self.table()
        );

        let (min_block, max_block): (Option<i64>, Option<i64>) = sqlx::query_as(&query)
            .bind(chain_id)
            .fetch_one(connection)
            .await?;

        Ok(min_block.zip(max_block))
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
