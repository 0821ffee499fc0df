use alloy::primitives::Address;
use async_trait::async_trait;
use indexer_db::{
    EventLogRow, EventPage, EventSignature, EvmEvent, EvmEventLog, Layer, Token, UniswapV4Pool,
    WalletSwap,
};
use sqlx::{Pool, Postgres};

use super::{
    BlockBounds, EventSource, PageQuery, ProjectionSink, SetLayer, SetProjectionStore,
    SignatureStore, TokenStore,
};
use crate::{block_range::BlockRange, error::AppError};

/// Postgres adapter. Every write runs in its own transaction, so a failed
/// chunk or batch rolls back alone and earlier commits stay in place.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl BlockBounds for PgStore {
    async fn block_bounds(&self, chain_id: i32, layer: Layer) -> Result<Option<(i64, i64)>, AppError> {
        Ok(layer.block_bounds(chain_id, &self.pool).await?)
    }
}

#[async_trait]
impl SetProjectionStore for PgStore {
    async fn project_range(&self, target: SetLayer, chain_id: i32, range: BlockRange) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = match target {
            SetLayer::Staging => {
                EvmEventLog::project_from_raw(chain_id, range.from_block, range.to_block, &mut *tx).await?
            }
            SetLayer::Analytics => {
                EvmEvent::project_from_staging(chain_id, range.from_block, range.to_block, &mut *tx).await?
            }
        };

        tx.commit().await?;

        Ok(inserted)
    }
}

#[async_trait]
impl EventSource for PgStore {
    async fn select_events(&self, query: &PageQuery) -> Result<Vec<EventLogRow>, AppError> {
        let page = EventPage {
            chain_id: query.chain_id,
            from_block: query.range.from_block,
            to_block: query.range.to_block,
            topic0: query.topic0.as_ref().map(|topic| topic.as_slice()),
            after: query.after,
            limit: to_i64(query.limit),
        };

        Ok(EventLogRow::find_page(&page, &self.pool).await?)
    }
}

#[async_trait]
impl ProjectionSink<UniswapV4Pool> for PgStore {
    async fn insert_ignore(&self, rows: &[UniswapV4Pool]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let inserted = UniswapV4Pool::insert_many(rows, &mut *tx).await?;
        tx.commit().await?;

        Ok(inserted)
    }
}

#[async_trait]
impl ProjectionSink<WalletSwap> for PgStore {
    async fn insert_ignore(&self, rows: &[WalletSwap]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let inserted = WalletSwap::insert_many(rows, &mut *tx).await?;
        tx.commit().await?;

        Ok(inserted)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn token_candidates(&self, chain_id: i32, limit: Option<usize>) -> Result<Vec<Address>, AppError> {
        let rows = Token::find_missing_metadata(chain_id, limit.map(to_i64), &self.pool).await?;

        // The column is BYTEA; anything that is not 20 bytes cannot be a token.
        Ok(rows
            .into_iter()
            .filter(|raw| raw.len() == 20)
            .map(|raw| Address::from_slice(&raw))
            .collect())
    }

    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let upserted = Token::upsert_many(tokens, &mut *tx).await?;
        tx.commit().await?;

        Ok(upserted)
    }
}

#[async_trait]
impl SignatureStore for PgStore {
    async fn insert_signatures(&self, signatures: &[EventSignature]) -> Result<u64, AppError> {
        Ok(EventSignature::insert_many(signatures, &self.pool).await?)
    }
}
