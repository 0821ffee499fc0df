use chrono::Utc;
use indexer_db::Token;

use super::{TokenMetadata, TokenMetadataFetcher};
use crate::{error::AppError, store::TokenStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenStats {
    pub candidates: u64,
    pub fetch_errors: u64,
    pub upserted: u64,
    pub batches: u64,
}

/// Fills in metadata for pool tokens that have none, or are missing
/// `symbol` or `decimals`. Fetches run one address at a time.
pub struct TokenMetadataResolver<'a, S: ?Sized, F> {
    store: &'a S,
    fetcher: F,
    batch_size: usize,
}

impl<'a, S, F> TokenMetadataResolver<'a, S, F>
where
    S: TokenStore + ?Sized,
    F: TokenMetadataFetcher,
{
    pub fn new(store: &'a S, fetcher: F, batch_size: usize) -> Result<Self, AppError> {
        if batch_size == 0 {
            return Err(AppError::InvalidInput("batch_size must be positive".into()));
        }

        Ok(Self {
            store,
            fetcher,
            batch_size,
        })
    }

    pub async fn index_tokens(&self, chain_id: i32, limit: Option<usize>) -> Result<TokenStats, AppError> {
        let candidates = self.store.token_candidates(chain_id, limit).await?;
        let total = candidates.len();
        tracing::info!(chain_id, total, "Discovered token candidates for metadata fetch");

        let mut stats = TokenStats {
            candidates: total as u64,
            ..TokenStats::default()
        };

        for (batch_index, batch) in candidates.chunks(self.batch_size).enumerate() {
            // One timestamp identifies every row written by this batch.
            let updated_at = Utc::now();
            let mut tokens = Vec::with_capacity(batch.len());
            let mut fetch_errors = 0;

            for address in batch {
                let metadata = match self.fetcher.fetch(chain_id, *address).await {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        tracing::warn!(chain_id, token = %address, %err, "Token metadata fetch failed");
                        fetch_errors += 1;
                        TokenMetadata::default()
                    }
                };

                tokens.push(Token {
                    chain_id,
                    token_address: address.to_vec(),
                    symbol: metadata.symbol,
                    name: metadata.name,
                    decimals: metadata.decimals.map(i32::from),
                    updated_at,
                });
            }

            let upserted = self.store.upsert_tokens(&tokens).await?;

            stats.fetch_errors += fetch_errors;
            stats.upserted += upserted;
            stats.batches += 1;

            tracing::info!(
                chain_id,
                batch = batch_index + 1,
                processed = (batch_index * self.batch_size + batch.len()).min(total),
                total,
                upserted,
                fetch_errors,
                "Upserted token batch"
            );
        }

        tracing::info!(
            chain_id,
            candidates = stats.candidates,
            upserted = stats.upserted,
            fetch_errors = stats.fetch_errors,
            "Finished token metadata"
        );

        Ok(stats)
    }
}
