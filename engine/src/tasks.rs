//! One function per CLI task: resolve the block range against the source
//! layer, build the indexer, run it once.

use indexer_db::{Layer, UniswapV4Pool, WalletSwap};

use crate::{
    block_range::resolve_block_range,
    cli::RangeInput,
    config::Config,
    error::AppError,
    events::{InitializeDecoder, SwapDecoder},
    indexer::{BatchedSetIndexer, ChunkStats, IndexStats, RangeChunkedIndexer},
    projections::{PoolsProjection, WalletSwapsProjection},
    signatures::EventSignatureRegistry,
    store::{BlockBounds, EventSource, ProjectionSink, SetLayer, SetProjectionStore, SignatureStore, TokenStore},
    tokens::{TokenMetadataFetcher, TokenMetadataResolver, TokenStats},
};

pub async fn run_staging<S>(store: &S, config: &Config, input: RangeInput) -> Result<ChunkStats, AppError>
where
    S: BlockBounds + SetProjectionStore + ?Sized,
{
    let range = resolve_block_range(store, input.chain_id, input.from, input.to, Layer::Raw).await?;

    RangeChunkedIndexer::new(store, SetLayer::Staging, config.staging_block_batch_size)?
        .index_block_range(input.chain_id, range)
        .await
}

pub async fn run_analytics<S>(store: &S, config: &Config, input: RangeInput) -> Result<ChunkStats, AppError>
where
    S: BlockBounds + SetProjectionStore + ?Sized,
{
    let range = resolve_block_range(store, input.chain_id, input.from, input.to, Layer::Staging).await?;

    RangeChunkedIndexer::new(store, SetLayer::Analytics, config.analytics_block_batch_size)?
        .index_block_range(input.chain_id, range)
        .await
}

pub async fn run_pools<S>(
    store: &S,
    config: &Config,
    decoder: InitializeDecoder,
    input: RangeInput,
) -> Result<IndexStats, AppError>
where
    S: BlockBounds + EventSource + ProjectionSink<UniswapV4Pool> + ?Sized,
{
    let range = resolve_block_range(store, input.chain_id, input.from, input.to, Layer::Analytics).await?;

    BatchedSetIndexer::new(store, PoolsProjection::new(decoder), config.projection_batch_size)?
        .index_block_range(input.chain_id, range)
        .await
}

pub async fn run_wallet_swaps<S>(
    store: &S,
    config: &Config,
    decoder: SwapDecoder,
    input: RangeInput,
) -> Result<IndexStats, AppError>
where
    S: BlockBounds + EventSource + ProjectionSink<WalletSwap> + ?Sized,
{
    let range = resolve_block_range(store, input.chain_id, input.from, input.to, Layer::Analytics).await?;

    BatchedSetIndexer::new(store, WalletSwapsProjection::new(decoder), config.projection_batch_size)?
        .index_block_range(input.chain_id, range)
        .await
}

pub async fn run_tokens<S, F>(
    store: &S,
    config: &Config,
    fetcher: F,
    chain_id: i32,
    limit: Option<usize>,
) -> Result<TokenStats, AppError>
where
    S: TokenStore + ?Sized,
    F: TokenMetadataFetcher,
{
    TokenMetadataResolver::new(store, fetcher, config.token_batch_size)?
        .index_tokens(chain_id, limit)
        .await
}

pub async fn seed_signatures<S>(store: &S, registry: &EventSignatureRegistry) -> Result<u64, AppError>
where
    S: SignatureStore + ?Sized,
{
    if registry.is_empty() {
        tracing::warn!("ABI declares no events, nothing to seed");
        return Ok(0);
    }

    let inserted = store.insert_signatures(&registry.to_rows()).await?;
    tracing::info!(known = registry.len(), inserted, "Seeded event signatures");

    Ok(inserted)
}
