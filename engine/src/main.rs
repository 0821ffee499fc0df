//! Indexer Engine
//!
//! Projects raw EVM chain data into staging, analytics and Uniswap v4
//! domain tables. Every task is a one-shot run over a block range.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod block_range;
mod cli;
mod config;
mod error;
mod events;
mod indexer;
mod projections;
mod signatures;
mod store;
mod tasks;
mod tokens;

use cli::{Backend, Cli, Command};
use config::Config;
use error::AppError;
use events::{abi::read_abi_file, InitializeDecoder, SwapDecoder};
use signatures::EventSignatureRegistry;
use store::PgStore;
use tokens::{Erc20MetadataFetcher, RpcErc20Reader};

async fn connect_store(backend: Backend, config: &Config) -> Result<PgStore, AppError> {
    match backend {
        Backend::Postgres => {
            let pool =
                indexer_db::initialize_database(config.database_url.as_deref(), config.database_max_connections)
                    .await?;
            tracing::info!("Connected to database");

            Ok(PgStore::new(pool))
        }
    }
}

fn pool_manager_abi(config: &Config) -> Result<String, AppError> {
    let json = read_abi_file(&config.pool_manager_abi_path)?;
    tracing::debug!(path = %config.pool_manager_abi_path.display(), "Loaded PoolManager ABI");

    Ok(json)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indexer_engine=info,indexer_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let backend = cli.command.backend();

    match cli.command {
        Command::Staging(args) => {
            let input = args.validate()?;
            let store = connect_store(backend, &config).await?;
            let stats = tasks::run_staging(&store, &config, input).await?;
            tracing::info!(chunks = stats.chunks, inserted = stats.inserted, "Staging done");
        }
        Command::Analytics(args) => {
            let input = args.validate()?;
            let store = connect_store(backend, &config).await?;
            let stats = tasks::run_analytics(&store, &config, input).await?;
            tracing::info!(chunks = stats.chunks, inserted = stats.inserted, "Analytics done");
        }
        Command::Pools(args) => {
            let input = args.validate()?;
            let decoder = InitializeDecoder::from_abi_json(&pool_manager_abi(&config)?)?;
            let store = connect_store(backend, &config).await?;
            let stats = tasks::run_pools(&store, &config, decoder, input).await?;
            tracing::info!(?stats, "Pools done");
        }
        Command::WalletSwaps(args) => {
            let input = args.validate()?;
            let decoder = SwapDecoder::from_abi_json(&pool_manager_abi(&config)?)?;
            let store = connect_store(backend, &config).await?;
            let stats = tasks::run_wallet_swaps(&store, &config, decoder, input).await?;
            tracing::info!(?stats, "Wallet swaps done");
        }
        Command::Tokens(args) => {
            let (chain_id, limit) = args.validate()?;
            let reader = RpcErc20Reader::connect(config.rpc_url(chain_id)?).await?;
            let store = connect_store(backend, &config).await?;
            let stats = tasks::run_tokens(&store, &config, Erc20MetadataFetcher::new(reader), chain_id, limit).await?;
            tracing::info!(?stats, "Tokens done");
        }
        Command::SeedSignatures(_) => {
            let registry = EventSignatureRegistry::from_abi_json(&pool_manager_abi(&config)?)?;
            let store = connect_store(backend, &config).await?;
            tasks::seed_signatures(&store, &registry).await?;
        }
    }

    Ok(())
}
