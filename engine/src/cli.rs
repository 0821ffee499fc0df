use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    block_range::{require_positive_chain_id, BlockSelector, Bound},
    error::AppError,
};

#[derive(Parser, Debug)]
#[command(
    name = "indexer-engine",
    about = "Project raw EVM chain data into staging, analytics and Uniswap v4 domain tables",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// raw.* -> staging.evm_event_logs
    Staging(RangeArgs),
    /// staging.evm_event_logs -> analytics.evm_events
    Analytics(RangeArgs),
    /// analytics.evm_events -> domain.uniswap_v4_pools
    Pools(RangeArgs),
    /// analytics.evm_events -> domain.uniswap_v4_wallet_swaps
    #[command(name = "wallet-swaps")]
    WalletSwaps(RangeArgs),
    /// Fetch ERC-20 metadata for pool tokens into domain.tokens
    Tokens(TokenArgs),
    /// Load PoolManager event signatures into analytics.event_signatures
    #[command(name = "seed-signatures")]
    SeedSignatures(BackendArgs),
}

impl Command {
    /// Storage adapter selected for the task.
    pub fn backend(&self) -> Backend {
        match self {
            Command::Staging(args)
            | Command::Analytics(args)
            | Command::Pools(args)
            | Command::WalletSwaps(args) => args.backend.backend,
            Command::Tokens(args) => args.backend.backend,
            Command::SeedSignatures(args) => args.backend,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Postgres,
}

#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Storage adapter
    #[arg(long, value_enum, default_value_t = Backend::Postgres)]
    pub backend: Backend,
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    #[arg(long)]
    pub chain_id: i64,

    /// Block number, or `earliest`
    #[arg(long, default_value = "earliest")]
    pub from_block: String,

    /// Block number, or `latest`
    #[arg(long, default_value = "latest")]
    pub to_block: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Validated range task inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInput {
    pub chain_id: i32,
    pub from: BlockSelector,
    pub to: BlockSelector,
}

impl RangeArgs {
    pub fn validate(&self) -> Result<RangeInput, AppError> {
        Ok(RangeInput {
            chain_id: require_positive_chain_id(self.chain_id)?,
            from: BlockSelector::parse(&self.from_block, Bound::From)?,
            to: BlockSelector::parse(&self.to_block, Bound::To)?,
        })
    }
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long)]
    pub chain_id: i64,

    /// Maximum number of tokens to fetch
    #[arg(long)]
    pub limit: Option<i64>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

impl TokenArgs {
    pub fn validate(&self) -> Result<(i32, Option<usize>), AppError> {
        let chain_id = require_positive_chain_id(self.chain_id)?;
        let limit = match self.limit {
            None => None,
            Some(limit) => Some(
                usize::try_from(limit)
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| AppError::InvalidInput(format!("limit must be a positive integer, got {limit}")))?,
            ),
        };

        Ok((chain_id, limit))
    }
}
