use std::{collections::HashMap, env, path::PathBuf, str::FromStr};

use crate::error::AppError;

mod defaults {
    pub const DATABASE_MAX_CONNECTIONS: &str = "5";
    pub const POOL_MANAGER_ABI_PATH: &str = "abi/PoolManager.json";
    pub const STAGING_BLOCK_BATCH_SIZE: &str = "10000";
    pub const ANALYTICS_BLOCK_BATCH_SIZE: &str = "10000";
    pub const PROJECTION_BATCH_SIZE: &str = "10000";
    pub const TOKEN_BATCH_SIZE: &str = "500";
}

const RPC_URL: &str = "RPC_URL";

/// Process configuration, read once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub pool_manager_abi_path: PathBuf,
    pub staging_block_batch_size: u64,
    pub analytics_block_batch_size: u64,
    pub projection_batch_size: usize,
    pub token_batch_size: usize,
    rpc_urls: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let lookup = |name: &str, default: &str| -> String {
            vars.get(name).cloned().unwrap_or_else(|| default.to_string())
        };

        let rpc_urls = vars
            .iter()
            .filter(|(name, _)| name.starts_with(RPC_URL))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            database_url: vars.get("DATABASE_URL").filter(|url| !url.is_empty()).cloned(),
            database_max_connections: parse_positive(
                "DATABASE_MAX_CONNECTIONS",
                &lookup("DATABASE_MAX_CONNECTIONS", defaults::DATABASE_MAX_CONNECTIONS),
            )?,
            pool_manager_abi_path: PathBuf::from(lookup(
                "POOL_MANAGER_ABI_PATH",
                defaults::POOL_MANAGER_ABI_PATH,
            )),
            staging_block_batch_size: parse_positive(
                "STAGING_BLOCK_BATCH_SIZE",
                &lookup("STAGING_BLOCK_BATCH_SIZE", defaults::STAGING_BLOCK_BATCH_SIZE),
            )?,
            analytics_block_batch_size: parse_positive(
                "ANALYTICS_BLOCK_BATCH_SIZE",
                &lookup("ANALYTICS_BLOCK_BATCH_SIZE", defaults::ANALYTICS_BLOCK_BATCH_SIZE),
            )?,
            projection_batch_size: parse_positive(
                "PROJECTION_BATCH_SIZE",
                &lookup("PROJECTION_BATCH_SIZE", defaults::PROJECTION_BATCH_SIZE),
            )?,
            token_batch_size: parse_positive(
                "TOKEN_BATCH_SIZE",
                &lookup("TOKEN_BATCH_SIZE", defaults::TOKEN_BATCH_SIZE),
            )?,
            rpc_urls,
        })
    }

    /// `RPC_URL_<chain_id>` first, then the chain-agnostic `RPC_URL`.
    pub fn rpc_url(&self, chain_id: i32) -> Result<&str, AppError> {
        let chain_key = format!("{RPC_URL}_{chain_id}");

        self.rpc_urls
            .get(&chain_key)
            .or_else(|| self.rpc_urls.get(RPC_URL))
            .map(String::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(AppError::MissingEnvVar(chain_key))
    }
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
        .ok_or_else(|| AppError::Config {
            name: name.to_string(),
            value: raw.to_string(),
        })
}
