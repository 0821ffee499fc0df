use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};

pub mod entity;
pub mod layer;

// Re-export commonly used types
pub use entity::{
    EventLogRow, EventPage, EventSignature, EvmEvent, EvmEventLog, Token, UniswapV4Pool, WalletSwap,
};
pub use layer::Layer;

/// Build the connection pool.
///
/// Without an explicit `database_url` the standard libpq `PG*` environment
/// variables are used.
pub async fn initialize_database(
    database_url: Option<&str>,
    max_connections: u32,
) -> Result<Pool<Postgres>, sqlx::Error> {
    let conn = match database_url {
        Some(url) => PgConnectOptions::from_str(url)?,
        None => PgConnectOptions::new(),
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(conn)
        .await?;

    tracing::info!(max_connections, "Connected to Postgres");

    Ok(pool)
}
