//! Domain projections from analytics events.

pub mod pools;
pub mod wallet_swaps;

use std::{fmt::Display, str::FromStr};

use sqlx::types::BigDecimal;

pub use pools::PoolsProjection;
pub use wallet_swaps::WalletSwapsProjection;

/// NUMERIC column value for a 256-bit integer.
fn to_numeric(value: impl Display) -> Option<BigDecimal> {
    BigDecimal::from_str(&value.to_string()).ok()
}
