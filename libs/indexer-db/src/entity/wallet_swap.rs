use sqlx::{
    types::{chrono, BigDecimal},
    Executor, Postgres,
};

/// Per-wallet swap projection (`domain.uniswap_v4_wallet_swaps`).
///
/// `wallet_address` is the top-level transaction sender, an approximation
/// of the swap initiator for router and multicall transactions.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct WalletSwap {
    pub chain_id: i32,
    pub block_number: i64,
    pub block_timestamp: chrono::DateTime<chrono::Utc>,
    pub transaction_hash: Vec<u8>,
    pub transaction_index: i32,
    pub log_index: i32,
    pub wallet_address: Vec<u8>,
    pub pool_manager: Vec<u8>,
    pub pool_id: Vec<u8>,
    pub sender: Option<Vec<u8>>,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub sqrt_price_x96: Option<BigDecimal>,
    pub liquidity: Option<BigDecimal>,
    pub tick: Option<i32>,
    pub event_signature: Option<String>,
}

impl WalletSwap {
    /// Bulk insert keyed by `(chain_id, transaction_hash, log_index)`;
    /// duplicates are ignored.
    pub async fn insert_many<'c, E>(swaps: &[WalletSwap], connection: E) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        if swaps.is_empty() {
            return Ok(0);
        }

        let len = swaps.len();
        let mut chain_ids: Vec<i32> = Vec::with_capacity(len);
        let mut block_numbers: Vec<i64> = Vec::with_capacity(len);
        let mut block_timestamps: Vec<chrono::DateTime<chrono::Utc>> = Vec::with_capacity(len);
        let mut tx_hashes: Vec<&[u8]> = Vec::with_capacity(len);
        let mut tx_indexes: Vec<i32> = Vec::with_capacity(len);
        let mut log_indexes: Vec<i32> = Vec::with_capacity(len);
        let mut wallets: Vec<&[u8]> = Vec::with_capacity(len);
        let mut managers: Vec<&[u8]> = Vec::with_capacity(len);
        let mut pool_ids: Vec<&[u8]> = Vec::with_capacity(len);
        let mut senders: Vec<Option<&[u8]>> = Vec::with_capacity(len);
        let mut amount0s: Vec<BigDecimal> = Vec::with_capacity(len);
        let mut amount1s: Vec<BigDecimal> = Vec::with_capacity(len);
        let mut sqrt_prices: Vec<Option<BigDecimal>> = Vec::with_capacity(len);
        let mut liquidities: Vec<Option<BigDecimal>> = Vec::with_capacity(len);
        let mut ticks: Vec<Option<i32>> = Vec::with_capacity(len);
        let mut signatures: Vec<Option<&str>> = Vec::with_capacity(len);

        for swap in swaps {
            chain_ids.push(swap.chain_id);
            block_numbers.push(swap.block_number);
            block_timestamps.push(swap.block_timestamp);
            tx_hashes.push(&swap.transaction_hash);
            tx_indexes.push(swap.transaction_index);
            log_indexes.push(swap.log_index);
            wallets.push(&swap.wallet_address);
            managers.push(&swap.pool_manager);
            pool_ids.push(&swap.pool_id);
            senders.push(swap.sender.as_deref());
            amount0s.push(swap.amount0.clone());
            amount1s.push(swap.amount1.clone());
            sqrt_prices.push(swap.sqrt_price_x96.clone());
            liquidities.push(swap.liquidity.clone());
            ticks.push(swap.tick);
            signatures.push(swap.event_signature.as_deref());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO domain.uniswap_v4_wallet_swaps (
                chain_id, block_number, block_timestamp, transaction_hash,
                transaction_index, log_index, wallet_address, pool_manager,
                pool_id, sender, amount0, amount1,
                sqrt_price_x96, liquidity, tick, event_signature
            )
            SELECT * FROM UNNEST(
                $1::int4[], $2::int8[], $3::timestamptz[], $4::bytea[],
                $5::int4[], $6::int4[], $7::bytea[], $8::bytea[],
                $9::bytea[], $10::bytea[], $11::numeric[], $12::numeric[],
                $13::numeric[], $14::numeric[], $15::int4[], $16::text[]
            )
            ON CONFLICT (chain_id, transaction_hash, log_index) DO NOTHING
            "#,
        )
        .bind(chain_ids)
        .bind(block_numbers)
        .bind(block_timestamps)
        .bind(tx_hashes)
        .bind(tx_indexes)
        .bind(log_indexes)
        .bind(wallets)
        .bind(managers)
        .bind(pool_ids)
        .bind(senders)
        .bind(amount0s)
        .bind(amount1s)
        .bind(sqrt_prices)
        .bind(liquidities)
        .bind(ticks)
        .bind(signatures)
        .execute(connection)
        .await?;

        Ok(result.rows_affected())
    }
}
