use sqlx::{
    types::chrono,
    Executor, Postgres,
};

/// Pool registry entry (`domain.uniswap_v4_pools`), immutable once observed.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct UniswapV4Pool {
    pub chain_id: i32,
    pub pool_id: Vec<u8>,
    pub pool_manager: Vec<u8>,
    pub token0_address: Vec<u8>,
    pub token1_address: Vec<u8>,
    pub fee: Option<i32>,
    pub tick_spacing: Option<i32>,
    pub hooks: Option<Vec<u8>>,
    pub created_block: i64,
    pub created_timestamp: chrono::DateTime<chrono::Utc>,
}

impl UniswapV4Pool {
    /// Bulk insert; pools already registered under `(chain_id, pool_id)`
    /// are ignored.
    pub async fn insert_many<'c, E>(pools: &[UniswapV4Pool], connection: E) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        if pools.is_empty() {
            return Ok(0);
        }

        let mut chain_ids: Vec<i32> = Vec::with_capacity(pools.len());
        let mut pool_ids: Vec<&[u8]> = Vec::with_capacity(pools.len());
        let mut managers: Vec<&[u8]> = Vec::with_capacity(pools.len());
        let mut token0s: Vec<&[u8]> = Vec::with_capacity(pools.len());
        let mut token1s: Vec<&[u8]> = Vec::with_capacity(pools.len());
        let mut fees: Vec<Option<i32>> = Vec::with_capacity(pools.len());
        let mut tick_spacings: Vec<Option<i32>> = Vec::with_capacity(pools.len());
        let mut hooks: Vec<Option<&[u8]>> = Vec::with_capacity(pools.len());
        let mut blocks: Vec<i64> = Vec::with_capacity(pools.len());
        let mut timestamps: Vec<chrono::DateTime<chrono::Utc>> = Vec::with_capacity(pools.len());

        for pool in pools {
            chain_ids.push(pool.chain_id);
            pool_ids.push(&pool.pool_id);
            managers.push(&pool.pool_manager);
            token0s.push(&pool.token0_address);
            token1s.push(&pool.token1_address);
            fees.push(pool.fee);
            tick_spacings.push(pool.tick_spacing);
            hooks.push(pool.hooks.as_deref());
            blocks.push(pool.created_block);
            timestamps.push(pool.created_timestamp);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO domain.uniswap_v4_pools (
                chain_id, pool_id, pool_manager, token0_address, token1_address,
                fee, tick_spacing, hooks, created_block, created_timestamp
            )
            SELECT * FROM UNNEST(
                $1::int4[], $2::bytea[], $3::bytea[], $4::bytea[], $5::bytea[],
                $6::int4[], $7::int4[], $8::bytea[], $9::int8[], $10::timestamptz[]
            )
            ON CONFLICT (chain_id, pool_id) DO NOTHING
            "#,
        )
        .bind(chain_ids)
        .bind(pool_ids)
        .bind(managers)
        .bind(token0s)
        .bind(token1s)
        .bind(fees)
        .bind(tick_spacings)
        .bind(hooks)
        .bind(blocks)
        .bind(timestamps)
        .execute(connection)
        .await?;

        Ok(result.rows_affected())
    }
}
