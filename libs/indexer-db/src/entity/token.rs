use sqlx::{types::chrono, Executor, Postgres};

/// Token reference data (`domain.tokens`), keyed by `(chain_id, token_address)`.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Token {
    pub chain_id: i32,
    pub token_address: Vec<u8>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<i32>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Token {
    /// Token addresses referenced by registered pools that have no token row
    /// yet, or whose row is missing `symbol` or `decimals`.
    ///
    /// The zero address (native currency) is never returned. Results are
    /// ordered by address; `limit = None` returns every candidate.
    pub async fn find_missing_metadata<'c, E>(
        chain_id: i32,
        limit: Option<i64>,
        connection: E,
    ) -> Result<Vec<Vec<u8>>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            WITH pool_tokens AS (
                SELECT token0_address AS token_address
                FROM domain.uniswap_v4_pools
                WHERE chain_id = $1
                UNION
                SELECT token1_address AS token_address
                FROM domain.uniswap_v4_pools
                WHERE chain_id = $1
            )
            SELECT p.token_address
            FROM pool_tokens AS p
            LEFT JOIN domain.tokens AS t
              ON t.chain_id = $1
             AND t.token_address = p.token_address
            WHERE p.token_address <> '\x0000000000000000000000000000000000000000'::bytea
              AND (t.token_address IS NULL OR t.symbol IS NULL OR t.decimals IS NULL)
            ORDER BY p.token_address
            LIMIT $2
        "#;

        sqlx::query_scalar(query)
            .bind(chain_id)
            .bind(limit)
            .fetch_all(connection)
            .await
    }

    /// Upsert a batch, overwriting a stored field only with a present value.
    pub async fn upsert_many<'c, E>(tokens: &[Token], connection: E) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        if tokens.is_empty() {
            return Ok(0);
        }

        let mut chain_ids: Vec<i32> = Vec::with_capacity(tokens.len());
        let mut addresses: Vec<&[u8]> = Vec::with_capacity(tokens.len());
        let mut symbols: Vec<Option<&str>> = Vec::with_capacity(tokens.len());
        let mut names: Vec<Option<&str>> = Vec::with_capacity(tokens.len());
        let mut decimals: Vec<Option<i32>> = Vec::with_capacity(tokens.len());
        let mut updated: Vec<chrono::DateTime<chrono::Utc>> = Vec::with_capacity(tokens.len());

        for token in tokens {
            chain_ids.push(token.chain_id);
            addresses.push(&token.token_address);
            symbols.push(token.symbol.as_deref());
            names.push(token.name.as_deref());
            decimals.push(token.decimals);
            updated.push(token.updated_at);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO domain.tokens (chain_id, token_address, symbol, name, decimals, updated_at)
            SELECT * FROM UNNEST(
                $1::int4[], $2::bytea[], $3::text[], $4::text[], $5::int4[], $6::timestamptz[]
            )
            ON CONFLICT (chain_id, token_address) DO UPDATE SET
                symbol = COALESCE(EXCLUDED.symbol, domain.tokens.symbol),
                name = COALESCE(EXCLUDED.name, domain.tokens.name),
                decimals = COALESCE(EXCLUDED.decimals, domain.tokens.decimals),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(chain_ids)
        .bind(addresses)
        .bind(symbols)
        .bind(names)
        .bind(decimals)
        .bind(updated)
        .execute(connection)
        .await?;

        Ok(result.rows_affected())
    }
}
