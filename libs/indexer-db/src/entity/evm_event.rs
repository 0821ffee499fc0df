use sqlx::{
    types::{chrono, BigDecimal},
    Executor, Postgres,
};

/// Canonical analytics row (`analytics.evm_events`), one per
/// `(chain_id, transaction_hash, log_index)`.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct EvmEvent {
    pub chain_id: i32,
    pub block_number: i64,
    pub transaction_hash: Vec<u8>,
    pub transaction_index: i32,
    pub log_index: i32,
    pub tx_gas_used: Option<i64>,
    pub tx_effective_gas_price: Option<BigDecimal>,
    pub tx_value: BigDecimal,
    pub tx_from_address: Vec<u8>,
    pub tx_to_address: Option<Vec<u8>>,
    pub contract_address: Vec<u8>,
    pub topic0: Option<Vec<u8>>,
    pub topic1: Option<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub topic3: Option<Vec<u8>>,
    pub data: Vec<u8>,
    pub event_name: String,
    pub event_signature: String,
}

/// Analytics event joined with its block timestamp, the source shape for
/// domain projections.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct EventLogRow {
    pub chain_id: i32,
    pub block_number: i64,
    pub block_timestamp: chrono::DateTime<chrono::Utc>,
    pub transaction_hash: Vec<u8>,
    pub transaction_index: i32,
    pub log_index: i32,
    pub tx_from_address: Vec<u8>,
    pub contract_address: Vec<u8>,
    pub event_signature: String,
    pub topic0: Option<Vec<u8>>,
    pub topic1: Option<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub topic3: Option<Vec<u8>>,
    pub data: Vec<u8>,
}

/// Keyset page request over `analytics.evm_events`.
#[derive(Debug, Clone)]
pub struct EventPage<'a> {
    pub chain_id: i32,
    pub from_block: i64,
    pub to_block: i64,
    pub topic0: Option<&'a [u8]>,
    /// Last `(block_number, transaction_index, log_index)` already seen.
    pub after: Option<(i64, i32, i32)>,
    pub limit: i64,
}

impl EvmEvent {
    /// Project staged logs into the analytics layer, resolving event name and
    /// signature through `analytics.event_signatures`.
    ///
    /// Unknown hashes get `event_name = 'unknown'` and the `0x`-prefixed hex
    /// of `topic0`; anonymous logs get `'unknown'` for both.
    pub async fn project_from_staging<'c, E>(
        chain_id: i32,
        from_block: i64,
        to_block: i64,
        connection: E,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO analytics.evm_events (
                chain_id, block_number, transaction_hash, transaction_index, log_index,
                tx_gas_used, tx_effective_gas_price, tx_value,
                tx_from_address, tx_to_address, contract_address,
                topic0, topic1, topic2, topic3, data,
                event_name, event_signature
            )
            SELECT
                l.chain_id,
                l.block_number,
                l.transaction_hash,
                l.transaction_index,
                l.log_index,
                l.tx_gas_used,
                l.tx_effective_gas_price,
                l.tx_value,
                l.tx_from,
                l.tx_to,
                l.address,
                l.topic0,
                l.topic1,
                l.topic2,
                l.topic3,
                l.data,
                COALESCE(es.event_name, 'unknown'),
                COALESCE(
                    es.event_signature,
                    CASE
                        WHEN l.topic0 IS NULL THEN 'unknown'
                        ELSE '0x' || encode(l.topic0, 'hex')
                    END
                )
            FROM staging.evm_event_logs AS l
            LEFT JOIN analytics.event_signatures AS es
              ON es.topic0 = l.topic0
            WHERE l.chain_id = $1
              AND l.block_number BETWEEN $2 AND $3
            ON CONFLICT (chain_id, transaction_hash, log_index) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(chain_id)
            .bind(from_block)
            .bind(to_block)
            .execute(connection)
            .await?;

        Ok(result.rows_affected())
    }
}

impl EventLogRow {
    /// Fetch one page of analytics events that have a block row, ordered by
    /// `(block_number, transaction_index, log_index)`.
    pub async fn find_page<'c, E>(
        page: &EventPage<'_>,
        connection: E,
    ) -> Result<Vec<EventLogRow>, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            SELECT
                e.chain_id,
                e.block_number,
                b.timestamp AS block_timestamp,
                e.transaction_hash,
                e.transaction_index,
                e.log_index,
                e.tx_from_address,
                e.contract_address,
                e.event_signature,
                e.topic0,
                e.topic1,
                e.topic2,
                e.topic3,
                e.data
            FROM analytics.evm_events AS e
            JOIN analytics.blocks AS b
              ON b.chain_id = e.chain_id
             AND b.block_number = e.block_number
            WHERE e.chain_id = $1
              AND e.block_number BETWEEN $2 AND $3
              AND ($4::bytea IS NULL OR e.topic0 = $4::bytea)
              AND (
                    $5::bigint IS NULL
                    OR (e.block_number, e.transaction_index, e.log_index) > ($5::bigint, $6::int, $7::int)
                  )
            ORDER BY e.block_number, e.transaction_index, e.log_index
            LIMIT $8
        "#;

        let (after_block, after_tx, after_log) = match page.after {
            Some((block, tx, log)) => (Some(block), Some(tx), Some(log)),
            None => (None, None, None),
        };

        sqlx::query_as::<_, EventLogRow>(query)
            .bind(page.chain_id)
            .bind(page.from_block)
            .bind(page.to_block)
            .bind(page.topic0)
            .bind(after_block)
            .bind(after_tx)
            .bind(after_log)
            .bind(page.limit)
            .fetch_all(connection)
            .await
    }
}
