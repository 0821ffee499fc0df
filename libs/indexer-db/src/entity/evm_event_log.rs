use sqlx::{types::BigDecimal, Executor, Postgres};

/// One log joined with its transaction and receipt context
/// (`staging.evm_event_logs`).
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct EvmEventLog {
    pub chain_id: i32,
    pub block_number: i64,
    pub transaction_hash: Vec<u8>,
    pub transaction_index: i32,
    pub log_index: i32,
    pub tx_from: Vec<u8>,
    pub tx_to: Option<Vec<u8>>,
    pub tx_value: BigDecimal,
    pub tx_type: Option<i16>,
    pub tx_status: Option<i16>,
    pub tx_gas_used: Option<i64>,
    pub tx_cumulative_gas_used: Option<i64>,
    pub tx_effective_gas_price: Option<BigDecimal>,
    pub address: Vec<u8>,
    pub topic0: Option<Vec<u8>>,
    pub topic1: Option<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub topic3: Option<Vec<u8>>,
    pub data: Vec<u8>,
}

impl EvmEventLog {
    /// Project `raw.logs` joined with `raw.transactions` and `raw.receipts`
    /// into the staging layer for one inclusive block range.
    ///
    /// Rows already present under `(chain_id, block_number, log_index)` are
    /// left untouched. Returns the number of rows actually inserted.
    pub async fn project_from_raw<'c, E>(
        chain_id: i32,
        from_block: i64,
        to_block: i64,
        connection: E,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO staging.evm_event_logs (
                chain_id, block_number, transaction_hash, transaction_index, log_index,
                tx_from, tx_to, tx_value, tx_type, tx_status,
                tx_gas_used, tx_cumulative_gas_used, tx_effective_gas_price,
                address, topic0, topic1, topic2, topic3, data
            )
            SELECT
                l.chain_id,
                l.block_number,
                l.transaction_hash,
                t.transaction_index,
                l.log_index,
                t."from",
                t."to",
                t.value,
                t."type",
                r.status,
                r.gas_used,
                r.cumulative_gas_used,
                r.effective_gas_price,
                l.address,
                l.topic0,
                l.topic1,
                l.topic2,
                l.topic3,
                l.data
            FROM raw.logs AS l
            JOIN raw.transactions AS t
              ON t.chain_id = l.chain_id
             AND t.hash = l.transaction_hash
            JOIN raw.receipts AS r
              ON r.chain_id = l.chain_id
             AND r.transaction_hash = l.transaction_hash
            WHERE l.chain_id = $1
              AND l.block_number BETWEEN $2 AND $3
            ON CONFLICT (chain_id, block_number, log_index) DO NOTHING
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
