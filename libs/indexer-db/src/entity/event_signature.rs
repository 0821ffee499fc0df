use sqlx::{Executor, Postgres};

/// Static dictionary entry (`analytics.event_signatures`).
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub topic0: Vec<u8>,
    pub event_name: String,
    pub event_signature: String,
}

impl EventSignature {
    /// Bulk insert, ignoring hashes already present.
    pub async fn insert_many<'c, E>(
        signatures: &[EventSignature],
        connection: E,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'c, Database = Postgres>,
    {
        if signatures.is_empty() {
            return Ok(0);
        }

        let mut topics: Vec<&[u8]> = Vec::with_capacity(signatures.len());
        let mut names: Vec<&str> = Vec::with_capacity(signatures.len());
        let mut sigs: Vec<&str> = Vec::with_capacity(signatures.len());

        for signature in signatures {
            topics.push(&signature.topic0);
            names.push(&signature.event_name);
            sigs.push(&signature.event_signature);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO analytics.event_signatures (topic0, event_name, event_signature)
            SELECT * FROM UNNEST($1::bytea[], $2::text[], $3::text[])
            ON CONFLICT (topic0) DO NOTHING
            "#,
        )
        .bind(topics)
        .bind(names)
        .bind(sigs)
        .execute(connection)
        .await?;

        Ok(result.rows_affected())
    }
}
