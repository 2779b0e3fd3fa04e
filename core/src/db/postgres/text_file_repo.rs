use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{
    codec::LineRecord,
    db::{StoreError, gate::ConnectionGate, text_file_repo::TextFileRepository},
    ids::DocumentKey,
};

/// Postgres caps bind parameters at 65535; four per row.
const INSERT_BATCH_ROWS: usize = 1_000;

/// Held until commit or rollback. Under READ COMMITTED a concurrent writer's
/// DELETE cannot see rows committed after its snapshot, so replaces on one key
/// queue here instead of colliding on the primary key.
const LOCK_KEY_SQL: &str =
    "SELECT pg_advisory_xact_lock(hashtextextended($2 || ':' || CAST($1 AS TEXT), 0))";

pub struct PostgresTextFileRepository {
    gate: ConnectionGate<Postgres>,
}

impl PostgresTextFileRepository {
    pub fn new(gate: ConnectionGate<Postgres>) -> Self {
        Self { gate }
    }

    fn map_row(key: &DocumentKey, row: PgRow) -> Result<LineRecord, StoreError> {
        Ok(LineRecord {
            component_id: key.component_id,
            file_type: key.file_type.clone(),
            line_number: row.try_get("lineno").map_err(StoreError::Query)?,
            encoded_line: row.try_get("base64str").map_err(StoreError::Query)?,
        })
    }
}

#[async_trait]
impl TextFileRepository for PostgresTextFileRepository {
    async fn fetch_lines(&self, key: &DocumentKey) -> Result<Vec<LineRecord>, StoreError> {
        let mut conn = self.gate.acquire().await?;
        let rows = sqlx::query(
            "SELECT CAST(lineno AS BIGINT) AS lineno, base64str
             FROM dm.dm_textfile
             WHERE compid = $1 AND filetype = $2
             ORDER BY lineno",
        )
        .bind(key.component_id.get())
        .bind(key.file_type.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(StoreError::from_sqlx)?;

        rows.into_iter()
            .map(|row| Self::map_row(key, row))
            .collect()
    }

    async fn replace_lines(
        &self,
        key: &DocumentKey,
        records: &[LineRecord],
    ) -> Result<(), StoreError> {
        let mut conn = self.gate.acquire().await?;
        let mut tx = conn.begin().await.map_err(StoreError::from_sqlx)?;

        sqlx::query(LOCK_KEY_SQL)
            .bind(key.component_id.get())
            .bind(key.file_type.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        sqlx::query("DELETE FROM dm.dm_textfile WHERE compid = $1 AND filetype = $2")
            .bind(key.component_id.get())
            .bind(key.file_type.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        for batch in records.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO dm.dm_textfile (compid, filetype, lineno, base64str) ",
            );
            builder.push_values(batch, |mut row, record| {
                row.push_bind(record.component_id.get())
                    .push_bind(record.file_type.as_str())
                    .push_bind(record.line_number)
                    .push_bind(record.encoded_line.as_str());
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;
        }

        tx.commit().await.map_err(StoreError::from_sqlx)
    }

    async fn ping(&self, wait: Duration) -> Result<(), StoreError> {
        let mut conn = self.gate.acquire_within(wait).await?;
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&mut *conn)
            .await
            .map(|_| ())
            .map_err(StoreError::from_sqlx)
    }
}
