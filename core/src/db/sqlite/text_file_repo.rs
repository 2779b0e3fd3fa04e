use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    codec::LineRecord,
    db::{StoreError, gate::ConnectionGate, text_file_repo::TextFileRepository},
    ids::DocumentKey,
};

const INSERT_BATCH_ROWS: usize = 500;

pub struct SqliteTextFileRepository {
    gate: ConnectionGate<Sqlite>,
}

impl SqliteTextFileRepository {
    pub fn new(gate: ConnectionGate<Sqlite>) -> Self {
        Self { gate }
    }

    fn map_row(key: &DocumentKey, row: SqliteRow) -> Result<LineRecord, StoreError> {
        Ok(LineRecord {
            component_id: key.component_id,
            file_type: key.file_type.clone(),
            line_number: row.try_get("lineno").map_err(StoreError::Query)?,
            encoded_line: row.try_get("base64str").map_err(StoreError::Query)?,
        })
    }
}

#[async_trait]
impl TextFileRepository for SqliteTextFileRepository {
    async fn fetch_lines(&self, key: &DocumentKey) -> Result<Vec<LineRecord>, StoreError> {
        let mut conn = self.gate.acquire().await?;
        let rows = sqlx::query(
            "SELECT lineno, base64str
             FROM dm_textfile
             WHERE compid = ? AND filetype = ?
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

        // Writing first makes SQLite take the write lock through the busy
        // handler rather than upgrading a stale read snapshot.
        sqlx::query("DELETE FROM dm_textfile WHERE compid = ? AND filetype = ?")
            .bind(key.component_id.get())
            .bind(key.file_type.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        for batch in records.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("INSERT INTO dm_textfile (compid, filetype, lineno, base64str) ");
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
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&mut *conn)
            .await
            .map(|_| ())
            .map_err(StoreError::from_sqlx)
    }
}
