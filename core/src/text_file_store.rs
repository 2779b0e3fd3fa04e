use std::{future::Future, time::Duration};

use tokio::time::timeout;
use tracing::debug;

use crate::{
    codec::{self, LineRecord},
    config::AppConfig,
    db::{Database, StoreError, text_file_repo::TextFileRepositoryRef},
    ids::DocumentKey,
    retry::RetryPolicy,
};

const MAX_PROBE_WAIT: Duration = Duration::from_secs(5);

/// Read/replace gateway for stored text files.
///
/// Every call is bounded by the query timeout and retried under the
/// configured policy when the failure is transient.
#[derive(Clone)]
pub struct TextFileStore {
    repo: TextFileRepositoryRef,
    retry: RetryPolicy,
    query_timeout: Duration,
    probe_wait: Duration,
}

impl TextFileStore {
    pub fn new(database: &Database, config: &AppConfig) -> Self {
        Self::with_repository(
            database.text_file_repo(),
            RetryPolicy::new(config.conn_retry, config.retry_backoff()),
            config.query_timeout(),
        )
        .with_probe_wait(config.pool_timeout().min(MAX_PROBE_WAIT))
    }

    pub fn with_repository(
        repo: TextFileRepositoryRef,
        retry: RetryPolicy,
        query_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            retry,
            query_timeout,
            probe_wait: MAX_PROBE_WAIT,
        }
    }

    pub fn with_probe_wait(mut self, wait: Duration) -> Self {
        self.probe_wait = wait;
        self
    }

    /// Rows for `key` in line order; empty when nothing was ever stored.
    pub async fn fetch(&self, key: &DocumentKey) -> Result<Vec<LineRecord>, StoreError> {
        let records = self
            .retry
            .run("fetch", || self.bounded(self.repo.fetch_lines(key)))
            .await?;
        debug!(%key, lines = records.len(), "fetched text file");
        Ok(records)
    }

    /// Atomically swaps the stored chunks for `key`. An empty `chunks` clears
    /// the key. Returns the number of rows written.
    pub async fn replace<I, S>(&self, key: &DocumentKey, chunks: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = codec::encode(chunks, key.component_id, &key.file_type);
        self.retry
            .run("replace", || self.bounded(self.repo.replace_lines(key, &records)))
            .await?;
        debug!(%key, lines = records.len(), "replaced text file");
        Ok(records.len())
    }

    /// Single liveness probe, never retried.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.repo.ping(self.probe_wait)).await
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        timeout(self.query_timeout, op)
            .await
            .unwrap_or(Err(StoreError::QueryTimeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseBackend;
    use crate::ids::{ComponentId, FileType};
    use std::collections::HashSet;
    use tempfile::TempDir;

    async fn sqlite_store() -> (TempDir, TextFileStore) {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.database_backend = DatabaseBackend::Sqlite;
        config.database_path = temp_dir
            .path()
            .join("textfile.db")
            .to_string_lossy()
            .into_owned();
        config.pool_size = 4;
        config.pool_overflow = 0;

        let database = Database::connect(&config).await.expect("connect database");
        (temp_dir, TextFileStore::new(&database, &config))
    }

    fn key(component_id: i64, file_type: &str) -> DocumentKey {
        DocumentKey::new(
            ComponentId::new(component_id).unwrap(),
            FileType::new(file_type).unwrap(),
        )
    }

    fn line_numbers(records: &[LineRecord]) -> Vec<i64> {
        records.iter().map(|r| r.line_number).collect()
    }

    #[tokio::test]
    async fn fetch_of_unknown_key_is_empty_and_decodes_to_empty_text() {
        let (_temp_dir, store) = sqlite_store().await;
        let records = store.fetch(&key(1, "readme")).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(codec::decode(&records).unwrap(), "");
    }

    #[tokio::test]
    async fn replace_then_fetch_returns_contiguous_lines_in_input_order() {
        let (_temp_dir, store) = sqlite_store().await;
        let key = key(7, "swagger");
        let chunks = ["b3Blbm", "FwaTog", "My4wLj", "A="];

        let written = store.replace(&key, chunks).await.unwrap();
        assert_eq!(written, 4);

        let records = store.fetch(&key).await.unwrap();
        assert_eq!(line_numbers(&records), vec![1, 2, 3, 4]);
        let stored: Vec<&str> = records.iter().map(|r| r.encoded_line.as_str()).collect();
        assert_eq!(stored, chunks);
        assert_eq!(codec::decode(&records).unwrap(), "openapi: 3.0.0");
    }

    #[tokio::test]
    async fn replace_discards_previous_rows() {
        let (_temp_dir, store) = sqlite_store().await;
        let key = key(3, "readme");
        store.replace(&key, ["a", "b", "c", "d"]).await.unwrap();
        store.replace(&key, ["x", "y"]).await.unwrap();

        let records = store.fetch(&key).await.unwrap();
        assert_eq!(line_numbers(&records), vec![1, 2]);
        assert_eq!(records[0].encoded_line, "x");
    }

    #[tokio::test]
    async fn replace_with_no_chunks_clears_the_key() {
        let (_temp_dir, store) = sqlite_store().await;
        let key = key(3, "readme");
        store.replace(&key, ["YQ=="]).await.unwrap();
        let written = store.replace(&key, Vec::<String>::new()).await.unwrap();

        assert_eq!(written, 0);
        assert!(store.fetch(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_are_isolated_by_component_and_file_type() {
        let (_temp_dir, store) = sqlite_store().await;
        store.replace(&key(1, "readme"), ["a"]).await.unwrap();
        store.replace(&key(1, "swagger"), ["b", "c"]).await.unwrap();
        store.replace(&key(2, "readme"), ["d", "e", "f"]).await.unwrap();

        assert_eq!(store.fetch(&key(1, "readme")).await.unwrap().len(), 1);
        assert_eq!(store.fetch(&key(1, "swagger")).await.unwrap().len(), 2);
        assert_eq!(store.fetch(&key(2, "readme")).await.unwrap().len(), 3);
        assert!(store.fetch(&key(1, "README")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn large_documents_span_multiple_insert_batches() {
        let (_temp_dir, store) = sqlite_store().await;
        let key = key(9, "manifest");
        let chunks: Vec<String> = (0..1_234).map(|_| "QUJD".to_string()).collect();

        store.replace(&key, chunks).await.unwrap();
        let records = store.fetch(&key).await.unwrap();

        assert_eq!(line_numbers(&records), (1..=1_234).collect::<Vec<_>>());
        assert_eq!(codec::decode(&records).unwrap(), "ABC".repeat(1_234));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_replaces_are_never_observed_half_applied() {
        let (_temp_dir, store) = sqlite_store().await;
        let key = key(11, "readme");
        let sizes: Vec<usize> = vec![3, 17, 40, 8, 25, 1, 60];
        store.replace(&key, vec!["QQ==".to_string(); 5]).await.unwrap();

        let mut allowed: HashSet<usize> = sizes.iter().copied().collect();
        allowed.insert(5);

        let mut writers = Vec::new();
        for size in sizes.clone() {
            let store = store.clone();
            let key = key.clone();
            writers.push(tokio::spawn(async move {
                for _ in 0..5 {
                    store
                        .replace(&key, vec!["QQ==".to_string(); size])
                        .await
                        .expect("replace");
                }
            }));
        }

        let reader = {
            let store = store.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let mut observed = Vec::new();
                for _ in 0..50 {
                    let records = store.fetch(&key).await.expect("fetch");
                    let expected: Vec<i64> = (1..=records.len() as i64).collect();
                    assert_eq!(line_numbers(&records), expected);
                    observed.push(records.len());
                    tokio::task::yield_now().await;
                }
                observed
            })
        };

        for writer in writers {
            writer.await.unwrap();
        }
        for count in reader.await.unwrap() {
            assert!(allowed.contains(&count), "observed partial write of {count} rows");
        }

        let final_count = store.fetch(&key).await.unwrap().len();
        assert!(sizes.contains(&final_count));
    }
}
