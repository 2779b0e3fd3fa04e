use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{codec::LineRecord, db::StoreError, ids::DocumentKey};

#[async_trait]
pub trait TextFileRepository: Send + Sync {
    /// All rows for `key`, ordered by line number. Empty when the key was
    /// never written.
    async fn fetch_lines(&self, key: &DocumentKey) -> Result<Vec<LineRecord>, StoreError>;

    /// Deletes every row for `key` and inserts `records` in one transaction.
    async fn replace_lines(
        &self,
        key: &DocumentKey,
        records: &[LineRecord],
    ) -> Result<(), StoreError>;

    /// Liveness probe; `wait` bounds connection acquisition.
    async fn ping(&self, wait: Duration) -> Result<(), StoreError>;
}

pub type TextFileRepositoryRef = Arc<dyn TextFileRepository>;
