use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

use crate::config::AppConfig;

pub type SqlitePool = Pool<Sqlite>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS dm_textfile (
    compid INTEGER NOT NULL,
    filetype TEXT NOT NULL,
    lineno INTEGER NOT NULL,
    base64str TEXT NOT NULL,
    PRIMARY KEY (compid, filetype, lineno)
)";

pub async fn create_pool(path: &Path, config: &AppConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(config.pool_max_connections())
        .acquire_timeout(config.pool_timeout())
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database: {}", path.display()))
}

/// The local backend owns its table; the Postgres table is provisioned
/// externally.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .context("failed to create dm_textfile table")?;
    Ok(())
}
