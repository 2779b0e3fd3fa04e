use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tracing::info;

use self::{
    gate::ConnectionGate,
    postgres::{connection as postgres_connection, text_file_repo::PostgresTextFileRepository},
    sqlite::{connection as sqlite_connection, text_file_repo::SqliteTextFileRepository},
    text_file_repo::TextFileRepositoryRef,
};
use crate::{
    breaker::{CircuitBreaker, CircuitBreakerConfig},
    config::{AppConfig, DatabaseBackend},
};

pub mod errors;
pub mod gate;
pub mod postgres;
pub mod sqlite;
pub mod text_file_repo;

pub use errors::StoreError;

#[derive(Clone)]
enum DatabasePool {
    Sqlite(sqlite_connection::SqlitePool),
    Postgres(postgres_connection::PostgresPool),
}

/// Owns the connection pool and the repository built on top of it.
#[derive(Clone)]
pub struct Database {
    pool: DatabasePool,
    text_file_repo: TextFileRepositoryRef,
    breaker: Arc<CircuitBreaker>,
}

impl Database {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.breaker_threshold,
            cooldown: config.breaker_cooldown(),
        }));

        match config.database_backend {
            DatabaseBackend::Sqlite => Self::connect_sqlite(config, breaker).await,
            DatabaseBackend::Postgres => Ok(Self::connect_postgres(config, breaker)),
        }
    }

    async fn connect_sqlite(config: &AppConfig, breaker: Arc<CircuitBreaker>) -> Result<Self> {
        let path = Self::resolve_db_path(&config.database_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory: {}", parent.display())
            })?;
        }

        let pool = sqlite_connection::create_pool(&path, config).await?;
        sqlite_connection::ensure_schema(&pool).await?;
        info!(database_path = %path.display(), "using sqlite text file store");

        let gate = ConnectionGate::new(pool.clone(), breaker.clone(), config.pool_timeout());
        Ok(Self {
            pool: DatabasePool::Sqlite(pool),
            text_file_repo: Arc::new(SqliteTextFileRepository::new(gate)),
            breaker,
        })
    }

    fn connect_postgres(config: &AppConfig, breaker: Arc<CircuitBreaker>) -> Self {
        let pool = postgres_connection::create_pool(config);
        info!(
            db_host = %config.db_host,
            db_port = config.db_port,
            db_name = %config.db_name,
            pool_size = config.pool_size,
            pool_overflow = config.pool_overflow,
            "using postgres text file store"
        );

        let gate = ConnectionGate::new(pool.clone(), breaker.clone(), config.pool_timeout());
        Self {
            pool: DatabasePool::Postgres(pool),
            text_file_repo: Arc::new(PostgresTextFileRepository::new(gate)),
            breaker,
        }
    }

    pub fn text_file_repo(&self) -> TextFileRepositoryRef {
        self.text_file_repo.clone()
    }

    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.clone()
    }

    pub fn backend(&self) -> DatabaseBackend {
        match self.pool {
            DatabasePool::Sqlite(_) => DatabaseBackend::Sqlite,
            DatabasePool::Postgres(_) => DatabaseBackend::Postgres,
        }
    }

    pub async fn close(&self) {
        match &self.pool {
            DatabasePool::Sqlite(pool) => pool.close().await,
            DatabasePool::Postgres(pool) => pool.close().await,
        }
    }

    fn resolve_db_path(path: &str) -> Result<PathBuf> {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            let cwd = std::env::current_dir().context("failed to obtain current directory")?;
            Ok(cwd.join(path))
        }
    }
}
