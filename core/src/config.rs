use std::{env, fs, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(anyhow!("unsupported database backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub database_backend: DatabaseBackend,
    /// SQLite file, only read when `database_backend` is `sqlite`.
    pub database_path: String,
    pub db_host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_port: u16,
    pub pool_size: u32,
    pub pool_overflow: u32,
    pub pool_timeout_secs: u64,
    pub query_timeout_secs: u64,
    pub conn_retry: u32,
    pub retry_backoff_ms: u64,
    pub breaker_threshold: u32,
    pub breaker_cooldown_secs: u64,
    pub validateuser_url: String,
    pub validateuser_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5002)),
            database_backend: DatabaseBackend::Postgres,
            database_path: "./data/textfile.db".to_owned(),
            db_host: "localhost".to_owned(),
            db_name: "postgres".to_owned(),
            db_user: "postgres".to_owned(),
            db_pass: "postgres".to_owned(),
            db_port: 5432,
            pool_size: 5,
            pool_overflow: 10,
            pool_timeout_secs: 30,
            query_timeout_secs: 30,
            conn_retry: 3,
            retry_backoff_ms: 200,
            breaker_threshold: 3,
            breaker_cooldown_secs: 30,
            validateuser_url: "http://localhost:5000".to_owned(),
            validateuser_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "TEXTFILE_CONFIG_FILE";
    const DEFAULT_CONFIG_FILE: &'static str = "textfile.toml";

    /// Load configuration from defaults layered with an optional config file
    /// and environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path)? {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            config = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;
        }

        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment-style lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("TEXTFILE_BIND_ADDRESS") {
            self.bind_address = parse_var("TEXTFILE_BIND_ADDRESS", &value)?;
        }
        if let Some(value) = lookup("TEXTFILE_DATABASE_BACKEND") {
            self.database_backend = parse_var("TEXTFILE_DATABASE_BACKEND", &value)?;
        }
        if let Some(value) = lookup("TEXTFILE_DATABASE_PATH") {
            self.database_path = value;
        }
        if let Some(value) = lookup("DB_HOST") {
            self.db_host = value;
        }
        if let Some(value) = lookup("DB_NAME") {
            self.db_name = value;
        }
        if let Some(value) = lookup("DB_USER") {
            self.db_user = value;
        }
        if let Some(value) = lookup("DB_PASS") {
            self.db_pass = value;
        }
        if let Some(value) = lookup("DB_PORT") {
            self.db_port = parse_var("DB_PORT", &value)?;
        }
        if let Some(value) = lookup("DB_POOL_SIZE") {
            self.pool_size = parse_var("DB_POOL_SIZE", &value)?;
        }
        if let Some(value) = lookup("DB_POOL_OVERFLOW") {
            self.pool_overflow = parse_var("DB_POOL_OVERFLOW", &value)?;
        }
        if let Some(value) = lookup("DB_POOL_TIMEOUT_SECS") {
            self.pool_timeout_secs = parse_var("DB_POOL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("DB_QUERY_TIMEOUT_SECS") {
            self.query_timeout_secs = parse_var("DB_QUERY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("DB_CONN_RETRY") {
            self.conn_retry = parse_var("DB_CONN_RETRY", &value)?;
        }
        if let Some(value) = lookup("DB_RETRY_BACKOFF_MS") {
            self.retry_backoff_ms = parse_var("DB_RETRY_BACKOFF_MS", &value)?;
        }
        if let Some(value) = lookup("DB_BREAKER_THRESHOLD") {
            self.breaker_threshold = parse_var("DB_BREAKER_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("DB_BREAKER_COOLDOWN_SECS") {
            self.breaker_cooldown_secs = parse_var("DB_BREAKER_COOLDOWN_SECS", &value)?;
        }
        if let Some(value) = lookup("VALIDATEUSER_URL") {
            self.validateuser_url = value;
        }
        if let Some(value) = lookup("VALIDATEUSER_TIMEOUT_SECS") {
            self.validateuser_timeout_secs = parse_var("VALIDATEUSER_TIMEOUT_SECS", &value)?;
        }
        Ok(())
    }

    /// Hard ceiling on open connections: the base size plus the overflow.
    pub fn pool_max_connections(&self) -> u32 {
        self.pool_size.max(1).saturating_add(self.pool_overflow)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }

    pub fn validateuser_timeout(&self) -> Duration {
        Duration::from_secs(self.validateuser_timeout_secs)
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Self::validate_path(path);
        }

        if let Ok(path) = env::var(Self::CONFIG_ENV) {
            return Self::validate_path(PathBuf::from(path));
        }

        let candidate = PathBuf::from(Self::DEFAULT_CONFIG_FILE);
        Ok(candidate.exists().then_some(candidate))
    }

    fn validate_path(path: PathBuf) -> Result<Option<PathBuf>> {
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!(
                "configuration file does not exist: {}",
                path.display()
            ))
        }
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {name}={value:?}: {err}"))
}
