use std::time::Duration;

use sqlx::{
    Pool, Postgres,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::config::AppConfig;

pub type PostgresPool = Pool<Postgres>;

const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

pub fn connect_options(config: &AppConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .username(&config.db_user)
        .password(&config.db_pass)
        .database(&config.db_name)
        .application_name("ortelius-ms-textfile-crud")
}

/// Builds the pool without opening a connection, so the service can start
/// (and report DOWN) while the database is unreachable.
///
/// `pool_size` connections are kept warm; up to `pool_overflow` more are
/// opened under load and reaped once idle.
pub fn create_pool(config: &AppConfig) -> PostgresPool {
    PgPoolOptions::new()
        .min_connections(config.pool_size)
        .max_connections(config.pool_max_connections())
        .acquire_timeout(config.pool_timeout())
        .idle_timeout(IDLE_TIMEOUT)
        .test_before_acquire(true)
        .connect_lazy_with(connect_options(config))
}
