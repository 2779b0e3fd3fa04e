use std::time::Duration;

use sqlx::{Error as SqlxError, error::DatabaseError};
use thiserror::Error;

/// Connection-level failures (SQLSTATE class 08) and server shutdown or
/// overload states that clear up on their own.
const POSTGRES_TRANSIENT_CODES: &[&str] = &[
    "57P01", // admin_shutdown
    "57P02", // crash_shutdown
    "57P03", // cannot_connect_now
    "53300", // too_many_connections
    "40001", // serialization_failure
    "40P01", // deadlock_detected
];
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database circuit breaker is open; retry in {}ms", .0.as_millis())]
    CircuitOpen(Duration),
    #[error("timed out acquiring a database connection")]
    AcquireTimeout,
    #[error("timed out waiting for the database")]
    QueryTimeout,
    #[error("database connection failed: {0}")]
    Connection(#[source] SqlxError),
    #[error("database query failed: {0}")]
    Query(#[source] SqlxError),
}

impl StoreError {
    /// Splits sqlx failures into transient connection faults and
    /// everything else.
    pub fn from_sqlx(err: SqlxError) -> Self {
        match &err {
            SqlxError::PoolTimedOut => Self::AcquireTimeout,
            SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::Protocol(_)
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed => Self::Connection(err),
            SqlxError::Database(db_err) if database_error_is_transient(db_err.as_ref()) => {
                Self::Connection(err)
            }
            _ => Self::Query(err),
        }
    }

    /// Whether the caller may retry. Only `Query` faults are final.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Query(_))
    }
}

fn database_error_is_transient(err: &(dyn DatabaseError + 'static)) -> bool {
    let Some(code) = err.code() else {
        return false;
    };
    let code = code.as_ref();

    if code.starts_with("08") || POSTGRES_TRANSIENT_CODES.contains(&code) {
        return true;
    }

    // SQLite reports extended result codes; the primary code is the low byte.
    code.parse::<i64>()
        .map(|extended| matches!(extended & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}
