use std::{sync::Arc, time::Duration};

use sqlx::{Database as SqlxDatabase, Pool, pool::PoolConnection};
use tokio::time::timeout;

use crate::{breaker::CircuitBreaker, db::StoreError};

/// Single entry point for obtaining a pooled connection: the circuit breaker
/// is consulted first, then the pool is given a bounded wait.
pub struct ConnectionGate<DB: SqlxDatabase> {
    pool: Pool<DB>,
    breaker: Arc<CircuitBreaker>,
    acquire_timeout: Duration,
}

impl<DB: SqlxDatabase> ConnectionGate<DB> {
    pub fn new(pool: Pool<DB>, breaker: Arc<CircuitBreaker>, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            breaker,
            acquire_timeout,
        }
    }

    pub async fn acquire(&self) -> Result<PoolConnection<DB>, StoreError> {
        self.acquire_within(self.acquire_timeout).await
    }

    /// Fails fast with `CircuitOpen` while the breaker is open, and with
    /// `AcquireTimeout` when no connection is available within `wait`.
    ///
    /// Cancel-safe: dropping the future before it resolves releases a
    /// half-open trial slot it may hold.
    pub async fn acquire_within(&self, wait: Duration) -> Result<PoolConnection<DB>, StoreError> {
        self.breaker
            .try_acquire()
            .map_err(|open| StoreError::CircuitOpen(open.retry_after))?;
        let attempt = Attempt::new(&self.breaker);

        match timeout(wait, self.pool.acquire()).await {
            Ok(Ok(conn)) => {
                attempt.succeeded();
                Ok(conn)
            }
            Ok(Err(err)) => {
                attempt.failed();
                Err(StoreError::from_sqlx(err))
            }
            Err(_) => {
                attempt.failed();
                Err(StoreError::AcquireTimeout)
            }
        }
    }
}

/// Outcome reporter for one admitted attempt. Dropped unresolved, it hands
/// the trial slot back to the breaker.
struct Attempt<'a> {
    breaker: &'a CircuitBreaker,
    resolved: bool,
}

impl<'a> Attempt<'a> {
    fn new(breaker: &'a CircuitBreaker) -> Self {
        Self {
            breaker,
            resolved: false,
        }
    }

    fn succeeded(mut self) {
        self.resolved = true;
        self.breaker.record_success();
    }

    fn failed(mut self) {
        self.resolved = true;
        self.breaker.record_failure();
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.abandon_trial();
        }
    }
}

impl<DB: SqlxDatabase> Clone for ConnectionGate<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            breaker: self.breaker.clone(),
            acquire_timeout: self.acquire_timeout,
        }
    }
}
