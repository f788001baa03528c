//! A fixed-size, health-checked connection pool with bounded overflow.
//!
//! Mirrors the collaborator's own pool: `pool_size` connections are kept
//! warm; up to `max_overflow` extra connections may be opened under load
//! and are closed (not returned) once released; acquisition blocks up to
//! `pool_timeout`; connections older than `pool_recycle` are replaced on
//! their next acquisition rather than handed out stale.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::client::BrokerClient;
use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};

struct Slot {
    client: BrokerClient,
    created_at: Instant,
    use_count: u64,
}

impl Slot {
    fn should_recycle(&self, max_age: std::time::Duration) -> bool {
        self.created_at.elapsed() > max_age
    }
}

#[derive(Default)]
struct PoolCounters {
    created: AtomicU64,
    reused: AtomicU64,
    recycled: AtomicU64,
    health_check_failures: AtomicU64,
}

/// A point-in-time snapshot of pool activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Connections currently idle and available for immediate acquisition.
    pub available: usize,
    /// Total connections opened since the pool was created.
    pub total_created: u64,
    /// Total successful acquisitions (idle reuse, overflow, or fresh).
    pub total_reused: u64,
    /// Connections replaced for exceeding `pool_recycle`.
    pub total_recycled: u64,
    /// Idle connections found unhealthy and replaced on acquisition.
    pub health_checks_failed: u64,
}

/// A bounded pool of [`BrokerClient`] sessions.
pub struct BrokerPool {
    config: BrokerConfig,
    semaphore: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Slot>>>,
    counters: Arc<PoolCounters>,
}

impl BrokerPool {
    /// Creates the pool and eagerly opens up to `config.pool_size`
    /// connections. If some of those initial connections fail, the pool
    /// continues with fewer than `pool_size` warm connections rather than
    /// failing outright — matching the collaborator's own best-effort
    /// initialization.
    pub async fn new(config: BrokerConfig) -> Result<Self> {
        let total_permits = config.pool_size + config.pool_max_overflow;
        let pool = Self {
            semaphore: Arc::new(Semaphore::new(total_permits)),
            idle: Arc::new(Mutex::new(Vec::with_capacity(config.pool_size))),
            counters: Arc::new(PoolCounters::default()),
            config,
        };
        pool.fill_initial().await;
        info!(
            pool_size = pool.config.pool_size,
            max_overflow = pool.config.pool_max_overflow,
            recycle_secs = pool.config.pool_recycle.as_secs(),
            "connection pool initialized"
        );
        Ok(pool)
    }

    async fn fill_initial(&self) {
        for i in 0..self.config.pool_size {
            match BrokerClient::connect(&self.config).await {
                Ok(client) => {
                    self.idle.lock().push(Slot { client, created_at: Instant::now(), use_count: 0 });
                    self.counters.created.fetch_add(1, Ordering::Relaxed);
                    debug!(slot = i + 1, pool_size = self.config.pool_size, "initial connection created");
                }
                Err(err) => {
                    warn!(slot = i + 1, error = %err, "could not create initial pool connection, continuing with fewer");
                    break;
                }
            }
        }
    }

    /// Acquires a connection, blocking up to `pool_timeout` if the pool
    /// and its overflow allowance are both exhausted.
    pub async fn acquire(&self) -> Result<PooledClient> {
        let permit = match tokio::time::timeout(self.config.pool_timeout, self.semaphore.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(BrokerError::PoolClosed),
            Err(_) => return Err(BrokerError::PoolTimeout(self.config.pool_timeout)),
        };

        let popped = self.idle.lock().pop();
        let is_overflow = popped.is_none();

        let mut slot = match popped {
            Some(slot) => slot,
            None => {
                debug!("pool exhausted, opening overflow connection");
                let client = BrokerClient::connect(&self.config).await?;
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                Slot { client, created_at: Instant::now(), use_count: 0 }
            }
        };

        if !is_overflow && slot.should_recycle(self.config.pool_recycle) {
            debug!("recycling connection past max age");
            self.counters.recycled.fetch_add(1, Ordering::Relaxed);
            let client = BrokerClient::connect(&self.config).await?;
            slot = Slot { client, created_at: Instant::now(), use_count: 0 };
        } else if !is_overflow && !slot.client.is_connected() {
            warn!("idle connection failed health check, replacing");
            self.counters.health_check_failures.fetch_add(1, Ordering::Relaxed);
            let client = BrokerClient::connect(&self.config).await?;
            slot = Slot { client, created_at: Instant::now(), use_count: 0 };
        }

        slot.use_count += 1;
        self.counters.reused.fetch_add(1, Ordering::Relaxed);

        Ok(PooledClient {
            client: Some(slot.client),
            created_at: slot.created_at,
            use_count: slot.use_count,
            is_overflow,
            idle: self.idle.clone(),
            _permit: permit,
        })
    }

    /// A snapshot of pool activity counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.idle.lock().len(),
            total_created: self.counters.created.load(Ordering::Relaxed),
            total_reused: self.counters.reused.load(Ordering::Relaxed),
            total_recycled: self.counters.recycled.load(Ordering::Relaxed),
            health_checks_failed: self.counters.health_check_failures.load(Ordering::Relaxed),
        }
    }

    /// Closes every idle connection. Connections currently checked out are
    /// closed when their [`PooledClient`] guard is dropped.
    pub async fn close_all(&self) {
        let slots: Vec<Slot> = std::mem::take(&mut *self.idle.lock());
        let closed = slots.len();
        for slot in slots {
            if let Err(err) = slot.client.disconnect().await {
                warn!(error = %err, "error closing pooled connection");
            }
        }
        info!(closed, "connection pool closed");
    }
}

/// An RAII handle to a pooled [`BrokerClient`].
///
/// Derefs to `BrokerClient` for direct use. On drop, a normally-acquired
/// connection is returned to the idle pool; an overflow connection is
/// closed instead, matching the collaborator's "overflow connections are
/// not kept" policy.
pub struct PooledClient {
    client: Option<BrokerClient>,
    created_at: Instant,
    use_count: u64,
    is_overflow: bool,
    idle: Arc<Mutex<Vec<Slot>>>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledClient {
    type Target = BrokerClient;

    fn deref(&self) -> &BrokerClient {
        self.client.as_ref().expect("client taken before drop")
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            if self.is_overflow {
                debug!("releasing overflow connection");
            } else {
                self.idle.lock().push(Slot { client, created_at: self.created_at, use_count: self.use_count });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_stats_default_to_zero() {
        let stats = PoolStats::default();
        assert_eq!(stats.available, 0);
        assert_eq!(stats.total_created, 0);
    }
}
