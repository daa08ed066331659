//! Fixed-capacity connection pool implementation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;
use crate::connect::Connect;
use crate::error::PoolError;
use crate::handle::PoolHandle;

/// A fixed-size pool of raw database connections.
///
/// The pool opens exactly [`PoolConfig::size`] connections at construction
/// and keeps that set for its entire lifetime: connections are never added,
/// replaced, or reconnected. Callers check connections out with
/// [`acquire`](Pool::acquire) and check them back in by dropping the returned
/// [`PoolHandle`] — to calling code this looks exactly like closing an
/// ordinary connection.
///
/// `Pool` is a cheap handle over shared state; clone it freely and pass it
/// to whatever needs connections. Lifecycle is explicit: construct it once
/// at process start, [`close`](Pool::close) it once at teardown.
pub struct Pool<M: Connect> {
    inner: Arc<PoolInner<M>>,
}

impl<M: Connect> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A raw connection plus the stable id it was assigned at construction.
pub(crate) struct Pooled<C> {
    pub(crate) id: u32,
    pub(crate) raw: C,
}

/// Per-connection checkout bookkeeping, fixed at construction.
///
/// Doubles as the shutdown registry: one entry exists for every raw
/// connection ever created, whether it is idle or lent out.
struct Slot {
    in_use: AtomicBool,
}

pub(crate) struct PoolInner<M: Connect> {
    connector: M,
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    /// Connections currently available for checkout. The number of unclaimed
    /// semaphore permits always equals the queue length, so a task holding a
    /// permit is guaranteed a non-empty pop.
    idle: Mutex<VecDeque<Pooled<M::Connection>>>,
    slots: Vec<Slot>,
    closed: AtomicBool,
}

impl<M: Connect> Pool<M> {
    /// Open the pool: connect exactly `config.size` raw connections.
    ///
    /// Construction is all-or-nothing. If any connection fails to open, the
    /// ones opened so far are closed again and the error is returned — a
    /// partial pool never survives.
    pub async fn connect(connector: M, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let size = config.size;

        let mut idle = VecDeque::with_capacity(size as usize);
        for index in 0..size {
            match connector.connect().await {
                Ok(raw) => idle.push_back(Pooled { id: index, raw }),
                Err(err) => {
                    tracing::error!(index, size, error = %err, "pool construction failed");
                    for pooled in idle {
                        if let Err(close_err) = connector.close(pooled.raw).await {
                            tracing::warn!(
                                id = pooled.id,
                                error = %close_err,
                                "failed to close connection while aborting construction"
                            );
                        }
                    }
                    return Err(PoolError::Connect {
                        index,
                        size,
                        source: Box::new(err),
                    });
                }
            }
        }

        let slots = (0..size)
            .map(|_| Slot {
                in_use: AtomicBool::new(false),
            })
            .collect();

        tracing::info!(size, "connection pool ready");

        Ok(Self {
            inner: Arc::new(PoolInner {
                connector,
                config,
                semaphore: Arc::new(Semaphore::new(size as usize)),
                idle: Mutex::new(idle),
                slots,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Check a connection out of the pool.
    ///
    /// Returns immediately when a connection is available; otherwise
    /// suspends the calling task until one is checked back in. Never opens
    /// a new connection. With [`PoolConfig::acquire_timeout`] set, a wait
    /// longer than the deadline fails with [`PoolError::AcquireTimeout`];
    /// closing the pool while waiting fails with [`PoolError::Closed`].
    pub async fn acquire(&self) -> Result<PoolHandle<M>, PoolError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let permit = self.acquire_permit().await?;

        let popped = self.inner.idle.lock().pop_front();
        let Some(pooled) = popped else {
            // A close that raced this acquire may have drained the queue
            // between the permit grant and the pop.
            if self.inner.closed.load(Ordering::Acquire) {
                return Err(PoolError::Closed);
            }
            return Err(PoolError::CorruptedState(
                "semaphore permit held but no idle connection",
            ));
        };

        if self.inner.slots[pooled.id as usize]
            .in_use
            .swap(true, Ordering::AcqRel)
        {
            // Lending this entry would hand the same raw connection to two
            // callers. Refuse it instead of propagating the corruption.
            tracing::error!(id = pooled.id, "duplicate idle entry for a checked-out connection");
            return Err(PoolError::CorruptedState(
                "connection already checked out",
            ));
        }

        tracing::trace!(id = pooled.id, "connection checked out");
        Ok(PoolHandle::new(pooled, Arc::clone(&self.inner), permit))
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        let semaphore = Arc::clone(&self.inner.semaphore);
        match self.inner.config.acquire_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, semaphore.acquire_owned()).await {
                    Ok(Ok(permit)) => Ok(permit),
                    Ok(Err(_)) => Err(PoolError::Closed),
                    Err(_) => Err(PoolError::AcquireTimeout(deadline)),
                }
            }
            None => semaphore.acquire_owned().await.map_err(|_| PoolError::Closed),
        }
    }

    /// Close the pool, physically closing every raw connection.
    ///
    /// Intended for process teardown, once, after callers have finished:
    /// concurrent `acquire`/checkout activity during `close` is outside the
    /// pool's contract. Tasks still blocked in [`acquire`](Pool::acquire)
    /// are woken with [`PoolError::Closed`]. Every idle connection gets a
    /// close attempt even if an earlier one fails; the failures are
    /// collected into [`PoolError::Shutdown`]. A second call is a no-op.
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.inner.semaphore.close();

        let drained: Vec<_> = {
            let mut idle = self.inner.idle.lock();
            idle.drain(..).collect()
        };

        let mut failures = Vec::new();
        for pooled in drained {
            if let Err(err) = self.inner.connector.close(pooled.raw).await {
                tracing::warn!(id = pooled.id, error = %err, "connection failed to close cleanly");
                failures.push(format!("connection {}: {}", pooled.id, err));
            }
        }

        for (id, slot) in self.inner.slots.iter().enumerate() {
            if slot.in_use.load(Ordering::Acquire) {
                tracing::warn!(
                    id,
                    "connection still checked out at shutdown; dropped when its handle is released"
                );
            }
        }

        tracing::info!("connection pool closed");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError::Shutdown { failures })
        }
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let available = self.inner.idle.lock().len() as u32;
        let in_use = self
            .inner
            .slots
            .iter()
            .filter(|slot| slot.in_use.load(Ordering::Relaxed))
            .count() as u32;
        PoolStatus {
            available,
            in_use,
            size: self.inner.config.size,
        }
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl<M: Connect> PoolInner<M> {
    /// Check a connection back in. Drives the handle's release path; never
    /// called directly by application code.
    ///
    /// Returning the same id twice is a misuse of pool state: the flag is
    /// checked-and-cleared atomically and the duplicate is rejected instead
    /// of re-enqueued, so the available set can never contain a connection
    /// that is also lent out.
    pub(crate) fn check_in(&self, pooled: Pooled<M::Connection>) {
        if !self.slots[pooled.id as usize]
            .in_use
            .swap(false, Ordering::AcqRel)
        {
            tracing::error!(
                id = pooled.id,
                "double release of a connection that is not checked out; rejected"
            );
            return;
        }

        if self.closed.load(Ordering::Acquire) {
            // Shutdown already ran; tear the straggler down at driver level.
            tracing::debug!(id = pooled.id, "pool closed, dropping returned connection");
            return;
        }

        tracing::trace!(id = pooled.id, "connection returned to pool");
        self.idle.lock().push_back(pooled);
        // The handle drops its permit after this returns, waking at most one
        // waiter that is now guaranteed to find the queue non-empty.
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    /// Number of idle connections available for checkout.
    pub available: u32,
    /// Number of connections currently checked out.
    pub in_use: u32,
    /// Fixed pool size.
    pub size: u32,
}

impl PoolStatus {
    /// Fraction of the pool currently checked out, as a percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        f64::from(self.in_use) / f64::from(self.size) * 100.0
    }
}
