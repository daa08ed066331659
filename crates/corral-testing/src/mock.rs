//! In-process mock connection factory.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use corral::{Connect, ConnectOptions};

/// Errors produced by the mock factory.
#[derive(Debug, Error)]
pub enum MockError {
    /// The mock refused the connection (failure injection).
    #[error("connection refused")]
    Refused,

    /// Closing the connection failed (failure injection).
    #[error("close failed for connection {0}")]
    CloseFailed(u32),
}

/// A stand-in for a raw database connection.
///
/// Carries a stable id and a trivially query-shaped method so tests can
/// verify that pool handles forward operations to the raw connection.
#[derive(Debug)]
pub struct MockConnection {
    id: u32,
    pings: u32,
}

impl MockConnection {
    /// Id assigned by the connector, in open order.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// A stand-in for "execute something on this connection".
    pub fn ping(&mut self) -> &'static str {
        self.pings += 1;
        "pong"
    }

    /// Number of pings served by this connection.
    #[must_use]
    pub fn pings(&self) -> u32 {
        self.pings
    }
}

/// Shared accounting across clones of one connector.
#[derive(Default)]
struct MockState {
    opened: AtomicU32,
    closed: AtomicU32,
    closed_ids: Mutex<Vec<u32>>,
}

/// Mock implementation of [`Connect`] with accounting and failure injection.
///
/// Clones share accounting state, so hand one clone to the pool and keep
/// another as a probe:
///
/// ```rust,ignore
/// let connector = MockConnector::new().fail_after(2);
/// let probe = connector.clone();
/// let err = Pool::connect(connector, PoolConfig::new().size(5)).await;
/// assert!(err.is_err());
/// assert_eq!(probe.opened(), probe.closed()); // nothing left open
/// ```
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<MockState>,
    options: Option<ConnectOptions>,
    fail_after: Option<u32>,
    fail_close: bool,
    connect_delay: Option<Duration>,
}

impl MockConnector {
    /// Create a mock connector that opens and closes without errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock connector that pretends to dial `options.url`.
    ///
    /// An empty URL models an unreachable database: every connect attempt
    /// is refused. Credentials are carried along but never inspected.
    #[must_use]
    pub fn with_options(options: ConnectOptions) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }

    /// Make every connect attempt after the first `n` fail with
    /// [`MockError::Refused`]. `fail_after(0)` models an unreachable
    /// database.
    #[must_use]
    pub fn fail_after(mut self, n: u32) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Make every close attempt fail with [`MockError::CloseFailed`].
    #[must_use]
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Sleep for `delay` before each connect completes.
    #[must_use]
    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Total connections opened so far.
    #[must_use]
    pub fn opened(&self) -> u32 {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Total connections closed so far.
    #[must_use]
    pub fn closed(&self) -> u32 {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Ids of the connections closed so far, in close order.
    #[must_use]
    pub fn closed_ids(&self) -> Vec<u32> {
        self.state.closed_ids.lock().clone()
    }
}

impl Connect for MockConnector {
    type Connection = MockConnection;
    type Error = MockError;

    async fn connect(&self) -> Result<MockConnection, MockError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(options) = &self.options {
            if options.url.is_empty() {
                tracing::debug!("mock connect refused: no database URL");
                return Err(MockError::Refused);
            }
            tracing::debug!(url = %options.url, user = %options.username, "mock dialing");
        }
        if let Some(limit) = self.fail_after {
            if self.state.opened.load(Ordering::SeqCst) >= limit {
                tracing::debug!(limit, "mock connect refused");
                return Err(MockError::Refused);
            }
        }
        let id = self.state.opened.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id, "mock connection opened");
        Ok(MockConnection { id, pings: 0 })
    }

    async fn close(&self, conn: MockConnection) -> Result<(), MockError> {
        if self.fail_close {
            tracing::debug!(id = conn.id, "mock close refused");
            return Err(MockError::CloseFailed(conn.id));
        }
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        self.state.closed_ids.lock().push(conn.id);
        tracing::debug!(id = conn.id, "mock connection closed");
        Ok(())
    }
}
