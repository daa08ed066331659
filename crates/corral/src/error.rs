//! Pool error types.

use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Configuration(String),

    /// Opening a raw connection failed during pool construction.
    ///
    /// Construction is all-or-nothing: any connections opened before the
    /// failure have already been closed by the time this is returned.
    #[error("failed to open connection {index} of {size}: {source}")]
    Connect {
        /// Zero-based index of the connection that failed to open.
        index: u32,
        /// Configured pool size.
        size: u32,
        /// Error reported by the connection factory.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to acquire a connection within the configured deadline.
    #[error("connection acquisition timed out after {0:?}")]
    AcquireTimeout(std::time::Duration),

    /// Pool is closed.
    ///
    /// Also surfaced to callers that were blocked in [`Pool::acquire`] when
    /// the pool was closed under them.
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    #[error("pool is closed")]
    Closed,

    /// Internal bookkeeping no longer matches reality.
    ///
    /// Raised when the pool detects a connection that would otherwise be
    /// lent to two callers at once. This is a programming error, not a
    /// recoverable condition.
    #[error("pool state corrupted: {0}")]
    CorruptedState(&'static str),

    /// One or more raw connections failed to close during shutdown.
    ///
    /// Every connection gets a close attempt; the failures are collected
    /// here rather than aborting at the first one.
    #[error("pool shutdown completed with {} close failure(s)", failures.len())]
    Shutdown {
        /// Human-readable description of each failed close.
        failures: Vec<String>,
    },
}
