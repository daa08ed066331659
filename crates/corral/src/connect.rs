//! Raw connection factory trait.
//!
//! The pool is deliberately ignorant of what a database connection *is*.
//! Everything driver-specific — dialing, authentication handshake, the close
//! sequence — lives behind [`Connect`], and the pool only ever asks it to
//! open a connection during construction and close one during shutdown.

/// Factory for raw database connections.
///
/// Implementors wrap a concrete driver. `connect` is called exactly `size`
/// times while the pool is built and never again: the pool does not retry,
/// reconnect, or health-check (a connection that breaks stays broken until
/// shutdown). `close` is called exactly once per connection, from
/// [`Pool::close`].
///
/// This uses native async traits (Rust 2024 Edition); the pool is generic
/// over the factory, so no trait object is involved.
///
/// [`Pool::close`]: crate::Pool::close
#[allow(async_fn_in_trait)]
pub trait Connect: Send + Sync {
    /// The raw connection type produced by this factory.
    type Connection: Send + 'static;

    /// Error reported by the underlying driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open one physical database connection.
    ///
    /// A failure here is fatal to pool construction; the factory should not
    /// retry internally.
    async fn connect(&self) -> Result<Self::Connection, Self::Error>;

    /// Physically close a connection.
    ///
    /// Invoked during shutdown for every connection that is idle in the
    /// pool. Errors are collected and reported by the pool rather than
    /// interrupting the teardown of other connections.
    ///
    /// A connection still checked out when the pool closes is *not* routed
    /// through this method: it is simply dropped once its handle is
    /// released. Drivers that need an explicit close sequence should
    /// therefore also implement [`Drop`] on [`Connect::Connection`].
    async fn close(&self, conn: Self::Connection) -> Result<(), Self::Error>;
}
