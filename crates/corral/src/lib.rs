//! # corral
//!
//! Fixed-size async database connection pool with drop-to-return handles.
//!
//! corral opens an exact number of raw database connections up front and
//! lends them to concurrent callers. A checked-out connection is wrapped in a
//! [`PoolHandle`] that behaves like the connection itself (it derefs to it);
//! dropping the handle returns the connection to the pool instead of closing
//! it, so code written against a plain connection needs no pool awareness.
//!
//! ## Design
//!
//! - **Fixed capacity**: exactly `size` connections exist for the pool's
//!   entire lifetime. Nothing is opened lazily, nothing is reconnected, and
//!   [`Pool::acquire`] never creates a connection beyond `size`.
//! - **Blocking hand-off**: `acquire` suspends the calling task on a
//!   semaphore until a connection is returned. No polling, no spurious
//!   wake-ups without an available connection.
//! - **Driver-agnostic**: the pool is generic over a [`Connect`] factory;
//!   what a "connection" is (and its wire protocol) belongs entirely to the
//!   implementor.
//!
//! ## Example
//!
//! ```rust,ignore
//! use corral::{Connect, Pool, PoolConfig};
//! use std::time::Duration;
//!
//! let config = PoolConfig::new()
//!     .size(5)
//!     .acquire_timeout(Duration::from_secs(30));
//!
//! let pool = Pool::connect(MyConnector::new(options), config).await?;
//!
//! let mut conn = pool.acquire().await?;
//! // Use `conn` exactly like the underlying connection...
//! drop(conn); // returned to the pool, not closed
//!
//! pool.close().await?; // process teardown: physically closes everything
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connect;
pub mod error;
pub mod handle;
pub mod pool;

pub use config::{ConnectOptions, PoolConfig};
pub use connect::Connect;
pub use error::PoolError;
pub use handle::PoolHandle;
pub use pool::{Pool, PoolStatus};
