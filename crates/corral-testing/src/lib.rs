//! # corral-testing
//!
//! Test infrastructure for corral pool development.
//!
//! This crate provides an in-process mock connection factory so the pool
//! can be exercised without a database server: no sockets, no Docker, fully
//! deterministic.
//!
//! ## Features
//!
//! - Open/close accounting (how many, which ids, how often)
//! - Failure injection for the connect and close paths
//! - Optional artificial connect latency
//!
//! ## Example
//!
//! ```rust,ignore
//! use corral::{Pool, PoolConfig};
//! use corral_testing::MockConnector;
//!
//! #[tokio::test]
//! async fn test_with_mock_connector() {
//!     let connector = MockConnector::new();
//!     let probe = connector.clone(); // shares the accounting state
//!
//!     let pool = Pool::connect(connector, PoolConfig::new().size(3))
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(probe.opened(), 3);
//!     pool.close().await.unwrap();
//!     assert_eq!(probe.closed(), 3);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock;

pub use mock::{MockConnection, MockConnector, MockError};
