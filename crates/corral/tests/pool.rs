//! Pool integration tests.
//!
//! These run entirely in-process against the mock connector from
//! `corral-testing`; no database server is required.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use corral::{Pool, PoolConfig, PoolError};
use corral_testing::MockConnector;

// =============================================================================
// Construction and Shutdown
// =============================================================================

#[tokio::test]
async fn test_construct_opens_exactly_size_connections() {
    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(5))
        .await
        .expect("pool construction failed");

    assert_eq!(probe.opened(), 5);
    assert!(!pool.is_closed());

    let status = pool.status();
    assert_eq!(status.size, 5);
    assert_eq!(status.available, 5);
    assert_eq!(status.in_use, 0);

    pool.close().await.unwrap();
    assert!(pool.is_closed());
}

#[tokio::test]
async fn test_close_closes_each_connection_exactly_once() {
    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(5))
        .await
        .unwrap();

    // Use a couple of connections first; it must make no difference.
    let h1 = pool.acquire().await.unwrap();
    let h2 = pool.acquire().await.unwrap();
    drop(h1);
    drop(h2);

    pool.close().await.unwrap();

    assert_eq!(probe.closed(), 5);
    let mut ids = probe.closed_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_double_close_is_a_no_op() {
    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(2))
        .await
        .unwrap();

    pool.close().await.unwrap();
    pool.close().await.unwrap();

    assert_eq!(probe.closed(), 2);
}

#[tokio::test]
async fn test_construction_failure_leaves_no_connection_open() {
    let connector = MockConnector::new().fail_after(3);
    let probe = connector.clone();

    let result = Pool::connect(connector, PoolConfig::new().size(5)).await;

    match result {
        Err(PoolError::Connect { index, size, .. }) => {
            assert_eq!(index, 3);
            assert_eq!(size, 5);
        }
        other => panic!("expected Connect error, got {:?}", other.map(|_| ())),
    }

    // The three connections opened before the failure were closed again.
    assert_eq!(probe.opened(), 3);
    assert_eq!(probe.closed(), 3);
}

#[tokio::test]
async fn test_unreachable_database_fails_startup() {
    let connector = MockConnector::new().fail_after(0);
    let probe = connector.clone();

    let result = Pool::connect(connector, PoolConfig::default()).await;

    assert!(matches!(result, Err(PoolError::Connect { index: 0, .. })));
    assert_eq!(probe.opened(), 0);
    assert_eq!(probe.closed(), 0);
}

#[tokio::test]
async fn test_shutdown_collects_every_close_failure() {
    let connector = MockConnector::new().fail_close();

    let pool = Pool::connect(connector, PoolConfig::new().size(3))
        .await
        .unwrap();

    match pool.close().await {
        Err(PoolError::Shutdown { failures }) => {
            // Every connection got a close attempt; all three are reported.
            assert_eq!(failures.len(), 3);
        }
        other => panic!("expected Shutdown error, got {:?}", other),
    }
    assert!(pool.is_closed());
}

// =============================================================================
// Acquire / Release
// =============================================================================

#[tokio::test]
async fn test_handle_forwards_to_raw_connection() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(1))
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(conn.ping(), "pong");
    assert_eq!(conn.pings(), 1);
    assert_eq!(conn.id(), 0);

    conn.release();
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_release_returns_connection_without_reconnecting() {
    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(1))
        .await
        .unwrap();

    let first = pool.acquire().await.unwrap();
    let first_id = first.id();
    drop(first);

    // The same raw connection comes back; nothing was reopened.
    let second = pool.acquire().await.unwrap();
    assert_eq!(second.id(), first_id);
    assert_eq!(probe.opened(), 1);

    drop(second);
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_ping_count_survives_the_round_trip() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(1))
        .await
        .unwrap();

    {
        let mut conn = pool.acquire().await.unwrap();
        conn.ping();
        conn.ping();
    }

    // Returned to the pool, not closed and reopened: state persists.
    let conn = pool.acquire().await.unwrap();
    assert_eq!(conn.pings(), 2);

    drop(conn);
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_acquire_blocks_when_pool_is_exhausted() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(2))
        .await
        .unwrap();

    let h1 = pool.acquire().await.unwrap();
    let h2 = pool.acquire().await.unwrap();

    // Third acquire must suspend, not fail and not succeed.
    let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
    assert!(blocked.is_err(), "acquire should block while exhausted");

    drop(h1);

    // After a release it completes promptly.
    let h3 = tokio::time::timeout(Duration::from_millis(500), pool.acquire())
        .await
        .expect("acquire should unblock after a release")
        .unwrap();

    drop(h2);
    drop(h3);
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_blocked_acquirer_receives_released_connection() {
    // Pool of 2: T1 and T2 hold both, T3 blocks, T1 releases, T3 proceeds.
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(2))
        .await
        .unwrap();

    let t1 = pool.acquire().await.unwrap();
    let t2 = pool.acquire().await.unwrap();

    let t3 = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };

    // Let T3 reach the wait queue before anything is released.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!t3.is_finished(), "T3 should still be blocked");

    drop(t1);

    let t3_handle = t3.await.unwrap().expect("T3 should receive a connection");

    // Final state: T2 and T3 hold the two connections.
    let status = pool.status();
    assert_eq!(status.in_use, 2);
    assert_eq!(status.available, 0);

    drop(t2);
    drop(t3_handle);
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_release_from_a_different_task() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(1))
        .await
        .unwrap();

    let conn = pool.acquire().await.unwrap();

    // Hand the checkout to another task and release it there.
    let releaser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(conn);
    });

    let conn = pool.acquire().await.unwrap();
    releaser.await.unwrap();

    drop(conn);
    pool.close().await.unwrap();
}

// =============================================================================
// Status Tracking
// =============================================================================

#[tokio::test]
async fn test_status_follows_checkouts() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(3))
        .await
        .unwrap();

    let h1 = pool.acquire().await.unwrap();
    let h2 = pool.acquire().await.unwrap();

    let status = pool.status();
    assert_eq!(status.in_use, 2);
    assert_eq!(status.available, 1);

    drop(h1);
    let status = pool.status();
    assert_eq!(status.in_use, 1);
    assert_eq!(status.available, 2);

    drop(h2);
    let status = pool.status();
    assert_eq!(status.in_use, 0);
    assert_eq!(status.available, 3);

    pool.close().await.unwrap();
}

// =============================================================================
// Timeouts and Closed-Pool Errors
// =============================================================================

#[tokio::test]
async fn test_acquire_timeout_on_exhausted_pool() {
    let config = PoolConfig::new()
        .size(1)
        .acquire_timeout(Duration::from_millis(50));
    let pool = Pool::connect(MockConnector::new(), config).await.unwrap();

    let held = pool.acquire().await.unwrap();

    let result = pool.acquire().await;
    assert!(matches!(result, Err(PoolError::AcquireTimeout(_))));

    drop(held);
    pool.close().await.unwrap();
}

#[tokio::test]
async fn test_acquire_after_close_fails() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(2))
        .await
        .unwrap();

    pool.close().await.unwrap();

    let result = pool.acquire().await;
    assert!(matches!(result, Err(PoolError::Closed)));
}

#[tokio::test]
async fn test_close_wakes_blocked_acquirer() {
    let pool = Pool::connect(MockConnector::new(), PoolConfig::new().size(1))
        .await
        .unwrap();

    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished(), "waiter should be blocked");

    pool.close().await.unwrap();

    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(PoolError::Closed)));

    drop(held);
}

#[tokio::test]
async fn test_handle_released_after_close_is_dropped_not_reenqueued() {
    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(2))
        .await
        .unwrap();

    let held = pool.acquire().await.unwrap();

    // Only the idle connection goes through the factory's close.
    pool.close().await.unwrap();
    assert_eq!(probe.closed(), 1);

    // The straggler is torn down at driver level (its Drop), not checked
    // back in: the available set stays empty and the factory never sees it.
    drop(held);
    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.in_use, 0);
    assert_eq!(probe.closed(), 1);

    let result = pool.acquire().await;
    assert!(matches!(result, Err(PoolError::Closed)));
}

// =============================================================================
// Concurrency Stress
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_exceed_pool_size() {
    const POOL_SIZE: u32 = 4;
    const TASKS: u32 = 16;
    const ITERATIONS: u32 = 25;

    let connector = MockConnector::new();
    let probe = connector.clone();

    let pool = Pool::connect(connector, PoolConfig::new().size(POOL_SIZE))
        .await
        .unwrap();

    let current = Arc::new(AtomicU32::new(0));
    let high_water = Arc::new(AtomicU32::new(0));
    let mut tasks = Vec::new();

    for _ in 0..TASKS {
        let pool = pool.clone();
        let current = current.clone();
        let high_water = high_water.clone();

        tasks.push(tokio::spawn(async move {
            for _ in 0..ITERATIONS {
                let mut conn = pool.acquire().await.expect("acquire failed under load");

                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);

                conn.ping();
                tokio::task::yield_now().await;

                current.fetch_sub(1, Ordering::SeqCst);
                drop(conn);
            }
        }));
    }

    for task in tasks {
        task.await.expect("worker panicked");
    }

    assert!(
        high_water.load(Ordering::SeqCst) <= POOL_SIZE,
        "more than {POOL_SIZE} connections were checked out at once"
    );
    // The fixed set was reused throughout; nothing extra was ever opened.
    assert_eq!(probe.opened(), POOL_SIZE);

    let status = pool.status();
    assert_eq!(status.available, POOL_SIZE);
    assert_eq!(status.in_use, 0);

    pool.close().await.unwrap();
    assert_eq!(probe.closed(), POOL_SIZE);
}
