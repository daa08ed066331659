//! Connection checkout walkthrough.
//!
//! Demonstrates the pool lifecycle end to end against the in-process mock
//! connector: construct, share across tasks, observe status, shut down.
//!
//! # Running
//!
//! ```bash
//! cargo run --example checkout
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use corral::{ConnectOptions, Pool, PoolConfig};
use corral_testing::MockConnector;
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Connection Checkout Example ===\n");

    // DB_URL / DB_USER / DB_PASSWORD are honored if set.
    let options = ConnectOptions::from_env()
        .unwrap_or_else(|| ConnectOptions::new("mock://localhost:5432/flights").username("app"));

    let config = PoolConfig::new()
        .size(3)
        .acquire_timeout(Duration::from_secs(5));

    println!("Pool configuration:");
    println!("  Options: {:?}", options);
    println!("  Size: {}", config.size);
    println!("  Acquire timeout: {:?}", config.acquire_timeout);
    println!();

    let connector = MockConnector::with_options(options);
    let probe = connector.clone();
    let pool = Pool::connect(connector, config).await?;

    // Example 1: a checkout looks and feels like a plain connection.
    println!("1. Basic checkout:");
    {
        let mut conn = pool.acquire().await?;
        println!("  Checked out connection {}: {}", conn.id(), conn.ping());
        // Dropping the handle returns the connection to the pool. No
        // special release call, no pool awareness at the call site.
    }
    print_status(&pool);

    // Example 2: ten workers share three connections.
    println!("\n2. Concurrent checkouts (10 workers, pool of 3):");
    let start = Instant::now();
    let mut workers = Vec::new();

    for worker in 0..10 {
        let pool = pool.clone();
        workers.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await?;
            // Simulate some work holding the connection.
            tokio::time::sleep(Duration::from_millis(50)).await;
            conn.ping();
            Ok::<_, corral::PoolError>(worker)
        }));
    }

    let mut completed = 0;
    for worker in workers {
        if worker.await?.is_ok() {
            completed += 1;
        }
    }
    println!("  Completed {} checkouts in {:?}", completed, start.elapsed());
    println!("  Connections ever opened: {}", probe.opened());
    print_status(&pool);

    // Example 3: graceful shutdown closes the whole fixed set.
    println!("\n3. Graceful shutdown:");
    pool.close().await?;
    println!("  Pool closed: {}", pool.is_closed());
    println!("  Connections physically closed: {}", probe.closed());

    Ok(())
}

fn print_status(pool: &Pool<MockConnector>) {
    let status = pool.status();
    println!(
        "  Status: {}/{} checked out ({:.1}% utilization), {} available",
        status.in_use,
        status.size,
        status.utilization(),
        status.available
    );
}
