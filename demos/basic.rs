//! Example walking through the fresh, stale and expired states of a cache.
//!
//! Uses the default in-memory store. Swap in `MokaStore` or `RedisStore` through
//! `SwrCache::builder(..).store(..)` without touching the call sites.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use swr_memo::{BoxError, SwrCache};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    version: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cache: SwrCache<User> = SwrCache::builder(Duration::from_millis(50))
        .stale_ttl(Duration::from_millis(200))
        .on_update(|key, user: &User| println!("  stored {} (version {})", key, user.version))
        .build();

    let loads = Arc::new(AtomicUsize::new(0));
    let load_user = |loads: Arc<AtomicUsize>| {
        move || async move {
            let version = loads.fetch_add(1, Ordering::SeqCst) + 1;
            println!("  loading user from database (call {})", version);
            Ok::<_, BoxError>(User {
                id: "chronark".to_string(),
                name: "Andreas".to_string(),
                version,
            })
        }
    };

    // Miss: waits for the producer
    println!("t=0ms   miss");
    let user = cache.wrap("user:chronark", load_user(loads.clone())).await?;
    println!("  got version {}", user.version);

    // Fresh: the producer is not called
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("t=10ms  fresh");
    let user = cache.wrap("user:chronark", load_user(loads.clone())).await?;
    println!("  got version {}", user.version);

    // Stale: the old value comes back at once, a refresh runs in the background
    tokio::time::sleep(Duration::from_millis(60)).await;
    println!("t=70ms  stale");
    let user = cache.wrap("user:chronark", load_user(loads.clone())).await?;
    println!("  got version {}", user.version);
    cache.settle("user:chronark").await;

    // Fresh again with the refreshed value
    println!("t=80ms  refreshed");
    let user = cache.wrap("user:chronark", load_user(loads.clone())).await?;
    println!("  got version {}", user.version);

    // Concurrent misses share one producer call
    cache.del("user:chronark").await?;
    let before = loads.load(Ordering::SeqCst);
    let results = futures::future::join_all(
        (0..10).map(|_| cache.wrap("user:chronark", load_user(loads.clone()))),
    )
    .await;
    println!(
        "\n10 concurrent callers, {} ok, {} producer call(s)",
        results.iter().filter(|r| r.is_ok()).count(),
        loads.load(Ordering::SeqCst) - before
    );

    Ok(())
}
