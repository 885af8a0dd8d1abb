//! swr-memo - stale-while-revalidate memoization for async producers
//!
//! This library puts a cache in front of any async, fallible producer keyed by a string:
//! - Fresh values are served without calling the producer
//! - Stale values are served immediately while one background refresh runs
//! - Missing or expired values are produced once, no matter how many callers wait
//! - Storage is pluggable: in-memory (default), Moka, or any key-value backend such as Redis
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use swr_memo::{BoxError, SwrCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache: SwrCache<String> = SwrCache::builder(Duration::from_secs(60))
//!         .stale_ttl(Duration::from_secs(300))
//!         .build();
//!
//!     // The producer only runs when the stored value is missing, stale or expired
//!     let user = cache
//!         .wrap("user:123", || async {
//!             Ok::<_, BoxError>("User data for 123".to_string())
//!         })
//!         .await?;
//!
//!     println!("{}", user);
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod inflight;
mod record;
mod store;
pub mod stores;
mod swr;
mod utils;

// Re-export public API
pub use builder::SwrCacheBuilder;
pub use error::{BoxError, CacheError};
pub use record::{Freshness, Record};
pub use store::Store;
pub use stores::memory::HashMapStore;
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore, Outcome, StoreOp};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{KvBackend, KvStore, RedisStore, RedisStoreConfig};
pub use swr::{CacheConfig, SwrCache, UpdateObserver};
pub use utils::{Clock, ManualClock, SystemClock, now_ms};
