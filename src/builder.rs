//! Builder API for configuring a cache instance.
//!
//! Everything set here is fixed for the lifetime of the built cache.

use std::sync::Arc;
use std::time::Duration;

use crate::store::Store;
use crate::stores::memory::HashMapStore;
use crate::swr::{CacheConfig, SwrCache, UpdateObserver};
use crate::utils::{Clock, SystemClock};

/// Builder for [`SwrCache`].
///
/// # Example
///
/// ```ignore
/// use swr_memo::{RedisStore, RedisStoreConfig, SwrCache};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let redis: RedisStore<User> = RedisStore::connect(RedisStoreConfig {
///     url: "redis://localhost:6379".to_string(),
///     prefix: "users:".to_string(),
/// })
/// .await?;
///
/// let cache = SwrCache::builder(Duration::from_secs(60))
///     .stale_ttl(Duration::from_secs(300))
///     .store(Arc::new(redis))
///     .on_update(|key, _user| tracing::debug!("updated {}", key))
///     .build();
/// ```
pub struct SwrCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    config: CacheConfig,
    store: Option<Arc<dyn Store<V>>>,
    clock: Option<Arc<dyn Clock>>,
    on_update: Option<UpdateObserver<V>>,
}

impl<V> SwrCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a builder with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self::from_config(CacheConfig::new(ttl))
    }

    /// Create a builder from a prepared timing configuration.
    pub fn from_config(config: CacheConfig) -> Self {
        SwrCacheBuilder {
            config,
            store: None,
            clock: None,
            on_update: None,
        }
    }

    /// Stale-serve window after `ttl`. Defaults to zero.
    pub fn stale_ttl(mut self, stale_ttl: Duration) -> Self {
        self.config.stale_ttl = stale_ttl;
        self
    }

    /// Storage backend. Defaults to a fresh `HashMapStore` owned by this cache.
    pub fn store(mut self, store: Arc<dyn Store<V>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Time source. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Callback fired after every successful write, explicit `set` or producer result.
    ///
    /// Notifications are queued and delivered in write order on a task owned by the cache,
    /// so the write returns without waiting for the callback. A panic inside it is caught
    /// and logged; it never fails the operation that triggered it.
    pub fn on_update<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(observer));
        self
    }

    /// Build the cache.
    pub fn build(self) -> SwrCache<V> {
        let store: Arc<dyn Store<V>> = match self.store {
            Some(store) => store,
            None => Arc::new(HashMapStore::<V>::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        tracing::debug!(
            "Building SWR cache: store={}, ttl={:?}, stale_ttl={:?}",
            store.name(),
            self.config.ttl,
            self.config.stale_ttl
        );

        SwrCache::from_parts(store, self.config, clock, self.on_update)
    }
}
