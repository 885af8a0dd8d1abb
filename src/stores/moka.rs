use async_trait::async_trait;
use moka::future::Cache;

use crate::error::CacheError;
use crate::record::Record;
use crate::store::Store;

/// Configuration for MokaStore.
#[derive(Debug, Clone, Default)]
pub struct MokaStoreConfig {
    /// Number of entries to pre-allocate room for.
    ///
    /// This is a sizing hint only. The store is unbounded and never evicts.
    pub initial_capacity: Option<usize>,
}

/// Concurrent in-memory store using Moka.
///
/// MokaStore provides lock-free concurrent reads and writes, which pays off under
/// high concurrency (>8 threads). It is built without a capacity bound, time to live or
/// time to idle, so records behave exactly like in `HashMapStore`: they stay until
/// overwritten or deleted.
pub struct MokaStore<V>
where
    V: Clone + Send + Sync,
{
    cache: Cache<String, Record<V>>,
}

impl<V> MokaStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store: MokaStore<User> = MokaStore::new(MokaStoreConfig {
    ///     initial_capacity: Some(10_000),
    /// });
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = config.initial_capacity {
            builder = builder.initial_capacity(capacity);
        }

        MokaStore {
            cache: builder.build(),
        }
    }

    /// Approximate number of records (for monitoring/debugging).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<V> Store<V> for MokaStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, key: &str) -> Result<Option<Record<V>>, CacheError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, record: Record<V>) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), record).await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
