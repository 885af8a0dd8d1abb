use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::record::Record;
use crate::store::Store;

/// Thread-safe in-memory store using HashMap with RwLock.
///
/// The default backend of [`SwrCache`](crate::SwrCache). It has no size bound and
/// never evicts: a record stays until it is overwritten or deleted.
///
/// For high-concurrency scenarios, consider using `MokaStore` instead.
pub struct HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    state: RwLock<HashMap<String, Record<V>>>,
}

impl<V> HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    /// Create a new, empty HashMapStore.
    pub fn new() -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }
}

impl<V> Default for HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Store<V> for HashMapStore<V>
where
    V: Clone + Send + Sync,
{
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get(&self, key: &str) -> Result<Option<Record<V>>, CacheError> {
        let state = self.state.read().await;
        Ok(state.get(key).cloned())
    }

    async fn set(&self, key: &str, record: Record<V>) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.insert(key.to_string(), record);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.remove(key);
        Ok(())
    }
}
