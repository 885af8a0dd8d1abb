use async_trait::async_trait;

use crate::error::CacheError;
use crate::record::Record;

/// A store is a common interface for storing, reading and deleting cached records.
///
/// Stores keep exactly what they are given and return exactly what is stored. They do
/// not expire anything: all freshness decisions belong to [`SwrCache`](crate::SwrCache).
#[async_trait]
pub trait Store<V>: Send + Sync {
    /// A name for errors, metrics and tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "redis"
    fn name(&self) -> &'static str;

    /// Return the stored record.
    ///
    /// The response must be `None` for cache misses. Backend failures are returned, never
    /// swallowed.
    async fn get(&self, key: &str) -> Result<Option<Record<V>>, CacheError>;

    /// Overwrite the record for the given key.
    async fn set(&self, key: &str, record: Record<V>) -> Result<(), CacheError>;

    /// Remove the key. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
