//! Metrics middleware for cache stores.
//!
//! [`MetricsStore`] times every operation of the store it wraps and hands one
//! [`CacheMetric`] per call to a user-provided [`MetricsSink`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use swr_memo::{HashMapStore, MetricsStore, Store, SwrCache};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//! let inner: Arc<dyn Store<String>> = Arc::new(HashMapStore::new());
//! let store: Arc<dyn Store<String>> = Arc::new(MetricsStore::new(inner, sink.clone()));
//!
//! let cache = SwrCache::builder(Duration::from_secs(60)).store(store).build();
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{BoxError, CacheError};
use crate::record::Record;
use crate::store::Store;

/// The [`Store`] method a metric was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Del,
}

/// How a store call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `get` found a record.
    Hit,
    /// `get` found nothing.
    Miss,
    /// `set` or `del` succeeded.
    Done,
    /// The backend returned an error.
    Failed,
}

/// One timed store call.
#[derive(Debug, Clone)]
pub struct CacheMetric {
    /// Which store method ran.
    pub op: StoreOp,
    /// The cache key, without any backend prefix.
    pub key: String,
    /// Hit, miss, done or failed.
    pub outcome: Outcome,
    /// Wall time spent in the wrapped store.
    pub latency: Duration,
    /// `Store::name()` of the wrapped store.
    pub store: &'static str,
}

/// Receiver for store metrics.
///
/// ```ignore
/// struct BufferedSink {
///     buffer: Mutex<Vec<CacheMetric>>,
/// }
///
/// #[async_trait]
/// impl MetricsSink for BufferedSink {
///     fn emit(&self, metric: CacheMetric) {
///         self.buffer.lock().unwrap().push(metric);
///     }
///
///     async fn flush(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Called inline after every store call, so it should only buffer.
    fn emit(&self, metric: CacheMetric);

    /// Push buffered metrics out.
    async fn flush(&self) -> Result<(), BoxError>;
}

/// Store decorator reporting every call to a [`MetricsSink`].
///
/// Results pass through untouched, errors included.
pub struct MetricsStore<V> {
    inner: Arc<dyn Store<V>>,
    sink: Arc<dyn MetricsSink>,
}

impl<V> MetricsStore<V>
where
    V: Send + Sync,
{
    /// Wrap `inner`, reporting each of its calls to `sink`.
    pub fn new(inner: Arc<dyn Store<V>>, sink: Arc<dyn MetricsSink>) -> Self {
        MetricsStore { inner, sink }
    }

    /// The sink metrics go to, e.g. to `flush` it on shutdown.
    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    async fn timed<T, Fut>(
        &self,
        op: StoreOp,
        key: &str,
        call: Fut,
        outcome: fn(&T) -> Outcome,
    ) -> Result<T, CacheError>
    where
        Fut: Future<Output = Result<T, CacheError>> + Send,
    {
        let start = Instant::now();
        let result = call.await;

        self.sink.emit(CacheMetric {
            op,
            key: key.to_string(),
            outcome: result.as_ref().map_or(Outcome::Failed, outcome),
            latency: start.elapsed(),
            store: self.inner.name(),
        });

        result
    }
}

#[async_trait]
impl<V> Store<V> for MetricsStore<V>
where
    V: Send + Sync,
{
    /// Reports the wrapped store's name, so errors and logs point at the real backend.
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<Record<V>>, CacheError> {
        self.timed(StoreOp::Get, key, self.inner.get(key), |found| {
            if found.is_some() {
                Outcome::Hit
            } else {
                Outcome::Miss
            }
        })
        .await
    }

    async fn set(&self, key: &str, record: Record<V>) -> Result<(), CacheError> {
        self.timed(StoreOp::Set, key, self.inner.set(key, record), |_| {
            Outcome::Done
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.timed(StoreOp::Del, key, self.inner.del(key), |_| Outcome::Done)
            .await
    }
}
