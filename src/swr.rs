use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::builder::SwrCacheBuilder;
use crate::error::{BoxError, CacheError};
use crate::inflight::InflightRegistry;
use crate::record::{Freshness, Record};
use crate::store::Store;
use crate::utils::{Clock, duration_ms};

/// Callback fired after every successful write with the key and the new value.
pub type UpdateObserver<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Timing configuration of a cache. Immutable once the cache is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window: a record this old or younger is served without a producer call.
    pub ttl: Duration,
    /// Stale-serve window, counted after `ttl`. Zero disables serving stale records.
    pub stale_ttl: Duration,
}

impl CacheConfig {
    /// Timing with the given freshness window and no stale-serve window.
    pub fn new(ttl: Duration) -> Self {
        CacheConfig {
            ttl,
            stale_ttl: Duration::ZERO,
        }
    }

    /// Set the stale-serve window.
    pub fn with_stale_ttl(mut self, stale_ttl: Duration) -> Self {
        self.stale_ttl = stale_ttl;
        self
    }
}

/// Stale-while-revalidate memoization in front of async producers.
///
/// `SwrCache` owns its store handle and its own in-flight registry, so independent caches
/// never interfere. Clones share both: a clone is another handle to the same cache.
pub struct SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    store: Arc<dyn Store<V>>,
    config: CacheConfig,
    ttl_ms: i64,
    stale_ttl_ms: i64,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<Notifier<V>>>,
    /// To prevent concurrent producer calls for the same key, every run is registered here.
    inflight: Arc<InflightRegistry<V>>,
}

impl<V> Clone for SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        SwrCache {
            store: Arc::clone(&self.store),
            config: self.config,
            ttl_ms: self.ttl_ms,
            stale_ttl_ms: self.stale_ttl_ms,
            clock: Arc::clone(&self.clock),
            notifier: self.notifier.clone(),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<V> SwrCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Start configuring a cache with the given freshness window.
    ///
    /// # Example
    /// ```ignore
    /// let cache: SwrCache<User> = SwrCache::builder(Duration::from_secs(60))
    ///     .stale_ttl(Duration::from_secs(300))
    ///     .on_update(|key, user| tracing::info!("refreshed {}: {:?}", key, user))
    ///     .build();
    /// ```
    pub fn builder(ttl: Duration) -> SwrCacheBuilder<V> {
        SwrCacheBuilder::new(ttl)
    }

    /// A cache over an in-memory `HashMapStore` with no stale-serve window.
    pub fn new(ttl: Duration) -> Self {
        SwrCacheBuilder::new(ttl).build()
    }

    pub(crate) fn from_parts(
        store: Arc<dyn Store<V>>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
        on_update: Option<UpdateObserver<V>>,
    ) -> Self {
        SwrCache {
            store,
            config,
            ttl_ms: duration_ms(config.ttl),
            stale_ttl_ms: duration_ms(config.stale_ttl),
            clock,
            notifier: on_update.map(|observer| Arc::new(Notifier::new(observer))),
            inflight: Arc::new(InflightRegistry::new()),
        }
    }

    /// The timing this cache was built with.
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Return the stored value regardless of its age.
    ///
    /// The response will be `None` for cache misses.
    pub async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let record = self.store.get(key).await?;
        Ok(record.map(|r| r.value))
    }

    /// Write `value` stamped with the current time, then queue an update notification.
    ///
    /// Returns once the write is done; the observer runs later on its own task.
    pub async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        let record = Record::new(value.clone(), self.clock.now_ms());
        self.store.set(key, record).await?;
        notify(self.notifier.as_deref(), key, &value);
        Ok(())
    }

    /// Removes the key from the store.
    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.store.del(key).await
    }

    /// Where the stored record for `key` sits right now, `None` if there is no record.
    pub async fn status(&self, key: &str) -> Result<Option<Freshness>, CacheError> {
        let record = self.store.get(key).await?;
        let now = self.clock.now_ms();
        Ok(record.map(|r| Freshness::of(&r, now, self.ttl_ms, self.stale_ttl_ms)))
    }

    /// Whether a producer invocation is currently running for `key`.
    pub fn is_inflight(&self, key: &str) -> bool {
        self.inflight.contains(key)
    }

    /// Number of keys with a running producer invocation.
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Wait for the producer invocation running for `key`, if any, and return its outcome.
    ///
    /// Returns `None` immediately when nothing is running.
    pub async fn settle(&self, key: &str) -> Option<Result<V, CacheError>> {
        let pending = self.inflight.get(key)?;
        Some(pending.await)
    }

    /// Stale-while-revalidate: get the cached value or produce a new one.
    ///
    /// - Fresh record (`age <= ttl`): return it, the producer is not called.
    /// - Stale record (`age <= ttl + stale_ttl`): return it immediately and refresh in the
    ///   background, unless a producer is already running for the key. A failed background
    ///   refresh is logged and otherwise ignored.
    /// - Missing or expired record: wait for a new value. Joins the running producer if
    ///   there is one, so concurrent callers share one invocation and one outcome.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `producer` - Computes a fresh value; only called when one is needed
    ///
    /// # Example
    /// ```ignore
    /// let user = cache.wrap("user:123", move || async move {
    ///     db.get_user(123).await
    /// }).await?;
    /// ```
    pub async fn wrap<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let record = self.store.get(key).await?;

        let Some(record) = record else {
            tracing::debug!("Cache miss: key={}", key);
            return self.produce(key, producer).await;
        };

        let now = self.clock.now_ms();
        match Freshness::of(&record, now, self.ttl_ms, self.stale_ttl_ms) {
            Freshness::Fresh => Ok(record.value),
            Freshness::Stale => {
                let (_, started) = self.join_or_start(key, producer, true);
                if started {
                    tracing::debug!(
                        "Serving stale value, revalidating in background: key={}, age_ms={}",
                        key,
                        record.age_ms(now)
                    );
                }
                Ok(record.value)
            }
            Freshness::Expired => {
                tracing::debug!(
                    "Expired value: key={}, age_ms={}",
                    key,
                    record.age_ms(now)
                );
                self.produce(key, producer).await
            }
        }
    }

    /// Produce a new value for `key` regardless of the stored record's age.
    ///
    /// Goes through the same deduplication as [`wrap`](Self::wrap): if a producer is
    /// already running for the key, this waits for it instead of starting another.
    pub async fn revalidate<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        self.produce(key, producer).await
    }

    /// Wait for a new value, joining the running invocation if there is one.
    async fn produce<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let (pending, started) = self.join_or_start(key, producer, false);
        if !started {
            tracing::debug!("Joining in-flight producer: key={}", key);
        }
        pending.await
    }

    /// Register a producer run for `key` unless one is already running.
    ///
    /// The run writes the record and fires the observer on success. `background` only
    /// selects how a failure is logged: nobody awaits a background refresh started from a
    /// stale read, so its failure would otherwise go unseen.
    fn join_or_start<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        background: bool,
    ) -> (crate::inflight::Pending<V>, bool)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let notifier = self.notifier.clone();
        let key_owned = key.to_string();

        self.inflight.join_or_start(key, move || async move {
            let result = run_producer(store, clock, notifier, &key_owned, producer).await;
            if let Err(ref e) = result {
                if background {
                    tracing::warn!("Background revalidation failed: key={}, error={}", key_owned, e);
                } else {
                    tracing::debug!("Producer failed: key={}, error={}", key_owned, e);
                }
            }
            result
        })
    }
}

/// Call the producer, persist its value and notify the observer.
async fn run_producer<V, F, Fut, E>(
    store: Arc<dyn Store<V>>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<Notifier<V>>>,
    key: &str,
    producer: F,
) -> Result<V, CacheError>
where
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
    E: Into<BoxError>,
{
    let value = producer().await.map_err(CacheError::producer)?;

    store
        .set(key, Record::new(value.clone(), clock.now_ms()))
        .await?;

    notify(notifier.as_deref(), key, &value);
    Ok(value)
}

fn notify<V>(notifier: Option<&Notifier<V>>, key: &str, value: &V)
where
    V: Clone + Send + Sync + 'static,
{
    if let Some(notifier) = notifier {
        notifier.send(key, value);
    }
}

/// Hands update notifications to the observer on a dedicated task, in write order.
///
/// The task is spawned on first use, so a cache can be built outside a runtime. It ends
/// when the last handle to the cache is dropped.
struct Notifier<V> {
    observer: UpdateObserver<V>,
    queue: OnceLock<mpsc::UnboundedSender<(String, V)>>,
}

impl<V> Notifier<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn new(observer: UpdateObserver<V>) -> Self {
        Notifier {
            observer,
            queue: OnceLock::new(),
        }
    }

    fn send(&self, key: &str, value: &V) {
        let queue = self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(deliver(Arc::clone(&self.observer), rx));
            tx
        });

        if queue.send((key.to_string(), value.clone())).is_err() {
            tracing::warn!("Update observer task is gone, dropping notification: key={}", key);
        }
    }
}

/// Run the observer for every queued update. A panicking observer is logged and skipped.
async fn deliver<V>(observer: UpdateObserver<V>, mut rx: mpsc::UnboundedReceiver<(String, V)>) {
    while let Some((key, value)) = rx.recv().await {
        if catch_unwind(AssertUnwindSafe(|| observer(&key, &value))).is_err() {
            tracing::warn!("Update observer panicked: key={}", key);
        }
    }
}
