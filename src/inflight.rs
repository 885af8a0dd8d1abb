//! Per-cache registry of running producer invocations.
//!
//! Every producer run, whether a caller is waiting on it or it refreshes a stale record in
//! the background, goes through [`InflightRegistry::join_or_start`]. The registry is the
//! only place that decides whether a producer is already running for a key.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

use crate::error::CacheError;

/// Handle to a running invocation. Cloning it joins the same outcome.
pub(crate) type Pending<V> = Shared<BoxFuture<'static, Result<V, CacheError>>>;

/// Key -> pending invocation map owned by a single cache.
///
/// Invariant: at most one entry, and so at most one running invocation, per key. The entry
/// is removed once its run settles, on every exit path.
pub(crate) struct InflightRegistry<V> {
    entries: Mutex<HashMap<String, Pending<V>>>,
}

impl<V> InflightRegistry<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        InflightRegistry {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Pending<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the invocation running for `key`, or start `run` as a new one.
    ///
    /// Returns the pending handle and whether this call started the run. The check and the
    /// insert happen under one lock acquisition. A started run is spawned onto the tokio
    /// runtime, so it completes even if nobody awaits the handle.
    pub(crate) fn join_or_start<F, Fut>(self: &Arc<Self>, key: &str, run: F) -> (Pending<V>, bool)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CacheError>> + Send + 'static,
    {
        let mut entries = self.lock();
        if let Some(pending) = entries.get(key) {
            return (pending.clone(), false);
        }

        let (tx, rx) = oneshot::channel();
        let aborted_key = key.to_string();
        let pending: Pending<V> = async move {
            rx.await
                .unwrap_or_else(|_| Err(CacheError::Aborted { key: aborted_key }))
        }
        .boxed()
        .shared();
        entries.insert(key.to_string(), pending.clone());
        drop(entries);

        // Created before spawning so the entry goes away even if the task never runs.
        let guard = RemoveOnDrop {
            registry: Arc::clone(self),
            key: key.to_string(),
        };

        tokio::spawn(async move {
            let result = run().await;
            // Remove before publishing: a caller that finds no entry will read the record
            // this run just wrote.
            drop(guard);
            let _ = tx.send(result);
        });

        (pending, true)
    }

    /// The pending invocation for `key`, if one is running.
    pub(crate) fn get(&self, key: &str) -> Option<Pending<V>> {
        self.lock().get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Removes a registry entry when dropped, including during a panic unwind.
struct RemoveOnDrop<V>
where
    V: Clone + Send + Sync + 'static,
{
    registry: Arc<InflightRegistry<V>>,
    key: String,
}

impl<V> Drop for RemoveOnDrop<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}
