//! Store implementations for the cache library.

pub mod memory;
pub mod metrics;
pub mod moka;
pub mod redis;

pub use memory::HashMapStore;
pub use metrics::{CacheMetric, MetricsSink, MetricsStore, Outcome, StoreOp};
pub use self::moka::{MokaStore, MokaStoreConfig};
pub use self::redis::{KvBackend, KvStore, RedisStore, RedisStoreConfig};
