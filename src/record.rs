use serde::{Deserialize, Serialize};

/// A cached value and the time it was produced.
///
/// Records are always replaced as a whole; nothing mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<V> {
    /// The cached value.
    pub value: V,

    /// Unix timestamp in milliseconds of the last successful write.
    pub updated_at: i64,
}

impl<V> Record<V> {
    /// Create a new record.
    pub fn new(value: V, updated_at: i64) -> Self {
        Record { value, updated_at }
    }

    /// Milliseconds elapsed since the record was written.
    ///
    /// Negative when the clock reads earlier than `updated_at`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.updated_at)
    }
}

/// Where a record sits relative to the freshness and stale-serve windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `age <= ttl`: serve as is.
    Fresh,
    /// `ttl < age <= ttl + stale_ttl`: serve, and refresh in the background.
    Stale,
    /// `age > ttl + stale_ttl`: the caller waits for a new value.
    Expired,
}

impl Freshness {
    /// Classify an age against the two windows (all values in milliseconds).
    ///
    /// The windows are additive. A negative age (clock behind the record) is fresh.
    pub fn classify(age_ms: i64, ttl_ms: i64, stale_ttl_ms: i64) -> Self {
        if age_ms <= ttl_ms {
            Freshness::Fresh
        } else if age_ms <= ttl_ms.saturating_add(stale_ttl_ms) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Classify a record read at `now_ms`.
    pub fn of<V>(record: &Record<V>, now_ms: i64, ttl_ms: i64, stale_ttl_ms: i64) -> Self {
        Self::classify(record.age_ms(now_ms), ttl_ms, stale_ttl_ms)
    }
}
