use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Value type cached by every benchmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub score: u32,
}

impl BenchUser {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            score: (id % 1000) as u32,
        }
    }
}

/// Simulated origin with configurable latency, used as the producer behind every cache.
#[derive(Clone)]
pub struct FakeDatabase {
    users: Arc<HashMap<String, BenchUser>>,
    latency: Duration,
    fetches: Arc<AtomicUsize>,
}

impl FakeDatabase {
    pub fn new(num_users: usize, latency_ms: u64) -> Self {
        let users = (0..num_users as u64)
            .map(|id| (user_key(id), BenchUser::new(id)))
            .collect();

        Self {
            users: Arc::new(users),
            latency: Duration::from_millis(latency_ms),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Producer-shaped lookup: fails for unknown ids the way an origin would.
    pub async fn fetch(&self, key: &str) -> Result<BenchUser, String> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;

        self.users
            .get(key)
            .cloned()
            .ok_or_else(|| format!("{} not found", key))
    }

    /// Number of producer calls that reached the origin.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    #[allow(dead_code)]
    pub fn reset(&self) {
        self.fetches.store(0, Ordering::Relaxed);
    }
}

pub fn user_key(id: u64) -> String {
    format!("user:{}", id)
}

/// Key streams for the different workloads. Seeded, so runs are comparable.
pub struct KeyGenerator {
    num_keys: u64,
    seed: u64,
}

impl KeyGenerator {
    pub fn new(num_keys: usize) -> Self {
        Self {
            num_keys: num_keys as u64,
            seed: 0x5eed,
        }
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Every key once, in order.
    pub fn sequential(&self) -> Vec<String> {
        (0..self.num_keys).map(user_key).collect()
    }

    /// `hit_ratio` of the requests go to a prepopulated prefix of the key space.
    pub fn mixed(&self, hit_ratio: f64) -> Vec<String> {
        let mut rng = self.rng();
        let warm = ((self.num_keys as f64 * hit_ratio) as u64).clamp(1, self.num_keys - 1);

        (0..1000)
            .map(|_| {
                let id = if rng.gen_bool(hit_ratio) {
                    rng.gen_range(0..warm)
                } else {
                    rng.gen_range(warm..self.num_keys)
                };
                user_key(id)
            })
            .collect()
    }

    /// Skewed stream: 80% of requests hit the hottest 20% of keys.
    pub fn hot_keys(&self, count: usize) -> Vec<String> {
        let mut rng = self.rng();
        let hot = (self.num_keys / 5).max(1);

        (0..count)
            .map(|_| {
                let id = if rng.gen_bool(0.8) {
                    rng.gen_range(0..hot)
                } else {
                    rng.gen_range(hot..self.num_keys)
                };
                user_key(id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_database() {
        let db = FakeDatabase::new(10, 0);

        assert_eq!(db.fetch("user:0").await.unwrap().id, 0);
        assert_eq!(db.fetch("user:10").await.unwrap_err(), "user:10 not found");
        assert_eq!(db.fetches(), 2);
    }

    #[test]
    fn test_key_generator() {
        let key_gen = KeyGenerator::new(100);

        let seq = key_gen.sequential();
        assert_eq!(seq.len(), 100);
        assert_eq!(seq[0], "user:0");

        // Seeded: identical streams across calls
        assert_eq!(key_gen.mixed(0.8), key_gen.mixed(0.8));

        let hot = key_gen.hot_keys(1000);
        let in_hot_set = hot
            .iter()
            .filter(|k| k[5..].parse::<u64>().unwrap() < 20)
            .count();
        assert!(in_hot_set > 600);
    }
}
