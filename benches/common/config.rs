use std::env;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Benchmark settings, read from environment variables.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// REDIS_URL. Redis benchmarks are skipped when it is unreachable.
    pub redis_url: String,

    /// DB_LATENCY_MS, simulated producer latency (default 50)
    pub db_latency_ms: u64,

    /// BENCH_SAMPLE_SIZE (default 100)
    pub sample_size: usize,

    /// TTL_MS, freshness window of every benchmarked cache (default 60s)
    pub ttl: Duration,

    /// STALE_TTL_MS, stale-serve window (default 5min)
    pub stale_ttl: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_latency_ms: env_or("DB_LATENCY_MS", 50),
            sample_size: env_or("BENCH_SAMPLE_SIZE", 100),
            ttl: Duration::from_millis(env_or("TTL_MS", 60_000)),
            stale_ttl: Duration::from_millis(env_or("STALE_TTL_MS", 300_000)),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        let config = Self::default();
        eprintln!("Benchmark Configuration:");
        eprintln!("  Redis URL: {}", config.redis_url);
        eprintln!("  DB Latency: {}ms", config.db_latency_ms);
        eprintln!("  Sample Size: {}", config.sample_size);
        eprintln!("  TTL: {:?} (+{:?} stale)", config.ttl, config.stale_ttl);
        config
    }
}
