//! Ingestion configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default capacity of the dispatcher queue.
pub const DEFAULT_DISPATCHER_CAPACITY: usize = 100;

/// Default time-to-live of directory cache entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of directory cache entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 5000;

/// Default interval between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Worker queue slots per worker when no explicit capacity is set.
const WORKER_QUEUE_SLOTS_PER_WORKER: usize = 10;

/// Configuration for an ingestion pipeline.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct IngestConfig {
    /// Capacity of the queue producers send path events into.
    #[builder(default = "DEFAULT_DISPATCHER_CAPACITY")]
    #[serde(default = "default_dispatcher_capacity")]
    pub dispatcher_capacity: usize,

    /// Number of file workers.
    #[builder(default = "default_worker_count()")]
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Capacity of the worker queue (None = 10 slots per worker).
    #[builder(default)]
    #[serde(default)]
    pub worker_queue_capacity: Option<usize>,

    /// Lifetime of a directory cache entry.
    #[builder(default = "DEFAULT_CACHE_TTL")]
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: Duration,

    /// Maximum number of directory cache entries.
    #[builder(default = "DEFAULT_CACHE_CAPACITY")]
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Minimum time between two progress log lines.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,
}

fn default_dispatcher_capacity() -> usize {
    DEFAULT_DISPATCHER_CAPACITY
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_progress_interval() -> Duration {
    DEFAULT_PROGRESS_INTERVAL
}

/// Five sixths of the available parallelism, at least one.
fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (5 * cpus / 6).max(1)
}

impl IngestConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.dispatcher_capacity == Some(0) {
            return Err("Dispatcher capacity must be at least 1".to_string());
        }
        if self.worker_count == Some(0) {
            return Err("Worker count must be at least 1".to_string());
        }
        if self.worker_queue_capacity == Some(Some(0)) {
            return Err("Worker queue capacity must be at least 1".to_string());
        }
        if self.cache_capacity == Some(0) {
            return Err("Cache capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl IngestConfig {
    /// Create a new config builder.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Effective capacity of the worker queue.
    pub fn worker_queue_capacity(&self) -> usize {
        self.worker_queue_capacity
            .unwrap_or(self.worker_count * WORKER_QUEUE_SLOTS_PER_WORKER)
            .max(1)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dispatcher_capacity: DEFAULT_DISPATCHER_CAPACITY,
            worker_count: default_worker_count(),
            worker_queue_capacity: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = IngestConfig::builder()
            .worker_count(4usize)
            .dispatcher_capacity(8usize)
            .cache_ttl(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.worker_count, 4);
        assert_eq!(config.dispatcher_capacity, 8);
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.worker_queue_capacity(), 40);
    }

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.dispatcher_capacity, 100);
        assert!(config.worker_count >= 1);
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.progress_interval, Duration::from_secs(60));
        assert_eq!(config.worker_queue_capacity(), config.worker_count * 10);
    }

    #[test]
    fn test_explicit_worker_queue_capacity() {
        let config = IngestConfig::builder()
            .worker_count(2usize)
            .worker_queue_capacity(3usize)
            .build()
            .unwrap();
        assert_eq!(config.worker_queue_capacity(), 3);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = IngestConfig::builder().worker_count(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_queue() {
        assert!(IngestConfig::builder().dispatcher_capacity(0usize).build().is_err());
        assert!(IngestConfig::builder().worker_queue_capacity(0usize).build().is_err());
    }
}
