//! Directory resolution cache.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dirgraph_core::NodeId;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    id: NodeId,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Maps directory paths to the node ids they resolved to.
///
/// Entries expire a fixed time after insertion and are advisory: a miss only
/// means the caller has to ask the store. The map is sharded, so the
/// dispatcher and every worker can use it concurrently.
#[derive(Debug)]
pub struct DirectoryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl DirectoryCache {
    /// Create a cache holding roughly `capacity` entries for `ttl` each.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Resolved id for `path`, if cached and not yet expired.
    ///
    /// Expired entries are removed on access.
    pub fn get(&self, path: &str) -> Option<NodeId> {
        let entry = self.entries.get(path)?;
        if !entry.is_expired() {
            return Some(entry.id);
        }
        drop(entry);

        self.entries.remove_if(path, |_, e| e.is_expired());
        None
    }

    /// Insert or overwrite an entry with an explicit lifetime.
    pub fn set(&self, path: impl Into<String>, id: NodeId, ttl: Duration) {
        let path = path.into();
        if !self.entries.contains_key(&path) && self.entries.len() >= self.capacity {
            self.make_room();
        }
        self.entries.insert(
            path,
            CacheEntry {
                id,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Insert or overwrite an entry with the default lifetime.
    pub fn insert(&self, path: impl Into<String>, id: NodeId) {
        self.set(path, id, self.ttl);
    }

    /// Default entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Purge expired entries, then evict the oldest tenth if still full.
    fn make_room(&self) {
        self.entries.retain(|_, e| !e.is_expired());
        if self.entries.len() < self.capacity {
            return;
        }

        let batch = (self.capacity / 10).max(1);
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

        for (path, _) in by_age.into_iter().take(batch) {
            self.entries.remove(&path);
        }
        tracing::debug!(evicted = batch, "directory cache full");
    }
}
