//! Shared, bounded result cache.
//!
//! Keys are spread across independently locked shards so concurrent
//! requests for different images rarely contend. Each shard is an LRU map
//! with its own slice of the entry and byte budgets; inserting past either
//! budget evicts least-recently-used entries first.
//!
//! Values are immutable blobs behind `Arc`, so a hit hands out a cheap clone
//! while the entry stays cached.

use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::CacheConfig;

struct Shard {
    entries: LruCache<String, Arc<[u8]>>,
    bytes: usize,
}

/// Thread-safe key → blob store with LRU eviction.
pub struct SharedCache {
    shards: Vec<Mutex<Shard>>,
    shard_max_bytes: usize,
    evictions: AtomicU64,
}

impl SharedCache {
    /// Build a cache with the configured bounds.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.max_entries, config.max_bytes, config.shards)
    }

    /// Build a cache holding at most `max_entries` entries and `max_bytes`
    /// bytes, split evenly over `shards` shards.
    pub fn with_limits(max_entries: usize, max_bytes: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        let per_shard_entries = NonZeroUsize::new((max_entries / shards).max(1))
            .unwrap_or(NonZeroUsize::MIN);
        let shard_max_bytes = max_bytes / shards;

        let shards = (0..shards)
            .map(|_| {
                Mutex::new(Shard {
                    entries: LruCache::new(per_shard_entries),
                    bytes: 0,
                })
            })
            .collect();

        Self {
            shards,
            shard_max_bytes,
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a blob, marking it as recently used.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.shard(key).entries.get(key).cloned()
    }

    /// Check for a key without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.shard(key).entries.contains(key)
    }

    /// Insert or overwrite a blob.
    ///
    /// Returns `false` when the blob alone exceeds a shard's byte budget and
    /// was therefore not stored.
    pub fn put(&self, key: impl Into<String>, blob: Arc<[u8]>) -> bool {
        let key = key.into();
        let size = blob.len();
        if size > self.shard_max_bytes {
            tracing::debug!(
                "Not caching {}: {} bytes exceeds shard budget of {} bytes",
                key,
                size,
                self.shard_max_bytes
            );
            return false;
        }

        let mut shard = self.shard(&key);
        if let Some(previous) = shard.entries.pop(&key) {
            shard.bytes -= previous.len();
        }

        let mut evicted = 0u64;
        while shard.bytes + size > self.shard_max_bytes {
            match shard.entries.pop_lru() {
                Some((_, old)) => {
                    shard.bytes -= old.len();
                    evicted += 1;
                }
                None => break,
            }
        }

        if let Some((_, old)) = shard.entries.push(key, blob) {
            shard.bytes -= old.len();
            evicted += 1;
        }
        shard.bytes += size;

        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
            tracing::trace!("Evicted {} cache entries", evicted);
        }
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| lock(s).entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total cached bytes.
    pub fn total_bytes(&self) -> usize {
        self.shards.iter().map(|s| lock(s).bytes).sum()
    }

    /// Entries evicted since construction.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for shard in &self.shards {
            let mut shard = lock(shard);
            shard.entries.clear();
            shard.bytes = 0;
        }
    }

    fn shard(&self, key: &str) -> MutexGuard<'_, Shard> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        lock(&self.shards[index])
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

// A panic while holding a shard lock cannot leave a half-written entry
// (every mutation is a single LruCache call), so poisoning is ignored.
fn lock(shard: &Mutex<Shard>) -> MutexGuard<'_, Shard> {
    shard.lock().unwrap_or_else(PoisonError::into_inner)
}
