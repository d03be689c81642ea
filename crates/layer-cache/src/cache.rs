//! In-memory LRU cache keyed by structured layer keys.

use lru::LruCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tracing::debug;

/// Errors raised when building a cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache capacity must be greater than zero")]
    ZeroCapacity,
}

/// Counters for cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries evicted for capacity
    pub evictions: u64,
    /// Entries removed by predicate
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Capacity-bounded LRU cache.
///
/// Single-threaded: all mutation goes through `&mut self`, so no locking is
/// needed.
pub struct LayerCache<K, V> {
    cache: LruCache<K, V>,
    stats: CacheStats,
}

impl<K, V> LayerCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
{
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self {
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        })
    }

    /// Look up an entry, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.cache.get(key) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Look up an entry without touching recency or statistics.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.cache.peek(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    /// Insert an entry, marking it most recently used.
    ///
    /// Replacing an existing key keeps the entry count unchanged. When the
    /// insertion takes the cache over capacity, the least recently used
    /// entry is evicted and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let inserted = key.clone();
        match self.cache.push(key, value) {
            Some((old_key, _)) if old_key == inserted => None,
            Some((evicted_key, evicted)) => {
                self.stats.evictions += 1;
                debug!(
                    evicted = ?evicted_key,
                    inserted = ?inserted,
                    capacity = self.cache.cap().get(),
                    "Layer cache evicted least recently used entry"
                );
                Some((evicted_key, evicted))
            }
            None => None,
        }
    }

    /// Remove every entry for which `predicate(key, value)` holds and return
    /// the removed pairs.
    pub fn remove_matching<F>(&mut self, mut predicate: F) -> Vec<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .cache
            .iter()
            .filter(|(k, v)| predicate(*k, *v))
            .map(|(k, _)| k.clone())
            .collect();

        let removed: Vec<(K, V)> = doomed
            .into_iter()
            .filter_map(|k| self.cache.pop(&k).map(|v| (k, v)))
            .collect();

        if !removed.is_empty() {
            self.stats.invalidations += removed.len() as u64;
            debug!(
                removed = removed.len(),
                remaining = self.cache.len(),
                "Layer cache invalidated entries"
            );
        }
        removed
    }

    /// Drop all entries. Statistics are kept.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.cache.iter().map(|(k, _)| k.clone()).collect()
    }
}
