//! Per-element object cache.
//!
//! `ObjectCache` maps an element's identity to the element instance that was
//! handed out for it, so repeated reads of the same logical row return the
//! same instance until the entry is invalidated. It knows nothing about result
//! sets; the facade and the change listener decide when to fill and when to
//! invalidate.

use crate::config::CacheConfig;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::hash::Hash;
use hashbrown::HashMap;

/// Cache shared by a root facade and every facade derived from it.
pub type SharedCache<K, T> = Rc<RefCell<ObjectCache<K, T>>>;

/// Counters describing how a cache has been used.
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    hits: Cell<u64>,
    misses: Cell<u64>,
    invalidations: Cell<u64>,
    clears: Cell<u64>,
}

impl CacheStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }

    /// Get hit count
    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    /// Get miss count
    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    /// Number of single entries removed by invalidation
    pub fn invalidations(&self) -> u64 {
        self.invalidations.get()
    }

    /// Number of times the whole cache was cleared
    pub fn clears(&self) -> u64 {
        self.clears.get()
    }

    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Identity-keyed element cache.
#[derive(Debug)]
pub struct ObjectCache<K, T> {
    entries: HashMap<K, T>,
    stats: CacheStats,
    track_stats: bool,
}

impl<K: Hash + Eq, T: Clone> Default for ObjectCache<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, T: Clone> ObjectCache<K, T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Creates an empty cache sized and instrumented per `config`.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::with_capacity(config.initial_capacity),
            stats: CacheStats::new(),
            track_stats: config.track_stats,
        }
    }

    /// Creates a cache wrapped for sharing between facades.
    pub fn shared(config: &CacheConfig) -> SharedCache<K, T> {
        Rc::new(RefCell::new(Self::with_config(config)))
    }

    /// Returns the cached instance for `key`.
    pub fn get(&self, key: &K) -> Option<T> {
        let found = self.entries.get(key).cloned();
        if self.track_stats {
            if found.is_some() {
                CacheStats::bump(&self.stats.hits);
            } else {
                CacheStats::bump(&self.stats.misses);
            }
        }
        found
    }

    /// Returns true if `key` has a cached instance. Does not count as a read.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` as the instance for `key`.
    pub fn insert(&mut self, key: K, value: T) {
        self.entries.insert(key, value);
    }

    /// Removes the entry for `key`, forcing a fresh read next time.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        let removed = self.entries.remove(key);
        if removed.is_some() && self.track_stats {
            CacheStats::bump(&self.stats.invalidations);
        }
        removed
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        if self.track_stats {
            CacheStats::bump(&self.stats.clears);
        }
    }

    /// Returns the number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the usage counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
