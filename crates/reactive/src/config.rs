//! Cache configuration options.

/// Configuration for a root facade's object cache.
///
/// Derived facades never read this: they reuse their root's cache as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of entries to reserve up front
    pub initial_capacity: usize,
    /// Whether hit/miss/invalidation counters are maintained
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            track_stats: true,
        }
    }
}

impl CacheConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of entries reserved up front
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Enable or disable statistics counters
    pub fn with_track_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }
}
