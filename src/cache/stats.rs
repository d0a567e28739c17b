//! Cache Statistics Module
//!
//! Tracks cache performance metrics and produces diagnostic snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Counters ==
/// Hit/miss counters for the hybrid lookup path.
///
/// Atomic so the cache core can record through `&self`.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCounters {
    /// Creates counters with all values at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// == Cache Stats ==
/// Point-in-time diagnostic snapshot of both cache tiers.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of entries in the memory tier
    pub memory_entries: usize,
    /// Number of records in the persistent tier
    pub persistent_entries: usize,
    /// Keys currently held in memory
    pub memory_keys: Vec<String>,
    /// Keys currently held persistently (without the storage prefix)
    pub persistent_keys: Vec<String>,
    /// Number of hybrid lookups served from either tier
    pub hits: u64,
    /// Number of hybrid lookups that missed both tiers
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// When the snapshot was taken
    pub taken_at: String,
}

impl CacheStats {
    /// Builds a snapshot from tier contents and counters.
    pub fn new(
        memory_keys: Vec<String>,
        persistent_keys: Vec<String>,
        counters: &CacheCounters,
    ) -> Self {
        let hits = counters.hits();
        let misses = counters.misses();
        Self {
            memory_entries: memory_keys.len(),
            persistent_entries: persistent_keys.len(),
            memory_keys,
            persistent_keys,
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            taken_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
