//! Cache Module
//!
//! Hybrid memory + persistent caching with TTL expiry and group
//! invalidation.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::derive_key;
pub use stats::{CacheCounters, CacheStats};
pub use store::HybridCache;

// == Public Constants ==
/// Prefix applied to every key in the persistent tier
pub const PERSIST_PREFIX: &str = "cache_";

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
