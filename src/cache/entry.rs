//! Cache Entry Module
//!
//! Defines the envelope stored for every cached value and its JSON codec.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A single cached value with its storage and expiry metadata.
///
/// Entries are immutable once written; a `set` on the same key replaces the
/// whole envelope. An entry whose expiry has passed is logically absent even
/// while it still occupies storage (lazy expiry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub data: Value,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` after now.
    pub fn new(data: Value, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        Self {
            data,
            stored_at: now,
            expires_at: now + ttl.as_millis() as u64,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds.
    ///
    /// Returns 0 for an expired entry.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    // == Codec ==
    /// Serializes the entry to the persistent tier's string format.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(CacheError::Encode)
    }

    /// Deserializes an entry from the persistent tier's string format.
    ///
    /// A failure means the persisted record is corrupt; callers treat the
    /// entry as absent and may remove the record.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(CacheError::Decode)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
