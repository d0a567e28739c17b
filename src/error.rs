//! Error types for the cache subsystem
//!
//! Provides unified error handling using thiserror.
//!
//! Only `Producer` can reach application code through the request wrapper;
//! every other variant is absorbed inside the cache, which degrades to a
//! miss instead of failing the caller.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A data producer failed; propagated verbatim, never cached
    #[error(transparent)]
    Producer(#[from] anyhow::Error),

    /// Persistent storage backend failure
    #[error("storage backend error: {0}")]
    Storage(String),

    /// A persisted record could not be decoded
    #[error("corrupt cache record: {0}")]
    Decode(serde_json::Error),

    /// A value could not be serialized for caching
    #[error("cache encode failed: {0}")]
    Encode(serde_json::Error),

    /// Invalid request data (zero TTL, oversized key)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
