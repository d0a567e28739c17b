//! Storage Backend Trait
//!
//! Boundary between the cache core and whatever durable key/value store the
//! host platform provides. Implementations only move strings; the cache core
//! owns prefixing, encoding and expiry.

use async_trait::async_trait;

use crate::error::Result;

// == Storage Backend ==
/// Minimal durable key -> string store.
///
/// Every error an implementation returns is absorbed by the cache core and
/// degraded to a miss; a backend failure must never surface to application
/// code.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Returns the value stored under `key`, or `None` if absent.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key in `keys`.
    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Lists every stored key.
    async fn list_keys(&self) -> Result<Vec<String>>;
}
