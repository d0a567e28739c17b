//! Hybrid Cache - a client-side two-tier cache
//!
//! Sits between an application's data-access calls and its remote API:
//! an in-memory tier backed by a persistent tier, with TTL expiry,
//! parameterized key derivation, group invalidation, scheduled cleanup and
//! basic health telemetry.
//!
//! The cache is a performance optimization, never a source of truth: every
//! internal failure degrades to a miss, and only data producers can surface
//! errors to the caller.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hybrid_cache::{cached_request, CacheConfig, FileStore, HybridCache};
//!
//! let config = CacheConfig::from_env();
//! let cache = Arc::new(HybridCache::new(Arc::new(FileStore::new(&config.storage_dir))));
//!
//! let menu: Vec<MenuItem> = cached_request(&cache, "menu_items", Duration::from_secs(600), || async {
//!     api.fetch_menu_items().await
//! })
//! .await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod request;
pub mod storage;
pub mod tasks;

pub use cache::{derive_key, CacheEntry, CacheStats, HybridCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use invalidation::{apply_mutation, InvalidationGroup, MutationEvent};
pub use request::{cached_request, cached_request_with_params};
pub use storage::{FileStore, MemoryStore, StorageBackend};
pub use tasks::{CacheScheduler, PreloadTask};
