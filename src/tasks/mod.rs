//! Background Tasks Module
//!
//! Contains the scheduler owning the cache's background timers.
//!
//! # Tasks
//! - Cleanup: removes expired entries from both tiers at configured intervals
//! - Preload: one-shot deferred warm-up of high-value namespaces

mod scheduler;

pub use scheduler::{CacheScheduler, PreloadProducer, PreloadTask};
