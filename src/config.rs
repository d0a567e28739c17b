//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory the file-backed persistent tier writes under
    pub storage_dir: PathBuf,
    /// Interval between background cleanup sweeps
    pub cleanup_interval: Duration,
    /// Delay before the one-shot startup preload fires
    pub preload_delay: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Persistent tier directory (default: `.cache`)
    /// - `CACHE_CLEANUP_INTERVAL_SECS` - Cleanup sweep interval in seconds (default: 1800)
    /// - `CACHE_PRELOAD_DELAY_MS` - Startup preload delay in milliseconds (default: 2000)
    pub fn from_env() -> Self {
        Self {
            storage_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".cache")),
            cleanup_interval: env_duration_secs("CACHE_CLEANUP_INTERVAL_SECS", 1800),
            preload_delay: env_duration_ms("CACHE_PRELOAD_DELAY_MS", 2000),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".cache"),
            cleanup_interval: Duration::from_secs(1800),
            preload_delay: Duration::from_millis(2000),
        }
    }
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default_secs))
}

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}
