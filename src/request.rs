//! Request Wrapper Module
//!
//! Wraps a data fetch in the hybrid cache: a hit returns the cached value
//! without running the producer; a miss runs the producer and caches its
//! result.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{derive_key, HybridCache};
use crate::error::{CacheError, Result};

/// Runs `producer` through the cache under the key derived from `namespace`.
///
/// Equivalent to [`cached_request_with_params`] with no parameters.
pub async fn cached_request<T, F, Fut>(
    cache: &HybridCache,
    namespace: &str,
    ttl: Duration,
    producer: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    cached_request_with_params(cache, namespace, &[], ttl, producer).await
}

/// Returns the cached value for (`namespace`, `params`), or runs `producer`
/// and caches its result for `ttl`.
///
/// On a hit the producer is never invoked. A producer error is propagated
/// unchanged and nothing is cached, so the next call retries. Failing to
/// persist a fresh result does not fail the call.
///
/// Concurrent misses for the same key are not deduplicated; overlapping
/// calls may each run the producer. Producers are expected to be idempotent
/// reads.
pub async fn cached_request_with_params<T, F, Fut>(
    cache: &HybridCache,
    namespace: &str,
    params: &[(&str, Value)],
    ttl: Duration,
    producer: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let key = derive_key(namespace, params);

    if let Some(cached) = cache.get(&key).await {
        match serde_json::from_value(cached) {
            Ok(value) => {
                debug!(%key, "serving cached response");
                return Ok(value);
            }
            // Shape drifted since the entry was written; refetch
            Err(err) => warn!(%key, %err, "cached value no longer deserializes"),
        }
    }

    let produced = producer().await.map_err(CacheError::Producer)?;

    match serde_json::to_value(&produced) {
        Ok(value) => {
            if let Err(err) = cache.set(&key, value, ttl).await {
                warn!(%key, %err, "caching fresh result failed");
            }
        }
        Err(err) => warn!(%key, %err, "fresh result not serializable for caching"),
    }

    Ok(produced)
}
