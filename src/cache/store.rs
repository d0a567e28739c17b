//! Hybrid Cache Module
//!
//! Two-tier cache engine: a process-lifetime memory map in front of a
//! durable storage backend. Lookups check memory first and fall back to the
//! persistent tier, promoting hits back into memory so storage I/O happens
//! at most once per key per process within a TTL window.
//!
//! The cache is a performance layer, never a source of truth: every backend
//! failure is logged and degraded to a miss or a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheCounters, CacheEntry, CacheStats, MAX_KEY_LENGTH, PERSIST_PREFIX};
use crate::error::{CacheError, Result};
use crate::storage::StorageBackend;

// == Hybrid Cache ==
/// Hybrid memory + persistent cache with TTL expiry.
///
/// Constructed with an injected storage backend; the host application
/// creates one instance per process and shares it via `Arc`. Entries are
/// immutable once written; `set` always replaces.
pub struct HybridCache {
    /// Volatile tier, process lifetime
    memory: RwLock<HashMap<String, CacheEntry>>,
    /// Durable tier, survives restarts
    storage: Arc<dyn StorageBackend>,
    /// Hit/miss telemetry for the hybrid lookup path
    counters: CacheCounters,
}

impl HybridCache {
    // == Constructor ==
    /// Creates a cache over the given storage backend.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            storage,
            counters: CacheCounters::new(),
        }
    }

    // == Set ==
    /// Writes an entry to both tiers.
    ///
    /// The memory write always takes effect; a persistent-tier failure is
    /// logged and tolerated, leaving the entry memory-only.
    pub async fn set(&self, key: &str, data: Value, ttl: Duration) -> Result<()> {
        validate(key, ttl)?;
        let entry = CacheEntry::new(data, ttl);
        self.memory
            .write()
            .await
            .insert(key.to_string(), entry.clone());
        self.persist(key, &entry).await;
        Ok(())
    }

    /// Writes an entry into the memory tier only.
    pub async fn set_memory(&self, key: &str, data: Value, ttl: Duration) -> Result<()> {
        validate(key, ttl)?;
        self.memory
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(data, ttl));
        Ok(())
    }

    /// Writes an entry into the persistent tier only.
    ///
    /// On backend failure the operation is a logged no-op.
    pub async fn set_persistent(&self, key: &str, data: Value, ttl: Duration) -> Result<()> {
        validate(key, ttl)?;
        self.persist(key, &CacheEntry::new(data, ttl)).await;
        Ok(())
    }

    // == Get ==
    /// Hybrid lookup: memory first, then the persistent tier.
    ///
    /// A persistent hit is promoted into memory (with its original expiry)
    /// before returning, so a second call within the same process incurs no
    /// storage I/O.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.get_memory(key).await {
            self.counters.record_hit();
            return Some(value);
        }

        match self.read_persistent_entry(key).await {
            Some(entry) => {
                debug!(key, "persistent hit, promoting to memory");
                let value = entry.data.clone();
                self.memory.write().await.insert(key.to_string(), entry);
                self.counters.record_hit();
                Some(value)
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    /// Memory-tier lookup. Expired entries are evicted and reported absent.
    pub async fn get_memory(&self, key: &str) -> Option<Value> {
        let mut memory = self.memory.write().await;
        match memory.get(key) {
            Some(entry) if entry.is_expired() => {
                memory.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Persistent-tier lookup.
    ///
    /// Read failure, a corrupt record, and expiry all report absent; stale
    /// and corrupt records are best-effort removed.
    pub async fn get_persistent(&self, key: &str) -> Option<Value> {
        self.read_persistent_entry(key).await.map(|entry| entry.data)
    }

    // == Invalidate ==
    /// Removes every key containing `pattern` from both tiers.
    ///
    /// Matching is substring-based, so invalidating `menu_items` also purges
    /// `menu_items?category=drinks`. Returns the number of removed entries.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let mut removed = {
            let mut memory = self.memory.write().await;
            let before = memory.len();
            memory.retain(|key, _| !key.contains(pattern));
            before - memory.len()
        };

        match self.matching_storage_keys(|key| key.contains(pattern)).await {
            Ok(keys) if !keys.is_empty() => match self.storage.remove_many(&keys).await {
                Ok(()) => removed += keys.len(),
                Err(err) => warn!(pattern, %err, "persistent invalidation failed"),
            },
            Ok(_) => {}
            Err(err) => warn!(pattern, %err, "listing persistent keys failed"),
        }

        debug!(pattern, removed, "cache invalidation");
        removed
    }

    // == Clear ==
    /// Empties both tiers.
    pub async fn clear_all(&self) {
        self.memory.write().await.clear();

        match self.matching_storage_keys(|_| true).await {
            Ok(keys) if !keys.is_empty() => {
                if let Err(err) = self.storage.remove_many(&keys).await {
                    warn!(%err, "persistent clear failed");
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "listing persistent keys failed"),
        }
    }

    /// Empties the memory tier only; the persistent tier keeps serving
    /// restarts. Used under host memory pressure.
    pub async fn clear_memory(&self) {
        self.memory.write().await.clear();
    }

    // == Cleanup ==
    /// Sweeps expired entries from both tiers.
    ///
    /// Returns the number of entries removed. Safe to run concurrently with
    /// reads; entries are immutable once written, so the sweep is
    /// best-effort rather than atomic.
    pub async fn cleanup(&self) -> usize {
        let mut removed = {
            let mut memory = self.memory.write().await;
            let before = memory.len();
            memory.retain(|_, entry| !entry.is_expired());
            before - memory.len()
        };

        let keys = match self.matching_storage_keys(|_| true).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "listing persistent keys failed");
                return removed;
            }
        };

        let mut stale = Vec::new();
        for storage_key in keys {
            match self.storage.read(&storage_key).await {
                Ok(Some(raw)) => match CacheEntry::decode(&raw) {
                    Ok(entry) if entry.is_expired() => stale.push(storage_key),
                    Ok(_) => {}
                    // Corrupt records are as good as expired
                    Err(_) => stale.push(storage_key),
                },
                Ok(None) => {}
                Err(err) => warn!(key = %storage_key, %err, "cleanup read failed"),
            }
        }

        if !stale.is_empty() {
            match self.storage.remove_many(&stale).await {
                Ok(()) => removed += stale.len(),
                Err(err) => warn!(%err, "cleanup removal failed"),
            }
        }

        removed
    }

    // == Stats ==
    /// Returns a diagnostic snapshot of both tiers. No side effects.
    pub async fn stats(&self) -> CacheStats {
        let memory_keys: Vec<String> = self.memory.read().await.keys().cloned().collect();

        let persistent_keys = match self.storage.list_keys().await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(PERSIST_PREFIX).map(str::to_string))
                .collect(),
            Err(err) => {
                warn!(%err, "listing persistent keys failed");
                Vec::new()
            }
        };

        CacheStats::new(memory_keys, persistent_keys, &self.counters)
    }

    // == Internal ==
    /// Encodes and writes an entry to the backend, absorbing failures.
    async fn persist(&self, key: &str, entry: &CacheEntry) {
        let raw = match entry.encode() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, %err, "cache entry encode failed");
                return;
            }
        };
        if let Err(err) = self.storage.write(&storage_key(key), &raw).await {
            warn!(key, %err, "persistent write failed, entry stays memory-only");
        }
    }

    /// Reads and decodes a live entry from the backend.
    async fn read_persistent_entry(&self, key: &str) -> Option<CacheEntry> {
        let raw = match self.storage.read(&storage_key(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, %err, "persistent read failed, treating as miss");
                return None;
            }
        };

        match CacheEntry::decode(&raw) {
            Ok(entry) if entry.is_expired() => {
                self.discard_persistent(key).await;
                None
            }
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(key, %err, "corrupt persistent record, discarding");
                self.discard_persistent(key).await;
                None
            }
        }
    }

    async fn discard_persistent(&self, key: &str) {
        if let Err(err) = self.storage.remove(&storage_key(key)).await {
            warn!(key, %err, "removing stale persistent record failed");
        }
    }

    /// Storage keys under the cache prefix whose un-prefixed form matches
    /// `predicate`.
    async fn matching_storage_keys<F>(&self, predicate: F) -> Result<Vec<String>>
    where
        F: Fn(&str) -> bool,
    {
        let keys = self.storage.list_keys().await?;
        Ok(keys
            .into_iter()
            .filter(|key| {
                key.strip_prefix(PERSIST_PREFIX)
                    .is_some_and(|unprefixed| predicate(unprefixed))
            })
            .collect())
    }
}

fn storage_key(key: &str) -> String {
    format!("{}{}", PERSIST_PREFIX, key)
}

fn validate(key: &str, ttl: Duration) -> Result<()> {
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if ttl.is_zero() {
        return Err(CacheError::InvalidRequest(
            "TTL must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    fn cache() -> (HybridCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (HybridCache::new(store.clone()), store)
    }

    /// Backend whose every operation fails.
    struct FailingStore;

    #[async_trait]
    impl StorageBackend for FailingStore {
        async fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CacheError::Storage("disk unavailable".into()))
        }
        async fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(CacheError::Storage("disk unavailable".into()))
        }
        async fn remove(&self, _key: &str) -> Result<()> {
            Err(CacheError::Storage("disk unavailable".into()))
        }
        async fn list_keys(&self) -> Result<Vec<String>> {
            Err(CacheError::Storage("disk unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _) = cache();

        cache
            .set("menu_items", json!([{"id": 1}]), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("menu_items").await, Some(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn test_get_absent() {
        let (cache, _) = cache();
        assert!(cache.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_set_writes_both_tiers() {
        let (cache, store) = cache();

        cache
            .set("rewards", json!({"points": 120}), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.get_memory("rewards").await.is_some());
        assert!(store.read("cache_rewards").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let (cache, _) = cache();

        cache
            .set("user_profile", json!({"v": 1}), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("user_profile", json!({"v": 2}), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("user_profile").await, Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_memory_expiry_evicts() {
        let (cache, _) = cache();

        cache
            .set_memory("k", json!("v"), Duration::from_millis(20))
            .await
            .unwrap();
        assert!(cache.get_memory("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get_memory("k").await.is_none());
        // Entry was evicted, not just hidden
        assert!(cache.memory.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_persistent_expiry_discards_record() {
        let (cache, store) = cache();

        cache
            .set_persistent("k", json!("v"), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get_persistent("k").await.is_none());
        assert!(store.read("cache_k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warm_forward_promotes_to_memory() {
        let (cache, store) = cache();

        cache
            .set("menu_items", json!([1, 2]), Duration::from_secs(60))
            .await
            .unwrap();
        cache.clear_memory().await;

        // First get is served from the persistent tier and promoted
        assert_eq!(cache.get("menu_items").await, Some(json!([1, 2])));

        // Remove the backing record; the promoted copy must still serve
        store.remove("cache_menu_items").await.unwrap();
        assert_eq!(cache.get("menu_items").await, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_promotion_keeps_original_expiry() {
        let (cache, _) = cache();

        cache
            .set("k", json!("v"), Duration::from_millis(80))
            .await
            .unwrap();
        cache.clear_memory().await;

        assert!(cache.get("k").await.is_some());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The promoted entry expires on the original schedule
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_treated_as_absent() {
        let (cache, store) = cache();

        store.write("cache_bad", "{not json").await.unwrap();

        assert!(cache.get_persistent("bad").await.is_none());
        // Corrupt record was opportunistically purged
        assert!(store.read("cache_bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_substring_scope() {
        let (cache, _) = cache();

        cache
            .set("menu_items?category=tea", json!("tea"), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("rewards", json!("points"), Duration::from_secs(60))
            .await
            .unwrap();

        let removed = cache.invalidate("menu_items").await;

        assert_eq!(removed, 2); // memory + persistent copies of the one key
        assert!(cache.get("menu_items?category=tea").await.is_none());
        assert_eq!(cache.get("rewards").await, Some(json!("points")));
    }

    #[tokio::test]
    async fn test_invalidate_leaves_other_groups() {
        let (cache, _) = cache();

        cache
            .set("user_profile", json!({"name": "a"}), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("orders", json!([]), Duration::from_secs(60))
            .await
            .unwrap();

        cache.invalidate("user_profile").await;

        assert!(cache.get("user_profile").await.is_none());
        assert!(cache.get("orders").await.is_some());
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_tiers() {
        let (cache, store) = cache();

        cache
            .set("a", json!(1), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("b", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear_all().await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let (cache, _) = cache();

        cache
            .set("short", json!(1), Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .set("long", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        let removed = cache.cleanup().await;

        assert_eq!(removed, 2); // memory + persistent copies of "short"
        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_purges_corrupt_records() {
        let (cache, store) = cache();

        store.write("cache_bad", "???").await.unwrap();
        cache.cleanup().await;

        assert!(store.read("cache_bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_memory_only() {
        let cache = HybridCache::new(Arc::new(FailingStore));

        cache
            .set("k", json!("v"), Duration::from_secs(60))
            .await
            .unwrap();

        // Memory tier still serves despite every backend call failing
        assert_eq!(cache.get("k").await, Some(json!("v")));
        assert_eq!(cache.invalidate("nothing").await, 0);
        cache.clear_all().await;
        assert_eq!(cache.cleanup().await, 0);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let (cache, _) = cache();

        cache
            .set("menu_items", json!([]), Duration::from_secs(60))
            .await
            .unwrap();
        cache.get("menu_items").await; // hit
        cache.get("missing").await; // miss

        let stats = cache.stats().await;
        assert_eq!(stats.memory_entries, 1);
        assert_eq!(stats.persistent_entries, 1);
        assert_eq!(stats.memory_keys, vec!["menu_items".to_string()]);
        assert_eq!(stats.persistent_keys, vec!["menu_items".to_string()]);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (cache, _) = cache();

        let result = cache.set("k", json!(1), Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_oversized_key_rejected() {
        let (cache, _) = cache();
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = cache.set(&long_key, json!(1), Duration::from_secs(60)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
