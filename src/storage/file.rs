//! File Storage Backend
//!
//! Durable backend keeping one file per key beneath a configured directory.
//! Key text is escaped into a safe file name so that keys may contain `?`,
//! `&`, `=` and other separator characters.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{CacheError, Result};
use crate::storage::StorageBackend;

const FILE_EXT: &str = "json";

// == File Store ==
/// File-per-key storage backend.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", escape_key(key), FILE_EXT))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::Storage(format!("create {}: {}", self.dir.display(), e)))
    }
}

#[async_trait]
impl StorageBackend for FileStore {
    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir().await?;
        fs::write(self.path_for(key), value)
            .await
            .map_err(|e| CacheError::Storage(format!("write {}: {}", key, e)))
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Storage(format!("read {}: {}", key, e))),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Storage(format!("remove {}: {}", key, e))),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CacheError::Storage(format!(
                    "list {}: {}",
                    self.dir.display(),
                    e
                )))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::Storage(format!("list {}: {}", self.dir.display(), e)))?
        {
            if let Some(key) = key_for(&entry.path()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Escapes a key into a file-name-safe form.
///
/// Alphanumerics and `-` `_` `.` pass through; every other byte becomes
/// `%XX`. The escaping is reversible so `list_keys` can recover key text.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

fn unescape_key(escaped: &str) -> Option<String> {
    let mut out = Vec::with_capacity(escaped.len());
    let bytes = escaped.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn key_for(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != FILE_EXT {
        return None;
    }
    unescape_key(path.file_stem()?.to_str()?)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_escape_round_trip() {
        let key = "cache_menu_items?category=drinks&page=2";
        let escaped = escape_key(key);
        assert!(!escaped.contains('?'));
        assert!(!escaped.contains('&'));
        assert_eq!(unescape_key(&escaped).unwrap(), key);
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write("cache_rewards", "payload").await.unwrap();
        let value = store.read("cache_rewards").await.unwrap();
        assert_eq!(value.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_read_absent_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.read("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.read("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_recovers_key_text() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .write("cache_menu_items?category=tea", "a")
            .await
            .unwrap();
        store.write("cache_orders", "b").await.unwrap();

        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "cache_menu_items?category=tea".to_string(),
                "cache_orders".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_list_keys_empty_dir_absent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never_created"));

        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
