//! Single-file durable store.
//!
//! Holds the whole keyspace in memory and rewrites one JSON file on every
//! mutation, via a temp-file-then-rename replace so a crash mid-write leaves
//! the previous snapshot intact. Suited to the data volumes of a vocabulary
//! bot; not a general-purpose database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leitbox_core::store::{KvStore, StoreError};

/// A `KvStore` persisted as one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    map: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl JsonFileStore {
    /// Open the store, loading the existing snapshot if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|e| StoreError::Unavailable(format!("read {}: {e}", path.display())))?;
            serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Unavailable(format!("parse {}: {e}", path.display())))?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::Unavailable(format!("create {}: {e}", parent.display()))
                    })?;
                }
            }
            BTreeMap::new()
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    /// Write the snapshot to a sibling temp file, then rename over the
    /// target. Called with the map lock held.
    fn flush(&self, map: &BTreeMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(map)
            .map_err(|e| StoreError::Unavailable(format!("serialize store: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Unavailable(format!("rename to {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut map = self.map.lock().await;
        map.insert(key.to_string(), value);
        self.flush(&map)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.map.lock().await;
        if map.remove(key).is_some() {
            self.flush(&map)?;
        }
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .map
            .lock()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn put_if(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let mut map = self.map.lock().await;
        let matches = match (map.get(key), expected) {
            (Some(current), Some(exp)) => current.as_slice() == exp,
            (None, None) => true,
            _ => false,
        };
        if matches {
            map.insert(key.to_string(), value);
            self.flush(&map)?;
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leitbox.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.put("card:1:a", b"one".to_vec()).await.unwrap();
            store.put("session:1", b"two".to_vec()).await.unwrap();
            store.delete("session:1").await.unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("card:1:a").await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get("session:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/leitbox.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.put("k", b"v".to_vec()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn prefix_scan_matches_memory_semantics() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
        store.put("counter:reviews", b"1".to_vec()).await.unwrap();
        store.put("card:7:b", b"2".to_vec()).await.unwrap();
        store.put("card:7:a", b"3".to_vec()).await.unwrap();

        let entries = store.list_by_prefix("card:7:").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["card:7:a", "card:7:b"]);
    }

    #[tokio::test]
    async fn put_if_is_conditional_and_durable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.put_if("k", None, b"v1".to_vec()).await.unwrap());
        assert!(!store.put_if("k", Some(b"other"), b"v2".to_vec()).await.unwrap());
        assert!(store.put_if("k", Some(b"v1"), b"v2".to_vec()).await.unwrap());
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn corrupt_snapshot_is_reported_not_swallowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
