//! In-memory store for tests and ephemeral runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use leitbox_core::store::{KvStore, StoreError};

/// An in-memory `KvStore` over an ordered map.
///
/// The `BTreeMap` gives deterministic, key-ordered prefix scans, matching
/// what durable backends provide.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.map.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .map
            .lock()
            .unwrap()
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
        let mut map = self.map.lock().unwrap();
        let matches = match (map.get(key), expected) {
            (Some(current), Some(exp)) => current.as_slice() == exp,
            (None, None) => true,
            _ => false,
        };
        if matches {
            map.insert(key.to_string(), value);
        }
        Ok(matches)
    }
}
