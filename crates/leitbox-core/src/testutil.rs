//! In-memory store and extractor doubles for core unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::extractor::{TranslateRequest, Translation, WordExtractor};
use crate::store::{KvStore, StoreError};

/// Minimal in-memory `KvStore` for exercising the managers.
#[derive(Default)]
pub struct TestStore {
    map: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for TestStore {
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

/// Extractor double: echoes a canned translation, fails for listed words.
pub struct TestExtractor {
    failing: HashSet<String>,
    calls: AtomicU32,
}

impl TestExtractor {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_for(words: &[&str]) -> Self {
        Self {
            failing: words.iter().map(|w| w.to_string()).collect(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl WordExtractor for TestExtractor {
    fn name(&self) -> &str {
        "test"
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, ExtractError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(&request.word) {
            return Err(ExtractError::NetworkError("connection reset".into()));
        }
        Ok(Translation {
            translation: format!("{}-{}", request.word, request.target_language),
            definition: format!("definition of {}", request.word),
        })
    }
}
