//! The key-value store seam and persisted key layout.
//!
//! Every durable record flows through [`KvStore`]. Individual operations are
//! atomic, but there are no multi-key transactions: per-card read-modify-write
//! races between concurrent invocations are accepted as a last-write-wins
//! anomaly. The one place that needs stronger ordering — consuming a bulk
//! assignment exactly once — uses [`KvStore::put_if`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::EngineError;

/// Errors from the underlying key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not serve the request (I/O failure, backend down).
    /// Transient; the transport layer owns retry and backoff policy.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store call exceeded its bounded timeout.
    #[error("store operation timed out after {0}s")]
    Timeout(u64),
}

/// Durable key-value persistence for cards, sessions, assignments, and
/// counters.
///
/// Each operation is individually atomic with no cross-key transaction.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value unconditionally.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Conditional write: store `value` only if the current value equals
    /// `expected` (`None` meaning the key must be absent). Returns whether
    /// the write happened. This is the compare-and-swap primitive behind
    /// single-use assignment consumption.
    async fn put_if(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Key layout
// ---------------------------------------------------------------------------

/// Persisted key layout. Logical shape: `card:{user}:{card}`,
/// `session:{user}`, `assignment:{id}`, `counter:{name}`.
pub mod keys {
    use uuid::Uuid;

    pub fn card(user_id: i64, card_id: Uuid) -> String {
        format!("card:{user_id}:{card_id}")
    }

    pub fn card_prefix(user_id: i64) -> String {
        format!("card:{user_id}:")
    }

    pub fn session(user_id: i64) -> String {
        format!("session:{user_id}")
    }

    pub fn assignment(assignment_id: Uuid) -> String {
        format!("assignment:{assignment_id}")
    }

    pub fn counter(name: &str) -> String {
        format!("counter:{name}")
    }
}

// ---------------------------------------------------------------------------
// Record codec
// ---------------------------------------------------------------------------

/// Serialize a record for storage.
pub fn encode<T: Serialize>(key: &str, record: &T) -> Result<Vec<u8>, EngineError> {
    serde_json::to_vec(record).map_err(|e| EngineError::CorruptRecord {
        key: key.to_string(),
        reason: format!("encode failed: {e}"),
    })
}

/// Deserialize a stored record, surfacing corruption with the offending key.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, EngineError> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Parse the card id back out of a `card:{user}:{card}` key.
pub fn card_id_from_key(key: &str) -> Option<Uuid> {
    key.rsplit(':').next().and_then(|s| Uuid::parse_str(s).ok())
}
