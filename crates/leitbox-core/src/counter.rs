//! Incremental aggregate counters for the admin dashboards.
//!
//! Counters are bumped alongside the mutation that caused them and read back
//! directly by key. Nothing here scans the store; the whole point is that
//! dashboard numbers never require a `list` over cards in the hot path.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::model::Counter;
use crate::store::{decode, encode, keys, KvStore};

/// Counter for all reviews ever committed.
pub const REVIEWS: &str = "reviews";
/// Counter for all cards ever created.
pub const CARDS: &str = "cards";
/// Counter for bulk assignments generated.
pub const ASSIGNMENTS: &str = "assignments";

/// Name of the date-bucketed counter for reviews committed on `date`.
pub fn reviews_on(date: chrono::NaiveDate) -> String {
    format!("{REVIEWS}:{}", date.format("%Y-%m-%d"))
}

/// Add `by` to a named counter. Read-modify-write; a lost increment under a
/// concurrent race is accepted the same way card writes are.
pub async fn increment(
    store: &dyn KvStore,
    name: &str,
    by: u64,
    now: DateTime<Utc>,
) -> Result<u64, EngineError> {
    let key = keys::counter(name);
    let current = match store.get(&key).await? {
        Some(bytes) => decode::<Counter>(&key, &bytes)?.count,
        None => 0,
    };
    let counter = Counter {
        key: name.to_string(),
        count: current + by,
        last_updated: now,
    };
    store.put(&key, encode(&key, &counter)?).await?;
    Ok(counter.count)
}

/// Current value of a named counter, zero if never written.
pub async fn value(store: &dyn KvStore, name: &str) -> Result<u64, EngineError> {
    let key = keys::counter(name);
    match store.get(&key).await? {
        Some(bytes) => Ok(decode::<Counter>(&key, &bytes)?.count),
        None => Ok(0),
    }
}

/// Snapshot of the dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub cards: u64,
    pub reviews: u64,
    pub reviews_today: u64,
    pub assignments: u64,
}

impl DashboardStats {
    /// Load the snapshot by direct counter reads.
    pub async fn load(store: &dyn KvStore, now: DateTime<Utc>) -> Result<Self, EngineError> {
        Ok(Self {
            cards: value(store, CARDS).await?,
            reviews: value(store, REVIEWS).await?,
            reviews_today: value(store, &reviews_on(now.date_naive())).await?,
            assignments: value(store, ASSIGNMENTS).await?,
        })
    }
}
