//! Core data model types for leitbox.
//!
//! These are the fundamental records that the scheduler, session manager,
//! and bulk coordinator read and write through the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The lowest (most frequently reviewed) Leitner box.
pub const MIN_BOX: u8 = 1;
/// The highest (least frequently reviewed) Leitner box.
pub const MAX_BOX: u8 = 5;

/// A single vocabulary card owned by one user.
///
/// Mutated only through [`crate::scheduler::apply_review`] or created by the
/// bulk coordinator; every other component treats cards as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier for this card.
    pub id: Uuid,
    /// Telegram user id of the owner.
    pub user_id: i64,
    /// The word being learned.
    pub word: String,
    /// Translation into the user's language.
    pub translation: String,
    /// Dictionary-style definition.
    #[serde(default)]
    pub definition: String,
    /// Current Leitner box, `1..=5`.
    pub box_level: u8,
    /// When the card was created.
    pub created_at: DateTime<Utc>,
    /// When the card was last reviewed, if ever.
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// When the card next becomes due.
    pub due_at: DateTime<Utc>,
    /// Total number of reviews applied.
    #[serde(default)]
    pub total_reviews: u32,
    /// Number of reviews answered correctly.
    #[serde(default)]
    pub correct_reviews: u32,
}

impl Card {
    /// Create a fresh card in box 1, due immediately.
    pub fn new(user_id: i64, word: &str, translation: &str, definition: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            word: word.to_string(),
            translation: translation.to_string(),
            definition: definition.to_string(),
            box_level: MIN_BOX,
            created_at: now,
            last_reviewed_at: None,
            due_at: now,
            total_reviews: 0,
            correct_reviews: 0,
        }
    }
}

/// Lifecycle of a per-user review session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Complete,
}

/// A user's ordered pass through their currently-due cards.
///
/// Persisted to the store on every transition: invocations are short-lived
/// and share no process memory, so the record is the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    /// Unique identifier for this session.
    pub id: Uuid,
    /// Owning user.
    pub user_id: i64,
    /// Card ids in review order, oldest due first.
    pub queue: Vec<Uuid>,
    /// Index of the next card to answer.
    pub position: usize,
    /// Answers committed as correct so far.
    #[serde(default)]
    pub correct: u32,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// Last time an answer was committed (drives idle expiry).
    pub last_activity_at: DateTime<Utc>,
    /// Active or Complete.
    pub status: SessionStatus,
}

impl ReviewSession {
    /// Number of cards not yet answered.
    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.position)
    }
}

/// Summary returned when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Cards reviewed in this session.
    pub reviewed: u32,
    /// Cards answered correctly.
    pub correct: u32,
}

/// Lifecycle of a staged bulk assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Assigned,
    Expired,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Pending => write!(f, "pending"),
            AssignmentStatus::Assigned => write!(f, "assigned"),
            AssignmentStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AssignmentStatus::Pending),
            "assigned" => Ok(AssignmentStatus::Assigned),
            "expired" => Ok(AssignmentStatus::Expired),
            other => Err(format!("unknown assignment status: {other}")),
        }
    }
}

/// One generated word candidate inside a bulk assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCandidate {
    /// The source word.
    pub word: String,
    /// Translation, or the word itself when extraction failed.
    pub translation: String,
    /// Definition, or a placeholder when extraction failed.
    #[serde(default)]
    pub definition: String,
    /// True when the extractor failed and placeholder values were used.
    #[serde(default)]
    pub fallback: bool,
}

/// A staged batch of word candidates pending distribution to users.
///
/// Produced by the generate phase, consumed exactly once by the assign
/// phase. A staging buffer with a retention window, not durable domain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignment {
    /// Unique identifier for this assignment.
    pub id: Uuid,
    /// Language the words are in.
    pub source_language: String,
    /// Language of the translations.
    pub target_language: String,
    /// Generated candidates, one per input word.
    pub candidates: Vec<WordCandidate>,
    /// Users the assignment was applied to (empty until consumed).
    #[serde(default)]
    pub target_user_ids: Vec<i64>,
    /// Pending, Assigned, or Expired.
    pub status: AssignmentStatus,
    /// When the generate phase produced this record.
    pub created_at: DateTime<Utc>,
}

/// A process-wide aggregate counter consumed by admin dashboards.
///
/// Updated incrementally by scheduler and coordinator mutations, never
/// recomputed by full scans in the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    /// Counter name (e.g. "reviews").
    pub key: String,
    /// Current value.
    pub count: u64,
    /// Last increment time.
    pub last_updated: DateTime<Utc>,
}
