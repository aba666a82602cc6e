//! Two-phase bulk word assignment.
//!
//! Generation (slow, unreliable external extractor) is decoupled from
//! application to user card sets so each phase can be retried independently.
//! The only coordination between the phases is the `status` field on the
//! persisted [`BulkAssignment`]; the Pending→Assigned flip is a conditional
//! write, so a retried or racing assign observes `AssignmentAlreadyConsumed`
//! and creates nothing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::counter;
use crate::error::EngineError;
use crate::extractor::{TranslateRequest, WordExtractor};
use crate::model::{AssignmentStatus, BulkAssignment, Card, WordCandidate};
use crate::store::{decode, encode, keys, KvStore};

/// Configuration for the bulk coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a Pending assignment stays consumable.
    pub retention: chrono::Duration,
    /// Bound on each extractor call.
    pub extract_timeout: std::time::Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::minutes(30),
            extract_timeout: std::time::Duration::from_secs(20),
        }
    }
}

/// Result of the generate phase.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The persisted Pending assignment.
    pub assignment: BulkAssignment,
    /// Words the extractor handled.
    pub success_count: u32,
    /// Words that fell back to placeholder values.
    pub failure_count: u32,
}

/// Result of the assign phase.
#[derive(Debug, Clone, Copy)]
pub struct AssignOutcome {
    /// The consumed assignment.
    pub assignment_id: Uuid,
    /// Cards created across all target users.
    pub created: u32,
    /// `(word, user)` pairs skipped because the user already had the word.
    pub skipped: u32,
}

/// Coordinates AI-assisted word generation and its application to users.
pub struct BulkCoordinator {
    store: Arc<dyn KvStore>,
    extractor: Arc<dyn WordExtractor>,
    config: CoordinatorConfig,
}

impl BulkCoordinator {
    pub fn new(
        store: Arc<dyn KvStore>,
        extractor: Arc<dyn WordExtractor>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    /// Generate candidates for a batch of words and stage them as a Pending
    /// assignment.
    ///
    /// A per-word extractor failure (or timeout) substitutes placeholder
    /// values instead of failing the batch; the outcome reports how many
    /// words succeeded versus fell back.
    pub async fn generate(
        &self,
        words: &[String],
        source_language: &str,
        target_language: &str,
        now: DateTime<Utc>,
    ) -> Result<GenerateOutcome, EngineError> {
        let mut candidates = Vec::with_capacity(words.len());
        let mut success_count = 0u32;
        let mut failure_count = 0u32;

        for word in words {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            let request = TranslateRequest {
                word: word.to_string(),
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
            };
            let result = tokio::time::timeout(
                self.config.extract_timeout,
                self.extractor.translate(&request),
            )
            .await;

            let candidate = match result {
                Ok(Ok(translation)) => {
                    success_count += 1;
                    WordCandidate {
                        word: word.to_string(),
                        translation: translation.translation,
                        definition: translation.definition,
                        fallback: false,
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(word, extractor = self.extractor.name(), error = %e, "extraction failed, using fallback");
                    failure_count += 1;
                    fallback_candidate(word)
                }
                Err(_) => {
                    tracing::warn!(word, extractor = self.extractor.name(), "extraction timed out, using fallback");
                    failure_count += 1;
                    fallback_candidate(word)
                }
            };
            candidates.push(candidate);
        }
        if candidates.is_empty() {
            return Err(EngineError::EmptyWordBatch);
        }

        let assignment = BulkAssignment {
            id: Uuid::new_v4(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            candidates,
            target_user_ids: Vec::new(),
            status: AssignmentStatus::Pending,
            created_at: now,
        };
        let key = keys::assignment(assignment.id);
        self.store.put(&key, encode(&key, &assignment)?).await?;
        counter::increment(self.store.as_ref(), counter::ASSIGNMENTS, 1, now).await?;

        Ok(GenerateOutcome {
            assignment,
            success_count,
            failure_count,
        })
    }

    /// Apply a Pending assignment to a set of users, creating box-1 cards
    /// due immediately.
    ///
    /// Single-use: the Pending→Assigned flip happens first, via a
    /// compare-and-swap on the stored record, so a concurrent duplicate call
    /// observes [`EngineError::AssignmentAlreadyConsumed`] and creates no
    /// cards. Words a user already has are skipped, not errors, so partial
    /// retries stay safe.
    pub async fn assign(
        &self,
        assignment_id: Uuid,
        target_user_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<AssignOutcome, EngineError> {
        let key = keys::assignment(assignment_id);
        let bytes = self
            .store
            .get(&key)
            .await?
            .ok_or(EngineError::AssignmentNotFound(assignment_id))?;
        let assignment: BulkAssignment = decode(&key, &bytes)?;

        if now - assignment.created_at > self.config.retention {
            // Best effort: future reads see Expired instead of re-checking age.
            let mut expired = assignment;
            expired.status = AssignmentStatus::Expired;
            let _ = self
                .store
                .put_if(&key, Some(&bytes), encode(&key, &expired)?)
                .await;
            return Err(EngineError::AssignmentNotFound(assignment_id));
        }
        if assignment.status != AssignmentStatus::Pending {
            return Err(EngineError::AssignmentAlreadyConsumed(assignment_id));
        }

        let mut users: Vec<i64> = target_user_ids.to_vec();
        users.sort_unstable();
        users.dedup();

        let mut consumed = assignment.clone();
        consumed.status = AssignmentStatus::Assigned;
        consumed.target_user_ids = users.clone();
        let won = self
            .store
            .put_if(&key, Some(&bytes), encode(&key, &consumed)?)
            .await?;
        if !won {
            return Err(EngineError::AssignmentAlreadyConsumed(assignment_id));
        }

        let mut created = 0u32;
        let mut skipped = 0u32;
        for user_id in &users {
            let existing = self.existing_words(*user_id).await?;
            for candidate in &consumed.candidates {
                if existing.contains(&normalize(&candidate.word)) {
                    skipped += 1;
                    continue;
                }
                let card = Card::new(
                    *user_id,
                    &candidate.word,
                    &candidate.translation,
                    &candidate.definition,
                    now,
                );
                let card_key = keys::card(*user_id, card.id);
                self.store.put(&card_key, encode(&card_key, &card)?).await?;
                created += 1;
            }
        }
        if created > 0 {
            counter::increment(self.store.as_ref(), counter::CARDS, created as u64, now).await?;
        }

        Ok(AssignOutcome {
            assignment_id,
            created,
            skipped,
        })
    }

    /// Fetch a staged assignment by id.
    pub async fn assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<BulkAssignment>, EngineError> {
        let key = keys::assignment(assignment_id);
        match self.store.get(&key).await? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    async fn existing_words(&self, user_id: i64) -> Result<HashSet<String>, EngineError> {
        let entries = self
            .store
            .list_by_prefix(&keys::card_prefix(user_id))
            .await?;
        let mut words = HashSet::new();
        for (key, bytes) in entries {
            let card: Card = decode(&key, &bytes)?;
            words.insert(normalize(&card.word));
        }
        Ok(words)
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

fn fallback_candidate(word: &str) -> WordCandidate {
    WordCandidate {
        word: word.to_string(),
        translation: word.to_string(),
        definition: "(translation unavailable)".to_string(),
        fallback: true,
    }
}
