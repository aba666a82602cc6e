//! Per-user review session state machine.
//!
//! Builds an ordered queue of due cards and commits each answer exactly once
//! against the store via the scheduler. Invocations are stateless, so the
//! session record is persisted on every transition and reloaded on the next
//! turn. Each committed answer is durable before the session advances; a
//! cancelled or idle-expired session never rolls committed answers back.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::counter;
use crate::error::EngineError;
use crate::model::{Card, ReviewSession, SessionStatus, SessionSummary};
use crate::scheduler::{self, BoxIntervals};
use crate::store::{decode, encode, keys, KvStore};

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Box interval table used when committing answers.
    pub intervals: BoxIntervals,
    /// An Active session with no answer for this long behaves as cancelled.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            intervals: BoxIntervals::default(),
            idle_timeout: Duration::minutes(30),
        }
    }
}

/// Result of committing one answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The session the answer was committed to.
    pub session_id: Uuid,
    /// The card after the review was applied.
    pub card: Card,
    /// The answer that was committed.
    pub was_correct: bool,
    /// The session position after this commit.
    pub position: usize,
    /// Cards still to answer.
    pub remaining: usize,
    /// Present on the final answer only.
    pub summary: Option<SessionSummary>,
}

/// Drives per-user review sessions over the store.
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KvStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Start a review session for a user, or resume a still-live one.
    ///
    /// Queries every card owned by the user, keeps the due ones, and orders
    /// them oldest-due first (ties broken by card id for determinism).
    /// Returns [`EngineError::NoCardsDue`] when the due set is empty.
    pub async fn start_session(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewSession, EngineError> {
        let session_key = keys::session(user_id);

        // Resume a live session rather than discarding mid-conversation
        // progress; Complete and idle-expired records get replaced.
        if let Some(existing) = self.load_session(user_id).await? {
            if existing.status == SessionStatus::Active && !self.expired(&existing, now) {
                return Ok(existing);
            }
            if self.expired(&existing, now) {
                tracing::warn!(user_id, session_id = %existing.id, "discarding idle-expired session");
            }
        }

        let mut due = self.due_cards(user_id, now).await?;
        if due.is_empty() {
            return Err(EngineError::NoCardsDue(user_id));
        }
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));

        let session = ReviewSession {
            id: Uuid::new_v4(),
            user_id,
            queue: due.iter().map(|c| c.id).collect(),
            position: 0,
            correct: 0,
            started_at: now,
            last_activity_at: now,
            status: SessionStatus::Active,
        };
        self.store
            .put(&session_key, encode(&session_key, &session)?)
            .await?;
        Ok(session)
    }

    /// Commit one answer against the card at `position`.
    ///
    /// `position` is the position the caller displayed to the user; if the
    /// session has moved past it (a retried webhook delivery or a racing
    /// invocation) the call fails with [`EngineError::StalePosition`]. The
    /// card write is durable before the session advances, and the advance
    /// itself is a conditional write, so two calls racing the same position
    /// can never both be acknowledged.
    pub async fn submit_answer(
        &self,
        user_id: i64,
        session_id: Uuid,
        position: usize,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, EngineError> {
        let session_key = keys::session(user_id);
        let session_bytes = self
            .store
            .get(&session_key)
            .await?
            .ok_or(EngineError::SessionNotFound(user_id))?;
        let mut session: ReviewSession = decode(&session_key, &session_bytes)?;

        if session.id != session_id {
            return Err(EngineError::SessionNotFound(user_id));
        }
        if session.status == SessionStatus::Complete || session.position >= session.queue.len() {
            return Err(EngineError::SessionAlreadyComplete(session.id));
        }
        if self.expired(&session, now) {
            // Liveness guard, not correctness: committed answers are already
            // durable, only the queue state is dropped.
            self.store.delete(&session_key).await?;
            return Err(EngineError::SessionNotFound(user_id));
        }
        if position != session.position {
            return Err(EngineError::StalePosition {
                submitted: position,
                current: session.position,
            });
        }

        let card_id = session.queue[session.position];
        let card_key = keys::card(user_id, card_id);
        let bytes = self
            .store
            .get(&card_key)
            .await?
            .ok_or_else(|| EngineError::CorruptRecord {
                key: card_key.clone(),
                reason: "card referenced by session queue is missing".into(),
            })?;
        let card: Card = decode(&card_key, &bytes)?;

        let updated = scheduler::apply_review(&card, was_correct, now, &self.config.intervals)?;
        self.store
            .put(&card_key, encode(&card_key, &updated)?)
            .await?;

        session.position += 1;
        if was_correct {
            session.correct += 1;
        }
        session.last_activity_at = now;
        let summary = if session.position == session.queue.len() {
            session.status = SessionStatus::Complete;
            Some(SessionSummary {
                reviewed: session.position as u32,
                correct: session.correct,
            })
        } else {
            None
        };
        // Conditional on the session bytes read at entry: when two
        // invocations race the same position, exactly one flip lands. The
        // loser's card write above replayed the same review over the same
        // base record, so only the winner acknowledges the answer and bumps
        // the counters.
        let advanced = self
            .store
            .put_if(&session_key, Some(&session_bytes), encode(&session_key, &session)?)
            .await?;
        if !advanced {
            let current = self
                .load_session(user_id)
                .await?
                .map_or(session.queue.len(), |s| s.position);
            return Err(EngineError::StalePosition {
                submitted: position,
                current,
            });
        }

        counter::increment(self.store.as_ref(), counter::REVIEWS, 1, now).await?;
        counter::increment(
            self.store.as_ref(),
            &counter::reviews_on(now.date_naive()),
            1,
            now,
        )
        .await?;

        Ok(AnswerOutcome {
            session_id: session.id,
            card: updated,
            was_correct,
            position: session.position,
            remaining: session.remaining(),
            summary,
        })
    }

    /// Discard the user's session record. Committed answers stay persisted;
    /// partial progress is never rolled back.
    pub async fn cancel_session(&self, user_id: i64) -> Result<(), EngineError> {
        let session_key = keys::session(user_id);
        if self.store.get(&session_key).await?.is_none() {
            return Err(EngineError::SessionNotFound(user_id));
        }
        self.store.delete(&session_key).await?;
        Ok(())
    }

    /// The user's current session, if one is live.
    pub async fn active_session(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSession>, EngineError> {
        match self.load_session(user_id).await? {
            Some(s) if s.status == SessionStatus::Active && !self.expired(&s, now) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    /// All of the user's due cards, unordered.
    pub async fn due_cards(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>, EngineError> {
        let entries = self
            .store
            .list_by_prefix(&keys::card_prefix(user_id))
            .await?;
        let mut due = Vec::new();
        for (key, bytes) in entries {
            let card: Card = decode(&key, &bytes)?;
            if scheduler::is_due(&card, now) {
                due.push(card);
            }
        }
        Ok(due)
    }

    async fn load_session(&self, user_id: i64) -> Result<Option<ReviewSession>, EngineError> {
        let key = keys::session(user_id);
        match self.store.get(&key).await? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    fn expired(&self, session: &ReviewSession, now: DateTime<Utc>) -> bool {
        session.status == SessionStatus::Active
            && now - session.last_activity_at > self.config.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::testutil::TestStore;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::sync::Barrier;

    fn manager(store: Arc<TestStore>) -> SessionManager {
        SessionManager::new(store, SessionConfig::default())
    }

    /// Store that, once armed, holds the next two card reads at a barrier
    /// so two racing submits observe the same position and the same base
    /// card before either writes.
    struct GateStore {
        inner: TestStore,
        gate: Barrier,
        armed: AtomicBool,
        gated_reads: AtomicU32,
    }

    impl GateStore {
        fn new() -> Self {
            Self {
                inner: TestStore::new(),
                gate: Barrier::new(2),
                armed: AtomicBool::new(false),
                gated_reads: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl KvStore for GateStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            let result = self.inner.get(key).await;
            if key.starts_with("card:")
                && self.armed.load(Ordering::SeqCst)
                && self.gated_reads.fetch_add(1, Ordering::SeqCst) < 2
            {
                self.gate.wait().await;
            }
            result
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }

        async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
            self.inner.list_by_prefix(prefix).await
        }

        async fn put_if(
            &self,
            key: &str,
            expected: Option<&[u8]>,
            value: Vec<u8>,
        ) -> Result<bool, StoreError> {
            self.inner.put_if(key, expected, value).await
        }
    }

    async fn seed_card(store: &TestStore, user_id: i64, word: &str, due_at: DateTime<Utc>) -> Card {
        let mut card = Card::new(user_id, word, "tr", "def", due_at);
        card.due_at = due_at;
        let key = keys::card(user_id, card.id);
        store.put(&key, encode(&key, &card).unwrap()).await.unwrap();
        card
    }

    #[tokio::test]
    async fn start_orders_queue_oldest_due_first() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let c1 = seed_card(&store, 1, "a", now - Duration::minutes(3)).await;
        let c3 = seed_card(&store, 1, "b", now - Duration::minutes(1)).await;
        let c2 = seed_card(&store, 1, "c", now - Duration::minutes(2)).await;

        let session = manager(store).start_session(1, now).await.unwrap();
        assert_eq!(session.queue, vec![c1.id, c2.id, c3.id]);
        assert_eq!(session.position, 0);
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn start_breaks_due_ties_by_card_id() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let a = seed_card(&store, 1, "a", now).await;
        let b = seed_card(&store, 1, "b", now).await;

        let session = manager(store).start_session(1, now).await.unwrap();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(session.queue, expected);
    }

    #[tokio::test]
    async fn start_excludes_cards_not_yet_due() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let due = seed_card(&store, 1, "due", now - Duration::minutes(1)).await;
        seed_card(&store, 1, "later", now + Duration::hours(1)).await;

        let session = manager(store).start_session(1, now).await.unwrap();
        assert_eq!(session.queue, vec![due.id]);
    }

    #[tokio::test]
    async fn start_with_nothing_due_reports_no_cards() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        seed_card(&store, 1, "later", now + Duration::hours(1)).await;

        let err = manager(store).start_session(1, now).await.unwrap_err();
        assert!(matches!(err, EngineError::NoCardsDue(1)));
        assert!(err.is_benign());
    }

    #[tokio::test]
    async fn start_resumes_live_session() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        seed_card(&store, 1, "a", now).await;

        let mgr = manager(store);
        let first = mgr.start_session(1, now).await.unwrap();
        let second = mgr.start_session(1, now + Duration::minutes(1)).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn full_session_commits_cards_and_counters() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let c1 = seed_card(&store, 1, "a", now - Duration::minutes(2)).await;
        let c2 = seed_card(&store, 1, "b", now - Duration::minutes(1)).await;

        let mgr = manager(Arc::clone(&store));
        let session = mgr.start_session(1, now).await.unwrap();

        let first = mgr
            .submit_answer(1, session.id, 0, true, now)
            .await
            .unwrap();
        assert_eq!(first.card.id, c1.id);
        assert_eq!(first.card.box_level, 2);
        assert_eq!(first.remaining, 1);
        assert!(first.summary.is_none());

        let second = mgr
            .submit_answer(1, session.id, 1, false, now)
            .await
            .unwrap();
        assert_eq!(second.card.id, c2.id);
        assert_eq!(second.card.box_level, 1);
        assert_eq!(
            second.summary,
            Some(SessionSummary {
                reviewed: 2,
                correct: 1
            })
        );

        // Card mutations are durable.
        let key = keys::card(1, c1.id);
        let stored: Card = decode(&key, &store.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.box_level, 2);
        assert_eq!(stored.total_reviews, 1);

        // One counter bump per answer, plus the date bucket.
        assert_eq!(counter::value(store.as_ref(), counter::REVIEWS).await.unwrap(), 2);
        assert_eq!(
            counter::value(store.as_ref(), &counter::reviews_on(now.date_naive()))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn stale_position_is_rejected_without_double_apply() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let card = seed_card(&store, 1, "a", now - Duration::minutes(2)).await;
        seed_card(&store, 1, "b", now - Duration::minutes(1)).await;

        let mgr = manager(Arc::clone(&store));
        let session = mgr.start_session(1, now).await.unwrap();
        mgr.submit_answer(1, session.id, 0, true, now).await.unwrap();

        // Same answer delivered again (at-least-once webhook retry).
        let err = mgr
            .submit_answer(1, session.id, 0, true, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::StalePosition {
                submitted: 0,
                current: 1
            }
        ));
        assert!(err.is_benign());

        let key = keys::card(1, card.id);
        let stored: Card = decode(&key, &store.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.total_reviews, 1);
    }

    #[tokio::test]
    async fn racing_submits_commit_exactly_once() {
        let now = Utc::now();
        let store = Arc::new(GateStore::new());
        let card = Card::new(1, "a", "tr", "def", now);
        let card_key = keys::card(1, card.id);
        store
            .put(&card_key, encode(&card_key, &card).unwrap())
            .await
            .unwrap();

        let as_dyn: Arc<dyn KvStore> = store.clone();
        let mgr = Arc::new(SessionManager::new(as_dyn, SessionConfig::default()));
        let session = mgr.start_session(1, now).await.unwrap();

        // Both submits read the session at position 0 before either writes.
        store.armed.store(true, Ordering::SeqCst);
        let a = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            let id = session.id;
            async move { mgr.submit_answer(1, id, 0, true, now).await }
        });
        let b = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            let id = session.id;
            async move { mgr.submit_answer(1, id, 0, true, now).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for r in [a, b] {
            if let Err(e) = r {
                assert!(matches!(
                    e,
                    EngineError::StalePosition {
                        submitted: 0,
                        current: 1
                    }
                ));
            }
        }

        // One review applied, one acknowledgement, one counter bump.
        let stored: Card = decode(
            &card_key,
            &store.get(&card_key).await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(stored.total_reviews, 1);
        assert_eq!(
            counter::value(store.as_ref(), counter::REVIEWS).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn submit_after_completion_reports_already_complete() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        seed_card(&store, 1, "a", now).await;

        let mgr = manager(store);
        let session = mgr.start_session(1, now).await.unwrap();
        mgr.submit_answer(1, session.id, 0, true, now).await.unwrap();

        let err = mgr
            .submit_answer(1, session.id, 1, true, now)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionAlreadyComplete(_)));
    }

    #[tokio::test]
    async fn wrong_session_id_is_not_found() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        seed_card(&store, 1, "a", now).await;

        let mgr = manager(store);
        mgr.start_session(1, now).await.unwrap();
        let err = mgr
            .submit_answer(1, Uuid::new_v4(), 0, true, now)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(1)));
    }

    #[tokio::test]
    async fn cancel_keeps_committed_answers() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let card = seed_card(&store, 1, "a", now - Duration::minutes(2)).await;
        seed_card(&store, 1, "b", now - Duration::minutes(1)).await;

        let mgr = manager(Arc::clone(&store));
        let session = mgr.start_session(1, now).await.unwrap();
        mgr.submit_answer(1, session.id, 0, true, now).await.unwrap();
        mgr.cancel_session(1).await.unwrap();

        let key = keys::card(1, card.id);
        let stored: Card = decode(&key, &store.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.total_reviews, 1);

        let err = mgr.cancel_session(1).await.unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(1)));
    }

    #[tokio::test]
    async fn idle_expired_session_behaves_as_cancelled() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        seed_card(&store, 1, "a", now).await;

        let mgr = manager(Arc::clone(&store));
        let session = mgr.start_session(1, now).await.unwrap();

        let later = now + Duration::hours(2);
        let err = mgr
            .submit_answer(1, session.id, 0, true, later)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(1)));
        assert!(mgr.active_session(1, later).await.unwrap().is_none());

        // A fresh start builds a new session over the same due card.
        let fresh = mgr.start_session(1, later).await.unwrap();
        assert_ne!(fresh.id, session.id);
    }

    #[tokio::test]
    async fn missing_queued_card_is_surfaced_as_corrupt() {
        let store = Arc::new(TestStore::new());
        let now = Utc::now();
        let card = seed_card(&store, 1, "a", now).await;

        let mgr = manager(Arc::clone(&store));
        let session = mgr.start_session(1, now).await.unwrap();
        store.delete(&keys::card(1, card.id)).await.unwrap();

        let err = mgr
            .submit_answer(1, session.id, 0, true, now)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::CorruptRecord { .. }));
        assert!(!err.is_benign());
    }
}
