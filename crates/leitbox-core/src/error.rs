//! Engine and extractor error types.
//!
//! Defined in `leitbox-core` so the transport layers can classify errors for
//! user-visible messaging and retry decisions without string matching. The
//! core itself never logs user-facing text; it returns these and lets the
//! conversation or admin layer decide what to say.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors returned by the scheduler, session manager, and bulk coordinator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stored card carries a box level outside `1..=5`. Fatal; never
    /// silently coerced.
    #[error("card {card_id} has box level {box_level}, expected 1..=5")]
    InvalidCardState { card_id: Uuid, box_level: u8 },

    /// The user has nothing to review right now. Expected, not a fault.
    #[error("no cards due for user {0}")]
    NoCardsDue(i64),

    /// A generate call contained no usable words after trimming.
    #[error("no usable words in batch")]
    EmptyWordBatch,

    /// No active session exists for this user (absent, id mismatch, or
    /// idle-expired).
    #[error("no active session for user {0}")]
    SessionNotFound(i64),

    /// Every card in the session has already been answered.
    #[error("session {0} is already complete")]
    SessionAlreadyComplete(Uuid),

    /// The answer arrived for a position the session has moved past — a
    /// retried delivery or a racing invocation.
    #[error("answer for position {submitted} but session is at position {current}")]
    StalePosition { submitted: usize, current: usize },

    /// The assignment id is unknown or past its retention window.
    #[error("assignment {0} not found or expired")]
    AssignmentNotFound(Uuid),

    /// The assignment was already applied; assign is single-use.
    #[error("assignment {0} already consumed")]
    AssignmentAlreadyConsumed(Uuid),

    /// A stored record failed to deserialize or references missing data.
    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// The store could not serve the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns `true` for outcomes the conversation layer should surface as
    /// a benign no-op rather than a failure (stale retries, nothing due).
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::NoCardsDue(_)
                | EngineError::SessionNotFound(_)
                | EngineError::SessionAlreadyComplete(_)
                | EngineError::StalePosition { .. }
                | EngineError::AssignmentAlreadyConsumed(_)
        )
    }

    /// Returns `true` if the transport layer may retry the whole operation.
    /// The core never retries store calls itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }
}

/// Errors from a word extractor backend.
///
/// The bulk coordinator catches every variant per word and substitutes a
/// fallback candidate; these surface directly only in admin diagnostics.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The backend replied but the payload was not usable.
    #[error("malformed extractor response: {0}")]
    Malformed(String),
}

impl ExtractError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ExtractError::AuthenticationFailed(_))
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ExtractError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_classification() {
        assert!(EngineError::NoCardsDue(1).is_benign());
        assert!(EngineError::SessionNotFound(1).is_benign());
        assert!(EngineError::AssignmentAlreadyConsumed(Uuid::new_v4()).is_benign());
        assert!(!EngineError::InvalidCardState {
            card_id: Uuid::new_v4(),
            box_level: 9
        }
        .is_benign());
        assert!(!EngineError::AssignmentNotFound(Uuid::new_v4()).is_benign());
        assert!(!EngineError::EmptyWordBatch.is_benign());
    }

    #[test]
    fn retryable_classification() {
        assert!(EngineError::Store(StoreError::Unavailable("io".into())).is_retryable());
        assert!(!EngineError::NoCardsDue(1).is_retryable());
    }

    #[test]
    fn extract_error_permanence() {
        assert!(ExtractError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!ExtractError::Timeout(10).is_permanent());
        assert_eq!(
            ExtractError::RateLimited {
                retry_after_ms: 2000
            }
            .retry_after_ms(),
            Some(2000)
        );
    }
}
