//! Leitner box transitions and due-date computation.
//!
//! The defining rule: a correct answer promotes one box (capped at 5), an
//! incorrect answer demotes all the way back to box 1. Failure is punished
//! harder than success is rewarded, which is what makes the method work.
//!
//! Everything here is pure: callers pass `now` in, so replaying the same
//! `(card, answer, now)` always yields the same result.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{Card, MAX_BOX, MIN_BOX};

/// Review interval per box, box 1 first.
///
/// Box 1 is due again almost immediately to re-drill weak items; box 5 is
/// reviewed rarely. Read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxIntervals {
    /// Minutes until the next review, indexed by `box - 1`.
    minutes: [u64; 5],
}

impl Default for BoxIntervals {
    /// 10 minutes, 1 day, 3 days, 1 week, 3 weeks.
    fn default() -> Self {
        Self {
            minutes: [10, 1_440, 4_320, 10_080, 30_240],
        }
    }
}

impl BoxIntervals {
    pub fn from_minutes(minutes: [u64; 5]) -> Self {
        Self { minutes }
    }

    /// The interval for a box. Callers must pass a validated box level.
    pub fn interval(&self, box_level: u8) -> Duration {
        let idx = box_level.clamp(MIN_BOX, MAX_BOX) as usize - 1;
        Duration::minutes(self.minutes[idx] as i64)
    }

    /// When a card reviewed now at `box_level` becomes due again.
    pub fn due_at(&self, box_level: u8, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.interval(box_level)
    }
}

/// Next box after an answer: `min(b + 1, 5)` on correct, `1` on incorrect.
pub fn compute_next_box(current_box: u8, was_correct: bool) -> u8 {
    if was_correct {
        (current_box + 1).min(MAX_BOX)
    } else {
        MIN_BOX
    }
}

/// Whether a card's scheduled review time has passed.
pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    card.due_at <= now
}

/// Apply one review outcome to a card, returning the updated card.
///
/// Validates the stored box level first: an out-of-range value means corrupt
/// storage and is surfaced as [`EngineError::InvalidCardState`], never
/// coerced. The caller owns not double-applying a single human answer.
pub fn apply_review(
    card: &Card,
    was_correct: bool,
    now: DateTime<Utc>,
    intervals: &BoxIntervals,
) -> Result<Card, EngineError> {
    if !(MIN_BOX..=MAX_BOX).contains(&card.box_level) {
        return Err(EngineError::InvalidCardState {
            card_id: card.id,
            box_level: card.box_level,
        });
    }

    let next_box = compute_next_box(card.box_level, was_correct);
    let mut updated = card.clone();
    updated.box_level = next_box;
    updated.total_reviews = card.total_reviews + 1;
    if was_correct {
        updated.correct_reviews = card.correct_reviews + 1;
    }
    updated.last_reviewed_at = Some(now);
    updated.due_at = intervals.due_at(next_box, now);
    Ok(updated)
}
