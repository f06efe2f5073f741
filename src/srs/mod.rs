//! Spaced-repetition scheduling (SM-2 family).
//!
//! [`schedule`] is a pure function: it takes the current [`MasteryRecord`]
//! and a graded [`Outcome`] and returns the next state, with no side
//! effects. Persistence happens elsewhere (`db::save_review`), so the
//! algorithm stays trivially testable.
//!
//! # Interval curve
//!
//! The concrete constants live in [`SrsTuning`] and are user-tunable
//! through the config file:
//!
//! - First success of a streak: 1 day. Second: `second_interval_days`
//!   (default 6). Later successes multiply the previous interval by the
//!   ease factor, so a fresh song at the default ease of 2.5 walks
//!   1 -> 6 -> 15 days.
//! - A partial answer halves the interval (floor 1 day) and nudges ease
//!   down; a wrong answer resets the streak to a 1-day interval, nudges
//!   ease down harder, and counts a lapse.
//! - Ease is clamped to [`min_ease`, `max_ease`] and the interval to
//!   `max_interval_days` on every update, so neither can run away no
//!   matter what sequence of outcomes arrives.
//!
//! [`min_ease`]: SrsTuning::min_ease
//! [`max_ease`]: SrsTuning::max_ease

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{MasteryRecord, Outcome, ReviewEntry};

/// Bound constants and nudge sizes for the scheduler.
///
/// Loaded from the `[srs]` config section; [`Default`] gives the shipped
/// curve. Values outside sane ranges are clamped at use, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsTuning {
    /// Lower ease bound; 1.3 is the conventional SM-2 floor
    pub min_ease: f64,
    /// Upper ease bound, prevents runaway interval growth
    pub max_ease: f64,
    /// Ease increase per correct answer
    pub ease_bonus: f64,
    /// Ease decrease per partial answer
    pub partial_penalty: f64,
    /// Ease decrease per wrong answer
    pub lapse_penalty: f64,
    /// Interval for the second consecutive success of a streak
    pub second_interval_days: u32,
    /// Hard cap on the review interval
    pub max_interval_days: u32,
}

impl Default for SrsTuning {
    fn default() -> Self {
        Self {
            min_ease: 1.3,
            max_ease: 2.8,
            ease_bonus: 0.02,
            partial_penalty: 0.15,
            lapse_penalty: 0.2,
            second_interval_days: 6,
            max_interval_days: 365,
        }
    }
}

/// Whether a record is eligible for a Standard-mode review as of `as_of`.
///
/// A record that has never been reviewed is always due.
pub fn is_due(record: &MasteryRecord, as_of: NaiveDate) -> bool {
    record.last_reviewed_at.is_none() || record.due_date <= as_of
}

/// Compute the next mastery state after a graded attempt.
///
/// Pure: the input record is not modified. `now` is injected so callers
/// (and tests) control the clock. The returned record satisfies the store
/// invariants: `due_date = now.date + interval_days`, history grown by
/// exactly one entry, `lapse_count` non-decreasing.
pub fn schedule(
    record: &MasteryRecord,
    outcome: Outcome,
    latency_seconds: Option<f64>,
    now: DateTime<Utc>,
    tuning: &SrsTuning,
) -> MasteryRecord {
    let mut next = record.clone();

    // Tolerate out-of-range state from an older config rather than reject it.
    let ease = record.ease_factor.clamp(tuning.min_ease, tuning.max_ease);

    match outcome {
        Outcome::Correct => {
            next.repetition_count = record.repetition_count.saturating_add(1);
            next.interval_days = match next.repetition_count {
                1 => 1,
                2 => tuning.second_interval_days.max(1),
                // Growth uses the ease in effect at review time; the bonus
                // below only affects future reviews.
                _ => (record.interval_days.max(1) as f64 * ease).round() as u32,
            };
            next.ease_factor = (ease + tuning.ease_bonus).min(tuning.max_ease);
        }
        Outcome::Partial => {
            // Streak survives but the interval tightens.
            next.interval_days = (record.interval_days / 2).max(1);
            next.ease_factor = (ease - tuning.partial_penalty).max(tuning.min_ease);
        }
        Outcome::Incorrect => {
            next.repetition_count = 0;
            next.interval_days = 1;
            next.ease_factor = (ease - tuning.lapse_penalty).max(tuning.min_ease);
            next.lapse_count = record.lapse_count.saturating_add(1);
        }
    }

    next.interval_days = next.interval_days.clamp(1, tuning.max_interval_days.max(1));
    next.due_date = now.date_naive() + Days::new(u64::from(next.interval_days));
    next.last_reviewed_at = Some(now);
    next.history.push(ReviewEntry {
        reviewed_at: now,
        outcome,
        latency_seconds,
    });

    next
}
