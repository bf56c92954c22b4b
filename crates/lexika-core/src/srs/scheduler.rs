//! Review scheduler
//!
//! Pure function of (previous mastery state, recall quality, now) to the next
//! mastery state and due date. No clock, no storage, no locking: the caller
//! owns persistence and must run read-compute-write for one (user, item) pair
//! inside a single mutual-exclusion scope (see [`crate::store`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{is_success, mastery_level, next_ease_factor, next_interval};
use crate::mastery::MasteryState;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Scheduling error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// Quality outside the 0-5 range
    #[error("Invalid quality {0}: must be an integer between 0 and 5")]
    InvalidQuality(i64),
    /// Supplied previous state violates a mastery invariant
    #[error("Invalid mastery state: {0}")]
    InvalidState(String),
}

// ============================================================================
// QUALITY
// ============================================================================

/// Self-assessed recall quality for one review attempt.
///
/// 0 = total blackout, 5 = perfect recall. Only values 0-5 construct; the
/// original app accepted any number here unchecked, which let a stray client
/// value corrupt ease factors permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quality(u8);

impl Quality {
    /// Lowest accepted quality
    pub const MIN: Quality = Quality(0);
    /// Highest accepted quality
    pub const MAX: Quality = Quality(5);

    /// Validate a raw quality value
    pub fn new(value: i64) -> Result<Self, ScheduleError> {
        if (0..=5).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ScheduleError::InvalidQuality(value))
        }
    }

    /// The underlying 0-5 value
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this quality counts as a successful recall (>= 3)
    pub fn is_success(self) -> bool {
        is_success(self.0)
    }

    /// All accepted qualities in ascending order
    pub fn all() -> [Quality; 6] {
        [
            Quality(0),
            Quality(1),
            Quality(2),
            Quality(3),
            Quality(4),
            Quality(5),
        ]
    }
}

impl TryFrom<i64> for Quality {
    type Error = ScheduleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for i64 {
    fn from(quality: Quality) -> Self {
        i64::from(quality.0)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// REVIEW RESULT
// ============================================================================

/// Outcome of scheduling one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Updated SM-2 state
    pub state: MasteryState,
    /// Display bucket recomputed from the updated repetition count
    pub mastery_level: u8,
    /// When the item next comes due
    pub next_review_at: DateTime<Utc>,
    /// The review timestamp, echoed for the record's `last_reviewed_at`
    pub reviewed_at: DateTime<Utc>,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// SM-2 review scheduler.
///
/// Stateless; one instance serves every user and item. `now` is always an
/// explicit argument so outcomes are reproducible in tests and backfills.
///
/// ```
/// use chrono::Utc;
/// use lexika_core::srs::{Quality, Scheduler};
///
/// let scheduler = Scheduler::default();
/// let quality = Quality::new(5)?;
/// let result = scheduler.schedule(None, quality, Utc::now())?;
/// assert_eq!(result.state.repetitions, 1);
/// assert_eq!(result.state.interval_days, 1);
/// # Ok::<(), lexika_core::srs::ScheduleError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Schedule the next review for one item.
    ///
    /// `previous` is `None` on the first-ever review of the item by this
    /// user, which is treated exactly as [`MasteryState::SEED`]. A supplied
    /// state that violates an invariant is rejected with
    /// [`ScheduleError::InvalidState`]; a corrupted row is an incident to
    /// surface, not something to quietly patch over.
    pub fn schedule(
        &self,
        previous: Option<&MasteryState>,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult, ScheduleError> {
        let previous = match previous {
            Some(state) => {
                if let Some(violation) = state.invariant_violation() {
                    return Err(ScheduleError::InvalidState(violation));
                }
                *state
            }
            None => MasteryState::SEED,
        };

        let (repetitions, interval_days) = if quality.is_success() {
            let interval = next_interval(
                previous.repetitions,
                previous.interval_days,
                previous.ease_factor,
            );
            (previous.repetitions + 1, interval)
        } else {
            // Failed recall: back to square one, reviewed again tomorrow
            (0, 1)
        };

        // Ease update uses the pre-update ease in both branches
        let ease_factor = next_ease_factor(previous.ease_factor, quality.value());

        Ok(ReviewResult {
            state: MasteryState {
                ease_factor,
                interval_days,
                repetitions,
            },
            mastery_level: mastery_level(repetitions),
            next_review_at: now + Duration::days(i64::from(interval_days)),
            reviewed_at: now,
        })
    }

    /// Preview the outcome for every quality 0-5 without recording anything.
    ///
    /// Lets the UI show "again in 1 day / 16 days" style hints next to the
    /// answer buttons.
    pub fn preview(
        &self,
        previous: Option<&MasteryState>,
        now: DateTime<Utc>,
    ) -> Result<[ReviewResult; 6], ScheduleError> {
        let outcomes = Quality::all().map(|quality| self.schedule(previous, quality, now));
        // Surface the first error; with a valid previous state none occur
        let mut results = Vec::with_capacity(6);
        for outcome in outcomes {
            results.push(outcome?);
        }
        Ok(results
            .try_into()
            .unwrap_or_else(|_| unreachable!("exactly six qualities")))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_quality_validation() {
        assert!(Quality::new(0).is_ok());
        assert!(Quality::new(5).is_ok());
        assert_eq!(Quality::new(6), Err(ScheduleError::InvalidQuality(6)));
        assert_eq!(Quality::new(-1), Err(ScheduleError::InvalidQuality(-1)));
    }

    #[test]
    fn test_quality_serde_rejects_out_of_range() {
        let parsed: Result<Quality, _> = serde_json::from_str("4");
        assert_eq!(parsed.unwrap().value(), 4);

        let parsed: Result<Quality, _> = serde_json::from_str("9");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_first_review_absent_equals_seed() {
        let scheduler = Scheduler::default();
        let quality = Quality::new(5).unwrap();

        let from_none = scheduler.schedule(None, quality, t0()).unwrap();
        let from_seed = scheduler
            .schedule(Some(&MasteryState::SEED), quality, t0())
            .unwrap();
        assert_eq!(from_none, from_seed);
        assert_eq!(from_none.state.repetitions, 1);
        assert_eq!(from_none.state.interval_days, 1);
    }

    #[test]
    fn test_second_success_is_six_days() {
        let scheduler = Scheduler::default();
        let quality = Quality::new(5).unwrap();

        let first = scheduler.schedule(None, quality, t0()).unwrap();
        let second = scheduler
            .schedule(Some(&first.state), quality, t0())
            .unwrap();
        assert_eq!(second.state.repetitions, 2);
        assert_eq!(second.state.interval_days, 6);
        assert_eq!(second.next_review_at, t0() + Duration::days(6));
    }

    #[test]
    fn test_third_success_grows_by_ease() {
        let scheduler = Scheduler::default();
        let quality = Quality::new(5).unwrap();

        let mut state = MasteryState::SEED;
        for _ in 0..2 {
            state = scheduler.schedule(Some(&state), quality, t0()).unwrap().state;
        }
        // Ease after two perfect reviews: 2.5 -> 2.6 -> 2.7
        assert!((state.ease_factor - 2.7).abs() < 1e-9);

        let third = scheduler.schedule(Some(&state), quality, t0()).unwrap();
        assert_eq!(third.state.interval_days, (6.0_f64 * 2.7).round() as u32);
    }

    #[test]
    fn test_failure_resets_regardless_of_progress() {
        let scheduler = Scheduler::default();
        let advanced = MasteryState {
            ease_factor: 2.8,
            interval_days: 120,
            repetitions: 9,
        };

        for raw in 0..3 {
            let quality = Quality::new(raw).unwrap();
            let result = scheduler.schedule(Some(&advanced), quality, t0()).unwrap();
            assert_eq!(result.state.repetitions, 0, "q={}", raw);
            assert_eq!(result.state.interval_days, 1, "q={}", raw);
            assert_eq!(result.mastery_level, 0);
            // Ease still takes the penalty
            assert!(result.state.ease_factor < advanced.ease_factor);
        }
    }

    #[test]
    fn test_invariants_hold_under_random_walk() {
        // Deterministic pseudo-random quality sequence; every reachable state
        // must keep ease >= 1.3 and interval >= 1.
        let scheduler = Scheduler::default();
        let mut state = MasteryState::SEED;
        let mut seed: u64 = 0x5eed;

        for step in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let quality = Quality::new((seed >> 33) as i64 % 6).unwrap();
            let result = scheduler.schedule(Some(&state), quality, t0()).unwrap();
            state = result.state;
            assert!(
                state.invariant_violation().is_none(),
                "violation at step {} after q={}",
                step,
                quality
            );
            assert_eq!(result.mastery_level, mastery_level(state.repetitions));
        }
    }

    #[test]
    fn test_rejects_corrupt_previous_state() {
        let scheduler = Scheduler::default();
        let quality = Quality::new(4).unwrap();

        let corrupt = MasteryState {
            ease_factor: 0.9,
            interval_days: 3,
            repetitions: 2,
        };
        assert!(matches!(
            scheduler.schedule(Some(&corrupt), quality, t0()),
            Err(ScheduleError::InvalidState(_))
        ));

        let corrupt = MasteryState {
            interval_days: 0,
            ..MasteryState::SEED
        };
        assert!(matches!(
            scheduler.schedule(Some(&corrupt), quality, t0()),
            Err(ScheduleError::InvalidState(_))
        ));
    }

    #[test]
    fn test_review_timestamps() {
        let scheduler = Scheduler::default();
        let result = scheduler
            .schedule(None, Quality::new(3).unwrap(), t0())
            .unwrap();
        assert_eq!(result.reviewed_at, t0());
        assert_eq!(result.next_review_at, t0() + Duration::days(1));
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Seed state, qualities [5, 5, 5, 2, 5] at daily-or-longer spacing:
        // repetitions [1, 2, 3, 0, 1], intervals [1, 6, 16, 1, 1].
        let scheduler = Scheduler::default();
        let mut state: Option<MasteryState> = None;
        let mut now = t0();

        let expectations = [(5, 1, 1), (5, 2, 6), (5, 3, 16), (2, 0, 1), (5, 1, 1)];
        for (raw, expected_reps, expected_interval) in expectations {
            let quality = Quality::new(raw).unwrap();
            let result = scheduler.schedule(state.as_ref(), quality, now).unwrap();
            assert_eq!(result.state.repetitions, expected_reps, "q={}", raw);
            assert_eq!(result.state.interval_days, expected_interval, "q={}", raw);
            now = result.next_review_at;
            state = Some(result.state);
        }

        // Third review pushed the item into the first mastery bucket before
        // the lapse knocked it back down.
        assert_eq!(mastery_level(3), 1);
        assert_eq!(state.unwrap().repetitions, 1);
    }

    #[test]
    fn test_preview_covers_all_qualities() {
        let scheduler = Scheduler::default();
        let state = MasteryState {
            ease_factor: 2.6,
            interval_days: 6,
            repetitions: 2,
        };

        let outcomes = scheduler.preview(Some(&state), t0()).unwrap();
        assert_eq!(outcomes.len(), 6);
        // Failures reset, successes grow
        assert_eq!(outcomes[0].state.interval_days, 1);
        assert_eq!(outcomes[2].state.interval_days, 1);
        assert_eq!(outcomes[5].state.interval_days, (6.0_f64 * 2.6).round() as u32);
        // Ease is non-decreasing across the preview row
        for pair in outcomes.windows(2) {
            assert!(pair[0].state.ease_factor <= pair[1].state.ease_factor);
        }
    }
}
