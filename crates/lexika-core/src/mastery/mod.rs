//! Mastery domain types
//!
//! The per-(user, item) mastery record, the append-only review event, and the
//! wire-facing input/output shapes used by the review endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::srs::algorithm::{
    DEFAULT_EASE_FACTOR, FIRST_INTERVAL_DAYS, MIN_EASE_FACTOR, mastery_level,
};

// ============================================================================
// MASTERY STATE
// ============================================================================

/// The scheduler's working tuple: the three SM-2 values that evolve with
/// every review.
///
/// [`MasteryState::SEED`] is the one place the "no record yet" defaults live.
/// Callers hand the scheduler `None` for a first encounter; nobody inlines
/// the seed values at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryState {
    /// Retention multiplier, >= 1.3. Higher means the item is easier and
    /// intervals grow faster.
    pub ease_factor: f64,
    /// Days until the next review, >= 1
    pub interval_days: u32,
    /// Consecutive successful reviews; reset to 0 on failure
    pub repetitions: u32,
}

impl MasteryState {
    /// State assigned to an item the first time a user ever reviews it
    pub const SEED: MasteryState = MasteryState {
        ease_factor: DEFAULT_EASE_FACTOR,
        interval_days: FIRST_INTERVAL_DAYS,
        repetitions: 0,
    };

    /// Invariant check: ease floored at 1.3, interval at least one day.
    ///
    /// Returns the violated invariant as text so callers can surface a
    /// data-integrity error instead of silently repairing the row.
    pub fn invariant_violation(&self) -> Option<String> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Some(format!(
                "ease factor {} below minimum {}",
                self.ease_factor, MIN_EASE_FACTOR
            ));
        }
        if self.interval_days < 1 {
            return Some("interval of zero days".to_string());
        }
        None
    }
}

impl Default for MasteryState {
    fn default() -> Self {
        Self::SEED
    }
}

// ============================================================================
// MASTERY RECORD
// ============================================================================

/// Per-user, per-vocabulary-item mastery record.
///
/// Created lazily on the first review, updated on every review after that,
/// never deleted. `mastery_level` is a cached projection of `repetitions`
/// recomputed on every write; it is stored for cheap display queries but is
/// never an input to scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    /// Owning user
    pub user_id: String,
    /// Reviewed vocabulary item
    pub vocabulary_id: String,
    /// Retention multiplier, >= 1.3
    pub ease_factor: f64,
    /// Days until the next review, >= 1
    pub interval_days: u32,
    /// Consecutive successful reviews
    pub repetitions: u32,
    /// Display bucket: min(5, repetitions / 3)
    pub mastery_level: u8,
    /// When the item next comes due
    pub next_review_at: DateTime<Utc>,
    /// Most recent review; `None` before the first one
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl MasteryRecord {
    /// A fresh, unpersisted record carrying the seed state, due immediately.
    ///
    /// Used by the cold-start path to present never-reviewed items; nothing
    /// is written to the store until the user actually answers.
    pub fn seed(
        user_id: impl Into<String>,
        vocabulary_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            vocabulary_id: vocabulary_id.into(),
            ease_factor: MasteryState::SEED.ease_factor,
            interval_days: MasteryState::SEED.interval_days,
            repetitions: MasteryState::SEED.repetitions,
            mastery_level: mastery_level(MasteryState::SEED.repetitions),
            next_review_at: now,
            last_reviewed_at: None,
        }
    }

    /// The scheduler-facing slice of this record
    pub fn state(&self) -> MasteryState {
        MasteryState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }

    /// Whether this item is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

// ============================================================================
// REVIEW EVENT
// ============================================================================

/// One immutable entry in the review log.
///
/// Written once per review for audit and analytics; never updated, never
/// deleted, never read back by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    /// Opaque identifier (UUID v4)
    pub id: String,
    /// Reviewing user
    pub user_id: String,
    /// Reviewed vocabulary item
    pub vocabulary_id: String,
    /// Self-assessed recall quality, 0-5
    pub quality: u8,
    /// When the review happened
    pub reviewed_at: DateTime<Utc>,
}

// ============================================================================
// VOCABULARY
// ============================================================================

/// The slice of a curriculum entry the review core needs.
///
/// Lesson/unit structure, part of speech, audio and the rest of the
/// curriculum model live with the importing application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    /// Unique identifier
    pub id: String,
    /// The word or phrase being learned
    pub word: String,
    /// Translation shown on the answer side
    pub translation: Option<String>,
    /// Corpus frequency rank; drives cold-start ordering (common words first)
    pub frequency_rank: Option<i64>,
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Inbound review submission, one per answered item.
///
/// Uses `deny_unknown_fields` so a malformed client payload fails loudly
/// instead of being half-accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewInput {
    /// Reviewing user
    pub user_id: String,
    /// Reviewed vocabulary item
    pub vocabulary_id: String,
    /// Raw quality value as submitted; validated to 0-5 before scheduling
    pub quality: i64,
}

/// What the review endpoint reports back after a recorded review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// When the item next comes due
    #[serde(rename = "nextReview")]
    pub next_review_at: DateTime<Utc>,
    /// Display bucket after this review
    pub mastery_level: u8,
    /// New interval in days
    #[serde(rename = "interval")]
    pub interval_days: u32,
}

impl From<&MasteryRecord> for ReviewOutcome {
    fn from(record: &MasteryRecord) -> Self {
        Self {
            next_review_at: record.next_review_at,
            mastery_level: record.mastery_level,
            interval_days: record.interval_days,
        }
    }
}

/// Per-user progress summary for the stats surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    /// Items the user has reviewed at least once
    pub tracked: i64,
    /// Items due right now
    pub due_now: i64,
    /// Items at the maximum mastery level
    pub mastered: i64,
    /// Mean ease factor across tracked items; `None` when nothing is tracked
    pub average_ease_factor: Option<f64>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_state_values() {
        assert_eq!(MasteryState::SEED.ease_factor, 2.5);
        assert_eq!(MasteryState::SEED.interval_days, 1);
        assert_eq!(MasteryState::SEED.repetitions, 0);
        assert!(MasteryState::SEED.invariant_violation().is_none());
    }

    #[test]
    fn test_invariant_violations() {
        let low_ease = MasteryState {
            ease_factor: 1.2,
            ..MasteryState::SEED
        };
        assert!(low_ease.invariant_violation().is_some());

        let zero_interval = MasteryState {
            interval_days: 0,
            ..MasteryState::SEED
        };
        assert!(zero_interval.invariant_violation().is_some());

        let nan_ease = MasteryState {
            ease_factor: f64::NAN,
            ..MasteryState::SEED
        };
        assert!(nan_ease.invariant_violation().is_some());
    }

    #[test]
    fn test_seed_record_is_due_immediately() {
        let now = Utc::now();
        let record = MasteryRecord::seed("u1", "v1", now);
        assert!(record.is_due(now));
        assert!(record.last_reviewed_at.is_none());
        assert_eq!(record.mastery_level, 0);
        assert_eq!(record.state(), MasteryState::SEED);
    }

    #[test]
    fn test_review_input_deny_unknown_fields() {
        let json = r#"{"userId": "u1", "vocabularyId": "v1", "quality": 4}"#;
        let result: Result<ReviewInput, _> = serde_json::from_str(json);
        assert!(result.is_ok());

        // Extra fields are rejected rather than silently dropped
        let json_with_unknown =
            r#"{"userId": "u1", "vocabularyId": "v1", "quality": 4, "masteryLevel": 5}"#;
        let result: Result<ReviewInput, _> = serde_json::from_str(json_with_unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_review_outcome_wire_names() {
        let now = Utc::now();
        let mut record = MasteryRecord::seed("u1", "v1", now);
        record.interval_days = 6;
        record.mastery_level = 1;

        let outcome = ReviewOutcome::from(&record);
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("nextReview").is_some());
        assert!(json.get("masteryLevel").is_some());
        assert_eq!(json.get("interval").unwrap(), 6);
    }
}
