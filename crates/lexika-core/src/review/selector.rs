//! Due-item selection
//!
//! Decides what a review session shows: items whose review date has passed,
//! most-overdue first, or — when nothing is due — a short cold-start batch of
//! never-seen words from the top of the frequency-ranked corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::MasteryRecord;
use crate::store::{MasteryStore, Result};

// ============================================================================
// CONFIG
// ============================================================================

/// Tunables for batch selection.
///
/// These are product choices, not invariants: the cold-start size of 5 and
/// the plain `next_review_at` ordering match the shipped application, but a
/// deployment can change either without touching scheduling semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    /// How many never-reviewed items to introduce when nothing is due
    pub cold_start_limit: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self { cold_start_limit: 5 }
    }
}

// ============================================================================
// BATCH TYPES
// ============================================================================

/// Which policy produced a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchSource {
    /// Items whose `next_review_at` has passed
    Due,
    /// Never-reviewed items introduced because nothing was due
    ColdStart,
}

/// One item in a review batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCandidate {
    /// The item to present
    pub vocabulary_id: String,
    /// Persisted record, or a synthesized seed record for a never-seen item.
    /// Synthesized records are display-only; nothing is written until the
    /// user answers.
    pub record: MasteryRecord,
    /// True when the user has never reviewed this item
    pub unseen: bool,
}

/// An ordered, finite review batch.
///
/// Produced eagerly; a restarted session re-queries rather than resuming a
/// cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBatch {
    /// Which policy filled the batch
    pub source: BatchSource,
    /// Items in presentation order
    pub candidates: Vec<ReviewCandidate>,
}

impl ReviewBatch {
    /// Vocabulary ids in presentation order
    pub fn vocabulary_ids(&self) -> Vec<&str> {
        self.candidates
            .iter()
            .map(|c| c.vocabulary_id.as_str())
            .collect()
    }

    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the batch is empty (nothing due, nothing left to introduce)
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Select the next review batch for a user.
///
/// Primary policy: up to `batch_size` due records ordered ascending by
/// `next_review_at`, so the items at highest forgetting risk come first.
/// Fallback: when zero items are due, up to
/// [`SelectorConfig::cold_start_limit`] never-reviewed words ordered by
/// descending corpus frequency, wrapped in unpersisted seed records due
/// immediately.
pub fn select_review_batch<S: MasteryStore>(
    store: &S,
    user_id: &str,
    now: DateTime<Utc>,
    batch_size: usize,
    config: &SelectorConfig,
) -> Result<ReviewBatch> {
    let due = store.due_records(user_id, now, batch_size)?;
    if !due.is_empty() {
        let candidates = due
            .into_iter()
            .map(|record| ReviewCandidate {
                vocabulary_id: record.vocabulary_id.clone(),
                record,
                unseen: false,
            })
            .collect();
        return Ok(ReviewBatch {
            source: BatchSource::Due,
            candidates,
        });
    }

    let unseen = store.unseen_vocabulary(user_id, config.cold_start_limit)?;
    let candidates = unseen
        .into_iter()
        .map(|item| ReviewCandidate {
            record: MasteryRecord::seed(user_id, item.id.clone(), now),
            vocabulary_id: item.id,
            unseen: true,
        })
        .collect();

    Ok(ReviewBatch {
        source: BatchSource::ColdStart,
        candidates,
    })
}

// ============================================================================
// TESTS
// ============================================================================
