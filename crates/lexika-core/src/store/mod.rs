//! Store Module
//!
//! The two persistence collaborators the review core depends on, as traits,
//! plus the SQLite implementation used by the application:
//! - [`MasteryStore`]: fetch/update per-(user, item) mastery records and
//!   answer the selector's due/unseen queries
//! - [`ReviewLog`]: append-only review events for analytics
//!
//! The scheduler itself never locks anything. [`SqliteStore::record_review`]
//! is the one place read-compute-write happens, inside a single IMMEDIATE
//! transaction keyed by the connection, so two near-simultaneous submissions
//! for the same (user, item) pair serialize instead of losing an update.

mod migrations;
mod sqlite;

use chrono::{DateTime, Utc};

use crate::mastery::{MasteryRecord, ReviewEvent, VocabularyItem};
use crate::srs::ScheduleError;

pub use migrations::MIGRATIONS;
pub use sqlite::SqliteStore;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Referenced vocabulary item or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Scheduling rejected the review
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// TRAITS
// ============================================================================

/// Per-(user, item) mastery persistence.
///
/// `get`/`put` move whole records; a missing record is the normal
/// first-encounter case and comes back as `Ok(None)`, never as an error.
pub trait MasteryStore {
    /// Fetch the mastery record for one (user, item) pair
    fn get_mastery(&self, user_id: &str, vocabulary_id: &str) -> Result<Option<MasteryRecord>>;

    /// Insert or replace a mastery record
    fn put_mastery(&self, record: &MasteryRecord) -> Result<()>;

    /// Records due at `now` for one user, most-overdue first
    fn due_records(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MasteryRecord>>;

    /// Vocabulary the user has never reviewed, most frequent first
    fn unseen_vocabulary(&self, user_id: &str, limit: usize) -> Result<Vec<VocabularyItem>>;
}

/// Append-only review-event log.
///
/// Events are an audit/analytics trail; the scheduler never reads them back.
/// Implementations must preserve write-once semantics.
pub trait ReviewLog {
    /// Append one event to the log
    fn append_review(&self, event: &ReviewEvent) -> Result<()>;

    /// Most recent events for one user, newest first
    fn recent_reviews(&self, user_id: &str, limit: usize) -> Result<Vec<ReviewEvent>>;
}
