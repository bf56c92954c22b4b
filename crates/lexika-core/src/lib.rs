//! # Lexika Core
//!
//! Spaced-repetition mastery engine for vocabulary learning:
//!
//! - **SM-2 Scheduler**: pure, validated scheduling — quality 0-5 in, next
//!   mastery state and due date out
//! - **Mastery records**: one per user x vocabulary item, created lazily on
//!   first review, never deleted
//! - **Review selection**: most-overdue-first queues with a frequency-ranked
//!   cold-start fallback for new learners
//! - **SQLite store**: transactional read-compute-write review path plus an
//!   append-only review-event log, enforced in the schema
//!
//! The exercise UI, lesson CRUD, authentication, and import pipelines live in
//! the surrounding application; this crate is the part that decides how well
//! a learner knows each word and when to ask again.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use lexika_core::{ReviewInput, SelectorConfig, SqliteStore, select_review_batch};
//!
//! // Open the store (uses the default platform-specific location)
//! let store = SqliteStore::new(None)?;
//!
//! // What should this user review right now?
//! let batch = select_review_batch(&store, "user-1", Utc::now(), 10, &SelectorConfig::default())?;
//!
//! // The user answered; record it
//! let record = store.record_review(
//!     &ReviewInput {
//!         user_id: "user-1".into(),
//!         vocabulary_id: batch.candidates[0].vocabulary_id.clone(),
//!         quality: 4,
//!     },
//!     Utc::now(),
//! )?;
//! println!("next review {}", record.next_review_at);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod mastery;
pub mod review;
pub mod srs;
pub mod store;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Mastery types
pub use mastery::{
    MasteryRecord, MasteryState, ProgressStats, ReviewEvent, ReviewInput, ReviewOutcome,
    VocabularyItem,
};

// SM-2 scheduling
pub use srs::{
    DEFAULT_EASE_FACTOR, MAX_MASTERY_LEVEL, MIN_EASE_FACTOR, Quality, ReviewResult, ScheduleError,
    Scheduler, mastery_level,
};

// Review selection
pub use review::{BatchSource, ReviewBatch, ReviewCandidate, SelectorConfig, select_review_batch};

// Store layer
pub use store::{MasteryStore, Result, ReviewLog, SqliteStore, StoreError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        MasteryRecord, MasteryState, Quality, Result, ReviewBatch, ReviewInput, ReviewOutcome,
        ScheduleError, Scheduler, SelectorConfig, SqliteStore, StoreError, select_review_batch,
    };
}
