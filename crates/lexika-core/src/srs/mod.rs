//! SM-2 Spaced Repetition Module
//!
//! The classic SuperMemo 2 scheduling algorithm, split into pure arithmetic
//! ([`algorithm`]) and the stateless [`Scheduler`] that applies it to a
//! mastery state.
//!
//! ## Core behavior
//! - Success (quality >= 3): intervals run 1 day, 6 days, then
//!   `round(interval * ease)`.
//! - Failure (quality < 3): repetitions and interval reset; the item comes
//!   back tomorrow.
//! - The ease factor moves with every review and never drops below 1.3.

pub mod algorithm;
mod scheduler;

pub use algorithm::{
    // Constants
    DEFAULT_EASE_FACTOR,
    FIRST_INTERVAL_DAYS,
    MAX_INTERVAL_DAYS,
    MAX_MASTERY_LEVEL,
    MIN_EASE_FACTOR,
    REPS_PER_MASTERY_LEVEL,
    SECOND_INTERVAL_DAYS,
    SUCCESS_THRESHOLD,
    // Core functions
    is_success,
    mastery_level,
    next_ease_factor,
    next_interval,
};

pub use scheduler::{Quality, ReviewResult, ScheduleError, Scheduler};
