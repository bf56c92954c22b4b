//! SM-2 arithmetic
//!
//! The pure formulas behind the scheduler, kept free of any record or
//! storage types so they can be tested as plain functions.
//!
//! Reference: P. A. Wozniak, "Optimization of learning" (the SuperMemo 2
//! algorithm). Intervals grow as `round(previous_interval * ease_factor)`
//! after the second successful repetition; the ease factor is nudged by the
//! self-reported recall quality and floored at 1.3.

// ============================================================================
// CONSTANTS
// ============================================================================

/// Ease factor assigned to an item the first time it is ever reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound on the ease factor. Below this, SM-2 intervals stop growing
/// meaningfully and items get stuck in review hell.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Interval after the first successful repetition
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second successful repetition
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Upper bound on a single interval (~100 years). The growth formula is
/// exponential; without a cap a long streak overflows any useful range.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Minimum quality that counts as a successful recall
pub const SUCCESS_THRESHOLD: u8 = 3;

/// Highest mastery level an item can reach
pub const MAX_MASTERY_LEVEL: u8 = 5;

/// Consecutive successful repetitions needed per mastery level
pub const REPS_PER_MASTERY_LEVEL: u32 = 3;

// ============================================================================
// FORMULAS
// ============================================================================

/// Update the ease factor from a 0-5 recall quality.
///
/// `ease' = ease + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`, floored at
/// [`MIN_EASE_FACTOR`]. Applied after every review, including failures, so
/// repeatedly forgetting an item keeps making it "harder".
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    let q = f64::from(quality);
    let updated = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    updated.max(MIN_EASE_FACTOR)
}

/// Interval after a successful repetition.
///
/// `repetitions_before` is the consecutive-success count going into this
/// review; the ease factor is the pre-update one. The first two successes use
/// fixed intervals, after that the interval compounds.
pub fn next_interval(repetitions_before: u32, previous_interval: u32, ease_factor: f64) -> u32 {
    let days = match repetitions_before {
        0 => FIRST_INTERVAL_DAYS,
        1 => SECOND_INTERVAL_DAYS,
        _ => {
            let grown = (f64::from(previous_interval) * ease_factor).round();
            grown.max(1.0) as u32
        }
    };
    days.min(MAX_INTERVAL_DAYS)
}

/// Whether a quality score counts as a successful recall
pub fn is_success(quality: u8) -> bool {
    quality >= SUCCESS_THRESHOLD
}

/// Coarse 0-5 mastery bucket derived from the repetition count.
///
/// Display-only projection: `min(5, repetitions / 3)`. Always recomputed from
/// `repetitions`, never read back as an input.
pub fn mastery_level(repetitions: u32) -> u8 {
    let level = repetitions / REPS_PER_MASTERY_LEVEL;
    level.min(u32::from(MAX_MASTERY_LEVEL)) as u8
}

// ============================================================================
// TESTS
// ============================================================================
