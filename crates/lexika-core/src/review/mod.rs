//! Review Session Module
//!
//! Batch selection policy for review sessions: due items first, a cold-start
//! introduction batch when the queue is empty.

mod selector;

pub use selector::{
    BatchSource, ReviewBatch, ReviewCandidate, SelectorConfig, select_review_batch,
};
