//! Timestamped result store
//!
//! Holds processed results keyed by processing timestamp and answers
//! latest, nearest-by-distance, and previous-before lookups plus fact-set
//! diffs between two results.

pub mod models;
pub mod store;

pub use models::{FactDiff, ProcessedResult, ResultStatus};
pub use store::{diff_facts, ResultStore};
