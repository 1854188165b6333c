//! Crate-wide error types

use crate::pipeline::completion::CompletionError;

/// Errors surfaced by the fact extraction service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch document: {0}")]
    Fetch(String),

    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("no processed results available")]
    EmptyStore,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
