//! History store error types.

use thiserror::Error;

/// Errors a history back-end may report. The in-memory store never fails.
#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    /// Storage back-end failure.
    #[error("History storage error: {0}")]
    Storage(String),
}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
