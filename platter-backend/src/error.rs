//! Backend error types.

use thiserror::Error;

/// Convenience alias for backend operation results.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by cache storage backends.
///
/// The orchestration layer treats every variant the same way: a failed read
/// is a forced miss, a failed write a best-effort no-op. The distinction
/// exists for logging and tests.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backing store is unreachable or failed internally.
    #[error("backend unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored payload could not be encoded or decoded.
    #[error("value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Wraps an arbitrary store error as [`BackendError::Unavailable`].
    pub fn unavailable<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::Unavailable(Box::new(err))
    }
}

/// Outcome of a remove operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The number of removed entries.
    Deleted(u32),
    /// The entry was not found.
    Missing,
}
