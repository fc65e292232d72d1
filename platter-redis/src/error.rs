//! Redis backend error type.

use platter_backend::BackendError;
use thiserror::Error;

/// Errors specific to the redis backend.
#[derive(Debug, Error)]
pub enum Error {
    /// The redis server returned an error or is unreachable.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl From<Error> for BackendError {
    fn from(err: Error) -> Self {
        BackendError::unavailable(err)
    }
}
