//! Redis cache backend for platter.

#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{RedisBackend, RedisBackendBuilder};
pub use error::Error;
