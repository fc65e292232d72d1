//! Storage backend traits for the platter cache layer.
//!
//! A [`Backend`] stores opaque byte payloads wrapped in the shared
//! [`CacheValue`](platter_core::CacheValue) envelope, keyed by
//! [`Fingerprint`](platter_core::Fingerprint). The [`CacheBackend`]
//! extension adds typed `get`/`set` over serde_json, preserving the
//! envelope's expiration metadata across the encode/decode boundary.
//!
//! Implementations live in their own crates: `platter-moka` (in-process)
//! and `platter-redis` (remote store).

#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{Backend, CacheBackend};
pub use error::{BackendError, BackendResult, DeleteStatus};
