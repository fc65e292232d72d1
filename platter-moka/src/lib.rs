//! In-memory cache backend for platter using Moka.

#![warn(missing_docs)]

mod backend;

pub use backend::{MokaBackend, MokaBackendBuilder};
