//! Core domain types for the platter menu planning service.
//!
//! This crate holds everything the caching and orchestration layers agree on:
//!
//! - [`DishRecord`] — an immutable dish as fetched from the catalog provider
//! - [`PlanRequest`] / [`DishQuery`] — normalized request constraints
//! - [`MenuPlan`] — a generated plan with its provenance metadata
//! - [`Fingerprint`] — stable content hash used as cache key
//! - [`CacheValue`] / [`CacheState`] — the TTL envelope shared by all caches
//! - [`PlanPolicy`] — the injected plan generation capability
//!
//! Nothing here performs I/O; the storage backends live in `platter-backend`
//! and its implementations, the orchestration in `platter`.

#![warn(missing_docs)]

/// Dish records and nutrition attributes.
pub mod dish;

/// Stable content fingerprints used as cache keys.
pub mod fingerprint;

/// Generated menu plans.
pub mod plan;

/// Plan generation policy trait and the built-in deterministic policy.
pub mod policy;

/// Plan requests, dish queries and normalization.
pub mod request;

/// Cached value envelope with expiration metadata.
pub mod value;

pub use dish::{DishRecord, Nutrition};
pub use fingerprint::Fingerprint;
pub use plan::{DayPlan, MenuPlan};
pub use policy::{BalancedPolicy, PlanPolicy, PolicyError};
pub use request::{DishQuery, PlanRequest};
pub use value::{CacheState, CacheValue};
