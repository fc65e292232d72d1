//! Cache-coordinated menu plan generation.
//!
//! `platter` answers one question — "give me a plan for request R" — while
//! keeping two independently aged caches consistent and a rate-limited
//! upstream dish provider safe from thundering herds.
//!
//! The pieces, leaves first:
//!
//! - [`catalog`] — the [`DishSource`](catalog::DishSource) contract and the
//!   [`DishCatalogClient`](catalog::DishCatalogClient) HTTP implementation
//!   with retry and exponential backoff.
//! - [`cache`] — [`TtlCache`](cache::TtlCache), one generic TTL store
//!   instantiated twice: dish data under `menu_cache_ttl` (with a stale
//!   grace window for degradation), plans under `plan_cache_ttl`.
//! - [`singleflight`] — collapses concurrent identical operations into one
//!   execution shared by all callers, per fingerprint.
//! - [`service`] — [`PlanService`](service::PlanService), the façade that
//!   runs the check-plan-cache → check-dish-cache → fetch → generate flow
//!   and degrades to stale dish data when the provider is down.
//! - [`config`] — environment configuration, built once at startup and
//!   passed down explicitly so tests can substitute fakes.

#![warn(missing_docs)]

/// Generic TTL cache over a storage backend.
pub mod cache;

/// Upstream dish catalog client.
pub mod catalog;

/// Environment configuration.
pub mod config;

/// Service error taxonomy.
pub mod error;

/// Plan orchestration and health probing.
pub mod service;

/// Concurrent request deduplication.
pub mod singleflight;

pub use cache::{Lookup, TtlCache};
pub use catalog::{CatalogError, DishCatalogClient, DishSource, RetryPolicy};
pub use config::{AppConfig, CachePolicyConfig, CatalogConfig, ConfigError, StoreConfig};
pub use error::PlanError;
pub use service::{Health, PlanService, Planned, Served};
pub use singleflight::{FlightError, SingleFlight};
