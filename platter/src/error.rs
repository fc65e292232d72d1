//! Service error taxonomy.
//!
//! Only two conditions reach the caller as hard failures: the policy
//! reporting the constraints unsatisfiable, and the provider being down
//! with no cached dish data to fall back on. Everything else is absorbed —
//! cache store failures become forced misses or skipped writes, provider
//! failures with usable stale data become degraded results, and a caller's
//! elapsed deadline detaches only that caller.

use platter_core::PolicyError;
use thiserror::Error;

use crate::catalog::CatalogError;

/// A plan request's terminal failure.
#[derive(Debug, Clone, Error)]
pub enum PlanError {
    /// The dish provider is unreachable and no dish data — fresh or stale —
    /// exists to degrade onto. The caller may retry; the service does not.
    #[error("temporarily unable to compute a plan: {0}")]
    Unavailable(#[source] CatalogError),

    /// The constraints cannot be satisfied. A client-facing outcome,
    /// distinct from "temporarily unable": retrying will not help.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The caller's deadline elapsed while the work was still in flight.
    /// The underlying operation keeps running and populates the caches.
    #[error("deadline elapsed before the plan was ready")]
    Timeout,
}
