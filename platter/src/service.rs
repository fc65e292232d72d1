//! Plan orchestration and health probing.
//!
//! Per request the service walks a four-state flow:
//!
//! ```text
//! CheckPlanCache ── hit ──────────────────────────────▶ return cached
//!       │ miss
//! CheckDishCache ── fresh hit ───────────────▶ Generate ──▶ cache + return
//!       │ miss / stale
//! FetchUpstream ── success ──▶ StoreDish ──▶ Generate ──▶ cache + return
//!       │ failure
//! Degrade ── stale data within ceiling ──▶ Generate, tag degraded, no cache
//!       │ nothing to fall back on
//!       ▼
//! Unavailable
//! ```
//!
//! Both the plan computation and the upstream fetch are gated by their own
//! single-flight coordinator, so a burst of identical cold requests costs
//! one fetch and one policy run. Cache store failures never fail a request:
//! reads degrade to misses, writes to no-ops.

use std::sync::Arc;
use std::time::Duration;

use platter_backend::Backend;
use platter_core::{
    CacheState, DishRecord, Fingerprint, MenuPlan, PlanPolicy, PlanRequest,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::cache::{Lookup, TtlCache};
use crate::catalog::{CatalogError, DishSource};
use crate::config::CachePolicyConfig;
use crate::error::PlanError;
use crate::singleflight::{FlightError, SingleFlight};

/// Bound on waiting for the dish flight inside a plan computation. Callers
/// enforce their own deadlines at the plan flight boundary; this only keeps
/// a leaderless leak from pinning a task forever.
const DISH_FLIGHT_WAIT: Duration = Duration::from_secs(600);

/// Where a returned plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Generated on this request from fresh dish data.
    Fresh,
    /// Served from the plan cache.
    Cached,
    /// Generated from stale dish data during an upstream outage.
    /// Never written to the plan cache.
    Degraded,
}

/// A successfully answered plan request.
#[derive(Debug, Clone)]
pub struct Planned {
    /// The generated or cached plan.
    pub plan: MenuPlan,
    /// How it was served.
    pub served: Served,
}

/// Service liveness as seen by the orchestration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Cache store and dish provider both reachable.
    Ok,
    /// Exactly one of the two dependencies is unreachable; requests are
    /// still served, possibly degraded or uncached.
    Degraded,
    /// Neither dependency is reachable.
    Down,
}

/// Dish data resolved for one query, with its provenance.
#[derive(Debug, Clone)]
struct DishSet {
    records: Vec<DishRecord>,
    degraded: bool,
}

/// The plan generation façade.
///
/// Stateless between requests apart from the two caches and the two
/// in-flight registries, all of which have process-wide lifetime.
pub struct PlanService {
    catalog: Arc<dyn DishSource>,
    policy: Arc<dyn PlanPolicy>,
    backend: Arc<dyn Backend>,
    plan_cache: TtlCache<MenuPlan>,
    dish_cache: TtlCache<Vec<DishRecord>>,
    plan_flight: SingleFlight<Planned, PlanError>,
    dish_flight: SingleFlight<DishSet, CatalogError>,
}

impl PlanService {
    /// Wires the service from its collaborators.
    ///
    /// The dish cache gets `menu_cache_ttl` plus the stale ceiling as grace
    /// window; the plan cache gets `plan_cache_ttl` and no grace window.
    pub fn new(
        catalog: Arc<dyn DishSource>,
        policy: Arc<dyn PlanPolicy>,
        backend: Arc<dyn Backend>,
        cache: &CachePolicyConfig,
    ) -> Self {
        let plan_cache = TtlCache::new(Arc::clone(&backend), cache.plan_cache_ttl, None);
        let dish_cache = TtlCache::new(
            Arc::clone(&backend),
            cache.menu_cache_ttl,
            Some(cache.dish_stale_ceiling),
        );
        PlanService {
            catalog,
            policy,
            backend,
            plan_cache,
            dish_cache,
            plan_flight: SingleFlight::new("plan"),
            dish_flight: SingleFlight::new("dishes"),
        }
    }

    /// Answers "give me a plan for request R".
    ///
    /// `deadline` bounds this caller's waiting time only: when it elapses
    /// while another caller's computation is in flight, this caller gets
    /// [`PlanError::Timeout`] and the computation keeps running for the
    /// cache and for later callers.
    pub async fn generate_plan(
        &self,
        request: PlanRequest,
        deadline: Duration,
    ) -> Result<Planned, PlanError> {
        let request = request.normalize();
        let key = request.fingerprint();

        // Fresh cached plans need no coordination at all.
        if let Lookup::Hit(value, CacheState::Actual) =
            read_or_miss(&self.plan_cache, &key, "plan").await
        {
            debug!(key = %key, "plan cache hit");
            return Ok(Planned {
                plan: value.into_inner(),
                served: Served::Cached,
            });
        }

        let op = {
            let catalog = Arc::clone(&self.catalog);
            let policy = Arc::clone(&self.policy);
            let plan_cache = self.plan_cache.clone();
            let dish_cache = self.dish_cache.clone();
            let dish_flight = self.dish_flight.clone();
            move || {
                compute_plan(catalog, policy, plan_cache, dish_cache, dish_flight, request, key)
            }
        };

        match self.plan_flight.execute(key, deadline, op).await {
            Ok(Ok(planned)) => Ok(planned),
            Ok(Err(shared)) => Err((*shared).clone()),
            Err(FlightError::Timeout) => Err(PlanError::Timeout),
        }
    }

    /// Drops the cached plan for `request`, if any.
    pub async fn invalidate_plan(&self, request: PlanRequest) {
        let key = request.normalize().fingerprint();
        if let Err(err) = self.plan_cache.invalidate(&key).await {
            warn!(key = %key, error = %err, "plan cache invalidation failed");
        }
    }

    /// Probes both dependencies concurrently.
    pub async fn health(&self) -> Health {
        let (store, upstream) = tokio::join!(self.backend.ping(), self.catalog.probe());
        if let Err(err) = &store {
            warn!(error = %err, "cache store unreachable");
        }
        if let Err(err) = &upstream {
            warn!(error = %err, "dish provider unreachable");
        }
        match (store.is_ok(), upstream.is_ok()) {
            (true, true) => Health::Ok,
            (false, false) => Health::Down,
            _ => Health::Degraded,
        }
    }
}

/// Leader body of the plan flight: everything past the plan cache check.
async fn compute_plan(
    catalog: Arc<dyn DishSource>,
    policy: Arc<dyn PlanPolicy>,
    plan_cache: TtlCache<MenuPlan>,
    dish_cache: TtlCache<Vec<DishRecord>>,
    dish_flight: SingleFlight<DishSet, CatalogError>,
    request: PlanRequest,
    key: Fingerprint,
) -> Result<Planned, PlanError> {
    // Re-check as leader: a previous leader may have written the plan while
    // this caller was waiting for the flight slot.
    if let Lookup::Hit(value, CacheState::Actual) = read_or_miss(&plan_cache, &key, "plan").await {
        return Ok(Planned {
            plan: value.into_inner(),
            served: Served::Cached,
        });
    }

    // CheckDishCache / FetchUpstream / Degrade, one execution per query.
    let query = request.dish_query();
    let dish_key = query.fingerprint();
    let flight_result = {
        let catalog = Arc::clone(&catalog);
        let dish_cache = dish_cache.clone();
        dish_flight
            .execute(dish_key, DISH_FLIGHT_WAIT, move || {
                acquire_dishes(catalog, dish_cache, query, dish_key)
            })
            .await
    };
    let dishes = match flight_result {
        Ok(Ok(set)) => set,
        Ok(Err(shared)) => return Err(PlanError::Unavailable((*shared).clone())),
        Err(FlightError::Timeout) => return Err(PlanError::Timeout),
    };

    // Generate.
    let mut plan = policy.generate(&dishes.records, &request)?;
    if dishes.degraded {
        plan.degraded = true;
        info!(key = %key, "serving degraded plan from stale dish data");
        return Ok(Planned {
            plan,
            served: Served::Degraded,
        });
    }
    if let Err(err) = plan_cache.put(&key, plan.clone()).await {
        warn!(key = %key, error = %err, "plan cache write failed, serving uncached");
    }
    Ok(Planned {
        plan,
        served: Served::Fresh,
    })
}

/// Leader body of the dish flight: cache check, upstream fetch, fallback.
async fn acquire_dishes(
    catalog: Arc<dyn DishSource>,
    dish_cache: TtlCache<Vec<DishRecord>>,
    query: platter_core::DishQuery,
    key: Fingerprint,
) -> Result<DishSet, CatalogError> {
    let stale_fallback = match read_or_miss(&dish_cache, &key, "dish").await {
        Lookup::Hit(value, CacheState::Actual) => {
            debug!(key = %key, "dish cache hit");
            return Ok(DishSet {
                records: value.into_inner(),
                degraded: false,
            });
        }
        // Expired but within the staleness ceiling: only usable if the
        // provider turns out to be down.
        Lookup::Hit(value, _) => Some(value.into_inner()),
        Lookup::Miss => None,
    };

    match catalog.fetch(&query).await {
        Ok(records) => {
            if let Err(err) = dish_cache.put(&key, records.clone()).await {
                warn!(key = %key, error = %err, "dish cache write failed");
            }
            Ok(DishSet {
                records,
                degraded: false,
            })
        }
        Err(err) => match stale_fallback {
            Some(records) => {
                warn!(key = %key, error = %err, "dish provider down, degrading to stale dish data");
                Ok(DishSet {
                    records,
                    degraded: true,
                })
            }
            None => Err(err),
        },
    }
}

/// Cache reads never fail a request: a backend error is a forced miss.
async fn read_or_miss<V>(cache: &TtlCache<V>, key: &Fingerprint, what: &str) -> Lookup<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    match cache.get(key).await {
        Ok(lookup) => lookup,
        Err(err) => {
            warn!(key = %key, error = %err, "{what} cache read failed, treating as miss");
            Lookup::Miss
        }
    }
}
