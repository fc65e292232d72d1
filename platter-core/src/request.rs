//! Plan requests and the dish queries derived from them.
//!
//! Requests are normalized before fingerprinting so that two semantically
//! identical requests hash identically: tag sets are lowercased, trimmed and
//! held in [`BTreeSet`]s, which also makes serialization order-independent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::fingerprint::Fingerprint;

/// Constraints for a plan generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Number of days the plan should cover.
    pub days: u32,
    /// Number of diners each day serves.
    #[serde(default = "default_diner_count")]
    pub diner_count: u32,
    /// Tags every selected dish set must cover (e.g. "halal").
    #[serde(default)]
    pub required_tags: BTreeSet<SmolStr>,
    /// Tags that disqualify a dish.
    #[serde(default)]
    pub excluded_tags: BTreeSet<SmolStr>,
    /// Daily calorie target per diner, if any.
    #[serde(default)]
    pub calorie_target: Option<u32>,
    /// Total budget across the whole plan, if any.
    ///
    /// Stored in cents so the request stays `Eq` and hashes stably.
    #[serde(default)]
    pub budget_cents: Option<u64>,
    /// Dish identifiers the caller explicitly rules out.
    #[serde(default)]
    pub excluded_dishes: BTreeSet<SmolStr>,
}

fn default_diner_count() -> u32 {
    1
}

impl PlanRequest {
    /// Normalizes the request in place.
    ///
    /// Tags are lowercased and trimmed, empty entries dropped. A tag listed
    /// as both required and excluded stays in both sets; exclusion wins at
    /// candidate filtering time.
    pub fn normalize(mut self) -> Self {
        self.required_tags = normalize_tags(&self.required_tags);
        self.excluded_tags = normalize_tags(&self.excluded_tags);
        self.excluded_dishes = self
            .excluded_dishes
            .iter()
            .map(|d| SmolStr::new(d.trim()))
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    /// Fingerprint of the normalized request, keying the plan cache.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of("plan", 1, self)
    }

    /// The subset of constraints that selects candidate dishes.
    ///
    /// Day count, diner count, calorie target and budget do not change which
    /// dishes are eligible, so requests differing only in those share one
    /// dish cache entry.
    pub fn dish_query(&self) -> DishQuery {
        DishQuery {
            required_tags: self.required_tags.clone(),
            excluded_tags: self.excluded_tags.clone(),
            excluded_dishes: self.excluded_dishes.clone(),
        }
    }
}

fn normalize_tags(tags: &BTreeSet<SmolStr>) -> BTreeSet<SmolStr> {
    tags.iter()
        .map(|t| SmolStr::new(t.trim().to_lowercase()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// The normalized dish selection constraints sent to the catalog provider.
///
/// Keys the dish cache independently of the plan cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishQuery {
    /// Tags every candidate must carry.
    pub required_tags: BTreeSet<SmolStr>,
    /// Tags that disqualify a candidate.
    pub excluded_tags: BTreeSet<SmolStr>,
    /// Identifiers excluded outright.
    pub excluded_dishes: BTreeSet<SmolStr>,
}

impl DishQuery {
    /// Fingerprint of the query, keying the dish cache.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of("dishes", 1, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            days: 3,
            diner_count: 4,
            required_tags: ["Halal ", "vegetarian"].iter().map(|t| (*t).into()).collect(),
            excluded_tags: BTreeSet::new(),
            calorie_target: Some(2000),
            budget_cents: Some(60_000),
            excluded_dishes: BTreeSet::new(),
        }
    }

    #[test]
    fn normalization_lowercases_and_trims_tags() {
        let req = request().normalize();
        let tags: Vec<&str> = req.required_tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["halal", "vegetarian"]);
    }

    #[test]
    fn fingerprint_ignores_json_field_order() {
        let a: PlanRequest = serde_json::from_str(
            r#"{"days":2,"diner_count":4,"required_tags":["halal"],"calorie_target":1800}"#,
        )
        .unwrap();
        let b: PlanRequest = serde_json::from_str(
            r#"{"calorie_target":1800,"required_tags":["halal"],"days":2,"diner_count":4}"#,
        )
        .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_distinguishes_different_constraints() {
        let a = request().normalize();
        let mut b = a.clone();
        b.days = 5;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn dish_query_ignores_plan_shape() {
        let a = request().normalize();
        let mut b = a.clone();
        b.days = 7;
        b.diner_count = 2;
        b.calorie_target = None;
        assert_eq!(a.dish_query().fingerprint(), b.dish_query().fingerprint());
    }
}
