//! Plan generation policy.
//!
//! The orchestration layer treats plan generation as an injected capability:
//! a pure function from a dish set and request constraints to a plan. The
//! trait is the contract; [`BalancedPolicy`] is the built-in deterministic
//! implementation.

use smol_str::SmolStr;
use thiserror::Error;

use crate::dish::DishRecord;
use crate::plan::{DayPlan, MenuPlan};
use crate::request::PlanRequest;

/// Errors a policy can report.
///
/// Policy failures are client-facing: the constraints cannot be satisfied
/// with the dishes on offer. They are never retried by the service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// No plan satisfies the request constraints.
    #[error("constraints cannot be satisfied: {0}")]
    Unsatisfiable(String),
}

/// A plan generation capability.
///
/// Implementations must be deterministic given their inputs: the caching
/// layer relies on a regenerated plan for identical inputs being equivalent.
pub trait PlanPolicy: Send + Sync {
    /// Version recorded in generated plans; bump on behavioral changes.
    fn version(&self) -> u32;

    /// Generates a plan from candidate dishes and request constraints.
    ///
    /// `dishes` is the full candidate set for the request's dish query;
    /// filtering by tags and exclusions is the policy's responsibility so
    /// that a shared dish cache entry can serve differently-constrained
    /// requests.
    fn generate(&self, dishes: &[DishRecord], request: &PlanRequest)
    -> Result<MenuPlan, PolicyError>;
}

/// Deterministic scoring policy.
///
/// Ranks candidates by how well price and calories fit the request, with a
/// small bonus for signature dishes, then deals the ranking round-robin
/// across days. Serves `diner_count + 2` dishes per day, the customary
/// table-setting margin.
#[derive(Debug, Clone, Default)]
pub struct BalancedPolicy;

/// Dishes served per day beyond the diner count.
const DISH_COUNT_ADD_ON: u32 = 2;

const WEIGHT_PRICE: f64 = 0.45;
const WEIGHT_CALORIES: f64 = 0.35;
const WEIGHT_VARIETY: f64 = 0.15;
const WEIGHT_SIGNATURE: f64 = 0.05;

impl BalancedPolicy {
    fn candidates<'a>(
        dishes: &'a [DishRecord],
        request: &PlanRequest,
    ) -> Vec<&'a DishRecord> {
        dishes
            .iter()
            .filter(|d| d.price > 0.0)
            .filter(|d| !request.excluded_dishes.contains(&d.id))
            .filter(|d| request.required_tags.iter().all(|t| d.tags.contains(t)))
            .filter(|d| request.excluded_tags.iter().all(|t| !d.tags.contains(t)))
            .collect()
    }

    fn score(dish: &DishRecord, request: &PlanRequest, per_day: u32) -> f64 {
        let price_fit = match request.budget_cents {
            Some(budget) => {
                let servings = u64::from(request.days.max(1)) * u64::from(per_day);
                let serving_budget = budget as f64 / 100.0 / servings as f64;
                closeness(dish.price, serving_budget)
            }
            None => 0.5,
        };
        let calorie_fit = match request.calorie_target {
            Some(target) => {
                let serving_target = f64::from(target) / f64::from(per_day);
                closeness(f64::from(dish.nutrition.calories), serving_target)
            }
            None => 0.5,
        };
        // More tags means more variety on the table.
        let variety = (dish.tags.len() as f64 / 8.0).min(1.0);
        let signature = if dish.signature { 1.0 } else { 0.0 };

        price_fit * WEIGHT_PRICE
            + calorie_fit * WEIGHT_CALORIES
            + variety * WEIGHT_VARIETY
            + signature * WEIGHT_SIGNATURE
    }
}

/// Closeness of `value` to `target` in (0, 1], 1.0 at an exact match.
fn closeness(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.5;
    }
    1.0 / (1.0 + (value - target).abs() / target)
}

impl PlanPolicy for BalancedPolicy {
    fn version(&self) -> u32 {
        1
    }

    fn generate(
        &self,
        dishes: &[DishRecord],
        request: &PlanRequest,
    ) -> Result<MenuPlan, PolicyError> {
        if request.days == 0 {
            return Err(PolicyError::Unsatisfiable("a plan needs at least one day".into()));
        }
        let candidates = Self::candidates(dishes, request);
        if candidates.is_empty() {
            return Err(PolicyError::Unsatisfiable(
                "no dishes match the requested constraints".into(),
            ));
        }

        // Saturating: the candidate pool caps the serving size anyway, so an
        // absurd diner count must not overflow before the cap applies.
        let per_day = request
            .diner_count
            .saturating_add(DISH_COUNT_ADD_ON)
            .min(candidates.len() as u32);

        if let Some(budget) = request.budget_cents {
            let cheapest = candidates
                .iter()
                .map(|d| d.price)
                .fold(f64::INFINITY, f64::min);
            let servings = (u64::from(request.days) * u64::from(per_day)) as f64;
            if cheapest * servings > budget as f64 / 100.0 {
                return Err(PolicyError::Unsatisfiable(format!(
                    "budget too low: {servings} servings of the cheapest eligible dish \
                     already exceed it",
                )));
            }
        }

        let mut ranked: Vec<&DishRecord> = candidates;
        ranked.sort_by(|a, b| {
            let sa = Self::score(a, request, per_day);
            let sb = Self::score(b, request, per_day);
            // Ties broken by id so the ranking is total and deterministic.
            sb.total_cmp(&sa).then_with(|| a.id.cmp(&b.id))
        });

        let mut total_price = 0.0;
        let mut days = Vec::with_capacity(request.days as usize);
        let mut cursor = 0usize;
        for _ in 0..request.days {
            let mut assigned: Vec<SmolStr> = Vec::with_capacity(per_day as usize);
            while assigned.len() < per_day as usize {
                let dish = ranked[cursor % ranked.len()];
                cursor += 1;
                if assigned.contains(&dish.id) {
                    // Wrapped within one day; every remaining pick would repeat.
                    break;
                }
                total_price += dish.price;
                assigned.push(dish.id.clone());
            }
            days.push(DayPlan { dishes: assigned });
        }

        Ok(MenuPlan {
            days,
            generated_at: chrono::Utc::now(),
            policy_version: self.version(),
            total_price,
            degraded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::dish::Nutrition;

    fn dish(id: &str, price: f64, calories: u32, tags: &[&str]) -> DishRecord {
        DishRecord {
            id: id.into(),
            name: id.to_uppercase(),
            nutrition: Nutrition {
                calories,
                ..Nutrition::default()
            },
            tags: tags.iter().map(|t| (*t).into()).collect(),
            price,
            signature: false,
            fetched_at: chrono::Utc::now(),
        }
    }

    fn pantry() -> Vec<DishRecord> {
        vec![
            dish("d1", 30.0, 450, &["spicy"]),
            dish("d2", 25.0, 380, &["vegetarian"]),
            dish("d3", 45.0, 600, &["halal", "spicy"]),
            dish("d4", 18.0, 300, &["vegetarian", "halal"]),
            dish("d5", 60.0, 750, &["halal"]),
        ]
    }

    fn request(days: u32) -> PlanRequest {
        PlanRequest {
            days,
            diner_count: 2,
            required_tags: BTreeSet::new(),
            excluded_tags: BTreeSet::new(),
            calorie_target: Some(1600),
            budget_cents: Some(50_000),
            excluded_dishes: BTreeSet::new(),
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let policy = BalancedPolicy;
        let a = policy.generate(&pantry(), &request(3)).unwrap();
        let b = policy.generate(&pantry(), &request(3)).unwrap();
        assert_eq!(a.days, b.days);
        assert_eq!(a.total_price, b.total_price);
    }

    #[test]
    fn respects_day_count_and_serving_size() {
        let plan = BalancedPolicy.generate(&pantry(), &request(3)).unwrap();
        assert_eq!(plan.days.len(), 3);
        // diner_count 2 + add-on 2 = 4 dishes per day.
        assert!(plan.days.iter().all(|d| d.dishes.len() == 4));
    }

    #[test]
    fn excluded_dishes_never_appear() {
        let mut req = request(2);
        req.excluded_dishes.insert("d3".into());
        let plan = BalancedPolicy.generate(&pantry(), &req).unwrap();
        assert!(plan.days.iter().all(|d| !d.dishes.contains(&"d3".into())));
    }

    #[test]
    fn required_and_excluded_tags_filter_candidates() {
        let mut req = request(1);
        req.required_tags.insert("halal".into());
        req.excluded_tags.insert("spicy".into());
        let plan = BalancedPolicy.generate(&pantry(), &req).unwrap();
        // Only d4 and d5 are halal and not spicy.
        for day in &plan.days {
            for id in &day.dishes {
                assert!(id.as_str() == "d4" || id.as_str() == "d5", "unexpected dish {id}");
            }
        }
    }

    #[test]
    fn empty_candidate_set_is_unsatisfiable() {
        let mut req = request(1);
        req.required_tags.insert("kosher".into());
        let err = BalancedPolicy.generate(&pantry(), &req).unwrap_err();
        assert!(matches!(err, PolicyError::Unsatisfiable(_)));
    }

    #[test]
    fn impossible_budget_is_unsatisfiable() {
        let mut req = request(3);
        req.budget_cents = Some(100);
        let err = BalancedPolicy.generate(&pantry(), &req).unwrap_err();
        assert!(matches!(err, PolicyError::Unsatisfiable(_)));
    }

    #[test]
    fn enormous_diner_count_is_capped_by_the_candidate_pool() {
        let mut req = request(2);
        req.diner_count = u32::MAX;
        let plan = BalancedPolicy.generate(&pantry(), &req).unwrap();
        // Serving size saturates at the pool, not at an overflowing sum.
        assert!(plan.days.iter().all(|d| d.dishes.len() == pantry().len()));
    }

    #[test]
    fn no_dishes_at_all_is_unsatisfiable() {
        let err = BalancedPolicy.generate(&[], &request(1)).unwrap_err();
        assert!(matches!(err, PolicyError::Unsatisfiable(_)));
    }
}
