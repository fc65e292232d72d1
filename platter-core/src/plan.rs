//! Generated menu plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Dishes assigned to a single day, in serving order.
///
/// Dishes are referenced by identifier, not by value: the authoritative
/// records live in the dish cache and upstream catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Dish identifiers for this day.
    pub dishes: Vec<SmolStr>,
}

/// A generated menu plan plus its provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPlan {
    /// One entry per requested day, in order.
    pub days: Vec<DayPlan>,
    /// When the policy produced this plan.
    pub generated_at: DateTime<Utc>,
    /// Version of the policy that produced it.
    pub policy_version: u32,
    /// Estimated total price across all days.
    pub total_price: f64,
    /// Set when the plan was generated from stale dish data during an
    /// upstream outage. Degraded plans are never cached.
    #[serde(default)]
    pub degraded: bool,
}

impl MenuPlan {
    /// Total number of dish servings across all days.
    pub fn dish_count(&self) -> usize {
        self.days.iter().map(|d| d.dishes.len()).sum()
    }
}
