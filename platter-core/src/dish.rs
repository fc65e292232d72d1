//! Dish records as returned by the catalog provider.
//!
//! A [`DishRecord`] is immutable once fetched: a refetch for the same query
//! supersedes the whole record set, individual records are never mutated.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Nutrition attributes of a single dish.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    /// Energy per serving, in kilocalories.
    pub calories: u32,
    /// Protein per serving, in grams.
    pub protein_g: f32,
    /// Fat per serving, in grams.
    pub fat_g: f32,
    /// Carbohydrates per serving, in grams.
    pub carbs_g: f32,
}

/// A dish as fetched from the upstream catalog.
///
/// Tags are kept in a [`BTreeSet`] so serialization is canonical regardless
/// of the order the provider emitted them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRecord {
    /// Provider-assigned identifier, referenced by plans.
    pub id: SmolStr,
    /// Display name.
    pub name: String,
    /// Nutrition attributes.
    #[serde(default)]
    pub nutrition: Nutrition,
    /// Dietary and category tags (e.g. "vegetarian", "spicy").
    #[serde(default)]
    pub tags: BTreeSet<SmolStr>,
    /// Price per serving.
    #[serde(default)]
    pub price: f64,
    /// Whether the provider marks this as a signature dish.
    #[serde(default)]
    pub signature: bool,
    /// When the provider produced this record.
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl DishRecord {
    /// Returns true if the dish carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_serialize_in_canonical_order() {
        let mut a = DishRecord {
            id: "d1".into(),
            name: "Mapo Tofu".to_owned(),
            nutrition: Nutrition::default(),
            tags: BTreeSet::new(),
            price: 28.0,
            signature: false,
            fetched_at: Utc::now(),
        };
        a.tags.insert("spicy".into());
        a.tags.insert("vegetarian".into());

        let mut b = a.clone();
        b.tags.clear();
        // Inserted in the opposite order.
        b.tags.insert("vegetarian".into());
        b.tags.insert("spicy".into());

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
