//! Per-animal-type aggregation of a [`Classification`].

use std::collections::BTreeMap;

use chipping_analytics_models::{AnalyticsGroup, AnimalType, AreaAnalytics, TypeAnalytics};

use crate::movement::Classification;

/// Counts each classified animal once per type it has, per group.
///
/// Totals are the group sizes, not the sum of the per-type counters: an
/// animal with two types adds one to each type but only one to the total.
/// Animals missing from `types_by_animal` count towards the totals only.
///
/// Records are ordered by type id rather than by the order types are first
/// seen, so the same rows always produce the same response regardless of
/// group or animal iteration order.
#[must_use]
pub fn aggregate(
    classification: &Classification,
    types_by_animal: &BTreeMap<i64, Vec<AnimalType>>,
) -> AreaAnalytics {
    let mut by_type: BTreeMap<i64, TypeAnalytics> = BTreeMap::new();

    for &group in AnalyticsGroup::all() {
        for animal_id in classification.group(group) {
            let Some(types) = types_by_animal.get(animal_id) else {
                continue;
            };
            for animal_type in types {
                by_type
                    .entry(animal_type.id)
                    .or_insert_with(|| TypeAnalytics::new(animal_type))
                    .increment(group);
            }
        }
    }

    AreaAnalytics {
        total_quantity_animals: classification.quantity.len() as u64,
        total_animals_arrived: classification.arrived.len() as u64,
        total_animals_gone: classification.gone.len() as u64,
        animals_analytics: by_type.into_values().collect(),
    }
}
