#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Movement analytics for area geofences.
//!
//! [`analyze_area`] answers "which animals were in this area, which came,
//! and which left" for a date interval. It pulls materialized records
//! from a [`MovementStore`], replays them through a
//! [`movement::MovementClassifier`], and folds the result into per-type
//! counts with [`aggregate::aggregate`].

pub mod aggregate;
pub mod movement;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chipping_analytics_models::{
    AnimalType, AreaAnalytics, ChippedAnimal, DateInterval, VisitedLocation,
};
use chipping_area::ErrorKind;
use chipping_area_models::Area;
use chipping_geometry::build_polygon;
use chipping_geometry_models::GeoPoint;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::movement::{Classification, MovementClassifier};

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of what went wrong.
        message: String,
    },

    /// A chipping event references a location point that does not exist.
    #[error("Location point {id} not found")]
    MissingLocationPoint {
        /// The dangling location point id.
        id: i64,
    },
}

impl AnalyticsError {
    /// Returns the failure category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage { .. } | Self::MissingLocationPoint { .. } => ErrorKind::Internal,
        }
    }
}

/// Read-only record access the classifier and aggregator need.
///
/// Every method returns a fully materialized collection.
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// The single latest visit of each animal strictly before `before`.
    async fn last_visits_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<VisitedLocation>, AnalyticsError>;

    /// Every visit within the interval, ascending by timestamp across all
    /// animals.
    async fn visits_between(
        &self,
        interval: &DateInterval,
    ) -> Result<Vec<VisitedLocation>, AnalyticsError>;

    /// Animals with no visits at all, chipped strictly before `before`.
    async fn unvisited_animals_chipped_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<ChippedAnimal>, AnalyticsError>;

    /// Animals chipped within the interval.
    async fn animals_chipped_between(
        &self,
        interval: &DateInterval,
    ) -> Result<Vec<ChippedAnimal>, AnalyticsError>;

    /// Coordinates of a location point.
    async fn location_point(&self, id: i64) -> Result<Option<GeoPoint>, AnalyticsError>;

    /// Types assigned to an animal.
    async fn animal_types(&self, animal_id: i64) -> Result<Vec<AnimalType>, AnalyticsError>;
}

/// Computes movement analytics for one area over one interval.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store fails or a chipping location
/// is missing.
pub async fn analyze_area(
    store: &dyn MovementStore,
    area: &Area,
    interval: &DateInterval,
) -> Result<AreaAnalytics, AnalyticsError> {
    let polygon = build_polygon(&area.area_points);
    let mut classifier = MovementClassifier::new(&polygon);

    let prior = store.last_visits_before(interval.start()).await?;
    classifier.record_prior_visits(&prior);

    let mut chipped = store
        .unvisited_animals_chipped_before(interval.start())
        .await?;
    chipped.extend(store.animals_chipped_between(interval).await?);
    let chipping_points = resolve_chipping_points(store, &chipped).await?;
    classifier.record_chipping(&chipping_points);

    let visits = store.visits_between(interval).await?;
    classifier.record_interval_visits(&visits);

    let classification = classifier.finish();
    let types = load_animal_types(store, &classification).await?;

    let analytics = aggregate::aggregate(&classification, &types);
    log::debug!(
        "Area {} analytics {} to {}: {} present, {} arrived, {} gone across {} types",
        area.id,
        interval.start(),
        interval.end(),
        analytics.total_quantity_animals,
        analytics.total_animals_arrived,
        analytics.total_animals_gone,
        analytics.animals_analytics.len()
    );

    Ok(analytics)
}

/// Looks up each distinct chipping location once.
async fn resolve_chipping_points(
    store: &dyn MovementStore,
    chipped: &[ChippedAnimal],
) -> Result<Vec<(i64, GeoPoint)>, AnalyticsError> {
    let mut cache: BTreeMap<i64, GeoPoint> = BTreeMap::new();
    let mut points = Vec::with_capacity(chipped.len());

    for animal in chipped {
        let id = animal.chipping_location_id;
        let point = if let Some(point) = cache.get(&id) {
            *point
        } else {
            let point = store
                .location_point(id)
                .await?
                .ok_or(AnalyticsError::MissingLocationPoint { id })?;
            cache.insert(id, point);
            point
        };
        points.push((animal.animal_id, point));
    }

    Ok(points)
}

async fn load_animal_types(
    store: &dyn MovementStore,
    classification: &Classification,
) -> Result<BTreeMap<i64, Vec<AnimalType>>, AnalyticsError> {
    let mut types = BTreeMap::new();
    for animal_id in classification.all_ids() {
        types.insert(animal_id, store.animal_types(animal_id).await?);
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use chipping_area_models::AreaDraft;
    use chrono::TimeZone as _;

    use super::*;

    const X: i64 = 1;
    const Y: i64 = 2;
    const Z: i64 = 3;
    const W: i64 = 4;

    const INSIDE_POINT: i64 = 100;
    const OUTSIDE_POINT: i64 = 200;

    struct FakeStore {
        points: BTreeMap<i64, GeoPoint>,
        visits: Vec<VisitedLocation>,
        animals: Vec<ChippedAnimal>,
        types: BTreeMap<i64, Vec<AnimalType>>,
    }

    impl FakeStore {
        fn visit(
            &self,
            id: i64,
            animal_id: i64,
            point_id: i64,
            at: DateTime<Utc>,
        ) -> VisitedLocation {
            VisitedLocation {
                id,
                animal_id,
                location_point_id: point_id,
                visited_at: at,
                point: self.points[&point_id],
            }
        }
    }

    #[async_trait]
    impl MovementStore for FakeStore {
        async fn last_visits_before(
            &self,
            before: DateTime<Utc>,
        ) -> Result<Vec<VisitedLocation>, AnalyticsError> {
            let mut latest: BTreeMap<i64, &VisitedLocation> = BTreeMap::new();
            for visit in self.visits.iter().filter(|v| v.visited_at < before) {
                latest
                    .entry(visit.animal_id)
                    .and_modify(|v| {
                        if visit.visited_at > v.visited_at {
                            *v = visit;
                        }
                    })
                    .or_insert(visit);
            }
            Ok(latest.into_values().cloned().collect())
        }

        async fn visits_between(
            &self,
            interval: &DateInterval,
        ) -> Result<Vec<VisitedLocation>, AnalyticsError> {
            let mut visits: Vec<VisitedLocation> = self
                .visits
                .iter()
                .filter(|v| interval.contains(v.visited_at))
                .cloned()
                .collect();
            visits.sort_by_key(|v| v.visited_at);
            Ok(visits)
        }

        async fn unvisited_animals_chipped_before(
            &self,
            before: DateTime<Utc>,
        ) -> Result<Vec<ChippedAnimal>, AnalyticsError> {
            Ok(self
                .animals
                .iter()
                .filter(|a| a.chipped_at < before)
                .filter(|a| !self.visits.iter().any(|v| v.animal_id == a.animal_id))
                .cloned()
                .collect())
        }

        async fn animals_chipped_between(
            &self,
            interval: &DateInterval,
        ) -> Result<Vec<ChippedAnimal>, AnalyticsError> {
            Ok(self
                .animals
                .iter()
                .filter(|a| interval.contains(a.chipped_at))
                .cloned()
                .collect())
        }

        async fn location_point(&self, id: i64) -> Result<Option<GeoPoint>, AnalyticsError> {
            Ok(self.points.get(&id).copied())
        }

        async fn animal_types(&self, animal_id: i64) -> Result<Vec<AnimalType>, AnalyticsError> {
            Ok(self.types.get(&animal_id).cloned().unwrap_or_default())
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, d, 12, 0, 0).unwrap()
    }

    fn chipped(animal_id: i64, at: DateTime<Utc>, point: i64) -> ChippedAnimal {
        ChippedAnimal {
            animal_id,
            chipped_at: at,
            chipping_location_id: point,
        }
    }

    fn square_area() -> Area {
        AreaDraft::new(
            "square",
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
        )
        .into_area(1)
    }

    fn mammal() -> AnimalType {
        AnimalType {
            id: 1,
            label: "mammal".to_string(),
        }
    }

    fn bird() -> AnimalType {
        AnimalType {
            id: 2,
            label: "bird".to_string(),
        }
    }

    fn scenario() -> FakeStore {
        let mut store = FakeStore {
            points: BTreeMap::from([
                (INSIDE_POINT, GeoPoint::new(5.0, 5.0)),
                (OUTSIDE_POINT, GeoPoint::new(20.0, 20.0)),
            ]),
            visits: Vec::new(),
            animals: vec![
                chipped(X, day(1), OUTSIDE_POINT),
                chipped(Y, day(1), INSIDE_POINT),
                chipped(Z, day(1), OUTSIDE_POINT),
                chipped(W, day(1), OUTSIDE_POINT),
            ],
            types: BTreeMap::from([
                (X, vec![mammal()]),
                (Y, vec![mammal(), bird()]),
                (Z, vec![bird()]),
                (W, vec![mammal()]),
            ]),
        };

        store.visits = vec![
            store.visit(1, X, INSIDE_POINT, day(3)),
            store.visit(2, W, INSIDE_POINT, day(4)),
            store.visit(3, Z, INSIDE_POINT, day(12)),
            store.visit(4, W, OUTSIDE_POINT, day(15)),
        ];
        store
    }

    fn interval() -> DateInterval {
        DateInterval::new(day(10), day(20)).unwrap()
    }

    #[tokio::test]
    async fn classifies_present_arrived_and_gone() {
        let store = scenario();
        let analytics = analyze_area(&store, &square_area(), &interval())
            .await
            .unwrap();

        // X and Y stay, Z arrives and stays, W leaves
        assert_eq!(analytics.total_quantity_animals, 3);
        assert_eq!(analytics.total_animals_arrived, 1);
        assert_eq!(analytics.total_animals_gone, 1);

        let mammals = analytics
            .animals_analytics
            .iter()
            .find(|t| t.animal_type_id == 1)
            .unwrap();
        assert_eq!(
            (
                mammals.quantity_animals,
                mammals.animals_arrived,
                mammals.animals_gone
            ),
            (2, 0, 1)
        );

        let birds = analytics
            .animals_analytics
            .iter()
            .find(|t| t.animal_type_id == 2)
            .unwrap();
        assert_eq!(
            (birds.quantity_animals, birds.animals_arrived, birds.animals_gone),
            (2, 1, 0)
        );
    }

    #[tokio::test]
    async fn chipped_inside_during_interval_counts_as_present() {
        let mut store = scenario();
        store.animals.push(chipped(5, day(11), INSIDE_POINT));

        let analytics = analyze_area(&store, &square_area(), &interval())
            .await
            .unwrap();
        assert_eq!(analytics.total_quantity_animals, 4);
        assert_eq!(analytics.total_animals_arrived, 1);
    }

    #[tokio::test]
    async fn repeated_queries_are_identical() {
        let store = scenario();
        let first = analyze_area(&store, &square_area(), &interval())
            .await
            .unwrap();
        let second = analyze_area(&store, &square_area(), &interval())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_chipping_location_is_an_error() {
        let mut store = scenario();
        store.animals.push(chipped(6, day(11), 999));

        let err = analyze_area(&store, &square_area(), &interval())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingLocationPoint { id: 999 }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
