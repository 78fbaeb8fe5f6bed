//! [`AreaStore`] and [`MovementStore`] over a `switchy_database` handle.

use std::sync::Arc;

use async_trait::async_trait;
use chipping_analytics::{AnalyticsError, MovementStore};
use chipping_analytics_models::{AnimalType, ChippedAnimal, DateInterval, VisitedLocation};
use chipping_area::{AreaError, AreaStore};
use chipping_area_models::{Area, AreaDraft};
use chipping_geometry_models::GeoPoint;
use chrono::{DateTime, Utc};
use switchy_database::Database;

use crate::{DbError, queries};

impl From<DbError> for AreaError {
    fn from(e: DbError) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

impl From<DbError> for AnalyticsError {
    fn from(e: DbError) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

/// SQL-backed store shared across request handlers.
#[derive(Clone)]
pub struct SqlStore {
    db: Arc<dyn Database>,
}

impl SqlStore {
    /// Wraps an open database.
    #[must_use]
    pub fn new(db: Box<dyn Database>) -> Self {
        Self { db: Arc::from(db) }
    }

    /// The underlying database handle.
    #[must_use]
    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }
}

impl std::fmt::Debug for SqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl AreaStore for SqlStore {
    async fn find_area(&self, id: i64) -> Result<Option<Area>, AreaError> {
        Ok(queries::get_area(self.db(), id).await?)
    }

    async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, AreaError> {
        Ok(queries::get_area_by_name(self.db(), name).await?)
    }

    async fn list_areas(&self) -> Result<Vec<Area>, AreaError> {
        Ok(queries::list_areas(self.db()).await?)
    }

    async fn insert_area(&self, draft: &AreaDraft) -> Result<Area, AreaError> {
        Ok(queries::insert_area(self.db(), draft).await?)
    }

    async fn replace_area(&self, id: i64, draft: &AreaDraft) -> Result<Area, AreaError> {
        queries::replace_area(self.db(), id, draft)
            .await?
            .ok_or(AreaError::NotFound { id })
    }

    async fn remove_area(&self, id: i64) -> Result<bool, AreaError> {
        Ok(queries::delete_area(self.db(), id).await?)
    }
}

#[async_trait]
impl MovementStore for SqlStore {
    async fn last_visits_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<VisitedLocation>, AnalyticsError> {
        Ok(queries::last_visits_before(self.db(), before).await?)
    }

    async fn visits_between(
        &self,
        interval: &DateInterval,
    ) -> Result<Vec<VisitedLocation>, AnalyticsError> {
        Ok(queries::visits_between(self.db(), interval.start(), interval.end()).await?)
    }

    async fn unvisited_animals_chipped_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<ChippedAnimal>, AnalyticsError> {
        Ok(queries::unvisited_animals_chipped_before(self.db(), before).await?)
    }

    async fn animals_chipped_between(
        &self,
        interval: &DateInterval,
    ) -> Result<Vec<ChippedAnimal>, AnalyticsError> {
        Ok(queries::animals_chipped_between(self.db(), interval.start(), interval.end()).await?)
    }

    async fn location_point(&self, id: i64) -> Result<Option<GeoPoint>, AnalyticsError> {
        Ok(queries::get_location_point(self.db(), id)
            .await?
            .map(|lp| lp.point))
    }

    async fn animal_types(&self, animal_id: i64) -> Result<Vec<AnimalType>, AnalyticsError> {
        Ok(queries::get_animal_types(self.db(), animal_id).await?)
    }
}
