//! Area lifecycle operations.
//!
//! Each operation performs all of its checks before the single store
//! write, so a rejected request never leaves a partial change behind.

use chipping_area_models::{Area, AreaDraft};

use crate::{AreaError, AreaStore, validate_area};

fn check_id(id: i64) -> Result<(), AreaError> {
    if id <= 0 {
        return Err(AreaError::InvalidId { id });
    }
    Ok(())
}

fn check_name(draft: &AreaDraft) -> Result<(), AreaError> {
    if draft.name.trim().is_empty() {
        return Err(AreaError::BlankName);
    }
    Ok(())
}

/// Fetches an area by id.
///
/// # Errors
///
/// * [`AreaError::InvalidId`] if `id` is not positive
/// * [`AreaError::NotFound`] if no area has this id
pub async fn get_area(store: &dyn AreaStore, id: i64) -> Result<Area, AreaError> {
    check_id(id)?;
    store
        .find_area(id)
        .await?
        .ok_or(AreaError::NotFound { id })
}

/// Validates and persists a new area.
///
/// # Errors
///
/// * [`AreaError::DuplicateName`] if the name is taken
/// * any error from [`validate_area`]
/// * [`AreaError::Storage`] if the store fails
pub async fn create_area(store: &dyn AreaStore, draft: &AreaDraft) -> Result<Area, AreaError> {
    check_name(draft)?;

    if store.find_area_by_name(&draft.name).await?.is_some() {
        log::debug!("Rejecting area: name '{}' is taken", draft.name);
        return Err(AreaError::DuplicateName {
            name: draft.name.clone(),
        });
    }

    let existing = store.list_areas().await?;
    validate_area(draft, &existing, None)?;

    let area = store.insert_area(draft).await?;
    log::info!(
        "Created area {} '{}' with {} points",
        area.id,
        area.name,
        area.area_points.len()
    );
    Ok(area)
}

/// Validates and replaces the name and boundary of an existing area.
///
/// The area being updated is excluded from both the name check and the
/// overlap scan.
///
/// # Errors
///
/// * [`AreaError::NotFound`] if no area has this id
/// * [`AreaError::DuplicateName`] if another area uses the name
/// * any error from [`validate_area`]
pub async fn update_area(
    store: &dyn AreaStore,
    id: i64,
    draft: &AreaDraft,
) -> Result<Area, AreaError> {
    check_id(id)?;

    if store.find_area(id).await?.is_none() {
        return Err(AreaError::NotFound { id });
    }

    check_name(draft)?;

    if let Some(named) = store.find_area_by_name(&draft.name).await?
        && named.id != id
    {
        log::debug!(
            "Rejecting update of area {id}: name '{}' belongs to area {}",
            draft.name,
            named.id
        );
        return Err(AreaError::DuplicateName {
            name: draft.name.clone(),
        });
    }

    let existing = store.list_areas().await?;
    validate_area(draft, &existing, Some(id))?;

    let area = store.replace_area(id, draft).await?;
    log::info!("Updated area {id} '{}'", area.name);
    Ok(area)
}

/// Deletes an area and its boundary.
///
/// # Errors
///
/// * [`AreaError::NotFound`] if no area has this id
pub async fn delete_area(store: &dyn AreaStore, id: i64) -> Result<(), AreaError> {
    check_id(id)?;

    if !store.remove_area(id).await? {
        return Err(AreaError::NotFound { id });
    }

    log::info!("Deleted area {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chipping_geometry_models::GeoPoint;

    use super::*;
    use crate::ErrorKind;

    #[derive(Default)]
    struct MemoryStore {
        areas: Mutex<Vec<Area>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl AreaStore for MemoryStore {
        async fn find_area(&self, id: i64) -> Result<Option<Area>, AreaError> {
            Ok(self
                .areas
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, AreaError> {
            Ok(self
                .areas
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.name == name)
                .cloned())
        }

        async fn list_areas(&self) -> Result<Vec<Area>, AreaError> {
            Ok(self.areas.lock().unwrap().clone())
        }

        async fn insert_area(&self, draft: &AreaDraft) -> Result<Area, AreaError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let area = draft.clone().into_area(*next_id);
            self.areas.lock().unwrap().push(area.clone());
            Ok(area)
        }

        async fn replace_area(&self, id: i64, draft: &AreaDraft) -> Result<Area, AreaError> {
            let mut areas = self.areas.lock().unwrap();
            let slot = areas
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(AreaError::NotFound { id })?;
            *slot = draft.clone().into_area(id);
            Ok(slot.clone())
        }

        async fn remove_area(&self, id: i64) -> Result<bool, AreaError> {
            let mut areas = self.areas.lock().unwrap();
            let before = areas.len();
            areas.retain(|a| a.id != id);
            Ok(areas.len() != before)
        }
    }

    fn square(name: &str, lat: f64, lng: f64, size: f64) -> AreaDraft {
        AreaDraft::new(
            name,
            vec![
                GeoPoint::new(lat, lng),
                GeoPoint::new(lat, lng + size),
                GeoPoint::new(lat + size, lng + size),
                GeoPoint::new(lat + size, lng),
            ],
        )
    }

    #[tokio::test]
    async fn create_assigns_id_and_preserves_point_order() {
        let store = MemoryStore::default();
        let draft = square("north", 0.0, 0.0, 10.0);

        let area = create_area(&store, &draft).await.unwrap();
        assert_eq!(area.id, 1);
        assert_eq!(area.area_points, draft.area_points);
        assert_eq!(get_area(&store, 1).await.unwrap(), area);
    }

    #[tokio::test]
    async fn duplicate_name_and_rotated_shape_conflict() {
        let store = MemoryStore::default();
        create_area(&store, &square("north", 0.0, 0.0, 10.0))
            .await
            .unwrap();

        let err = create_area(&store, &square("north", 50.0, 50.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AreaError::DuplicateName { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let mut rotated = square("south", 0.0, 0.0, 10.0);
        rotated.area_points.rotate_left(3);
        let err = create_area(&store, &rotated).await.unwrap_err();
        assert!(matches!(err, AreaError::DuplicateShape { area_id: 1 }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn nested_area_rejected_and_store_untouched() {
        let store = MemoryStore::default();
        create_area(&store, &square("outer", 0.0, 0.0, 10.0))
            .await
            .unwrap();

        let err = create_area(&store, &square("inner", 2.0, 2.0, 3.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(store.list_areas().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn neighbours_sharing_an_edge_succeed() {
        let store = MemoryStore::default();
        create_area(&store, &square("west", 0.0, 0.0, 10.0))
            .await
            .unwrap();
        create_area(&store, &square("east", 0.0, 10.0, 10.0))
            .await
            .unwrap();
        assert_eq!(store.list_areas().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_name_rejected() {
        let store = MemoryStore::default();
        let err = create_area(&store, &square("   ", 0.0, 0.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AreaError::BlankName));
    }

    #[tokio::test]
    async fn update_excludes_itself_from_checks() {
        let store = MemoryStore::default();
        create_area(&store, &square("a", 0.0, 0.0, 10.0))
            .await
            .unwrap();
        create_area(&store, &square("b", 0.0, 10.0, 10.0))
            .await
            .unwrap();

        // Same name, grown shape that only overlaps its own old footprint
        let updated = update_area(&store, 1, &square("a", -5.0, -5.0, 15.0))
            .await
            .unwrap();
        assert_eq!(updated.area_points[0], GeoPoint::new(-5.0, -5.0));

        let err = update_area(&store, 1, &square("b", -5.0, -5.0, 15.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AreaError::DuplicateName { .. }));

        let err = update_area(&store, 1, &square("a", 0.0, 5.0, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AreaError::Overlaps { area_id: 2 }));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_area_not_found() {
        let store = MemoryStore::default();

        let err = update_area(&store, 7, &square("x", 0.0, 0.0, 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = delete_area(&store, 7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = get_area(&store, 0).await.unwrap_err();
        assert!(matches!(err, AreaError::InvalidId { id: 0 }));
    }

    #[tokio::test]
    async fn delete_frees_name_and_shape() {
        let store = MemoryStore::default();
        let draft = square("gone", 0.0, 0.0, 10.0);
        create_area(&store, &draft).await.unwrap();

        delete_area(&store, 1).await.unwrap();
        assert!(store.list_areas().await.unwrap().is_empty());
        assert!(create_area(&store, &draft).await.is_ok());
    }
}
