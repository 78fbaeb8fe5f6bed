//! Boundary validation against the polygon rules and all other areas.

use chipping_area_models::{Area, AreaDraft};
use chipping_geometry::{build_polygon, relate, validate_polygon};
use geo::Polygon;

use crate::AreaError;

/// Validates a draft's boundary and checks it against every existing area.
///
/// `exclude_id` skips the area being replaced during an update. Touching
/// another area along its boundary is allowed; sharing any interior is
/// not.
///
/// # Errors
///
/// * [`AreaError::Geometry`] if the boundary itself is invalid
/// * [`AreaError::DuplicateShape`] if an area already has the same shape
/// * [`AreaError::ContainsArea`], [`AreaError::InsideArea`], or
///   [`AreaError::Overlaps`] if the interiors overlap
pub fn validate_area(
    draft: &AreaDraft,
    existing: &[Area],
    exclude_id: Option<i64>,
) -> Result<Polygon<f64>, AreaError> {
    let polygon = validate_polygon(&draft.area_points)?;

    for area in existing {
        if Some(area.id) == exclude_id {
            continue;
        }

        let other = build_polygon(&area.area_points);
        let relation = relate(&polygon, &other);

        if relation.equals {
            log::debug!("Area '{}' duplicates the shape of area {}", draft.name, area.id);
            return Err(AreaError::DuplicateShape { area_id: area.id });
        }
        if relation.contains {
            log::debug!("Area '{}' would contain area {}", draft.name, area.id);
            return Err(AreaError::ContainsArea { area_id: area.id });
        }
        if relation.within {
            log::debug!("Area '{}' would lie inside area {}", draft.name, area.id);
            return Err(AreaError::InsideArea { area_id: area.id });
        }
        if relation.overlaps_interior() {
            log::debug!("Area '{}' would overlap area {}", draft.name, area.id);
            return Err(AreaError::Overlaps { area_id: area.id });
        }
    }

    Ok(polygon)
}
