#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area geofence types.
//!
//! An [`Area`] is a named polygon. Its boundary is stored as an ordered
//! point list; the closing edge from the last point to the first is
//! implicit.

use chipping_geometry_models::GeoPoint;
use serde::{Deserialize, Serialize};

/// A persisted area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Primary key.
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Ordered boundary points.
    pub area_points: Vec<GeoPoint>,
}

/// The user-supplied part of an area, used for both creation and
/// replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDraft {
    /// Display name.
    pub name: String,
    /// Ordered boundary points.
    pub area_points: Vec<GeoPoint>,
}

impl AreaDraft {
    /// Creates a draft from a name and boundary.
    #[must_use]
    pub fn new(name: impl Into<String>, area_points: Vec<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            area_points,
        }
    }

    /// Attaches an id, producing the persisted form.
    #[must_use]
    pub fn into_area(self, id: i64) -> Area {
        Area {
            id,
            name: self.name,
            area_points: self.area_points,
        }
    }
}
