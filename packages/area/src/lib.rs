#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area geofence validation and lifecycle.
//!
//! Every write goes through the same gate: the boundary must form a valid
//! polygon, and that polygon may share at most boundary with every other
//! stored area. Validation always completes before the [`AreaStore`] is
//! asked to write anything.

pub mod service;
pub mod validate;

use async_trait::async_trait;
use chipping_area_models::{Area, AreaDraft};
use chipping_geometry::GeometryError;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

pub use service::{create_area, delete_area, get_area, update_area};
pub use validate::validate_area;

/// Broad failure category, used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The input is malformed or violates a geometric rule.
    BadRequest,
    /// The input collides with an existing entity.
    Conflict,
    /// The referenced entity does not exist.
    NotFound,
    /// Storage or another collaborator failed.
    Internal,
}

/// Errors from area validation and lifecycle operations.
#[derive(Debug, Error)]
pub enum AreaError {
    /// Ids are positive.
    #[error("Invalid area id: {id}")]
    InvalidId {
        /// The rejected id.
        id: i64,
    },

    /// The area name is empty or whitespace.
    #[error("Area name must not be blank")]
    BlankName,

    /// The boundary does not form a valid polygon.
    #[error("Invalid area boundary: {0}")]
    Geometry(#[from] GeometryError),

    /// Another area already uses this name.
    #[error("An area named '{name}' already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Another area already has exactly this shape.
    #[error("Area {area_id} already has the same shape")]
    DuplicateShape {
        /// The area with the same shape.
        area_id: i64,
    },

    /// The boundary fully encloses another area.
    #[error("Area would contain area {area_id}")]
    ContainsArea {
        /// The enclosed area.
        area_id: i64,
    },

    /// The boundary lies entirely inside another area.
    #[error("Area would lie inside area {area_id}")]
    InsideArea {
        /// The enclosing area.
        area_id: i64,
    },

    /// The interiors of the boundary and another area overlap.
    #[error("Area would overlap area {area_id}")]
    Overlaps {
        /// The overlapped area.
        area_id: i64,
    },

    /// No area has this id.
    #[error("Area {id} not found")]
    NotFound {
        /// The missing id.
        id: i64,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of what went wrong.
        message: String,
    },
}

impl AreaError {
    /// Returns the failure category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. }
            | Self::BlankName
            | Self::Geometry(_)
            | Self::ContainsArea { .. }
            | Self::InsideArea { .. }
            | Self::Overlaps { .. } => ErrorKind::BadRequest,
            Self::DuplicateName { .. } | Self::DuplicateShape { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Internal,
        }
    }
}

/// Persistence operations the area lifecycle needs.
///
/// Implementations write the area row and its ordered point list as one
/// unit; a failed write must leave no partial point list behind.
#[async_trait]
pub trait AreaStore: Send + Sync {
    /// Looks up an area by id.
    async fn find_area(&self, id: i64) -> Result<Option<Area>, AreaError>;

    /// Looks up an area by exact name.
    async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, AreaError>;

    /// Returns every stored area with its boundary.
    async fn list_areas(&self) -> Result<Vec<Area>, AreaError>;

    /// Persists a new area and returns it with its assigned id.
    async fn insert_area(&self, draft: &AreaDraft) -> Result<Area, AreaError>;

    /// Replaces the name and full boundary of an existing area.
    async fn replace_area(&self, id: i64, draft: &AreaDraft) -> Result<Area, AreaError>;

    /// Deletes an area and its boundary. Returns `false` if it did not exist.
    async fn remove_area(&self, id: i64) -> Result<bool, AreaError>;
}
