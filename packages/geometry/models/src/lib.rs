#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate value types.
//!
//! A [`GeoPoint`] is the unit every other layer speaks: area boundaries,
//! chipping locations, and visited locations are all stored and compared
//! as latitude/longitude pairs in WGS84 degrees.

use serde::{Deserialize, Serialize};

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A latitude/longitude pair.
///
/// Equality is by coordinate pair. Two points compare equal only if both
/// coordinates are bit-for-bit equal floats, which is what duplicate
/// detection in area boundaries relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub latitude: f64,
    /// Longitude in degrees, `-180..=180`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point without range checks.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a point, rejecting coordinates outside the WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either coordinate is out of
    /// range or not finite.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        let point = Self::new(latitude, longitude);
        point.validate()?;
        Ok(point)
    }

    /// Checks that both coordinates are within their valid ranges.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either coordinate is out of
    /// range or not finite.
    pub fn validate(&self) -> Result<(), InvalidCoordinateError> {
        if !LATITUDE_RANGE.contains(&self.latitude) || !LONGITUDE_RANGE.contains(&self.longitude) {
            return Err(InvalidCoordinateError {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Error returned when a coordinate pair falls outside the WGS84 ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The offending latitude.
    pub latitude: f64,
    /// The offending longitude.
    pub longitude: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): latitude must be within -90..=90 and longitude within -180..=180",
            self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}
