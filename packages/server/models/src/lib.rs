#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the chipping server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types to allow independent evolution of the API
//! contract. Analytics responses reuse
//! [`chipping_analytics_models::AreaAnalytics`] directly since its shape
//! already is the contract.

use chipping_area_models::{Area, AreaDraft};
use chipping_geometry_models::GeoPoint;
use serde::{Deserialize, Serialize};

pub use chipping_analytics_models::{AreaAnalytics, TypeAnalytics};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A boundary point as sent and returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAreaPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<GeoPoint> for ApiAreaPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

impl From<ApiAreaPoint> for GeoPoint {
    fn from(point: ApiAreaPoint) -> Self {
        Self::new(point.latitude, point.longitude)
    }
}

/// Body of `POST /areas` and `PUT /areas/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRequest {
    /// Area name.
    pub name: String,
    /// Ordered boundary points.
    pub area_points: Vec<ApiAreaPoint>,
}

impl From<AreaRequest> for AreaDraft {
    fn from(request: AreaRequest) -> Self {
        Self::new(
            request.name,
            request.area_points.into_iter().map(GeoPoint::from).collect(),
        )
    }
}

/// An area as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArea {
    /// Area id.
    pub id: i64,
    /// Area name.
    pub name: String,
    /// Ordered boundary points.
    pub area_points: Vec<ApiAreaPoint>,
}

impl From<Area> for ApiArea {
    fn from(area: Area) -> Self {
        Self {
            id: area.id,
            name: area.name,
            area_points: area.area_points.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query parameters for the analytics endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    /// Interval start, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    pub start_date: String,
    /// Interval end, same formats as `start_date`.
    pub end_date: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable failure description.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chipping_analytics_models::{AnimalType, TypeAnalytics};

    use super::*;

    #[test]
    fn area_request_reads_camel_case_points() {
        let request: AreaRequest = serde_json::from_value(serde_json::json!({
            "name": "North field",
            "areaPoints": [
                {"latitude": 1.0, "longitude": 2.0},
                {"latitude": 3.0, "longitude": 4.0},
                {"latitude": 5.0, "longitude": 0.5},
            ],
        }))
        .unwrap();

        let draft = AreaDraft::from(request);
        assert_eq!(draft.name, "North field");
        assert_eq!(draft.area_points[1], GeoPoint::new(3.0, 4.0));
    }

    #[test]
    fn area_request_requires_points() {
        let result: Result<AreaRequest, _> =
            serde_json::from_value(serde_json::json!({ "name": "Empty" }));
        assert!(result.is_err());
    }

    #[test]
    fn api_area_shape() {
        let area = Area {
            id: 7,
            name: "Pond".to_string(),
            area_points: vec![GeoPoint::new(1.5, -2.5)],
        };

        assert_eq!(
            serde_json::to_value(ApiArea::from(area)).unwrap(),
            serde_json::json!({
                "id": 7,
                "name": "Pond",
                "areaPoints": [{"latitude": 1.5, "longitude": -2.5}],
            })
        );
    }

    #[test]
    fn analytics_params_use_camel_case() {
        let params: AnalyticsQueryParams = serde_json::from_value(serde_json::json!({
            "startDate": "2023-01-01",
            "endDate": "2023-01-31",
        }))
        .unwrap();
        assert_eq!(params.start_date, "2023-01-01");
        assert_eq!(params.end_date, "2023-01-31");
    }

    #[test]
    fn analytics_response_shape() {
        let response = AreaAnalytics {
            total_quantity_animals: 2,
            total_animals_arrived: 1,
            total_animals_gone: 0,
            animals_analytics: vec![TypeAnalytics {
                quantity_animals: 2,
                animals_arrived: 1,
                ..TypeAnalytics::new(&AnimalType {
                    id: 4,
                    label: "elk".to_string(),
                })
            }],
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "totalQuantityAnimals": 2,
                "totalAnimalsArrived": 1,
                "totalAnimalsGone": 0,
                "animalsAnalytics": [{
                    "animalType": "elk",
                    "animalTypeId": 4,
                    "quantityAnimals": 2,
                    "animalsArrived": 1,
                    "animalsGone": 0,
                }],
            })
        );
    }

    #[test]
    fn error_body() {
        assert_eq!(
            serde_json::to_value(ApiError::new("nope")).unwrap(),
            serde_json::json!({ "error": "nope" })
        );
    }
}
