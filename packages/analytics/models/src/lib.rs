#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Movement records and area analytics result types.
//!
//! The input side ([`VisitedLocation`], [`ChippedAnimal`],
//! [`AnimalType`]) mirrors what the storage layer hands back. The output
//! side ([`TypeAnalytics`], [`AreaAnalytics`]) is built fresh for every
//! analytics request and never persisted.

use chipping_geometry_models::GeoPoint;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// A timestamped record of an animal being at a location point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitedLocation {
    /// Primary key of the visit record.
    pub id: i64,
    /// The animal that visited.
    pub animal_id: i64,
    /// The location point visited.
    pub location_point_id: i64,
    /// When the visit happened.
    pub visited_at: DateTime<Utc>,
    /// Coordinates of the location point.
    pub point: GeoPoint,
}

/// An animal's chipping event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChippedAnimal {
    /// The chipped animal.
    pub animal_id: i64,
    /// When it was chipped.
    pub chipped_at: DateTime<Utc>,
    /// Location point where it was chipped.
    pub chipping_location_id: i64,
}

/// An animal type label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalType {
    /// Primary key.
    pub id: i64,
    /// Display label, e.g. `"fox"`.
    pub label: String,
}

/// Errors from building a [`DateInterval`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// A date string matched none of the accepted formats.
    #[error("Invalid date '{value}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// The end is not strictly after the start.
    #[error("End date {end} must be after start date {start}")]
    NotAfter {
        /// Interval start.
        start: DateTime<Utc>,
        /// Interval end.
        end: DateTime<Utc>,
    },
}

/// A closed time interval `[start, end]` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateInterval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::NotAfter`] unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if end <= start {
            return Err(IntervalError::NotAfter { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses an interval from query-string dates.
    ///
    /// A date-only start means the first instant of that day; a date-only
    /// end means the last instant of that day, so both days are included.
    /// The end must be after the start as given, so two equal dates are
    /// rejected even though the widened end would follow the start.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError`] if either date fails to parse or the end
    /// is not after the start.
    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        let start = parse_bound(start, Bound::Start)?;
        let given_end = parse_bound(end, Bound::Start)?;
        if given_end <= start {
            return Err(IntervalError::NotAfter {
                start,
                end: given_end,
            });
        }
        Self::new(start, parse_bound(end, Bound::End)?)
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if `at` falls within `[start, end]`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(value: &str, bound: Bound) -> Result<DateTime<Utc>, IntervalError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }

    let date =
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| IntervalError::InvalidDate {
            value: value.to_string(),
        })?;

    let time = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0),
        Bound::End => date.and_hms_micro_opt(23, 59, 59, 999_999),
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| IntervalError::InvalidDate {
            value: value.to_string(),
        })
}

/// The three classification groups an animal can be counted in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsGroup {
    /// Inside the area at the end of the interval.
    Quantity,
    /// Entered the area during the interval.
    Arrived,
    /// Left the area during the interval.
    Gone,
}

impl AnalyticsGroup {
    /// All groups, in reporting order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Quantity, Self::Arrived, Self::Gone]
    }
}

/// Per-animal-type counts for one area and interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnalytics {
    /// Type label.
    pub animal_type: String,
    /// Type id.
    pub animal_type_id: i64,
    /// Animals of this type inside the area at the end of the interval.
    pub quantity_animals: u64,
    /// Animals of this type that arrived during the interval.
    pub animals_arrived: u64,
    /// Animals of this type that left during the interval.
    pub animals_gone: u64,
}

impl TypeAnalytics {
    /// Creates a zeroed record for a type.
    #[must_use]
    pub fn new(animal_type: &AnimalType) -> Self {
        Self {
            animal_type: animal_type.label.clone(),
            animal_type_id: animal_type.id,
            quantity_animals: 0,
            animals_arrived: 0,
            animals_gone: 0,
        }
    }

    /// Adds one animal to the counter for `group`.
    pub const fn increment(&mut self, group: AnalyticsGroup) {
        match group {
            AnalyticsGroup::Quantity => self.quantity_animals += 1,
            AnalyticsGroup::Arrived => self.animals_arrived += 1,
            AnalyticsGroup::Gone => self.animals_gone += 1,
        }
    }
}

/// Movement analytics for one area over one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaAnalytics {
    /// Distinct animals inside the area at the end of the interval.
    pub total_quantity_animals: u64,
    /// Distinct animals that arrived during the interval.
    pub total_animals_arrived: u64,
    /// Distinct animals that left during the interval.
    pub total_animals_gone: u64,
    /// Breakdown by animal type.
    pub animals_analytics: Vec<TypeAnalytics>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn date_only_bounds_cover_whole_days() {
        let interval = DateInterval::parse("2023-01-01", "2023-01-02").unwrap();
        assert_eq!(
            interval.start(),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(interval.contains(Utc.with_ymd_and_hms(2023, 1, 2, 23, 59, 59).unwrap()));
        assert!(!interval.contains(Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap()));
    }

    #[test]
    fn accepts_datetime_and_rfc3339() {
        let interval = DateInterval::parse("2023-01-01T10:00:00", "2023-01-01T12:00:00Z").unwrap();
        assert_eq!(
            interval.end(),
            Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn same_day_date_only_is_not_after() {
        let err = DateInterval::parse("2023-05-05", "2023-05-05").unwrap_err();
        assert!(matches!(err, IntervalError::NotAfter { start, end } if start == end));

        let next_day = DateInterval::parse("2023-05-05", "2023-05-06").unwrap();
        assert_eq!(
            next_day.end(),
            Utc.with_ymd_and_hms(2023, 5, 6, 23, 59, 59).unwrap()
                + chrono::Duration::microseconds(999_999)
        );
    }

    #[test]
    fn rejects_reversed_equal_and_garbage() {
        assert!(matches!(
            DateInterval::parse("2023-02-01", "2023-01-01"),
            Err(IntervalError::NotAfter { .. })
        ));
        assert!(matches!(
            DateInterval::parse("2023-01-01T00:00:00", "2023-01-01T00:00:00"),
            Err(IntervalError::NotAfter { .. })
        ));
        assert!(matches!(
            DateInterval::parse("yesterday", "2023-01-01"),
            Err(IntervalError::InvalidDate { .. })
        ));
    }

    #[test]
    fn type_analytics_serializes_camel_case() {
        let mut record = TypeAnalytics::new(&AnimalType {
            id: 3,
            label: "fox".to_string(),
        });
        record.increment(AnalyticsGroup::Arrived);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "animalType": "fox",
                "animalTypeId": 3,
                "quantityAnimals": 0,
                "animalsArrived": 1,
                "animalsGone": 0,
            })
        );
    }
}
