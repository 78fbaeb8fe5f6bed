#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Polygon primitives for area geofences.
//!
//! Builds `geo` polygons from ordered [`GeoPoint`] boundaries, rejects
//! degenerate and self-intersecting rings, and answers the two questions
//! the rest of the system asks of a polygon: "is this point inside (or on
//! the edge)?" and "how does this polygon relate to that one?".
//!
//! Coordinates are mapped `x = longitude`, `y = latitude`. All predicates
//! are planar in degree space; areas are small enough that this is what
//! callers expect.

use chipping_geometry_models::{GeoPoint, InvalidCoordinateError};
use geo::{Area, BoundingRect, Coord, Intersects, Line, LineString, Point, Polygon, Relate};
use thiserror::Error;

/// Minimum number of distinct vertices in a polygon ring.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Enclosed area below this fraction of the bounding box area counts as
/// zero. Absorbs floating-point residue from collinear vertices.
const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// Reasons a point list cannot form a valid polygon.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// Fewer than [`MIN_POLYGON_POINTS`] points were given.
    #[error("polygon needs at least {MIN_POLYGON_POINTS} points, got {count}")]
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
    },

    /// A coordinate is out of range.
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// The same point appears more than once in the ring.
    #[error("point {point} appears more than once")]
    DuplicatePoint {
        /// The repeated point.
        point: GeoPoint,
    },

    /// The ring encloses no area (collinear points).
    #[error("polygon encloses zero area")]
    Degenerate,

    /// Two non-adjacent edges of the ring cross or overlap.
    #[error("polygon edges {first} and {second} intersect")]
    SelfIntersecting {
        /// Index of the first edge (edge `i` runs from point `i` to `i + 1`).
        first: usize,
        /// Index of the second edge.
        second: usize,
    },
}

/// Converts a [`GeoPoint`] into a planar coordinate.
#[must_use]
pub const fn to_coord(point: &GeoPoint) -> Coord<f64> {
    Coord {
        x: point.longitude,
        y: point.latitude,
    }
}

/// Builds a closed polygon from an ordered boundary without validating it.
///
/// The closing edge from the last point back to the first is implicit.
#[must_use]
pub fn build_polygon(points: &[GeoPoint]) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(to_coord).collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Builds a polygon and checks every boundary invariant.
///
/// Checks run cheapest first: point count, coordinate ranges, duplicate
/// vertices, zero area, then the pairwise edge scan.
///
/// # Errors
///
/// Returns the first [`GeometryError`] found.
pub fn validate_polygon(points: &[GeoPoint]) -> Result<Polygon<f64>, GeometryError> {
    if points.len() < MIN_POLYGON_POINTS {
        return Err(GeometryError::TooFewPoints {
            count: points.len(),
        });
    }

    for point in points {
        point.validate()?;
    }

    for (i, point) in points.iter().enumerate() {
        if points[i + 1..].contains(point) {
            log::debug!("Rejecting polygon: vertex {i} at {point:?} is repeated");
            return Err(GeometryError::DuplicatePoint { point: *point });
        }
    }

    let polygon = build_polygon(points);

    if is_degenerate(&polygon) {
        log::debug!("Rejecting polygon: {} vertices enclose no area", points.len());
        return Err(GeometryError::Degenerate);
    }

    if let Some((first, second)) = find_self_intersection(points) {
        log::debug!("Rejecting polygon: edges {first} and {second} cross");
        return Err(GeometryError::SelfIntersecting { first, second });
    }

    Ok(polygon)
}

/// Returns `true` if the polygon encloses (numerically) zero area.
#[must_use]
pub fn is_degenerate(polygon: &Polygon<f64>) -> bool {
    let Some(rect) = polygon.bounding_rect() else {
        return true;
    };

    let box_area = rect.width() * rect.height();
    if box_area <= 0.0 {
        return true;
    }

    polygon.unsigned_area() / box_area < DEGENERATE_AREA_RATIO
}

/// Finds the first pair of non-adjacent boundary edges that intersect.
///
/// Edge `i` runs from `points[i]` to `points[(i + 1) % n]`, so the last
/// edge closes the ring. Consecutive edges, and the first/last pair, share
/// a vertex by construction and are skipped.
#[must_use]
pub fn find_self_intersection(points: &[GeoPoint]) -> Option<(usize, usize)> {
    let n = points.len();
    if n < MIN_POLYGON_POINTS {
        return None;
    }

    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| Line::new(to_coord(&points[i]), to_coord(&points[(i + 1) % n])))
        .collect();

    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return Some((i, j));
            }
        }
    }

    None
}

/// Returns `true` if any two non-adjacent edges of the ring intersect.
#[must_use]
pub fn is_self_intersecting(points: &[GeoPoint]) -> bool {
    find_self_intersection(points).is_some()
}

/// Point-in-polygon test with the boundary counted as inside.
#[must_use]
pub fn contains_point(polygon: &Polygon<f64>, point: &GeoPoint) -> bool {
    polygon.intersects(&Point::from(to_coord(point)))
}

/// Topological relationship between two polygons `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PolygonRelation {
    /// Same shape regardless of vertex order or rotation.
    pub equals: bool,
    /// Boundaries meet but interiors do not.
    pub touches: bool,
    /// Any shared point, boundary or interior.
    pub intersects: bool,
    /// All of `b` lies within `a`.
    pub contains: bool,
    /// All of `a` lies within `b`.
    pub within: bool,
}

impl PolygonRelation {
    /// Returns `true` if the interiors share area, i.e. the polygons
    /// intersect in more than just boundary contact.
    #[must_use]
    pub const fn overlaps_interior(&self) -> bool {
        self.intersects && !self.touches
    }
}

/// Computes the relation of `a` to `b` from their DE-9IM matrix.
#[must_use]
pub fn relate(a: &Polygon<f64>, b: &Polygon<f64>) -> PolygonRelation {
    let matrix = a.relate(b);

    PolygonRelation {
        equals: matrix.is_equal_topo(),
        touches: matrix.is_touches(),
        intersects: matrix.is_intersects(),
        contains: matrix.is_contains(),
        within: matrix.is_within(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords
            .iter()
            .map(|&(lat, lng)| GeoPoint::new(lat, lng))
            .collect()
    }

    fn square(lat: f64, lng: f64, size: f64) -> Vec<GeoPoint> {
        pts(&[
            (lat, lng),
            (lat, lng + size),
            (lat + size, lng + size),
            (lat + size, lng),
        ])
    }

    #[test]
    fn point_in_polygon_inside_outside_and_edge() {
        let polygon = build_polygon(&square(0.0, 0.0, 10.0));

        assert!(contains_point(&polygon, &GeoPoint::new(5.0, 5.0)));
        assert!(!contains_point(&polygon, &GeoPoint::new(15.0, 5.0)));
        assert!(!contains_point(&polygon, &GeoPoint::new(-0.1, 5.0)));
        assert!(contains_point(&polygon, &GeoPoint::new(0.0, 5.0)));
        assert!(contains_point(&polygon, &GeoPoint::new(10.0, 10.0)));
    }

    #[test]
    fn point_in_concave_polygon_notch_is_outside() {
        // U shape opening towards positive latitude
        let polygon = build_polygon(&pts(&[
            (0.0, 0.0),
            (0.0, 9.0),
            (9.0, 9.0),
            (9.0, 6.0),
            (3.0, 6.0),
            (3.0, 3.0),
            (9.0, 3.0),
            (9.0, 0.0),
        ]));

        assert!(contains_point(&polygon, &GeoPoint::new(1.0, 4.5)));
        assert!(!contains_point(&polygon, &GeoPoint::new(6.0, 4.5)));
        assert!(contains_point(&polygon, &GeoPoint::new(6.0, 1.5)));
    }

    #[test]
    fn accepts_convex_and_concave_rings() {
        assert!(validate_polygon(&square(0.0, 0.0, 1.0)).is_ok());
        assert!(
            validate_polygon(&pts(&[
                (0.0, 0.0),
                (0.0, 4.0),
                (2.0, 2.0),
                (4.0, 4.0),
                (4.0, 0.0),
            ]))
            .is_ok()
        );
    }

    #[test]
    fn detects_bowtie() {
        // Square with its last two points swapped
        let bowtie = pts(&[(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0)]);
        assert_eq!(find_self_intersection(&bowtie), Some((1, 3)));
        assert!(!is_self_intersecting(&square(0.0, 0.0, 10.0)));
    }

    #[test]
    fn asymmetric_bowtie_fails_on_intersection_not_area() {
        let bowtie = pts(&[(0.0, 0.0), (0.0, 10.0), (4.0, 0.0), (4.0, 10.0)]);
        assert!(matches!(
            validate_polygon(&bowtie),
            Err(GeometryError::Degenerate | GeometryError::SelfIntersecting { .. })
        ));

        let skewed = pts(&[(0.0, 0.0), (0.0, 10.0), (6.0, 2.0), (2.0, 12.0)]);
        assert!(matches!(
            validate_polygon(&skewed),
            Err(GeometryError::SelfIntersecting { .. })
        ));
    }

    #[test]
    fn triangle_has_no_non_adjacent_edges() {
        let triangle = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]);
        assert_eq!(find_self_intersection(&triangle), None);
    }

    #[test]
    fn rejects_collinear_points() {
        let line = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(validate_polygon(&line), Err(GeometryError::Degenerate));

        let flat = pts(&[(0.0, 0.0), (0.0, 1.0), (0.0, 3.0)]);
        assert_eq!(validate_polygon(&flat), Err(GeometryError::Degenerate));
    }

    #[test]
    fn rejects_duplicates_and_short_rings() {
        let dup = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(
            validate_polygon(&dup),
            Err(GeometryError::DuplicatePoint {
                point: GeoPoint::new(0.0, 1.0)
            })
        );

        assert_eq!(
            validate_polygon(&pts(&[(0.0, 0.0), (1.0, 1.0)])),
            Err(GeometryError::TooFewPoints { count: 2 })
        );
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let bad = pts(&[(0.0, 0.0), (0.0, 1.0), (91.0, 1.0)]);
        assert!(matches!(
            validate_polygon(&bad),
            Err(GeometryError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn equality_ignores_rotation_and_direction() {
        let a = square(0.0, 0.0, 10.0);
        let mut rotated = a.clone();
        rotated.rotate_left(2);
        let mut reversed = a.clone();
        reversed.reverse();

        let pa = build_polygon(&a);
        assert!(relate(&pa, &build_polygon(&rotated)).equals);
        assert!(relate(&pa, &build_polygon(&reversed)).equals);
    }

    #[test]
    fn shared_edge_touches_without_overlap() {
        let a = build_polygon(&square(0.0, 0.0, 10.0));
        let b = build_polygon(&square(0.0, 10.0, 10.0));

        let relation = relate(&a, &b);
        assert!(relation.touches);
        assert!(relation.intersects);
        assert!(!relation.overlaps_interior());
        assert!(!relation.contains);
        assert!(!relation.equals);
    }

    #[test]
    fn containment_and_partial_overlap() {
        let outer = build_polygon(&square(0.0, 0.0, 10.0));
        let inner = build_polygon(&square(2.0, 2.0, 2.0));
        let partial = build_polygon(&square(5.0, 5.0, 10.0));

        let r = relate(&outer, &inner);
        assert!(r.contains);
        assert!(!r.within);
        assert!(r.overlaps_interior());
        assert!(relate(&inner, &outer).within);

        let r = relate(&outer, &partial);
        assert!(r.overlaps_interior());
        assert!(!r.contains);
        assert!(!r.within);
    }

    #[test]
    fn disjoint_polygons_do_not_intersect() {
        let a = build_polygon(&square(0.0, 0.0, 1.0));
        let b = build_polygon(&square(5.0, 5.0, 1.0));
        let r = relate(&a, &b);
        assert!(!r.intersects);
        assert!(!r.touches);
    }
}
