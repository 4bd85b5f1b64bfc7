//! # Geographic Utilities
//!
//! Distance and bounding-box helpers for danger path geometry.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points |
//! | [`polyline_length`] | Total length of a path in meters |
//! | [`compute_bounds`] | Bounding box of a path |
//! | [`expand_bounds`] | Grow a bounding box by a distance in meters |
//! | [`tolerance_to_degrees`] | Conservative degree buffer for a distance in meters |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances use the haversine formula on a sphere of radius 6,371,000 m.
//! `geo`'s own `Haversine` uses the IUGG mean radius (6,371,008.8 m), which
//! shifts results by a few millimetres per kilometre; overlap decisions at
//! the tolerance boundary depend on the exact radius, so the formula is
//! spelled out here.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{BoundingRect, Coord, LineString};

use crate::{Bounds, GeoPoint};

/// Sphere radius used for all distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two points using the Haversine formula.
///
/// Returns the distance in meters. Pure and symmetric; `haversine_distance(p, p)` is 0.
///
/// # Example
///
/// ```rust
/// use danger_paths::{GeoPoint, geo_utils};
///
/// let a = GeoPoint::new(35.854, 128.486);
/// let b = GeoPoint::new(35.863, 128.486);
///
/// let distance = geo_utils::haversine_distance(&a, &b);
/// assert!((distance - 1000.75).abs() < 1.0); // 0.009 degrees of latitude
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Calculate the total length of a path in meters.
///
/// Empty or single-point paths return 0.0.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert a distance in meters to a degree buffer that is safe at `max_abs_lat`.
///
/// Two points whose latitudes or longitudes differ by more than the returned
/// value are guaranteed to be more than `meters` apart (for paths that do not
/// cross the antimeridian). The buffer errs large: one degree of latitude is
/// taken as 111,195 m, longitude degrees shrink with `cos(lat)`, and the result
/// is doubled to cover the chord/arc gap for wide longitude spans. Within a
/// degree of the poles the whole globe is returned.
#[inline]
pub fn tolerance_to_degrees(meters: f64, max_abs_lat: f64) -> f64 {
    let meters_per_degree = EARTH_RADIUS_METERS.to_radians();
    let cos_lat = max_abs_lat.min(90.0).to_radians().cos();
    if cos_lat < 0.01 {
        return 360.0;
    }
    2.0 * meters / (meters_per_degree * cos_lat)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Convert a path to a `geo` line string (x = longitude, y = latitude).
pub fn to_line_string(points: &[GeoPoint]) -> LineString<f64> {
    points
        .iter()
        .map(|p| Coord { x: p.longitude, y: p.latitude })
        .collect()
}

/// Compute the bounding box of a path.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use danger_paths::{GeoPoint, geo_utils};
///
/// let path = vec![
///     GeoPoint::new(35.850, 128.480),
///     GeoPoint::new(35.860, 128.490),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&path).unwrap();
/// assert_eq!(bounds.min_lat, 35.850);
/// assert_eq!(bounds.max_lng, 128.490);
/// ```
pub fn compute_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    let rect = to_line_string(points).bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Expand a bounding box by a distance in meters.
pub fn expand_bounds(bounds: &Bounds, meters: f64) -> Bounds {
    let buffer = tolerance_to_degrees(meters, bounds.max_abs_lat());
    Bounds {
        min_lat: bounds.min_lat - buffer,
        max_lat: bounds.max_lat + buffer,
        min_lng: bounds.min_lng - buffer,
        max_lng: bounds.max_lng + buffer,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GeoPoint::new(35.854, 128.486);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let a = GeoPoint::new(35.854, 128.486);
        let b = GeoPoint::new(35.871, 128.601);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_haversine_one_kilometre_of_latitude() {
        // 0.009 degrees on a 6,371 km sphere is ~1000.75 m
        let a = GeoPoint::new(35.854, 128.486);
        let b = GeoPoint::new(35.863, 128.486);
        assert!(approx_eq(haversine_distance(&a, &b), 1000.75, 1.0));
    }

    #[test]
    fn test_polyline_length_short_inputs() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GeoPoint::new(35.854, 128.486)]), 0.0);
    }

    #[test]
    fn test_polyline_length_sums_segments() {
        let path = vec![
            GeoPoint::new(35.854, 128.486),
            GeoPoint::new(35.863, 128.486),
            GeoPoint::new(35.872, 128.486),
        ];
        assert!(approx_eq(polyline_length(&path), 2001.5, 2.0));
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_tolerance_buffer_is_conservative() {
        // 30 m east at 35.85N must fit inside the buffer
        let lat = 35.85;
        let buffer = tolerance_to_degrees(30.0, lat);
        let a = GeoPoint::new(lat, 128.486);
        let b = GeoPoint::new(lat, 128.486 + buffer);
        assert!(haversine_distance(&a, &b) > 30.0);
    }

    #[test]
    fn test_expand_bounds_covers_tolerance() {
        let b = Bounds { min_lat: 35.850, max_lat: 35.851, min_lng: 128.480, max_lng: 128.481 };
        let grown = expand_bounds(&b, 30.0);
        let corner = GeoPoint::new(b.max_lat, b.max_lng);

        // A point just outside the grown box is more than 30 m away
        let east = GeoPoint::new(b.max_lat, grown.max_lng);
        let north = GeoPoint::new(grown.max_lat, b.max_lng);
        assert!(haversine_distance(&corner, &east) > 30.0);
        assert!(haversine_distance(&corner, &north) > 30.0);
        assert!(grown.min_lng < b.min_lng && grown.min_lat < b.min_lat);
    }
}
