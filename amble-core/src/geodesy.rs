//! Great-circle helpers shared by the assembler, the POI locator and the
//! data adapters.
//!
//! Coordinates follow the `geo` convention: `x` is longitude and `y` is
//! latitude, both in decimal degrees.

use geo::{Coord, Haversine, Point, algorithm::Distance};

/// Great-circle distance in metres between two coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use amble_core::geodesy::great_circle_m;
///
/// let a = Coord { x: 0.0, y: 0.0 };
/// let b = Coord { x: 0.0, y: 1.0 };
/// let metres = great_circle_m(a, b);
/// assert!((metres - 111_195.0).abs() < 100.0);
/// ```
#[must_use]
pub fn great_circle_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Sum of great-circle distances between consecutive coordinates.
#[must_use]
pub fn polyline_length_m(points: &[Coord<f64>]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some(great_circle_m(*a, *b)),
            _ => None,
        })
        .sum()
}

/// Return `true` when the latitude and longitude are finite and in range.
#[must_use]
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Build a `geo` coordinate from a latitude/longitude pair.
#[must_use]
pub const fn coord(lat: f64, lng: f64) -> Coord<f64> {
    Coord { x: lng, y: lat }
}
