//! Points of interest near a route.
//!
//! Candidates arrive from a [`PoiProvider`](crate::PoiProvider) with raw
//! OpenStreetMap-style tags. [`locate_pois`] keeps those close to the route
//! and classifies them.
//!
//! Distance to the route is the great-circle distance to the nearest path
//! *vertex*, not to the nearest point on a segment. On long straight
//! segments this overestimates the true distance.

use std::collections::BTreeMap;
use std::fmt;

use geo::{Coord, Rect};
use thiserror::Error;

use crate::geodesy::{great_circle_m, is_valid_coordinate};
use crate::route::RoutePath;

/// Default search radius in metres.
pub const DEFAULT_POI_RADIUS_M: f64 = 200.0;
/// Default maximum number of POIs returned.
pub const DEFAULT_MAX_POIS: usize = 20;
/// Name reported for candidates without a `name` tag.
pub const UNNAMED_POI: &str = "Unnamed POI";

const METRES_PER_DEGREE_LAT: f64 = 111_320.0;
const MIN_PATH_POINTS: usize = 2;
const FOOD_AMENITIES: &[&str] = &["cafe", "restaurant", "food_court", "ice_cream"];

/// A raw candidate point supplied by a POI provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCandidate {
    /// Provider identifier.
    pub id: u64,
    /// Position; `x` is longitude and `y` is latitude.
    pub location: Coord<f64>,
    /// Raw tags.
    pub tags: BTreeMap<String, String>,
}

impl PoiCandidate {
    /// Construct a candidate from `(key, value)` tag pairs.
    pub fn new<I, K, V>(id: u64, location: Coord<f64>, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id,
            location,
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The `name` tag, or [`UNNAMED_POI`].
    #[must_use]
    pub fn name(&self) -> &str {
        self.tags.get("name").map_or(UNNAMED_POI, String::as_str)
    }

    /// Classify the candidate by tag precedence.
    #[must_use]
    pub fn category(&self) -> PoiCategory {
        PoiCategory::from_tags(&self.tags)
    }
}

/// Category assigned from a fixed tag precedence.
///
/// Precedence: `amenity` (food amenities map to [`Food`](Self::Food), others
/// keep their value), then `leisure`, then `tourism`, then `shop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoiCategory {
    /// Cafés, restaurants, food courts and ice-cream parlours.
    Food,
    /// Any other amenity, named by its tag value.
    Amenity(String),
    /// Leisure facilities.
    Leisure,
    /// Tourist attractions.
    Attraction,
    /// Shops.
    Shop,
    /// Anything else.
    Other,
}

impl PoiCategory {
    /// Classify a tag map.
    ///
    /// # Examples
    /// ```
    /// use std::collections::BTreeMap;
    /// use amble_core::PoiCategory;
    ///
    /// let mut tags = BTreeMap::new();
    /// tags.insert("amenity".to_owned(), "cafe".to_owned());
    /// tags.insert("leisure".to_owned(), "park".to_owned());
    /// assert_eq!(PoiCategory::from_tags(&tags), PoiCategory::Food);
    /// ```
    #[must_use]
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Self {
        if let Some(amenity) = tags.get("amenity") {
            if FOOD_AMENITIES.contains(&amenity.as_str()) {
                return Self::Food;
            }
            return Self::Amenity(amenity.clone());
        }
        if tags.contains_key("leisure") {
            Self::Leisure
        } else if tags.contains_key("tourism") {
            Self::Attraction
        } else if tags.contains_key("shop") {
            Self::Shop
        } else {
            Self::Other
        }
    }

    /// Category label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Food => "food",
            Self::Amenity(value) => value,
            Self::Leisure => "leisure",
            Self::Attraction => "attraction",
            Self::Shop => "shop",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PoiCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A point of interest close to the route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Poi {
    /// Provider identifier.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Category label.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub category: PoiCategory,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Distance to the nearest route vertex in metres.
    pub distance: f64,
}

/// A candidate was dropped because its data was malformed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("POI candidate {id} skipped: {reason}")]
pub struct PoiSkipped {
    /// Candidate identifier.
    pub id: u64,
    /// Why it was dropped.
    pub reason: String,
}

/// Search parameters for [`locate_pois`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiSearch {
    /// Maximum distance from the route in metres.
    pub radius_m: f64,
    /// Maximum number of results.
    pub max_results: usize,
}

impl Default for PoiSearch {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_POI_RADIUS_M,
            max_results: DEFAULT_MAX_POIS,
        }
    }
}

/// Rejected [`PoiSearch`] parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PoiSearchError {
    /// The radius was not a positive, finite number of metres.
    #[error("POI search radius must be positive and finite, got {radius_m}")]
    InvalidRadius {
        /// Radius supplied.
        radius_m: f64,
    },
    /// The result cap was zero.
    #[error("POI result cap must be at least 1")]
    ZeroMaxResults,
}

impl PoiSearch {
    /// Build validated search parameters.
    ///
    /// # Errors
    /// Returns [`PoiSearchError`] for a radius that is not positive and
    /// finite, or a zero result cap.
    ///
    /// # Examples
    /// ```
    /// use amble_core::{PoiSearch, PoiSearchError};
    ///
    /// assert!(PoiSearch::new(150.0, 5).is_ok());
    /// assert!(matches!(
    ///     PoiSearch::new(f64::NAN, 5),
    ///     Err(PoiSearchError::InvalidRadius { .. })
    /// ));
    /// assert_eq!(PoiSearch::new(150.0, 0), Err(PoiSearchError::ZeroMaxResults));
    /// ```
    pub fn new(radius_m: f64, max_results: usize) -> Result<Self, PoiSearchError> {
        let search = Self {
            radius_m,
            max_results,
        };
        search.validate()?;
        Ok(search)
    }

    /// Check parameters built with a struct literal.
    ///
    /// # Errors
    /// See [`PoiSearch::new`].
    pub fn validate(&self) -> Result<(), PoiSearchError> {
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(PoiSearchError::InvalidRadius {
                radius_m: self.radius_m,
            });
        }
        if self.max_results == 0 {
            return Err(PoiSearchError::ZeroMaxResults);
        }
        Ok(())
    }
}

/// POIs found near a route plus the candidates that were dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoiReport {
    /// Nearby POIs, nearest first.
    pub pois: Vec<Poi>,
    /// Malformed candidates.
    pub skipped: Vec<PoiSkipped>,
}

/// Keep candidates within `search.radius_m` of `path`, nearest first.
///
/// Equal distances are ordered by candidate id. A path with fewer than two
/// points, an empty candidate set or an unusable `search` yields an empty
/// report. Candidates with invalid coordinates are recorded in
/// [`PoiReport::skipped`].
pub fn locate_pois<I>(path: &RoutePath, candidates: I, search: &PoiSearch) -> PoiReport
where
    I: IntoIterator<Item = PoiCandidate>,
{
    let mut report = PoiReport::default();
    if path.len() < MIN_PATH_POINTS {
        return report;
    }
    if let Err(err) = search.validate() {
        log::warn!("skipping POI search: {err}");
        return report;
    }
    for candidate in candidates {
        let Coord { x: lng, y: lat } = candidate.location;
        if !is_valid_coordinate(lat, lng) {
            let skipped = PoiSkipped {
                id: candidate.id,
                reason: format!("invalid coordinates ({lat}, {lng})"),
            };
            log::debug!("{skipped}");
            report.skipped.push(skipped);
            continue;
        }
        let distance = path
            .points()
            .iter()
            .map(|point| great_circle_m(candidate.location, *point))
            .fold(f64::INFINITY, f64::min);
        let within = distance <= search.radius_m;
        if !within {
            continue;
        }
        report.pois.push(Poi {
            id: candidate.id,
            name: candidate.name().to_owned(),
            category: candidate.category(),
            lat,
            lng,
            distance,
        });
    }
    report
        .pois
        .sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    report.pois.truncate(search.max_results);
    log::debug!(
        "found {} POIs near route ({} skipped)",
        report.pois.len(),
        report.skipped.len()
    );
    report
}

/// Bounding box of `path` padded by `radius_m` on every side.
///
/// Returns `None` for an empty path.
#[must_use]
pub fn search_region(path: &RoutePath, radius_m: f64) -> Option<Rect<f64>> {
    let first = path.points().first()?;
    let (mut min, mut max) = (*first, *first);
    for point in path.points() {
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }
    let pad = radius_m.max(0.0);
    let dlat = pad / METRES_PER_DEGREE_LAT;
    let widest = min.y.abs().max(max.y.abs()).min(89.0);
    let dlng = pad / (METRES_PER_DEGREE_LAT * widest.to_radians().cos());
    Some(Rect::new(
        Coord {
            x: (min.x - dlng).max(-180.0),
            y: (min.y - dlat).max(-90.0),
        },
        Coord {
            x: (max.x + dlng).min(180.0),
            y: (max.y + dlat).min(90.0),
        },
    ))
}
