//! Tag catalogues and the highway noise table.
//!
//! A catalogue maps an OpenStreetMap key to the values that signal a
//! preference. The same catalogues drive edge discounts and the POI
//! provider's tag filter.

use std::collections::BTreeMap;

use crate::weights::Preference;

/// Noise factor for highway classes that are not listed.
pub const DEFAULT_NOISE: f64 = 1.0;

const NOISE_TABLE: &[(&str, f64)] = &[
    ("motorway", 2.0),
    ("trunk", 1.8),
    ("primary", 1.5),
    ("secondary", 1.3),
    ("tertiary", 1.2),
    ("residential", 1.0),
    ("service", 0.8),
    ("footway", 0.5),
    ("path", 0.4),
    ("pedestrian", 0.3),
];

/// Relative traffic noise of a highway classification.
///
/// # Examples
/// ```
/// use amble_core::catalogue::noise_factor;
///
/// assert_eq!(noise_factor(Some("primary")), 1.5);
/// assert_eq!(noise_factor(Some("bridleway")), 1.0);
/// assert_eq!(noise_factor(None), 1.0);
/// ```
#[must_use]
pub fn noise_factor(highway: Option<&str>) -> f64 {
    highway
        .and_then(|class| {
            NOISE_TABLE
                .iter()
                .find(|(name, _)| *name == class)
                .map(|(_, factor)| *factor)
        })
        .unwrap_or(DEFAULT_NOISE)
}

/// Key to accepted values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagCatalogue {
    entries: BTreeMap<String, Vec<String>>,
}

impl TagCatalogue {
    /// Build a catalogue from `(key, values)` pairs.
    pub fn from_entries<'a, I, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: IntoIterator<Item = &'a str>,
    {
        let mut catalogue = Self::default();
        for (key, values) in entries {
            catalogue
                .entries
                .entry(key.to_owned())
                .or_default()
                .extend(values.into_iter().map(str::to_owned));
        }
        catalogue
    }

    /// Parks, woodland and similar land use.
    #[must_use]
    pub fn green() -> Self {
        Self::from_entries([
            (
                "landuse",
                vec!["forest", "meadow", "grass", "recreation_ground", "vineyard"],
            ),
            ("leisure", vec!["park", "garden", "golf_course", "playground"]),
            ("natural", vec!["wood", "tree", "tree_row", "scrub", "heath"]),
            ("tourism", vec!["camp_site"]),
        ])
    }

    /// Cafés, shops, galleries and other social amenities.
    #[must_use]
    pub fn social() -> Self {
        Self::from_entries([
            (
                "amenity",
                vec!["cafe", "restaurant", "bar", "pub", "food_court", "ice_cream"],
            ),
            (
                "shop",
                vec!["bakery", "gift", "clothes", "supermarket", "convenience"],
            ),
            (
                "tourism",
                vec!["gallery", "museum", "viewpoint", "attraction", "zoo"],
            ),
            (
                "leisure",
                vec!["sports_centre", "stadium", "swimming_pool", "dance"],
            ),
        ])
    }

    /// Footways, paths and roads closed to motor traffic.
    #[must_use]
    pub fn quiet() -> Self {
        Self::from_entries([
            (
                "highway",
                vec!["footway", "path", "pedestrian", "steps", "track"],
            ),
            ("motor_vehicle", vec!["no"]),
            ("access", vec!["private", "permissive"]),
        ])
    }

    /// The catalogue for a preference dimension.
    #[must_use]
    pub fn for_preference(preference: Preference) -> Self {
        match preference {
            Preference::Green => Self::green(),
            Preference::Social => Self::social(),
            Preference::Quiet => Self::quiet(),
        }
    }

    /// Return `true` when `value` is listed under `key`.
    #[must_use]
    pub fn matches(&self, key: &str, value: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Return `true` when the catalogue lists `key` at all.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// `(key, values)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Return `true` when the catalogue has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("motorway"), 2.0)]
    #[case(Some("residential"), 1.0)]
    #[case(Some("pedestrian"), 0.3)]
    #[case(Some("unclassified"), DEFAULT_NOISE)]
    #[case(None, DEFAULT_NOISE)]
    fn looks_up_noise(#[case] highway: Option<&str>, #[case] expected: f64) {
        assert!((noise_factor(highway) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    fn social_catalogue_matches_cafes() {
        let social = TagCatalogue::social();
        assert!(social.matches("amenity", "cafe"));
        assert!(!social.matches("amenity", "parking"));
        assert!(!social.matches("landuse", "cafe"));
        assert!(social.has_key("shop"));
    }

    #[rstest]
    fn merges_repeated_keys() {
        let catalogue = TagCatalogue::from_entries([("a", vec!["x"]), ("a", vec!["y"])]);
        assert!(catalogue.matches("a", "x"));
        assert!(catalogue.matches("a", "y"));
        assert_eq!(catalogue.keys().count(), 1);
    }
}
