//! Tag rules for walking-network and POI extraction.
//!
//! Provides helpers to:
//! - decide whether a way is part of the walking network;
//! - pick the way tags carried onto network edges; and
//! - detect POI candidates by catalogue key.

use std::collections::BTreeMap;

use amble_core::{EdgeTags, TagCatalogue, TagValue};

/// `highway` values never walked, even when tagged for pedestrians.
const EXCLUDED_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "construction",
    "proposed",
    "planned",
    "abandoned",
    "bus_guideway",
    "raceway",
    "escape",
];

/// `foot` values that grant access regardless of `access`.
const FOOT_ALLOWED: &[&str] = &["yes", "designated", "permissive"];

/// Way tags copied onto every edge built from the way.
const CARRIED_KEYS: &[&str] = &[
    "highway",
    "landuse",
    "leisure",
    "natural",
    "tourism",
    "amenity",
    "shop",
    "motor_vehicle",
    "access",
];

fn value<'a>(tags: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Return `true` when a way with `tags` can be walked.
pub(super) fn is_walkable(tags: &[(&str, &str)]) -> bool {
    let Some(highway) = value(tags, "highway") else {
        return false;
    };
    if EXCLUDED_HIGHWAYS.contains(&highway) || value(tags, "area") == Some("yes") {
        return false;
    }
    match value(tags, "foot") {
        Some("no") => false,
        Some(foot) if FOOT_ALLOWED.contains(&foot) => true,
        _ => value(tags, "access") != Some("no"),
    }
}

/// The subset of `tags` carried onto network edges.
pub(super) fn edge_tags(tags: &[(&str, &str)]) -> EdgeTags {
    tags.iter()
        .filter(|(key, _)| CARRIED_KEYS.contains(key))
        .map(|(key, value)| ((*key).to_owned(), TagValue::from(*value)))
        .collect()
}

/// Return `true` when any tag key is listed in `poi_keys`.
pub(super) fn has_poi_key(tags: &[(&str, &str)], poi_keys: &TagCatalogue) -> bool {
    tags.iter().any(|(key, _)| poi_keys.has_key(key))
}

pub(super) fn collect_tags(tags: &[(&str, &str)]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[("highway", "footway")], true)]
    #[case(&[("highway", "residential"), ("access", "private")], true)]
    #[case(&[("highway", "primary_link")], true)]
    #[case(&[("highway", "trunk_link")], true)]
    #[case(&[("highway", "motorway")], false)]
    #[case(&[("highway", "trunk")], false)]
    #[case(&[("highway", "path"), ("foot", "no")], false)]
    #[case(&[("highway", "service"), ("access", "no")], false)]
    #[case(&[("highway", "service"), ("access", "no"), ("foot", "yes")], true)]
    #[case(&[("highway", "pedestrian"), ("area", "yes")], false)]
    #[case(&[("building", "yes")], false)]
    fn classifies_walkable_ways(#[case] tags: &[(&str, &str)], #[case] expected: bool) {
        assert_eq!(is_walkable(tags), expected);
    }

    #[rstest]
    fn carries_only_selected_keys() {
        let tags = edge_tags(&[
            ("highway", "footway"),
            ("name", "Mill Lane"),
            ("leisure", "park"),
            ("surface", "gravel"),
        ]);
        assert_eq!(tags.keys().map(String::as_str).collect::<Vec<_>>(), vec!["highway", "leisure"]);
        assert_eq!(tags.get("highway").and_then(TagValue::primary), Some("footway"));
    }

    #[rstest]
    fn detects_poi_keys_from_catalogue() {
        let social = TagCatalogue::social();
        assert!(has_poi_key(&[("amenity", "bench")], &social));
        assert!(!has_poi_key(&[("highway", "footway"), ("name", "x")], &social));
    }
}
