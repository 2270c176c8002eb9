//! Fixture helpers shared by the integration tests.

use std::io::Write;

use base64::{Engine as _, engine::general_purpose};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::{Builder, TempPath};

/// Epsilon for coordinate comparisons.
const COORDINATE_EPSILON: f64 = 1.0e-7;

/// Directory containing the encoded fixture blobs.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Decode a Base64-encoded fixture into a temporary `.osm.pbf` file.
pub fn decode_fixture(dir: &Utf8Path, stem: &str) -> TempPath {
    let encoded_path = dir.join(format!("{stem}.osm.pbf.b64"));
    let encoded = std::fs::read_to_string(&encoded_path).unwrap_or_else(|err| {
        panic!("failed to read base64 fixture {encoded_path}: {err}");
    });
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| panic!("failed to decode base64 fixture {encoded_path}: {err}"));
    let mut file = Builder::new()
        .prefix(stem)
        .suffix(".osm.pbf")
        .tempfile()
        .unwrap_or_else(|err| panic!("failed to create temporary fixture for {stem}: {err}"));
    file.write_all(&decoded)
        .unwrap_or_else(|err| panic!("failed to write decoded fixture for {stem}: {err}"));
    file.flush()
        .unwrap_or_else(|err| panic!("failed to flush decoded fixture for {stem}: {err}"));
    file.into_temp_path()
}

/// UTF-8 view of a temporary fixture path.
pub fn utf8_path(path: &TempPath) -> &Utf8Path {
    let std_path: &std::path::Path = path.as_ref();
    Utf8Path::from_path(std_path).unwrap_or_else(|| panic!("non UTF-8 temp path {std_path:?}"))
}

/// Compare floating-point values within a small epsilon.
pub fn assert_close(actual: f64, expected: f64) {
    let delta = (actual - expected).abs();
    assert!(
        delta <= COORDINATE_EPSILON,
        "expected {expected}, got {actual} (|Δ| = {delta})"
    );
}
