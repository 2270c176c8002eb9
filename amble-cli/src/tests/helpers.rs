//! Test helpers for composing CLI workspaces, networks and requests.

use std::fs;
use std::io::Write;

use amble_core::geodesy::coord;
use amble_core::test_support::{line_graph, node_waypoint};
use amble_core::{Graph, OptimizeRequest, PoiCandidate, PreferenceWeights};
use amble_data::NetworkSnapshot;
use base64::{Engine as _, engine::general_purpose};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Street spacing used by [`street_graph`].
pub(super) const STREET_SPACING_M: f64 = 50.0;

/// Write `contents` to `path`, panicking with context on failure.
pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).unwrap_or_else(|err| panic!("write {path}: {err}"));
}

/// A temporary directory and its UTF-8 path.
pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Six nodes on a straight footway, 50 m apart.
pub(super) fn street_graph() -> Graph {
    line_graph(6, STREET_SPACING_M)
}

/// Save [`street_graph`] plus a café beside node 3 as a snapshot.
pub(super) fn write_street_snapshot(path: &Utf8Path) {
    let graph = street_graph();
    let beside = graph.node(3).expect("street node 3");
    let cafe = PoiCandidate::new(
        99,
        coord(beside.lat() + 0.0001, beside.lng()),
        [("amenity", "cafe"), ("name", "Corner Cafe")],
    );
    let mut file = fs::File::create(path).unwrap_or_else(|err| panic!("create {path}: {err}"));
    NetworkSnapshot::from_parts(&graph, &[cafe])
        .write_json(&mut file)
        .expect("write snapshot");
    file.flush().expect("flush snapshot");
}

/// Write a request visiting street nodes `ids` in the given order.
pub(super) fn write_street_request(path: &Utf8Path, ids: &[u64]) {
    let graph = street_graph();
    let request = OptimizeRequest {
        waypoints: ids.iter().map(|&id| node_waypoint(&graph, id)).collect(),
        weights: PreferenceWeights::NEUTRAL,
    };
    let payload = serde_json::to_string_pretty(&request).expect("serialise request");
    write_utf8(path, payload.as_bytes());
}

/// Decode the shared walk extract into `dir` and return its path.
pub(super) fn decode_walk_extract(dir: &Utf8Path) -> Utf8PathBuf {
    let encoded_path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../amble-data/tests/fixtures/walk.osm.pbf.b64");
    let encoded = fs::read_to_string(&encoded_path)
        .unwrap_or_else(|err| panic!("read fixture {encoded_path}: {err}"));
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| panic!("decode fixture {encoded_path}: {err}"));
    let path = dir.join("walk.osm.pbf");
    write_utf8(&path, &decoded);
    path
}
