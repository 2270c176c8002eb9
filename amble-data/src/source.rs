//! [`GraphSource`] implementations over files.

use std::error::Error;

use amble_core::{Graph, GraphSource, ProviderError};
use camino::{Utf8Path, Utf8PathBuf};

use crate::ingest::{OsmIngestConfig, OsmIngestError, ingest_osm_pbf_with};
use crate::snapshot::{NetworkSnapshot, SnapshotError};

/// Render an error with its source chain on one line.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Builds the walking network from an OSM PBF extract.
#[derive(Debug, Clone)]
pub struct OsmPbfSource {
    path: Utf8PathBuf,
    config: OsmIngestConfig,
}

impl OsmPbfSource {
    /// Read `path` with default ingest options.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self::with_config(path, OsmIngestConfig::default())
    }

    /// Read `path` with explicit ingest options.
    pub fn with_config(path: impl Into<Utf8PathBuf>, config: OsmIngestConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// The extract path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl From<OsmIngestError> for ProviderError {
    fn from(err: OsmIngestError) -> Self {
        let message = describe(&err);
        match err {
            OsmIngestError::Open { .. } => Self::NetworkUnavailable { message },
            OsmIngestError::Decode { .. } => Self::MalformedNetwork { message },
        }
    }
}

impl GraphSource for OsmPbfSource {
    fn cache_key(&self) -> String {
        format!("osm:{}", self.path)
    }

    fn load(&self) -> Result<Graph, ProviderError> {
        Ok(ingest_osm_pbf_with(&self.path, &self.config)?.graph)
    }
}

/// Builds the walking network from a JSON snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: Utf8PathBuf,
}

impl SnapshotSource {
    /// Read the snapshot at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl From<SnapshotError> for ProviderError {
    fn from(err: SnapshotError) -> Self {
        let message = describe(&err);
        match err {
            SnapshotError::Read { .. } => Self::NetworkUnavailable { message },
            SnapshotError::Json(_) | SnapshotError::Graph(_) => Self::MalformedNetwork { message },
        }
    }
}

impl GraphSource for SnapshotSource {
    fn cache_key(&self) -> String {
        format!("snapshot:{}", self.path)
    }

    fn load(&self) -> Result<Graph, ProviderError> {
        Ok(NetworkSnapshot::read(&self.path)?.to_graph()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use amble_core::{CachedRoadNetwork, GraphCache, RoadNetworkProvider};
    use rstest::rstest;

    fn write_snapshot(dir: &tempfile::TempDir, name: &str, json: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 path");
        std::fs::write(&path, json).expect("write snapshot");
        path
    }

    #[rstest]
    fn snapshot_source_loads_graph() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_snapshot(
            &dir,
            "line.json",
            r#"{"nodes": [{"id": 1, "lat": 0.0, "lng": 0.0}, {"id": 2, "lat": 0.0, "lng": 0.001}],
                "edges": [{"u": 1, "v": 2, "length": 111.0}, {"u": 2, "v": 1, "length": 111.0}]}"#,
        );
        let graph = SnapshotSource::new(path).load().expect("valid snapshot");
        assert_eq!(graph.edge_count(), 2);
    }

    #[rstest]
    fn missing_snapshot_is_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.json")).expect("utf-8 path");
        let err = SnapshotSource::new(path).load().expect_err("missing file");
        assert!(matches!(err, ProviderError::NetworkUnavailable { .. }));
    }

    #[rstest]
    fn malformed_snapshot_reports_cause() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_snapshot(&dir, "bad.json", "{\"nodes\": 3}");
        let err = SnapshotSource::new(path).load().expect_err("bad JSON");
        match err {
            ProviderError::MalformedNetwork { message } => {
                assert!(message.starts_with("network snapshot JSON error: "));
            }
            other => panic!("expected malformed network, got {other:?}"),
        }
    }

    #[rstest]
    fn cache_keys_name_the_source_kind() {
        assert_eq!(SnapshotSource::new("a.json").cache_key(), "snapshot:a.json");
        assert_eq!(OsmPbfSource::new("a.osm.pbf").cache_key(), "osm:a.osm.pbf");
    }

    #[rstest]
    fn cached_snapshot_is_shared() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_snapshot(
            &dir,
            "single.json",
            r#"{"nodes": [{"id": 1, "lat": 0.0, "lng": 0.0}], "edges": []}"#,
        );
        let cache = Arc::new(GraphCache::new(Duration::from_secs(60)));
        let first = CachedRoadNetwork::new(SnapshotSource::new(path.clone()), Arc::clone(&cache));
        let second = CachedRoadNetwork::new(SnapshotSource::new(path), cache);
        let a = first.graph().expect("graph");
        let b = second.graph().expect("graph");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
