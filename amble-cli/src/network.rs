//! Loading walking networks from the files the CLI accepts.

use std::io::Write;

use amble_core::{Graph, PoiCandidate};
use amble_data::{NetworkSnapshot, OsmIngestSummary, ingest_osm_pbf};
use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::CliError;

/// A network and the POI candidates shipped with it.
#[derive(Debug)]
pub(crate) struct LoadedNetwork {
    pub(crate) graph: Graph,
    pub(crate) pois: Vec<PoiCandidate>,
    /// Present when the network was built from an OSM extract.
    pub(crate) ingest: Option<OsmIngestSummary>,
}

/// Return `true` when `path` names a JSON snapshot rather than an extract.
pub(crate) fn is_snapshot(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a network from a `.json` snapshot or an OSM PBF extract.
pub(crate) fn load_network(path: &Utf8Path) -> Result<LoadedNetwork, CliError> {
    let loaded = if is_snapshot(path) {
        let snapshot_error = |source| CliError::ReadSnapshot {
            path: path.to_path_buf(),
            source,
        };
        let snapshot = NetworkSnapshot::read(path).map_err(snapshot_error)?;
        LoadedNetwork {
            graph: snapshot.to_graph().map_err(snapshot_error)?,
            pois: snapshot.poi_candidates(),
            ingest: None,
        }
    } else {
        let report = ingest_osm_pbf(path)?;
        LoadedNetwork {
            graph: report.graph,
            pois: report.pois,
            ingest: Some(report.summary),
        }
    };
    info!(
        "loaded {path}: {} nodes, {} edges, {} POI candidates",
        loaded.graph.node_count(),
        loaded.graph.edge_count(),
        loaded.pois.len()
    );
    Ok(loaded)
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
