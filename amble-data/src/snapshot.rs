//! JSON network snapshots.
//!
//! A snapshot is a self-contained walking network plus optional POI
//! candidates:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "lat": 47.8, "lng": 13.04 }],
//!   "edges": [{ "u": 1, "v": 2, "length": 42.0, "tags": { "highway": "footway" } }],
//!   "pois": [{ "id": 7, "lat": 47.8, "lng": 13.05, "tags": { "amenity": "cafe" } }]
//! }
//! ```
//!
//! Edges are directed. Tag values may be a string or a list of strings.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use amble_core::geodesy::coord;
use amble_core::{Edge, EdgeTags, Graph, GraphBuilder, GraphError, NodeId, PoiCandidate};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::open_utf8_file;

/// A network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Node id.
    pub id: NodeId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// A directed network edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    /// Tail node id.
    pub u: NodeId,
    /// Head node id.
    pub v: NodeId,
    /// Length in metres.
    pub length: f64,
    /// Edge tags.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: EdgeTags,
}

/// A POI candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPoi {
    /// Candidate id.
    pub id: u64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Raw tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Serialised walking network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Network nodes.
    pub nodes: Vec<SnapshotNode>,
    /// Directed network edges.
    pub edges: Vec<SnapshotEdge>,
    /// POI candidates near the network.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pois: Vec<SnapshotPoi>,
}

/// Errors raised while reading or converting a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("failed to read network snapshot at {path}")]
    Read {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The snapshot could not be encoded or decoded as JSON.
    #[error("network snapshot JSON error")]
    Json(#[from] serde_json::Error),
    /// The snapshot describes an invalid network.
    #[error("network snapshot is invalid")]
    Graph(#[from] GraphError),
}

impl NetworkSnapshot {
    /// Read a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Read`] when the file cannot be read and
    /// [`SnapshotError::Json`] when it is not a valid snapshot.
    pub fn read(path: &Utf8Path) -> Result<Self, SnapshotError> {
        let read_error = |source| SnapshotError::Read {
            path: path.to_owned(),
            source,
        };
        let mut contents = String::new();
        open_utf8_file(path)
            .map_err(read_error)?
            .read_to_string(&mut contents)
            .map_err(read_error)?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Json`] when `json` is not a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot as JSON.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Json`] when serialisation or writing fails.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        Ok(serde_json::to_writer(writer, self)?)
    }

    /// Capture `graph` and `pois` as a snapshot.
    #[must_use]
    pub fn from_parts(graph: &Graph, pois: &[PoiCandidate]) -> Self {
        let mut nodes: Vec<SnapshotNode> = graph
            .nodes()
            .map(|node| SnapshotNode {
                id: node.id,
                lat: node.lat(),
                lng: node.lng(),
            })
            .collect();
        nodes.sort_by_key(|node| node.id);
        let edges = graph
            .edges()
            .map(|edge| SnapshotEdge {
                u: edge.from,
                v: edge.to,
                length: edge.length_m,
                tags: edge.tags.clone(),
            })
            .collect();
        let pois = pois
            .iter()
            .map(|poi| SnapshotPoi {
                id: poi.id,
                lat: poi.location.y,
                lng: poi.location.x,
                tags: poi.tags.clone(),
            })
            .collect();
        Self { nodes, edges, pois }
    }

    /// Build the network described by the snapshot.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Graph`] for invalid coordinates, duplicate
    /// nodes, dangling edges or invalid lengths.
    pub fn to_graph(&self) -> Result<Graph, SnapshotError> {
        let mut builder = GraphBuilder::new();
        for node in &self.nodes {
            builder.add_node(node.id, coord(node.lat, node.lng))?;
        }
        for edge in &self.edges {
            builder.add_edge(Edge {
                from: edge.u,
                to: edge.v,
                length_m: edge.length,
                tags: edge.tags.clone(),
            })?;
        }
        Ok(builder.build())
    }

    /// POI candidates carried by the snapshot.
    #[must_use]
    pub fn poi_candidates(&self) -> Vec<PoiCandidate> {
        self.pois
            .iter()
            .map(|poi| PoiCandidate {
                id: poi.id,
                location: coord(poi.lat, poi.lng),
                tags: poi.tags.clone(),
            })
            .collect()
    }
}
