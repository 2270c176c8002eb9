//! Data adapters for the amble routing engine.
//!
//! Responsibilities:
//! - Build walking networks and POI candidates from OpenStreetMap PBF
//!   extracts.
//! - Read and write JSON network snapshots.
//! - Implement the core provider traits over these sources.
//!
//! Boundaries:
//! - Do not encode routing rules (live in `amble-core`).
//! - Sources load synchronously; sharing and expiry are the cache's job.
//!
//! Invariants:
//! - Loaded networks satisfy the core graph invariants: valid coordinates,
//!   finite non-negative lengths, no dangling edge endpoints.
//! - No global mutable state.

pub mod fs;
mod ingest;
mod poi_index;
mod snapshot;
mod source;

pub use ingest::{
    OsmIngestConfig, OsmIngestError, OsmIngestReport, OsmIngestSummary, ingest_osm_pbf,
    ingest_osm_pbf_with,
};
pub use poi_index::IndexedPoiProvider;
pub use snapshot::{NetworkSnapshot, SnapshotEdge, SnapshotError, SnapshotNode, SnapshotPoi};
pub use source::{OsmPbfSource, SnapshotSource};
