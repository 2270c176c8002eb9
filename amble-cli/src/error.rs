//! Error types emitted by the amble CLI.
//!
//! Many helpers return `Result<_, CliError>`, so large payloads stay behind
//! `#[source]` fields rather than being copied into messages.

use std::sync::Arc;

use amble_core::{ConfigError, OptimizeError, RequestValidationError};
use amble_data::{OsmIngestError, SnapshotError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the amble CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Option name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// An option was supplied with an unusable value.
    #[error("invalid --{field}: {reason}")]
    InvalidOption {
        /// Option name.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Option name.
        field: &'static str,
        /// Path supplied.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Option name.
        field: &'static str,
        /// Path supplied.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Option name.
        field: &'static str,
        /// Path supplied.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// OSM ingestion failed.
    #[error("failed to ingest OSM data: {0}")]
    OsmIngest(#[from] OsmIngestError),
    /// A network snapshot could not be read or is invalid.
    #[error("failed to load network snapshot at {path:?}: {source}")]
    ReadSnapshot {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying snapshot error.
        #[source]
        source: SnapshotError,
    },
    /// Opening the plan request file failed.
    #[error("failed to open plan request at {path:?}: {source}")]
    OpenRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Plan request JSON could not be decoded.
    #[error("failed to parse plan request JSON at {path:?}: {source}")]
    ParseRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The plan request failed validation.
    #[error("plan request in {path:?} failed validation: {source}")]
    InvalidRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// First problem found.
        #[source]
        source: RequestValidationError,
    },
    /// The merged options did not form a usable optimiser configuration.
    #[error("invalid planning options: {source}")]
    OptimizerConfig {
        /// Rejected setting.
        #[source]
        source: ConfigError,
    },
    /// The optimiser could not plan the route.
    #[error("route planning failed: {source}")]
    Plan {
        /// Underlying optimiser error.
        #[source]
        source: OptimizeError,
    },
    /// Creating an output file failed.
    #[error("failed to create {path:?}: {source}")]
    CreateOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing a network snapshot failed.
    #[error("failed to write network snapshot to {path:?}: {source}")]
    WriteSnapshot {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying snapshot error.
        #[source]
        source: SnapshotError,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
