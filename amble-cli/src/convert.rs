//! Convert command implementation for the amble CLI.

use std::io::{BufWriter, Write};

use amble_data::NetworkSnapshot;
use amble_data::fs::open_dir_and_file;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::network::{load_network, write_json};
use crate::{ARG_CONVERT_INPUT, ARG_CONVERT_OUTPUT, CliError, ENV_CONVERT_INPUT, require_existing};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "convert",
    long_about = "Build the walking network and POI candidates from an OSM \
                 PBF extract and save them as a JSON snapshot that later \
                 commands load without re-reading the extract.",
    about = "Write an OSM extract as a JSON network snapshot"
)]
#[ortho_config(prefix = "AMBLE")]
pub(crate) struct ConvertArgs {
    /// OSM PBF extract to read.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Snapshot to write. Defaults to the input name with a `.json` suffix.
    #[arg(long = ARG_CONVERT_OUTPUT, short = 'o', value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_CONVERT_INPUT,
            env: ENV_CONVERT_INPUT,
        })?;
        let output = args
            .output
            .unwrap_or_else(|| default_snapshot_path(&input));
        Ok(Self { input, output })
    }
}

/// `walk.osm.pbf` becomes `walk.json` next to the input.
pub(crate) fn default_snapshot_path(input: &Utf8Path) -> Utf8PathBuf {
    let name = input.file_name().unwrap_or("network");
    let stem = name
        .strip_suffix(".osm.pbf")
        .or_else(|| name.strip_suffix(".pbf"))
        .unwrap_or(name);
    input.with_file_name(format!("{stem}.json"))
}

/// What `amble convert` prints once the snapshot is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ConvertSummary {
    pub(crate) output: Utf8PathBuf,
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    pub(crate) poi_candidates: usize,
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_convert_with(args, &mut stdout)
}

pub(crate) fn run_convert_with(args: ConvertArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.input, ARG_CONVERT_INPUT)?;
    let network = load_network(&config.input)?;
    let snapshot = NetworkSnapshot::from_parts(&network.graph, &network.pois);
    write_snapshot(&config.output, &snapshot)?;
    info!("wrote network snapshot to {}", config.output);
    write_json(
        writer,
        &ConvertSummary {
            output: config.output,
            nodes: snapshot.nodes.len(),
            edges: snapshot.edges.len(),
            poi_candidates: snapshot.pois.len(),
        },
    )
}

fn write_snapshot(path: &Utf8Path, snapshot: &NetworkSnapshot) -> Result<(), CliError> {
    let create_error = |source| CliError::CreateOutput {
        path: path.to_path_buf(),
        source,
    };
    let (dir, name) = open_dir_and_file(path).map_err(create_error)?;
    let file = dir.create(&name).map_err(create_error)?;
    let mut writer = BufWriter::new(file);
    snapshot
        .write_json(&mut writer)
        .map_err(|source| CliError::WriteSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(create_error)
}
