//! Command-line interface for planning walking routes with amble.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod convert;
mod error;
mod inspect;
mod network;
mod plan;

pub use error::CliError;

use convert::{ConvertArgs, run_convert};
use inspect::{InspectArgs, run_inspect};
use plan::{PlanArgs, run_plan};

pub(crate) const ARG_PLAN_REQUEST: &str = "request-path";
pub(crate) const ARG_NETWORK: &str = "network";
pub(crate) const ARG_PLAN_TIME_BUDGET_MS: &str = "time-budget-ms";
pub(crate) const ARG_PLAN_POI_RADIUS_M: &str = "poi-radius-m";
pub(crate) const ARG_PLAN_MAX_POIS: &str = "max-pois";
pub(crate) const ARG_PLAN_MAX_DISTANCE_M: &str = "max-distance-m";
pub(crate) const ARG_CONVERT_INPUT: &str = "input";
pub(crate) const ARG_CONVERT_OUTPUT: &str = "output";
pub(crate) const ENV_PLAN_REQUEST: &str = "AMBLE_CMDS_PLAN_REQUEST_PATH";
pub(crate) const ENV_PLAN_NETWORK: &str = "AMBLE_CMDS_PLAN_NETWORK";
pub(crate) const ENV_INSPECT_NETWORK: &str = "AMBLE_CMDS_INSPECT_NETWORK";
pub(crate) const ENV_CONVERT_INPUT: &str = "AMBLE_CMDS_CONVERT_INPUT";

/// Run the amble CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration, inputs or planning
/// fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging(cli.verbose);
    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Inspect(args) => run_inspect(args),
        Command::Convert(args) => run_convert(args),
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Parser)]
#[command(
    name = "amble",
    about = "Plan walking routes through chosen waypoints",
    version
)]
struct Cli {
    /// Log more detail to stderr (repeat for more).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a route for a JSON request over a walking network.
    Plan(PlanArgs),
    /// Summarise a walking network.
    Inspect(InspectArgs),
    /// Write an OSM extract as a JSON network snapshot.
    Convert(ConvertArgs),
}

/// Check `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match amble_data::fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
