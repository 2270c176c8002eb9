//! Plan command implementation for the amble CLI.

use std::io::{BufReader, Write};
use std::time::Duration;

use amble_core::optimizer::REFERENCE_MAX_ROUTE_DISTANCE_M;
use amble_core::{
    DEFAULT_TIME_BUDGET, OptimizeRequest, OptimizeResponse, PoiSearch, PoiSearchError,
    RouteOptimizer, RouteOptimizerConfig, StaticRoadNetwork,
};
use amble_data::IndexedPoiProvider;
use amble_data::fs::open_utf8_file;
use amble_solver_local::LocalSearchSequencer;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::network::{load_network, write_json};
use crate::{
    ARG_NETWORK, ARG_PLAN_MAX_DISTANCE_M, ARG_PLAN_MAX_POIS, ARG_PLAN_POI_RADIUS_M,
    ARG_PLAN_REQUEST, ARG_PLAN_TIME_BUDGET_MS, CliError, ENV_PLAN_NETWORK, ENV_PLAN_REQUEST,
    require_existing,
};

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "plan",
    long_about = "Plan a walking route for a JSON request. The request lists \
                 waypoints (the first is the fixed start) and optional \
                 green/social/quiet weights. The network is read from an OSM \
                 PBF extract or a JSON snapshot, which also supplies the POI \
                 candidates.",
    about = "Plan a walking route"
)]
#[ortho_config(prefix = "AMBLE")]
pub(crate) struct PlanArgs {
    /// Path to a JSON file containing the request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// OSM PBF extract or `.json` network snapshot.
    #[arg(long = ARG_NETWORK, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Wall-clock budget for ordering the waypoints.
    #[arg(long = ARG_PLAN_TIME_BUDGET_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) time_budget_ms: Option<u64>,
    /// Report POIs within this many metres of the route.
    #[arg(long = ARG_PLAN_POI_RADIUS_M, value_name = "metres")]
    #[serde(default)]
    pub(crate) poi_radius_m: Option<f64>,
    /// Report at most this many POIs.
    #[arg(long = ARG_PLAN_MAX_POIS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_pois: Option<usize>,
    /// Flag routes longer than this many metres.
    #[arg(long = ARG_PLAN_MAX_DISTANCE_M, value_name = "metres")]
    #[serde(default)]
    pub(crate) max_distance_m: Option<f64>,
}

impl PlanArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

/// Resolved `plan` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlanConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Path to the network extract or snapshot.
    pub(crate) network: Utf8PathBuf,
    /// Sequencer budget.
    pub(crate) time_budget: Duration,
    /// POI radius and result cap.
    pub(crate) poi_search: PoiSearch,
    /// Distance above which routes are flagged.
    pub(crate) max_distance_m: f64,
}

impl PlanConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_PLAN_REQUEST)?;
        require_existing(&self.network, ARG_NETWORK)?;
        Ok(())
    }

    pub(crate) fn optimizer_config(&self) -> RouteOptimizerConfig {
        RouteOptimizerConfig {
            time_budget: self.time_budget,
            poi_search: self.poi_search,
            max_route_distance_m: Some(self.max_distance_m),
            ..RouteOptimizerConfig::default()
        }
    }
}

fn positive_metres(field: &'static str, value: f64) -> Result<f64, CliError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CliError::InvalidOption {
            field,
            reason: format!("expected a positive distance in metres, got {value}"),
        })
    }
}

impl TryFrom<PlanArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_PLAN_REQUEST,
            env: ENV_PLAN_REQUEST,
        })?;
        let network = args.network.ok_or(CliError::MissingArgument {
            field: ARG_NETWORK,
            env: ENV_PLAN_NETWORK,
        })?;

        let time_budget = args
            .time_budget_ms
            .map_or(DEFAULT_TIME_BUDGET, Duration::from_millis);
        let defaults = PoiSearch::default();
        let poi_search = PoiSearch::new(
            args.poi_radius_m.unwrap_or(defaults.radius_m),
            args.max_pois.unwrap_or(defaults.max_results),
        )
        .map_err(|err| CliError::InvalidOption {
            field: match err {
                PoiSearchError::InvalidRadius { .. } => ARG_PLAN_POI_RADIUS_M,
                PoiSearchError::ZeroMaxResults => ARG_PLAN_MAX_POIS,
            },
            reason: err.to_string(),
        })?;
        let max_distance_m = args
            .max_distance_m
            .map(|limit| positive_metres(ARG_PLAN_MAX_DISTANCE_M, limit))
            .transpose()?
            .unwrap_or(REFERENCE_MAX_ROUTE_DISTANCE_M);

        Ok(Self {
            request_path,
            network,
            time_budget,
            poi_search,
            max_distance_m,
        })
    }
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_plan_with(args, &mut stdout)
}

pub(crate) fn run_plan_with(args: PlanArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let response = execute_plan(args)?;
    write_json(writer, &response)
}

fn execute_plan(args: PlanArgs) -> Result<OptimizeResponse, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let request = load_plan_request(&config.request_path)?;
    request
        .validate()
        .map_err(|source| CliError::InvalidRequest {
            path: config.request_path.clone(),
            source,
        })?;

    let network = load_network(&config.network)?;
    let optimizer = RouteOptimizer::with_config(
        StaticRoadNetwork::new(network.graph),
        LocalSearchSequencer::new(),
        IndexedPoiProvider::new(network.pois),
        config.optimizer_config(),
    )
    .map_err(|source| CliError::OptimizerConfig { source })?;
    let response = optimizer
        .optimize(&request)
        .map_err(|source| CliError::Plan { source })?;
    info!(
        "planned {} waypoints: {:.0} m, {} POIs",
        response.route.order.len(),
        response.route.distance,
        response.pois.len()
    );
    Ok(response)
}

/// Load a JSON-encoded [`OptimizeRequest`] from disk.
pub(crate) fn load_plan_request(path: &Utf8Path) -> Result<OptimizeRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<PlanConfig, CliError> {
    let merged = PlanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    PlanConfig::try_from(merged)
}
