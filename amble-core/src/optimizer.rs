//! Request pipeline: validate, resolve, cost, sequence, assemble, annotate.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::catalogue::TagCatalogue;
use crate::cost::CostModel;
use crate::geodesy::{coord, is_valid_coordinate};
use crate::matrix::build_matrix;
use crate::poi::{Poi, PoiSearch, PoiSearchError, locate_pois, search_region};
use crate::provider::{PoiProvider, ProviderError, RoadNetworkProvider};
use crate::route::{AssemblyError, RouteAssembler, RouteResult};
use crate::sequencer::{NoSolutionError, Sequencer};
use crate::weights::{PreferenceWeights, WeightError};

/// Fewest waypoints a request may contain.
pub const MIN_WAYPOINTS: usize = 2;
/// Default sequencer time budget.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(10);
/// Reference maximum route length in metres.
pub const REFERENCE_MAX_ROUTE_DISTANCE_M: f64 = 10_000.0;

/// A caller-chosen stop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    /// Display name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Waypoint {
    /// Create a waypoint.
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }
}

/// Waypoints to visit and the caller's preferences.
///
/// The first waypoint is the fixed start of the route.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizeRequest {
    /// Stops in the caller's order.
    #[cfg_attr(feature = "serde", serde(alias = "attractions"))]
    pub waypoints: Vec<Waypoint>,
    /// Preference weights.
    #[cfg_attr(feature = "serde", serde(default, alias = "preferences"))]
    pub weights: PreferenceWeights,
}

/// The request was rejected before any routing work.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestValidationError {
    /// Too few waypoints.
    #[error("at least {MIN_WAYPOINTS} waypoints are required, got {count}")]
    TooFewWaypoints {
        /// Waypoints supplied.
        count: usize,
    },
    /// A waypoint's coordinates were out of range or not finite.
    #[error("waypoint {index} ({name}) has invalid coordinates ({lat}, {lng})")]
    InvalidWaypoint {
        /// Position in the request.
        index: usize,
        /// Waypoint name.
        name: String,
        /// Latitude supplied.
        lat: f64,
        /// Longitude supplied.
        lng: f64,
    },
    /// A preference weight was out of range.
    #[error(transparent)]
    Weight(#[from] WeightError),
}

impl OptimizeRequest {
    /// Check the request is routable.
    ///
    /// # Errors
    /// Returns [`RequestValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.waypoints.len() < MIN_WAYPOINTS {
            return Err(RequestValidationError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        if let Some((index, waypoint)) = self
            .waypoints
            .iter()
            .enumerate()
            .find(|(_, w)| !is_valid_coordinate(w.lat, w.lng))
        {
            return Err(RequestValidationError::InvalidWaypoint {
                index,
                name: waypoint.name.clone(),
                lat: waypoint.lat,
                lng: waypoint.lng,
            });
        }
        self.weights.validate()?;
        Ok(())
    }
}

/// Errors returned by [`RouteOptimizer::optimize`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The request was invalid.
    #[error("invalid request: {0}")]
    Validation(#[from] RequestValidationError),
    /// No visiting order could be produced.
    #[error(transparent)]
    NoSolution(#[from] NoSolutionError),
    /// A data provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Route geometry could not be produced.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Runtime details about a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Wall-clock time spent in [`RouteOptimizer::optimize`].
    pub solve_time: Duration,
    /// Number of waypoints in the cost matrix.
    pub matrix_size: usize,
    /// Off-diagonal matrix pairs with no connecting path.
    pub unreachable_pairs: usize,
    /// POI candidates dropped as malformed.
    pub skipped_pois: usize,
}

/// A planned route with nearby points of interest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptimizeResponse {
    /// The route and its metrics.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub route: RouteResult,
    /// Points of interest near the route, nearest first.
    pub pois: Vec<Poi>,
    /// Runtime details; not serialised.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub diagnostics: Diagnostics,
}

/// Configuration for [`RouteOptimizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptimizerConfig {
    /// Wall-clock budget handed to the sequencer.
    pub time_budget: Duration,
    /// POI radius and result cap.
    pub poi_search: PoiSearch,
    /// Tags a POI candidate must carry.
    pub poi_filter: TagCatalogue,
    /// Flag routes longer than this many metres.
    pub max_route_distance_m: Option<f64>,
}

impl Default for RouteOptimizerConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            poi_search: PoiSearch::default(),
            poi_filter: TagCatalogue::social(),
            max_route_distance_m: None,
        }
    }
}

/// Rejected [`RouteOptimizerConfig`] values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// POI search parameters were unusable.
    #[error(transparent)]
    PoiSearch(#[from] PoiSearchError),
    /// The route distance limit was not a positive, finite number of metres.
    #[error("maximum route distance must be positive and finite, got {metres}")]
    MaxRouteDistance {
        /// Limit supplied.
        metres: f64,
    },
}

impl RouteOptimizerConfig {
    /// Check every field can be used by the pipeline.
    ///
    /// # Errors
    /// Returns [`ConfigError`] naming the first unusable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.poi_search.validate()?;
        if let Some(metres) = self.max_route_distance_m
            && !(metres.is_finite() && metres > 0.0)
        {
            return Err(ConfigError::MaxRouteDistance { metres });
        }
        Ok(())
    }
}

/// Plans walking routes through caller-chosen waypoints.
///
/// The optimiser is generic over its collaborators: a road network
/// provider, a waypoint sequencer and a POI provider. It holds no mutable
/// state, so one instance can serve concurrent requests.
///
/// # Examples
/// ```
/// use amble_core::geodesy::coord;
/// use amble_core::{
///     Edge, GraphBuilder, InputOrderSequencer, MemoryPoiProvider, OptimizeRequest,
///     PreferenceWeights, RouteOptimizer, StaticRoadNetwork, Waypoint,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = GraphBuilder::new();
/// builder.add_node(1, coord(0.0, 0.0))?;
/// builder.add_node(2, coord(0.0, 0.001))?;
/// builder.add_bidirectional(Edge::new(1, 2, 111.0).with_tag("highway", "footway"))?;
/// let network = StaticRoadNetwork::new(builder.build());
/// let optimizer = RouteOptimizer::new(network, InputOrderSequencer, MemoryPoiProvider::default());
/// let request = OptimizeRequest {
///     waypoints: vec![Waypoint::new("a", 0.0, 0.0), Waypoint::new("b", 0.0, 0.001)],
///     weights: PreferenceWeights::NEUTRAL,
/// };
/// let response = optimizer.optimize(&request)?;
/// assert_eq!(response.route.order.as_slice(), &[0, 1]);
/// assert_eq!(response.route.path.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RouteOptimizer<R, S, P> {
    network: R,
    sequencer: S,
    pois: P,
    cost_model: CostModel,
    config: RouteOptimizerConfig,
}

impl<R, S, P> RouteOptimizer<R, S, P>
where
    R: RoadNetworkProvider,
    S: Sequencer,
    P: PoiProvider,
{
    /// Construct an optimiser with the default cost model and configuration.
    pub fn new(network: R, sequencer: S, pois: P) -> Self {
        Self {
            network,
            sequencer,
            pois,
            cost_model: CostModel::default(),
            config: RouteOptimizerConfig::default(),
        }
    }

    /// Construct an optimiser with explicit configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` fails
    /// [`RouteOptimizerConfig::validate`].
    pub fn with_config(
        network: R,
        sequencer: S,
        pois: P,
        config: RouteOptimizerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(network, sequencer, pois)
        })
    }

    /// Replace the cost model.
    #[must_use]
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Active configuration.
    pub const fn config(&self) -> &RouteOptimizerConfig {
        &self.config
    }

    /// Plan a route for `request`.
    ///
    /// Waypoints are snapped to their nearest network nodes on a single
    /// network snapshot. Unreachable waypoint pairs are tolerated while
    /// sequencing but fail assembly if the chosen order needs them.
    ///
    /// # Errors
    /// Returns [`OptimizeError`] when validation, a provider, the sequencer
    /// or assembly fails. No partial route is returned.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, OptimizeError> {
        request.validate()?;
        let started = Instant::now();
        log::info!(
            "optimising route through {} waypoints",
            request.waypoints.len()
        );

        let graph = self.network.graph()?;
        if graph.node_count() == 0 {
            return Err(ProviderError::EmptyNetwork.into());
        }
        let nodes = request
            .waypoints
            .iter()
            .map(|w| {
                graph
                    .nearest_node(coord(w.lat, w.lng))
                    .ok_or(ProviderError::NoNearbyNode {
                        lat: w.lat,
                        lng: w.lng,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("waypoints resolved to nodes {nodes:?}");

        let matrix = build_matrix(&graph, &nodes, &self.cost_model, &request.weights);
        let order = self.sequencer.sequence(&matrix, self.config.time_budget)?;
        if order.len() != matrix.size() {
            return Err(NoSolutionError::new(format!(
                "sequencer returned {} of {} waypoints",
                order.len(),
                matrix.size()
            ))
            .into());
        }

        let route = RouteAssembler::new(&graph, &self.cost_model, &request.weights)
            .with_max_distance(self.config.max_route_distance_m)
            .assemble(order, &nodes)?;

        let report = match search_region(&route.path, self.config.poi_search.radius_m) {
            Some(region) => {
                let candidates = self.pois.candidates(&region, &self.config.poi_filter)?;
                locate_pois(&route.path, candidates, &self.config.poi_search)
            }
            None => crate::poi::PoiReport::default(),
        };

        let diagnostics = Diagnostics {
            solve_time: started.elapsed(),
            matrix_size: matrix.size(),
            unreachable_pairs: matrix.unreachable_pairs(),
            skipped_pois: report.skipped.len(),
        };
        log::info!(
            "route planned: {:.0} m, {} POIs, {:?}",
            route.distance,
            report.pois.len(),
            diagnostics.solve_time
        );
        Ok(OptimizeResponse {
            route,
            pois: report.pois,
            diagnostics,
        })
    }
}
