//! Core routing engine for amble walking routes.
//!
//! The crate turns a list of caller-chosen waypoints and three preference
//! weights (green, social, quiet) into an ordered walking route with nearby
//! points of interest. The pipeline runs leaves first:
//!
//! 1. [`CostModel`] prices each network edge for the caller's preferences.
//! 2. [`shortest_path`] and [`ShortestPathTree`] find minimum-cost paths.
//! 3. [`build_matrix`] builds the waypoint-to-waypoint [`DistanceMatrix`].
//! 4. A [`Sequencer`] picks the visiting order.
//! 5. [`RouteAssembler`] stitches the legs and measures the result.
//! 6. [`locate_pois`] annotates the route with nearby points of interest.
//!
//! [`RouteOptimizer`] drives the whole pipeline against a
//! [`RoadNetworkProvider`] and a [`PoiProvider`]. Networks are read-only and
//! may be shared between concurrent requests through a [`GraphCache`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod catalogue;
pub mod cost;
pub mod geodesy;
pub mod graph;
pub mod matrix;
pub mod optimizer;
pub mod poi;
pub mod provider;
pub mod route;
pub mod sequencer;
pub mod shortest_path;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod weights;

pub use cache::{Clock, DEFAULT_GRAPH_TTL, GraphCache, SystemClock};
pub use catalogue::{TagCatalogue, noise_factor};
pub use cost::{CostModel, EdgeCostModifier, NoiseModifier, TagDiscount};
pub use graph::{Edge, EdgeTags, Graph, GraphBuilder, GraphError, Node, NodeId, TagValue};
pub use matrix::{DistanceMatrix, MatrixError, UNREACHABLE_COST, build_matrix};
pub use optimizer::{
    ConfigError, DEFAULT_TIME_BUDGET, Diagnostics, OptimizeError, OptimizeRequest, OptimizeResponse,
    RequestValidationError, RouteOptimizer, RouteOptimizerConfig, Waypoint,
};
pub use poi::{
    Poi, PoiCandidate, PoiCategory, PoiReport, PoiSearch, PoiSearchError, PoiSkipped, locate_pois,
    search_region,
};
pub use provider::{
    CachedRoadNetwork, GraphSource, MemoryPoiProvider, PoiProvider, ProviderError,
    RoadNetworkProvider, StaticRoadNetwork,
};
pub use route::{
    AssemblyError, Comparison, RouteAssembler, RoutePath, RouteResult, SignedPercent,
};
pub use sequencer::{InputOrderSequencer, NoSolutionError, RouteOrder, RouteOrderError, Sequencer};
pub use shortest_path::{NoPathError, ShortestPath, ShortestPathTree, shortest_path};
pub use weights::{Preference, PreferenceWeights, WeightError};
