//! Facade crate for the amble walking route engine.
//!
//! This crate re-exports the core domain types and exposes the default
//! sequencer behind a feature flag.
//!
//! ```
//! # #[cfg(feature = "solver-local")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use amble_engine::geodesy::coord;
//! use amble_engine::{
//!     Edge, GraphBuilder, LocalSearchSequencer, MemoryPoiProvider, OptimizeRequest,
//!     PreferenceWeights, RouteOptimizer, StaticRoadNetwork, Waypoint,
//! };
//!
//! let mut builder = GraphBuilder::new();
//! for (id, lng) in [(1, 0.0), (2, 0.001), (3, 0.002)] {
//!     builder.add_node(id, coord(0.0, lng))?;
//! }
//! builder.add_bidirectional(Edge::new(1, 2, 111.0))?;
//! builder.add_bidirectional(Edge::new(2, 3, 111.0))?;
//!
//! let optimizer = RouteOptimizer::new(
//!     StaticRoadNetwork::new(builder.build()),
//!     LocalSearchSequencer::new(),
//!     MemoryPoiProvider::default(),
//! );
//! let request = OptimizeRequest {
//!     waypoints: vec![
//!         Waypoint::new("start", 0.0, 0.0),
//!         Waypoint::new("far", 0.0, 0.002),
//!         Waypoint::new("near", 0.0, 0.001),
//!     ],
//!     weights: PreferenceWeights::NEUTRAL,
//! };
//! let response = optimizer.optimize(&request)?;
//! assert_eq!(response.route.order.as_slice(), &[0, 2, 1]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "solver-local"))]
//! # fn main() {}
//! ```

#![forbid(unsafe_code)]

pub use amble_core::{
    AssemblyError, Comparison, ConfigError, Diagnostics, Edge, EdgeTags, Graph, GraphBuilder, GraphCache,
    GraphError, GraphSource, InputOrderSequencer, MemoryPoiProvider, NoPathError,
    NoSolutionError, Node, NodeId, OptimizeError, OptimizeRequest, OptimizeResponse, Poi,
    PoiCandidate, PoiCategory, PoiProvider, PoiSearch, PoiSearchError, Preference, PreferenceWeights,
    ProviderError, RequestValidationError, RoadNetworkProvider, RouteOptimizer,
    RouteOptimizerConfig, RouteOrder, RoutePath, RouteResult, Sequencer, StaticRoadNetwork,
    TagCatalogue, TagValue, Waypoint, geodesy,
};

#[cfg(feature = "solver-local")]
pub use amble_solver_local::{LocalSearchConfig, LocalSearchSequencer};
