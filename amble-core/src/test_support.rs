//! Deterministic fixtures shared by unit, behaviour and downstream tests.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use geo::Rect;

use crate::cache::Clock;
use crate::catalogue::TagCatalogue;
use crate::geodesy::coord;
use crate::graph::{Edge, Graph, GraphBuilder, NodeId};
use crate::optimizer::Waypoint;
use crate::poi::PoiCandidate;
use crate::provider::{PoiProvider, ProviderError, RoadNetworkProvider};

/// Metres per degree of longitude on the equator, used to lay out fixtures.
const METRES_PER_DEGREE: f64 = 111_195.0;

fn degrees(metres: f64) -> f64 {
    metres / METRES_PER_DEGREE
}

fn index_to_f64(index: u32) -> f64 {
    f64::from(index)
}

/// Nodes `1..=count` along the equator, `spacing_m` apart, joined by
/// bidirectional footways of length `spacing_m`.
#[must_use]
pub fn line_graph(count: u32, spacing_m: f64) -> Graph {
    let mut builder = GraphBuilder::new();
    add_line(&mut builder, 0, 0.0, count, spacing_m);
    builder.build()
}

fn add_line(builder: &mut GraphBuilder, id_offset: NodeId, lat: f64, count: u32, spacing_m: f64) {
    for i in 0..count {
        let id = id_offset + NodeId::from(i) + 1;
        let lng = degrees(spacing_m * index_to_f64(i));
        // Fixture coordinates are valid by construction.
        let _ = builder.add_node(id, coord(lat, lng));
        if i > 0 {
            let _ = builder.add_bidirectional(
                Edge::new(id - 1, id, spacing_m).with_tag("highway", "footway"),
            );
        }
    }
}

/// A `rows` x `cols` grid of nodes `spacing_m` apart with bidirectional
/// residential streets. Node ids are `row * cols + col + 1`.
#[must_use]
pub fn grid_graph(rows: u32, cols: u32, spacing_m: f64) -> Graph {
    let mut builder = GraphBuilder::new();
    let id = |row: u32, col: u32| NodeId::from(row * cols + col + 1);
    for row in 0..rows {
        for col in 0..cols {
            let _ = builder.add_node(
                id(row, col),
                coord(
                    degrees(spacing_m * index_to_f64(row)),
                    degrees(spacing_m * index_to_f64(col)),
                ),
            );
        }
    }
    for row in 0..rows {
        for col in 0..cols {
            if col + 1 < cols {
                let _ = builder.add_bidirectional(
                    Edge::new(id(row, col), id(row, col + 1), spacing_m)
                        .with_tag("highway", "residential"),
                );
            }
            if row + 1 < rows {
                let _ = builder.add_bidirectional(
                    Edge::new(id(row, col), id(row + 1, col), spacing_m)
                        .with_tag("highway", "residential"),
                );
            }
        }
    }
    builder.build()
}

/// Two disconnected lines: nodes 1..=3 and nodes 101..=102, 100 m apart.
#[must_use]
pub fn two_component_graph() -> Graph {
    let mut builder = GraphBuilder::new();
    add_line(&mut builder, 0, 0.0, 3, 100.0);
    add_line(&mut builder, 100, degrees(1_000.0), 2, 100.0);
    builder.build()
}

/// A waypoint placed exactly on node `id`.
///
/// # Panics
/// Panics when `id` is not in `graph`.
#[must_use]
pub fn node_waypoint(graph: &Graph, id: NodeId) -> Waypoint {
    let Some(node) = graph.node(id) else {
        panic!("fixture graph has no node {id}");
    };
    Waypoint::new(format!("node {id}"), node.lat(), node.lng())
}

/// Road network provider that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRoadNetwork;

impl RoadNetworkProvider for FailingRoadNetwork {
    fn graph(&self) -> Result<Arc<Graph>, ProviderError> {
        Err(ProviderError::NetworkUnavailable {
            message: "fixture network is offline".to_owned(),
        })
    }
}

/// POI provider that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPoiProvider;

impl PoiProvider for FailingPoiProvider {
    fn candidates(
        &self,
        _region: &Rect<f64>,
        _filter: &TagCatalogue,
    ) -> Result<Box<dyn Iterator<Item = PoiCandidate> + Send + '_>, ProviderError> {
        Err(ProviderError::PoiUnavailable {
            message: "fixture POI source is offline".to_owned(),
        })
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// A clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}
