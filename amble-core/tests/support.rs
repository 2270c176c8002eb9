//! Network fixtures shared by the behaviour and property tests.

use amble_core::geodesy::coord;
use amble_core::{Edge, Graph, GraphBuilder, NodeId, Waypoint};

/// Metres per degree of longitude on the equator.
const METRES_PER_DEGREE: f64 = 111_195.0;

fn add_line(builder: &mut GraphBuilder, first_id: NodeId, lat: f64, count: u32, spacing_m: f64) {
    for i in 0..count {
        let id = first_id + NodeId::from(i);
        let lng = spacing_m * f64::from(i) / METRES_PER_DEGREE;
        builder
            .add_node(id, coord(lat, lng))
            .unwrap_or_else(|err| panic!("fixture node {id}: {err}"));
        if i > 0 {
            builder
                .add_bidirectional(Edge::new(id - 1, id, spacing_m).with_tag("highway", "footway"))
                .unwrap_or_else(|err| panic!("fixture edge to {id}: {err}"));
        }
    }
}

/// Nodes `1..=count` on a straight footway along the equator.
pub fn line_network(count: u32, spacing_m: f64) -> Graph {
    let mut builder = GraphBuilder::new();
    add_line(&mut builder, 1, 0.0, count, spacing_m);
    builder.build()
}

/// Nodes `1..=3` and `101..=102` on two footways that never meet.
pub fn split_network() -> Graph {
    let mut builder = GraphBuilder::new();
    add_line(&mut builder, 1, 0.0, 3, 100.0);
    add_line(&mut builder, 101, 0.01, 2, 100.0);
    builder.build()
}

/// A waypoint on node `id`.
pub fn waypoint_at(graph: &Graph, id: NodeId) -> Waypoint {
    let node = graph
        .node(id)
        .unwrap_or_else(|| panic!("fixture graph has no node {id}"));
    Waypoint::new(format!("node {id}"), node.lat(), node.lng())
}
