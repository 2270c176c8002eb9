//! Read-only walking network.
//!
//! A [`Graph`] is built once through [`GraphBuilder`] and then shared
//! immutably across requests. Nodes are addressed by stable external
//! [`NodeId`]s; internally the network is a `petgraph` directed graph with an
//! R*-tree over node positions for nearest-node lookup.

use std::collections::{BTreeMap, HashMap};

use geo::Coord;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use thiserror::Error;

use crate::geodesy::{great_circle_m, is_valid_coordinate};

/// Stable identifier of a network node.
pub type NodeId = u64;

/// Number of spatial-index neighbours re-ranked by great-circle distance.
const NEAREST_CANDIDATES: usize = 8;

/// A network vertex with a fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// External identifier.
    pub id: NodeId,
    /// Position; `x` is longitude and `y` is latitude.
    pub location: Coord<f64>,
}

impl Node {
    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.location.x
    }
}

/// A tag value that may hold a single string or a list of strings.
///
/// OpenStreetMap-derived networks sometimes merge ways and keep every
/// original value; consumers read the [`primary`](Self::primary) value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum TagValue {
    /// A single value.
    One(String),
    /// Several values in source order.
    Many(Vec<String>),
}

impl TagValue {
    /// The first value, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::One(value) => Some(value.as_str()),
            Self::Many(values) => values.first().map(String::as_str),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// Tags carried by an edge, ordered by key.
pub type EdgeTags = BTreeMap<String, TagValue>;

/// A directed, traversable network segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Tail node.
    pub from: NodeId,
    /// Head node.
    pub to: NodeId,
    /// Physical length in metres.
    pub length_m: f64,
    /// Highway classification and secondary land-use tags.
    pub tags: EdgeTags,
}

impl Edge {
    /// Create an untagged edge.
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, length_m: f64) -> Self {
        Self {
            from,
            to,
            length_m,
            tags: BTreeMap::new(),
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Primary value of `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).and_then(TagValue::primary)
    }

    /// Primary highway classification.
    #[must_use]
    pub fn highway(&self) -> Option<&str> {
        self.tag("highway")
    }

    /// The same edge travelled in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            length_m: self.length_m,
            tags: self.tags.clone(),
        }
    }
}

/// Errors raised while assembling a [`Graph`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Node coordinates were non-finite or outside the valid range.
    #[error("node {id} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates {
        /// Offending node.
        id: NodeId,
        /// Latitude supplied.
        lat: f64,
        /// Longitude supplied.
        lng: f64,
    },
    /// The same node id was added twice.
    #[error("node {id} was added more than once")]
    DuplicateNode {
        /// Offending node.
        id: NodeId,
    },
    /// An edge referenced a node that has not been added.
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownNode {
        /// Tail of the edge.
        from: NodeId,
        /// Head of the edge.
        to: NodeId,
        /// The endpoint that was not found.
        missing: NodeId,
    },
    /// Edge length was negative or non-finite.
    #[error("edge {from} -> {to} has invalid length {length_m}")]
    InvalidLength {
        /// Tail of the edge.
        from: NodeId,
        /// Head of the edge.
        to: NodeId,
        /// Length supplied.
        length_m: f64,
    },
}

/// Incrementally assembles a [`Graph`].
///
/// # Examples
/// ```
/// use amble_core::{Edge, GraphBuilder};
/// use amble_core::geodesy::coord;
///
/// # fn main() -> Result<(), amble_core::GraphError> {
/// let mut builder = GraphBuilder::new();
/// builder.add_node(1, coord(51.5, -0.1))?;
/// builder.add_node(2, coord(51.5, -0.099))?;
/// builder.add_bidirectional(Edge::new(1, 2, 70.0).with_tag("highway", "footway"))?;
/// let graph = builder.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    inner: DiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl GraphBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidCoordinates`] or
    /// [`GraphError::DuplicateNode`].
    pub fn add_node(&mut self, id: NodeId, location: Coord<f64>) -> Result<(), GraphError> {
        if !is_valid_coordinate(location.y, location.x) {
            return Err(GraphError::InvalidCoordinates {
                id,
                lat: location.y,
                lng: location.x,
            });
        }
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode { id });
        }
        let idx = self.inner.add_node(Node { id, location });
        self.index.insert(id, idx);
        Ok(())
    }

    /// Return `true` when `id` has already been added.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Add a directed edge. Parallel edges are kept.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] or [`GraphError::InvalidLength`].
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !edge.length_m.is_finite() || edge.length_m < 0.0 {
            return Err(GraphError::InvalidLength {
                from: edge.from,
                to: edge.to,
                length_m: edge.length_m,
            });
        }
        let lookup = |missing: NodeId| {
            self.index
                .get(&missing)
                .copied()
                .ok_or(GraphError::UnknownNode {
                    from: edge.from,
                    to: edge.to,
                    missing,
                })
        };
        let tail = lookup(edge.from)?;
        let head = lookup(edge.to)?;
        self.inner.add_edge(tail, head, edge);
        Ok(())
    }

    /// Add `edge` and its reverse.
    ///
    /// # Errors
    /// Same as [`add_edge`](Self::add_edge).
    pub fn add_bidirectional(&mut self, edge: Edge) -> Result<(), GraphError> {
        let back = edge.reversed();
        self.add_edge(edge)?;
        self.add_edge(back)
    }

    /// Freeze the network and build its spatial index.
    #[must_use]
    pub fn build(self) -> Graph {
        let points = self
            .inner
            .node_weights()
            .map(|node| GeomWithData::new([node.lng(), node.lat()], node.id))
            .collect();
        Graph {
            inner: self.inner,
            index: self.index,
            spatial: RTree::bulk_load(points),
        }
    }
}

/// Immutable walking network.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: DiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
    spatial: RTree<GeomWithData<[f64; 2], NodeId>>,
}

impl Graph {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).and_then(|idx| self.inner.node_weight(*idx))
    }

    /// Return `true` when the network contains `id`.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.inner.node_weights()
    }

    /// Iterate over all directed edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.inner.edge_weights()
    }

    /// Edges leaving `id`. Empty when the node is unknown.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(|idx| self.inner.edges(*idx).map(|edge| edge.weight()))
    }

    /// Node closest to `location` by great-circle distance.
    ///
    /// The R*-tree ranks candidates in planar degree space; the closest few
    /// are re-ranked on the sphere and ties go to the lower node id.
    #[must_use]
    pub fn nearest_node(&self, location: Coord<f64>) -> Option<NodeId> {
        self.spatial
            .nearest_neighbor_iter(&[location.x, location.y])
            .take(NEAREST_CANDIDATES)
            .map(|entry| {
                let [lng, lat] = *entry.geom();
                (great_circle_m(location, Coord { x: lng, y: lat }), entry.data)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    pub(crate) fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub(crate) const fn petgraph(&self) -> &DiGraph<Node, Edge> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn triangle() -> Graph {
        let mut builder = GraphBuilder::new();
        for (id, lat, lng) in [(1, 0.0, 0.0), (2, 0.0, 0.001), (3, 0.001, 0.0)] {
            builder.add_node(id, coord(lat, lng)).expect("valid node");
        }
        builder
            .add_bidirectional(Edge::new(1, 2, 111.0).with_tag("highway", "footway"))
            .expect("valid edge");
        builder
            .add_edge(Edge::new(2, 3, 157.0))
            .expect("valid edge");
        builder.build()
    }

    #[rstest]
    fn counts_nodes_and_edges(triangle: Graph) {
        assert_eq!(triangle.node_count(), 3);
        assert_eq!(triangle.edge_count(), 3);
        assert!(triangle.contains(3));
        assert!(!triangle.contains(4));
    }

    #[rstest]
    fn outgoing_lists_directed_edges(triangle: Graph) {
        let mut heads: Vec<NodeId> = triangle.outgoing(2).map(|e| e.to).collect();
        heads.sort_unstable();
        assert_eq!(heads, vec![1, 3]);
        assert_eq!(triangle.outgoing(3).count(), 0);
        assert_eq!(triangle.outgoing(99).count(), 0);
    }

    #[rstest]
    fn nearest_node_prefers_closest(triangle: Graph) {
        assert_eq!(triangle.nearest_node(coord(0.0, 0.0009)), Some(2));
        assert_eq!(triangle.nearest_node(coord(0.0009, 0.0)), Some(3));
    }

    #[rstest]
    fn nearest_node_on_empty_graph_is_none() {
        let graph = GraphBuilder::new().build();
        assert_eq!(graph.nearest_node(coord(0.0, 0.0)), None);
    }

    #[rstest]
    fn rejects_duplicate_nodes() {
        let mut builder = GraphBuilder::new();
        builder.add_node(1, coord(0.0, 0.0)).expect("first insert");
        let err = builder.add_node(1, coord(1.0, 1.0)).expect_err("duplicate");
        assert_eq!(err, GraphError::DuplicateNode { id: 1 });
    }

    #[rstest]
    #[case(91.0, 0.0)]
    #[case(0.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    fn rejects_invalid_coordinates(#[case] lat: f64, #[case] lng: f64) {
        let mut builder = GraphBuilder::new();
        let err = builder.add_node(7, coord(lat, lng)).expect_err("invalid");
        assert!(matches!(err, GraphError::InvalidCoordinates { id: 7, .. }));
    }

    #[rstest]
    fn rejects_edges_to_unknown_nodes() {
        let mut builder = GraphBuilder::new();
        builder.add_node(1, coord(0.0, 0.0)).expect("node");
        let err = builder.add_edge(Edge::new(1, 2, 5.0)).expect_err("unknown");
        assert!(matches!(err, GraphError::UnknownNode { missing: 2, .. }));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_lengths(#[case] length: f64) {
        let mut builder = GraphBuilder::new();
        builder.add_node(1, coord(0.0, 0.0)).expect("node");
        builder.add_node(2, coord(0.0, 0.1)).expect("node");
        let err = builder
            .add_edge(Edge::new(1, 2, length))
            .expect_err("bad length");
        assert!(matches!(err, GraphError::InvalidLength { .. }));
    }

    #[rstest]
    fn primary_tag_value_is_first_of_list() {
        let edge = Edge::new(1, 2, 1.0).with_tag(
            "highway",
            vec!["footway".to_owned(), "residential".to_owned()],
        );
        assert_eq!(edge.highway(), Some("footway"));
        let empty = Edge::new(1, 2, 1.0).with_tag("highway", Vec::<String>::new());
        assert_eq!(empty.highway(), None);
    }
}
