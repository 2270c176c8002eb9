//! Deterministic Dijkstra over the walking network.
//!
//! Costs come from a caller-supplied function, normally
//! [`CostModel::cost`](crate::CostModel::cost). Negative costs are clamped to
//! zero and non-finite costs make an edge impassable.
//!
//! Ties are broken so that repeated runs on the same input are identical:
//! the frontier pops equal costs in ascending node id, a node reached at equal
//! cost through several parents keeps the parent with the lowest id (also
//! across zero-cost edges), and among parallel edges the shorter (then the
//! earlier inserted) edge wins.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;

use crate::graph::{Edge, Graph, NodeId};

/// Source and destination are not connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no path from node {from} to node {to}")]
pub struct NoPathError {
    /// Requested start node.
    pub from: NodeId,
    /// Requested destination node.
    pub to: NodeId,
}

/// A minimum-cost path.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// Visited nodes from source to destination inclusive.
    pub nodes: Vec<NodeId>,
    /// Sum of edge costs.
    pub cost: f64,
    /// Sum of physical edge lengths in metres.
    pub length_m: f64,
}

#[derive(Copy, Clone, Debug)]
struct State {
    cost: f64,
    id: NodeId,
    node: NodeIndex,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, then on node id.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

#[derive(Copy, Clone, Debug)]
struct Parent {
    node: NodeIndex,
    id: NodeId,
    edge: EdgeIndex,
    length_m: f64,
}

impl Parent {
    /// Whether `self` should replace `current` on a cost tie.
    fn wins_tie(&self, current: &Self) -> bool {
        self.id
            .cmp(&current.id)
            .then_with(|| self.length_m.total_cmp(&current.length_m))
            .then_with(|| self.edge.cmp(&current.edge))
            == Ordering::Less
    }
}

/// Single-source shortest-path tree grown until a set of targets is settled.
#[derive(Debug)]
pub struct ShortestPathTree<'g> {
    graph: &'g Graph,
    source: NodeId,
    dist: Vec<f64>,
    parent: Vec<Option<Parent>>,
    settled: Vec<bool>,
}

/// Equal-cost predecessors of one node, split by whether their own parent
/// is already fixed.
#[derive(Default)]
struct Candidates {
    resolved: Option<Parent>,
    lowest_waiting: Option<NodeId>,
}

impl<'g> ShortestPathTree<'g> {
    /// Run Dijkstra from `source` until every node in `targets` is settled.
    ///
    /// An empty `targets` slice explores the whole reachable component.
    /// Unknown sources produce a tree in which nothing is reachable.
    pub fn grow<F>(graph: &'g Graph, source: NodeId, targets: &[NodeId], cost: F) -> Self
    where
        F: Fn(&Edge) -> f64,
    {
        let count = graph.node_count();
        let mut tree = Self {
            graph,
            source,
            dist: vec![f64::INFINITY; count],
            parent: vec![None; count],
            settled: vec![false; count],
        };
        let Some(start) = graph.index_of(source) else {
            return tree;
        };
        let mut pending: Vec<NodeIndex> = targets
            .iter()
            .filter_map(|target| graph.index_of(*target))
            .collect();
        pending.sort_unstable();
        pending.dedup();
        let explore_all = pending.is_empty();

        tree.set_dist(start, 0.0);
        let mut heap = BinaryHeap::new();
        heap.push(State {
            cost: 0.0,
            id: source,
            node: start,
        });

        let inner = graph.petgraph();
        // Settled nodes in non-decreasing cost order.
        let mut order: Vec<(NodeIndex, f64)> = Vec::new();
        // Once every target is settled the current cost level is still
        // finished, so equal-cost predecessors reached through zero-cost
        // edges take part in parent selection.
        let mut stop_after: Option<f64> = None;
        while let Some(State { cost: here, node, .. }) = heap.pop() {
            if stop_after.is_some_and(|limit| here > limit) {
                break;
            }
            if tree.is_settled(node) || here > tree.dist_of(node) {
                continue;
            }
            tree.settle(node);
            order.push((node, here));
            if let Ok(pos) = pending.binary_search(&node) {
                pending.remove(pos);
                if pending.is_empty() && !explore_all {
                    stop_after = Some(here);
                }
            }
            for edge_ref in inner.edges(node) {
                let next = edge_ref.target();
                if tree.is_settled(next) {
                    continue;
                }
                let step = cost(edge_ref.weight());
                if !step.is_finite() {
                    continue;
                }
                let candidate = here + step.max(0.0);
                if candidate < tree.dist_of(next) {
                    tree.set_dist(next, candidate);
                    let id = inner.node_weight(next).map_or(edge_ref.weight().to, |n| n.id);
                    heap.push(State {
                        cost: candidate,
                        id,
                        node: next,
                    });
                }
            }
        }

        let mut resolved = vec![false; count];
        if let Some(slot) = resolved.get_mut(start.index()) {
            *slot = true;
        }
        for level in order.chunk_by(|a, b| a.1 == b.1) {
            let nodes: Vec<NodeIndex> = level.iter().map(|(node, _)| *node).collect();
            tree.resolve_level(&nodes, &mut resolved, &cost);
        }
        tree
    }

    /// Fix the parents of every node settled at one cost.
    ///
    /// A node takes its lowest-id equal-cost predecessor. When that
    /// predecessor sits on the same level and has no parent yet, the node
    /// waits for it. Zero-cost cycles that leave every member waiting are
    /// broken by the best already-resolved predecessor, which keeps the
    /// parent links acyclic.
    fn resolve_level<F>(&mut self, level: &[NodeIndex], resolved: &mut [bool], cost: &F)
    where
        F: Fn(&Edge) -> f64,
    {
        let is_resolved = |resolved: &[bool], node: NodeIndex| {
            resolved.get(node.index()).copied().unwrap_or(false)
        };
        let mut waiting: Vec<NodeIndex> = level
            .iter()
            .copied()
            .filter(|node| !is_resolved(resolved, *node))
            .collect();
        while !waiting.is_empty() {
            let mut ready: Vec<(NodeIndex, Parent)> = Vec::new();
            let mut fallback: Option<(NodeIndex, Parent)> = None;
            for &node in &waiting {
                let choice = self.candidates(node, resolved, cost);
                let Some(best) = choice.resolved else {
                    continue;
                };
                if choice.lowest_waiting.is_none_or(|id| best.id < id) {
                    ready.push((node, best));
                } else if fallback.is_none_or(|(_, current)| best.wins_tie(&current)) {
                    fallback = Some((node, best));
                }
            }
            if ready.is_empty() {
                match fallback {
                    Some(choice) => ready.push(choice),
                    None => break,
                }
            }
            for (node, parent) in ready {
                self.set_parent(node, parent);
                if let Some(slot) = resolved.get_mut(node.index()) {
                    *slot = true;
                }
            }
            waiting.retain(|node| !is_resolved(resolved, *node));
        }
    }

    fn candidates<F>(&self, node: NodeIndex, resolved: &[bool], cost: &F) -> Candidates
    where
        F: Fn(&Edge) -> f64,
    {
        let inner = self.graph.petgraph();
        let target = self.dist_of(node);
        let mut found = Candidates::default();
        for edge_ref in inner.edges_directed(node, Direction::Incoming) {
            let tail = edge_ref.source();
            if tail == node || !self.is_settled(tail) {
                continue;
            }
            let step = cost(edge_ref.weight());
            if !step.is_finite() || self.dist_of(tail) + step.max(0.0) != target {
                continue;
            }
            let Some(tail_node) = inner.node_weight(tail) else {
                continue;
            };
            if resolved.get(tail.index()).copied().unwrap_or(false) {
                let parent = Parent {
                    node: tail,
                    id: tail_node.id,
                    edge: edge_ref.id(),
                    length_m: edge_ref.weight().length_m,
                };
                if found
                    .resolved
                    .is_none_or(|current| parent.wins_tie(&current))
                {
                    found.resolved = Some(parent);
                }
            } else if found.lowest_waiting.is_none_or(|id| tail_node.id < id) {
                found.lowest_waiting = Some(tail_node.id);
            }
        }
        found
    }

    /// The source node of this tree.
    #[must_use]
    pub const fn source(&self) -> NodeId {
        self.source
    }

    /// Minimum cost to `target`, or `None` when it was not reached.
    #[must_use]
    pub fn cost_to(&self, target: NodeId) -> Option<f64> {
        let idx = self.graph.index_of(target)?;
        self.is_settled(idx).then(|| self.dist_of(idx))
    }

    /// Reconstruct the path to `target`.
    ///
    /// # Errors
    /// Returns [`NoPathError`] when `target` is unknown or was not reached.
    pub fn path_to(&self, target: NodeId) -> Result<ShortestPath, NoPathError> {
        let no_path = NoPathError {
            from: self.source,
            to: target,
        };
        let idx = self.graph.index_of(target).ok_or(no_path)?;
        if !self.is_settled(idx) {
            return Err(no_path);
        }
        let mut nodes = vec![target];
        let mut length_m = 0.0;
        let mut cursor = idx;
        while let Some(parent) = self.parent_of(cursor) {
            nodes.push(parent.id);
            length_m += parent.length_m;
            cursor = parent.node;
        }
        nodes.reverse();
        Ok(ShortestPath {
            nodes,
            cost: self.dist_of(idx),
            length_m,
        })
    }

    fn dist_of(&self, node: NodeIndex) -> f64 {
        self.dist.get(node.index()).copied().unwrap_or(f64::INFINITY)
    }

    fn set_dist(&mut self, node: NodeIndex, cost: f64) {
        if let Some(slot) = self.dist.get_mut(node.index()) {
            *slot = cost;
        }
    }

    fn parent_of(&self, node: NodeIndex) -> Option<Parent> {
        self.parent.get(node.index()).copied().flatten()
    }

    fn set_parent(&mut self, node: NodeIndex, parent: Parent) {
        if let Some(slot) = self.parent.get_mut(node.index()) {
            *slot = Some(parent);
        }
    }

    fn is_settled(&self, node: NodeIndex) -> bool {
        self.settled.get(node.index()).copied().unwrap_or(false)
    }

    fn settle(&mut self, node: NodeIndex) {
        if let Some(slot) = self.settled.get_mut(node.index()) {
            *slot = true;
        }
    }
}

/// Minimum-cost path from `from` to `to` under `cost`.
///
/// # Errors
/// Returns [`NoPathError`] when either node is unknown or the nodes are not
/// connected.
///
/// # Examples
/// ```
/// use amble_core::{Edge, GraphBuilder, shortest_path};
/// use amble_core::geodesy::coord;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = GraphBuilder::new();
/// builder.add_node(1, coord(0.0, 0.0))?;
/// builder.add_node(2, coord(0.0, 0.001))?;
/// builder.add_bidirectional(Edge::new(1, 2, 111.0))?;
/// let graph = builder.build();
/// let path = shortest_path(&graph, 1, 2, |edge| edge.length_m)?;
/// assert_eq!(path.nodes, vec![1, 2]);
/// assert_eq!(path.length_m, 111.0);
/// # Ok(())
/// # }
/// ```
pub fn shortest_path<F>(
    graph: &Graph,
    from: NodeId,
    to: NodeId,
    cost: F,
) -> Result<ShortestPath, NoPathError>
where
    F: Fn(&Edge) -> f64,
{
    ShortestPathTree::grow(graph, from, &[to], cost).path_to(to)
}
