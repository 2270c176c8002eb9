//! Route assembly and comparison metrics.

use std::fmt;

use geo::Coord;
use thiserror::Error;

use crate::cost::CostModel;
use crate::geodesy::polyline_length_m;
use crate::graph::{Graph, NodeId};
use crate::sequencer::RouteOrder;
use crate::shortest_path::{ShortestPath, shortest_path};
use crate::weights::PreferenceWeights;

/// Percentage points of green gain per unit of green weight.
pub const GREEN_GAIN_PER_WEIGHT: f64 = 15.0;
/// Percentage points of social gain per unit of social weight.
pub const SOCIAL_GAIN_PER_WEIGHT: f64 = 12.0;
/// Percentage points of quiet gain per unit of quiet weight.
pub const QUIET_GAIN_PER_WEIGHT: f64 = 10.0;
/// Upper bound of every gain.
pub const MAX_GAIN: f64 = 100.0;

/// A percentage rendered with an explicit sign and one decimal place,
/// e.g. `+12.5%` or `-3.0%`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SignedPercent(f64);

impl SignedPercent {
    /// Wrap a percentage value. Non-finite input becomes zero.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value)
        } else {
            Self(0.0)
        }
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SignedPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Rounds first so that -0.04 renders as +0.0%.
        let rounded = (self.0 * 10.0).round() / 10.0;
        if rounded < 0.0 {
            write!(f, "{rounded:.1}%")
        } else {
            write!(f, "+{:.1}%", rounded.abs())
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SignedPercent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How the optimised route compares with visiting waypoints in input order.
///
/// The gains are heuristic estimates derived from the preference weights,
/// `min(100, weight * scalar)`. They do not measure the edges actually
/// traversed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comparison {
    /// Relative change of optimised distance against the baseline.
    pub distance_diff: SignedPercent,
    /// Estimated green preference satisfaction.
    pub green_gain: SignedPercent,
    /// Estimated social preference satisfaction.
    pub social_gain: SignedPercent,
    /// Estimated quiet preference satisfaction.
    pub quiet_gain: SignedPercent,
}

impl Comparison {
    /// Compute the comparison for an optimised and a baseline distance.
    ///
    /// A zero baseline yields a zero distance difference.
    ///
    /// # Examples
    /// ```
    /// use amble_core::{Comparison, PreferenceWeights};
    ///
    /// let weights = PreferenceWeights::new(2.0, 0.0, 10.0).expect("valid");
    /// let comparison = Comparison::new(1_100.0, 1_000.0, &weights);
    /// assert_eq!(comparison.distance_diff.to_string(), "+10.0%");
    /// assert_eq!(comparison.green_gain.to_string(), "+30.0%");
    /// assert_eq!(comparison.social_gain.to_string(), "+0.0%");
    /// assert_eq!(comparison.quiet_gain.to_string(), "+100.0%");
    /// ```
    #[must_use]
    pub fn new(optimized_m: f64, baseline_m: f64, weights: &PreferenceWeights) -> Self {
        let diff = if baseline_m > 0.0 {
            (optimized_m - baseline_m) / baseline_m * 100.0
        } else {
            0.0
        };
        Self {
            distance_diff: SignedPercent::new(diff),
            green_gain: gain(weights.green, GREEN_GAIN_PER_WEIGHT),
            social_gain: gain(weights.social, SOCIAL_GAIN_PER_WEIGHT),
            quiet_gain: gain(weights.quiet, QUIET_GAIN_PER_WEIGHT),
        }
    }
}

fn gain(weight: f64, per_weight: f64) -> SignedPercent {
    SignedPercent::new((weight.max(0.0) * per_weight).min(MAX_GAIN))
}

/// Ordered route geometry; serialises as `[[lat, lng], ...]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutePath(Vec<Coord<f64>>);

impl RoutePath {
    /// Wrap coordinates (`x` = longitude, `y` = latitude).
    #[must_use]
    pub const fn new(points: Vec<Coord<f64>>) -> Self {
        Self(points)
    }

    /// Points in travel order.
    #[must_use]
    pub fn points(&self) -> &[Coord<f64>] {
        &self.0
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when the path has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Great-circle length in metres.
    #[must_use]
    pub fn length_m(&self) -> f64 {
        polyline_length_m(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RoutePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for point in &self.0 {
            seq.serialize_element(&[point.y, point.x])?;
        }
        seq.end()
    }
}

/// An assembled, measured route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteResult {
    /// Waypoint visiting order.
    pub order: RouteOrder,
    /// Concatenated leg geometry.
    pub path: RoutePath,
    /// Great-circle length of [`path`](Self::path) in metres.
    pub distance: f64,
    /// Great-circle length of the input-order route using plain lengths.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub baseline_distance: f64,
    /// Distance change and preference gains.
    pub comparison: Comparison,
    /// Set when the route is longer than the configured maximum.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_false"))]
    pub exceeds_max_distance: bool,
}

#[cfg(feature = "serde")]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Route geometry could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Two consecutive waypoints in the chosen order are not connected.
    #[error("waypoints {from_index} and {to_index} are not connected (nodes {from} -> {to})")]
    DisconnectedLeg {
        /// Index of the leg start in the caller's waypoint list.
        from_index: usize,
        /// Index of the leg end in the caller's waypoint list.
        to_index: usize,
        /// Network node of the leg start.
        from: NodeId,
        /// Network node of the leg end.
        to: NodeId,
    },
    /// The order references more waypoints than were resolved.
    #[error("route order has {order_len} entries but {nodes} waypoint nodes were supplied")]
    OrderMismatch {
        /// Length of the order.
        order_len: usize,
        /// Number of waypoint nodes.
        nodes: usize,
    },
}

/// Stitches per-leg shortest paths into a single route.
#[derive(Debug)]
pub struct RouteAssembler<'a> {
    graph: &'a Graph,
    model: &'a CostModel,
    weights: &'a PreferenceWeights,
    max_distance_m: Option<f64>,
}

impl<'a> RouteAssembler<'a> {
    /// Assemble routes on `graph` under `model` and `weights`.
    #[must_use]
    pub const fn new(graph: &'a Graph, model: &'a CostModel, weights: &'a PreferenceWeights) -> Self {
        Self {
            graph,
            model,
            weights,
            max_distance_m: None,
        }
    }

    /// Flag routes longer than `max_distance_m`.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance_m: Option<f64>) -> Self {
        self.max_distance_m = max_distance_m;
        self
    }

    /// Build the route visiting `nodes` in `order`.
    ///
    /// `nodes[i]` is the network node of waypoint `i`. Junction nodes shared
    /// by consecutive legs appear once in the path.
    ///
    /// # Errors
    /// Returns [`AssemblyError::DisconnectedLeg`] when a leg has no path and
    /// [`AssemblyError::OrderMismatch`] when `order` and `nodes` disagree.
    pub fn assemble(
        &self,
        order: RouteOrder,
        nodes: &[NodeId],
    ) -> Result<RouteResult, AssemblyError> {
        if order.len() != nodes.len() {
            return Err(AssemblyError::OrderMismatch {
                order_len: order.len(),
                nodes: nodes.len(),
            });
        }
        let mut route_nodes: Vec<NodeId> = Vec::new();
        if let Some(first) = order.as_slice().first().and_then(|i| nodes.get(*i)) {
            route_nodes.push(*first);
        }
        for (from_index, to_index) in order.legs() {
            let leg = self.leg(from_index, to_index, nodes)?;
            // The leg starts at the node that ended the previous one.
            route_nodes.extend(leg.nodes.into_iter().skip(1));
        }
        let path = self.path_of(&route_nodes);
        let distance = path.length_m();
        let baseline_distance = self.baseline_distance(nodes);
        let exceeds_max_distance = self.max_distance_m.is_some_and(|max| distance > max);
        if exceeds_max_distance {
            log::info!(
                "route of {distance:.0} m exceeds the configured maximum of {:.0} m",
                self.max_distance_m.unwrap_or_default()
            );
        }
        Ok(RouteResult {
            order,
            path,
            distance,
            baseline_distance,
            comparison: Comparison::new(distance, baseline_distance, self.weights),
            exceeds_max_distance,
        })
    }

    fn leg(
        &self,
        from_index: usize,
        to_index: usize,
        nodes: &[NodeId],
    ) -> Result<ShortestPath, AssemblyError> {
        let mismatch = AssemblyError::OrderMismatch {
            order_len: from_index.max(to_index) + 1,
            nodes: nodes.len(),
        };
        let from = *nodes.get(from_index).ok_or_else(|| mismatch.clone())?;
        let to = *nodes.get(to_index).ok_or(mismatch)?;
        shortest_path(self.graph, from, to, |edge| {
            self.model.cost(edge, self.weights)
        })
        .map_err(|_| AssemblyError::DisconnectedLeg {
            from_index,
            to_index,
            from,
            to,
        })
    }

    fn path_of(&self, nodes: &[NodeId]) -> RoutePath {
        RoutePath::new(
            nodes
                .iter()
                .filter_map(|id| self.graph.node(*id).map(|node| node.location))
                .collect(),
        )
    }

    /// Great-circle length of the input-order route under plain lengths.
    ///
    /// Unreachable legs are skipped.
    fn baseline_distance(&self, nodes: &[NodeId]) -> f64 {
        nodes
            .windows(2)
            .filter_map(|pair| match pair {
                [from, to] => Some((*from, *to)),
                _ => None,
            })
            .filter_map(|(from, to)| {
                shortest_path(self.graph, from, to, |edge| edge.length_m)
                    .map_err(|err| log::warn!("baseline leg skipped: {err}"))
                    .ok()
            })
            .map(|leg| self.path_of(&leg.nodes).length_m())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{grid_graph, line_graph, two_component_graph};
    use rstest::rstest;

    #[rstest]
    #[case(12.345, "+12.3%")]
    #[case(-3.0, "-3.0%")]
    #[case(0.0, "+0.0%")]
    #[case(-0.04, "+0.0%")]
    #[case(f64::NAN, "+0.0%")]
    fn formats_signed_percent(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(SignedPercent::new(value).to_string(), expected);
    }

    #[rstest]
    fn zero_weights_give_zero_gains() {
        let comparison = Comparison::new(10.0, 10.0, &PreferenceWeights::NEUTRAL);
        for gain in [
            comparison.green_gain,
            comparison.social_gain,
            comparison.quiet_gain,
        ] {
            assert_eq!(gain.to_string(), "+0.0%");
        }
    }

    #[rstest]
    #[case(10.0)]
    #[case(7.5)]
    fn gains_are_capped(#[case] weight: f64) {
        let weights = PreferenceWeights::new(weight, weight, weight).expect("valid");
        let comparison = Comparison::new(1.0, 1.0, &weights);
        assert!(comparison.green_gain.value() <= MAX_GAIN);
        assert!(comparison.social_gain.value() <= MAX_GAIN);
        assert!(comparison.quiet_gain.value() <= MAX_GAIN);
    }

    #[rstest]
    fn zero_baseline_has_zero_diff() {
        let comparison = Comparison::new(50.0, 0.0, &PreferenceWeights::NEUTRAL);
        assert_eq!(comparison.distance_diff.to_string(), "+0.0%");
    }

    #[rstest]
    fn concatenates_legs_without_repeating_junctions() {
        let graph = line_graph(5, 10.0);
        let model = CostModel::length_only();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::new(vec![0, 1, 2]).expect("valid");
        let route = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1, 3, 5])
            .expect("connected");
        assert_eq!(route.path.len(), 5);
        let direct = graph.node(1).map(|n| n.location).expect("node 1");
        let far = graph.node(5).map(|n| n.location).expect("node 5");
        let straight = crate::geodesy::great_circle_m(direct, far);
        assert!((route.distance - straight).abs() < 1e-6);
    }

    #[rstest]
    fn baseline_follows_input_order() {
        let graph = line_graph(3, 10.0);
        let model = CostModel::length_only();
        let weights = PreferenceWeights::NEUTRAL;
        // Input order 1, 3, 2 walks to the end and back.
        let order = RouteOrder::new(vec![0, 2, 1]).expect("valid");
        let route = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1, 3, 2])
            .expect("connected");
        assert!(route.distance < route.baseline_distance);
        assert!(route.comparison.distance_diff.value() < 0.0);
    }

    #[rstest]
    fn single_waypoint_is_single_point() {
        let graph = grid_graph(2, 2, 50.0);
        let model = CostModel::default();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::identity(1).expect("valid");
        let route = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1])
            .expect("trivial");
        assert_eq!(route.path.len(), 1);
        assert!(route.distance.abs() < f64::EPSILON);
    }

    #[rstest]
    fn disconnected_leg_is_reported() {
        let graph = two_component_graph();
        let model = CostModel::default();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::new(vec![0, 1]).expect("valid");
        let err = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1, 101])
            .expect_err("disconnected");
        assert_eq!(
            err,
            AssemblyError::DisconnectedLeg {
                from_index: 0,
                to_index: 1,
                from: 1,
                to: 101,
            }
        );
    }

    #[rstest]
    fn order_must_match_nodes() {
        let graph = line_graph(3, 10.0);
        let model = CostModel::default();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::identity(3).expect("valid");
        let err = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1, 2])
            .expect_err("mismatch");
        assert!(matches!(err, AssemblyError::OrderMismatch { .. }));
    }

    #[rstest]
    #[case(Some(5.0), true)]
    #[case(Some(1_000.0), false)]
    #[case(None, false)]
    fn flags_long_routes(#[case] max: Option<f64>, #[case] expected: bool) {
        let graph = line_graph(3, 10.0);
        let model = CostModel::length_only();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::identity(2).expect("valid");
        let route = RouteAssembler::new(&graph, &model, &weights)
            .with_max_distance(max)
            .assemble(order, &[1, 3])
            .expect("connected");
        assert_eq!(route.exceeds_max_distance, expected);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialises_path_as_lat_lng_pairs() {
        let graph = line_graph(2, 10.0);
        let model = CostModel::length_only();
        let weights = PreferenceWeights::NEUTRAL;
        let order = RouteOrder::identity(2).expect("valid");
        let route = RouteAssembler::new(&graph, &model, &weights)
            .assemble(order, &[1, 2])
            .expect("connected");
        let json = serde_json::to_value(&route).expect("serialise");
        assert_eq!(json["order"], serde_json::json!([0, 1]));
        let first = &json["path"][0];
        let node = graph.node(1).expect("node 1");
        assert_eq!(first[0].as_f64(), Some(node.lat()));
        assert_eq!(first[1].as_f64(), Some(node.lng()));
        assert!(json["comparison"]["distance_diff"].is_string());
        assert!(json.get("exceeds_max_distance").is_none());
    }
}
