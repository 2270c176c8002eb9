//! Waypoint-to-waypoint cost matrix.

use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

use crate::cost::CostModel;
use crate::graph::{Graph, NodeId};
use crate::shortest_path::ShortestPathTree;
use crate::weights::PreferenceWeights;

/// Cost recorded for an ordered pair with no connecting path.
///
/// Large and finite so sequencers can compare and sum it without special
/// cases.
pub const UNREACHABLE_COST: f64 = 1_000_000.0;

/// Errors raised by [`DistanceMatrix::from_rows`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// A row length differs from the number of rows.
    #[error("row {row} has {len} entries; expected {expected}")]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Number of rows.
        expected: usize,
    },
    /// An entry is negative or non-finite.
    #[error("entry ({row}, {col}) is {value}; costs must be finite and non-negative")]
    InvalidCost {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The rejected value.
        value: f64,
    },
    /// A diagonal entry is not zero.
    #[error("diagonal entry {index} is {value}; expected 0")]
    NonZeroDiagonal {
        /// Diagonal index.
        index: usize,
        /// The rejected value.
        value: f64,
    },
}

/// Square, row-major matrix of non-negative travel costs.
///
/// Entry `(i, j)` is the minimum cost from waypoint `i` to waypoint `j`, or
/// [`UNREACHABLE_COST`]. The diagonal is zero. The matrix is not assumed to
/// be symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    /// Build a matrix from explicit rows.
    ///
    /// # Errors
    /// Returns [`MatrixError`] when the rows are not square, an entry is
    /// negative or non-finite, or the diagonal is not zero.
    ///
    /// # Examples
    /// ```
    /// use amble_core::DistanceMatrix;
    ///
    /// let matrix = DistanceMatrix::from_rows(vec![vec![0.0, 3.0], vec![4.0, 0.0]])
    ///     .expect("valid matrix");
    /// assert_eq!(matrix.get(1, 0), Some(4.0));
    /// ```
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(MatrixError::InvalidCost { row, col, value });
                }
                if row == col && value != 0.0 {
                    return Err(MatrixError::NonZeroDiagonal { index: row, value });
                }
                cells.push(value);
            }
        }
        Ok(Self { size, cells })
    }

    /// Number of waypoints.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Return `true` for a zero-sized matrix.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Entry `(from, to)`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.cells.get(from * self.size + to).copied()
    }

    /// Entry `(from, to)`, treating out-of-bounds pairs as unreachable.
    #[must_use]
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.get(from, to).unwrap_or(UNREACHABLE_COST)
    }

    /// Return `true` when `(from, to)` holds the unreachable sentinel.
    #[must_use]
    pub fn is_unreachable(&self, from: usize, to: usize) -> bool {
        self.cost(from, to) >= UNREACHABLE_COST
    }

    /// Number of off-diagonal pairs with no connecting path.
    #[must_use]
    pub fn unreachable_pairs(&self) -> usize {
        (0..self.size)
            .flat_map(|from| (0..self.size).map(move |to| (from, to)))
            .filter(|(from, to)| from != to && self.is_unreachable(*from, *to))
            .count()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.cells.chunks(self.size.max(1))
    }
}

/// Build the cost matrix between `waypoints` under `model` and `weights`.
///
/// One shortest-path tree is grown per source, in parallel. Pairs with no
/// path receive [`UNREACHABLE_COST`]; the diagonal is fixed at zero.
///
/// # Examples
/// ```
/// use amble_core::{CostModel, Edge, GraphBuilder, PreferenceWeights, build_matrix};
/// use amble_core::geodesy::coord;
///
/// # fn main() -> Result<(), amble_core::GraphError> {
/// let mut builder = GraphBuilder::new();
/// builder.add_node(1, coord(0.0, 0.0))?;
/// builder.add_node(2, coord(0.0, 0.001))?;
/// builder.add_node(3, coord(1.0, 1.0))?;
/// builder.add_bidirectional(Edge::new(1, 2, 111.0))?;
/// let graph = builder.build();
/// let matrix = build_matrix(
///     &graph,
///     &[1, 2, 3],
///     &CostModel::default(),
///     &PreferenceWeights::NEUTRAL,
/// );
/// assert_eq!(matrix.get(0, 1), Some(111.0));
/// assert!(matrix.is_unreachable(0, 2));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn build_matrix(
    graph: &Graph,
    waypoints: &[NodeId],
    model: &CostModel,
    weights: &PreferenceWeights,
) -> DistanceMatrix {
    let started = Instant::now();
    let size = waypoints.len();
    let rows: Vec<Vec<f64>> = waypoints
        .par_iter()
        .enumerate()
        .map(|(from_idx, from)| {
            let tree = ShortestPathTree::grow(graph, *from, waypoints, |edge| {
                model.cost(edge, weights)
            });
            waypoints
                .iter()
                .enumerate()
                .map(|(to_idx, to)| {
                    if from_idx == to_idx {
                        return 0.0;
                    }
                    tree.cost_to(*to).unwrap_or_else(|| {
                        log::debug!("no path from node {from} to node {to}; using sentinel");
                        UNREACHABLE_COST
                    })
                })
                .collect()
        })
        .collect();
    let matrix = DistanceMatrix {
        size,
        cells: rows.into_iter().flatten().collect(),
    };
    log::debug!(
        "built {size}x{size} cost matrix in {:?} ({} unreachable pairs)",
        started.elapsed(),
        matrix.unreachable_pairs()
    );
    matrix
}
