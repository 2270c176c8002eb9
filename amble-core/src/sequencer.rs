//! Waypoint ordering contract.
//!
//! A [`Sequencer`] turns a [`DistanceMatrix`] into an open-path visiting
//! order that starts at waypoint 0 and visits every waypoint exactly once.
//! Implementations may be exact or heuristic, provided they return a full
//! permutation within the supplied time budget.

use std::time::Duration;

use thiserror::Error;

use crate::matrix::DistanceMatrix;

/// A [`RouteOrder`] could not be built from the supplied indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteOrderError {
    /// The order was empty.
    #[error("route order is empty")]
    Empty,
    /// The first index was not 0.
    #[error("route order must start at waypoint 0, found {first}")]
    WrongStart {
        /// The index found first.
        first: usize,
    },
    /// An index was repeated or out of range.
    #[error("route order is not a permutation of 0..{len}: index {index} is invalid or repeated")]
    NotPermutation {
        /// Expected length.
        len: usize,
        /// The offending index.
        index: usize,
    },
}

/// No visiting order could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no solution: {reason}")]
pub struct NoSolutionError {
    /// Why the sequencer gave up.
    pub reason: String,
}

impl NoSolutionError {
    /// Create an error with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<RouteOrderError> for NoSolutionError {
    fn from(err: RouteOrderError) -> Self {
        Self::new(err.to_string())
    }
}

/// A permutation of waypoint indices starting at 0.
///
/// # Examples
/// ```
/// use amble_core::RouteOrder;
///
/// let order = RouteOrder::new(vec![0, 2, 1]).expect("valid permutation");
/// assert_eq!(order.legs().collect::<Vec<_>>(), vec![(0, 2), (2, 1)]);
/// assert!(RouteOrder::new(vec![1, 0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct RouteOrder(Vec<usize>);

impl RouteOrder {
    /// Validate and wrap a visiting order.
    ///
    /// # Errors
    /// Returns [`RouteOrderError`] when `indices` is empty, does not start at
    /// 0, or is not a permutation of `0..indices.len()`.
    pub fn new(indices: Vec<usize>) -> Result<Self, RouteOrderError> {
        let len = indices.len();
        match indices.first() {
            None => return Err(RouteOrderError::Empty),
            Some(&first) if first != 0 => return Err(RouteOrderError::WrongStart { first }),
            Some(_) => {}
        }
        let mut seen = vec![false; len];
        for &index in &indices {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(RouteOrderError::NotPermutation { len, index }),
            }
        }
        Ok(Self(indices))
    }

    /// The identity order `0, 1, ..., len - 1`.
    ///
    /// # Errors
    /// Returns [`RouteOrderError::Empty`] when `len` is zero.
    pub fn identity(len: usize) -> Result<Self, RouteOrderError> {
        Self::new((0..len).collect())
    }

    /// Indices in visiting order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a valid order holds at least one index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consecutive `(from, to)` pairs.
    pub fn legs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).filter_map(|pair| match pair {
            [from, to] => Some((*from, *to)),
            _ => None,
        })
    }

    /// Sum of matrix costs along the open path.
    #[must_use]
    pub fn total_cost(&self, matrix: &DistanceMatrix) -> f64 {
        self.legs().map(|(from, to)| matrix.cost(from, to)).sum()
    }

    /// Unwrap the indices.
    #[must_use]
    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

/// Find an open-path visiting order over a cost matrix.
///
/// Implementations must:
/// - return a permutation of `0..matrix.size()` starting at 0;
/// - return the best order found when `budget` elapses rather than failing;
/// - break ties between equal-cost choices towards the lower index so that
///   results are reproducible;
/// - be `Send + Sync` so one instance can serve concurrent requests.
pub trait Sequencer: Send + Sync {
    /// Order the waypoints of `matrix`.
    ///
    /// # Errors
    /// Returns [`NoSolutionError`] only when no permutation can be built,
    /// for example when the matrix is empty.
    fn sequence(
        &self,
        matrix: &DistanceMatrix,
        budget: Duration,
    ) -> Result<RouteOrder, NoSolutionError>;
}

/// Visits waypoints in the order the caller listed them.
///
/// Useful as a baseline and for callers that have already ordered their
/// waypoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputOrderSequencer;

impl Sequencer for InputOrderSequencer {
    fn sequence(
        &self,
        matrix: &DistanceMatrix,
        _budget: Duration,
    ) -> Result<RouteOrder, NoSolutionError> {
        Ok(RouteOrder::identity(matrix.size())?)
    }
}
