//! Test-only utilities for `amble-solver-local`.
//!
//! The helpers in this module are available to unit tests and behavioural
//! tests. They are gated behind the `test-support` feature (and `cfg(test)`).

use amble_core::DistanceMatrix;

/// Build a [`DistanceMatrix`] from literal rows.
///
/// # Panics
/// Panics when `rows` is not a valid matrix.
///
/// # Examples
/// ```rust
/// use amble_solver_local::test_support::fixed_matrix;
///
/// let matrix = fixed_matrix(vec![vec![0.0, 2.0], vec![3.0, 0.0]]);
/// assert_eq!(matrix.cost(1, 0), 3.0);
/// ```
#[must_use]
pub fn fixed_matrix(rows: Vec<Vec<f64>>) -> DistanceMatrix {
    match DistanceMatrix::from_rows(rows) {
        Ok(matrix) => matrix,
        Err(err) => panic!("fixture matrix is invalid: {err}"),
    }
}

/// Symmetric matrix of straight-line distances between planar points.
///
/// # Panics
/// Panics when a coordinate is not finite.
///
/// # Examples
/// ```rust
/// use amble_solver_local::test_support::planar_matrix;
///
/// let matrix = planar_matrix(&[(0.0, 0.0), (3.0, 4.0)]);
/// assert_eq!(matrix.cost(0, 1), 5.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "fixture distances are Euclidean norms"
)]
pub fn planar_matrix(points: &[(f64, f64)]) -> DistanceMatrix {
    let rows = points
        .iter()
        .map(|(ax, ay)| {
            points
                .iter()
                .map(|(bx, by)| (ax - bx).hypot(ay - by))
                .collect()
        })
        .collect();
    fixed_matrix(rows)
}

/// Matrix where every arc between distinct waypoints costs `cost`.
///
/// # Panics
/// Panics when `cost` is negative or not finite.
#[must_use]
pub fn uniform_matrix(size: usize, cost: f64) -> DistanceMatrix {
    let rows = (0..size)
        .map(|from| {
            (0..size)
                .map(|to| if from == to { 0.0 } else { cost })
                .collect()
        })
        .collect();
    fixed_matrix(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn planar_matrix_has_zero_diagonal() {
        let matrix = planar_matrix(&[(0.0, 0.0), (1.0, 1.0), (2.0, 5.0)]);
        assert_eq!(matrix.size(), 3);
        for index in 0..3 {
            assert_eq!(matrix.get(index, index), Some(0.0));
        }
    }

    #[rstest]
    fn uniform_matrix_prices_every_arc_equally() {
        let matrix = uniform_matrix(3, 7.0);
        assert_eq!(matrix.get(0, 2), Some(7.0));
        assert_eq!(matrix.get(2, 1), Some(7.0));
        assert_eq!(matrix.get(1, 1), Some(0.0));
    }

    #[rstest]
    #[should_panic(expected = "fixture matrix is invalid")]
    fn fixed_matrix_rejects_jagged_rows() {
        let _ = fixed_matrix(vec![vec![0.0, 1.0], vec![1.0]]);
    }
}
