//! Property-based tests for `LocalSearchSequencer`.
//!
//! # Invariants tested
//!
//! - **Permutation:** the order starts at 0 and visits every waypoint once.
//! - **No regression:** the result never costs more than the greedy tour.
//! - **Determinism:** identical matrices give identical orders.

use std::time::Duration;

use amble_core::{DistanceMatrix, RouteOrder, Sequencer, UNREACHABLE_COST};
use amble_solver_local::LocalSearchSequencer;
use amble_solver_local::test_support::fixed_matrix;
use proptest::prelude::*;

const BUDGET: Duration = Duration::from_secs(5);

/// Square matrices with a zero diagonal, occasionally using the sentinel.
fn matrix_strategy() -> impl Strategy<Value = DistanceMatrix> {
    (1_usize..9).prop_flat_map(|size| {
        let cell = prop_oneof![
            8 => 0.0..500.0_f64,
            1 => Just(UNREACHABLE_COST),
        ];
        proptest::collection::vec(proptest::collection::vec(cell, size), size).prop_map(
            |mut rows| {
                for (index, row) in rows.iter_mut().enumerate() {
                    if let Some(diagonal) = row.get_mut(index) {
                        *diagonal = 0.0;
                    }
                }
                fixed_matrix(rows)
            },
        )
    })
}

/// Greedy nearest-neighbour order, recomputed independently of the crate.
fn greedy_order(matrix: &DistanceMatrix) -> RouteOrder {
    let mut order = vec![0];
    let mut remaining: Vec<usize> = (1..matrix.size()).collect();
    while !remaining.is_empty() {
        let current = order.last().copied().unwrap_or(0);
        let (position, next) = remaining
            .iter()
            .copied()
            .enumerate()
            .min_by(|(_, lhs), (_, rhs)| {
                matrix
                    .cost(current, *lhs)
                    .total_cmp(&matrix.cost(current, *rhs))
                    .then_with(|| lhs.cmp(rhs))
            })
            .unwrap_or((0, 0));
        remaining.remove(position);
        order.push(next);
    }
    RouteOrder::new(order).unwrap_or_else(|err| panic!("greedy order is invalid: {err}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: the result is a permutation starting at 0.
    #[test]
    fn order_is_a_full_permutation(matrix in matrix_strategy()) {
        let order = LocalSearchSequencer::new()
            .sequence(&matrix, BUDGET)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(order.len(), matrix.size());
        prop_assert_eq!(order.as_slice().first().copied(), Some(0));
        let mut seen = order.as_slice().to_vec();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..matrix.size()).collect::<Vec<_>>());
    }

    /// Property: local search never makes the greedy tour worse.
    #[test]
    fn search_never_exceeds_greedy_cost(matrix in matrix_strategy()) {
        let order = LocalSearchSequencer::new()
            .sequence(&matrix, BUDGET)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let greedy = greedy_order(&matrix);
        prop_assert!(order.total_cost(&matrix) <= greedy.total_cost(&matrix));
    }

    /// Property: two runs on the same matrix agree.
    #[test]
    fn sequencing_is_deterministic(matrix in matrix_strategy()) {
        let sequencer = LocalSearchSequencer::new();
        let first = sequencer
            .sequence(&matrix, BUDGET)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let second = sequencer
            .sequence(&matrix, BUDGET)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(first, second);
    }
}
