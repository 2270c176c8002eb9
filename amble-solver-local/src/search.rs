//! Tour construction and improvement moves over an open path.

use std::time::Instant;

use amble_core::DistanceMatrix;

/// Smallest cost reduction treated as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Sum of consecutive arc costs along `order`, without a closing arc.
pub(crate) fn open_path_cost(matrix: &DistanceMatrix, order: &[usize]) -> f64 {
    order
        .windows(2)
        .filter_map(|pair| match *pair {
            [from, to] => Some(matrix.cost(from, to)),
            _ => None,
        })
        .sum()
}

/// Greedy tour from waypoint 0: always walk to the cheapest unvisited
/// waypoint, preferring the lower index on equal cost.
pub(crate) fn cheapest_arc(matrix: &DistanceMatrix) -> Vec<usize> {
    let size = matrix.size();
    let mut order = Vec::with_capacity(size);
    if size == 0 {
        return order;
    }
    let mut visited = vec![false; size];
    let mut current = 0;
    loop {
        if let Some(slot) = visited.get_mut(current) {
            *slot = true;
        }
        order.push(current);
        let next = (0..size)
            .filter(|candidate| !visited.get(*candidate).copied().unwrap_or(true))
            .min_by(|lhs, rhs| {
                matrix
                    .cost(current, *lhs)
                    .total_cmp(&matrix.cost(current, *rhs))
                    .then_with(|| lhs.cmp(rhs))
            });
        match next {
            Some(chosen) => current = chosen,
            None => return order,
        }
    }
}

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// No move improves the tour.
    Converged,
    /// The pass limit was reached while moves were still improving.
    PassLimit,
    /// The deadline passed before the search converged.
    BudgetExpired,
}

enum Step {
    Improved,
    Stable,
    Expired,
}

/// First-improvement local search holding the best tour found so far.
#[derive(Debug)]
pub(crate) struct LocalSearch<'m> {
    matrix: &'m DistanceMatrix,
    order: Vec<usize>,
    cost: f64,
    passes: usize,
}

impl<'m> LocalSearch<'m> {
    pub(crate) fn new(matrix: &'m DistanceMatrix, order: Vec<usize>) -> Self {
        let cost = open_path_cost(matrix, &order);
        Self {
            matrix,
            order,
            cost,
            passes: 0,
        }
    }

    pub(crate) const fn cost(&self) -> f64 {
        self.cost
    }

    pub(crate) const fn passes(&self) -> usize {
        self.passes
    }

    pub(crate) fn into_order(self) -> Vec<usize> {
        self.order
    }

    /// Apply improving moves until none remain, `max_passes` moves have been
    /// taken or `deadline` passes.
    pub(crate) fn run(&mut self, deadline: Option<Instant>, max_passes: usize) -> Outcome {
        while self.passes < max_passes {
            match self.pass(deadline) {
                Step::Improved => self.passes += 1,
                Step::Stable => return Outcome::Converged,
                Step::Expired => return Outcome::BudgetExpired,
            }
        }
        Outcome::PassLimit
    }

    // A pass stops at the first improving move; index 0 never moves.
    fn pass(&mut self, deadline: Option<Instant>) -> Step {
        let len = self.order.len();
        for start in 1..len {
            if expired(deadline) {
                return Step::Expired;
            }
            for end in (start + 1)..len {
                let mut candidate = self.order.clone();
                if let Some(segment) = candidate.get_mut(start..=end) {
                    segment.reverse();
                }
                if self.accept(candidate) {
                    return Step::Improved;
                }
            }
        }
        for from in 1..len {
            if expired(deadline) {
                return Step::Expired;
            }
            for to in (1..len).filter(|to| *to != from) {
                let mut candidate = self.order.clone();
                let waypoint = candidate.remove(from);
                candidate.insert(to, waypoint);
                if self.accept(candidate) {
                    return Step::Improved;
                }
            }
        }
        Step::Stable
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "improvements are measured against a small tolerance"
    )]
    fn accept(&mut self, candidate: Vec<usize>) -> bool {
        let cost = open_path_cost(self.matrix, &candidate);
        if cost < self.cost - IMPROVEMENT_EPSILON {
            log::debug!("local search improved open path cost to {cost:.3}");
            self.order = candidate;
            self.cost = cost;
            return true;
        }
        false
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|limit| Instant::now() >= limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::test_support::{fixed_matrix, planar_matrix};

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "cost assertions use a tolerance")]
    fn open_path_cost_has_no_closing_arc() {
        let matrix = fixed_matrix(vec![
            vec![0.0, 1.0, 50.0],
            vec![1.0, 0.0, 2.0],
            vec![50.0, 2.0, 0.0],
        ]);
        assert!((open_path_cost(&matrix, &[0, 1, 2]) - 3.0).abs() < 1e-12);
    }

    #[rstest]
    fn cheapest_arc_follows_nearest_neighbour() {
        let matrix = planar_matrix(&[(0.0, 0.0), (3.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(cheapest_arc(&matrix), vec![0, 2, 3, 1]);
    }

    #[rstest]
    fn cheapest_arc_breaks_ties_by_lower_index() {
        let matrix = fixed_matrix(vec![
            vec![0.0, 5.0, 5.0],
            vec![5.0, 0.0, 1.0],
            vec![5.0, 1.0, 0.0],
        ]);
        assert_eq!(cheapest_arc(&matrix), vec![0, 1, 2]);
    }

    #[rstest]
    fn cheapest_arc_of_empty_matrix_is_empty() {
        let matrix = fixed_matrix(Vec::new());
        assert!(cheapest_arc(&matrix).is_empty());
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "cost assertions use a tolerance")]
    fn search_repairs_a_crossed_tour() {
        let matrix = planar_matrix(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let mut search = LocalSearch::new(&matrix, vec![0, 3, 1, 2]);
        let outcome = search.run(None, 100);
        assert_eq!(outcome, Outcome::Converged);
        assert!((search.cost() - 3.0).abs() < 1e-9);
        assert_eq!(search.into_order(), vec![0, 1, 2, 3]);
    }

    #[rstest]
    fn search_respects_pass_limit() {
        let matrix = planar_matrix(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let mut search = LocalSearch::new(&matrix, vec![0, 3, 2, 1]);
        assert_eq!(search.run(None, 0), Outcome::PassLimit);
        assert_eq!(search.passes(), 0);
        assert_eq!(search.into_order(), vec![0, 3, 2, 1]);
    }

    #[rstest]
    fn search_stops_at_a_past_deadline() {
        let matrix = planar_matrix(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut search = LocalSearch::new(&matrix, vec![0, 2, 1]);
        assert_eq!(search.run(Some(Instant::now()), 100), Outcome::BudgetExpired);
        assert_eq!(search.into_order(), vec![0, 2, 1]);
    }
}
