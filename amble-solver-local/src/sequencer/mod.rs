//! `LocalSearchSequencer` implementation.

use std::time::{Duration, Instant};

use amble_core::{DistanceMatrix, NoSolutionError, RouteOrder, Sequencer};

use crate::search::{LocalSearch, Outcome, cheapest_arc};

/// Configuration for [`LocalSearchSequencer`].
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    /// Upper bound on search time. The shorter of this and the budget passed
    /// to [`Sequencer::sequence`] applies.
    pub time_budget: Option<Duration>,
    /// Upper bound on improving moves taken before the search stops.
    pub max_passes: usize,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            time_budget: None,
            max_passes: 10_000,
        }
    }
}

/// Path-cheapest-arc construction refined by 2-opt and relocate moves.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use amble_core::{DistanceMatrix, Sequencer};
/// use amble_solver_local::LocalSearchSequencer;
///
/// let matrix = DistanceMatrix::from_rows(vec![
///     vec![0.0, 9.0, 1.0],
///     vec![9.0, 0.0, 1.0],
///     vec![1.0, 1.0, 0.0],
/// ])
/// .expect("square matrix");
/// let order = LocalSearchSequencer::default()
///     .sequence(&matrix, Duration::from_secs(1))
///     .expect("non-empty matrix");
/// assert_eq!(order.as_slice(), &[0, 2, 1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalSearchSequencer {
    config: LocalSearchConfig,
}

impl LocalSearchSequencer {
    /// Construct a sequencer using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a sequencer with explicit configuration.
    #[must_use]
    pub const fn with_config(config: LocalSearchConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    fn effective_budget(&self, requested: Duration) -> Duration {
        self.config
            .time_budget
            .map_or(requested, |limit| limit.min(requested))
    }
}

impl Sequencer for LocalSearchSequencer {
    fn sequence(
        &self,
        matrix: &DistanceMatrix,
        budget: Duration,
    ) -> Result<RouteOrder, NoSolutionError> {
        if matrix.is_empty() {
            return Err(NoSolutionError::new("cost matrix has no waypoints"));
        }
        let started_at = Instant::now();
        let effective = self.effective_budget(budget);
        let deadline = started_at.checked_add(effective);

        let mut search = LocalSearch::new(matrix, cheapest_arc(matrix));
        let outcome = search.run(deadline, self.config.max_passes);
        match outcome {
            Outcome::Converged => log::debug!(
                "local search converged after {} moves in {:?} (cost {:.3})",
                search.passes(),
                started_at.elapsed(),
                search.cost()
            ),
            Outcome::PassLimit => log::info!(
                "local search stopped at the {} move limit; returning best order (cost {:.3})",
                self.config.max_passes,
                search.cost()
            ),
            Outcome::BudgetExpired => log::info!(
                "sequencer budget of {effective:?} expired after {} moves; returning best order (cost {:.3})",
                search.passes(),
                search.cost()
            ),
        }
        Ok(RouteOrder::new(search.into_order())?)
    }
}
