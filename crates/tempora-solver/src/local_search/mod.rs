//! Single-assignment local search driver.

mod acceptor;

use std::time::{Duration, Instant};

use tempora_config::SolverConfig;
use tempora_core::{Assignment, Model, Payload};
use tracing::{debug, info, trace};

pub use acceptor::{acceptor_for, Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor};

use crate::resolver::SwapResolver;
use crate::selection::{ConflictSwapSelection, NeighbourSelection};

/// Iteration cap applied when a search sets neither limit.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// Outcome of a search run. The assignment is left at its best state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub best_value: f64,
    pub unassigned: usize,
    pub iterations: u64,
    /// Neighbours committed.
    pub steps: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    /// Whether `self` beats `other`: fewer unassigned variables first,
    /// then a lower objective.
    pub fn is_better_than(&self, other: &SearchResult) -> bool {
        (self.unassigned, self.best_value) < (other.unassigned, other.best_value)
    }
}

/// Repeatedly asks a selection for a neighbour and commits it when the
/// acceptor agrees.
///
/// A neighbour that assigns a previously unassigned variable is always
/// taken. The best state seen is saved on the assignment and restored when
/// the run ends.
#[derive(Debug)]
pub struct LocalSearch<S, A> {
    selection: S,
    acceptor: A,
    max_iterations: Option<u64>,
    time_limit: Option<Duration>,
}

impl<S, A> LocalSearch<S, A> {
    pub fn new(selection: S, acceptor: A) -> Self {
        Self {
            selection,
            acceptor,
            max_iterations: None,
            time_limit: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    fn iteration_cap(&self) -> Option<u64> {
        match (self.max_iterations, self.time_limit) {
            (None, None) => Some(DEFAULT_MAX_ITERATIONS),
            (limit, _) => limit,
        }
    }
}

impl LocalSearch<ConflictSwapSelection, Box<dyn Acceptor>> {
    /// Conflict-swap search with the configured resolver, acceptor and
    /// limits.
    pub fn from_config(config: &SolverConfig, seed: u64) -> Self {
        let selection = ConflictSwapSelection::new(SwapResolver::new(config.resolver.clone()), seed);
        let mut search = Self::new(selection, acceptor_for(&config.search));
        search.max_iterations = config.search.max_iterations;
        search.time_limit = config.search.time_limit();
        search
    }
}

impl<S, A> LocalSearch<S, A>
where
    A: Acceptor,
{
    pub fn solve<P>(&mut self, model: &Model<P>, assignment: &mut Assignment<P>) -> SearchResult
    where
        P: Payload,
        S: NeighbourSelection<P>,
    {
        let start = Instant::now();
        let cap = self.iteration_cap();
        let unassigned = |assignment: &Assignment<P>| {
            model.variable_count().saturating_sub(assignment.assigned_count())
        };

        let mut current = model.total_value(assignment);
        let mut best = (unassigned(assignment), current);
        assignment.save_best(model, 0);
        self.acceptor.phase_started(current);

        info!(
            event = "phase_start",
            phase = "LocalSearch",
            variables = model.variable_count(),
            unassigned = best.0,
            score = current,
        );

        let mut iteration = 0u64;
        let mut steps = 0u64;
        loop {
            if cap.is_some_and(|cap| iteration >= cap) {
                break;
            }
            if self.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                break;
            }
            iteration += 1;
            self.acceptor.step_started();

            let Some(neighbour) = self.selection.select_neighbour(model, assignment, iteration)
            else {
                continue;
            };
            let candidate = current + neighbour.delta();
            let assigns_new = neighbour
                .values()
                .first()
                .is_some_and(|value| !assignment.is_assigned(value.variable()));
            let accepted = assigns_new || self.acceptor.is_accepted(current, candidate);
            trace!(
                event = "step",
                step = iteration,
                delta = neighbour.delta(),
                accepted = accepted,
            );
            if !accepted {
                continue;
            }

            neighbour.commit(model, assignment, iteration);
            current = model.total_value(assignment);
            steps += 1;
            self.acceptor.step_ended(current);

            let state = (unassigned(assignment), current);
            if state < best {
                best = state;
                assignment.save_best(model, iteration);
                debug!(
                    event = "new_best",
                    step = iteration,
                    unassigned = state.0,
                    score = state.1,
                );
            }
        }

        assignment.restore_best(model, iteration);
        self.acceptor.phase_ended();

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let speed = if duration_ms > 0 {
            iteration * 1000 / duration_ms
        } else {
            0
        };
        info!(
            event = "phase_end",
            phase = "LocalSearch",
            duration_ms = duration_ms,
            steps = steps,
            iterations = iteration,
            speed = speed,
            unassigned = best.0,
            score = best.1,
        );

        SearchResult {
            best_value: model.total_value(assignment),
            unassigned: unassigned(assignment),
            iterations: iteration,
            steps,
            elapsed,
        }
    }
}
