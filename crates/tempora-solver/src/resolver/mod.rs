//! Cascading swap resolution.
//!
//! Moving a variable onto a value that clashes with other assigned values
//! displaces them. The resolver then looks for an alternative value for
//! every displaced variable, depth-first and in randomized order, so that
//! the combined move is conflict-free. Every trial assignment is unwound
//! before [`SwapResolver::resolve`] returns, whatever the outcome.

use std::time::{Duration, Instant};

use rand::Rng;
use tempora_config::ResolverConfig;
use tempora_core::{Assignment, Model, Payload, ValueRef};
use tracing::debug;

use crate::neighbour::CascadeNeighbour;

/// Search counters of one resolver invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolverStats {
    /// Displaced variables expanded.
    pub attempts: usize,
    /// Number of values displaced by the moved value.
    pub displaced: usize,
    pub elapsed: Duration,
    /// Whether the attempt or time budget cut the search short.
    pub exhausted: bool,
}

/// Result of one resolver invocation.
#[derive(Debug)]
pub struct Resolution<P> {
    pub neighbour: Option<CascadeNeighbour<P>>,
    pub stats: ResolverStats,
}

/// Finds conflict-free cascades for a moved value.
#[derive(Debug, Clone, Default)]
pub struct SwapResolver {
    config: ResolverConfig,
}

struct Search {
    attempts: usize,
    deadline: Instant,
    exhausted: bool,
}

impl Search {
    fn timed_out(&mut self) -> bool {
        let over = Instant::now() >= self.deadline;
        self.exhausted |= over;
        over
    }
}

impl SwapResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Looks for a conflict-free move of `value`'s variable onto `value`.
    ///
    /// On success the returned neighbour holds `value` followed by one
    /// alternative per displaced variable, with the measured change of the
    /// total objective as its delta. It is not committed: the assignment is
    /// left exactly as it was found.
    ///
    /// A move that displaces nothing is returned without an acceptance
    /// check; only cascades are subject to hill climbing.
    pub fn resolve<P, R>(
        &self,
        model: &Model<P>,
        assignment: &mut Assignment<P>,
        value: &ValueRef<P>,
        iteration: u64,
        rng: &mut R,
    ) -> Resolution<P>
    where
        P: Payload,
        R: Rng + ?Sized,
    {
        let start = Instant::now();
        let variable = value.variable();
        let Some(conflicts) = model.removable_conflicts(assignment, value) else {
            debug!(event = "swap_prohibited", variable = %variable);
            return Resolution {
                neighbour: None,
                stats: ResolverStats {
                    elapsed: start.elapsed(),
                    ..ResolverStats::default()
                },
            };
        };
        let original = assignment.value(variable).cloned();
        let total_before = model.total_value(assignment);
        let displaced: Vec<ValueRef<P>> = conflicts.iter().cloned().collect();

        for conflict in &displaced {
            assignment.unassign(model, iteration, conflict.variable());
        }
        assignment.assign(model, iteration, value.clone());

        let mut search = Search {
            attempts: 0,
            deadline: start + self.config.time_limit(),
            exhausted: false,
        };
        let mut chosen = Vec::with_capacity(displaced.len() + 1);
        let delta = if displaced.is_empty() {
            Some(model.total_value(assignment) - total_before)
        } else {
            self.resolve_from(
                model,
                assignment,
                &displaced,
                0,
                total_before,
                iteration,
                &mut search,
                &mut chosen,
                rng,
            )
        };

        assignment.unassign(model, iteration, variable);
        if let Some(original) = original {
            assignment.assign(model, iteration, original);
        }
        for conflict in &displaced {
            assignment.assign(model, iteration, conflict.clone());
        }

        let stats = ResolverStats {
            attempts: search.attempts,
            displaced: displaced.len(),
            elapsed: start.elapsed(),
            exhausted: search.exhausted,
        };
        debug!(
            event = "swap_resolved",
            variable = %variable,
            displaced = stats.displaced,
            attempts = stats.attempts,
            exhausted = stats.exhausted,
            found = delta.is_some(),
            delta = delta.unwrap_or(f64::NAN),
            elapsed_us = stats.elapsed.as_micros() as u64,
        );

        let neighbour = delta.map(|delta| {
            chosen.push(value.clone());
            chosen.reverse();
            CascadeNeighbour::new(chosen, delta)
        });
        Resolution { neighbour, stats }
    }

    /// Resolves `displaced[index..]`. On success `chosen` holds the picked
    /// alternatives, deepest first.
    #[allow(clippy::too_many_arguments)]
    fn resolve_from<P, R>(
        &self,
        model: &Model<P>,
        assignment: &mut Assignment<P>,
        displaced: &[ValueRef<P>],
        index: usize,
        total_before: f64,
        iteration: u64,
        search: &mut Search,
        chosen: &mut Vec<ValueRef<P>>,
        rng: &mut R,
    ) -> Option<f64>
    where
        P: Payload,
        R: Rng + ?Sized,
    {
        // a complete cascade stands even when found at the deadline
        let Some(conflict) = displaced.get(index) else {
            let delta = model.total_value(assignment) - total_before;
            return (!self.config.hill_climbing || delta <= 0.0).then_some(delta);
        };
        if search.timed_out() {
            return None;
        }
        if search.attempts >= self.config.max_attempts {
            search.exhausted = true;
            return None;
        }
        search.attempts += 1;

        // only one-for-one placements are swapped
        if conflict.arity() > 1 {
            return None;
        }
        let domain = model.values_of(conflict.variable());
        if domain.is_empty() {
            return None;
        }

        let offset = rng.random_range(0..domain.len());
        for step in 0..domain.len() {
            let candidate = &domain[(offset + step) % domain.len()];
            if candidate.id() == conflict.id() || candidate.arity() != conflict.arity() {
                continue;
            }
            if self
                .config
                .max_preference
                .is_some_and(|max| candidate.preference() > max)
            {
                continue;
            }
            if model.in_conflict(assignment, candidate) {
                continue;
            }

            assignment.assign(model, iteration, candidate.clone());
            let found = self.resolve_from(
                model,
                assignment,
                displaced,
                index + 1,
                total_before,
                iteration,
                search,
                chosen,
                rng,
            );
            assignment.unassign(model, iteration, candidate.variable());

            if found.is_some() {
                chosen.push(candidate.clone());
                return found;
            }
            if search.timed_out() {
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
