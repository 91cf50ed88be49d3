//! Independent searches over one model, run in parallel.

use rayon::prelude::*;
use tempora_config::SolverConfig;
use tempora_core::{Assignment, Model, Payload};
use tracing::info;

use crate::error::SolverError;
use crate::local_search::{LocalSearch, SearchResult};

/// Runs one [`LocalSearch`] per trial, each on its own assignment with its
/// own seed, and keeps the best.
///
/// Trials start from the variables' initial values, if any. Trial `i` is
/// seeded with `random_seed + i`, so a run is reproducible for a fixed
/// configuration whatever the thread count.
#[derive(Debug, Clone)]
pub struct ParallelTrials {
    config: SolverConfig,
    trials: usize,
}

/// Best assignment of a [`ParallelTrials`] run.
#[derive(Debug)]
pub struct TrialsOutcome<P> {
    pub best: Assignment<P>,
    /// Index of the trial that produced `best`.
    pub trial: usize,
    /// Result of every trial, by index.
    pub results: Vec<SearchResult>,
}

impl<P> TrialsOutcome<P> {
    pub fn result(&self) -> &SearchResult {
        &self.results[self.trial]
    }
}

impl ParallelTrials {
    /// One trial per configured search thread.
    ///
    /// Zero sizes in `config` fall back to their defaults.
    pub fn new(mut config: SolverConfig) -> Result<Self, SolverError> {
        config.normalize();
        config.validate()?;
        let trials = config.search.threads;
        Ok(Self { config, trials })
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn run<P: Payload>(&self, model: &Model<P>) -> TrialsOutcome<P> {
        let base_seed = self.config.random_seed.unwrap_or(0);
        info!(
            event = "trials_start",
            trials = self.trials,
            seed = base_seed,
            variables = model.variable_count(),
        );

        let mut runs: Vec<(Assignment<P>, SearchResult)> = (0..self.trials)
            .into_par_iter()
            .map(|trial| {
                let seed = base_seed.wrapping_add(trial as u64);
                let mut assignment = initial_assignment(model);
                let result =
                    LocalSearch::from_config(&self.config, seed).solve(model, &mut assignment);
                (assignment, result)
            })
            .collect();

        let mut trial = 0;
        for (index, (_, result)) in runs.iter().enumerate().skip(1) {
            if result.is_better_than(&runs[trial].1) {
                trial = index;
            }
        }
        let results: Vec<SearchResult> = runs.iter().map(|(_, result)| *result).collect();
        let (best, _) = runs.swap_remove(trial);

        info!(
            event = "trials_end",
            best_trial = trial,
            unassigned = results[trial].unassigned,
            score = results[trial].best_value,
        );
        TrialsOutcome {
            best,
            trial,
            results,
        }
    }
}

fn initial_assignment<P: Payload>(model: &Model<P>) -> Assignment<P> {
    let mut assignment = Assignment::new(model);
    let initial: Vec<_> = model
        .variables()
        .filter_map(|variable| variable.initial().cloned())
        .collect();
    // prohibited initial values stay unassigned
    for value in initial {
        model.commit(&mut assignment, 0, value);
    }
    assignment
}

#[cfg(test)]
mod tests {
    use tempora_config::{ConfigError, CriterionConfig};
    use tempora_core::VariableId;
    use tempora_test::timetable::TimetableBuilder;

    use super::*;

    fn config(seed: u64, iterations: u64) -> SolverConfig {
        let mut config = SolverConfig::new().with_random_seed(seed);
        config.search.max_iterations = Some(iterations);
        config.resolver.time_limit_ms = 1_000;
        config
    }

    #[test]
    fn test_best_trial_is_kept() {
        let model = TimetableBuilder::new(5, 3, 2).same_time_penalty(0.5).build();
        let outcome = ParallelTrials::new(config(40, 400))
            .unwrap()
            .with_trials(4)
            .run(&model);

        assert_eq!(outcome.results.len(), 4);
        for result in &outcome.results {
            assert!(!result.is_better_than(outcome.result()));
        }
        assert!((model.total_value(&outcome.best) - outcome.result().best_value).abs() < 1e-9);
        assert_eq!(
            model.variable_count() - outcome.best.assigned_count(),
            outcome.result().unassigned
        );
    }

    #[test]
    fn test_runs_are_reproducible() {
        let model = TimetableBuilder::new(4, 2, 3).build();
        let trials = ParallelTrials::new(config(7, 200)).unwrap().with_trials(3);

        let first = trials.run(&model);
        let second = trials.run(&model);
        assert_eq!(first.trial, second.trial);
        assert_eq!(first.best.snapshot(), second.best.snapshot());
    }

    #[test]
    fn test_trials_start_from_initial_values() {
        let mut model = TimetableBuilder::new(2, 2, 1).build();
        model.set_initial(VariableId::new(0), Some(1)).unwrap();
        let assignment = initial_assignment(&model);

        assert_eq!(assignment.assigned_count(), 1);
        assert_eq!(
            assignment.value(VariableId::new(0)),
            model.variable(VariableId::new(0)).unwrap().initial()
        );
    }

    #[test]
    fn test_zero_threads_fall_back_to_one_trial() {
        let mut config = SolverConfig::new();
        config.search.threads = 0;
        assert_eq!(ParallelTrials::new(config).unwrap().trials(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SolverConfig::new().with_criterion(CriterionConfig::new(""));
        assert!(matches!(
            ParallelTrials::new(config),
            Err(SolverError::Config(ConfigError::Invalid(_)))
        ));
    }
}
