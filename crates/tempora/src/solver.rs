//! Solver entry point.

use tempora_config::SolverConfig;
use tempora_core::{Model, Payload};
use tempora_solver::{ParallelTrials, SolverError, TrialsOutcome};
use tracing::info;

/// Runs `config.search.threads` seeded local searches over `model` and
/// returns the best assignment found.
///
/// # Errors
///
/// Returns [`SolverError::Config`] if the configuration does not validate.
pub fn solve<P: Payload>(
    model: &Model<P>,
    config: &SolverConfig,
) -> Result<TrialsOutcome<P>, SolverError> {
    crate::logging::init();
    let trials = ParallelTrials::new(config.clone())?;
    let outcome = trials.run(model);
    info!(
        event = "solve_end",
        trials = trials.trials(),
        assigned = outcome.best.assigned_count(),
        variables = model.variable_count(),
        score = outcome.result().best_value,
    );
    Ok(outcome)
}
