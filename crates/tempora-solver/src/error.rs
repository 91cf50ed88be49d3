//! Error types for the solver crate.

use tempora_config::ConfigError;
use thiserror::Error;

/// Errors raised while setting up a search.
///
/// Searching itself never fails: a move that cannot be resolved is simply
/// not made.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid solver configuration: {0}")]
    Config(#[from] ConfigError),
}
