//! Error types for Tempora core

use thiserror::Error;

use crate::model::VariableId;

/// Errors raised by checked model and assignment accessors.
///
/// Search failures are not errors: resolvers and checkers report them as
/// empty outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemporaError {
    /// An owner handle the model never issued, or one whose owner was removed
    #[error("Unknown context owner: {0}")]
    UnknownOwner(usize),

    /// A variable id that is not (or no longer) part of the model
    #[error("Unknown variable: {0}")]
    UnknownVariable(VariableId),

    /// An index past the end of a variable's domain
    #[error("Value index {index} outside the domain of {variable}")]
    ValueOutOfDomain { variable: VariableId, index: usize },
}

/// Result type alias for Tempora core operations
pub type Result<T> = std::result::Result<T, TemporaError>;
