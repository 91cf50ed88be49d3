//! Tempora Core - incremental bookkeeping for timetabling local search
//!
//! This crate provides the machinery a local search moves over:
//! - [`model`]: variables, candidate values and the entity graph
//! - [`constraint`]: hard rules and the conflict sets they produce
//! - [`assignment`]: partial solutions with per-assignment context caches
//! - [`criterion`]: weighted objective terms kept up to date on every change
//!
//! # Example
//!
//! ```
//! use tempora_core::constraint::ResourceConstraint;
//! use tempora_core::criterion::ValueCostCriterion;
//! use tempora_core::model::{Model, ValueSpec, VariableDef};
//! use tempora_core::Assignment;
//!
//! // payload: the room a lecture is placed in
//! let mut model: Model<u32> = Model::new();
//! let a = model.add_variable(VariableDef::fixed(
//!     "A",
//!     vec![ValueSpec::new(1).with_cost(1.0), ValueSpec::new(2).with_cost(3.0)],
//! ));
//! let b = model.add_variable(VariableDef::fixed("B", vec![ValueSpec::new(1)]));
//! model.add_global_constraint(ResourceConstraint::global("Room", |room: &u32| {
//!     [*room].into_iter().collect()
//! }));
//! model.add_criterion(ValueCostCriterion::new("Cost"));
//!
//! let mut assignment = Assignment::new(&model);
//! assignment.assign(&model, 1, model.values_of(a)[0].clone());
//!
//! // B wants room 1, which A holds
//! let wanted = model.values_of(b)[0].clone();
//! let conflicts = model.conflicts(&assignment, &wanted);
//! assert!(conflicts.contains_variable(a));
//!
//! model.commit(&mut assignment, 2, wanted);
//! assert!(!assignment.is_assigned(a));
//! assert_eq!(model.total_value(&assignment), 0.0);
//! ```

pub mod assignment;
pub mod constraint;
pub mod criterion;
pub mod error;
pub mod model;

#[cfg(test)]
mod test_utils;

pub use assignment::{Assignment, AssignmentContext, ContextCache, ContextRef, OwnerHandle};
pub use constraint::{Conflicts, Constraint, ConstraintId};
pub use criterion::{Bounds, Criterion, CriterionContext, CriterionSummary, ValueUpdate};
pub use error::{Result, TemporaError};
pub use model::{Model, Payload, Value, ValueId, ValueRef, ValueSpec, Variable, VariableDef, VariableId};
