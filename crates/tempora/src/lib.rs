//! Tempora - incremental local search for timetabling
//!
//! Build a [`Model`], describe the search in a [`SolverConfig`] and call
//! [`solve`].
//!
//! # Example
//!
//! ```rust
//! use tempora::prelude::*;
//! use tempora::constraint::ResourceConstraint;
//!
//! // payload: (time, room)
//! let mut model: Model<(u32, u32)> = Model::new();
//! for lecture in ["Algebra", "Biology", "Chemistry"] {
//!     let specs = (0..2)
//!         .flat_map(|time| (0..2).map(move |room| (time, room)))
//!         .map(|slot| ValueSpec::new(slot).with_cost(slot.0 as f64))
//!         .collect();
//!     model.add_variable(VariableDef::fixed(lecture, specs));
//! }
//! model.add_global_constraint(ResourceConstraint::global("Room", |slot: &(u32, u32)| {
//!     [*slot].into_iter().collect()
//! }));
//! model.add_criterion(ValueCostCriterion::new("Time"));
//!
//! let mut config = SolverConfig::new().with_random_seed(1);
//! config.search.max_iterations = Some(500);
//!
//! let outcome = tempora::solve(&model, &config).unwrap();
//! assert_eq!(outcome.result().unassigned, 0);
//! assert_eq!(outcome.result().best_value, 1.0);
//! ```

pub mod logging;
mod solver;

pub use solver::solve;

pub use tempora_config::{
    AcceptorKind, ConfigError, CriterionConfig, FeasibilityConfig, Properties, ResolverConfig,
    SearchConfig, SolverConfig,
};
pub use tempora_core::{
    constraint, criterion, Assignment, Conflicts, Constraint, Criterion, Model, Payload,
    TemporaError, Value, ValueRef, ValueSpec, ValueUpdate, VariableDef, VariableId,
};
pub use tempora_solver::{
    feasibility, CascadeNeighbour, ConflictSwapSelection, CriterionFactory, FeasibilityChecker,
    LocalSearch, Neighbour, NeighbourSelection, ParallelTrials, SearchResult, SharedAssignment,
    SimpleNeighbour, SolverError, SwapResolver, TrialsOutcome,
};

pub mod prelude {
    pub use tempora_config::SolverConfig;
    pub use tempora_core::criterion::{PairPenaltyCriterion, ValueCostCriterion};
    pub use tempora_core::{Assignment, Model, ValueSpec, VariableDef, VariableId};
    pub use tempora_solver::{Neighbour, NeighbourSelection, SwapResolver};
}
