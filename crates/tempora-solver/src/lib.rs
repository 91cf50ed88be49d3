//! Tempora Solver - moves and searches over a Tempora model
//!
//! This crate provides:
//! - Neighbours, the atomic changes a search commits
//! - The swap resolver, which finds conflict-free cascades for a move
//! - Neighbour selection and the local search driver with its acceptors
//! - Shared assignments and parallel trials
//! - The branch-and-bound feasibility checker
//! - A criterion factory driven by configuration names

pub mod error;
pub mod factory;
pub mod feasibility;
pub mod local_search;
pub mod neighbour;
pub mod resolver;
pub mod selection;
pub mod shared;
pub mod trials;

pub use error::SolverError;
pub use factory::{CriterionFactory, CriterionSettings};
pub use feasibility::{FeasibilityChecker, FeasibilityOutcome, Request, RequestKind, RequestSet};
pub use local_search::{
    Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor, LocalSearch, SearchResult,
};
pub use neighbour::{CascadeNeighbour, Neighbour, SimpleNeighbour};
pub use resolver::{Resolution, ResolverStats, SwapResolver};
pub use selection::{ConflictSwapSelection, NeighbourSelection};
pub use shared::SharedAssignment;
pub use trials::{ParallelTrials, TrialsOutcome};
