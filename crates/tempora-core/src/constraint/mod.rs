//! Constraints and conflict sets.
//!
//! A constraint answers one question for the search: which currently
//! assigned values must go before a candidate value can be assigned. It may
//! keep per-assignment state in an [`AssignmentContext`] to answer that in
//! near-constant time.
//!
//! Two generic constraints ship with the crate:
//! - [`ResourceConstraint`] - values occupying a common resource key clash
//! - [`PairConstraint`] - a compatibility predicate over pairs of values

mod pair;
mod resource;


use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use crate::assignment::{Assignment, AssignmentContext};
use crate::model::{Value, ValueRef, VariableId};

pub use pair::PairConstraint;
pub use resource::{ResourceConstraint, ResourceContext};

/// Stable handle of a constraint inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(usize);

impl ConstraintId {
    pub const fn new(index: usize) -> Self {
        ConstraintId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Notification that a value was installed.
#[derive(Debug)]
pub struct AssignEvent<'a, P> {
    pub iteration: u64,
    pub value: &'a ValueRef<P>,
    /// Values unassigned as part of the same move, when the caller knows them.
    pub displaced: Option<&'a Conflicts<P>>,
}

/// Notification that a value was removed.
#[derive(Debug)]
pub struct UnassignEvent<'a, P> {
    pub iteration: u64,
    pub value: &'a ValueRef<P>,
}

/// A rule relating variables that forbids certain joint assignments.
///
/// Constraints registered as global are consulted for every value; others
/// only for values of the variables they list.
pub trait Constraint<P>: Send + Sync {
    fn name(&self) -> &str;

    /// Variables this constraint relates. Ignored for global constraints.
    fn variables(&self) -> &[VariableId];

    /// Hard constraints contribute conflicts; soft ones are left to criteria.
    fn is_hard(&self) -> bool {
        true
    }

    /// Builds this constraint's state for `assignment` from scratch.
    fn create_context(&self, _assignment: &Assignment<P>) -> Box<dyn AssignmentContext> {
        Box::new(())
    }

    /// Adds every assigned value that would clash with `value`.
    ///
    /// Must not miss a real conflict. May add `value` itself when the value
    /// can never be assigned.
    fn compute_conflicts(
        &self,
        assignment: &Assignment<P>,
        context: &dyn AssignmentContext,
        value: &ValueRef<P>,
        conflicts: &mut Conflicts<P>,
    );

    fn in_conflict(
        &self,
        assignment: &Assignment<P>,
        context: &dyn AssignmentContext,
        value: &ValueRef<P>,
    ) -> bool {
        let mut conflicts = Conflicts::new();
        self.compute_conflicts(assignment, context, value, &mut conflicts);
        !conflicts.is_empty()
    }

    /// Whether two values of distinct variables may be assigned together.
    ///
    /// Used offline, where no assignment exists.
    fn is_consistent(&self, _first: &Value<P>, _second: &Value<P>) -> bool {
        true
    }

    fn assigned(
        &self,
        _assignment: &Assignment<P>,
        _context: &mut dyn AssignmentContext,
        _event: &AssignEvent<'_, P>,
    ) {
    }

    fn unassigned(
        &self,
        _assignment: &Assignment<P>,
        _context: &mut dyn AssignmentContext,
        _event: &UnassignEvent<'_, P>,
    ) {
    }
}

/// Values that must be unassigned before a candidate can be assigned.
///
/// Keyed by variable, since an assignment holds at most one value per
/// variable. Iteration follows variable order so runs are reproducible.
pub struct Conflicts<P> {
    values: BTreeMap<VariableId, ValueRef<P>>,
}

impl<P> Conflicts<P> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Adds `value`; returns false if a value of its variable is present.
    pub fn insert(&mut self, value: ValueRef<P>) -> bool {
        match self.values.entry(value.variable()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn remove(&mut self, variable: VariableId) -> Option<ValueRef<P>> {
        self.values.remove(&variable)
    }

    pub fn contains(&self, value: &Value<P>) -> bool {
        self.values
            .get(&value.variable())
            .is_some_and(|v| v.id() == value.id())
    }

    pub fn contains_variable(&self, variable: VariableId) -> bool {
        self.values.contains_key(&variable)
    }

    pub fn get(&self, variable: VariableId) -> Option<&ValueRef<P>> {
        self.values.get(&variable)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueRef<P>> + '_ {
        self.values.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.values.keys().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<P> Default for Conflicts<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Conflicts<P> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<P> fmt::Debug for Conflicts<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.values.values().map(|v| (v.variable(), v.id())))
            .finish()
    }
}

impl<P> Extend<ValueRef<P>> for Conflicts<P> {
    fn extend<I: IntoIterator<Item = ValueRef<P>>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<P> FromIterator<ValueRef<P>> for Conflicts<P> {
    fn from_iter<I: IntoIterator<Item = ValueRef<P>>>(iter: I) -> Self {
        let mut conflicts = Conflicts::new();
        conflicts.extend(iter);
        conflicts
    }
}

impl<P> IntoIterator for Conflicts<P> {
    type Item = ValueRef<P>;
    type IntoIter = btree_map::IntoValues<VariableId, ValueRef<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_values()
    }
}
