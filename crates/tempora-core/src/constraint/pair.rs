//! Pairwise compatibility constraint.

use super::{Conflicts, Constraint};
use crate::assignment::{Assignment, AssignmentContext};
use crate::model::{Payload, Value, ValueRef, VariableId};

/// Values of the listed variables must be pairwise compatible.
///
/// Stateless: conflicts are found by scanning the other listed variables,
/// which suits constraints over a handful of variables (linked sections,
/// distance requirements between two classes).
pub struct PairConstraint<P> {
    name: String,
    variables: Vec<VariableId>,
    compatible: Box<dyn Fn(&Value<P>, &Value<P>) -> bool + Send + Sync>,
    hard: bool,
}

impl<P> PairConstraint<P> {
    pub fn new<F>(name: impl Into<String>, variables: Vec<VariableId>, compatible: F) -> Self
    where
        F: Fn(&Value<P>, &Value<P>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            variables,
            compatible: Box::new(compatible),
            hard: true,
        }
    }

    /// Soft pair constraints never report conflicts.
    pub fn soft(mut self) -> Self {
        self.hard = false;
        self
    }

    /// Whether this constraint would accept `first` and `second` together.
    pub fn accepts(&self, first: &Value<P>, second: &Value<P>) -> bool {
        (self.compatible)(first, second)
    }
}

impl<P: Payload> Constraint<P> for PairConstraint<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    fn is_hard(&self) -> bool {
        self.hard
    }

    fn compute_conflicts(
        &self,
        assignment: &Assignment<P>,
        _context: &dyn AssignmentContext,
        value: &ValueRef<P>,
        conflicts: &mut Conflicts<P>,
    ) {
        for &other in &self.variables {
            if other == value.variable() {
                continue;
            }
            if let Some(current) = assignment.value(other) {
                if !(self.compatible)(value, current) {
                    conflicts.insert(current.clone());
                }
            }
        }
    }

    fn is_consistent(&self, first: &Value<P>, second: &Value<P>) -> bool {
        if first.variable() == second.variable()
            || !self.variables.contains(&first.variable())
            || !self.variables.contains(&second.variable())
        {
            return true;
        }
        (self.compatible)(first, second)
    }
}
