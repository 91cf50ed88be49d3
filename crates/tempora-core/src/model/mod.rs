//! The entity graph: variables, their candidate values, constraints and
//! criteria.
//!
//! A [`Model`] is built once and then shared read-only (typically as
//! `Arc<Model<P>>`) by any number of [`Assignment`]s. Constraints and
//! criteria are registered as trait objects and receive an [`OwnerHandle`]
//! addressing their per-assignment state.
//!
//! Structural edits bump [`Model::generation`], which invalidates cached
//! criterion bounds.

mod domain;
mod value;
mod variable;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::assignment::{Assignment, AssignmentContext, OwnerHandle};
use crate::constraint::{Conflicts, Constraint, ConstraintId};
use crate::criterion::{Bounds, Criterion, CriterionContext, CriterionSummary, Info};
use crate::error::{Result, TemporaError};

pub use domain::{Combination, Combinations, ResourceProduct};
pub use value::{Value, ValueId, ValueRef, ValueSpec};
pub use variable::{Domain, DomainFn, Variable, VariableDef, VariableId};

/// Bound for the domain payload carried by every [`Value`].
///
/// Models are shared across threads, so payloads must be too.
pub trait Payload: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Payload for T {}

struct ConstraintEntry<P> {
    handle: OwnerHandle,
    constraint: Arc<dyn Constraint<P>>,
    global: bool,
}

struct CriterionEntry<P> {
    handle: OwnerHandle,
    criterion: Arc<dyn Criterion<P>>,
}

#[derive(Debug, Clone, Copy)]
enum Owner {
    Constraint(ConstraintId),
    Criterion(usize),
    Removed,
}

/// Variables, constraints and criteria of one problem instance.
pub struct Model<P> {
    variables: Vec<Option<Variable<P>>>,
    constraints: Vec<Option<ConstraintEntry<P>>>,
    by_variable: Vec<Vec<ConstraintId>>,
    globals: Vec<ConstraintId>,
    criteria: Vec<CriterionEntry<P>>,
    owners: Vec<Owner>,
    generation: u64,
}

impl<P> Default for Model<P> {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            by_variable: Vec::new(),
            globals: Vec::new(),
            criteria: Vec::new(),
            owners: Vec::new(),
            generation: 0,
        }
    }
}

impl<P: Payload> Model<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter bumped by every structural edit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn issue_handle(&mut self, owner: Owner) -> OwnerHandle {
        let handle = OwnerHandle::new(self.owners.len());
        self.owners.push(owner);
        handle
    }

    /// Number of owner handles issued so far, removed owners included.
    pub fn handle_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_live_owner(&self, handle: OwnerHandle) -> bool {
        matches!(
            self.owners.get(handle.index()),
            Some(Owner::Constraint(_) | Owner::Criterion(_))
        )
    }

    // -- variables --

    pub fn add_variable(&mut self, def: VariableDef<P>) -> VariableId {
        let id = VariableId::new(self.variables.len());
        self.variables.push(Some(Variable::bind(id, def)));
        self.by_variable.push(Vec::new());
        self.touch();
        id
    }

    /// Removes a variable, leaving its id unused.
    ///
    /// Assignments holding one of its values must unassign it first.
    pub fn remove_variable(&mut self, id: VariableId) -> Option<Variable<P>> {
        let removed = self.variables.get_mut(id.index())?.take();
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable<P>> {
        self.variables.get(id.index()).and_then(Option::as_ref)
    }

    pub fn try_variable(&self, id: VariableId) -> Result<&Variable<P>> {
        self.variable(id).ok_or(TemporaError::UnknownVariable(id))
    }

    /// Live variables in id order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable<P>> + '_ {
        self.variables.iter().flatten()
    }

    pub fn variable_count(&self) -> usize {
        self.variables().count()
    }

    /// One past the highest variable id ever issued.
    pub fn variable_capacity(&self) -> usize {
        self.variables.len()
    }

    /// Domain of `id`; empty for unknown variables.
    pub fn values_of(&self, id: VariableId) -> &[ValueRef<P>] {
        self.variable(id).map_or(&[][..], Variable::values)
    }

    /// Drops a lazily generated domain so it is rebuilt on next access.
    pub fn invalidate_domain(&mut self, id: VariableId) -> bool {
        let dropped = self
            .variables
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .is_some_and(Variable::invalidate);
        if dropped {
            self.touch();
        }
        dropped
    }

    /// Marks the domain value at `index` as the variable's initial value.
    pub fn set_initial(&mut self, id: VariableId, index: Option<usize>) -> Result<()> {
        let variable = self
            .variables
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TemporaError::UnknownVariable(id))?;
        let value = match index {
            Some(index) => Some(variable.values().get(index).cloned().ok_or(
                TemporaError::ValueOutOfDomain {
                    variable: id,
                    index,
                },
            )?),
            None => None,
        };
        variable.set_initial(value);
        Ok(())
    }

    // -- constraints --

    /// Registers a constraint over the variables it lists.
    pub fn add_constraint<C>(&mut self, constraint: C) -> ConstraintId
    where
        C: Constraint<P> + 'static,
    {
        self.insert_constraint(Arc::new(constraint), false)
    }

    /// Registers a constraint consulted for every value of every variable.
    pub fn add_global_constraint<C>(&mut self, constraint: C) -> ConstraintId
    where
        C: Constraint<P> + 'static,
    {
        self.insert_constraint(Arc::new(constraint), true)
    }

    fn insert_constraint(&mut self, constraint: Arc<dyn Constraint<P>>, global: bool) -> ConstraintId {
        let id = ConstraintId::new(self.constraints.len());
        let handle = self.issue_handle(Owner::Constraint(id));
        if global {
            self.globals.push(id);
        } else {
            for variable in constraint.variables() {
                if self.by_variable.len() <= variable.index() {
                    self.by_variable.resize_with(variable.index() + 1, Vec::new);
                }
                let list = &mut self.by_variable[variable.index()];
                if !list.contains(&id) {
                    list.push(id);
                }
            }
        }
        debug!(
            event = "constraint_added",
            name = constraint.name(),
            global,
            handle = handle.index(),
        );
        self.constraints.push(Some(ConstraintEntry {
            handle,
            constraint,
            global,
        }));
        self.touch();
        id
    }

    /// Unregisters a constraint. Its contexts in live assignments are
    /// orphaned and dropped with them.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<Arc<dyn Constraint<P>>> {
        let entry = self.constraints.get_mut(id.index())?.take()?;
        if entry.global {
            self.globals.retain(|&g| g != id);
        } else {
            for variable in entry.constraint.variables() {
                if let Some(list) = self.by_variable.get_mut(variable.index()) {
                    list.retain(|&c| c != id);
                }
            }
        }
        self.owners[entry.handle.index()] = Owner::Removed;
        self.touch();
        Some(entry.constraint)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Arc<dyn Constraint<P>>> {
        self.constraints
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|entry| &entry.constraint)
    }

    pub fn constraint_handle(&self, id: ConstraintId) -> Option<OwnerHandle> {
        self.constraints
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|entry| entry.handle)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Arc<dyn Constraint<P>>> + '_ {
        self.constraints
            .iter()
            .flatten()
            .map(|entry| &entry.constraint)
    }

    /// Constraints listing `variable`, followed by every global constraint.
    pub fn constraints_touching(
        &self,
        variable: VariableId,
    ) -> impl Iterator<Item = (OwnerHandle, &Arc<dyn Constraint<P>>)> + '_ {
        let listed = self
            .by_variable
            .get(variable.index())
            .map_or(&[][..], Vec::as_slice);
        listed
            .iter()
            .chain(self.globals.iter())
            .filter_map(move |id| self.constraints[id.index()].as_ref())
            .map(|entry| (entry.handle, &entry.constraint))
    }

    // -- criteria --

    pub fn add_criterion<C>(&mut self, criterion: C) -> OwnerHandle
    where
        C: Criterion<P> + 'static,
    {
        self.add_shared_criterion(Arc::new(criterion))
    }

    pub fn add_shared_criterion(&mut self, criterion: Arc<dyn Criterion<P>>) -> OwnerHandle {
        let handle = self.issue_handle(Owner::Criterion(self.criteria.len()));
        debug!(
            event = "criterion_added",
            name = criterion.name(),
            weight = criterion.weight(),
            handle = handle.index(),
        );
        self.criteria.push(CriterionEntry { handle, criterion });
        self.touch();
        handle
    }

    pub fn criteria(&self) -> impl Iterator<Item = &Arc<dyn Criterion<P>>> + '_ {
        self.criteria.iter().map(|entry| &entry.criterion)
    }

    pub fn criteria_with_handles(
        &self,
    ) -> impl Iterator<Item = (OwnerHandle, &Arc<dyn Criterion<P>>)> + '_ {
        self.criteria
            .iter()
            .map(|entry| (entry.handle, &entry.criterion))
    }

    /// Looks a criterion up by name.
    pub fn criterion(&self, name: &str) -> Option<(OwnerHandle, &Arc<dyn Criterion<P>>)> {
        self.criteria_with_handles()
            .find(|(_, criterion)| criterion.name() == name)
    }

    // -- contexts --

    /// Builds the context of `handle` from scratch for `assignment`.
    pub(crate) fn create_context(
        &self,
        assignment: &Assignment<P>,
        handle: OwnerHandle,
    ) -> Box<dyn AssignmentContext> {
        match self.owners.get(handle.index()) {
            Some(Owner::Constraint(id)) => match self.constraint(*id) {
                Some(constraint) => constraint.create_context(assignment),
                None => Box::new(()),
            },
            Some(Owner::Criterion(index)) => {
                let total = self.criteria[*index].criterion.compute_total(assignment);
                Box::new(CriterionContext::new(total))
            }
            Some(Owner::Removed) | None => Box::new(()),
        }
    }

    fn criterion_total(
        &self,
        assignment: &Assignment<P>,
        handle: OwnerHandle,
        criterion: &dyn Criterion<P>,
    ) -> f64 {
        let context = assignment.context(self, handle);
        match context.downcast_ref::<CriterionContext>() {
            Some(context) => context.total(),
            None => criterion.compute_total(assignment),
        }
    }

    fn criterion_bounds(
        &self,
        assignment: &Assignment<P>,
        handle: OwnerHandle,
        criterion: &dyn Criterion<P>,
    ) -> Bounds {
        let context = assignment.context(self, handle);
        let Some(context) = context.downcast_ref::<CriterionContext>() else {
            return criterion.compute_bounds(self, assignment);
        };
        if let Some(bounds) = context.cached_bounds(self.generation) {
            return bounds;
        }
        let bounds = criterion.compute_bounds(self, assignment);
        context.cache_bounds(self.generation, bounds);
        bounds
    }

    // -- evaluation --

    /// Assigned values that must go before `value` can be assigned.
    ///
    /// Only hard constraints are consulted. The result can contain `value`
    /// itself when no assignment could ever hold it.
    pub fn conflicts(&self, assignment: &Assignment<P>, value: &ValueRef<P>) -> Conflicts<P> {
        let mut conflicts = Conflicts::new();
        for (handle, constraint) in self.constraints_touching(value.variable()) {
            if constraint.is_hard() {
                let context = assignment.context(self, handle);
                constraint.compute_conflicts(assignment, &*context, value, &mut conflicts);
            }
        }
        conflicts
    }

    /// Whether assigning `value` would displace anything.
    pub fn in_conflict(&self, assignment: &Assignment<P>, value: &ValueRef<P>) -> bool {
        self.constraints_touching(value.variable())
            .filter(|(_, constraint)| constraint.is_hard())
            .any(|(handle, constraint)| {
                let context = assignment.context(self, handle);
                constraint.in_conflict(assignment, &*context, value)
            })
    }

    /// Unassigns the conflicts of `value`, then assigns it.
    ///
    /// Returns the displaced values, or `None` without touching the
    /// assignment when `value` is prohibited.
    pub fn commit(
        &self,
        assignment: &mut Assignment<P>,
        iteration: u64,
        value: ValueRef<P>,
    ) -> Option<Conflicts<P>> {
        let conflicts = self.removable_conflicts(assignment, &value)?;
        for displaced in conflicts.iter() {
            assignment.unassign(self, iteration, displaced.variable());
        }
        assignment.assign_displacing(self, iteration, value, Some(&conflicts));
        Some(conflicts)
    }

    /// Conflicts of `value` other than the current value of its own
    /// variable, or `None` when a constraint reported `value` itself.
    pub fn removable_conflicts(
        &self,
        assignment: &Assignment<P>,
        value: &ValueRef<P>,
    ) -> Option<Conflicts<P>> {
        let mut conflicts = self.conflicts(assignment, value);
        if conflicts.contains(value) {
            return None;
        }
        conflicts.remove(value.variable());
        Some(conflicts)
    }

    /// Projected change of the weighted objective if `value` replaced the
    /// current value of its variable and `conflicts` were unassigned.
    ///
    /// Pure: the assignment is only read.
    pub fn move_delta(
        &self,
        assignment: &Assignment<P>,
        value: &ValueRef<P>,
        conflicts: &Conflicts<P>,
    ) -> f64 {
        let current = assignment.value(value.variable());
        let mut delta = 0.0;
        for criterion in self.criteria() {
            let mut excluded = Conflicts::new();
            let mut change = 0.0;
            if let Some(current) = current {
                change -= criterion.value(assignment, current, &excluded);
                excluded.insert(current.clone());
            }
            for displaced in conflicts.iter() {
                if displaced.variable() == value.variable() {
                    continue;
                }
                change -= criterion.value(assignment, displaced, &excluded);
                excluded.insert(displaced.clone());
            }
            change += criterion.value(assignment, value, &excluded);
            delta += criterion.weight() * change;
        }
        delta
    }

    /// Weighted objective of `assignment`, from the running totals.
    pub fn total_value(&self, assignment: &Assignment<P>) -> f64 {
        self.criteria
            .iter()
            .map(|entry| {
                entry.criterion.weight()
                    * self.criterion_total(assignment, entry.handle, entry.criterion.as_ref())
            })
            .sum()
    }

    /// Snapshot of one criterion over `assignment`.
    pub fn criterion_summary(
        &self,
        assignment: &Assignment<P>,
        handle: OwnerHandle,
    ) -> Option<CriterionSummary> {
        let criterion = match self.owners.get(handle.index()) {
            Some(Owner::Criterion(index)) => self.criteria[*index].criterion.as_ref(),
            _ => return None,
        };
        let value = self.criterion_total(assignment, handle, criterion);
        Some(CriterionSummary {
            value,
            weighted: criterion.weight() * value,
            bounds: self.criterion_bounds(assignment, handle, criterion),
        })
    }

    /// Bounds of a criterion's value, cached per assignment and generation.
    pub fn bounds(&self, assignment: &Assignment<P>, handle: OwnerHandle) -> Option<Bounds> {
        match self.owners.get(handle.index()) {
            Some(Owner::Criterion(index)) => Some(self.criterion_bounds(
                assignment,
                handle,
                self.criteria[*index].criterion.as_ref(),
            )),
            _ => None,
        }
    }

    /// Key/value report of the assignment and every criterion.
    pub fn info(&self, assignment: &Assignment<P>) -> Info {
        let mut info = Info::new();
        info.insert(
            "Assigned variables".to_owned(),
            format!("{}/{}", assignment.assigned_count(), self.variable_count()),
        );
        info.insert(
            "Overall solution value".to_owned(),
            format!("{:.2}", self.total_value(assignment)),
        );
        for entry in &self.criteria {
            if let Some(summary) = self.criterion_summary(assignment, entry.handle) {
                entry.criterion.info(&summary, &mut info);
            }
        }
        info
    }

    /// [`info`](Self::info) plus each criterion's detail lines.
    pub fn extended_info(&self, assignment: &Assignment<P>) -> Info {
        let mut info = self.info(assignment);
        for entry in &self.criteria {
            if let Some(summary) = self.criterion_summary(assignment, entry.handle) {
                entry.criterion.extended_info(&summary, &mut info);
            }
        }
        info
    }
}

impl<P> fmt::Debug for Model<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("variables", &self.variables.iter().flatten().count())
            .field("constraints", &self.constraints.iter().flatten().count())
            .field("criteria", &self.criteria.len())
            .field("generation", &self.generation)
            .finish()
    }
}
