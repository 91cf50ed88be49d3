//! Assignments: one concrete (partial) mapping from variables to values.
//!
//! Each assignment carries its own [`ContextCache`]; several assignments can
//! therefore live over the same model (parallel searches, speculative
//! trials) while sharing every constraint and criterion object.
//!
//! # Notification order
//!
//! `assign` first tears down the variable's previous value, then:
//! 1. criteria `before_assigned`
//! 2. the value is installed
//! 3. constraints touching the variable, then global constraints
//! 4. criteria `after_assigned`
//!
//! `unassign` mirrors it: criteria `before_unassigned`, removal,
//! constraints, criteria `after_unassigned`.

mod context;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::constraint::{AssignEvent, Conflicts, UnassignEvent};
use crate::criterion::CriterionContext;
use crate::error::{Result, TemporaError};
use crate::model::{Model, Payload, ValueId, ValueRef, VariableId};

pub use context::{AssignmentContext, ContextCache, ContextRef, OwnerHandle};

/// A (partial) function from variables to values, plus its context cache.
pub struct Assignment<P> {
    values: Vec<Option<ValueRef<P>>>,
    iterations: Vec<u64>,
    assigned: usize,
    best: Option<Vec<Option<ValueRef<P>>>>,
    best_iteration: u64,
    contexts: ContextCache,
}

impl<P> Assignment<P> {
    /// The value assigned to `variable`, if any.
    #[inline]
    pub fn value(&self, variable: VariableId) -> Option<&ValueRef<P>> {
        self.values.get(variable.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn is_assigned(&self, variable: VariableId) -> bool {
        self.value(variable).is_some()
    }

    /// Iteration at which `variable` was last assigned or unassigned.
    pub fn iteration(&self, variable: VariableId) -> u64 {
        self.iterations.get(variable.index()).copied().unwrap_or(0)
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned
    }

    /// Assigned values in variable order.
    pub fn assigned_values(&self) -> impl Iterator<Item = &ValueRef<P>> + '_ {
        self.values.iter().flatten()
    }

    pub fn assigned_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.assigned_values().map(|v| v.variable())
    }

    /// Variable to value-id mapping, for comparing states.
    pub fn snapshot(&self) -> Vec<Option<ValueId>> {
        self.values
            .iter()
            .map(|slot| slot.as_ref().map(|v| v.id()))
            .collect()
    }

    pub fn contexts(&self) -> &ContextCache {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextCache {
        &mut self.contexts
    }

    /// Whether a best solution has been saved.
    pub fn has_best(&self) -> bool {
        self.best.is_some()
    }

    pub fn best_value(&self, variable: VariableId) -> Option<&ValueRef<P>> {
        self.best
            .as_ref()
            .and_then(|best| best.get(variable.index()))
            .and_then(Option::as_ref)
    }

    pub fn best_iteration(&self) -> u64 {
        self.best_iteration
    }

    fn grow_values(&mut self, variables: usize) {
        if self.values.len() < variables {
            self.values.resize(variables, None);
            self.iterations.resize(variables, 0);
        }
    }
}

impl<P: Payload> Assignment<P> {
    /// An empty assignment sized for `model`.
    pub fn new(model: &Model<P>) -> Self {
        Self {
            values: vec![None; model.variable_capacity()],
            iterations: vec![0; model.variable_capacity()],
            assigned: 0,
            best: None,
            best_iteration: 0,
            contexts: ContextCache::with_capacity(model.handle_count()),
        }
    }

    /// Variables of `model` without a value.
    pub fn unassigned_variables<'a>(
        &'a self,
        model: &'a Model<P>,
    ) -> impl Iterator<Item = VariableId> + 'a {
        model
            .variables()
            .map(|v| v.id())
            .filter(move |&id| !self.is_assigned(id))
    }

    /// Context of a constraint or criterion, created on first access.
    pub fn context(&self, model: &Model<P>, handle: OwnerHandle) -> ContextRef<'_> {
        debug_assert!(
            handle.index() < model.handle_count(),
            "context requested for unregistered owner {handle:?}"
        );
        self.contexts
            .get_or_init(handle, || model.create_context(self, handle))
    }

    /// Checked variant of [`context`](Self::context).
    pub fn try_context(&self, model: &Model<P>, handle: OwnerHandle) -> Result<ContextRef<'_>> {
        if handle.index() >= model.handle_count() || !model.is_live_owner(handle) {
            return Err(TemporaError::UnknownOwner(handle.index()));
        }
        Ok(self.context(model, handle))
    }

    /// Assigns `value`, replacing whatever its variable held.
    pub fn assign(&mut self, model: &Model<P>, iteration: u64, value: ValueRef<P>) {
        self.assign_displacing(model, iteration, value, None);
    }

    /// Assigns `value` as part of a move that also unassigned `displaced`.
    pub fn assign_displacing(
        &mut self,
        model: &Model<P>,
        iteration: u64,
        value: ValueRef<P>,
        displaced: Option<&Conflicts<P>>,
    ) {
        let variable = value.variable();
        self.grow_values(model.variable_capacity());
        if self.is_assigned(variable) {
            self.unassign(model, iteration, variable);
        }
        self.prepare(model, variable);

        for (handle, criterion) in model.criteria_with_handles() {
            self.with_criterion_context(handle, |assignment, context| {
                context.before_assigned(criterion.as_ref(), assignment, &value)
            });
        }

        self.values[variable.index()] = Some(value.clone());
        self.iterations[variable.index()] = iteration;
        self.assigned += 1;

        let event = AssignEvent {
            iteration,
            value: &value,
            displaced,
        };
        for (handle, constraint) in model.constraints_touching(variable) {
            if let Some(mut context) = self.contexts.take(handle) {
                constraint.assigned(self, &mut *context, &event);
                self.contexts.put(handle, context);
            }
        }
        for (handle, criterion) in model.criteria_with_handles() {
            self.with_criterion_context(handle, |assignment, context| {
                context.after_assigned(criterion.as_ref(), assignment, &event)
            });
        }
    }

    /// Removes the value of `variable`, returning it.
    pub fn unassign(
        &mut self,
        model: &Model<P>,
        iteration: u64,
        variable: VariableId,
    ) -> Option<ValueRef<P>> {
        let current = self.value(variable)?.clone();
        self.prepare(model, variable);

        for (handle, criterion) in model.criteria_with_handles() {
            self.with_criterion_context(handle, |assignment, context| {
                context.before_unassigned(criterion.as_ref(), assignment, &current)
            });
        }

        self.values[variable.index()] = None;
        self.iterations[variable.index()] = iteration;
        self.assigned -= 1;

        let event = UnassignEvent {
            iteration,
            value: &current,
        };
        for (handle, constraint) in model.constraints_touching(variable) {
            if let Some(mut context) = self.contexts.take(handle) {
                constraint.unassigned(self, &mut *context, &event);
                self.contexts.put(handle, context);
            }
        }
        for (handle, criterion) in model.criteria_with_handles() {
            self.with_criterion_context(handle, |assignment, context| {
                context.after_unassigned(criterion.as_ref(), assignment, &event)
            });
        }
        Some(current)
    }

    /// Records the current mapping as the best solution and snapshots every
    /// criterion total.
    pub fn save_best(&mut self, model: &Model<P>, iteration: u64) {
        self.contexts.grow(model.handle_count());
        self.best = Some(self.values.clone());
        self.best_iteration = iteration;
        for (handle, _) in model.criteria_with_handles() {
            self.ensure_context(model, handle);
            self.with_criterion_context(handle, |_, context| context.best_saved());
        }
    }

    /// Reinstates the saved best solution. Does nothing if none was saved.
    pub fn restore_best(&mut self, model: &Model<P>, iteration: u64) {
        let Some(best) = self.best.clone() else {
            return;
        };
        for (index, target) in best.iter().enumerate() {
            let variable = VariableId::new(index);
            let same = match (self.value(variable), target) {
                (Some(current), Some(target)) => current.id() == target.id(),
                (None, None) => true,
                _ => false,
            };
            if !same && self.is_assigned(variable) {
                self.unassign(model, iteration, variable);
            }
        }
        for target in best.iter().flatten() {
            if !self.is_assigned(target.variable()) {
                self.assign(model, iteration, target.clone());
            }
        }
        for (handle, _) in model.criteria_with_handles() {
            self.with_criterion_context(handle, |_, context| context.best_restored());
        }
    }

    /// Creates, before any mutation, the contexts an update of `variable`
    /// will touch, so they are seeded from the state they are about to track.
    fn prepare(&mut self, model: &Model<P>, variable: VariableId) {
        self.contexts.grow(model.handle_count());
        for (handle, _) in model.criteria_with_handles() {
            self.ensure_context(model, handle);
        }
        for (handle, _) in model.constraints_touching(variable) {
            self.ensure_context(model, handle);
        }
    }

    fn ensure_context(&self, model: &Model<P>, handle: OwnerHandle) {
        if !self.contexts.contains(handle) {
            let _ = self.context(model, handle);
        }
    }

    fn with_criterion_context<F>(&mut self, handle: OwnerHandle, update: F)
    where
        F: FnOnce(&Assignment<P>, &mut CriterionContext),
    {
        let Some(mut context) = self.contexts.take(handle) else {
            return;
        };
        match context.downcast_mut::<CriterionContext>() {
            Some(criterion_context) => update(self, criterion_context),
            None => debug_assert!(false, "owner {handle:?} holds a foreign context"),
        }
        self.contexts.put(handle, context);
    }
}

impl<P> fmt::Debug for Assignment<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assignment")
            .field("assigned", &self.assigned)
            .field("variables", &self.values.len())
            .field("has_best", &self.best.is_some())
            .field("contexts", &self.contexts)
            .finish()
    }
}
