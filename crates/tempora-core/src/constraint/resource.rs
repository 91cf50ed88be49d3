//! Resource occupancy constraint.

use std::collections::HashMap;
use std::hash::Hash;

use smallvec::SmallVec;

use super::{AssignEvent, Conflicts, Constraint, UnassignEvent};
use crate::assignment::{Assignment, AssignmentContext};
use crate::model::{Payload, Value, ValueRef, VariableId};

/// Resource keys a value occupies, e.g. `(room, time slot)` pairs.
pub type Keys<K> = SmallVec<[K; 4]>;

/// Two values clash when they occupy a common resource key.
///
/// The per-assignment context indexes assigned values by key, so conflict
/// lookup costs one probe per key of the candidate.
///
/// # Example
///
/// ```
/// use tempora_core::constraint::ResourceConstraint;
/// use tempora_core::model::VariableId;
///
/// // payload is (room, slot); a room holds one lecture per slot
/// let room_slots = ResourceConstraint::new(
///     "RoomOverlap",
///     vec![VariableId::new(0), VariableId::new(1)],
///     |p: &(u32, u32)| [*p].into_iter().collect(),
/// );
/// # let _ = room_slots;
/// ```
pub struct ResourceConstraint<P, K> {
    name: String,
    variables: Vec<VariableId>,
    keys: Box<dyn Fn(&P) -> Keys<K> + Send + Sync>,
}

impl<P, K> ResourceConstraint<P, K> {
    pub fn new<F>(name: impl Into<String>, variables: Vec<VariableId>, keys: F) -> Self
    where
        F: Fn(&P) -> Keys<K> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            variables,
            keys: Box::new(keys),
        }
    }

    /// A constraint meant to be registered as global.
    pub fn global<F>(name: impl Into<String>, keys: F) -> Self
    where
        F: Fn(&P) -> Keys<K> + Send + Sync + 'static,
    {
        Self::new(name, Vec::new(), keys)
    }

    fn covers(&self, variable: VariableId) -> bool {
        self.variables.is_empty() || self.variables.contains(&variable)
    }
}

/// Assigned values indexed by the resource keys they occupy.
pub struct ResourceContext<P, K> {
    occupants: HashMap<K, SmallVec<[ValueRef<P>; 1]>>,
}

impl<P, K: Hash + Eq> ResourceContext<P, K> {
    fn add(&mut self, key: K, value: &ValueRef<P>) {
        self.occupants.entry(key).or_default().push(value.clone());
    }

    fn remove(&mut self, key: &K, value: &ValueRef<P>) {
        if let Some(list) = self.occupants.get_mut(key) {
            list.retain(|v| v.id() != value.id());
            if list.is_empty() {
                self.occupants.remove(key);
            }
        }
    }

    /// Values currently holding `key`.
    pub fn occupants(&self, key: &K) -> &[ValueRef<P>] {
        self.occupants.get(key).map_or(&[], |list| list.as_slice())
    }
}

impl<P, K> Constraint<P> for ResourceConstraint<P, K>
where
    P: Payload,
    K: Hash + Eq + Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    fn create_context(&self, assignment: &Assignment<P>) -> Box<dyn AssignmentContext> {
        let mut context = ResourceContext {
            occupants: HashMap::new(),
        };
        for value in assignment.assigned_values() {
            if self.covers(value.variable()) {
                for key in (self.keys)(value.payload()) {
                    context.add(key, value);
                }
            }
        }
        Box::new(context)
    }

    fn compute_conflicts(
        &self,
        _assignment: &Assignment<P>,
        context: &dyn AssignmentContext,
        value: &ValueRef<P>,
        conflicts: &mut Conflicts<P>,
    ) {
        let Some(context) = context.downcast_ref::<ResourceContext<P, K>>() else {
            debug_assert!(false, "{}: foreign context", self.name);
            return;
        };
        for key in (self.keys)(value.payload()) {
            for other in context.occupants(&key) {
                if other.variable() != value.variable() {
                    conflicts.insert(other.clone());
                }
            }
        }
    }

    fn in_conflict(
        &self,
        _assignment: &Assignment<P>,
        context: &dyn AssignmentContext,
        value: &ValueRef<P>,
    ) -> bool {
        let Some(context) = context.downcast_ref::<ResourceContext<P, K>>() else {
            return false;
        };
        (self.keys)(value.payload()).iter().any(|key| {
            context
                .occupants(key)
                .iter()
                .any(|other| other.variable() != value.variable())
        })
    }

    fn is_consistent(&self, first: &Value<P>, second: &Value<P>) -> bool {
        if first.variable() == second.variable()
            || !self.covers(first.variable())
            || !self.covers(second.variable())
        {
            return true;
        }
        let left = (self.keys)(first.payload());
        let right = (self.keys)(second.payload());
        !left.iter().any(|key| right.contains(key))
    }

    fn assigned(
        &self,
        _assignment: &Assignment<P>,
        context: &mut dyn AssignmentContext,
        event: &AssignEvent<'_, P>,
    ) {
        if let Some(context) = context.downcast_mut::<ResourceContext<P, K>>() {
            for key in (self.keys)(event.value.payload()) {
                context.add(key, event.value);
            }
        }
    }

    fn unassigned(
        &self,
        _assignment: &Assignment<P>,
        context: &mut dyn AssignmentContext,
        event: &UnassignEvent<'_, P>,
    ) {
        if let Some(context) = context.downcast_mut::<ResourceContext<P, K>>() {
            for key in (self.keys)(event.value.payload()) {
                context.remove(&key, event.value);
            }
        }
    }
}
