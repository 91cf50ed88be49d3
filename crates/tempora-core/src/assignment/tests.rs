//! Tests for assignments and the context cache.

use super::*;
use crate::constraint::ResourceConstraint;
use crate::test_utils::{slot, timetable, Slot};

#[test]
fn test_assign_replaces_previous_value() {
    let model = timetable(2, 2, 2);
    let mut assignment = Assignment::new(&model);
    let first = slot(&model, 0, 0, 0);
    let second = slot(&model, 0, 1, 1);

    assignment.assign(&model, 3, first.clone());
    assert_eq!(assignment.value(VariableId::new(0)), Some(&first));
    assert_eq!(assignment.iteration(VariableId::new(0)), 3);

    assignment.assign(&model, 5, second.clone());
    assert_eq!(assignment.value(VariableId::new(0)), Some(&second));
    assert_eq!(assignment.assigned_count(), 1);
    assert_eq!(assignment.iteration(VariableId::new(0)), 5);
}

#[test]
fn test_unassign_returns_the_removed_value() {
    let model = timetable(2, 2, 2);
    let mut assignment = Assignment::new(&model);
    let value = slot(&model, 1, 1, 0);
    assignment.assign(&model, 1, value.clone());

    assert_eq!(assignment.unassign(&model, 2, VariableId::new(1)), Some(value));
    assert_eq!(assignment.unassign(&model, 3, VariableId::new(1)), None);
    assert_eq!(assignment.assigned_count(), 0);
    assert_eq!(assignment.iteration(VariableId::new(1)), 2);
}

#[test]
fn test_unassigned_variables() {
    let model = timetable(3, 2, 2);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 1, 0, 0));

    let open: Vec<_> = assignment.unassigned_variables(&model).collect();
    assert_eq!(open, vec![VariableId::new(0), VariableId::new(2)]);
    let taken: Vec<_> = assignment.assigned_variables().collect();
    assert_eq!(taken, vec![VariableId::new(1)]);
}

#[test]
fn test_contexts_are_created_lazily() {
    let model = timetable(2, 2, 2);
    let assignment = Assignment::new(&model);
    let (handle, _) = model.constraints_touching(VariableId::new(0)).next().unwrap();

    assert!(!assignment.contexts().contains(handle));
    let _ = model.conflicts(&assignment, &slot(&model, 0, 0, 0));
    assert!(assignment.contexts().contains(handle));
}

#[test]
fn test_assignments_over_one_model_are_isolated() {
    let model = timetable(2, 1, 1);
    let mut left = Assignment::new(&model);
    let mut right = Assignment::new(&model);

    left.assign(&model, 1, slot(&model, 0, 0, 0));
    right.assign(&model, 1, slot(&model, 1, 0, 0));

    // each only sees its own occupant
    assert!(model.conflicts(&left, &slot(&model, 1, 0, 0)).contains_variable(VariableId::new(0)));
    assert!(model.conflicts(&right, &slot(&model, 0, 0, 0)).contains_variable(VariableId::new(1)));

    left.unassign(&model, 2, VariableId::new(0));
    assert!(!model.in_conflict(&left, &slot(&model, 1, 0, 0)));
    assert!(model.in_conflict(&right, &slot(&model, 0, 0, 0)));
}

#[test]
fn test_owner_registered_after_assignment_is_seeded_from_state() {
    let mut model = timetable(2, 1, 2);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 0, 0));

    let wanted = slot(&model, 1, 0, 1);
    assert!(!model.in_conflict(&assignment, &wanted));

    // second constraint keyed by time only
    model.add_global_constraint(ResourceConstraint::global("OnePerTime", |s: &Slot| {
        [s.time].into_iter().collect()
    }));
    assert!(model.in_conflict(&assignment, &wanted));

    assignment.unassign(&model, 2, VariableId::new(0));
    assert!(!model.in_conflict(&assignment, &wanted));
}

#[test]
fn test_try_context_rejects_unknown_owner() {
    let model = timetable(1, 1, 1);
    let assignment = Assignment::new(&model);

    let bogus = OwnerHandle::new(model.handle_count() + 4);
    assert_eq!(
        assignment.try_context(&model, bogus).err(),
        Some(TemporaError::UnknownOwner(bogus.index()))
    );
    let (handle, _) = model.criterion("TimePreference").unwrap();
    assert!(assignment.try_context(&model, handle).is_ok());
}

#[test]
fn test_removed_owner_is_not_live() {
    let mut model = timetable(2, 1, 1);
    let id = model.add_constraint(ResourceConstraint::new(
        "Local",
        vec![VariableId::new(0)],
        |s: &Slot| [s.room].into_iter().collect(),
    ));
    let handle = model.constraint_handle(id).unwrap();
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 0, 0));
    assert!(assignment.contexts().contains(handle));

    model.remove_constraint(id);
    assert!(assignment.try_context(&model, handle).is_err());
    // the orphaned context is simply left behind
    assignment.assign(&model, 2, slot(&model, 1, 0, 0));
}

#[test]
fn test_displaced_values_reach_constraints() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::constraint::{AssignEvent, Conflicts, Constraint};

    struct DisplacedCounter(Arc<AtomicUsize>);

    impl Constraint<Slot> for DisplacedCounter {
        fn name(&self) -> &str {
            "DisplacedCounter"
        }

        fn variables(&self) -> &[VariableId] {
            &[]
        }

        fn is_hard(&self) -> bool {
            false
        }

        fn compute_conflicts(
            &self,
            _: &Assignment<Slot>,
            _: &dyn AssignmentContext,
            _: &ValueRef<Slot>,
            _: &mut Conflicts<Slot>,
        ) {
        }

        fn assigned(
            &self,
            _: &Assignment<Slot>,
            _: &mut dyn AssignmentContext,
            event: &AssignEvent<'_, Slot>,
        ) {
            if let Some(displaced) = event.displaced {
                self.0.fetch_add(displaced.len(), Ordering::SeqCst);
            }
        }
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let mut model = timetable(3, 1, 1);
    model.add_global_constraint(DisplacedCounter(counter.clone()));
    let mut assignment = Assignment::new(&model);

    model.commit(&mut assignment, 1, slot(&model, 0, 0, 0));
    model.commit(&mut assignment, 2, slot(&model, 1, 0, 0));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
