//! Tests for the entity graph.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::constraint::{Conflicts, Constraint, PairConstraint};
use crate::test_utils::{slot, timetable, Slot};

#[test]
fn test_variables_keep_ids_after_removal() {
    let mut model = timetable(3, 2, 2);
    let before = model.generation();

    let removed = model.remove_variable(VariableId::new(1));

    assert!(removed.is_some());
    assert!(model.generation() > before);
    assert_eq!(model.variable_count(), 2);
    assert_eq!(model.variable_capacity(), 3);
    assert!(model.variable(VariableId::new(1)).is_none());
    assert_eq!(model.variable(VariableId::new(2)).unwrap().name(), "L2");
    assert!(model.values_of(VariableId::new(1)).is_empty());
    assert_eq!(
        model.try_variable(VariableId::new(1)).unwrap_err(),
        TemporaError::UnknownVariable(VariableId::new(1))
    );
}

#[test]
fn test_values_are_bound_to_their_variable() {
    let model = timetable(2, 2, 2);
    for variable in model.variables() {
        assert_eq!(variable.values().len(), 4);
        assert!(variable.values().iter().all(|v| v.variable() == variable.id()));
    }
    let ids: std::collections::HashSet<_> = model
        .variables()
        .flat_map(|v| v.values().iter().map(|value| value.id()))
        .collect();
    assert_eq!(ids.len(), 8);
}

#[test]
fn test_lazy_domain_built_once_until_invalidated() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let mut model: Model<u32> = Model::new();
    let id = model.add_variable(VariableDef::lazy("Lazy", move |variable| {
        counter.fetch_add(1, Ordering::SeqCst);
        (0..3)
            .map(|p| Arc::new(Value::from_spec(variable, ValueSpec::new(p))))
            .collect()
    }));

    assert_eq!(builds.load(Ordering::SeqCst), 0);
    let first = model.values_of(id)[0].id();
    assert_eq!(model.values_of(id).len(), 3);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    let generation = model.generation();
    assert!(model.invalidate_domain(id));
    assert!(model.generation() > generation);

    assert_ne!(model.values_of(id)[0].id(), first);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_fixed_domain_survives_invalidation() {
    let mut model = timetable(1, 1, 2);
    let generation = model.generation();
    assert!(!model.invalidate_domain(VariableId::new(0)));
    assert_eq!(model.generation(), generation);
    assert_eq!(model.values_of(VariableId::new(0)).len(), 2);
}

#[test]
fn test_set_initial_checks_domain() {
    let mut model = timetable(1, 1, 2);
    let id = VariableId::new(0);

    model.set_initial(id, Some(1)).unwrap();
    assert_eq!(
        model.variable(id).unwrap().initial().unwrap().payload(),
        &Slot { time: 0, room: 1 }
    );

    assert_eq!(
        model.set_initial(id, Some(7)),
        Err(TemporaError::ValueOutOfDomain {
            variable: id,
            index: 7
        })
    );
    model.set_initial(id, None).unwrap();
    assert!(model.variable(id).unwrap().initial().is_none());
}

#[test]
fn test_constraints_touching_lists_own_then_global() {
    let mut model = timetable(3, 1, 2);
    let pair = model.add_constraint(PairConstraint::new(
        "Different",
        vec![VariableId::new(0), VariableId::new(2)],
        |a: &Value<Slot>, b: &Value<Slot>| a.payload().room != b.payload().room,
    ));

    let names: Vec<_> = model
        .constraints_touching(VariableId::new(0))
        .map(|(_, c)| c.name().to_owned())
        .collect();
    assert_eq!(names, vec!["Different", "RoomOccupancy"]);

    let names: Vec<_> = model
        .constraints_touching(VariableId::new(1))
        .map(|(_, c)| c.name().to_owned())
        .collect();
    assert_eq!(names, vec!["RoomOccupancy"]);

    let handle = model.constraint_handle(pair).unwrap();
    assert!(model.is_live_owner(handle));
    assert!(model.remove_constraint(pair).is_some());
    assert!(!model.is_live_owner(handle));
    assert_eq!(model.constraints_touching(VariableId::new(0)).count(), 1);
    assert!(model.remove_constraint(pair).is_none());
}

#[test]
fn test_conflicts_and_commit() {
    let model = timetable(3, 2, 2);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 0, 0));
    assignment.assign(&model, 1, slot(&model, 1, 0, 1));

    let wanted = slot(&model, 2, 0, 0);
    let conflicts = model.conflicts(&assignment, &wanted);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts.contains(&slot(&model, 0, 0, 0)));
    assert!(model.in_conflict(&assignment, &wanted));
    assert!(!model.in_conflict(&assignment, &slot(&model, 2, 1, 0)));

    let displaced = model.commit(&mut assignment, 2, wanted.clone()).unwrap();
    assert!(displaced.contains_variable(VariableId::new(0)));
    assert!(!assignment.is_assigned(VariableId::new(0)));
    assert_eq!(assignment.value(VariableId::new(2)), Some(&wanted));
    assert_eq!(assignment.assigned_count(), 2);
}

/// Forbids one payload outright by reporting the value itself.
struct Forbidden(Slot);

impl Constraint<Slot> for Forbidden {
    fn name(&self) -> &str {
        "Forbidden"
    }

    fn variables(&self) -> &[VariableId] {
        &[]
    }

    fn compute_conflicts(
        &self,
        _: &Assignment<Slot>,
        _: &dyn crate::assignment::AssignmentContext,
        value: &ValueRef<Slot>,
        conflicts: &mut Conflicts<Slot>,
    ) {
        if *value.payload() == self.0 {
            conflicts.insert(value.clone());
        }
    }
}

#[test]
fn test_commit_refuses_prohibited_value() {
    let mut model = timetable(2, 2, 2);
    model.add_global_constraint(Forbidden(Slot { time: 1, room: 1 }));
    let mut assignment = Assignment::new(&model);
    let held = slot(&model, 0, 0, 0);
    assignment.assign(&model, 1, held.clone());

    let closed = slot(&model, 0, 1, 1);
    assert!(model.conflicts(&assignment, &closed).contains(&closed));
    assert!(model.removable_conflicts(&assignment, &closed).is_none());
    assert!(model.commit(&mut assignment, 2, closed).is_none());
    assert_eq!(assignment.value(VariableId::new(0)), Some(&held));
    assert_eq!(assignment.iteration(VariableId::new(0)), 1);

    let open = slot(&model, 1, 1, 0);
    assert!(model.commit(&mut assignment, 3, open.clone()).is_some());
    assert_eq!(assignment.value(VariableId::new(1)), Some(&open));
}

#[test]
fn test_own_variable_never_conflicts() {
    let model = timetable(1, 1, 2);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 0, 0));

    let same_slot = slot(&model, 0, 0, 0);
    assert!(model.conflicts(&assignment, &same_slot).is_empty());
}

#[test]
fn test_move_delta_matches_committed_change() {
    let model = timetable(3, 2, 2);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 0, 0));
    assignment.assign(&model, 1, slot(&model, 1, 0, 1));
    assignment.assign(&model, 1, slot(&model, 2, 1, 1));

    for candidate in [
        slot(&model, 2, 0, 0),
        slot(&model, 2, 1, 0),
        slot(&model, 0, 1, 0),
        slot(&model, 1, 1, 1),
    ] {
        let before = model.total_value(&assignment);
        let conflicts = model.conflicts(&assignment, &candidate);
        let projected = model.move_delta(&assignment, &candidate, &conflicts);

        let mut trial = Assignment::new(&model);
        for value in assignment.assigned_values() {
            trial.assign(&model, 1, value.clone());
        }
        model.commit(&mut trial, 2, candidate.clone());
        let actual = model.total_value(&trial) - before;

        assert!(
            (projected - actual).abs() < 1e-9,
            "{candidate:?}: projected {projected}, actual {actual}"
        );
    }
}

#[test]
fn test_total_value_is_weighted() {
    let mut model = timetable(2, 2, 1);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 1, 0));
    assignment.assign(&model, 1, slot(&model, 1, 0, 0));
    // cost 1 + 0, no shared time
    assert_eq!(model.total_value(&assignment), 1.0);

    model.add_criterion(crate::criterion::ValueCostCriterion::new("Doubled").with_weight(2.0));
    assert_eq!(model.total_value(&assignment), 3.0);
}

#[test]
fn test_info_reports_each_criterion() {
    let model = timetable(2, 2, 1);
    let mut assignment = Assignment::new(&model);
    assignment.assign(&model, 1, slot(&model, 0, 1, 0));

    let info = model.info(&assignment);
    assert_eq!(info["Assigned variables"], "1/2");
    assert_eq!(info["Overall solution value"], "1.00");
    assert!(info.contains_key("TimePreference"));
    assert!(info.contains_key("SameTime"));

    let extended = model.extended_info(&assignment);
    assert_eq!(extended["TimePreference bounds"], "[0.00, 2.00]");
}

#[test]
fn test_criterion_lookup_by_name() {
    let model = timetable(1, 1, 1);
    let (handle, criterion) = model.criterion("SameTime").unwrap();
    assert_eq!(criterion.name(), "SameTime");
    assert!(model.is_live_owner(handle));
    assert!(model.criterion("Missing").is_none());
}
