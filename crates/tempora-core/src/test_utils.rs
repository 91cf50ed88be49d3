//! Test utilities for tempora-core
//!
//! A tiny room/time timetable shared by the crate's unit tests.

use crate::constraint::ResourceConstraint;
use crate::criterion::{PairPenaltyCriterion, ValueCostCriterion};
use crate::model::{Model, Value, ValueRef, ValueSpec, VariableDef, VariableId};

/// Placement of a lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub time: u32,
    pub room: u32,
}

/// Every (time, room) placement, costing its time index.
pub fn slot_specs(times: u32, rooms: u32) -> Vec<ValueSpec<Slot>> {
    let mut specs = Vec::new();
    for time in 0..times {
        for room in 0..rooms {
            specs.push(ValueSpec::new(Slot { time, room }).with_cost(time as f64));
        }
    }
    specs
}

/// `lectures` variables over a `times x rooms` grid.
///
/// One lecture per room and time (global hard constraint), cost per value,
/// and a unit penalty for every pair of lectures sharing a time.
pub fn timetable(lectures: usize, times: u32, rooms: u32) -> Model<Slot> {
    let mut model = Model::new();
    for i in 0..lectures {
        model.add_variable(VariableDef::fixed(format!("L{i}"), slot_specs(times, rooms)));
    }
    model.add_global_constraint(ResourceConstraint::global("RoomOccupancy", |s: &Slot| {
        [(s.time, s.room)].into_iter().collect()
    }));
    model.add_criterion(ValueCostCriterion::new("TimePreference"));
    model.add_criterion(PairPenaltyCriterion::new("SameTime", |a: &Value<Slot>, b: &Value<Slot>| {
        if a.payload().time == b.payload().time {
            1.0
        } else {
            0.0
        }
    }));
    model
}

/// The value of `variable` placed at `time` in `room`.
pub fn slot(model: &Model<Slot>, variable: usize, time: u32, room: u32) -> ValueRef<Slot> {
    model
        .values_of(VariableId::new(variable))
        .iter()
        .find(|v| *v.payload() == Slot { time, room })
        .cloned()
        .expect("slot outside the fixture grid")
}
