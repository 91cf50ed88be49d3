//! Lecture timetabling fixtures.
//!
//! Lectures are variables; a value places one lecture at a time slot in a
//! room. A global resource constraint allows one lecture per room and time.
//!
//! # Example
//!
//! ```
//! use tempora_core::Assignment;
//! use tempora_test::timetable::{place, slot, TimetableBuilder};
//!
//! let model = TimetableBuilder::new(3, 2, 2).build();
//! let mut assignment = Assignment::new(&model);
//! place(&model, &mut assignment, &[(0, 0, 0), (1, 0, 1)]);
//!
//! assert!(model.in_conflict(&assignment, &slot(&model, 2, 0, 0)));
//! assert!(!model.in_conflict(&assignment, &slot(&model, 2, 1, 0)));
//! ```

use smallvec::smallvec;
use tempora_core::constraint::ResourceConstraint;
use tempora_core::criterion::{PairPenaltyCriterion, ValueCostCriterion};
use tempora_core::model::{Model, Value, ValueRef, ValueSpec, VariableDef, VariableId};
use tempora_core::{Assignment, AssignmentContext, Conflicts, Constraint};

/// Placement of a lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub time: u32,
    pub room: u32,
}

/// Builds a lecture timetable over a `times x rooms` grid.
///
/// Value cost defaults to the time index and preference to the room index.
#[derive(Debug, Clone)]
pub struct TimetableBuilder {
    lectures: usize,
    times: u32,
    rooms: u32,
    costs: Vec<(usize, u32, u32, f64)>,
    wide: Vec<usize>,
    same_time_penalty: Option<f64>,
    cost_weight: f64,
    closed: Vec<Slot>,
}

impl TimetableBuilder {
    pub fn new(lectures: usize, times: u32, rooms: u32) -> Self {
        Self {
            lectures,
            times,
            rooms,
            costs: Vec::new(),
            wide: Vec::new(),
            same_time_penalty: None,
            cost_weight: 1.0,
            closed: Vec::new(),
        }
    }

    /// Overrides the cost of one placement.
    pub fn cost(mut self, lecture: usize, time: u32, room: u32, cost: f64) -> Self {
        self.costs.push((lecture, time, room, cost));
        self
    }

    /// Every value of `lecture` occupies two rooms at once.
    pub fn wide(mut self, lecture: usize) -> Self {
        self.wide.push(lecture);
        self
    }

    /// Adds a pair criterion penalizing lectures that share a time.
    pub fn same_time_penalty(mut self, penalty: f64) -> Self {
        self.same_time_penalty = Some(penalty);
        self
    }

    pub fn cost_weight(mut self, weight: f64) -> Self {
        self.cost_weight = weight;
        self
    }

    /// No lecture may ever take `room` at `time`.
    pub fn close(mut self, time: u32, room: u32) -> Self {
        self.closed.push(Slot { time, room });
        self
    }

    fn specs(&self, lecture: usize) -> Vec<ValueSpec<Slot>> {
        let arity = if self.wide.contains(&lecture) { 2 } else { 1 };
        let mut specs = Vec::new();
        for time in 0..self.times {
            for room in 0..self.rooms {
                let cost = self
                    .costs
                    .iter()
                    .rev()
                    .find(|&&(l, t, r, _)| l == lecture && t == time && r == room)
                    .map_or(time as f64, |&(_, _, _, cost)| cost);
                specs.push(
                    ValueSpec::new(Slot { time, room })
                        .with_cost(cost)
                        .with_preference(room as f64)
                        .with_arity(arity),
                );
            }
        }
        specs
    }

    pub fn build(self) -> Model<Slot> {
        let mut model = Model::new();
        for lecture in 0..self.lectures {
            model.add_variable(VariableDef::fixed(format!("L{lecture}"), self.specs(lecture)));
        }
        model.add_global_constraint(ResourceConstraint::global("RoomOccupancy", |s: &Slot| {
            smallvec![(s.time, s.room)]
        }));
        if !self.closed.is_empty() {
            model.add_global_constraint(ClosedSlots {
                closed: self.closed,
            });
        }
        model.add_criterion(ValueCostCriterion::new("TimePreference").with_weight(self.cost_weight));
        if let Some(penalty) = self.same_time_penalty {
            model.add_criterion(PairPenaltyCriterion::new(
                "SameTime",
                move |a: &Value<Slot>, b: &Value<Slot>| {
                    if a.payload().time == b.payload().time {
                        penalty
                    } else {
                        0.0
                    }
                },
            ));
        }
        model
    }
}

/// Unary hard constraint: a closed placement conflicts with itself.
struct ClosedSlots {
    closed: Vec<Slot>,
}

impl Constraint<Slot> for ClosedSlots {
    fn name(&self) -> &str {
        "ClosedSlots"
    }

    fn variables(&self) -> &[VariableId] {
        &[]
    }

    fn compute_conflicts(
        &self,
        _assignment: &Assignment<Slot>,
        _context: &dyn AssignmentContext,
        value: &ValueRef<Slot>,
        conflicts: &mut Conflicts<Slot>,
    ) {
        if self.closed.contains(value.payload()) {
            conflicts.insert(value.clone());
        }
    }
}

/// The value of `lecture` placed at `time` in `room`.
///
/// # Panics
///
/// Panics if the placement is outside the grid.
pub fn slot(model: &Model<Slot>, lecture: usize, time: u32, room: u32) -> ValueRef<Slot> {
    model
        .values_of(VariableId::new(lecture))
        .iter()
        .find(|v| *v.payload() == Slot { time, room })
        .cloned()
        .unwrap_or_else(|| panic!("L{lecture} has no slot ({time}, {room})"))
}

/// Assigns `(lecture, time, room)` placements directly, without resolving
/// conflicts.
pub fn place(model: &Model<Slot>, assignment: &mut Assignment<Slot>, placements: &[(usize, u32, u32)]) {
    for &(lecture, time, room) in placements {
        assignment.assign(model, 0, slot(model, lecture, time, room));
    }
}
