//! Student enrollment fixtures for the feasibility checker.
//!
//! Each course or free-time block is a variable whose values are sections
//! at given time slots. Two sections are consistent when their times
//! differ.

use smallvec::smallvec;
use tempora_core::constraint::ResourceConstraint;
use tempora_core::model::{Model, ValueRef, ValueSpec, VariableDef, VariableId};

/// One section of a course, or one free-time block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Section {
    pub time: u32,
}

/// Builder for a one-student enrollment model.
///
/// # Example
///
/// ```
/// use tempora_test::enrollment::Enrollment;
///
/// let mut enrollment = Enrollment::new();
/// let math = enrollment.course("Math", &[1, 2]);
/// let model = enrollment.build();
/// assert_eq!(model.values_of(math).len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Enrollment {
    entries: Vec<(String, Vec<u32>)>,
}

impl Enrollment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an offering with one section per time; returns its variable.
    pub fn course(&mut self, name: &str, times: &[u32]) -> VariableId {
        self.entries.push((name.to_owned(), times.to_vec()));
        VariableId::new(self.entries.len() - 1)
    }

    pub fn build(self) -> Model<Section> {
        let mut model = Model::new();
        for (name, times) in self.entries {
            let specs = times
                .into_iter()
                .map(|time| ValueSpec::new(Section { time }))
                .collect();
            model.add_variable(VariableDef::fixed(name, specs));
        }
        model.add_global_constraint(ResourceConstraint::global("StudentOverlap", |s: &Section| {
            smallvec![s.time]
        }));
        model
    }
}

/// Sections of `variable`, in domain order.
pub fn sections(model: &Model<Section>, variable: VariableId) -> Vec<ValueRef<Section>> {
    model.values_of(variable).to_vec()
}
