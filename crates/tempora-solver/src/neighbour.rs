//! Neighbours: atomic changes of an assignment with a precomputed delta.

use std::fmt::Debug;

use tempora_core::{Assignment, Conflicts, Model, Payload, ValueRef};

/// A proposed change of an assignment.
///
/// `delta` is the change of the weighted objective the change would cause;
/// negative is an improvement.
pub trait Neighbour<P>: Send + Debug {
    fn delta(&self) -> f64;

    /// Values the change assigns, the moved value first.
    fn values(&self) -> &[ValueRef<P>];

    /// Applies the change, displacing whatever conflicts with it.
    fn commit(&self, model: &Model<P>, assignment: &mut Assignment<P>, iteration: u64);
}

/// Assign one value and unassign its conflicts.
pub struct SimpleNeighbour<P> {
    value: ValueRef<P>,
    conflicts: Conflicts<P>,
    delta: f64,
}

impl<P: Payload> SimpleNeighbour<P> {
    /// Evaluates assigning `value` against the current state.
    ///
    /// Returns `None` if `value` is prohibited.
    pub fn new(model: &Model<P>, assignment: &Assignment<P>, value: ValueRef<P>) -> Option<Self> {
        let conflicts = model.removable_conflicts(assignment, &value)?;
        let delta = model.move_delta(assignment, &value, &conflicts);
        Some(Self {
            value,
            conflicts,
            delta,
        })
    }

    /// Values this neighbour would unassign.
    pub fn conflicts(&self) -> &Conflicts<P> {
        &self.conflicts
    }
}

impl<P: Payload> Neighbour<P> for SimpleNeighbour<P> {
    fn delta(&self) -> f64 {
        self.delta
    }

    fn values(&self) -> &[ValueRef<P>] {
        std::slice::from_ref(&self.value)
    }

    fn commit(&self, model: &Model<P>, assignment: &mut Assignment<P>, iteration: u64) {
        model.commit(assignment, iteration, self.value.clone());
    }
}

impl<P> Debug for SimpleNeighbour<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleNeighbour")
            .field("variable", &self.value.variable())
            .field("value", &self.value.id())
            .field("conflicts", &self.conflicts)
            .field("delta", &self.delta)
            .finish()
    }
}

/// A moved value plus one alternative per displaced variable, as found by
/// the swap resolver.
pub struct CascadeNeighbour<P> {
    values: Vec<ValueRef<P>>,
    delta: f64,
}

impl<P> CascadeNeighbour<P> {
    pub(crate) fn new(values: Vec<ValueRef<P>>, delta: f64) -> Self {
        debug_assert!(!values.is_empty());
        Self { values, delta }
    }

    /// Number of displaced variables that get an alternative.
    pub fn cascade_len(&self) -> usize {
        self.values.len().saturating_sub(1)
    }
}

impl<P: Payload> Neighbour<P> for CascadeNeighbour<P> {
    fn delta(&self) -> f64 {
        self.delta
    }

    fn values(&self) -> &[ValueRef<P>] {
        &self.values
    }

    /// Commits the values in order. Each alternative was checked against
    /// the state the previous ones leave behind, so nothing beyond the
    /// original conflicts is displaced.
    fn commit(&self, model: &Model<P>, assignment: &mut Assignment<P>, iteration: u64) {
        for value in &self.values {
            model.commit(assignment, iteration, value.clone());
        }
    }
}

impl<P> Debug for CascadeNeighbour<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeNeighbour")
            .field(
                "values",
                &self
                    .values
                    .iter()
                    .map(|v| (v.variable(), v.id()))
                    .collect::<Vec<_>>(),
            )
            .field("delta", &self.delta)
            .finish()
    }
}
