//! Candidate values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::VariableId;

static NEXT_VALUE_ID: AtomicU64 = AtomicU64::new(0);

/// Globally unique identity of a [`Value`].
///
/// Two values are the same candidate only if they share an id, even when
/// their payloads compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(u64);

impl ValueId {
    fn next() -> Self {
        ValueId(NEXT_VALUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to an immutable value.
pub type ValueRef<P> = Arc<Value<P>>;

/// One candidate assignment of a single variable.
///
/// Values are immutable. When the concrete resources behind a placement
/// change, a new value is built rather than the old one being edited.
///
/// # Example
///
/// ```
/// use tempora_core::model::{Value, ValueSpec, VariableId};
///
/// let spec = ValueSpec::new("Mon 8:00 / R101").with_cost(2.0).with_arity(1);
/// let value = Value::from_spec(VariableId::new(0), spec);
///
/// assert_eq!(value.variable(), VariableId::new(0));
/// assert_eq!(value.to_double(), 2.0);
/// assert_eq!(*value.payload(), "Mon 8:00 / R101");
/// ```
pub struct Value<P> {
    id: ValueId,
    variable: VariableId,
    cost: f64,
    preference: f64,
    arity: usize,
    payload: P,
}

impl<P> Value<P> {
    /// Builds a value for `variable` from a spec, issuing a fresh id.
    pub fn from_spec(variable: VariableId, spec: ValueSpec<P>) -> Self {
        Self {
            id: ValueId::next(),
            variable,
            cost: spec.cost,
            preference: spec.preference,
            arity: spec.arity,
            payload: spec.payload,
        }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn variable(&self) -> VariableId {
        self.variable
    }

    /// The self-cost used by simple additive criteria.
    pub fn to_double(&self) -> f64 {
        self.cost
    }

    /// Static preference of this placement, lower is better.
    pub fn preference(&self) -> f64 {
        self.preference
    }

    /// Number of concurrent resources this placement occupies.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<P> PartialEq for Value<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Value<P> {}

impl<P> Hash for Value<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<P: fmt::Debug> fmt::Debug for Value<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("variable", &self.variable)
            .field("cost", &self.cost)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Description of a value before it is bound to a variable.
#[derive(Debug, Clone)]
pub struct ValueSpec<P> {
    pub cost: f64,
    pub preference: f64,
    pub arity: usize,
    pub payload: P,
}

impl<P> ValueSpec<P> {
    /// A zero-cost, zero-preference, single-resource value.
    pub fn new(payload: P) -> Self {
        Self {
            cost: 0.0,
            preference: 0.0,
            arity: 1,
            payload,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_preference(mut self, preference: f64) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }
}
