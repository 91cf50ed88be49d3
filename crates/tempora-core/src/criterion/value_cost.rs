//! Additive value cost criterion.

use super::{Criterion, ValueUpdate};
use crate::assignment::Assignment;
use crate::constraint::Conflicts;
use crate::model::Value;

/// Sum of the assigned values' own cost ([`Value::to_double`]).
///
/// # Example
///
/// ```
/// use tempora_core::criterion::{Criterion, ValueCostCriterion};
///
/// let c = ValueCostCriterion::new("TimePreferences").with_weight(3.0);
/// assert_eq!(Criterion::<()>::weight(&c), 3.0);
/// assert_eq!(Criterion::<()>::weight_name(&c), "TimePreferences.Weight");
/// ```
#[derive(Debug, Clone)]
pub struct ValueCostCriterion {
    name: String,
    weight: f64,
    policy: ValueUpdate,
}

impl ValueCostCriterion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            policy: ValueUpdate::default(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_policy(mut self, policy: ValueUpdate) -> Self {
        self.policy = policy;
        self
    }
}

impl<P> Criterion<P> for ValueCostCriterion {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn update_policy(&self) -> ValueUpdate {
        self.policy
    }

    fn value(&self, _assignment: &Assignment<P>, value: &Value<P>, _excluded: &Conflicts<P>) -> f64 {
        value.to_double()
    }
}
