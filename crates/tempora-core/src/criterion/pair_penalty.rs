//! Pairwise penalty criterion.

use super::{Bounds, Criterion, ValueUpdate};
use crate::assignment::Assignment;
use crate::constraint::Conflicts;
use crate::model::{Model, Payload, Value};

type PenaltyFn<P> = Box<dyn Fn(&Value<P>, &Value<P>) -> f64 + Send + Sync>;

/// Penalty summed over unordered pairs of assigned values of distinct
/// variables, e.g. student conflicts between two classes or back-to-back
/// distance penalties.
///
/// The penalty function must be symmetric.
pub struct PairPenaltyCriterion<P> {
    name: String,
    weight: f64,
    policy: ValueUpdate,
    penalty: PenaltyFn<P>,
}

impl<P> PairPenaltyCriterion<P> {
    pub fn new<F>(name: impl Into<String>, penalty: F) -> Self
    where
        F: Fn(&Value<P>, &Value<P>) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            weight: 1.0,
            policy: ValueUpdate::default(),
            penalty: Box::new(penalty),
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

    pub fn penalty(&self, first: &Value<P>, second: &Value<P>) -> f64 {
        (self.penalty)(first, second)
    }
}

impl<P> std::fmt::Debug for PairPenaltyCriterion<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairPenaltyCriterion")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<P: Payload> Criterion<P> for PairPenaltyCriterion<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn update_policy(&self) -> ValueUpdate {
        self.policy
    }

    fn value(&self, assignment: &Assignment<P>, value: &Value<P>, excluded: &Conflicts<P>) -> f64 {
        assignment
            .assigned_values()
            .filter(|other| other.variable() != value.variable() && !excluded.contains(other))
            .map(|other| (self.penalty)(value, other))
            .sum()
    }

    fn compute_bounds(&self, model: &Model<P>, _assignment: &Assignment<P>) -> Bounds {
        let variables: Vec<_> = model.variables().collect();
        let mut bounds = Bounds::ZERO;
        for (i, first) in variables.iter().enumerate() {
            for second in &variables[i + 1..] {
                let (mut lo, mut hi) = (0.0f64, 0.0f64);
                for a in first.values() {
                    for b in second.values() {
                        let p = (self.penalty)(a, b);
                        lo = lo.min(p);
                        hi = hi.max(p);
                    }
                }
                bounds = bounds + Bounds::new(lo, hi);
            }
        }
        bounds
    }
}
