//! Weighted objective components maintained incrementally.
//!
//! A criterion contributes `weight * value` to the objective. Its running
//! total for one assignment lives in a [`CriterionContext`], updated on every
//! assign and unassign according to the criterion's [`ValueUpdate`] policy.
//! At any quiescent point the running total equals
//! [`Criterion::compute_total`] over the whole assignment.
//!
//! # Criterion Types
//!
//! - [`ValueCostCriterion`] - sum of the assigned values' own cost
//! - [`PairPenaltyCriterion`] - penalty summed over pairs of assigned values

mod pair_penalty;
mod value_cost;


use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assignment::Assignment;
use crate::constraint::{AssignEvent, Conflicts, UnassignEvent};
use crate::model::{Model, Payload, Value};

pub use pair_penalty::PairPenaltyCriterion;
pub use value_cost::ValueCostCriterion;

/// Key/value snapshot handed to reporting layers.
pub type Info = BTreeMap<String, String>;

/// When a criterion folds a value's contribution into its running total.
///
/// The order matters for criteria whose contribution depends on the other
/// values present, e.g. a move swapping two values on the same pair of
/// variables: subtracting the outgoing value before or after the incoming
/// one is added yields different intermediate totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueUpdate {
    BeforeUnassignedBeforeAssigned,
    #[default]
    BeforeUnassignedAfterAssigned,
    AfterUnassignedBeforeAssigned,
    AfterUnassignedAfterAssigned,
    /// The criterion updates its total itself in its hooks.
    Manual,
}

impl ValueUpdate {
    fn before_unassigned(self) -> bool {
        matches!(
            self,
            ValueUpdate::BeforeUnassignedBeforeAssigned | ValueUpdate::BeforeUnassignedAfterAssigned
        )
    }

    fn after_unassigned(self) -> bool {
        matches!(
            self,
            ValueUpdate::AfterUnassignedBeforeAssigned | ValueUpdate::AfterUnassignedAfterAssigned
        )
    }

    fn before_assigned(self) -> bool {
        matches!(
            self,
            ValueUpdate::BeforeUnassignedBeforeAssigned | ValueUpdate::AfterUnassignedBeforeAssigned
        )
    }

    fn after_assigned(self) -> bool {
        matches!(
            self,
            ValueUpdate::BeforeUnassignedAfterAssigned | ValueUpdate::AfterUnassignedAfterAssigned
        )
    }
}

/// Over-approximated range of a criterion's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds { min: 0.0, max: 0.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range, allowing rounding noise.
    pub fn contains(&self, value: f64) -> bool {
        let slack = 1e-9 * (1.0 + self.min.abs().max(self.max.abs()));
        value >= self.min - slack && value <= self.max + slack
    }

    pub fn percentage(&self, value: f64) -> f64 {
        percentage(value, self.min, self.max)
    }
}

impl std::ops::Add for Bounds {
    type Output = Bounds;

    fn add(self, other: Bounds) -> Bounds {
        Bounds::new(self.min + other.min, self.max + other.max)
    }
}

/// Normalized quality of `value` within `[min, max]`, lower values better.
///
/// A degenerate range reports 100%, so criteria without spread never show
/// as undefined. A reversed range (`max < min`) goes through the same ratio.
///
/// ```
/// use tempora_core::criterion::percentage;
///
/// assert_eq!(percentage(0.0, 0.0, 10.0), 100.0);
/// assert_eq!(percentage(10.0, 0.0, 10.0), 0.0);
/// assert_eq!(percentage(2.5, 0.0, 10.0), 75.0);
/// assert_eq!(percentage(7.0, 7.0, 7.0), 100.0);
/// assert_eq!(percentage(15.0, 0.0, 10.0), 0.0);
/// ```
pub fn percentage(value: f64, min: f64, max: f64) -> f64 {
    let spread = max - min;
    if spread.abs() <= 1e-12 * (1.0 + min.abs().max(max.abs())) {
        return 100.0;
    }
    let ratio = ((value - min) / spread).clamp(0.0, 1.0);
    100.0 * (1.0 - ratio)
}

/// A named, weighted scalar function of an assignment.
///
/// Implementors supply the marginal contribution of one value; running
/// totals, best snapshots and bound caching are handled by the engine.
pub trait Criterion<P>: Send + Sync {
    fn name(&self) -> &str;

    fn weight(&self) -> f64;

    /// Configuration key the weight is read from.
    fn weight_name(&self) -> String {
        format!("{}.Weight", self.name())
    }

    fn update_policy(&self) -> ValueUpdate {
        ValueUpdate::default()
    }

    /// Contribution of `value` if it were assigned, treating the values in
    /// `excluded` as unassigned.
    ///
    /// Must be pure. The contribution of other values held by `value`'s own
    /// variable is never counted.
    fn value(&self, assignment: &Assignment<P>, value: &Value<P>, excluded: &Conflicts<P>) -> f64;

    fn weighted_value(
        &self,
        assignment: &Assignment<P>,
        value: &Value<P>,
        excluded: &Conflicts<P>,
    ) -> f64 {
        self.weight() * self.value(assignment, value, excluded)
    }

    /// Full recomputation over every assigned value.
    fn compute_total(&self, assignment: &Assignment<P>) -> f64 {
        let mut excluded = Conflicts::new();
        let mut total = 0.0;
        for value in assignment.assigned_values() {
            total += self.value(assignment, value, &excluded);
            excluded.insert(value.clone());
        }
        total
    }

    /// Range containing every reachable total, partial assignments included.
    ///
    /// The default suits criteria made of per-value terms: each variable
    /// contributes between its cheapest and dearest value, or nothing.
    fn compute_bounds(&self, model: &Model<P>, assignment: &Assignment<P>) -> Bounds
    where
        P: Payload,
    {
        let none = Conflicts::new();
        let mut bounds = Bounds::ZERO;
        for variable in model.variables() {
            let (mut lo, mut hi) = (0.0f64, 0.0f64);
            for value in variable.values() {
                let v = self.value(assignment, value, &none);
                lo = lo.min(v);
                hi = hi.max(v);
            }
            bounds = bounds + Bounds::new(lo, hi);
        }
        bounds
    }

    /// Hook for [`ValueUpdate::Manual`] criteria, after a value is installed.
    fn assigned(
        &self,
        _assignment: &Assignment<P>,
        _context: &mut CriterionContext,
        _event: &AssignEvent<'_, P>,
    ) {
    }

    /// Hook for [`ValueUpdate::Manual`] criteria, after a value is removed.
    fn unassigned(
        &self,
        _assignment: &Assignment<P>,
        _context: &mut CriterionContext,
        _event: &UnassignEvent<'_, P>,
    ) {
    }

    /// Adds this criterion's line to a report.
    fn info(&self, summary: &CriterionSummary, info: &mut Info) {
        if self.weight() != 0.0 {
            info.insert(
                self.name().to_owned(),
                format!("{:.2} ({:.1}%)", summary.value, summary.percentage()),
            );
        }
    }

    /// Adds detail lines for extended reports.
    fn extended_info(&self, summary: &CriterionSummary, info: &mut Info) {
        info.insert(
            format!("{} bounds", self.name()),
            format!("[{:.2}, {:.2}]", summary.bounds.min, summary.bounds.max),
        );
    }
}

/// Read-only snapshot of one criterion over one assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionSummary {
    pub value: f64,
    pub weighted: f64,
    pub bounds: Bounds,
}

impl CriterionSummary {
    pub fn percentage(&self) -> f64 {
        self.bounds.percentage(self.value)
    }
}

const NO_GENERATION: u64 = u64::MAX;

/// Bounds cached against the model generation they were computed for.
///
/// Lock free: concurrent readers either see a complete entry for the
/// current generation or recompute.
#[derive(Debug)]
struct BoundsCache {
    generation: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl BoundsCache {
    fn new() -> Self {
        Self {
            generation: AtomicU64::new(NO_GENERATION),
            min: AtomicU64::new(0),
            max: AtomicU64::new(0),
        }
    }

    fn get(&self, generation: u64) -> Option<Bounds> {
        if self.generation.load(Ordering::Acquire) != generation {
            return None;
        }
        Some(Bounds::new(
            f64::from_bits(self.min.load(Ordering::Relaxed)),
            f64::from_bits(self.max.load(Ordering::Relaxed)),
        ))
    }

    fn store(&self, generation: u64, bounds: Bounds) {
        self.generation.store(NO_GENERATION, Ordering::Release);
        self.min.store(bounds.min.to_bits(), Ordering::Relaxed);
        self.max.store(bounds.max.to_bits(), Ordering::Relaxed);
        self.generation.store(generation, Ordering::Release);
    }
}

/// State one criterion keeps for one assignment.
#[derive(Debug)]
pub struct CriterionContext {
    total: f64,
    best: Option<f64>,
    bounds: BoundsCache,
}

impl CriterionContext {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            best: None,
            bounds: BoundsCache::new(),
        }
    }

    /// Running total, unweighted.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Total recorded at the last best-solution save, if this context saw
    /// one.
    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn inc(&mut self, delta: f64) {
        self.total += delta;
    }

    pub fn best_saved(&mut self) {
        self.best = Some(self.total);
    }

    /// Contexts created after the save keep the total they re-accumulated.
    pub fn best_restored(&mut self) {
        if let Some(best) = self.best {
            self.total = best;
        }
    }

    pub(crate) fn cached_bounds(&self, generation: u64) -> Option<Bounds> {
        self.bounds.get(generation)
    }

    pub(crate) fn cache_bounds(&self, generation: u64, bounds: Bounds) {
        self.bounds.store(generation, bounds);
    }

    pub(crate) fn before_unassigned<P>(
        &mut self,
        criterion: &dyn Criterion<P>,
        assignment: &Assignment<P>,
        value: &Value<P>,
    ) {
        if criterion.update_policy().before_unassigned() {
            self.total -= criterion.value(assignment, value, &Conflicts::new());
        }
    }

    pub(crate) fn after_unassigned<P>(
        &mut self,
        criterion: &dyn Criterion<P>,
        assignment: &Assignment<P>,
        event: &UnassignEvent<'_, P>,
    ) {
        if criterion.update_policy().after_unassigned() {
            self.total -= criterion.value(assignment, event.value, &Conflicts::new());
        }
        criterion.unassigned(assignment, self, event);
    }

    pub(crate) fn before_assigned<P>(
        &mut self,
        criterion: &dyn Criterion<P>,
        assignment: &Assignment<P>,
        value: &Value<P>,
    ) {
        if criterion.update_policy().before_assigned() {
            self.total += criterion.value(assignment, value, &Conflicts::new());
        }
    }

    pub(crate) fn after_assigned<P>(
        &mut self,
        criterion: &dyn Criterion<P>,
        assignment: &Assignment<P>,
        event: &AssignEvent<'_, P>,
    ) {
        if criterion.update_policy().after_assigned() {
            self.total += criterion.value(assignment, event.value, &Conflicts::new());
        }
        criterion.assigned(assignment, self, event);
    }
}
