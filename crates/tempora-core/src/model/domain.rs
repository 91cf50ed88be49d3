//! Lazily enumerated domains built from resource groups.

use std::sync::Arc;

use smallvec::SmallVec;

use super::value::{Value, ValueRef, ValueSpec};
use super::VariableId;

/// One combination of resources, one pick per group.
pub type Combination<R> = SmallVec<[R; 4]>;

/// Cartesian product over resource groups.
///
/// Each combination picks one resource from every group, in group order.
/// Combinations rejected by the prohibition filter are skipped, which is how
/// placements hitting unavailable slots never become values.
///
/// # Example
///
/// ```
/// use tempora_core::model::ResourceProduct;
///
/// // times x rooms, room 2 unavailable at time 1
/// let product = ResourceProduct::new(vec![vec![0u32, 1], vec![1u32, 2]])
///     .prohibit(|combo| combo[0] == 1 && combo[1] == 2);
///
/// let combos: Vec<_> = product.combinations().map(|c| c.to_vec()).collect();
/// assert_eq!(combos, vec![vec![0, 1], vec![0, 2], vec![1, 1]]);
/// ```
pub struct ResourceProduct<R> {
    groups: Vec<Vec<R>>,
    prohibited: Option<Box<dyn Fn(&[R]) -> bool + Send + Sync>>,
}

impl<R: Clone> ResourceProduct<R> {
    pub fn new(groups: Vec<Vec<R>>) -> Self {
        Self {
            groups,
            prohibited: None,
        }
    }

    pub fn prohibit<F>(mut self, filter: F) -> Self
    where
        F: Fn(&[R]) -> bool + Send + Sync + 'static,
    {
        self.prohibited = Some(Box::new(filter));
        self
    }

    /// Upper bound on the number of combinations (before filtering).
    pub fn size_hint(&self) -> usize {
        if self.groups.is_empty() {
            return 0;
        }
        self.groups.iter().map(Vec::len).product()
    }

    /// Iterates the allowed combinations in lexicographic group order.
    pub fn combinations(&self) -> Combinations<'_, R> {
        let exhausted = self.groups.is_empty() || self.groups.iter().any(Vec::is_empty);
        Combinations {
            product: self,
            cursor: vec![0; self.groups.len()],
            exhausted,
        }
    }

    /// Builds the values of `variable`, one per allowed combination.
    pub fn build_values<P, F>(&self, variable: VariableId, mut make: F) -> Vec<ValueRef<P>>
    where
        F: FnMut(&[R]) -> ValueSpec<P>,
    {
        self.combinations()
            .map(|combo| Arc::new(Value::from_spec(variable, make(&combo))))
            .collect()
    }
}

/// Iterator returned by [`ResourceProduct::combinations`].
pub struct Combinations<'a, R> {
    product: &'a ResourceProduct<R>,
    cursor: Vec<usize>,
    exhausted: bool,
}

impl<R: Clone> Combinations<'_, R> {
    fn current(&self) -> Combination<R> {
        self.cursor
            .iter()
            .zip(&self.product.groups)
            .map(|(&i, group)| group[i].clone())
            .collect()
    }

    fn advance(&mut self) {
        for (pos, group) in self.product.groups.iter().enumerate().rev() {
            self.cursor[pos] += 1;
            if self.cursor[pos] < group.len() {
                return;
            }
            self.cursor[pos] = 0;
        }
        self.exhausted = true;
    }
}

impl<R: Clone> Iterator for Combinations<'_, R> {
    type Item = Combination<R>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let combo = self.current();
            self.advance();
            let skip = self
                .product
                .prohibited
                .as_ref()
                .is_some_and(|prohibited| prohibited(&combo));
            if !skip {
                return Some(combo);
            }
        }
        None
    }
}
