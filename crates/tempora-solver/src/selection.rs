//! Neighbour selection.

use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempora_core::{Assignment, Model, Payload, ValueRef};
use tracing::trace;

use crate::neighbour::{Neighbour, SimpleNeighbour};
use crate::resolver::SwapResolver;

/// Proposes neighbours for a search driver.
///
/// Returning `None` is the ordinary "no move this time" outcome. The
/// assignment may be mutated during selection but is left as found.
pub trait NeighbourSelection<P>: Send + Debug {
    fn select_neighbour(
        &mut self,
        model: &Model<P>,
        assignment: &mut Assignment<P>,
        iteration: u64,
    ) -> Option<Box<dyn Neighbour<P>>>;
}

/// Picks a random variable and a random value of it. Conflicting values go
/// through the [`SwapResolver`].
#[derive(Debug, Clone)]
pub struct ConflictSwapSelection {
    resolver: SwapResolver,
    rng: ChaCha8Rng,
}

impl ConflictSwapSelection {
    pub fn new(resolver: SwapResolver, seed: u64) -> Self {
        Self {
            resolver,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn resolver(&self) -> &SwapResolver {
        &self.resolver
    }

    fn random_value<P: Payload>(&mut self, model: &Model<P>) -> Option<ValueRef<P>> {
        let count = model.variable_count();
        if count == 0 {
            return None;
        }
        let variable = model.variables().nth(self.rng.random_range(0..count))?;
        let values = variable.values();
        if values.is_empty() {
            return None;
        }
        Some(values[self.rng.random_range(0..values.len())].clone())
    }
}

impl<P: Payload> NeighbourSelection<P> for ConflictSwapSelection {
    fn select_neighbour(
        &mut self,
        model: &Model<P>,
        assignment: &mut Assignment<P>,
        iteration: u64,
    ) -> Option<Box<dyn Neighbour<P>>> {
        let value = self.random_value(model)?;
        if assignment.value(value.variable()) == Some(&value) {
            return None;
        }

        let simple = SimpleNeighbour::new(model, assignment, value.clone())?;
        if simple.conflicts().is_empty() {
            trace!(event = "select", variable = %value.variable(), cascade = false);
            return Some(Box::new(simple));
        }

        trace!(
            event = "select",
            variable = %value.variable(),
            cascade = true,
            displaced = simple.conflicts().len(),
        );
        let resolution = self
            .resolver
            .resolve(model, assignment, &value, iteration, &mut self.rng);
        resolution
            .neighbour
            .map(|neighbour| Box::new(neighbour) as Box<dyn Neighbour<P>>)
    }
}
