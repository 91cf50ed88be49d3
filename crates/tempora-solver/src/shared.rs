//! An assignment shared between threads.
//!
//! Resolver invocations mutate the assignment speculatively, so they run
//! under the write lock from start to finish. Every trial change is unwound
//! before the lock is released, which also makes a poisoned lock safe to
//! recover.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use tempora_core::{Assignment, Model, Payload, ValueRef};

use crate::neighbour::Neighbour;
use crate::resolver::{Resolution, SwapResolver};

/// A cloneable handle to one assignment behind a read-write lock.
#[derive(Debug)]
pub struct SharedAssignment<P> {
    inner: Arc<RwLock<Assignment<P>>>,
}

impl<P> Clone for SharedAssignment<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Payload> SharedAssignment<P> {
    pub fn new(assignment: Assignment<P>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(assignment)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Assignment<P>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Assignment<P>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` under the read lock.
    pub fn evaluate<R>(&self, f: impl FnOnce(&Assignment<P>) -> R) -> R {
        f(&self.read())
    }

    /// Runs the resolver with the write lock held for the whole invocation.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        resolver: &SwapResolver,
        model: &Model<P>,
        value: &ValueRef<P>,
        iteration: u64,
        rng: &mut R,
    ) -> Resolution<P> {
        let mut assignment = self.write();
        resolver.resolve(model, &mut assignment, value, iteration, rng)
    }

    /// Resolves and commits the found neighbour without releasing the write
    /// lock in between, so the committed change is exactly the one that was
    /// evaluated.
    ///
    /// Returns the neighbour's delta, or `None` if nothing was committed.
    pub fn resolve_and_commit<R: Rng + ?Sized>(
        &self,
        resolver: &SwapResolver,
        model: &Model<P>,
        value: &ValueRef<P>,
        iteration: u64,
        rng: &mut R,
    ) -> Option<f64> {
        let mut assignment = self.write();
        let neighbour = resolver
            .resolve(model, &mut assignment, value, iteration, rng)
            .neighbour?;
        neighbour.commit(model, &mut assignment, iteration);
        Some(neighbour.delta())
    }

    /// Commits `neighbour` under the write lock.
    ///
    /// The neighbour must have been evaluated against the current state;
    /// use [`resolve_and_commit`](Self::resolve_and_commit) when other
    /// handles may write in between.
    pub fn commit(&self, model: &Model<P>, neighbour: &dyn Neighbour<P>, iteration: u64) {
        neighbour.commit(model, &mut self.write(), iteration);
    }

    /// Takes the assignment back if this is the last handle.
    pub fn into_inner(self) -> Option<Assignment<P>> {
        Arc::try_unwrap(self.inner).ok().map(|lock| {
            lock.into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        })
    }
}
