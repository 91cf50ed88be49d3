//! Per-assignment context cache.
//!
//! Stateful owners (constraints and criteria) receive a small integer
//! [`OwnerHandle`] when registered with the model. Each assignment owns a
//! slot table indexed by that handle, so a single owner can be evaluated
//! against several assignments at once without cross-talk.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::OnceLock;

/// Handle issued by the model to a constraint or criterion at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerHandle(usize);

impl OwnerHandle {
    pub const fn new(index: usize) -> Self {
        OwnerHandle(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Mutable state an owner keeps for one assignment.
pub trait AssignmentContext: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Sync> AssignmentContext for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AssignmentContext {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A context borrowed from the cache, or built on the spot when the owner
/// was registered after the assignment last grew its table.
pub enum ContextRef<'a> {
    Cached(&'a (dyn AssignmentContext + 'static)),
    Detached(Box<dyn AssignmentContext>),
}

impl Deref for ContextRef<'_> {
    type Target = dyn AssignmentContext;

    fn deref(&self) -> &Self::Target {
        match self {
            ContextRef::Cached(context) => *context,
            ContextRef::Detached(context) => &**context,
        }
    }
}

/// Slot table of contexts, one slot per owner handle.
///
/// Slots are filled lazily. A shared reference is enough to create a
/// missing context, which keeps read-only evaluation possible while other
/// readers hold the same assignment.
#[derive(Default)]
pub struct ContextCache {
    slots: Vec<OnceLock<Box<dyn AssignmentContext>>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(handles: usize) -> Self {
        let mut cache = Self::new();
        cache.grow(handles);
        cache
    }

    /// Makes room for handles below `handles`.
    pub fn grow(&mut self, handles: usize) {
        if self.slots.len() < handles {
            self.slots.resize_with(handles, OnceLock::new);
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, handle: OwnerHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Returns the context of `handle`, creating it with `init` if missing.
    pub fn get_or_init<F>(&self, handle: OwnerHandle, init: F) -> ContextRef<'_>
    where
        F: FnOnce() -> Box<dyn AssignmentContext>,
    {
        match self.slots.get(handle.index()) {
            Some(slot) => ContextRef::Cached(&**slot.get_or_init(init)),
            None => ContextRef::Detached(init()),
        }
    }

    pub fn get_mut(
        &mut self,
        handle: OwnerHandle,
    ) -> Option<&mut (dyn AssignmentContext + 'static)> {
        let slot = self.slots.get_mut(handle.index())?;
        slot.get_mut().map(|context| &mut **context)
    }

    /// Removes the context of `handle` so it can be updated while the rest
    /// of the assignment is borrowed.
    pub(crate) fn take(&mut self, handle: OwnerHandle) -> Option<Box<dyn AssignmentContext>> {
        self.slots.get_mut(handle.index()).and_then(OnceLock::take)
    }

    pub(crate) fn put(&mut self, handle: OwnerHandle, context: Box<dyn AssignmentContext>) {
        self.grow(handle.index() + 1);
        let slot = &mut self.slots[handle.index()];
        let _ = slot.take();
        let _ = slot.set(context);
    }

    /// Drops every context; they are rebuilt on next access.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            let _ = slot.take();
        }
    }
}

impl fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let live = self.slots.iter().filter(|s| s.get().is_some()).count();
        f.debug_struct("ContextCache")
            .field("slots", &self.slots.len())
            .field("live", &live)
            .finish()
    }
}
