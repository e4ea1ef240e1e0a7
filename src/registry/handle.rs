//! Weak, generation-checked component handles

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::Component;

/// Weak reference to a component in a [`Registry`](super::Registry).
///
/// A handle is an `(id, generation)` pair. The slot generation is bumped on
/// every create, so a handle taken before a removal never resolves to the
/// component that later reuses the same slot.
pub struct Handle<C> {
    id: u32,
    generation: u32,
    _marker: PhantomData<fn() -> C>,
}

impl<C> Handle<C> {
    pub(crate) fn new(id: u32, generation: u32) -> Self {
        Self {
            id,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the registry. Stable while the component lives.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Id as stored in GPU structs, `-1` for a missing link
    pub fn gpu_index(handle: Option<Self>) -> i32 {
        handle.map_or(-1, |h| h.id as i32)
    }
}

impl<C> Clone for Handle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handle<C> {}

impl<C> PartialEq for Handle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation
    }
}

impl<C> Eq for Handle<C> {}

impl<C> Hash for Handle<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}

impl<C: Component> fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}v{})", C::KIND, self.id, self.generation)
    }
}
