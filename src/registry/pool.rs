//! Fixed-capacity slot storage.
//!
//! A [`SlotPool`] owns `capacity` component records and a parallel array of
//! zeroed GPU structs. Both are allocated once and never move or resize, so a
//! slot index stays valid for the lifetime of the pool.

use bytemuck::Zeroable;

use super::{Component, Handle, RegistryError, RegistryResult};

/// One record in a [`SlotPool`]
#[derive(Debug)]
pub struct Slot<C> {
    pub(crate) name: String,
    pub(crate) initialized: bool,
    pub(crate) generation: u32,
    pub(crate) component: C,
}

impl<C: Default> Default for Slot<C> {
    fn default() -> Self {
        Self {
            name: String::new(),
            initialized: false,
            generation: 0,
            component: C::default(),
        }
    }
}

impl<C> Slot<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn component(&self) -> &C {
        &self.component
    }
}

/// Fixed array of component slots plus their GPU mirrors
pub struct SlotPool<C: Component> {
    slots: Box<[Slot<C>]>,
    gpu: Box<[C::Gpu]>,
}

impl<C: Component> SlotPool<C> {
    /// Reserve `capacity` uninitialized slots and zeroed GPU structs
    pub fn allocate(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| Slot::default()).collect();
        let gpu = vec![C::Gpu::zeroed(); capacity].into_boxed_slice();
        Self { slots, gpu }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot record at `id`
    pub fn slot(&self, id: u32) -> RegistryResult<&Slot<C>> {
        self.slots.get(id as usize).ok_or(RegistryError::InvalidId {
            kind: C::KIND,
            id,
            capacity: self.slots.len(),
        })
    }

    pub(crate) fn slot_mut(&mut self, id: u32) -> RegistryResult<&mut Slot<C>> {
        let capacity = self.slots.len();
        self.slots.get_mut(id as usize).ok_or(RegistryError::InvalidId {
            kind: C::KIND,
            id,
            capacity,
        })
    }

    /// Component behind `handle` if it is still live
    pub fn resolve(&self, handle: Handle<C>) -> Option<&C> {
        self.slots
            .get(handle.id() as usize)
            .filter(|slot| slot.initialized && slot.generation == handle.generation())
            .map(|slot| &slot.component)
    }

    pub(crate) fn resolve_mut(&mut self, handle: Handle<C>) -> Option<&mut C> {
        self.slots
            .get_mut(handle.id() as usize)
            .filter(|slot| slot.initialized && slot.generation == handle.generation())
            .map(|slot| &mut slot.component)
    }

    /// Iterate initialized slots with their handles
    pub fn live(&self) -> impl Iterator<Item = (Handle<C>, &Slot<C>)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.initialized)
            .map(|(id, slot)| (Handle::new(id as u32, slot.generation), slot))
    }

    /// GPU structs for every slot, indexed by id
    pub fn gpu_structs(&self) -> &[C::Gpu] {
        &self.gpu
    }

    pub(crate) fn set_gpu(&mut self, id: usize, value: C::Gpu) {
        self.gpu[id] = value;
    }
}
