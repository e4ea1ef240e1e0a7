//! Fixed-capacity, thread-safe component registries.
//!
//! Every component type lives in its own [`Registry`]: a [`SlotPool`] plus a
//! name index, a live bitset, a dirty bitset and an aggregate dirty flag, all
//! guarded by one mutex per type. Components are addressed by name (the
//! external key) or by [`Handle`] (id + generation).
//!
//! # Example
//!
//! ```
//! use scene_registry::registry::Registry;
//! use scene_registry::scene::Light;
//! use glam::Vec3;
//!
//! let lights = Registry::<Light>::new(16);
//! let sun = lights.create("sun").unwrap();
//! lights.write(sun, |light| light.set_color(Vec3::new(1.0, 0.9, 0.8)));
//! assert!(lights.is_any_dirty());
//!
//! lights.update_all();
//! assert!(!lights.is_any_dirty());
//! ```

mod error;
mod handle;
mod pool;

pub use error::{RegistryError, RegistryResult};
pub use handle::Handle;
pub use pool::{Slot, SlotPool};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use bytemuck::{Pod, Zeroable};
use fixedbitset::FixedBitSet;
use parking_lot::{Mutex, MutexGuard};

/// Component type tag.
///
/// The declaration order is the global lock order: any operation that touches
/// several registries visits them in this order and holds one lock at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Camera,
    Transform,
    Mesh,
    Texture,
    Material,
    Light,
    Volume,
    Entity,
}

impl ComponentKind {
    /// All kinds in lock order
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Camera,
        ComponentKind::Transform,
        ComponentKind::Mesh,
        ComponentKind::Texture,
        ComponentKind::Material,
        ComponentKind::Light,
        ComponentKind::Volume,
        ComponentKind::Entity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Camera => "Camera",
            ComponentKind::Transform => "Transform",
            ComponentKind::Mesh => "Mesh",
            ComponentKind::Texture => "Texture",
            ComponentKind::Material => "Material",
            ComponentKind::Light => "Light",
            ComponentKind::Volume => "Volume",
            ComponentKind::Entity => "Entity",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component type storable in a [`Registry`]
pub trait Component: Default + Send + Sized + 'static {
    const KIND: ComponentKind;

    /// Flat record mirrored to the renderer
    type Gpu: Pod + Send;

    /// Build the GPU record for this component.
    ///
    /// `pool` gives read access to the other components of the same type,
    /// which transforms use to resolve their parent chain.
    fn to_gpu(&self, pool: &SlotPool<Self>) -> Self::Gpu;

    /// Extend `dirty` before GPU records are regenerated
    fn propagate_dirty(_pool: &SlotPool<Self>, _dirty: &mut FixedBitSet) {}
}

/// Lock-protected registry state
pub struct RegistryState<C: Component> {
    pub(crate) pool: SlotPool<C>,
    lookup: HashMap<String, u32>,
    live: FixedBitSet,
    dirty: FixedBitSet,
}

impl<C: Component> RegistryState<C> {
    fn new(capacity: usize) -> Self {
        Self {
            pool: SlotPool::allocate(capacity),
            lookup: HashMap::with_capacity(capacity),
            live: FixedBitSet::with_capacity(capacity),
            dirty: FixedBitSet::with_capacity(capacity),
        }
    }

    pub fn pool(&self) -> &SlotPool<C> {
        &self.pool
    }

    pub(crate) fn mark_dirty(&mut self, id: u32) {
        if (id as usize) < self.pool.capacity() {
            self.dirty.insert(id as usize);
        }
    }

    fn create(&mut self, name: &str) -> RegistryResult<Handle<C>> {
        if self.lookup.contains_key(name) {
            return Err(RegistryError::DuplicateName {
                kind: C::KIND,
                name: name.to_string(),
            });
        }

        let capacity = self.pool.capacity();
        let Some(id) = (0..capacity).find(|&i| !self.live.contains(i)) else {
            return Err(RegistryError::CapacityExceeded {
                kind: C::KIND,
                capacity,
            });
        };

        let slot = self.pool.slot_mut(id as u32)?;
        slot.initialized = true;
        slot.generation = slot.generation.wrapping_add(1);
        slot.name = name.to_string();
        slot.component = C::default();
        let handle = Handle::new(id as u32, slot.generation);

        self.live.insert(id);
        self.dirty.insert(id);
        self.lookup.insert(name.to_string(), id as u32);
        Ok(handle)
    }

    fn create_unique(&mut self, base: &str) -> RegistryResult<Handle<C>> {
        if self.lookup.len() >= self.pool.capacity() {
            return Err(RegistryError::CapacityExceeded {
                kind: C::KIND,
                capacity: self.pool.capacity(),
            });
        }
        if !self.lookup.contains_key(base) {
            return self.create(base);
        }
        // At most `capacity` names are taken, so this terminates quickly.
        let name = (1u64..)
            .map(|suffix| format!("{base}{suffix}"))
            .find(|candidate| !self.lookup.contains_key(candidate))
            .unwrap_or_else(|| base.to_string());
        self.create(&name)
    }

    fn handle_of(&self, id: u32) -> Option<Handle<C>> {
        let slot = self.pool.slot(id).ok()?;
        slot.initialized.then(|| Handle::new(id, slot.generation))
    }

    fn is_alive(&self, handle: Handle<C>) -> bool {
        self.pool.resolve(handle).is_some()
    }

    fn remove_id(&mut self, id: u32) -> bool {
        let Ok(slot) = self.pool.slot_mut(id) else {
            return false;
        };
        if !slot.initialized {
            return false;
        }
        slot.initialized = false;
        slot.component = C::default();
        let name = std::mem::take(&mut slot.name);

        self.lookup.remove(&name);
        self.live.set(id as usize, false);
        self.dirty.insert(id as usize);
        true
    }
}

/// Read-only view over a registry handed to the synchronization pass
pub struct SyncView<'a, C: Component> {
    /// GPU records for every slot, indexed by id
    pub gpu: &'a [C::Gpu],
    /// Slots changed since the previous pass, including removals
    pub dirty: &'a FixedBitSet,
    /// Slots holding a live component
    pub live: &'a FixedBitSet,
}

impl<C: Component> SyncView<'_, C> {
    pub fn kind(&self) -> ComponentKind {
        C::KIND
    }

    pub fn dirty_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.dirty.ones().map(|id| id as u32)
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.live.contains(id as usize)
    }

    /// Raw bytes of the whole GPU array, ready for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.gpu)
    }
}

/// Fixed-capacity, thread-safe store for one component type
pub struct Registry<C: Component> {
    state: Mutex<RegistryState<C>>,
    any_dirty: AtomicBool,
    capacity: usize,
}

impl<C: Component> Registry<C> {
    pub fn new(capacity: usize) -> Self {
        log::debug!("Allocating {} registry with capacity {}", C::KIND, capacity);
        Self {
            state: Mutex::new(RegistryState::new(capacity)),
            any_dirty: AtomicBool::new(false),
            capacity,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        C::KIND
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lock the registry for a compound operation
    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState<C>> {
        self.state.lock()
    }

    /// Raise the aggregate flag. Must be called with the registry lock held.
    pub(crate) fn mark_any_dirty(&self) {
        self.any_dirty.store(true, Ordering::Release);
    }

    /// Create a component in the lowest free slot.
    ///
    /// The component starts from its default state and is marked dirty.
    pub fn create(&self, name: &str) -> RegistryResult<Handle<C>> {
        let mut state = self.state.lock();
        let handle = state.create(name)?;
        self.mark_any_dirty();
        drop(state);
        log::trace!("Created {} \"{}\" at id {}", C::KIND, name, handle.id());
        Ok(handle)
    }

    /// Create a component named `base`, or `base1`, `base2`, ... if taken.
    ///
    /// The name search and the creation happen under one lock, so concurrent
    /// callers never receive the same name.
    pub fn create_unique(&self, base: &str) -> RegistryResult<Handle<C>> {
        let mut state = self.state.lock();
        let handle = state.create_unique(base)?;
        self.mark_any_dirty();
        Ok(handle)
    }

    /// Look up a live component by name
    pub fn get(&self, name: &str) -> Option<Handle<C>> {
        let state = self.state.lock();
        let id = *state.lookup.get(name)?;
        state.handle_of(id)
    }

    /// Look up a live component by id. Out-of-range ids are simply not found.
    pub fn get_id(&self, id: u32) -> Option<Handle<C>> {
        self.state.lock().handle_of(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().lookup.contains_key(name)
    }

    pub fn is_alive(&self, handle: Handle<C>) -> bool {
        self.state.lock().is_alive(handle)
    }

    pub fn name_of(&self, handle: Handle<C>) -> Option<String> {
        let state = self.state.lock();
        if !state.is_alive(handle) {
            return None;
        }
        state.pool.slot(handle.id()).ok().map(|slot| slot.name.clone())
    }

    /// Read a live component
    pub fn read<R>(&self, handle: Handle<C>, f: impl FnOnce(&C) -> R) -> Option<R> {
        let state = self.state.lock();
        state.pool.resolve(handle).map(f)
    }

    /// Mutate a live component and mark it dirty
    pub fn write<R>(&self, handle: Handle<C>, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let mut state = self.state.lock();
        let result = state.pool.resolve_mut(handle).map(f)?;
        state.dirty.insert(handle.id() as usize);
        self.mark_any_dirty();
        Some(result)
    }

    /// Mark a live component dirty without changing it
    pub fn mark_dirty(&self, handle: Handle<C>) -> bool {
        let mut state = self.state.lock();
        if !state.is_alive(handle) {
            return false;
        }
        state.dirty.insert(handle.id() as usize);
        self.mark_any_dirty();
        true
    }

    /// Remove by name. Returns false if nothing was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(id) = state.lookup.get(name).copied() else {
            return false;
        };
        let removed = state.remove_id(id);
        if removed {
            self.mark_any_dirty();
        }
        removed
    }

    /// Remove by id. Idempotent; out-of-range ids are ignored.
    pub fn remove_id(&self, id: u32) -> bool {
        let mut state = self.state.lock();
        let removed = state.remove_id(id);
        if removed {
            self.mark_any_dirty();
        }
        removed
    }

    /// Remove the component behind `handle` if it is still the live occupant
    pub fn remove_handle(&self, handle: Handle<C>) -> bool {
        let mut state = self.state.lock();
        if !state.is_alive(handle) {
            return false;
        }
        let removed = state.remove_id(handle.id());
        if removed {
            self.mark_any_dirty();
        }
        removed
    }

    /// Remove every live component
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let ids: Vec<u32> = state.live.ones().map(|id| id as u32).collect();
        let removed = ids.into_iter().filter(|&id| state.remove_id(id)).count();
        if removed > 0 {
            self.mark_any_dirty();
        }
    }

    /// Number of live components
    pub fn count(&self) -> usize {
        self.state.lock().lookup.len()
    }

    pub fn is_dirty(&self, handle: Handle<C>) -> bool {
        self.state.lock().dirty.contains(handle.id() as usize)
    }

    /// True iff some slot changed since the last [`update_all`](Self::update_all)
    pub fn is_any_dirty(&self) -> bool {
        self.any_dirty.load(Ordering::Acquire)
    }

    pub fn handles(&self) -> Vec<Handle<C>> {
        self.state.lock().pool.live().map(|(handle, _)| handle).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .pool
            .live()
            .map(|(_, slot)| slot.name.clone())
            .collect()
    }

    /// Regenerate GPU records of dirty slots and clear all dirty state
    pub fn update_all(&self) {
        self.update_all_with(|_| ());
    }

    /// Regenerate GPU records of dirty slots, hand the result to `f`, then
    /// clear all dirty state.
    ///
    /// Removed slots get a zeroed record. `f` runs under the registry lock.
    pub fn update_all_with<R>(&self, f: impl FnOnce(SyncView<'_, C>) -> R) -> R {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        C::propagate_dirty(&state.pool, &mut state.dirty);

        for id in state.dirty.ones() {
            let record = match state.pool.slot(id as u32) {
                Ok(slot) if slot.initialized => slot.component.to_gpu(&state.pool),
                _ => C::Gpu::zeroed(),
            };
            state.pool.set_gpu(id, record);
        }

        let result = f(SyncView {
            gpu: state.pool.gpu_structs(),
            dirty: &state.dirty,
            live: &state.live,
        });

        state.dirty.clear();
        self.any_dirty.store(false, Ordering::Release);
        result
    }
}

impl<C: Component> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &C::KIND)
            .field("count", &self.count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Light;
    use glam::Vec3;

    #[test]
    fn create_assigns_lowest_free_slot() {
        let lights = Registry::<Light>::new(4);
        let a = lights.create("a").unwrap();
        let b = lights.create("b").unwrap();
        assert_eq!((a.id(), b.id()), (0, 1));

        assert!(lights.remove("a"));
        let c = lights.create("c").unwrap();
        assert_eq!(c.id(), 0);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let lights = Registry::<Light>::new(4);
        lights.create("key").unwrap();
        let err = lights.create("key").unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                kind: ComponentKind::Light,
                name: "key".to_string()
            }
        );
        assert_eq!(lights.count(), 1);
    }

    #[test]
    fn empty_name_is_an_ordinary_key() {
        let lights = Registry::<Light>::new(4);
        let handle = lights.create("").unwrap();
        assert_eq!(lights.get(""), Some(handle));
        assert!(lights.create("").is_err());
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let lights = Registry::<Light>::new(2);
        lights.create("a").unwrap();
        lights.create("b").unwrap();
        let err = lights.create("c").unwrap_err();
        assert!(matches!(err, RegistryError::CapacityExceeded { capacity: 2, .. }));
        assert_eq!(lights.count(), 2);
        assert!(matches!(
            lights.create_unique("a"),
            Err(RegistryError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn create_unique_appends_increasing_suffix() {
        let lights = Registry::<Light>::new(8);
        let names: Vec<String> = (0..3)
            .map(|_| {
                let handle = lights.create_unique("lamp").unwrap();
                lights.name_of(handle).unwrap()
            })
            .collect();
        assert_eq!(names, ["lamp", "lamp1", "lamp2"]);
    }

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let lights = Registry::<Light>::new(1);
        let old = lights.create("old").unwrap();
        lights.remove_id(old.id());
        let new = lights.create("new").unwrap();

        assert_eq!(old.id(), new.id());
        assert!(!lights.is_alive(old));
        assert!(lights.read(old, |_| ()).is_none());
        assert!(lights.write(old, |_| ()).is_none());
        assert!(!lights.remove_handle(old));
        assert!(lights.is_alive(new));
    }

    #[test]
    fn remove_is_idempotent_and_ignores_out_of_range() {
        let lights = Registry::<Light>::new(2);
        let handle = lights.create("a").unwrap();
        assert!(lights.remove_id(handle.id()));
        assert!(!lights.remove_id(handle.id()));
        assert!(!lights.remove("a"));
        assert!(!lights.remove_id(99));
        assert!(lights.get_id(99).is_none());
    }

    #[test]
    fn recreated_component_starts_from_defaults() {
        let lights = Registry::<Light>::new(1);
        let handle = lights.create("a").unwrap();
        lights.write(handle, |light| light.set_intensity(42.0));
        lights.remove("a");

        let handle = lights.create("a").unwrap();
        assert_eq!(lights.read(handle, |light| light.intensity()), Some(1.0));
    }

    #[test]
    fn write_marks_dirty_and_update_clears() {
        let lights = Registry::<Light>::new(2);
        let handle = lights.create("a").unwrap();
        lights.update_all();
        assert!(!lights.is_any_dirty());
        assert!(!lights.is_dirty(handle));

        lights.write(handle, |light| light.set_color(Vec3::X));
        assert!(lights.is_dirty(handle));
        assert!(lights.is_any_dirty());

        lights.update_all();
        assert!(!lights.is_dirty(handle));
        assert!(!lights.is_any_dirty());
    }

    #[test]
    fn update_all_with_exposes_dirty_and_live_sets() {
        let lights = Registry::<Light>::new(4);
        let a = lights.create("a").unwrap();
        let b = lights.create("b").unwrap();
        lights.update_all();

        lights.remove_handle(a);
        lights.write(b, |light| light.set_intensity(3.0));

        let (dirty, live_a, live_b) = lights.update_all_with(|view| {
            let dirty: Vec<u32> = view.dirty_ids().collect();
            (dirty, view.is_live(a.id()), view.is_live(b.id()))
        });
        assert_eq!(dirty, vec![a.id(), b.id()]);
        assert!(!live_a);
        assert!(live_b);
    }

    #[test]
    fn removed_slot_gets_zeroed_gpu_record() {
        let lights = Registry::<Light>::new(1);
        let handle = lights.create("a").unwrap();
        lights.update_all();
        lights.remove_handle(handle);
        let zeroed = lights.update_all_with(|view| view.as_bytes().iter().all(|b| *b == 0));
        assert!(zeroed);
    }

    #[test]
    fn clear_removes_everything() {
        let lights = Registry::<Light>::new(3);
        lights.create("a").unwrap();
        lights.create("b").unwrap();
        lights.update_all();
        lights.clear();
        assert_eq!(lights.count(), 0);
        assert!(lights.is_any_dirty());
        assert!(lights.names().is_empty());
    }

    #[test]
    fn aggregate_flag_matches_dirty_bits_after_concurrent_writes() {
        let lights = Registry::<Light>::new(8);
        let handles: Vec<_> = (0..8)
            .map(|i| lights.create(&format!("l{i}")).unwrap())
            .collect();

        for _ in 0..20 {
            std::thread::scope(|scope| {
                for handle in &handles {
                    let lights = &lights;
                    scope.spawn(move || {
                        for i in 0..50 {
                            lights.write(*handle, |light| light.set_intensity(i as f32));
                        }
                    });
                }
                scope.spawn(|| {
                    for _ in 0..50 {
                        lights.update_all();
                    }
                });
            });

            let any_slot_dirty = handles.iter().any(|h| lights.is_dirty(*h));
            assert_eq!(lights.is_any_dirty(), any_slot_dirty);
        }
    }

    #[test]
    fn lock_order_lists_every_kind_once() {
        let mut kinds = ComponentKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), ComponentKind::ALL.len());
        assert_eq!(kinds, ComponentKind::ALL.to_vec());
    }
}
