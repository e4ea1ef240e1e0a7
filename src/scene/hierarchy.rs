//! Parent/child relation over transforms.
//!
//! Parents are stored as weak handles on the child. A relation that would make
//! a transform its own ancestor is rejected, so the parent graph stays a
//! forest. World matrices are derived on read from the live ancestor chain.

use glam::Mat4;
use thiserror::Error;

use super::transform::{world_matrix_in, Placement, Transform};
use crate::registry::{Handle, Registry, SlotPool};

/// Errors returned by hierarchy operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("parenting \"{child}\" under \"{parent}\" would create a cycle")]
    Cycle { child: String, parent: String },

    #[error("transform handle {0} does not refer to a live transform")]
    DeadHandle(u32),
}

/// Is `ancestor` the same as `node` or one of its live ancestors?
fn is_ancestor_or_self(
    pool: &SlotPool<Transform>,
    ancestor: Handle<Transform>,
    node: Handle<Transform>,
) -> bool {
    let mut current = Some(node);
    for _ in 0..=pool.capacity() {
        let Some(handle) = current else {
            return false;
        };
        if handle == ancestor {
            return true;
        }
        current = pool.resolve(handle).and_then(|t| t.parent);
    }
    false
}

impl Registry<Transform> {
    /// Make `parent` the parent of `child`.
    ///
    /// Fails with [`HierarchyError::Cycle`] when `parent` is `child` or one of
    /// its descendants; the hierarchy is unchanged in that case.
    pub fn set_parent(
        &self,
        child: Handle<Transform>,
        parent: Handle<Transform>,
    ) -> Result<(), HierarchyError> {
        let mut state = self.lock();
        let pool = state.pool();
        if pool.resolve(child).is_none() {
            return Err(HierarchyError::DeadHandle(child.id()));
        }
        if pool.resolve(parent).is_none() {
            return Err(HierarchyError::DeadHandle(parent.id()));
        }
        if is_ancestor_or_self(pool, child, parent) {
            let name = |h: Handle<Transform>| {
                pool.slot(h.id())
                    .map(|slot| slot.name().to_string())
                    .unwrap_or_default()
            };
            return Err(HierarchyError::Cycle {
                child: name(child),
                parent: name(parent),
            });
        }

        if let Some(transform) = state.pool.resolve_mut(child) {
            transform.parent = Some(parent);
        }
        state.mark_dirty(child.id());
        self.mark_any_dirty();
        Ok(())
    }

    /// Detach `child` from its parent. Returns false if it had none.
    pub fn clear_parent(&self, child: Handle<Transform>) -> bool {
        let mut state = self.lock();
        let Some(transform) = state.pool.resolve_mut(child) else {
            return false;
        };
        if transform.parent.take().is_none() {
            return false;
        }
        state.mark_dirty(child.id());
        self.mark_any_dirty();
        true
    }

    /// Live parent of `child`
    pub fn parent(&self, child: Handle<Transform>) -> Option<Handle<Transform>> {
        let state = self.lock();
        let parent = state.pool().resolve(child)?.parent?;
        state.pool().resolve(parent).map(|_| parent)
    }

    /// Live direct children of `parent`, in id order
    pub fn children(&self, parent: Handle<Transform>) -> Vec<Handle<Transform>> {
        let state = self.lock();
        state
            .pool()
            .live()
            .filter(|(_, slot)| slot.component().parent == Some(parent))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Local-to-parent matrix of a live transform
    pub fn local_matrix(&self, handle: Handle<Transform>) -> Option<Mat4> {
        self.read(handle, Transform::local_matrix)
    }

    /// Local-to-world matrix, composed from the current parent chain
    pub fn world_matrix(&self, handle: Handle<Transform>) -> Option<Mat4> {
        let state = self.lock();
        let pool = state.pool();
        pool.resolve(handle)
            .map(|transform| world_matrix_in(pool, transform))
    }

    /// Compose `placement` onto a parentless transform.
    ///
    /// Returns false and leaves the transform alone if it has a live parent.
    pub fn apply_root_placement(&self, handle: Handle<Transform>, placement: &Placement) -> bool {
        let mut state = self.lock();
        let has_parent = state
            .pool()
            .resolve(handle)
            .and_then(|t| t.parent)
            .is_some_and(|parent| state.pool().resolve(parent).is_some());
        if has_parent {
            return false;
        }
        let Some(transform) = state.pool.resolve_mut(handle) else {
            return false;
        };
        transform.apply_placement(placement);
        state.mark_dirty(handle.id());
        self.mark_any_dirty();
        true
    }
}
