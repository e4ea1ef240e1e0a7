//! Transform component

use bytemuck::{Pod, Zeroable};
use fixedbitset::FixedBitSet;
use glam::{Mat3, Mat4, Quat, Vec3};
use thiserror::Error;

use crate::registry::{Component, ComponentKind, Handle, SlotPool};

/// Matrix could not be split into translation, rotation and scale
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DecompositionError {
    #[error("matrix contains non-finite values")]
    NonFinite,
    #[error("matrix is projective (last row is not 0, 0, 0, 1)")]
    Projective,
    #[error("matrix is singular")]
    Singular,
}

/// Split an affine matrix into `(translation, rotation, scale)`
pub fn decompose(matrix: Mat4) -> Result<(Vec3, Quat, Vec3), DecompositionError> {
    if !matrix.is_finite() {
        return Err(DecompositionError::NonFinite);
    }
    if matrix.row(3) != glam::Vec4::W {
        return Err(DecompositionError::Projective);
    }
    let det = Mat3::from_mat4(matrix).determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(DecompositionError::Singular);
    }

    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    if !(scale.is_finite() && rotation.is_finite() && translation.is_finite()) {
        return Err(DecompositionError::NonFinite);
    }
    Ok((translation, rotation.normalize(), scale))
}

/// Global offset composed onto the root of an imported hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Placement {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Local position, rotation and scale plus an optional parent link
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    pub(crate) parent: Option<Handle<Transform>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
        }
    }
}

impl Transform {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Parent link as stored. It may point at a removed transform.
    pub fn parent(&self) -> Option<Handle<Transform>> {
        self.parent
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn add_position(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Rotate in the parent frame
    pub fn add_rotation(&mut self, rotation: Quat) {
        self.rotation = (rotation * self.rotation).normalize();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Replace position, rotation and scale from an affine matrix.
    ///
    /// The transform is left untouched when decomposition fails.
    pub fn set_local_matrix(&mut self, matrix: Mat4) -> Result<(), DecompositionError> {
        let (position, rotation, scale) = decompose(matrix)?;
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        Ok(())
    }

    /// Compose a global offset onto this transform exactly once
    pub fn apply_placement(&mut self, placement: &Placement) {
        self.scale *= placement.scale;
        self.add_rotation(placement.rotation);
        self.add_position(placement.position);
    }

    /// Local-to-parent matrix
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Look at a target position
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = up.cross(forward).normalize();
        let up = forward.cross(right);

        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
    }

    /// Forward direction (local -Z in the parent frame)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }
}

/// Walk the live parent chain of `start` and build its world matrix.
///
/// The walk is bounded by the pool capacity, so a corrupted chain can never
/// loop forever.
pub(crate) fn world_matrix_in(pool: &SlotPool<Transform>, start: &Transform) -> Mat4 {
    let mut world = start.local_matrix();
    let mut next = start.parent;
    for _ in 0..pool.capacity() {
        let Some(parent) = next.and_then(|handle| pool.resolve(handle)) else {
            break;
        };
        world = parent.local_matrix() * world;
        next = parent.parent;
    }
    world
}

impl Component for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;
    type Gpu = TransformStruct;

    fn to_gpu(&self, pool: &SlotPool<Self>) -> TransformStruct {
        let local_to_world = world_matrix_in(pool, self);
        TransformStruct {
            local_to_world,
            world_to_local: local_to_world.inverse(),
        }
    }

    /// Descendants of a dirty transform inherit the dirty bit.
    ///
    /// A removed parent counts as dirty: its slot is marked on removal, so the
    /// stored link is checked against the dirty set before liveness.
    fn propagate_dirty(pool: &SlotPool<Self>, dirty: &mut FixedBitSet) {
        if dirty.count_ones(..) == 0 {
            return;
        }
        let mut inherited = Vec::new();
        for (handle, slot) in pool.live() {
            let id = handle.id() as usize;
            if dirty.contains(id) {
                continue;
            }
            let mut next = slot.component().parent;
            for _ in 0..pool.capacity() {
                let Some(parent) = next else {
                    break;
                };
                if dirty.contains(parent.id() as usize) {
                    inherited.push(id);
                    break;
                }
                next = pool.resolve(parent).and_then(|t| t.parent);
            }
        }
        for id in inherited {
            dirty.insert(id);
        }
    }
}

/// Transform matrices for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformStruct {
    pub local_to_world: Mat4,
    pub world_to_local: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn decompose_roundtrips_trs() {
        let rotation = Quat::from_rotation_y(FRAC_PI_2);
        let matrix =
            Mat4::from_scale_rotation_translation(Vec3::new(1.0, 2.0, 3.0), rotation, Vec3::X);
        let (t, r, s) = decompose(matrix).unwrap();
        assert!(t.abs_diff_eq(Vec3::X, 1e-5));
        assert!(s.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(r.abs_diff_eq(rotation, 1e-5) || r.abs_diff_eq(-rotation, 1e-5));
    }

    #[test]
    fn decompose_rejects_degenerate_matrices() {
        let singular = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(decompose(singular), Err(DecompositionError::Singular));

        let mut projective = Mat4::IDENTITY;
        projective.x_axis.w = 0.5;
        assert_eq!(decompose(projective), Err(DecompositionError::Projective));

        let mut nan = Mat4::IDENTITY;
        nan.w_axis.x = f32::NAN;
        assert_eq!(decompose(nan), Err(DecompositionError::NonFinite));
    }

    #[test]
    fn set_local_matrix_keeps_state_on_failure() {
        let mut transform = Transform::default();
        transform.set_position(Vec3::Y);
        assert!(transform.set_local_matrix(Mat4::ZERO).is_err());
        assert_eq!(transform.position(), Vec3::Y);
    }

    #[test]
    fn apply_placement_composes_once() {
        let mut transform = Transform::default();
        transform.set_position(Vec3::new(1.0, 0.0, 0.0));
        transform.set_scale(Vec3::splat(0.5));

        let placement = Placement::default()
            .with_position(Vec3::new(0.0, 3.0, 0.0))
            .with_scale(Vec3::splat(4.0));
        transform.apply_placement(&placement);

        assert_eq!(transform.scale(), Vec3::splat(2.0));
        assert_eq!(transform.position(), Vec3::new(1.0, 3.0, 0.0));
        assert!(transform.rotation().abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn gpu_struct_holds_inverse_pair() {
        let pool = SlotPool::<Transform>::allocate(1);
        let mut transform = Transform::default();
        transform.set_position(Vec3::new(1.0, 2.0, 3.0));
        let gpu = transform.to_gpu(&pool);
        let product = gpu.local_to_world * gpu.world_to_local;
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}
