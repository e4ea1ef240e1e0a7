//! Scene components and the composed scene description

mod camera;
mod entity;
mod hierarchy;
mod light;
mod transform;

pub use camera::{Camera, CameraStruct, Projection};
pub use entity::{Entity, EntityStruct};
pub use hierarchy::HierarchyError;
pub use light::{Light, LightStruct};
pub use transform::{decompose, DecompositionError, Placement, Transform, TransformStruct};

use crate::registry::Handle;
use crate::resources::{Material, Mesh, Texture};

/// Components created by one scene import, each list in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    pub materials: Vec<Handle<Material>>,
    pub textures: Vec<Handle<Texture>>,
    pub meshes: Vec<Handle<Mesh>>,
    pub transforms: Vec<Handle<Transform>>,
    pub entities: Vec<Handle<Entity>>,
    pub lights: Vec<Handle<Light>>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
            && self.textures.is_empty()
            && self.meshes.is_empty()
            && self.transforms.is_empty()
            && self.entities.is_empty()
            && self.lights.is_empty()
    }

    /// Total number of components created
    pub fn len(&self) -> usize {
        self.materials.len()
            + self.textures.len()
            + self.meshes.len()
            + self.transforms.len()
            + self.entities.len()
            + self.lights.len()
    }
}
