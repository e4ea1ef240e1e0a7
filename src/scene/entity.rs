//! Entity component: binds a transform to the things placed with it

use bytemuck::{Pod, Zeroable};

use super::{Camera, Light, Transform};
use crate::registry::{Component, ComponentKind, Handle, SlotPool};
use crate::resources::{Material, Mesh, Volume};

/// Weak links to the components that make up one scene object.
///
/// Links are never followed implicitly. Removing a referenced component
/// leaves the link in place; resolving it through the owning registry then
/// yields nothing.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    transform: Option<Handle<Transform>>,
    camera: Option<Handle<Camera>>,
    mesh: Option<Handle<Mesh>>,
    material: Option<Handle<Material>>,
    light: Option<Handle<Light>>,
    volume: Option<Handle<Volume>>,
    hidden: bool,
}

impl Entity {
    pub fn transform(&self) -> Option<Handle<Transform>> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Handle<Transform>) {
        self.transform = Some(transform);
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    pub fn camera(&self) -> Option<Handle<Camera>> {
        self.camera
    }

    pub fn set_camera(&mut self, camera: Handle<Camera>) {
        self.camera = Some(camera);
    }

    pub fn clear_camera(&mut self) {
        self.camera = None;
    }

    pub fn mesh(&self) -> Option<Handle<Mesh>> {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Handle<Mesh>) {
        self.mesh = Some(mesh);
    }

    pub fn clear_mesh(&mut self) {
        self.mesh = None;
    }

    pub fn material(&self) -> Option<Handle<Material>> {
        self.material
    }

    pub fn set_material(&mut self, material: Handle<Material>) {
        self.material = Some(material);
    }

    pub fn clear_material(&mut self) {
        self.material = None;
    }

    pub fn light(&self) -> Option<Handle<Light>> {
        self.light
    }

    pub fn set_light(&mut self, light: Handle<Light>) {
        self.light = Some(light);
    }

    pub fn clear_light(&mut self) {
        self.light = None;
    }

    pub fn volume(&self) -> Option<Handle<Volume>> {
        self.volume
    }

    pub fn set_volume(&mut self, volume: Handle<Volume>) {
        self.volume = Some(volume);
    }

    pub fn clear_volume(&mut self) {
        self.volume = None;
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    pub fn set_visibility(&mut self, visible: bool) {
        self.hidden = !visible;
    }
}

impl Component for Entity {
    const KIND: ComponentKind = ComponentKind::Entity;
    type Gpu = EntityStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> EntityStruct {
        EntityStruct {
            transform_id: Handle::gpu_index(self.transform),
            camera_id: Handle::gpu_index(self.camera),
            material_id: Handle::gpu_index(self.material),
            light_id: Handle::gpu_index(self.light),
            mesh_id: Handle::gpu_index(self.mesh),
            volume_id: Handle::gpu_index(self.volume),
            visible: u32::from(!self.hidden),
            _padding: 0,
        }
    }
}

/// Entity links for GPU. Ids are slot indices, `-1` when unset.
///
/// Links to removed components are cleared by
/// [`World::synchronize`](crate::World::synchronize) before upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct EntityStruct {
    pub transform_id: i32,
    pub camera_id: i32,
    pub material_id: i32,
    pub light_id: i32,
    pub mesh_id: i32,
    pub volume_id: i32,
    pub visible: u32,
    pub _padding: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_links_map_to_minus_one() {
        let pool = SlotPool::<Entity>::allocate(1);
        let mut entity = Entity::default();
        entity.set_mesh(Handle::new(4, 1));
        let gpu = entity.to_gpu(&pool);
        assert_eq!(gpu.mesh_id, 4);
        assert_eq!(gpu.transform_id, -1);
        assert_eq!(gpu.light_id, -1);
        assert_eq!(gpu.visible, 1);
    }

    #[test]
    fn clearing_a_link_forgets_it() {
        let mut entity = Entity::default();
        entity.set_light(Handle::new(0, 1));
        entity.clear_light();
        assert!(entity.light().is_none());
    }

    #[test]
    fn visibility_toggles() {
        let mut entity = Entity::default();
        assert!(entity.is_visible());
        entity.set_visibility(false);
        assert!(!entity.is_visible());
    }
}
