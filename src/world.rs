//! One registry per component type, owned together

use glam::Mat4;

use crate::registry::{ComponentKind, Handle, Registry};
use crate::resources::{Material, Mesh, Texture, Volume};
use crate::scene::{Camera, Entity, Light, Transform};
use crate::sync::{DiscardSink, SyncSink};
use crate::RegistryConfig;

/// Live targets of an entity's links at the time of the query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityLinks {
    pub transform: Option<Handle<Transform>>,
    pub camera: Option<Handle<Camera>>,
    pub mesh: Option<Handle<Mesh>>,
    pub material: Option<Handle<Material>>,
    pub light: Option<Handle<Light>>,
    pub volume: Option<Handle<Volume>>,
}

impl EntityLinks {
    /// Links as stored on the entity, live or not
    fn stored(entity: &Entity) -> Self {
        Self {
            transform: entity.transform(),
            camera: entity.camera(),
            mesh: entity.mesh(),
            material: entity.material(),
            light: entity.light(),
            volume: entity.volume(),
        }
    }
}

/// The full set of component registries.
///
/// Built once from a [`RegistryConfig`] and shared by reference. Methods that
/// touch several registries take their locks one at a time and never hold
/// two at once. Synchronization visits registries in [`ComponentKind`] order.
#[derive(Debug)]
pub struct World {
    pub cameras: Registry<Camera>,
    pub transforms: Registry<Transform>,
    pub meshes: Registry<Mesh>,
    pub textures: Registry<Texture>,
    pub materials: Registry<Material>,
    pub lights: Registry<Light>,
    pub volumes: Registry<Volume>,
    pub entities: Registry<Entity>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

impl World {
    pub fn new(config: &RegistryConfig) -> Self {
        log::info!(
            "Creating world: {} cameras, {} transforms, {} meshes, {} textures, {} materials, {} lights, {} volumes, {} entities",
            config.max_cameras,
            config.max_transforms,
            config.max_meshes,
            config.max_textures,
            config.max_materials,
            config.max_lights,
            config.max_volumes,
            config.max_entities,
        );
        Self {
            cameras: Registry::new(config.max_cameras),
            transforms: Registry::new(config.max_transforms),
            meshes: Registry::new(config.max_meshes),
            textures: Registry::new(config.max_textures),
            materials: Registry::new(config.max_materials),
            lights: Registry::new(config.max_lights),
            volumes: Registry::new(config.max_volumes),
            entities: Registry::new(config.max_entities),
        }
    }

    /// Dirty flag of the registry for `kind`
    pub fn is_dirty(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Camera => self.cameras.is_any_dirty(),
            ComponentKind::Transform => self.transforms.is_any_dirty(),
            ComponentKind::Mesh => self.meshes.is_any_dirty(),
            ComponentKind::Texture => self.textures.is_any_dirty(),
            ComponentKind::Material => self.materials.is_any_dirty(),
            ComponentKind::Light => self.lights.is_any_dirty(),
            ComponentKind::Volume => self.volumes.is_any_dirty(),
            ComponentKind::Entity => self.entities.is_any_dirty(),
        }
    }

    pub fn is_any_dirty(&self) -> bool {
        ComponentKind::ALL.iter().any(|&kind| self.is_dirty(kind))
    }

    /// Live component count of the registry for `kind`
    pub fn count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Camera => self.cameras.count(),
            ComponentKind::Transform => self.transforms.count(),
            ComponentKind::Mesh => self.meshes.count(),
            ComponentKind::Texture => self.textures.count(),
            ComponentKind::Material => self.materials.count(),
            ComponentKind::Light => self.lights.count(),
            ComponentKind::Volume => self.volumes.count(),
            ComponentKind::Entity => self.entities.count(),
        }
    }

    /// Regenerate GPU data of every dirty registry and pass it to `sink`.
    ///
    /// Entity links to removed components are released first. Clean
    /// registries are skipped. Returns the kinds that were synchronized.
    pub fn synchronize(&self, sink: &mut impl SyncSink) -> Vec<ComponentKind> {
        if self.is_any_dirty() {
            let released = self.release_dead_links();
            if released > 0 {
                log::debug!("Released dead links of {released} entities");
            }
        }

        let mut synced = Vec::new();
        for kind in ComponentKind::ALL {
            if !self.is_dirty(kind) {
                continue;
            }
            match kind {
                ComponentKind::Camera => self.cameras.update_all_with(|v| sink.cameras(v)),
                ComponentKind::Transform => self.transforms.update_all_with(|v| sink.transforms(v)),
                ComponentKind::Mesh => self.meshes.update_all_with(|v| sink.meshes(v)),
                ComponentKind::Texture => self.textures.update_all_with(|v| sink.textures(v)),
                ComponentKind::Material => self.materials.update_all_with(|v| sink.materials(v)),
                ComponentKind::Light => self.lights.update_all_with(|v| sink.lights(v)),
                ComponentKind::Volume => self.volumes.update_all_with(|v| sink.volumes(v)),
                ComponentKind::Entity => self.entities.update_all_with(|v| sink.entities(v)),
            }
            synced.push(kind);
        }
        if !synced.is_empty() {
            log::debug!("Synchronized {:?}", synced);
        }
        synced
    }

    /// Regenerate GPU data everywhere and clear all dirty state
    pub fn update_all(&self) {
        self.synchronize(&mut DiscardSink);
    }

    /// Remove every component of every type
    pub fn clear(&self) {
        self.cameras.clear();
        self.transforms.clear();
        self.meshes.clear();
        self.textures.clear();
        self.materials.clear();
        self.lights.clear();
        self.volumes.clear();
        self.entities.clear();
    }

    /// Clear entity links whose target was removed and mark those entities
    /// dirty, so no GPU record keeps the id of a reused slot.
    ///
    /// Returns the number of entities changed. Runs at the start of
    /// [`synchronize`](Self::synchronize) whenever any registry is dirty.
    pub fn release_dead_links(&self) -> usize {
        let mut released = 0;
        for entity in self.entities.handles() {
            let Some(raw) = self.entities.read(entity, EntityLinks::stored) else {
                continue;
            };
            let live = self.live_links(raw);
            if raw == live {
                continue;
            }

            // Only clear a link that still holds the dead handle.
            let changed = self.entities.write(entity, |e| {
                if live.transform.is_none() && e.transform() == raw.transform {
                    e.clear_transform();
                }
                if live.camera.is_none() && e.camera() == raw.camera {
                    e.clear_camera();
                }
                if live.mesh.is_none() && e.mesh() == raw.mesh {
                    e.clear_mesh();
                }
                if live.material.is_none() && e.material() == raw.material {
                    e.clear_material();
                }
                if live.light.is_none() && e.light() == raw.light {
                    e.clear_light();
                }
                if live.volume.is_none() && e.volume() == raw.volume {
                    e.clear_volume();
                }
            });
            if changed.is_some() {
                released += 1;
            }
        }
        released
    }

    /// Resolve an entity's links, dropping any that point at removed components
    pub fn entity_links(&self, entity: Handle<Entity>) -> Option<EntityLinks> {
        let raw = self.entities.read(entity, EntityLinks::stored)?;
        Some(self.live_links(raw))
    }

    fn live_links(&self, raw: EntityLinks) -> EntityLinks {
        EntityLinks {
            camera: raw.camera.filter(|h| self.cameras.is_alive(*h)),
            transform: raw.transform.filter(|h| self.transforms.is_alive(*h)),
            mesh: raw.mesh.filter(|h| self.meshes.is_alive(*h)),
            material: raw.material.filter(|h| self.materials.is_alive(*h)),
            light: raw.light.filter(|h| self.lights.is_alive(*h)),
            volume: raw.volume.filter(|h| self.volumes.is_alive(*h)),
        }
    }

    /// World matrix of the entity's transform, if it has a live one
    pub fn entity_world_matrix(&self, entity: Handle<Entity>) -> Option<Mat4> {
        let transform = self.entity_links(entity)?.transform?;
        self.transforms.world_matrix(transform)
    }
}
