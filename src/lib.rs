//! Scene Registry - component registries and scene composition for a ray-traced renderer
//!
//! Scenes are described with named, typed components held in fixed-capacity,
//! thread-safe registries:
//! - **Camera**, **Transform**, **Entity**, **Light** in [`scene`]
//! - **Mesh**, **Material**, **Texture**, **Volume** in [`resources`]
//!
//! # Features
//! - Stable ids, unique names and generation-checked [`Handle`]s
//! - Dirty tracking with a [`SyncSink`] boundary for incremental GPU upload
//! - Transform hierarchies with cycle rejection and lazily derived world matrices
//! - Scene import that composes an external asset graph into the registries

pub mod import;
pub mod registry;
pub mod resources;
pub mod scene;
pub mod sync;
mod world;

pub use import::{ImportError, ImportOptions, SceneImporter};
pub use registry::{Component, ComponentKind, Handle, Registry, RegistryError, SyncView};
pub use scene::{Placement, Scene};
pub use sync::SyncSink;
pub use world::{EntityLinks, World};

pub const MAX_CAMERAS: usize = 256;
pub const MAX_TRANSFORMS: usize = 65536;
pub const MAX_MESHES: usize = 16384;
pub const MAX_TEXTURES: usize = 4096;
pub const MAX_MATERIALS: usize = 16384;
pub const MAX_LIGHTS: usize = 4096;
pub const MAX_VOLUMES: usize = 256;
pub const MAX_ENTITIES: usize = 65536;

/// Capacity of each component registry, fixed for the lifetime of a [`World`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub max_cameras: usize,
    pub max_transforms: usize,
    pub max_meshes: usize,
    pub max_textures: usize,
    pub max_materials: usize,
    pub max_lights: usize,
    pub max_volumes: usize,
    pub max_entities: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_cameras: MAX_CAMERAS,
            max_transforms: MAX_TRANSFORMS,
            max_meshes: MAX_MESHES,
            max_textures: MAX_TEXTURES,
            max_materials: MAX_MATERIALS,
            max_lights: MAX_LIGHTS,
            max_volumes: MAX_VOLUMES,
            max_entities: MAX_ENTITIES,
        }
    }
}

impl RegistryConfig {
    /// Same capacity for every component type
    pub fn uniform(capacity: usize) -> Self {
        Self {
            max_cameras: capacity,
            max_transforms: capacity,
            max_meshes: capacity,
            max_textures: capacity,
            max_materials: capacity,
            max_lights: capacity,
            max_volumes: capacity,
            max_entities: capacity,
        }
    }

    #[must_use]
    pub fn with_max_cameras(mut self, capacity: usize) -> Self {
        self.max_cameras = capacity;
        self
    }

    #[must_use]
    pub fn with_max_transforms(mut self, capacity: usize) -> Self {
        self.max_transforms = capacity;
        self
    }

    #[must_use]
    pub fn with_max_meshes(mut self, capacity: usize) -> Self {
        self.max_meshes = capacity;
        self
    }

    #[must_use]
    pub fn with_max_textures(mut self, capacity: usize) -> Self {
        self.max_textures = capacity;
        self
    }

    #[must_use]
    pub fn with_max_materials(mut self, capacity: usize) -> Self {
        self.max_materials = capacity;
        self
    }

    #[must_use]
    pub fn with_max_lights(mut self, capacity: usize) -> Self {
        self.max_lights = capacity;
        self
    }

    #[must_use]
    pub fn with_max_volumes(mut self, capacity: usize) -> Self {
        self.max_volumes = capacity;
        self
    }

    #[must_use]
    pub fn with_max_entities(mut self, capacity: usize) -> Self {
        self.max_entities = capacity;
        self
    }
}

/// Install `env_logger` as the `log` backend, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_max_constants() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_transforms, MAX_TRANSFORMS);
        assert_eq!(config.max_entities, MAX_ENTITIES);
    }

    #[test]
    fn builder_overrides_single_capacity() {
        let config = RegistryConfig::uniform(8).with_max_lights(2);
        assert_eq!(config.max_lights, 2);
        assert_eq!(config.max_meshes, 8);
    }
}
