//! Composition of an [`AssetScene`] into the registries.
//!
//! Pass one creates the flat resources (materials, textures, meshes), pass
//! two walks the node tree creating transforms and entities, and a final
//! step binds explicit lights to the transforms named after them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use glam::Vec3;

use super::asset::{AssetMaterial, AssetMesh, AssetNode, AssetScene, LightKind, TextureSlot};
use super::{Diagnostics, ImportError};
use crate::registry::Handle;
use crate::resources::{Material, Mesh, MeshData, Texture, TextureData};
use crate::scene::{Light, Placement, Scene, Transform};
use crate::World;

/// Texture requested by one or more material slots
#[derive(Debug, Clone, Copy)]
struct TextureRequest {
    linear: bool,
}

/// Phong shininess to roughness
pub(crate) fn shininess_to_roughness(shininess: f32) -> f32 {
    (2.0 / (shininess + 2.0)).powf(0.25)
}

/// Join a texture reference onto the asset directory, normalising separators
pub(crate) fn resolve_texture_path(directory: &Path, reference: &str) -> String {
    let reference = reference.replace('\\', "/");
    if Path::new(&reference).is_absolute() {
        return reference;
    }
    let directory = directory.to_string_lossy().replace('\\', "/");
    if directory.is_empty() {
        reference
    } else {
        format!("{}/{}", directory.trim_end_matches('/'), reference)
    }
}

pub(crate) struct Composer<'a> {
    world: &'a World,
    directory: &'a Path,
    diagnostics: Diagnostics,
    scene: Scene,
    /// Material index to component
    materials: Vec<Option<Handle<Material>>>,
    /// Implicit lights created for emissive materials
    material_lights: HashMap<usize, Handle<Light>>,
    /// Resolved path to loaded texture; failed loads are absent
    textures: HashMap<String, Handle<Texture>>,
    /// Mesh index to component and its registered name
    meshes: Vec<Option<(Handle<Mesh>, String)>>,
    /// First transform created for each node name during this import
    node_transforms: HashMap<String, Handle<Transform>>,
}

impl<'a> Composer<'a> {
    pub fn new(world: &'a World, directory: &'a Path, diagnostics: Diagnostics) -> Self {
        Self {
            world,
            directory,
            diagnostics,
            scene: Scene::default(),
            materials: Vec::new(),
            material_lights: HashMap::new(),
            textures: HashMap::new(),
            meshes: Vec::new(),
            node_transforms: HashMap::new(),
        }
    }

    pub fn compose(mut self, asset: &AssetScene, placement: &Placement) -> Scene {
        self.create_materials(&asset.materials);
        self.load_textures(&asset.materials);
        self.bind_materials(&asset.materials);
        self.create_meshes(&asset.meshes);

        self.compose_node(&asset.root, None, placement, asset);

        self.create_lights(asset);
        for camera in &asset.cameras {
            self.diagnostics
                .note(format_args!("Camera \"{camera}\" is not imported"));
        }

        self.scene
    }

    fn create_materials(&mut self, materials: &[AssetMaterial]) {
        for material in materials {
            match self.world.materials.create_unique(&material.name) {
                Ok(handle) => {
                    self.scene.materials.push(handle);
                    self.materials.push(Some(handle));
                }
                Err(err) => {
                    self.diagnostics.problem(&ImportError::from(err));
                    self.materials.push(None);
                }
            }
        }
    }

    /// Load every distinct texture path once, in path order.
    ///
    /// Decoding happens before the texture registry is locked.
    fn load_textures(&mut self, materials: &[AssetMaterial]) {
        let mut requests: BTreeMap<String, TextureRequest> = BTreeMap::new();
        for texture in materials.iter().flat_map(|m| &m.textures) {
            let path = resolve_texture_path(self.directory, &texture.path);
            requests.entry(path).or_insert(TextureRequest {
                linear: texture.slot.is_linear(),
            });
        }

        for (path, request) in requests {
            let data = match TextureData::from_file(&path) {
                Ok(data) => data,
                Err(source) => {
                    self.diagnostics
                        .problem(&ImportError::ResourceLoadFailure { path, source });
                    continue;
                }
            };
            let handle = match self.world.textures.create_unique(&path) {
                Ok(handle) => handle,
                Err(err) => {
                    self.diagnostics.problem(&ImportError::from(err));
                    continue;
                }
            };
            self.world.textures.write(handle, |texture| {
                texture.set_data(data);
                texture.set_source(path.as_str());
                texture.set_linear(request.linear);
            });
            self.diagnostics.note(format_args!(
                "Loaded texture \"{path}\" ({})",
                if request.linear { "linear" } else { "sRGB" }
            ));
            self.scene.textures.push(handle);
            self.textures.insert(path, handle);
        }
    }

    fn implicit_light(&mut self, index: usize, name: &str) -> Option<Handle<Light>> {
        if let Some(light) = self.material_lights.get(&index) {
            return Some(*light);
        }
        match self.world.lights.create_unique(name) {
            Ok(light) => {
                self.scene.lights.push(light);
                self.material_lights.insert(index, light);
                Some(light)
            }
            Err(err) => {
                self.diagnostics.problem(&ImportError::from(err));
                None
            }
        }
    }

    fn bind_materials(&mut self, materials: &[AssetMaterial]) {
        for (index, asset) in materials.iter().enumerate() {
            let Some(handle) = self.materials.get(index).copied().flatten() else {
                continue;
            };
            self.bind_properties(index, handle, asset);
            self.bind_textures(index, handle, asset);
        }
    }

    fn bind_properties(&mut self, index: usize, handle: Handle<Material>, asset: &AssetMaterial) {
        let world = self.world;
        let materials = &world.materials;

        if let Some(diffuse) = asset.diffuse {
            materials.write(handle, |m| m.set_base_color(diffuse));
        }

        if let Some(emissive) = asset.emissive.filter(|e| e.max_element() > 0.0) {
            if let Some(light) = self.implicit_light(index, &asset.name) {
                world.lights.write(light, |l| l.set_color(emissive));
            }
        }

        if let Some(specular) = asset.specular {
            if specular.x == specular.y && specular.y == specular.z {
                materials.write(handle, |m| m.set_specular(specular.x));
            } else {
                self.diagnostics.note(format_args!(
                    "Material \"{}\": colored specular {specular} is not supported",
                    asset.name
                ));
            }
        }

        if let Some(shininess) = asset.shininess.filter(|s| *s != 0.0) {
            let roughness = shininess_to_roughness(shininess);
            materials.write(handle, |m| m.set_roughness(roughness));
        }
        if let Some(roughness) = asset.roughness {
            materials.write(handle, |m| m.set_roughness(roughness));
        }
        if let Some(metallic) = asset.metallic {
            materials.write(handle, |m| m.set_metallic(metallic));
        }

        let ior = asset.ior.unwrap_or(1.0);
        if let Some(ior) = asset.ior {
            materials.write(handle, |m| m.set_ior(ior));
        }

        if let Some(opacity) = asset.opacity.filter(|o| *o != 1.0) {
            if ior == 1.0 {
                materials.write(handle, |m| m.set_alpha(opacity));
            } else {
                materials.write(handle, |m| m.set_transmission(opacity));
            }
        }
    }

    fn bind_textures(&mut self, index: usize, handle: Handle<Material>, asset: &AssetMaterial) {
        let world = self.world;
        let materials = &world.materials;
        for reference in &asset.textures {
            let path = resolve_texture_path(self.directory, &reference.path);
            let Some(texture) = self.textures.get(&path).copied() else {
                self.diagnostics.note(format_args!(
                    "Material \"{}\": texture \"{path}\" unavailable, slot left empty",
                    asset.name
                ));
                continue;
            };

            match reference.slot {
                TextureSlot::Diffuse | TextureSlot::BaseColor => {
                    let alpha_channel = reference.channel.unwrap_or(3);
                    materials.write(handle, |m| {
                        m.set_base_color_texture(texture);
                        m.set_alpha_texture(texture, alpha_channel);
                    });
                }
                TextureSlot::Specular => {
                    let channel = reference.channel.unwrap_or(0);
                    materials.write(handle, |m| m.set_specular_texture(texture, channel));
                }
                TextureSlot::Normals => {
                    let linear = world.textures.read(texture, Texture::is_linear);
                    if linear == Some(false) {
                        log::warn!(
                            "Normal map \"{path}\" of material \"{}\" was loaded as sRGB, forcing linear",
                            asset.name
                        );
                        world.textures.write(texture, |t| t.set_linear(true));
                    }
                    materials.write(handle, |m| m.set_normal_map(texture));
                }
                TextureSlot::Emissive => {
                    if let Some(light) = self.implicit_light(index, &asset.name) {
                        world.lights.write(light, |l| l.set_color_texture(texture));
                    }
                }
                TextureSlot::DiffuseRoughness => {
                    let channel = reference.channel.unwrap_or(0);
                    materials.write(handle, |m| m.set_roughness_texture(texture, channel));
                }
                TextureSlot::Metalness => {
                    let channel = reference.channel.unwrap_or(0);
                    materials.write(handle, |m| m.set_metallic_texture(texture, channel));
                }
            }
        }
    }

    /// Turn a polygon soup into validated triangle data
    fn build_mesh(&self, asset: &AssetMesh) -> Result<MeshData, ImportError> {
        let invalid = |source| ImportError::InvalidMesh {
            mesh: asset.name.clone(),
            source,
        };
        let vertex_count = asset.positions.len();

        let mut indices = Vec::with_capacity(asset.faces.len() * 3);
        let mut dropped = 0usize;
        for (face_index, face) in asset.faces.iter().enumerate() {
            if face.len() != 3 {
                dropped += 1;
                continue;
            }
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                log::warn!(
                    "Mesh \"{}\": face {face_index} references vertex {index} of {vertex_count}",
                    asset.name
                );
                return Err(invalid(crate::resources::MeshError::IndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                }));
            }
            indices.extend_from_slice(face);
        }
        if dropped > 0 {
            self.diagnostics.note(format_args!(
                "Mesh \"{}\": dropped {dropped} non-triangular faces",
                asset.name
            ));
        }

        let mut data = MeshData::from_data(asset.positions.clone(), indices).map_err(invalid)?;

        match &asset.normals {
            Some(normals) => data = data.with_normals(normals.clone()).map_err(invalid)?,
            None => self
                .diagnostics
                .note(format_args!("Mesh \"{}\" has no normals", asset.name)),
        }
        match &asset.tangents {
            Some(tangents) => data = data.with_tangents(tangents.clone()).map_err(invalid)?,
            None => self
                .diagnostics
                .note(format_args!("Mesh \"{}\" has no tangents", asset.name)),
        }
        match &asset.texcoords {
            Some(texcoords) => data = data.with_texcoords(texcoords.clone()).map_err(invalid)?,
            None => self
                .diagnostics
                .note(format_args!("Mesh \"{}\" has no texture coordinates", asset.name)),
        }
        Ok(data)
    }

    fn create_meshes(&mut self, meshes: &[AssetMesh]) {
        for asset in meshes {
            let entry = match self.build_mesh(asset) {
                Ok(data) => self.register_mesh(&asset.name, data),
                Err(err) => {
                    self.diagnostics.problem(&err);
                    None
                }
            };
            self.meshes.push(entry);
        }
    }

    fn register_mesh(&mut self, name: &str, data: MeshData) -> Option<(Handle<Mesh>, String)> {
        let handle = match self.world.meshes.create_unique(name) {
            Ok(handle) => handle,
            Err(err) => {
                self.diagnostics.problem(&ImportError::from(err));
                return None;
            }
        };
        self.world.meshes.write(handle, |mesh| mesh.set_data(data));
        self.scene.meshes.push(handle);
        let registered = self.world.meshes.name_of(handle)?;
        Some((handle, registered))
    }

    fn compose_node(
        &mut self,
        node: &AssetNode,
        parent: Option<Handle<Transform>>,
        placement: &Placement,
        asset: &AssetScene,
    ) {
        let world = self.world;
        let transforms = &world.transforms;
        let handle = match transforms.create_unique(&node.name) {
            Ok(handle) => handle,
            Err(err) => {
                self.diagnostics.problem(&ImportError::from(err));
                return;
            }
        };

        let decomposed = transforms
            .write(handle, |t| t.set_local_matrix(node.transform))
            .unwrap_or(Ok(()));
        if let Err(source) = decomposed {
            transforms.remove_handle(handle);
            self.diagnostics.problem(&ImportError::DecompositionFailure {
                node: node.name.clone(),
                source,
            });
            return;
        }

        match parent {
            None => {
                transforms.apply_root_placement(handle, placement);
            }
            Some(parent) => {
                if let Err(err) = transforms.set_parent(handle, parent) {
                    log::warn!("Node \"{}\": {err}", node.name);
                }
            }
        }
        self.scene.transforms.push(handle);
        self.node_transforms
            .entry(node.name.clone())
            .or_insert(handle);

        let transform_name = transforms.name_of(handle).unwrap_or_default();
        for &mesh_index in &node.meshes {
            let Some((mesh, mesh_name)) = self.meshes.get(mesh_index).cloned().flatten() else {
                self.diagnostics.note(format_args!(
                    "Node \"{}\": mesh {mesh_index} was not imported, skipping",
                    node.name
                ));
                continue;
            };
            self.create_mesh_entity(&transform_name, handle, mesh, &mesh_name, mesh_index, asset);
        }

        for child in &node.children {
            self.compose_node(child, Some(handle), placement, asset);
        }
    }

    fn create_mesh_entity(
        &mut self,
        transform_name: &str,
        transform: Handle<Transform>,
        mesh: Handle<Mesh>,
        mesh_name: &str,
        mesh_index: usize,
        asset: &AssetScene,
    ) {
        let entity = match self
            .world
            .entities
            .create_unique(&format!("{transform_name}_{mesh_name}"))
        {
            Ok(entity) => entity,
            Err(err) => {
                self.diagnostics.problem(&ImportError::from(err));
                return;
            }
        };

        let material_index = asset.meshes.get(mesh_index).and_then(|m| m.material);
        let material = material_index.and_then(|i| self.materials.get(i).copied().flatten());
        let light = material_index.and_then(|i| self.material_lights.get(&i).copied());

        self.world.entities.write(entity, |e| {
            e.set_transform(transform);
            e.set_mesh(mesh);
            if let Some(material) = material {
                e.set_material(material);
            }
            if let Some(light) = light {
                e.set_light(light);
            }
        });
        self.scene.entities.push(entity);
    }

    fn create_lights(&mut self, asset: &AssetScene) {
        for light in &asset.lights {
            match light.kind {
                LightKind::Point => self.create_point_light(&light.name, light.diffuse),
                LightKind::Directional => self.diagnostics.note(format_args!(
                    "Directional light \"{}\" is not imported",
                    light.name
                )),
                kind => self.diagnostics.note(format_args!(
                    "Light \"{}\": {kind:?} lights are not supported",
                    light.name
                )),
            }
        }
    }

    fn create_point_light(&mut self, name: &str, color: Vec3) {
        let transform = self
            .node_transforms
            .get(name)
            .copied()
            .or_else(|| self.world.transforms.get(name));
        let Some(transform) = transform else {
            self.diagnostics.note(format_args!(
                "Point light \"{name}\" has no matching node, skipping"
            ));
            return;
        };

        let entity = match self.world.entities.create_unique(name) {
            Ok(entity) => entity,
            Err(err) => {
                self.diagnostics.problem(&ImportError::from(err));
                return;
            }
        };
        let light = match self.world.lights.create_unique(name) {
            Ok(light) => light,
            Err(err) => {
                self.world.entities.remove_handle(entity);
                self.diagnostics.problem(&ImportError::from(err));
                return;
            }
        };

        self.world.lights.write(light, |l| l.set_color(color));
        self.world.entities.write(entity, |e| {
            e.set_transform(transform);
            e.set_light(light);
        });
        self.scene.entities.push(entity);
        self.scene.lights.push(light);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shininess_maps_to_roughness() {
        assert_eq!(shininess_to_roughness(0.0), 1.0);
        assert!((shininess_to_roughness(30.0) - (1.0f32 / 16.0).powf(0.25)).abs() < 1e-6);
        assert!(shininess_to_roughness(1000.0) < 0.25);
    }

    #[test]
    fn texture_paths_are_joined_and_normalised() {
        let dir = Path::new("assets/models");
        assert_eq!(
            resolve_texture_path(dir, "tex\\wood.png"),
            "assets/models/tex/wood.png"
        );
        assert_eq!(resolve_texture_path(Path::new(""), "wood.png"), "wood.png");
        assert_eq!(
            resolve_texture_path(dir, "/abs/wood.png"),
            "/abs/wood.png"
        );
    }
}
