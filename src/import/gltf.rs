//! glTF 2.0 front-end.
//!
//! Builds an [`AssetScene`] from a `.gltf` or `.glb` file: PBR materials with
//! URI textures, one mesh per primitive, the default scene's node tree under a
//! synthetic root, and `KHR_lights_punctual` lights named after their nodes.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};

use super::asset::{
    AssetLight, AssetMaterial, AssetMesh, AssetNode, AssetScene, AssetTexture, LightKind,
    TextureSlot,
};
use super::parser::{AssetParser, ParseError, ParserPreset};

/// Parser for glTF 2.0 files
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfParser;

impl AssetParser for GltfParser {
    fn name(&self) -> &str {
        "glTF"
    }

    fn extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }

    fn parse(&self, path: &Path, preset: ParserPreset) -> Result<AssetScene, ParseError> {
        let gltf_dep::Gltf { document, blob } = gltf_dep::Gltf::open(path)?;
        let buffers = gltf_dep::import_buffers(&document, path.parent(), blob)?;

        let materials = document.materials().map(convert_material).collect();

        let mut meshes = Vec::new();
        let mut mesh_map = Vec::new();
        for mesh in document.meshes() {
            let mut flat = Vec::new();
            for mut asset_mesh in convert_mesh(&mesh, &buffers) {
                if preset == ParserPreset::MaxQuality && asset_mesh.normals.is_none() {
                    asset_mesh.generate_smooth_normals();
                }
                flat.push(meshes.len());
                meshes.push(asset_mesh);
            }
            mesh_map.push(flat);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene")
            .to_string();
        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next());

        let mut lights = Vec::new();
        let mut cameras = Vec::new();
        let root = match gltf_scene {
            Some(scene) => {
                let mut root = AssetNode::new(scene.name().unwrap_or(&stem));
                for node in scene.nodes() {
                    root.children
                        .push(convert_node(&node, &mesh_map, &mut lights, &mut cameras));
                }
                root
            }
            None => AssetNode::new(stem),
        };

        log::debug!(
            "Parsed glTF \"{}\": {} materials, {} meshes, {} nodes, {} lights",
            path.display(),
            document.materials().len(),
            meshes.len(),
            root.node_count(),
            lights.len()
        );

        Ok(AssetScene {
            materials,
            meshes,
            root,
            lights,
            cameras,
        })
    }
}

/// External image path of a texture; embedded images have none
fn texture_uri(texture: &gltf_dep::Texture<'_>) -> Option<String> {
    match texture.source().source() {
        gltf_dep::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
            Some(uri.to_string())
        }
        _ => {
            log::debug!(
                "Texture {} has an embedded image, skipping",
                texture.index()
            );
            None
        }
    }
}

fn convert_material(material: gltf_dep::Material<'_>) -> AssetMaterial {
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_string(),
        (None, Some(index)) => format!("material{index}"),
        (None, None) => "material".to_string(),
    };
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();

    let mut asset = AssetMaterial::new(name)
        .with_diffuse(Vec3::new(r, g, b))
        .with_metallic(pbr.metallic_factor())
        .with_roughness(pbr.roughness_factor())
        .with_emissive(Vec3::from(material.emissive_factor()));
    if a != 1.0 {
        asset = asset.with_opacity(a);
    }

    let mut push = |slot, texture: gltf_dep::Texture<'_>, channel: Option<u8>| {
        if let Some(uri) = texture_uri(&texture) {
            let mut reference = AssetTexture::new(slot, uri);
            reference.channel = channel;
            asset.textures.push(reference);
        }
    };

    if let Some(info) = pbr.base_color_texture() {
        push(TextureSlot::BaseColor, info.texture(), None);
    }
    // Roughness lives in green, metalness in blue.
    if let Some(info) = pbr.metallic_roughness_texture() {
        push(TextureSlot::DiffuseRoughness, info.texture(), Some(1));
        push(TextureSlot::Metalness, info.texture(), Some(2));
    }
    if let Some(normal) = material.normal_texture() {
        push(TextureSlot::Normals, normal.texture(), None);
    }
    if let Some(info) = material.emissive_texture() {
        push(TextureSlot::Emissive, info.texture(), None);
    }

    asset
}

/// Split an index stream into faces according to the primitive topology
fn build_faces(mode: gltf_dep::mesh::Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    use gltf_dep::mesh::Mode;

    let n = indices.len();
    match mode {
        Mode::Triangles => indices.chunks(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => (0..n.saturating_sub(2))
            .map(|i| {
                if i % 2 == 0 {
                    vec![indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    vec![indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect(),
        Mode::TriangleFan => (1..n.saturating_sub(1))
            .map(|i| vec![indices[0], indices[i], indices[i + 1]])
            .collect(),
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
        Mode::Lines | Mode::LineStrip | Mode::LineLoop => {
            indices.chunks(2).map(<[u32]>::to_vec).collect()
        }
    }
}

fn convert_mesh(mesh: &gltf_dep::Mesh<'_>, buffers: &[gltf_dep::buffer::Data]) -> Vec<AssetMesh> {
    let base_name = mesh
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));
    let primitive_count = mesh.primitives().len();

    mesh.primitives()
        .enumerate()
        .map(|(prim_idx, primitive)| {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .map(|iter| iter.map(Vec3::from).collect())
                .unwrap_or_default();
            let normals = reader
                .read_normals()
                .map(|iter| iter.map(Vec3::from).collect());
            let tangents = reader
                .read_tangents()
                .map(|iter| iter.map(|[x, y, z, _]| Vec3::new(x, y, z)).collect());
            let texcoords = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().map(Vec2::from).collect());
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let name = if primitive_count > 1 {
                format!("{base_name}_prim{prim_idx}")
            } else {
                base_name.clone()
            };

            AssetMesh {
                name,
                faces: build_faces(primitive.mode(), &indices),
                positions,
                normals,
                tangents,
                texcoords,
                material: primitive.material().index(),
            }
        })
        .collect()
}

fn convert_node(
    node: &gltf_dep::Node<'_>,
    mesh_map: &[Vec<usize>],
    lights: &mut Vec<AssetLight>,
    cameras: &mut Vec<String>,
) -> AssetNode {
    let name = node
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("node{}", node.index()));

    if let Some(light) = node.light() {
        let kind = match light.kind() {
            gltf_dep::khr_lights_punctual::Kind::Directional => LightKind::Directional,
            gltf_dep::khr_lights_punctual::Kind::Point => LightKind::Point,
            gltf_dep::khr_lights_punctual::Kind::Spot { .. } => LightKind::Spot,
        };
        let diffuse = Vec3::from(light.color()) * light.intensity();
        lights.push(AssetLight::new(name.clone(), kind, diffuse));
    }
    if let Some(camera) = node.camera() {
        cameras.push(camera.name().map_or_else(|| name.clone(), String::from));
    }

    let meshes = node
        .mesh()
        .and_then(|m| mesh_map.get(m.index()).cloned())
        .unwrap_or_default();

    AssetNode {
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        meshes,
        children: node
            .children()
            .map(|child| convert_node(&child, mesh_map, lights, cameras))
            .collect(),
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltf_dep::mesh::Mode;

    #[test]
    fn strips_and_fans_become_triangles() {
        let strip = build_faces(Mode::TriangleStrip, &[0, 1, 2, 3]);
        assert_eq!(strip, vec![vec![0, 1, 2], vec![2, 1, 3]]);

        let fan = build_faces(Mode::TriangleFan, &[0, 1, 2, 3]);
        assert_eq!(fan, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn lines_and_points_are_not_triangles() {
        assert!(build_faces(Mode::Lines, &[0, 1, 2, 3])
            .iter()
            .all(|f| f.len() == 2));
        assert!(build_faces(Mode::Points, &[0, 1]).iter().all(|f| f.len() == 1));
    }

    #[test]
    fn trailing_partial_triangle_is_kept_as_short_face() {
        let faces = build_faces(Mode::Triangles, &[0, 1, 2, 3]);
        assert_eq!(faces, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn parser_claims_gltf_extensions() {
        assert!(GltfParser.accepts("gltf"));
        assert!(GltfParser.accepts("GLB"));
        assert!(!GltfParser.accepts("obj"));
    }
}
