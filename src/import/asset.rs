//! Format-independent asset graph produced by parsers

use glam::{Mat4, Vec2, Vec3};

/// Material input a texture is referenced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    Specular,
    Normals,
    Emissive,
    BaseColor,
    Metalness,
    DiffuseRoughness,
}

impl TextureSlot {
    /// Texels of this slot hold data, not color
    pub fn is_linear(self) -> bool {
        matches!(
            self,
            TextureSlot::Normals
                | TextureSlot::Emissive
                | TextureSlot::Metalness
                | TextureSlot::DiffuseRoughness
        )
    }
}

/// A texture referenced by path from a material slot
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTexture {
    pub slot: TextureSlot,
    /// Path relative to the asset file
    pub path: String,
    /// Channel for scalar inputs; the slot's default when unset
    pub channel: Option<u8>,
}

impl AssetTexture {
    pub fn new(slot: TextureSlot, path: impl Into<String>) -> Self {
        Self {
            slot,
            path: path.into(),
            channel: None,
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMaterial {
    pub name: String,
    pub diffuse: Option<Vec3>,
    pub emissive: Option<Vec3>,
    pub specular: Option<Vec3>,
    pub shininess: Option<f32>,
    pub ior: Option<f32>,
    pub opacity: Option<f32>,
    pub metallic: Option<f32>,
    pub roughness: Option<f32>,
    pub textures: Vec<AssetTexture>,
}

impl AssetMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_diffuse(mut self, color: Vec3) -> Self {
        self.diffuse = Some(color);
        self
    }

    #[must_use]
    pub fn with_emissive(mut self, color: Vec3) -> Self {
        self.emissive = Some(color);
        self
    }

    #[must_use]
    pub fn with_specular(mut self, color: Vec3) -> Self {
        self.specular = Some(color);
        self
    }

    #[must_use]
    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = Some(shininess);
        self
    }

    #[must_use]
    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior = Some(ior);
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    #[must_use]
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = Some(metallic);
        self
    }

    #[must_use]
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = Some(roughness);
        self
    }

    #[must_use]
    pub fn with_texture(mut self, texture: AssetTexture) -> Self {
        self.textures.push(texture);
        self
    }
}

/// Polygon soup as delivered by a parser; faces may have any arity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec3>>,
    pub texcoords: Option<Vec<Vec2>>,
    pub faces: Vec<Vec<u32>>,
    pub material: Option<usize>,
}

impl AssetMesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            positions,
            faces,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    /// Fill in area-weighted vertex normals from the triangular faces.
    ///
    /// Faces with out-of-range indices are ignored here; composition rejects
    /// them later.
    pub fn generate_smooth_normals(&mut self) {
        let n = self.positions.len();
        let mut normals = vec![Vec3::ZERO; n];
        for face in self.faces.iter().filter(|f| f.len() == 3) {
            let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if a >= n || b >= n || c >= n {
                continue;
            }
            let p = &self.positions;
            let face_normal = (p[b] - p[a]).cross(p[c] - p[a]);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }
        self.normals = Some(normals.into_iter().map(Vec3::normalize_or_zero).collect());
    }
}

/// Node of the asset hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub name: String,
    /// Local-to-parent matrix
    pub transform: Mat4,
    /// Indices into [`AssetScene::meshes`]
    pub meshes: Vec<usize>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: AssetNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AssetNode::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
    Ambient,
    Area,
}

/// Light source. Its placement is the node of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLight {
    pub name: String,
    pub kind: LightKind,
    pub diffuse: Vec3,
}

impl AssetLight {
    pub fn new(name: impl Into<String>, kind: LightKind, diffuse: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            diffuse,
        }
    }
}

/// Complete parsed asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetScene {
    pub materials: Vec<AssetMaterial>,
    pub meshes: Vec<AssetMesh>,
    pub root: AssetNode,
    pub lights: Vec<AssetLight>,
    pub cameras: Vec<String>,
}

impl AssetScene {
    pub fn new(root: AssetNode) -> Self {
        Self {
            materials: Vec::new(),
            meshes: Vec::new(),
            root,
            lights: Vec::new(),
            cameras: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: AssetMaterial) -> Self {
        self.materials.push(material);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: AssetMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: AssetLight) -> Self {
        self.lights.push(light);
        self
    }
}
