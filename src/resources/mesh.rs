//! Mesh data structures and generation

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::registry::{Component, ComponentKind, SlotPool};

/// Reasons a mesh cannot be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no vertex positions")]
    NoPositions,

    #[error("mesh has no triangles")]
    NoTriangles,

    #[error("index count {0} is not a multiple of three")]
    PartialTriangle(usize),

    #[error("{attribute} has {found} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Validated triangle mesh.
///
/// Every attribute array has one entry per position and every index is in
/// range. Missing attributes are stored as zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Build a mesh from positions and a flat triangle index list
    pub fn from_data(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::NoPositions);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(indices.len()));
        }
        if indices.is_empty() {
            return Err(MeshError::NoTriangles);
        }
        let vertex_count = positions.len();
        if let Some((i, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                face: i / 3,
                index,
                vertex_count,
            });
        }

        Ok(Self {
            normals: vec![Vec3::ZERO; vertex_count],
            tangents: vec![Vec3::ZERO; vertex_count],
            texcoords: vec![Vec2::ZERO; vertex_count],
            positions,
            indices,
        })
    }

    fn check_len(&self, attribute: &'static str, found: usize) -> Result<(), MeshError> {
        if found == self.positions.len() {
            Ok(())
        } else {
            Err(MeshError::AttributeLength {
                attribute,
                expected: self.positions.len(),
                found,
            })
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Result<Self, MeshError> {
        self.check_len("normals", normals.len())?;
        self.normals = normals;
        Ok(self)
    }

    pub fn with_tangents(mut self, tangents: Vec<Vec3>) -> Result<Self, MeshError> {
        self.check_len("tangents", tangents.len())?;
        self.tangents = tangents;
        Ok(self)
    }

    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Result<Self, MeshError> {
        self.check_len("texcoords", texcoords.len())?;
        self.texcoords = texcoords;
        Ok(self)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds as `(min, max)`
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.positions
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            })
    }

    /// Mean of all vertex positions
    pub fn centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::ZERO;
        }
        self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32
    }

    /// Replace normals with area-weighted averages of adjacent face normals
    pub fn generate_smooth_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face_normal =
                (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            accumulated[a] += face_normal;
            accumulated[b] += face_normal;
            accumulated[c] += face_normal;
        }
        self.normals = accumulated.into_iter().map(Vec3::normalize_or_zero).collect();
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let faces = [
            (Vec3::Z, Vec3::X),
            (-Vec3::Z, -Vec3::X),
            (Vec3::X, -Vec3::Z),
            (-Vec3::X, Vec3::Z),
            (Vec3::Y, Vec3::X),
            (-Vec3::Y, Vec3::X),
        ];
        let corners = [
            (Vec2::new(-0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec2::new(0.5, -0.5), Vec2::new(1.0, 1.0)),
            (Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec2::new(-0.5, 0.5), Vec2::new(0.0, 0.0)),
        ];

        let mut mesh = Self::default();
        for (face, (normal, tangent)) in faces.into_iter().enumerate() {
            let bitangent = normal.cross(tangent);
            for (corner, uv) in corners {
                mesh.positions
                    .push(normal * 0.5 + tangent * corner.x + bitangent * corner.y);
                mesh.normals.push(normal);
                mesh.tangents.push(tangent);
                mesh.texcoords.push(uv);
            }

            // Two triangles per face
            let base = face as u32 * 4;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a UV sphere
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();

        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                mesh.positions.push(Vec3::new(x, y, z) * 0.5);
                mesh.normals.push(Vec3::new(x, y, z).normalize_or_zero());
                // Tangent along theta direction
                mesh.tangents
                    .push(Vec3::new(-theta.sin(), 0.0, theta.cos()));
                mesh.texcoords.push(Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ));
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Create a plane on the XZ axis
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let subdivisions = subdivisions.max(1);
        let mut mesh = Self::default();

        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                mesh.positions.push(Vec3::new(
                    -half_width + x as f32 * step_x,
                    0.0,
                    -half_depth + z as f32 * step_z,
                ));
                mesh.normals.push(Vec3::Y);
                mesh.tangents.push(Vec3::X);
                mesh.texcoords.push(Vec2::new(
                    x as f32 / subdivisions as f32,
                    z as f32 / subdivisions as f32,
                ));
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let current = z * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }
}

/// Mesh component: owns validated geometry
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    data: MeshData,
}

impl Mesh {
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn set_data(&mut self, data: MeshData) {
        self.data = data;
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.data.triangle_count()
    }
}

impl Component for Mesh {
    const KIND: ComponentKind = ComponentKind::Mesh;
    type Gpu = MeshStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> MeshStruct {
        let (min, max) = self.data.bounds();
        MeshStruct {
            bbox_min: min.extend(0.0),
            bbox_max: max.extend(0.0),
            center: self.data.centroid().extend(1.0),
            num_vertices: self.data.vertex_count() as u32,
            num_triangles: self.data.triangle_count() as u32,
            _padding: [0; 2],
        }
    }
}

/// Mesh summary for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshStruct {
    pub bbox_min: Vec4,
    pub bbox_max: Vec4,
    pub center: Vec4,
    pub num_vertices: u32,
    pub num_triangles: u32,
    pub _padding: [u32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::X, Vec3::Y]
    }

    #[test]
    fn from_data_fills_missing_attributes_with_zeros() {
        let mesh = MeshData::from_data(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(mesh.normals(), &[Vec3::ZERO; 3]);
        assert_eq!(mesh.texcoords(), &[Vec2::ZERO; 3]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn from_data_rejects_out_of_range_index() {
        let err = MeshData::from_data(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 5]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                face: 0,
                index: 5,
                vertex_count: 2
            }
        );
    }

    #[test]
    fn from_data_rejects_empty_inputs() {
        assert_eq!(
            MeshData::from_data(Vec::new(), vec![0, 1, 2]),
            Err(MeshError::NoPositions)
        );
        assert_eq!(
            MeshData::from_data(triangle(), Vec::new()),
            Err(MeshError::NoTriangles)
        );
        assert_eq!(
            MeshData::from_data(triangle(), vec![0, 1]),
            Err(MeshError::PartialTriangle(2))
        );
    }

    #[test]
    fn attribute_length_must_match_positions() {
        let mesh = MeshData::from_data(triangle(), vec![0, 1, 2]).unwrap();
        let err = mesh.with_normals(vec![Vec3::Z; 2]).unwrap_err();
        assert!(matches!(err, MeshError::AttributeLength { expected: 3, found: 2, .. }));
    }

    #[test]
    fn smooth_normals_follow_winding() {
        let mut mesh = MeshData::from_data(triangle(), vec![0, 1, 2]).unwrap();
        mesh.generate_smooth_normals();
        assert!(mesh.normals().iter().all(|n| n.abs_diff_eq(Vec3::Z, 1e-6)));
    }

    #[test]
    fn generated_shapes_have_consistent_attributes() {
        for mesh in [
            MeshData::cube(),
            MeshData::sphere(8, 4),
            MeshData::plane(2.0, 2.0, 3),
        ] {
            let n = mesh.vertex_count();
            assert_eq!(mesh.normals().len(), n);
            assert_eq!(mesh.tangents().len(), n);
            assert_eq!(mesh.texcoords().len(), n);
            assert!(mesh.indices().iter().all(|&i| (i as usize) < n));
            assert_eq!(mesh.indices().len() % 3, 0);
        }
        assert_eq!(MeshData::cube().vertex_count(), 24);
        assert_eq!(MeshData::cube().triangle_count(), 12);
    }

    #[test]
    fn cube_bounds_are_unit() {
        let (min, max) = MeshData::cube().bounds();
        assert!(min.abs_diff_eq(Vec3::splat(-0.5), 1e-6));
        assert!(max.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }

    #[test]
    fn gpu_struct_summarizes_geometry() {
        let pool = SlotPool::<Mesh>::allocate(1);
        let mut mesh = Mesh::default();
        mesh.set_data(MeshData::from_data(triangle(), vec![0, 1, 2]).unwrap());
        let gpu = mesh.to_gpu(&pool);
        assert_eq!(gpu.num_vertices, 3);
        assert_eq!(gpu.num_triangles, 1);
        assert_eq!(gpu.bbox_max, Vec4::new(1.0, 1.0, 0.0, 0.0));
    }
}
