//! Participating media on a dense voxel grid

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::UVec3;
use thiserror::Error;

use crate::registry::{Component, ComponentKind, SlotPool};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("volume dimensions must be non-zero, got {0}")]
    ZeroDimension(UVec3),
    #[error("volume data has {found} voxels, expected {expected}")]
    Length { expected: usize, found: usize },
}

/// Dense grid of densities, x fastest
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    dimensions: UVec3,
    voxels: Vec<f32>,
    background: f32,
}

impl VolumeData {
    pub fn from_data(
        width: u32,
        height: u32,
        depth: u32,
        voxels: Vec<f32>,
        background: f32,
    ) -> Result<Self, VolumeError> {
        let dimensions = UVec3::new(width, height, depth);
        if dimensions.min_element() == 0 {
            return Err(VolumeError::ZeroDimension(dimensions));
        }
        let expected = width as usize * height as usize * depth as usize;
        if voxels.len() != expected {
            return Err(VolumeError::Length {
                expected,
                found: voxels.len(),
            });
        }
        Ok(Self {
            dimensions,
            voxels,
            background,
        })
    }

    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    pub fn voxels(&self) -> &[f32] {
        &self.voxels
    }

    /// Density at a voxel, background outside the grid
    pub fn density(&self, x: u32, y: u32, z: u32) -> f32 {
        let d = self.dimensions;
        if x >= d.x || y >= d.y || z >= d.z {
            return self.background;
        }
        let index = (z as usize * d.y as usize + y as usize) * d.x as usize + x as usize;
        self.voxels.get(index).copied().unwrap_or(self.background)
    }

    pub fn max_density(&self) -> f32 {
        self.voxels
            .iter()
            .copied()
            .fold(self.background, f32::max)
    }
}

/// Volume component
#[derive(Debug, Clone)]
pub struct Volume {
    data: Option<Arc<VolumeData>>,
    gradient_factor: f32,
    scale: f32,
    absorption: f32,
    scattering: f32,
    g: f32,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            data: None,
            gradient_factor: 0.5,
            scale: 1.0,
            absorption: 0.5,
            scattering: 0.5,
            g: 0.0,
        }
    }
}

impl Volume {
    pub fn data(&self) -> Option<&Arc<VolumeData>> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: impl Into<Arc<VolumeData>>) {
        self.data = Some(data.into());
    }

    pub fn gradient_factor(&self) -> f32 {
        self.gradient_factor
    }

    /// Blend between phase-function and surface-like shading at density edges
    pub fn set_gradient_factor(&mut self, factor: f32) {
        self.gradient_factor = factor;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Density multiplier
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn absorption(&self) -> f32 {
        self.absorption
    }

    pub fn set_absorption(&mut self, absorption: f32) {
        self.absorption = absorption;
    }

    pub fn scattering(&self) -> f32 {
        self.scattering
    }

    pub fn set_scattering(&mut self, scattering: f32) {
        self.scattering = scattering;
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    /// Henyey-Greenstein anisotropy, clamped to `(-1, 1)`
    pub fn set_g(&mut self, g: f32) {
        self.g = g.clamp(-0.999, 0.999);
    }
}

impl Component for Volume {
    const KIND: ComponentKind = ComponentKind::Volume;
    type Gpu = VolumeStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> VolumeStruct {
        let (dimensions, max_density) = self
            .data
            .as_ref()
            .map_or((UVec3::ZERO, 0.0), |d| (d.dimensions(), d.max_density()));
        VolumeStruct {
            dimensions: dimensions.to_array(),
            max_density,
            gradient_factor: self.gradient_factor,
            scale: self.scale,
            absorption: self.absorption,
            scattering: self.scattering,
        }
    }
}

/// Volume parameters for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VolumeStruct {
    pub dimensions: [u32; 3],
    pub max_density: f32,
    pub gradient_factor: f32,
    pub scale: f32,
    pub absorption: f32,
    pub scattering: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_data_validates_shape() {
        assert_eq!(
            VolumeData::from_data(2, 0, 2, Vec::new(), 0.0),
            Err(VolumeError::ZeroDimension(UVec3::new(2, 0, 2)))
        );
        assert_eq!(
            VolumeData::from_data(2, 2, 2, vec![0.0; 7], 0.0),
            Err(VolumeError::Length {
                expected: 8,
                found: 7
            })
        );
    }

    #[test]
    fn density_indexes_x_fastest() {
        let voxels = (0..8).map(|v| v as f32).collect();
        let data = VolumeData::from_data(2, 2, 2, voxels, -1.0).unwrap();
        assert_eq!(data.density(1, 0, 0), 1.0);
        assert_eq!(data.density(0, 1, 0), 2.0);
        assert_eq!(data.density(0, 0, 1), 4.0);
        assert_eq!(data.density(2, 0, 0), -1.0);
        assert_eq!(data.max_density(), 7.0);
    }

    #[test]
    fn defaults_match_medium_parameters() {
        let volume = Volume::default();
        assert_eq!(volume.gradient_factor(), 0.5);
        assert_eq!(volume.scale(), 1.0);
        assert_eq!(volume.absorption(), 0.5);
        assert_eq!(volume.scattering(), 0.5);
        assert_eq!(volume.g(), 0.0);
    }
}
