//! Light component

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::registry::{Component, ComponentKind, Handle, SlotPool};
use crate::resources::Texture;

/// Emitter description.
///
/// Position and shape come from the Transform and Mesh bound on the same
/// entity; a light on its own only describes what is emitted.
#[derive(Debug, Clone)]
pub struct Light {
    color: Vec3,
    intensity: f32,
    exposure: f32,
    falloff: f32,
    color_texture: Option<Handle<Texture>>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            exposure: 0.0,
            falloff: 2.0,
            color_texture: None,
        }
    }
}

impl Light {
    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Exposure in stops, applied as `2^exposure`
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    pub fn set_falloff(&mut self, falloff: f32) {
        self.falloff = falloff;
    }

    pub fn color_texture(&self) -> Option<Handle<Texture>> {
        self.color_texture
    }

    /// Modulate the emitted color by a texture
    pub fn set_color_texture(&mut self, texture: Handle<Texture>) {
        self.color_texture = Some(texture);
    }

    pub fn clear_color_texture(&mut self) {
        self.color_texture = None;
    }

    /// Radiance scale after intensity and exposure
    pub fn power(&self) -> f32 {
        self.intensity * self.exposure.exp2()
    }
}

impl Component for Light {
    const KIND: ComponentKind = ComponentKind::Light;
    type Gpu = LightStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> LightStruct {
        LightStruct {
            color_intensity: Vec4::new(self.color.x, self.color.y, self.color.z, self.intensity),
            exposure: self.exposure,
            falloff: self.falloff,
            color_texture_id: Handle::gpu_index(self.color_texture),
            _padding: 0,
        }
    }
}

/// Light data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightStruct {
    pub color_intensity: Vec4, // xyz=color, w=intensity
    pub exposure: f32,
    pub falloff: f32,
    pub color_texture_id: i32, // -1 = none
    pub _padding: u32,
}
