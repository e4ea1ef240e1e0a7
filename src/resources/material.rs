//! Material definitions for physically based path tracing

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use super::Texture;
use crate::registry::{Component, ComponentKind, Handle, SlotPool};

/// A texture bound to a material input, reading one channel for scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLink {
    pub texture: Handle<Texture>,
    pub channel: u8,
}

impl TextureLink {
    pub fn new(texture: Handle<Texture>, channel: u8) -> Self {
        Self {
            texture,
            channel: channel.min(3),
        }
    }
}

/// Surface properties
#[derive(Debug, Clone)]
pub struct Material {
    base_color: Vec3,
    alpha: f32,
    roughness: f32,
    metallic: f32,
    specular: f32,
    ior: f32,
    transmission: f32,

    base_color_texture: Option<Handle<Texture>>,
    alpha_texture: Option<TextureLink>,
    specular_texture: Option<TextureLink>,
    roughness_texture: Option<TextureLink>,
    metallic_texture: Option<TextureLink>,
    normal_map: Option<Handle<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::new(0.8, 0.8, 0.8),
            alpha: 1.0,
            roughness: 0.5,
            metallic: 0.0,
            specular: 0.5,
            ior: 1.45,
            transmission: 0.0,
            base_color_texture: None,
            alpha_texture: None,
            specular_texture: None,
            roughness_texture: None,
            metallic_texture: None,
            normal_map: None,
        }
    }
}

impl Material {
    pub fn base_color(&self) -> Vec3 {
        self.base_color
    }

    pub fn set_base_color(&mut self, color: Vec3) {
        self.base_color = color;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Coverage in `[0, 1]`; below one the surface is partially cut out
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = roughness.clamp(0.0, 1.0);
    }

    pub fn metallic(&self) -> f32 {
        self.metallic
    }

    pub fn set_metallic(&mut self, metallic: f32) {
        self.metallic = metallic.clamp(0.0, 1.0);
    }

    pub fn specular(&self) -> f32 {
        self.specular
    }

    pub fn set_specular(&mut self, specular: f32) {
        self.specular = specular.max(0.0);
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }

    pub fn set_ior(&mut self, ior: f32) {
        self.ior = ior;
    }

    pub fn transmission(&self) -> f32 {
        self.transmission
    }

    pub fn set_transmission(&mut self, transmission: f32) {
        self.transmission = transmission.clamp(0.0, 1.0);
    }

    pub fn base_color_texture(&self) -> Option<Handle<Texture>> {
        self.base_color_texture
    }

    pub fn set_base_color_texture(&mut self, texture: Handle<Texture>) {
        self.base_color_texture = Some(texture);
    }

    pub fn alpha_texture(&self) -> Option<TextureLink> {
        self.alpha_texture
    }

    pub fn set_alpha_texture(&mut self, texture: Handle<Texture>, channel: u8) {
        self.alpha_texture = Some(TextureLink::new(texture, channel));
    }

    pub fn specular_texture(&self) -> Option<TextureLink> {
        self.specular_texture
    }

    pub fn set_specular_texture(&mut self, texture: Handle<Texture>, channel: u8) {
        self.specular_texture = Some(TextureLink::new(texture, channel));
    }

    pub fn roughness_texture(&self) -> Option<TextureLink> {
        self.roughness_texture
    }

    pub fn set_roughness_texture(&mut self, texture: Handle<Texture>, channel: u8) {
        self.roughness_texture = Some(TextureLink::new(texture, channel));
    }

    pub fn metallic_texture(&self) -> Option<TextureLink> {
        self.metallic_texture
    }

    pub fn set_metallic_texture(&mut self, texture: Handle<Texture>, channel: u8) {
        self.metallic_texture = Some(TextureLink::new(texture, channel));
    }

    pub fn normal_map(&self) -> Option<Handle<Texture>> {
        self.normal_map
    }

    /// Tangent-space normal map; the texture should be linear
    pub fn set_normal_map(&mut self, texture: Handle<Texture>) {
        self.normal_map = Some(texture);
    }

    /// Drop every texture binding
    pub fn clear_textures(&mut self) {
        self.base_color_texture = None;
        self.alpha_texture = None;
        self.specular_texture = None;
        self.roughness_texture = None;
        self.metallic_texture = None;
        self.normal_map = None;
    }
}

fn link_index(link: Option<TextureLink>) -> (i32, u32) {
    link.map_or((-1, 0), |l| (l.texture.id() as i32, u32::from(l.channel)))
}

impl Component for Material {
    const KIND: ComponentKind = ComponentKind::Material;
    type Gpu = MaterialStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> MaterialStruct {
        let (alpha_id, alpha_channel) = link_index(self.alpha_texture);
        let (specular_id, specular_channel) = link_index(self.specular_texture);
        let (roughness_id, roughness_channel) = link_index(self.roughness_texture);
        let (metallic_id, metallic_channel) = link_index(self.metallic_texture);

        MaterialStruct {
            base_color: self.base_color.extend(self.alpha),
            surface: Vec4::new(self.roughness, self.metallic, self.specular, self.ior),
            transmission: self.transmission,
            _padding: [0.0; 3],
            texture_ids: [
                Handle::gpu_index(self.base_color_texture),
                alpha_id,
                specular_id,
                roughness_id,
                metallic_id,
                Handle::gpu_index(self.normal_map),
                -1,
                -1,
            ],
            texture_channels: [
                0,
                alpha_channel,
                specular_channel,
                roughness_channel,
                metallic_channel,
                0,
                0,
                0,
            ],
        }
    }
}

/// Material data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialStruct {
    pub base_color: Vec4, // xyz=color, w=alpha
    pub surface: Vec4,    // x=roughness, y=metallic, z=specular, w=ior
    pub transmission: f32,
    pub _padding: [f32; 3],
    /// base color, alpha, specular, roughness, metallic, normal; -1 = none
    pub texture_ids: [i32; 8],
    pub texture_channels: [u32; 8],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_setters_clamp_to_valid_range() {
        let mut material = Material::default();
        material.set_roughness(2.0);
        material.set_metallic(-1.0);
        material.set_alpha(1.5);
        assert_eq!(material.roughness(), 1.0);
        assert_eq!(material.metallic(), 0.0);
        assert_eq!(material.alpha(), 1.0);
    }

    #[test]
    fn texture_channel_is_clamped_to_rgba() {
        let link = TextureLink::new(Handle::new(0, 1), 9);
        assert_eq!(link.channel, 3);
    }

    #[test]
    fn gpu_struct_lists_bound_textures() {
        let pool = SlotPool::<Material>::allocate(1);
        let mut material = Material::default();
        material.set_base_color_texture(Handle::new(2, 1));
        material.set_alpha_texture(Handle::new(2, 1), 3);
        material.set_normal_map(Handle::new(5, 1));

        let gpu = material.to_gpu(&pool);
        assert_eq!(&gpu.texture_ids[..6], &[2, 2, -1, -1, -1, 5]);
        assert_eq!(gpu.texture_channels[1], 3);
    }

    #[test]
    fn clear_textures_unbinds_all() {
        let mut material = Material::default();
        material.set_roughness_texture(Handle::new(1, 1), 0);
        material.set_normal_map(Handle::new(1, 1));
        material.clear_textures();
        assert!(material.roughness_texture().is_none());
        assert!(material.normal_map().is_none());
    }
}
