//! Texture loading and the texture component

use std::path::Path;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::registry::{Component, ComponentKind, SlotPool};

/// Texture loading errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has zero size")]
    Empty,
}

/// Decoded RGBA8 texels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?;
        Self::from_image(img)
    }

    /// Load texture from encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(img)
    }

    fn from_image(img: DynamicImage) -> Result<Self, TextureError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        Ok(Self {
            width,
            height,
            data: img.to_rgba8().into_raw(),
        })
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            data: color.to_vec(),
        }
    }

    /// Texel at `(x, y)`, clamped to the image edge
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [0; 4];
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * 4;
        match self.data.get(offset..offset + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => [0; 4],
        }
    }
}

/// Texture component.
///
/// Texel storage is shared so the same decoded image can back several
/// components without copying.
#[derive(Debug, Clone)]
pub struct Texture {
    data: Option<Arc<TextureData>>,
    source: Option<String>,
    linear: bool,
    scale: [f32; 2],
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            data: None,
            source: None,
            linear: false,
            scale: [1.0, 1.0],
        }
    }
}

impl Texture {
    pub fn data(&self) -> Option<&Arc<TextureData>> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: impl Into<Arc<TextureData>>) {
        self.data = Some(data.into());
    }

    /// Path the texels were loaded from, if any
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Texels are linear rather than sRGB encoded
    pub fn is_linear(&self) -> bool {
        self.linear
    }

    pub fn set_linear(&mut self, linear: bool) {
        self.linear = linear;
    }

    pub fn scale(&self) -> [f32; 2] {
        self.scale
    }

    /// UV repeat factor
    pub fn set_scale(&mut self, scale: [f32; 2]) {
        self.scale = scale;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.data.as_ref().map_or((0, 0), |d| (d.width, d.height))
    }
}

impl Component for Texture {
    const KIND: ComponentKind = ComponentKind::Texture;
    type Gpu = TextureStruct;

    fn to_gpu(&self, _pool: &SlotPool<Self>) -> TextureStruct {
        let (width, height) = self.dimensions();
        TextureStruct {
            width,
            height,
            linear: u32::from(self.linear),
            _padding: 0,
            scale: self.scale,
            _padding2: [0.0; 2],
        }
    }
}

/// Texture description for GPU; texels are uploaded separately
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TextureStruct {
    pub width: u32,
    pub height: u32,
    pub linear: u32,
    pub _padding: u32,
    pub scale: [f32; 2],
    pub _padding2: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_is_single_texel() {
        let data = TextureData::solid_color([1, 2, 3, 4]);
        assert_eq!((data.width, data.height), (1, 1));
        assert_eq!(data.texel(0, 0), [1, 2, 3, 4]);
        assert_eq!(data.texel(5, 5), [1, 2, 3, 4]);
    }

    #[test]
    fn from_bytes_decodes_png() {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgba([9, 8, 7, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .unwrap();

        let data = TextureData::from_bytes(&bytes).unwrap();
        assert_eq!((data.width, data.height), (2, 1));
        assert_eq!(data.texel(1, 0), [9, 8, 7, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            TextureData::from_bytes(b"not an image"),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn gpu_struct_reports_dimensions_and_colorspace() {
        let pool = SlotPool::<Texture>::allocate(1);
        let mut texture = Texture::default();
        texture.set_data(TextureData::solid_color([0; 4]));
        texture.set_linear(true);
        let gpu = texture.to_gpu(&pool);
        assert_eq!((gpu.width, gpu.height, gpu.linear), (1, 1, 1));
        assert_eq!(gpu.scale, [1.0, 1.0]);
    }
}
