//! Shareable resources: geometry, surfaces, images and media

mod material;
mod mesh;
mod texture;
mod volume;

pub use material::{Material, MaterialStruct, TextureLink};
pub use mesh::{Mesh, MeshData, MeshError, MeshStruct};
pub use texture::{Texture, TextureData, TextureError, TextureStruct};
pub use volume::{Volume, VolumeData, VolumeError, VolumeStruct};
