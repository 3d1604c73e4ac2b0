//! Material and texture-group registry.
//!
//! Textures register from raw pixel buffers; decoding image files is a
//! tooling concern outside the core. Groups batch same-role textures
//! into the atlases the state store streams as `TextureGroup` blocks.

mod resource;

pub use resource::{
    Material, ResourceManager, Texture, TextureGroup, TextureModel, TextureRole,
};
