use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{SimError, SimResult};

/// Pixel layout of a texture group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureModel {
    /// One byte per pixel, palette-indexed
    Alpha,
    Rgb,
    Rgba,
}

impl TextureModel {
    pub fn pixel_size(self) -> usize {
        match self {
            TextureModel::Alpha => 1,
            TextureModel::Rgb => 3,
            TextureModel::Rgba => 4,
        }
    }

    pub fn wire_tag(self) -> u8 {
        match self {
            TextureModel::Alpha => 0,
            TextureModel::Rgb => 1,
            TextureModel::Rgba => 2,
        }
    }
}

/// Shading role of a texture group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRole {
    Diffuse,
    Specular,
    Palette,
}

impl TextureRole {
    pub fn wire_tag(self) -> u8 {
        match self {
            TextureRole::Diffuse => 0,
            TextureRole::Specular => 1,
            TextureRole::Palette => 2,
        }
    }
}

/// One registered texture: raw pixels plus its slot within a group
#[derive(Debug)]
pub struct Texture {
    /// Owning group id
    pub group_id: u8,
    /// Layer index within the group
    pub index: u8,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Same-role textures batched into one streamed atlas. Group width and
/// height grow to the largest member; smaller members are padded on the
/// wire.
#[derive(Debug, Clone)]
pub struct TextureGroup {
    pub id: u8,
    pub width: usize,
    pub height: usize,
    pub model: TextureModel,
    pub role: TextureRole,
    pub textures: Vec<Arc<Texture>>,
}

/// Surface appearance of a scene-object template
#[derive(Debug, Clone)]
pub struct Material {
    pub diffuse: Arc<Texture>,
    pub specular: Option<Arc<Texture>>,
    pub shininess: f32,
    pub opaque: bool,
}

const PALETTE_GROUP: u8 = 1;
const DIFFUSE_GROUP: u8 = 2;
const SPECULAR_GROUP: u8 = 3;
const PALETTE_COLORS: usize = 256;

struct Registry {
    groups: Vec<TextureGroup>,
}

/// Owner of every texture group in the simulation.
///
/// Groups must be fully registered before the first session snapshot;
/// their streamed blocks are size-stable once written.
pub struct ResourceManager {
    registry: Mutex<Registry>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        let palette = TextureGroup {
            id: PALETTE_GROUP,
            width: PALETTE_COLORS,
            height: 1,
            model: TextureModel::Rgba,
            role: TextureRole::Palette,
            textures: vec![Arc::new(Texture {
                group_id: PALETTE_GROUP,
                index: 0,
                width: PALETTE_COLORS,
                height: 1,
                pixels: vec![0; PALETTE_COLORS * 4],
            })],
        };
        let diffuse = TextureGroup {
            id: DIFFUSE_GROUP,
            width: 1,
            height: 1,
            model: TextureModel::Alpha,
            role: TextureRole::Diffuse,
            textures: Vec::new(),
        };
        let specular = TextureGroup {
            id: SPECULAR_GROUP,
            width: 1,
            height: 1,
            model: TextureModel::Alpha,
            role: TextureRole::Specular,
            textures: Vec::new(),
        };

        Self {
            registry: Mutex::new(Registry {
                groups: vec![palette, diffuse, specular],
            }),
        }
    }

    /// Load hex colors (`"RRGGBB"`) into the palette group
    pub fn use_rgb_palette(&self, colors: &[&str]) -> SimResult<()> {
        if colors.len() > PALETTE_COLORS {
            return Err(SimError::Resource(format!(
                "palette too large: {} colors ({} max)",
                colors.len(),
                PALETTE_COLORS
            )));
        }

        let mut pixels = vec![0u8; PALETTE_COLORS * 4];
        for (i, rgb) in colors.iter().enumerate() {
            if rgb.len() != 6 {
                return Err(SimError::Resource(format!("bad palette color: {rgb:?}")));
            }
            let parse = |s: &str| {
                u8::from_str_radix(s, 16)
                    .map_err(|e| SimError::Resource(format!("bad palette color {rgb:?}: {e}")))
            };
            pixels[i * 4] = parse(&rgb[..2])?;
            pixels[i * 4 + 1] = parse(&rgb[2..4])?;
            pixels[i * 4 + 2] = parse(&rgb[4..])?;
            pixels[i * 4 + 3] = 255;
        }

        let mut registry = self.registry.lock();
        let group = &mut registry.groups[0];
        group.textures[0] = Arc::new(Texture {
            group_id: PALETTE_GROUP,
            index: 0,
            width: PALETTE_COLORS,
            height: 1,
            pixels,
        });
        Ok(())
    }

    /// Register a palette-indexed texture under the given role
    pub fn new_texture_palette(
        &self,
        role: TextureRole,
        pixels: &[u8],
        width: usize,
    ) -> Arc<Texture> {
        let mut registry = self.registry.lock();
        let group = match role {
            TextureRole::Specular => &mut registry.groups[2],
            _ => &mut registry.groups[1],
        };

        let texture = Arc::new(Texture {
            group_id: group.id,
            index: group.textures.len() as u8,
            width,
            height: if width == 0 { 0 } else { pixels.len() / width },
            pixels: pixels.to_vec(),
        });

        group.width = group.width.max(texture.width);
        group.height = group.height.max(texture.height);
        group.textures.push(Arc::clone(&texture));
        texture
    }

    /// Diffuse + specular palette textures wrapped as a material
    pub fn new_material_palette(
        &self,
        width: usize,
        diffuse: &[u8],
        specular: &[u8],
        shininess: f32,
    ) -> Material {
        Material {
            diffuse: self.new_texture_palette(TextureRole::Diffuse, diffuse, width),
            specular: Some(self.new_texture_palette(TextureRole::Specular, specular, width)),
            shininess,
            opaque: true,
        }
    }

    /// Snapshot of every group for the state store writer
    pub fn groups(&self) -> Vec<TextureGroup> {
        self.registry.lock().groups.clone()
    }

    /// Group dimensions used for UV scaling of member textures
    pub fn group_extent(&self, group_id: u8) -> Option<(usize, usize)> {
        self.registry
            .lock()
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| (g.width, g.height))
    }
}
