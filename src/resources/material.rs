//! Material directories.
//!
//! A material is a directory holding one fixed-name image per [`TextureSlot`]
//! (`diffuse.png`, `normal.png`, `specular.png` with the default extension).
//! Files are found by joining, never by scanning. A slot whose file is missing
//! or broken gets the engine default for that slot; a material as a whole
//! never fails to resolve.

use std::path::{Path, PathBuf};

use crate::{
    context::Context,
    error::LoadWarning,
    gpu::GpuSession,
    resources::{
        cache::TextureId,
        path,
        texture::{ColorSpace, TextureOptions},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    Normal,
    Specular,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 3] = [TextureSlot::Diffuse, TextureSlot::Normal, TextureSlot::Specular];

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::Diffuse => "diffuse",
            TextureSlot::Normal => "normal",
            TextureSlot::Specular => "specular",
        }
    }

    fn index(self) -> usize {
        match self {
            TextureSlot::Diffuse => 0,
            TextureSlot::Normal => 1,
            TextureSlot::Specular => 2,
        }
    }

    /// Colour of the 1x1 texture used when the slot has no usable file.
    pub fn default_color(self) -> [u8; 4] {
        match self {
            TextureSlot::Diffuse => [255, 255, 255, 255],
            // The blue/purple-ish colour that represents the default for normal maps
            TextureSlot::Normal => [127, 127, 255, 255],
            TextureSlot::Specular => [0, 0, 0, 255],
        }
    }

    pub(crate) fn builtin_key(self) -> &'static str {
        match self {
            TextureSlot::Diffuse => "default-diffuse",
            TextureSlot::Normal => "default-normal",
            TextureSlot::Specular => "default-specular",
        }
    }

    /// Normal maps hold vectors, not colours, and are sampled linearly.
    pub fn options(self, base: &TextureOptions) -> TextureOptions {
        match self {
            TextureSlot::Normal => TextureOptions {
                color_space: ColorSpace::Linear,
                ..*base
            },
            _ => *base,
        }
    }

    pub fn file_name(self, extension: &str) -> String {
        format!("{}.{}", self.name(), extension)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureSource {
    Authored,
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotBinding {
    pub texture: TextureId,
    pub source: TextureSource,
    /// The file looked up for this slot, `None` for the default material.
    pub path: Option<PathBuf>,
    /// Why the authored file was not used.
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Material {
    /// Resolved material directory, `None` for the default material.
    pub dir: Option<PathBuf>,
    slots: [SlotBinding; 3],
}

impl Material {
    pub fn slot(&self, slot: TextureSlot) -> &SlotBinding {
        &self.slots[slot.index()]
    }

    pub fn texture(&self, slot: TextureSlot) -> TextureId {
        self.slot(slot).texture
    }

    pub fn uses_default(&self, slot: TextureSlot) -> bool {
        self.slot(slot).source == TextureSource::Default
    }

    pub fn is_default(&self) -> bool {
        self.dir.is_none()
    }

    /// One warning per slot that fell back to its default.
    pub fn warnings(&self) -> Vec<LoadWarning> {
        TextureSlot::ALL
            .iter()
            .filter_map(|&slot| {
                let binding = self.slot(slot);
                let error = binding.error.as_ref()?;
                Some(LoadWarning::new(format!("material slot {}", slot.name()), error))
            })
            .collect()
    }
}

/// Resolve every slot of `material_dir`, loading textures through the cache.
pub fn resolve_material<S: GpuSession>(ctx: &mut Context<S>, material_dir: &Path) -> Material {
    let extension = ctx.config().texture_extension.clone();
    let base_options = ctx.config().texture_options;

    let slots = TextureSlot::ALL.map(|slot| {
        let file = path::resolve(material_dir, slot.file_name(&extension));
        match ctx.texture(&file, &slot.options(&base_options)) {
            Ok(texture) => SlotBinding {
                texture,
                source: TextureSource::Authored,
                path: Some(file),
                error: None,
            },
            Err(e) => {
                log::warn!("material {} slot {}: {e}, using default", material_dir.display(), slot.name());
                SlotBinding {
                    texture: ctx.default_texture(slot),
                    source: TextureSource::Default,
                    path: Some(file),
                    error: Some(e.to_string()),
                }
            }
        }
    });

    Material {
        dir: Some(material_dir.to_path_buf()),
        slots,
    }
}

/// The material of nodes without a usable material directory.
pub fn default_material<S: GpuSession>(ctx: &mut Context<S>) -> Material {
    Material {
        dir: None,
        slots: TextureSlot::ALL.map(|slot| SlotBinding {
            texture: ctx.default_texture(slot),
            source: TextureSource::Default,
            path: None,
            error: None,
        }),
    }
}
