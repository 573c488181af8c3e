use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops::FilterType};

use crate::{
    error::{AssetError, DecodeError},
    gpu::GpuSession,
    resources::AssetReader,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Colour maps are sampled as sRGB, data maps (normals) as linear values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// How a texture is decoded and sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureOptions {
    pub generate_mipmaps: bool,
    pub wrap_mode: WrapMode,
    pub filter: FilterMode,
    pub color_space: ColorSpace,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            generate_mipmaps: true,
            wrap_mode: WrapMode::Repeat,
            filter: FilterMode::Linear,
            color_space: ColorSpace::Srgb,
        }
    }
}

/// RGBA8 pixel data ready for upload, base level first.
///
/// Decoding produces this on any thread; only the upload needs the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub levels: Vec<Vec<u8>>,
}

impl DecodedImage {
    /// A 1x1 image of a single colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            levels: vec![rgba.to_vec()],
        }
    }

    pub fn from_image(img: &DynamicImage, generate_mipmaps: bool) -> Self {
        let (width, height) = img.dimensions();
        let base = img.to_rgba8();
        let level_count = if generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let mut levels = Vec::with_capacity(level_count as usize);
        for level in 1..level_count {
            let (w, h) = level_extent(width, height, level as usize);
            levels.push(image::imageops::resize(&base, w, h, FilterType::Triangle).into_raw());
        }
        levels.insert(0, base.into_raw());

        Self {
            width,
            height,
            levels,
        }
    }

    pub fn level_size(&self, level: usize) -> (u32, u32) {
        level_extent(self.width, self.height, level)
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn level_extent(width: u32, height: u32, level: usize) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

/// Decode image file contents. Thread-safe, touches no GPU state.
pub fn decode(path: &Path, bytes: &[u8], options: &TextureOptions) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(bytes).map_err(|e| DecodeError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError {
            path: path.to_path_buf(),
            reason: "image has a zero dimension".to_string(),
        });
    }
    Ok(DecodedImage::from_image(&img, options.generate_mipmaps))
}

pub fn upload<S: GpuSession>(
    session: &S,
    label: &str,
    image: &DecodedImage,
    options: &TextureOptions,
) -> S::Texture {
    session.create_texture(label, image, options)
}

/// Reject images the device cannot hold.
pub fn check_dimensions(path: &Path, image: &DecodedImage, max_dimension: u32) -> Result<(), DecodeError> {
    if image.width > max_dimension || image.height > max_dimension {
        return Err(DecodeError {
            path: path.to_path_buf(),
            reason: format!(
                "image is {}x{}, the device allows at most {max_dimension} pixels per side",
                image.width, image.height
            ),
        });
    }
    Ok(())
}

/// Read, decode and upload a texture.
///
/// The GPU texture is only created once decoding fully succeeded and the
/// image fits the session's texture limit. Not cached;
/// go through [`crate::context::Context::texture`] to avoid duplicate uploads.
pub fn load_texture<S: GpuSession>(
    session: &S,
    reader: &mut AssetReader,
    path: &Path,
    options: &TextureOptions,
) -> Result<S::Texture, AssetError> {
    let bytes = reader.read(path)?;
    let image = decode(path, &bytes, options)?;
    check_dimensions(path, &image, session.max_texture_dimension())?;
    log::debug!(
        "decoded {} ({}x{}, {} levels)",
        path.display(),
        image.width,
        image.height,
        image.levels.len()
    );
    Ok(upload(session, &path.display().to_string(), &image, options))
}
