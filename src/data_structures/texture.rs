//! GPU textures.
//!
//! [`Texture`] wraps the wgpu texture, its default view and the sampler built
//! from the [`TextureOptions`] it was loaded with.

use crate::resources::texture::{ColorSpace, DecodedImage, FilterMode, TextureOptions, WrapMode};

/// A GPU texture with a view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub mip_level_count: u32,
}

impl Texture {
    /// Upload every level of an already decoded image.
    ///
    /// `image.levels[0]` is the full-size RGBA8 image, each following level
    /// halves both dimensions (never below 1). The caller keeps the image
    /// within `device.limits().max_texture_dimension_2d`.
    ///
    /// # Arguments
    ///
    /// * `image` holds the decoded levels, uploaded one `write_texture` each
    /// * `label` is used as a debug label for the GPU resource
    /// * `options` picks the colour space (sRGB or linear format) and the sampler
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        label: Option<&str>,
        options: &TextureOptions,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let format = match options.color_space {
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        };
        let mip_level_count = image.levels.len() as u32;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, rgba) in image.levels.iter().enumerate() {
            let (width, height) = image.level_size(level);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, options);

        Self {
            texture,
            view,
            sampler,
            mip_level_count,
        }
    }
}

pub fn create_sampler(device: &wgpu::Device, options: &TextureOptions) -> wgpu::Sampler {
    let address_mode = match options.wrap_mode {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
    };
    let filter = match options.filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: filter,
        min_filter: filter,
        lod_min_clamp: 0.0,
        lod_max_clamp: 100.0,
        ..Default::default()
    })
}
