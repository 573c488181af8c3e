//! The explicit graphics session every GPU object is created through.
//!
//! Nothing in the pipeline reaches for an implicit "current" device: shader
//! compilation, texture upload and mesh upload all receive a [`GpuSession`].
//! [`WgpuSession`] is the production implementation; tests substitute a
//! recording session that never touches a GPU.

use naga::valid::Capabilities;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    resources::{
        shader::ShaderStage,
        texture::{DecodedImage, TextureOptions},
    },
};

/// What a buffer created through [`GpuSession::create_buffer`] is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// Uniform buffers are also writable after creation.
    Uniform,
}

/// Creation of GPU objects. Implementations are owned by the render thread.
///
/// All inputs are fully validated CPU-side data (validated shader source,
/// decoded image levels, packed vertex bytes), so creation itself cannot fail
/// halfway.
pub trait GpuSession {
    type ShaderModule;
    type Texture;
    type Buffer;

    /// Shader features the device accepts. Stages needing more are rejected
    /// at compile time instead of at module creation.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Largest width or height a 2D texture may have.
    fn max_texture_dimension(&self) -> u32 {
        wgpu::Limits::downlevel_defaults().max_texture_dimension_2d
    }

    fn create_shader_module(
        &self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Self::ShaderModule;

    fn create_texture(
        &self,
        label: &str,
        image: &DecodedImage,
        options: &TextureOptions,
    ) -> Self::Texture;

    fn create_buffer(&self, label: &str, contents: &[u8], usage: BufferUsage) -> Self::Buffer;

    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);
}

/// A wgpu device and its queue.
#[derive(Debug)]
pub struct WgpuSession {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl WgpuSession {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Request a device without a surface, for tools and tests that only need
    /// to create resources.
    ///
    /// The device is created with [`wgpu::Limits::downlevel_defaults`], so
    /// textures are capped at 2048 pixels per side.
    ///
    /// # Errors
    ///
    /// * no adapter matching the primary backends is available
    /// * the adapter refuses the requested limits
    pub async fn headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-assets headless device"),
                required_limits: wgpu::Limits::downlevel_defaults(),
                ..Default::default()
            })
            .await?;
        log::info!("headless device on {:?}", adapter.get_info().name);
        Ok(Self { device, queue })
    }
}

/// Device features that unlock naga capabilities.
const FEATURE_CAPABILITIES: &[(wgpu::Features, Capabilities)] = &[
    (wgpu::Features::SHADER_F64, Capabilities::FLOAT64),
    (wgpu::Features::SHADER_F16, Capabilities::SHADER_FLOAT16),
    (wgpu::Features::SHADER_INT64, Capabilities::SHADER_INT64),
    (wgpu::Features::PRIMITIVE_INDEX, Capabilities::PRIMITIVE_INDEX),
    (wgpu::Features::SHADER_EARLY_DEPTH_TEST, Capabilities::EARLY_DEPTH_TEST),
];

impl GpuSession for WgpuSession {
    type ShaderModule = wgpu::ShaderModule;
    type Texture = Texture;
    type Buffer = wgpu::Buffer;

    fn capabilities(&self) -> Capabilities {
        let features = self.device.features();
        FEATURE_CAPABILITIES
            .iter()
            .filter(|(feature, _)| features.contains(*feature))
            .fold(Capabilities::default(), |caps, (_, capability)| caps | *capability)
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_shader_module(
        &self,
        label: &str,
        _stage: ShaderStage,
        source: &str,
    ) -> Self::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }

    fn create_texture(
        &self,
        label: &str,
        image: &DecodedImage,
        options: &TextureOptions,
    ) -> Self::Texture {
        Texture::from_decoded(&self.device, &self.queue, image, Some(label), options)
    }

    fn create_buffer(&self, label: &str, contents: &[u8], usage: BufferUsage) -> Self::Buffer {
        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
    }

    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }
}
