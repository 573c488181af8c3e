#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
};

use flow_assets::{
    config::AssetConfig,
    context::Context,
    gpu::{BufferUsage, GpuSession},
    resources::{
        shader::ShaderStage,
        texture::{DecodedImage, TextureOptions},
    },
};
use tempfile::TempDir;

/// A shader module as seen by the recording session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedModule {
    pub label: String,
    pub stage: ShaderStage,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub levels: usize,
    pub options: TextureOptions,
    pub first_pixel: [u8; 4],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordedBuffer {
    pub id: u32,
    pub label: String,
    pub usage: BufferUsage,
    pub len: usize,
}

/// A [`GpuSession`] that creates nothing and counts every call.
#[derive(Default)]
pub(crate) struct RecordingSession {
    shader_modules: Cell<u32>,
    textures: Cell<u32>,
    buffers: Cell<u32>,
    writes: RefCell<Vec<(u32, u64, Vec<u8>)>>,
    max_texture_dimension: Option<u32>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_texture_dimension(max: u32) -> Self {
        Self {
            max_texture_dimension: Some(max),
            ..Self::default()
        }
    }

    pub fn shader_modules_created(&self) -> u32 {
        self.shader_modules.get()
    }

    pub fn textures_created(&self) -> u32 {
        self.textures.get()
    }

    pub fn buffers_created(&self) -> u32 {
        self.buffers.get()
    }

    pub fn total_calls(&self) -> u32 {
        self.shader_modules.get() + self.textures.get() + self.buffers.get() + self.writes.borrow().len() as u32
    }

    /// Buffer writes in call order: (buffer id, offset, bytes).
    pub fn writes(&self) -> Vec<(u32, u64, Vec<u8>)> {
        self.writes.borrow().clone()
    }
}

impl GpuSession for RecordingSession {
    type ShaderModule = RecordedModule;
    type Texture = RecordedTexture;
    type Buffer = RecordedBuffer;

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension.unwrap_or(8192)
    }

    fn create_shader_module(&self, label: &str, stage: ShaderStage, _source: &str) -> RecordedModule {
        self.shader_modules.set(self.shader_modules.get() + 1);
        RecordedModule {
            label: label.to_string(),
            stage,
        }
    }

    fn create_texture(&self, label: &str, image: &DecodedImage, options: &TextureOptions) -> RecordedTexture {
        self.textures.set(self.textures.get() + 1);
        let mut first_pixel = [0; 4];
        first_pixel.copy_from_slice(&image.levels[0][..4]);
        RecordedTexture {
            label: label.to_string(),
            width: image.width,
            height: image.height,
            levels: image.levels.len(),
            options: *options,
            first_pixel,
        }
    }

    fn create_buffer(&self, label: &str, contents: &[u8], usage: BufferUsage) -> RecordedBuffer {
        let id = self.buffers.get();
        self.buffers.set(id + 1);
        RecordedBuffer {
            id,
            label: label.to_string(),
            usage,
            len: contents.len(),
        }
    }

    fn write_buffer(&self, buffer: &RecordedBuffer, offset: u64, data: &[u8]) {
        self.writes.borrow_mut().push((buffer.id, offset, data.to_vec()));
    }
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A temporary asset root, removed when dropped.
pub(crate) struct AssetDir {
    dir: TempDir,
}

impl AssetDir {
    pub fn new() -> Self {
        init_logger();
        Self {
            dir: tempfile::tempdir().expect("failed to create asset dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    pub fn write_image(&self, relative: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(&path)
            .expect("failed to write png fixture");
        path
    }

    /// A material directory with a diffuse and specular map but no normal map.
    pub fn write_material_without_normal(&self, relative_dir: &str) -> PathBuf {
        self.write_image(&format!("{relative_dir}/diffuse.png"), 4, 4, [200, 10, 10, 255]);
        self.write_image(&format!("{relative_dir}/specular.png"), 4, 4, [30, 30, 30, 255]);
        self.path(relative_dir)
    }

    pub fn write_default_shaders(&self) -> (PathBuf, PathBuf) {
        (
            self.write("shaders/lit.vert.wgsl", VERTEX_SHADER),
            self.write("shaders/lit.frag.wgsl", FRAGMENT_SHADER),
        )
    }

    pub fn context(&self) -> Context<RecordingSession> {
        Context::new(RecordingSession::new(), AssetConfig::new(self.root()))
    }
}

pub(crate) const VERTEX_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
}
@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

@vertex
fn vs_main(model: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(model.position, 1.0);
    out.tex_coords = model.tex_coords;
    return out;
}
"#;

pub(crate) const FRAGMENT_SHADER: &str = r#"
@group(1) @binding(0)
var t_diffuse: texture_2d<f32>;
@group(1) @binding(1)
var s_diffuse: sampler;

@fragment
fn fs_main(@location(0) tex_coords: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t_diffuse, s_diffuse, tex_coords);
}
"#;

/// A unit quad made of two triangles with normals and texture coordinates.
pub(crate) const QUAD_OBJ: &str = "\
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";
