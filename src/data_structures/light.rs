//! Lights and the fixed-capacity light uniform array.
//!
//! Shaders see lights as `array<Light, MAX_LIGHTS>` followed by the number of
//! valid entries. Submitting more than [`MAX_LIGHTS`] lights keeps the first
//! `MAX_LIGHTS` in order and reports the rest as a [`LightOverflow`].

use std::{fmt, str::FromStr};

use crate::{
    error::LightOverflow,
    gpu::{BufferUsage, GpuSession},
};

pub const MAX_LIGHTS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightKind {
    #[default]
    Point,
    Directional,
    Spot,
}

impl LightKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LightKind::Point => "point",
            LightKind::Directional => "directional",
            LightKind::Spot => "spot",
        }
    }

    /// Value of `Light.kind` in shaders.
    pub fn gpu_code(self) -> u32 {
        match self {
            LightKind::Point => 0,
            LightKind::Directional => 1,
            LightKind::Spot => 2,
        }
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(LightKind::Point),
            "directional" => Ok(LightKind::Directional),
            "spot" => Ok(LightKind::Spot),
            other => Err(format!(
                "unknown light kind `{other}`, expected point, directional or spot"
            )),
        }
    }
}

/// The light parameters carried by a light node; its position is the node's.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub color: cgmath::Vector3<f32>,
    pub intensity: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: cgmath::Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

/// A light in world space, as handed to the uploader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightDescriptor {
    pub position: cgmath::Vector3<f32>,
    pub color: cgmath::Vector3<f32>,
    pub intensity: f32,
    pub kind: LightKind,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    // packs into the vec3's trailing 4 bytes
    kind: u32,
    color: [f32; 3],
    intensity: f32,
}

impl From<&LightDescriptor> for LightUniform {
    fn from(light: &LightDescriptor) -> Self {
        Self {
            position: light.position.into(),
            kind: light.kind.gpu_code(),
            color: light.color.into(),
            intensity: light.intensity,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightArrayUniform {
    lights: [LightUniform; MAX_LIGHTS],
    count: u32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: [u32; 3],
}

impl Default for LightArrayUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl LightArrayUniform {
    pub fn count(&self) -> usize {
        self.count as usize
    }

    pub fn lights(&self) -> &[LightUniform] {
        &self.lights[..self.count()]
    }
}

impl LightUniform {
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn kind(&self) -> u32 {
        self.kind
    }
}

/// Pack `lights` in input order, dropping everything past [`MAX_LIGHTS`].
pub fn pack(lights: &[LightDescriptor]) -> (LightArrayUniform, Option<LightOverflow>) {
    let mut uniform = LightArrayUniform::default();
    let retained = lights.len().min(MAX_LIGHTS);
    for (slot, light) in uniform.lights.iter_mut().zip(&lights[..retained]) {
        *slot = light.into();
    }
    uniform.count = retained as u32;

    let overflow = (lights.len() > MAX_LIGHTS).then(|| LightOverflow {
        dropped_count: lights.len() - MAX_LIGHTS,
    });
    (uniform, overflow)
}

/// Owns the light uniform buffer and rewrites it on every upload.
pub struct LightArrayUploader<B> {
    buffer: B,
    uniform: LightArrayUniform,
}

impl<B> LightArrayUploader<B> {
    pub fn new<S: GpuSession<Buffer = B>>(session: &S) -> Self {
        let uniform = LightArrayUniform::default();
        let buffer = session.create_buffer(
            "Light Array Buffer",
            bytemuck::bytes_of(&uniform),
            BufferUsage::Uniform,
        );
        Self { buffer, uniform }
    }

    /// Upload `lights`; an overflow is logged and returned, never fatal.
    pub fn upload<S: GpuSession<Buffer = B>>(
        &mut self,
        session: &S,
        lights: &[LightDescriptor],
    ) -> Option<LightOverflow> {
        let (uniform, overflow) = pack(lights);
        if let Some(overflow) = &overflow {
            log::warn!("{overflow}");
        }
        session.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniform));
        self.uniform = uniform;
        overflow
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn uniform(&self) -> &LightArrayUniform {
        &self.uniform
    }
}
