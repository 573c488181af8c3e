//! Vertex formats and their binding to shader attribute slots.
//!
//! A [`VertexFormat`] is an ordered list of interleaved attributes. Its stride
//! and per-attribute byte offsets are derived from the attribute list and
//! recomputed on every change; call sites never spell out offsets.

use std::{collections::HashMap, mem};

use crate::error::LayoutError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Uint32,
    Sint32,
}

impl ComponentType {
    pub fn size(self) -> wgpu::BufferAddress {
        match self {
            ComponentType::Float32 => mem::size_of::<f32>() as wgpu::BufferAddress,
            ComponentType::Uint32 => mem::size_of::<u32>() as wgpu::BufferAddress,
            ComponentType::Sint32 => mem::size_of::<i32>() as wgpu::BufferAddress,
        }
    }
}

/// One interleaved attribute, matched to shader inputs by `semantic` name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: String,
    pub components: u32,
    pub component_type: ComponentType,
}

impl VertexAttribute {
    pub fn new(semantic: impl Into<String>, components: u32, component_type: ComponentType) -> Self {
        Self {
            semantic: semantic.into(),
            components,
            component_type,
        }
    }

    pub fn size(&self) -> wgpu::BufferAddress {
        self.component_type.size() * self.components as wgpu::BufferAddress
    }

    fn wgpu_format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        let format = match (self.component_type, self.components) {
            (ComponentType::Float32, 1) => F::Float32,
            (ComponentType::Float32, 2) => F::Float32x2,
            (ComponentType::Float32, 3) => F::Float32x3,
            (ComponentType::Float32, 4) => F::Float32x4,
            (ComponentType::Uint32, 1) => F::Uint32,
            (ComponentType::Uint32, 2) => F::Uint32x2,
            (ComponentType::Uint32, 3) => F::Uint32x3,
            (ComponentType::Uint32, 4) => F::Uint32x4,
            (ComponentType::Sint32, 1) => F::Sint32,
            (ComponentType::Sint32, 2) => F::Sint32x2,
            (ComponentType::Sint32, 3) => F::Sint32x3,
            (ComponentType::Sint32, 4) => F::Sint32x4,
            _ => return None,
        };
        Some(format)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexFormat {
    attributes: Vec<VertexAttribute>,
    offsets: Vec<wgpu::BufferAddress>,
    stride: wgpu::BufferAddress,
}

impl VertexFormat {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        let mut format = Self {
            attributes,
            ..Default::default()
        };
        format.recompute();
        format
    }

    /// position (3 x f32), normal (3 x f32), tex_coords (2 x f32)
    pub fn standard() -> Self {
        Self::new(vec![
            VertexAttribute::new("position", 3, ComponentType::Float32),
            VertexAttribute::new("normal", 3, ComponentType::Float32),
            VertexAttribute::new("tex_coords", 2, ComponentType::Float32),
        ])
    }

    pub fn push(&mut self, attribute: VertexAttribute) {
        self.attributes.push(attribute);
        self.recompute();
    }

    pub fn remove(&mut self, semantic: &str) -> Option<VertexAttribute> {
        let idx = self.attributes.iter().position(|a| a.semantic == semantic)?;
        let removed = self.attributes.remove(idx);
        self.recompute();
        Some(removed)
    }

    fn recompute(&mut self) {
        self.offsets.clear();
        let mut offset = 0;
        for attribute in &self.attributes {
            self.offsets.push(offset);
            offset += attribute.size();
        }
        self.stride = offset;
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.stride
    }

    pub fn offset_of(&self, semantic: &str) -> Option<wgpu::BufferAddress> {
        self.attributes
            .iter()
            .position(|a| a.semantic == semantic)
            .map(|idx| self.offsets[idx])
    }

    /// Attributes paired with their byte offsets, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&VertexAttribute, wgpu::BufferAddress)> {
        self.attributes.iter().zip(self.offsets.iter().copied())
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.attributes.is_empty() || self.stride == 0 {
            return Err(LayoutError::EmptyFormat);
        }
        for attribute in &self.attributes {
            if !(1..=4).contains(&attribute.components) {
                return Err(LayoutError::ComponentCount {
                    semantic: attribute.semantic.clone(),
                    components: attribute.components,
                });
            }
        }
        Ok(())
    }
}

/// A vertex format bound to the attribute slots of one shader program.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundLayout {
    pub array_stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
    /// Semantics the shader does not consume.
    pub skipped: Vec<String>,
}

impl BoundLayout {
    pub fn desc(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Bind `format` to the shader's attribute slots.
///
/// Attributes the shader has no location for are skipped, a shader is free to
/// ignore mesh data.
pub fn bind(
    shader_attribute_locations: &HashMap<String, u32>,
    format: &VertexFormat,
) -> Result<BoundLayout, LayoutError> {
    format.validate()?;

    let mut attributes = Vec::new();
    let mut skipped = Vec::new();
    for (attribute, offset) in format.iter() {
        let Some(&shader_location) = shader_attribute_locations.get(&attribute.semantic) else {
            skipped.push(attribute.semantic.clone());
            continue;
        };
        let Some(wgpu_format) = attribute.wgpu_format() else {
            return Err(LayoutError::ComponentCount {
                semantic: attribute.semantic.clone(),
                components: attribute.components,
            });
        };
        attributes.push(wgpu::VertexAttribute {
            format: wgpu_format,
            offset,
            shader_location,
        });
    }
    if !skipped.is_empty() {
        log::debug!("vertex attributes not consumed by shader: {:?}", skipped);
    }

    Ok(BoundLayout {
        array_stride: format.stride(),
        attributes,
        skipped,
    })
}
