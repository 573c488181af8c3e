use crate::data_structures::vertex::VertexFormat;

/// An uploaded mesh: interleaved vertices laid out by `format` and u32 indices.
#[derive(Debug)]
pub struct Mesh<B> {
    pub name: String,
    pub vertex_buffer: B,
    pub index_buffer: B,
    pub num_elements: u32,
    pub format: VertexFormat,
}

/// CPU-side mesh data, produced off the render thread.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub format: VertexFormat,
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        match self.format.stride() {
            0 => 0,
            stride => self.vertices.len() / stride as usize,
        }
    }
}
