use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::{
        mesh::{Mesh, MeshData},
        vertex::{ComponentType, VertexFormat},
    },
    error::{AssetError, DecodeError},
    gpu::{BufferUsage, GpuSession},
    resources::AssetReader,
};

/**
 * Parse an OBJ file into interleaved vertex bytes laid out by `format`.
 *
 * Known semantics are `position`, `normal` and `tex_coords`; any other attribute
 * is zero-filled. All models in the file are merged into one mesh. Materials
 * referenced by the OBJ are ignored, they come from material directories.
 */
pub fn parse_obj(path: &Path, bytes: &[u8], format: &VertexFormat) -> Result<MeshData, DecodeError> {
    let decode_error = |reason: String| DecodeError {
        path: path.to_path_buf(),
        reason,
    };
    format.validate().map_err(|e| decode_error(e.to_string()))?;

    let mut obj_reader = BufReader::new(Cursor::new(bytes));
    let (models, _) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok(Default::default()),
    )
    .map_err(|e| decode_error(e.to_string()))?;

    let mut words: Vec<u32> = Vec::new();
    let mut indices = Vec::new();
    let mut vertex_count = 0u32;
    for model in &models {
        let mesh = &model.mesh;
        let count = mesh.positions.len() / 3;
        for i in 0..count {
            for (attribute, _) in format.iter() {
                let source: Option<(&[f32], usize)> = match attribute.semantic.as_str() {
                    "position" => Some((mesh.positions.as_slice(), 3)),
                    "normal" => Some((mesh.normals.as_slice(), 3)),
                    "tex_coords" => Some((mesh.texcoords.as_slice(), 2)),
                    _ => None,
                };
                for c in 0..attribute.components as usize {
                    let value = source
                        .filter(|(_, width)| c < *width)
                        .and_then(|(data, width)| data.get(i * width + c).copied())
                        .unwrap_or(0.0);
                    // wgpu's texture space has v pointing down
                    let value = if attribute.semantic == "tex_coords" && c == 1 {
                        1.0 - value
                    } else {
                        value
                    };
                    words.push(match attribute.component_type {
                        ComponentType::Float32 => value.to_bits(),
                        ComponentType::Uint32 => value as u32,
                        ComponentType::Sint32 => (value as i32) as u32,
                    });
                }
            }
        }
        indices.extend(mesh.indices.iter().map(|idx| idx + vertex_count));
        vertex_count += count as u32;
    }

    if vertex_count == 0 || indices.is_empty() {
        return Err(decode_error("file contains no faces".to_string()));
    }

    Ok(MeshData {
        name: path.display().to_string(),
        format: format.clone(),
        vertices: bytemuck::cast_slice(&words).to_vec(),
        indices,
    })
}

pub fn upload_mesh<S: GpuSession>(session: &S, data: MeshData) -> Mesh<S::Buffer> {
    let vertex_buffer = session.create_buffer(
        &format!("{:?} Vertex Buffer", data.name),
        &data.vertices,
        BufferUsage::Vertex,
    );
    let index_buffer = session.create_buffer(
        &format!("{:?} Index Buffer", data.name),
        bytemuck::cast_slice(&data.indices),
        BufferUsage::Index,
    );
    Mesh {
        name: data.name,
        vertex_buffer,
        index_buffer,
        num_elements: data.indices.len() as u32,
        format: data.format,
    }
}

/// Read, parse and upload an OBJ mesh. Not cached.
pub fn load_mesh<S: GpuSession>(
    session: &S,
    reader: &mut AssetReader,
    path: &Path,
    format: &VertexFormat,
) -> Result<Mesh<S::Buffer>, AssetError> {
    let bytes = reader.read(path)?;
    let data = parse_obj(path, &bytes, format)?;
    Ok(upload_mesh(session, data))
}
