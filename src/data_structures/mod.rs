//! Engine data structures produced by the loaders.
//!
//! - `light` holds light sources and the fixed-size light uniform array
//! - `mesh` contains packed vertex data and its uploaded buffers
//! - `scene_graph` is the node tree a level loads into
//! - `texture` wraps wgpu textures, views and samplers
//! - `vertex` describes vertex formats and binds them to shader locations

pub mod light;
pub mod mesh;
pub mod scene_graph;
pub mod texture;
pub mod vertex;
