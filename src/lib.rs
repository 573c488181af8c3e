//! flow-assets
//!
//! The asset side of a small 3D engine: everything between files on disk and
//! bindable GPU resources. Paths are resolved against an asset root, textures
//! and shaders are decoded and compiled once per physical file, materials fall
//! back to engine defaults slot by slot, and levels are read from and written
//! to XML scene graphs.
//!
//! High-level modules
//! - `config`: asset root and load options, optionally from the environment
//! - `context`: owns the graphics session and the resource cache
//! - `data_structures`: meshes, lights, vertex formats, scene graphs, GPU textures
//! - `error`: typed errors per stage and non-fatal load warnings
//! - `gpu`: the [`gpu::GpuSession`] seam and its wgpu implementation
//! - `resources`: loaders for paths, textures, shaders, meshes, materials and levels
//!
//! All GPU work happens on the thread that owns the [`context::Context`]. Only
//! file reads may run ahead of it, see [`resources::prefetch`].

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod gpu;
pub mod resources;

pub use config::AssetConfig;
pub use context::Context;
pub use error::{Error, LoadWarning, Result};
pub use gpu::{GpuSession, WgpuSession};
