use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use crate::error::AssetReadError;

/**
 * This module contains all logic for loading shaders/textures/meshes/materials from external files.
 */
pub mod cache;
pub mod level;
pub mod material;
pub mod mesh;
pub mod path;
pub mod prefetch;
pub mod shader;
pub mod texture;

pub fn load_binary(path: &Path) -> Result<Vec<u8>, AssetReadError> {
    std::fs::read(path).map_err(|source| AssetReadError {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_string(path: &Path) -> Result<String, AssetReadError> {
    std::fs::read_to_string(path).map_err(|source| AssetReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// File access for the render thread.
///
/// Bytes handed over from a [`prefetch`](prefetch::prefetch) are consumed first;
/// anything else (and any second read of the same file) goes to disk.
#[derive(Debug, Default)]
pub struct AssetReader {
    prefetched: HashMap<PathBuf, Vec<u8>>,
}

impl AssetReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_prefetched(&mut self, prefetched: prefetch::Prefetched) {
        self.prefetched.extend(prefetched.into_files());
    }

    pub fn pending_prefetched(&self) -> usize {
        self.prefetched.len()
    }

    /// Drop prefetched bytes of `path` that will not be read, e.g. because
    /// the asset was already cached.
    pub fn discard_prefetched(&mut self, path: &Path) -> bool {
        self.prefetched.remove(path).is_some()
    }

    pub fn read(&mut self, path: &Path) -> Result<Vec<u8>, AssetReadError> {
        match self.prefetched.remove(path) {
            Some(bytes) => Ok(bytes),
            None => load_binary(path),
        }
    }

    pub fn read_string(&mut self, path: &Path) -> Result<String, AssetReadError> {
        match self.prefetched.remove(path) {
            Some(bytes) => String::from_utf8(bytes).map_err(|e| AssetReadError {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            }),
            None => load_string(path),
        }
    }
}
