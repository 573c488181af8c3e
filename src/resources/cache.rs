//! Process-lifetime store of GPU resources.
//!
//! Each resource kind lives in its own arena and is referenced by a stable,
//! copyable id. A [`CacheKey`] maps to at most one live id: repeated lookups
//! return the same id without loading again. Invalidating a key only forgets
//! the mapping, ids handed out before keep resolving to their resource until
//! the cache is cleared.

use std::{collections::HashMap, path::PathBuf};

use slotmap::{Key, SlotMap, new_key_type};

use crate::{data_structures::mesh::Mesh, gpu::GpuSession, resources::shader::Program};

new_key_type! {
    pub struct TextureId;
    pub struct ProgramId;
    pub struct MeshId;
}

/// Identity of a GPU resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A resolved file path.
    Path(PathBuf),
    /// Resolved vertex then fragment source path; order matters.
    ShaderPair(PathBuf, PathBuf),
    /// An engine-provided resource such as a default texture.
    Builtin(&'static str),
}

impl CacheKey {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        CacheKey::Path(path.into())
    }

    pub fn shader_pair(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        CacheKey::ShaderPair(vertex.into(), fragment.into())
    }
}

/// Arena plus key index for one resource kind.
#[derive(Debug)]
pub struct ResourceStore<K: Key, T> {
    slots: SlotMap<K, T>,
    index: HashMap<CacheKey, K>,
    loads: usize,
}

impl<K: Key, T> Default for ResourceStore<K, T> {
    fn default() -> Self {
        Self {
            slots: SlotMap::with_key(),
            index: HashMap::new(),
            loads: 0,
        }
    }
}

impl<K: Key, T> ResourceStore<K, T> {
    /// Return the id cached for `key`, or run `load` and cache its result.
    ///
    /// A failing `load` caches nothing, the next call tries again.
    pub fn get_or_load<E>(
        &mut self,
        key: CacheKey,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<K, E> {
        if let Some(&id) = self.index.get(&key) {
            log::debug!("cache hit for {:?}", key);
            return Ok(id);
        }
        let resource = load()?;
        self.loads += 1;
        let id = self.slots.insert(resource);
        self.index.insert(key, id);
        Ok(id)
    }

    /// Forget the resource cached for `key` so the next lookup reloads it.
    /// Returns whether the key was cached.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.index.remove(key).is_some()
    }

    /// Forget every key; held resources stay reachable through their ids.
    pub fn invalidate_all(&mut self) {
        self.index.clear();
    }

    /// Drop the resource behind `id` and any key still mapping to it.
    ///
    /// Meant for handles replaced by a reload once nothing refers to them.
    pub fn release(&mut self, id: K) -> Option<T> {
        let resource = self.slots.remove(id)?;
        self.index.retain(|_, cached| *cached != id);
        Some(resource)
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<K> {
        self.index.get(key).copied()
    }

    pub fn get(&self, id: K) -> Option<&T> {
        self.slots.get(id)
    }

    /// Number of successful loads over the store's lifetime.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Resources held, including ones whose key was invalidated.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Release every resource. Ids handed out before no longer resolve.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}

/// All GPU resources created through one session.
pub struct RenderResourceCache<S: GpuSession> {
    pub textures: ResourceStore<TextureId, S::Texture>,
    pub programs: ResourceStore<ProgramId, Program<S::ShaderModule>>,
    pub meshes: ResourceStore<MeshId, Mesh<S::Buffer>>,
}

impl<S: GpuSession> Default for RenderResourceCache<S> {
    fn default() -> Self {
        Self {
            textures: ResourceStore::default(),
            programs: ResourceStore::default(),
            meshes: ResourceStore::default(),
        }
    }
}

impl<S: GpuSession> RenderResourceCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, id: TextureId) -> Option<&S::Texture> {
        self.textures.get(id)
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program<S::ShaderModule>> {
        self.programs.get(id)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh<S::Buffer>> {
        self.meshes.get(id)
    }

    /// Forget `key` in every store it may be cached in.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        let textures = self.textures.invalidate(key);
        let programs = self.programs.invalidate(key);
        let meshes = self.meshes.invalidate(key);
        textures || programs || meshes
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.programs.clear();
        self.meshes.clear();
    }
}
