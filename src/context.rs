//! The render thread's view of the asset pipeline.
//!
//! [`Context`] owns the graphics session, the resource cache and the file
//! reader. Every load that ends in a GPU object goes through it so that a
//! physical asset is uploaded or compiled at most once.

use std::path::{Path, PathBuf};

use crate::{
    config::AssetConfig,
    data_structures::{scene_graph::SceneGraph, vertex::VertexFormat},
    error::{AssetError, LevelError, ShaderError},
    gpu::GpuSession,
    resources::{
        AssetReader,
        cache::{CacheKey, MeshId, ProgramId, RenderResourceCache, TextureId},
        level,
        material::{self, Material, TextureSlot},
        mesh, path,
        prefetch::Prefetched,
        shader,
        texture::{self, DecodedImage, TextureOptions},
    },
};

const DEFAULT_PROGRAM_KEY: &str = "default-program";

pub struct Context<S: GpuSession> {
    pub session: S,
    pub cache: RenderResourceCache<S>,
    pub reader: AssetReader,
    config: AssetConfig,
    vertex_format: VertexFormat,
}

impl<S: GpuSession> Context<S> {
    /// A relative asset root is anchored at the current directory once, here.
    pub fn new(session: S, mut config: AssetConfig) -> Self {
        if config.asset_root.is_relative() {
            if let Ok(cwd) = std::env::current_dir() {
                config.asset_root = path::resolve(cwd, &config.asset_root);
            }
        }
        Self {
            session,
            cache: RenderResourceCache::new(),
            reader: AssetReader::new(),
            config,
            vertex_format: VertexFormat::standard(),
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Format meshes are packed into.
    pub fn vertex_format(&self) -> &VertexFormat {
        &self.vertex_format
    }

    /// Meshes already loaded keep their ids and layout; the next request for
    /// any mesh path repacks it in `format`.
    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        if format != self.vertex_format {
            self.cache.meshes.invalidate_all();
            self.vertex_format = format;
        }
    }

    /// Resolve an authored reference against the asset root.
    pub fn resolve(&self, authored: &str) -> PathBuf {
        path::resolve(&self.config.asset_root, authored)
    }

    pub fn add_prefetched(&mut self, prefetched: Prefetched) {
        self.reader.insert_prefetched(prefetched);
    }

    /// Load a texture once per path. Options of the first load win.
    pub fn texture(&mut self, path: &Path, options: &TextureOptions) -> Result<TextureId, AssetError> {
        let Context {
            session,
            cache,
            reader,
            ..
        } = self;
        let id = cache
            .textures
            .get_or_load(CacheKey::path(path), || texture::load_texture(session, reader, path, options))?;
        reader.discard_prefetched(path);
        Ok(id)
    }

    pub fn default_texture(&mut self, slot: TextureSlot) -> TextureId {
        let Context { session, cache, .. } = self;
        let key = CacheKey::Builtin(slot.builtin_key());
        let loaded: Result<_, std::convert::Infallible> = cache.textures.get_or_load(key, || {
            let options = slot.options(&TextureOptions {
                generate_mipmaps: false,
                ..Default::default()
            });
            Ok(texture::upload(
                &*session,
                slot.builtin_key(),
                &DecodedImage::solid(slot.default_color()),
                &options,
            ))
        });
        match loaded {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }

    /// Compile a program once per ordered (vertex, fragment) pair.
    pub fn program(&mut self, vertex: &Path, fragment: &Path) -> Result<ProgramId, ShaderError> {
        let Context {
            session,
            cache,
            reader,
            ..
        } = self;
        let id = cache
            .programs
            .get_or_load(CacheKey::shader_pair(vertex, fragment), || {
                shader::compile(session, reader, vertex, fragment)
            })?;
        reader.discard_prefetched(vertex);
        reader.discard_prefetched(fragment);
        Ok(id)
    }

    /// The engine's embedded fallback program.
    pub fn default_program(&mut self) -> Result<ProgramId, ShaderError> {
        let Context { session, cache, .. } = self;
        cache
            .programs
            .get_or_load(CacheKey::Builtin(DEFAULT_PROGRAM_KEY), || {
                shader::compile_sources(
                    &*session,
                    (Path::new("builtin/default.vert.wgsl"), shader::DEFAULT_VERTEX_SOURCE),
                    (Path::new("builtin/default.frag.wgsl"), shader::DEFAULT_FRAGMENT_SOURCE),
                )
            })
    }

    /// Load an OBJ mesh once per path, packed in [`Self::vertex_format`].
    pub fn mesh(&mut self, path: &Path) -> Result<MeshId, AssetError> {
        let Context {
            session,
            cache,
            reader,
            vertex_format,
            ..
        } = self;
        let id = cache
            .meshes
            .get_or_load(CacheKey::path(path), || mesh::load_mesh(session, reader, path, vertex_format))?;
        reader.discard_prefetched(path);
        Ok(id)
    }

    pub fn resolve_material(&mut self, material_dir: &Path) -> Material {
        material::resolve_material(self, material_dir)
    }

    pub fn default_material(&mut self) -> Material {
        material::default_material(self)
    }

    /// Forget a cached resource so the next request reloads it. Ids already
    /// handed out stay valid.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.cache.invalidate(key)
    }

    pub fn load_level(&mut self, path: &Path) -> Result<SceneGraph, LevelError> {
        level::load(self, path)
    }

    pub fn save_level(&self, path: &Path, graph: &SceneGraph) -> Result<(), LevelError> {
        level::save(path, graph)
    }
}
