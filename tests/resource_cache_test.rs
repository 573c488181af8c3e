mod common;

use std::cell::Cell;

use common::test_utils::{AssetDir, QUAD_OBJ};
use flow_assets::{
    data_structures::vertex::{ComponentType, VertexAttribute, VertexFormat},
    error::AssetError,
    resources::{
        cache::{CacheKey, ResourceStore, TextureId},
        prefetch::prefetch,
        texture::TextureOptions,
    },
};

#[test]
fn should_invoke_loader_once_per_key() {
    let mut store: ResourceStore<TextureId, &str> = ResourceStore::default();
    let calls = Cell::new(0);
    let load = || {
        calls.set(calls.get() + 1);
        Ok::<_, ()>("texture")
    };

    let first = store.get_or_load(CacheKey::path("a/wood.png"), load).unwrap();
    let second = store.get_or_load(CacheKey::path("a/wood.png"), load).unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);
    assert_eq!(store.load_count(), 1);
    assert_eq!(store.get(first), Some(&"texture"));
}

#[test]
fn should_not_cache_failures() {
    let mut store: ResourceStore<TextureId, u32> = ResourceStore::default();
    let key = CacheKey::path("broken.png");
    assert_eq!(store.get_or_load(key.clone(), || Err("bad bytes")), Err("bad bytes"));
    assert_eq!(store.lookup(&key), None);

    let id = store.get_or_load(key.clone(), || Ok::<_, &str>(7)).unwrap();
    assert_eq!(store.lookup(&key), Some(id));
}

#[test]
fn should_reload_after_invalidation_and_keep_old_ids() {
    let mut store: ResourceStore<TextureId, u32> = ResourceStore::default();
    let key = CacheKey::path("wood.png");
    let old = store.get_or_load(key.clone(), || Ok::<_, ()>(1)).unwrap();

    assert!(store.invalidate(&key));
    assert!(!store.invalidate(&key));
    let new = store.get_or_load(key.clone(), || Ok::<_, ()>(2)).unwrap();

    assert_ne!(old, new);
    assert_eq!(store.get(old), Some(&1));
    assert_eq!(store.get(new), Some(&2));
    assert_eq!(store.load_count(), 2);

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.get(new), None);
}

#[test]
fn should_distinguish_shader_pair_order() {
    let forward = CacheKey::shader_pair("a.vert.wgsl", "b.frag.wgsl");
    let reversed = CacheKey::shader_pair("b.frag.wgsl", "a.vert.wgsl");
    assert_ne!(forward, reversed);
}

#[test]
fn should_upload_each_physical_texture_once() {
    let assets = AssetDir::new();
    assets.write_image("textures/wood.png", 4, 4, [9, 9, 9, 255]);
    let mut ctx = assets.context();

    let direct = ctx.resolve("textures/wood.png");
    let roundabout = ctx.resolve("textures/../textures/./wood.png");
    let first = ctx.texture(&direct, &TextureOptions::default()).unwrap();
    let second = ctx.texture(&roundabout, &TextureOptions::default()).unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.session.textures_created(), 1);
    assert_eq!(ctx.cache.textures.load_count(), 1);
}

#[test]
fn should_reload_texture_after_context_invalidation() {
    let assets = AssetDir::new();
    assets.write_image("wood.png", 1, 1, [1, 1, 1, 255]);
    let mut ctx = assets.context();
    let path = ctx.resolve("wood.png");

    let old = ctx.texture(&path, &TextureOptions::default()).unwrap();
    assets.write_image("wood.png", 1, 1, [2, 2, 2, 255]);
    assert!(ctx.invalidate(&CacheKey::path(&path)));
    let new = ctx.texture(&path, &TextureOptions::default()).unwrap();

    assert_ne!(old, new);
    assert_eq!(ctx.cache.texture(old).unwrap().first_pixel, [1, 1, 1, 255]);
    assert_eq!(ctx.cache.texture(new).unwrap().first_pixel, [2, 2, 2, 255]);
    assert_eq!(ctx.session.textures_created(), 2);
}

#[test]
fn should_share_default_textures() {
    let assets = AssetDir::new();
    let mut ctx = assets.context();
    let first = ctx.default_material();
    let second = ctx.default_material();
    assert_eq!(first, second);
    assert_eq!(ctx.session.textures_created(), 3);
}

#[test]
fn should_cache_meshes_by_path() {
    let assets = AssetDir::new();
    assets.write("meshes/quad.obj", QUAD_OBJ);
    let mut ctx = assets.context();
    let path = ctx.resolve("meshes/quad.obj");

    let first = ctx.mesh(&path).unwrap();
    let second = ctx.mesh(&path).unwrap();
    assert_eq!(first, second);

    let mesh = ctx.cache.mesh(first).unwrap();
    assert_eq!(mesh.num_elements, 6);
    // one vertex and one index buffer
    assert_eq!(ctx.session.buffers_created(), 2);

    let missing = ctx.mesh(&ctx.resolve("meshes/none.obj"));
    assert!(matches!(missing, Err(AssetError::Read(_))));
}

#[test]
fn should_repack_meshes_after_vertex_format_change() {
    let assets = AssetDir::new();
    assets.write("meshes/quad.obj", QUAD_OBJ);
    let mut ctx = assets.context();
    let path = ctx.resolve("meshes/quad.obj");
    let standard = ctx.mesh(&path).unwrap();

    ctx.set_vertex_format(VertexFormat::new(vec![
        VertexAttribute::new("position", 3, ComponentType::Float32),
        VertexAttribute::new("tex_coords", 2, ComponentType::Float32),
    ]));
    let compact = ctx.mesh(&path).unwrap();

    assert_ne!(standard, compact);
    assert_eq!(ctx.vertex_format().stride(), 20);
    assert_eq!(ctx.cache.mesh(compact).unwrap().format.stride(), 20);
    // meshes packed before the change still resolve with their own layout
    assert_eq!(ctx.cache.mesh(standard).unwrap().format.stride(), 32);
}

#[test]
fn should_keep_meshes_when_format_is_unchanged() {
    let assets = AssetDir::new();
    assets.write("meshes/quad.obj", QUAD_OBJ);
    let mut ctx = assets.context();
    let path = ctx.resolve("meshes/quad.obj");
    let first = ctx.mesh(&path).unwrap();

    ctx.set_vertex_format(VertexFormat::standard());
    assert_eq!(ctx.mesh(&path).unwrap(), first);
    assert_eq!(ctx.cache.meshes.load_count(), 1);
}

#[test]
fn should_release_replaced_resources() {
    let mut store: ResourceStore<TextureId, u32> = ResourceStore::default();
    let key = CacheKey::path("wood.png");
    let old = store.get_or_load(key.clone(), || Ok::<_, ()>(1)).unwrap();
    store.invalidate(&key);
    let new = store.get_or_load(key.clone(), || Ok::<_, ()>(2)).unwrap();

    assert_eq!(store.release(old), Some(1));
    assert_eq!(store.release(old), None);
    assert_eq!(store.len(), 1);
    assert_eq!(store.lookup(&key), Some(new));

    // releasing a still cached id forgets its key too
    assert_eq!(store.release(new), Some(2));
    assert_eq!(store.lookup(&key), None);
    assert!(store.is_empty());
}

#[tokio::test]
async fn should_drop_prefetched_bytes_on_cache_hit() {
    let assets = AssetDir::new();
    let mesh = assets.write("meshes/quad.obj", QUAD_OBJ);
    let mut ctx = assets.context();
    let id = ctx.mesh(&mesh).unwrap();

    let prefetched = prefetch(vec![mesh.clone()]).await;
    ctx.add_prefetched(prefetched);
    assert_eq!(ctx.reader.pending_prefetched(), 1);

    assert_eq!(ctx.mesh(&mesh).unwrap(), id);
    assert_eq!(ctx.reader.pending_prefetched(), 0);
}
