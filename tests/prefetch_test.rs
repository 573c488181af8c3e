mod common;

use common::test_utils::{AssetDir, QUAD_OBJ};
use flow_assets::resources::prefetch::prefetch;

#[tokio::test]
async fn should_read_files_concurrently() {
    let assets = AssetDir::new();
    let mesh = assets.write("meshes/quad.obj", QUAD_OBJ);
    let level = assets.write("level.xml", "<scene/>");
    let missing = assets.path("missing.png");

    let prefetched = prefetch(vec![mesh.clone(), level.clone(), missing.clone()]).await;
    assert_eq!(prefetched.len(), 2);
    assert_eq!(prefetched.get(&level), Some("<scene/>".as_bytes()));
    assert_eq!(prefetched.failed(), &[missing]);
}

#[tokio::test]
async fn should_load_from_prefetched_bytes() {
    let assets = AssetDir::new();
    let mesh = assets.write("meshes/quad.obj", QUAD_OBJ);
    let prefetched = prefetch(vec![mesh.clone()]).await;

    // the render thread no longer needs the file
    std::fs::remove_file(&mesh).unwrap();
    let mut ctx = assets.context();
    ctx.add_prefetched(prefetched);
    assert_eq!(ctx.reader.pending_prefetched(), 1);

    let id = ctx.mesh(&mesh).unwrap();
    assert!(ctx.cache.mesh(id).is_some());
    assert_eq!(ctx.reader.pending_prefetched(), 0);
}
