use std::path::{MAIN_SEPARATOR_STR, PathBuf};

use flow_assets::resources::path::{is_absolute, resolve};

fn host(parts: &[&str]) -> PathBuf {
    parts.iter().collect()
}

#[test]
fn should_join_without_doubled_separators() {
    assert_eq!(resolve("assets/", "/textures"), PathBuf::from("/textures"));
    assert_eq!(resolve("assets/", "textures/wood.png"), host(&["assets", "textures", "wood.png"]));
    assert_eq!(resolve("assets", "textures//wood.png"), host(&["assets", "textures", "wood.png"]));
}

#[test]
fn should_accept_either_separator() {
    assert_eq!(
        resolve("assets\\materials", "crate\\diffuse.png"),
        host(&["assets", "materials", "crate", "diffuse.png"])
    );
    assert_eq!(
        resolve("assets/materials", "crate\\diffuse.png"),
        resolve("assets\\materials", "crate/diffuse.png")
    );
}

#[test]
fn should_return_relative_name_for_empty_base() {
    assert_eq!(resolve("", "a/./b"), host(&["a", "b"]));
}

#[test]
fn should_let_absolute_name_replace_base() {
    let expected = PathBuf::from(format!("{MAIN_SEPARATOR_STR}srv{MAIN_SEPARATOR_STR}level.xml"));
    assert_eq!(resolve("assets", "/srv/level.xml"), expected);
    assert!(is_absolute("C:\\levels"));
    assert!(is_absolute("\\levels"));
    assert!(!is_absolute("levels"));
}

#[test]
fn should_collapse_dot_segments() {
    assert_eq!(resolve("assets/levels", "../meshes/./crate.obj"), host(&["assets", "meshes", "crate.obj"]));
    assert_eq!(resolve("/assets", "../../../etc"), host(&[MAIN_SEPARATOR_STR, "etc"]));
    assert_eq!(resolve("assets", "../../shared"), host(&["..", "shared"]));
}
