//! Pipeline configuration.
//!
//! Everything authored in a level (mesh, material and shader references) is a
//! path relative to [`AssetConfig::asset_root`].

use std::{env, path::PathBuf};

use crate::resources::texture::TextureOptions;

/// Environment variable overriding [`AssetConfig::asset_root`].
pub const ASSET_ROOT_ENV: &str = "FLOW_ASSETS_ROOT";
/// Environment variable overriding [`AssetConfig::texture_extension`].
pub const TEXTURE_EXT_ENV: &str = "FLOW_ASSETS_TEXTURE_EXT";

#[derive(Clone, Debug, PartialEq)]
pub struct AssetConfig {
    /// Directory all authored references are resolved against.
    pub asset_root: PathBuf,
    /// File extension of the fixed-name material slot images (`diffuse.<ext>`).
    pub texture_extension: String,
    /// Options used for authored material textures. Normal maps always
    /// override the colour space to linear.
    pub texture_options: TextureOptions,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./assets"),
            texture_extension: "png".to_string(),
            texture_options: TextureOptions::default(),
        }
    }
}

impl AssetConfig {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `FLOW_ASSETS_ROOT` and `FLOW_ASSETS_TEXTURE_EXT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = env::var(ASSET_ROOT_ENV) {
            if !root.is_empty() {
                config.asset_root = PathBuf::from(root);
            }
        }
        if let Ok(ext) = env::var(TEXTURE_EXT_ENV) {
            let ext = ext.trim_start_matches('.');
            if !ext.is_empty() {
                config.texture_extension = ext.to_string();
            }
        }
        log::debug!(
            "asset config: root {}, texture extension {}",
            config.asset_root.display(),
            config.texture_extension
        );
        config
    }
}
