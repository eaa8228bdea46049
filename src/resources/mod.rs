/**
 * This module contains all logic for loading meshes/textures/fonts from the assets directory.
 *
 * Nothing in here talks to the GPU: loaders return CPU-side data and the
 * render context decides where it gets uploaded.
 */
use std::path::{Path, PathBuf};

use crate::error::LoadError;

pub mod font;
pub mod mesh;
pub mod texture;

/// Picks the assets directory: the configured one if it exists, otherwise the
/// copy the build script placed next to the build output.
pub fn resolve_asset_root(configured: &Path) -> PathBuf {
    if configured.is_dir() {
        return configured.to_path_buf();
    }
    let bundled = Path::new(env!("OUT_DIR")).join("assets");
    if bundled.is_dir() {
        log::info!(
            "assets directory {} not found, using {}",
            configured.display(),
            bundled.display()
        );
        bundled
    } else {
        configured.to_path_buf()
    }
}

pub fn load_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_binary(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
