use std::path::Path;

use image::{ImageFormat, RgbaImage, load_from_memory, load_from_memory_with_format};

use crate::{error::LoadError, resources::load_binary};

/// File stems of a cubemap directory, in upload order.
pub const CUBE_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Decodes an image file to 32-bit RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, LoadError> {
    let bytes = load_binary(path)?;
    let img = match ImageFormat::from_path(path) {
        Ok(format) => load_from_memory_with_format(&bytes, format),
        // let the img lib guess
        Err(_) => load_from_memory(&bytes),
    }
    .map_err(|source| LoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Loads the six faces of a cubemap from `dir`.
///
/// Each face is the file whose stem is one of [`CUBE_FACES`], whatever its
/// extension. All faces have to be square and of the same size.
pub fn load_cube_faces(dir: &Path) -> Result<[RgbaImage; 6], LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let files: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();

    let mut faces = Vec::with_capacity(CUBE_FACES.len());
    for face in CUBE_FACES {
        let path = files
            .iter()
            .find(|path| path.file_stem().is_some_and(|stem| stem == face))
            .ok_or_else(|| LoadError::Cubemap {
                dir: dir.to_path_buf(),
                reason: format!("missing face `{face}`"),
            })?;
        faces.push(load_rgba(path)?);
    }

    let (width, height) = faces[0].dimensions();
    if width != height || faces.iter().any(|f| f.dimensions() != (width, height)) {
        return Err(LoadError::Cubemap {
            dir: dir.to_path_buf(),
            reason: "faces must be square and share one size".to_string(),
        });
    }

    faces.try_into().map_err(|_| LoadError::Cubemap {
        dir: dir.to_path_buf(),
        reason: "expected exactly six faces".to_string(),
    })
}
