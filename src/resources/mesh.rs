use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use crate::{
    data_structures::model::{self, ModelVertex},
    error::LoadError,
    resources::load_string,
};

/// A parsed mesh, flattened to a triangle list in the T2F_N3F_V3F layout.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    /// Diffuse texture of the first textured material, relative to the assets root.
    pub diffuse_texture: Option<PathBuf>,
    pub bounding_radius: f32,
}

/**
 * Loads `{assets}/{name}.obj`.
 *
 * Obj files may omit texture coordinates or normals; such meshes cannot be
 * drawn with the fixed vertex layout and are rejected instead of being padded
 * with zeros.
 */
pub fn load_mesh(assets: &Path, name: &str) -> Result<MeshData, LoadError> {
    let path = assets.join(format!("{name}.obj"));
    let obj_text = load_string(&path)?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| match std::fs::read_to_string(assets.join(p)) {
            Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
            Err(_) => Err(tobj::LoadError::OpenFileFailed),
        },
    )
    .map_err(|source| LoadError::Obj {
        path: path.clone(),
        source,
    })?;

    let materials = match obj_materials {
        Ok(materials) => materials,
        Err(e) => {
            log::debug!("{} has no usable material library: {}", path.display(), e);
            Vec::new()
        }
    };

    if models.is_empty() {
        return Err(LoadError::VertexLayout {
            model: name.to_string(),
            reason: "the file contains no geometry".to_string(),
        });
    }

    let mut vertices = Vec::new();
    let mut diffuse_texture = None;
    for m in &models {
        let mesh = &m.mesh;
        let count = mesh.positions.len() / 3;
        if mesh.texcoords.len() / 2 != count {
            return Err(LoadError::VertexLayout {
                model: name.to_string(),
                reason: format!("mesh `{}` has no texture coordinates", m.name),
            });
        }
        if mesh.normals.len() / 3 != count {
            return Err(LoadError::VertexLayout {
                model: name.to_string(),
                reason: format!("mesh `{}` has no normals", m.name),
            });
        }

        vertices.extend(mesh.indices.iter().map(|&i| {
            let i = i as usize;
            ModelVertex {
                // wgpu samples with the origin in the top-left corner
                tex_coords: [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]],
                normal: [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ],
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
            }
        }));

        let texture = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|material| material.diffuse_texture.clone());
        match (&diffuse_texture, texture) {
            (None, Some(texture)) => diffuse_texture = Some(PathBuf::from(texture)),
            (Some(first), Some(other)) if *first != PathBuf::from(&other) => {
                log::warn!(
                    "{} uses more than one texture, only {} is kept",
                    path.display(),
                    first.display()
                );
            }
            _ => (),
        }
    }

    let bounding_radius = model::bounding_radius(&vertices);
    log::debug!(
        "parsed {}: {} vertices, radius {:.3}",
        path.display(),
        vertices.len(),
        bounding_radius
    );
    Ok(MeshData {
        vertices,
        diffuse_texture,
        bounding_radius,
    })
}
