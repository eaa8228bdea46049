//! A named set of models sharing one vertex buffer.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    backend::{BufferHandle, GraphicsBackend, TextureHandle},
    data_structures::model::Model,
    error::{BackendError, LoadError},
    resources::{mesh, texture},
};

/// One vertex array context: every model loaded into it lives in a single
/// interleaved vertex buffer, textures are cached per file.
///
/// The buffer is owned here. Loading a new model set releases the old buffer
/// and all cached textures first, so handles never leak across reloads.
pub struct GeometryBuffer {
    name: String,
    buffer: Option<BufferHandle>,
    vertex_count: u32,
    textures: HashMap<PathBuf, TextureHandle>,
    models: HashMap<String, Model>,
}

impl GeometryBuffer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            buffer: None,
            vertex_count: 0,
            textures: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }

    /// Handle cached under a file path or a [`replace_texture`](Self::replace_texture) key.
    pub fn texture(&self, key: impl AsRef<Path>) -> Option<TextureHandle> {
        self.textures.get(key.as_ref()).copied()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /**
     * Replaces the content of this context with the models `{assets}/{name}.obj`.
     *
     * All meshes and their textures are read and decoded before anything is
     * released, so a broken or missing file leaves the previous models
     * usable. Vertices are appended in the given order; each model remembers
     * its offset and count into the shared buffer. If the backend fails
     * while uploading, the context is left empty.
     */
    pub fn load_models<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        assets: &Path,
        names: &[&str],
    ) -> Result<(), LoadError> {
        let meshes = names
            .iter()
            .map(|name| mesh::load_mesh(assets, name).map(|mesh| (*name, mesh)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut decoded: Vec<(PathBuf, image::RgbaImage)> = Vec::new();
        for path in meshes
            .iter()
            .filter_map(|(_, mesh)| mesh.diffuse_texture.as_ref())
            .map(|texture| assets.join(texture))
        {
            if !decoded.iter().any(|(seen, _)| *seen == path) {
                let rgba = texture::load_rgba(&path)?;
                decoded.push((path, rgba));
            }
        }

        self.release(backend);
        if let Err(e) = self.upload(backend, assets, meshes, decoded) {
            self.release(backend);
            return Err(e.into());
        }

        log::info!(
            "vertex array `{}`: {} models, {} vertices, {} textures",
            self.name,
            self.models.len(),
            self.vertex_count,
            self.textures.len()
        );
        Ok(())
    }

    fn upload<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        assets: &Path,
        meshes: Vec<(&str, mesh::MeshData)>,
        decoded: Vec<(PathBuf, image::RgbaImage)>,
    ) -> Result<(), BackendError> {
        for (path, rgba) in decoded {
            let handle = backend.create_texture(&path.to_string_lossy(), &rgba)?;
            log::debug!("uploaded texture {} as #{}", path.display(), handle.id());
            self.textures.insert(path, handle);
        }

        let mut vertices = Vec::new();
        let mut models = HashMap::new();
        for (name, mesh) in meshes {
            let offset = vertices.len() as u32;
            let vertex_count = mesh.vertices.len() as u32;
            vertices.extend(mesh.vertices);
            let texture = mesh
                .diffuse_texture
                .and_then(|texture| self.textures.get(&assets.join(texture)).copied());
            models.insert(
                name.to_string(),
                Model {
                    offset,
                    vertex_count,
                    texture,
                    bounding_radius: mesh.bounding_radius,
                },
            );
        }

        self.buffer = Some(backend.create_vertex_buffer(&self.name, &vertices)?);
        self.vertex_count = vertices.len() as u32;
        self.models = models;
        Ok(())
    }

    /// Decodes and uploads `path` unless the same file was loaded before.
    pub fn load_texture<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        path: &Path,
    ) -> Result<TextureHandle, LoadError> {
        if let Some(handle) = self.textures.get(path) {
            return Ok(*handle);
        }
        let rgba = texture::load_rgba(path)?;
        let handle = backend.create_texture(&path.to_string_lossy(), &rgba)?;
        log::debug!("uploaded texture {} as #{}", path.display(), handle.id());
        self.textures.insert(path.to_path_buf(), handle);
        Ok(handle)
    }

    /// Loads the six faces in `dir` as one cubemap, cached under the directory path.
    pub fn load_cubemap<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        dir: &Path,
    ) -> Result<TextureHandle, LoadError> {
        if let Some(handle) = self.textures.get(dir) {
            return Ok(*handle);
        }
        let faces = texture::load_cube_faces(dir)?;
        let handle = backend.create_cubemap(&dir.to_string_lossy(), &faces)?;
        log::debug!("uploaded cubemap {} as #{}", dir.display(), handle.id());
        self.textures.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    /// Uploads generated pixels under `key`, releasing whatever was stored there.
    pub fn replace_texture<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        key: &str,
        image: &image::RgbaImage,
    ) -> Result<TextureHandle, BackendError> {
        let handle = backend.create_texture(key, image)?;
        if let Some(old) = self.textures.insert(PathBuf::from(key), handle) {
            backend.release_texture(old);
        }
        Ok(handle)
    }

    /// Releases the vertex buffer and every cached texture.
    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        for (_, texture) in self.textures.drain() {
            backend.release_texture(texture);
        }
        self.models.clear();
        self.vertex_count = 0;
    }
}
