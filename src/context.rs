//! The render context: backend, programs, vertex array contexts and the draw queue.
//!
//! Everything that touches GPU state goes through a [`RenderContext`], which is
//! passed by reference to whoever needs to load or draw. Resource loads
//! always target the active vertex array context; draws always use the active
//! program.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use cgmath::Matrix4;

use crate::{
    backend::{BufferHandle, GraphicsBackend, RenderState, TextureHandle, UniformKind},
    camera::{CAMERA_UNIFORMS, Camera},
    data_structures::{geometry::GeometryBuffer, model::Model},
    error::{BackendError, LoadError, RenderError},
    shader::{Program, ShaderRegistry},
};

/// Name of the vertex array context that always exists.
pub const DEFAULT_VAO: &str = "default";

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub model: String,
    pub transform: Matrix4<f32>,
}

/// Pending draws of the current frame, in submission order.
#[derive(Debug, Default)]
pub struct DrawQueue {
    commands: Vec<DrawCommand>,
}

impl DrawQueue {
    pub fn push(&mut self, model: &str, transform: Matrix4<f32>) {
        self.commands.push(DrawCommand {
            model: model.to_string(),
            transform,
        });
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

pub struct RenderContext<B: GraphicsBackend> {
    backend: B,
    assets: PathBuf,
    shaders: ShaderRegistry,
    vaos: HashMap<String, GeometryBuffer>,
    active_vao: String,
    bound_buffer: Option<BufferHandle>,
    queue: DrawQueue,
    clear_colour: wgpu::Color,
}

impl<B: GraphicsBackend> RenderContext<B> {
    pub fn new(backend: B, assets: impl Into<PathBuf>) -> Self {
        let assets = assets.into();
        let mut vaos = HashMap::new();
        vaos.insert(DEFAULT_VAO.to_string(), GeometryBuffer::new(DEFAULT_VAO));
        Self {
            backend,
            shaders: ShaderRegistry::new(assets.clone()),
            assets,
            vaos,
            active_vao: DEFAULT_VAO.to_string(),
            bound_buffer: None,
            queue: DrawQueue::default(),
            clear_colour: wgpu::Color::BLACK,
        }
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn assets(&self) -> &Path {
        &self.assets
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    /// Clears colour and depth of the frame being built.
    pub fn clear(&mut self) {
        self.backend.clear(self.clear_colour);
    }

    // Programs

    pub fn create_program(&mut self, name: &str) -> Result<&Program, LoadError> {
        self.shaders.create_program(&mut self.backend, name)
    }

    pub fn create_program_with(
        &mut self,
        name: &str,
        state: RenderState,
    ) -> Result<&Program, LoadError> {
        self.shaders
            .create_program_with(&mut self.backend, name, state)
    }

    pub fn use_program(&mut self, name: &str) -> Result<(), RenderError> {
        self.shaders.use_program(&mut self.backend, name)
    }

    /**
     * Writes matrices into the active program.
     *
     * Camera matrices (`M`, `V`, `MV`, `MVP`, `P`) are only written when the
     * program declares them, so one set of camera uniforms fits every
     * program. Any other name has to exist and be a mat4.
     */
    pub fn update_uniforms<'a, I>(&mut self, values: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = (&'a str, Matrix4<f32>)>,
    {
        let program = self.shaders.active().ok_or(RenderError::NoActiveProgram)?;
        for (name, value) in values {
            let Some(uniform) = program.uniforms.get(name) else {
                if CAMERA_UNIFORMS.contains(&name) {
                    continue;
                }
                return Err(RenderError::UnknownUniform {
                    program: program.name.clone(),
                    uniform: name.to_string(),
                });
            };
            if uniform.kind != UniformKind::Mat4 {
                return Err(RenderError::UniformType {
                    program: program.name.clone(),
                    uniform: name.to_string(),
                    kind: uniform.kind,
                });
            }
            let columns: [[f32; 4]; 4] = value.into();
            self.backend
                .write_uniform(uniform, bytemuck::cast_slice(&columns));
        }
        Ok(())
    }

    // Vertex array contexts

    /// Adds an empty vertex array context; an existing one is left untouched.
    pub fn create_vao(&mut self, name: &str) {
        self.vaos
            .entry(name.to_string())
            .or_insert_with(|| GeometryBuffer::new(name));
    }

    pub fn use_vao(&mut self, name: &str) -> Result<(), RenderError> {
        if self.active_vao == name {
            return Ok(());
        }
        if !self.vaos.contains_key(name) {
            return Err(RenderError::UnknownVao(name.to_string()));
        }
        self.active_vao = name.to_string();
        Ok(())
    }

    pub fn active_vao(&self) -> &str {
        &self.active_vao
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.vaos[&self.active_vao]
    }

    pub fn geometry_named(&self, name: &str) -> Option<&GeometryBuffer> {
        self.vaos.get(name)
    }

    // Resources, always into the active context

    pub fn load_models(&mut self, names: &[&str]) -> Result<(), LoadError> {
        let assets = self.assets.clone();
        let vao = self
            .vaos
            .entry(self.active_vao.clone())
            .or_insert_with_key(|name| GeometryBuffer::new(name));
        if vao.buffer().is_some() && vao.buffer() == self.bound_buffer {
            self.bound_buffer = None;
        }
        vao.load_models(&mut self.backend, &assets, names)
    }

    /// Loads a texture relative to the assets directory.
    pub fn load_texture(&mut self, path: &str) -> Result<TextureHandle, LoadError> {
        let path = self.assets.join(path);
        let backend = &mut self.backend;
        let vao = self
            .vaos
            .entry(self.active_vao.clone())
            .or_insert_with_key(|name| GeometryBuffer::new(name));
        vao.load_texture(backend, &path)
    }

    /// Loads a cubemap directory relative to the assets directory.
    pub fn load_cubemap(&mut self, dir: &str) -> Result<TextureHandle, LoadError> {
        let dir = self.assets.join(dir);
        let backend = &mut self.backend;
        let vao = self
            .vaos
            .entry(self.active_vao.clone())
            .or_insert_with_key(|name| GeometryBuffer::new(name));
        vao.load_cubemap(backend, &dir)
    }

    /// Uploads generated pixels, replacing the texture stored under `key`.
    pub fn replace_texture(
        &mut self,
        key: &str,
        image: &image::RgbaImage,
    ) -> Result<TextureHandle, BackendError> {
        let backend = &mut self.backend;
        let vao = self
            .vaos
            .entry(self.active_vao.clone())
            .or_insert_with_key(|name| GeometryBuffer::new(name));
        vao.replace_texture(backend, key, image)
    }

    pub fn get_model(&self, name: &str) -> Result<&Model, RenderError> {
        self.geometry()
            .model(name)
            .ok_or_else(|| RenderError::UnknownModel {
                vao: self.active_vao.clone(),
                model: name.to_string(),
            })
    }

    // Drawing

    pub fn queue_mut(&mut self) -> &mut DrawQueue {
        &mut self.queue
    }

    /// Draw commands waiting for the next [`render`](Self::render).
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn enqueue(&mut self, model: &str, transform: Matrix4<f32>) {
        self.queue.push(model, transform);
    }

    /// Starts a frame; the queue is expected to be empty.
    pub fn begin_frame(&mut self) {
        if !self.queue.is_empty() {
            log::warn!(
                "dropping {} draw commands left over from the previous frame",
                self.queue.len()
            );
            self.queue.clear();
        }
    }

    /// Drains the queue with the active program and vertex array context.
    ///
    /// Returns the number of draws issued.
    pub fn render(&mut self, camera: &Camera) -> Result<usize, RenderError> {
        let commands = self.queue.take();
        for command in &commands {
            self.draw_model(&command.model, command.transform, camera, None)?;
        }
        Ok(commands.len())
    }

    /// Issues one draw right away, bypassing the queue.
    ///
    /// `texture` overrides the model's own texture, e.g. a cubemap or a
    /// rasterized text line.
    pub fn draw_model(
        &mut self,
        name: &str,
        transform: Matrix4<f32>,
        camera: &Camera,
        texture: Option<TextureHandle>,
    ) -> Result<(), RenderError> {
        let geometry = self.geometry();
        let model = *self.get_model(name)?;
        let buffer = geometry
            .buffer()
            .ok_or_else(|| RenderError::UnknownModel {
                vao: self.active_vao.clone(),
                model: name.to_string(),
            })?;
        let range = model.range();
        if range.end > geometry.vertex_count() {
            return Err(RenderError::DrawOutsideBuffer {
                model: name.to_string(),
                first: range.start,
                end: range.end,
                len: geometry.vertex_count(),
            });
        }

        if self.bound_buffer != Some(buffer) {
            self.backend.bind_vertex_buffer(buffer);
            self.bound_buffer = Some(buffer);
        }
        self.backend.bind_texture(texture.or(model.texture));
        self.update_uniforms(camera.gen_uniforms(transform).iter())?;
        self.backend.draw(model.offset, model.vertex_count)?;
        Ok(())
    }

    pub fn present(&mut self) -> Result<(), RenderError> {
        self.backend.present()?;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    /// Releases every buffer and texture of every vertex array context.
    pub fn shutdown(&mut self) {
        for vao in self.vaos.values_mut() {
            vao.release(&mut self.backend);
        }
        self.bound_buffer = None;
        self.queue.clear();
        log::info!("render context released");
    }
}
