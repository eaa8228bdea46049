//! Named GPU programs.
//!
//! A program `name` is built from `{assets}/{name}.vert` and
//! `{assets}/{name}.frag`. Compiling is idempotent and each program keeps the
//! uniform table reflection found for it, so lookups by name never touch the
//! GPU.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    backend::{GraphicsBackend, ProgramDesc, ProgramHandle, RenderState, TextureKind, Uniform},
    error::{LoadError, RenderError},
    resources::load_string,
};

pub mod reflect;

#[derive(Clone, Debug)]
pub struct Program {
    pub name: String,
    pub handle: ProgramHandle,
    pub uniforms: HashMap<String, Uniform>,
    pub texture: Option<TextureKind>,
    pub state: RenderState,
}

pub struct ShaderRegistry {
    assets: PathBuf,
    programs: HashMap<String, Program>,
    active: Option<String>,
}

impl ShaderRegistry {
    pub fn new(assets: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
            programs: HashMap::new(),
            active: None,
        }
    }

    pub fn assets(&self) -> &Path {
        &self.assets
    }

    /// Compiles `name` with the default pipeline state, no-op if it exists.
    pub fn create_program<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
    ) -> Result<&Program, LoadError> {
        self.create_program_with(backend, name, RenderState::default())
    }

    /// Compiles `name` with an explicit pipeline state, no-op if it exists.
    ///
    /// The state of an already compiled program is not changed.
    pub fn create_program_with<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        state: RenderState,
    ) -> Result<&Program, LoadError> {
        if !self.programs.contains_key(name) {
            let program = self.compile(backend, name, state)?;
            self.programs.insert(name.to_string(), program);
        }
        Ok(&self.programs[name])
    }

    fn compile<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        name: &str,
        state: RenderState,
    ) -> Result<Program, LoadError> {
        let vertex = load_string(&self.assets.join(format!("{name}.vert")))?;
        let fragment = load_string(&self.assets.join(format!("{name}.frag")))?;
        let layout = reflect::reflect_program(name, &vertex, &fragment)?;
        let handle = backend.create_program(&ProgramDesc {
            name,
            vertex: &vertex,
            fragment: &fragment,
            layout: &layout,
            state,
        })?;
        log::info!(
            "compiled program `{}` with uniforms {:?}",
            name,
            reflect::uniform_names(&layout.uniforms)
        );
        Ok(Program {
            name: name.to_string(),
            handle,
            uniforms: layout.uniforms,
            texture: layout.texture,
            state,
        })
    }

    /// Makes `name` the active program; the backend is only told on change.
    pub fn use_program<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
    ) -> Result<(), RenderError> {
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }
        let program = self
            .programs
            .get(name)
            .ok_or_else(|| RenderError::UnknownProgram(name.to_string()))?;
        backend.use_program(program.handle);
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn active(&self) -> Option<&Program> {
        self.active.as_ref().and_then(|name| self.programs.get(name))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Resolves a uniform of the active program.
    pub fn uniform(&self, name: &str) -> Result<&Uniform, RenderError> {
        let program = self.active().ok_or(RenderError::NoActiveProgram)?;
        program
            .uniforms
            .get(name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: program.name.clone(),
                uniform: name.to_string(),
            })
    }

    pub fn program(&self, name: &str) -> Option<&Program> {
        self.programs.get(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
