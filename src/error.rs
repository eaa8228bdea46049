//! Error kinds for asset loading and per-frame rendering.
//!
//! Loading failures are fatal for the game but they are still returned as
//! values: only the top-level driver decides to terminate. Render errors are
//! programmer errors (a typo in a uniform or model name) and abort the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::{ShaderStage, UniformKind};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse mesh {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("could not decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("model `{model}` must use the T2F_N3F_V3F vertex layout ({reason})")]
    VertexLayout { model: String, reason: String },
    #[error("{stage} stage of program `{program}` failed to compile:\n{message}")]
    Shader {
        program: String,
        stage: ShaderStage,
        message: String,
    },
    #[error("program `{program}` failed to link: {message}")]
    Link { program: String, message: String },
    #[error("cubemap {dir}: {reason}")]
    Cubemap { dir: PathBuf, reason: String },
    #[error("font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Context(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("program `{0}` was never created")]
    UnknownProgram(String),
    #[error("no program is active")]
    NoActiveProgram,
    #[error("program `{program}` has no uniform `{uniform}`")]
    UnknownUniform { program: String, uniform: String },
    #[error("uniform `{uniform}` of program `{program}` is a {kind:?}, not a mat4")]
    UniformType {
        program: String,
        uniform: String,
        kind: UniformKind,
    },
    #[error("vertex array context `{0}` does not exist")]
    UnknownVao(String),
    #[error("model `{model}` is not loaded in vertex array context `{vao}`")]
    UnknownModel { vao: String, model: String },
    #[error("model `{model}` spans vertices {first}..{end}, outside a buffer of {len}")]
    DrawOutsideBuffer {
        model: String,
        first: u32,
        end: u32,
        len: u32,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),
    #[error("could not create the graphics device: {0}")]
    Device(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("unknown {kind} handle #{id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("cannot draw: {0}")]
    InvalidDraw(String),
}
