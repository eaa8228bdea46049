//! The narrow interface between the game and the graphics API.
//!
//! Everything the render context needs from a GPU fits into
//! [`GraphicsBackend`]: upload vertices, upload decoded RGBA pixels, compile a
//! program from source strings, set uniforms and draw a vertex range. Two
//! implementations exist:
//!
//! - [`gpu::WgpuBackend`] renders through wgpu into a winit window
//! - [`recording::RecordingBackend`] is headless; it hands out handles, keeps
//!   live-handle counts and records every call

use std::{collections::HashMap, fmt};

use crate::{data_structures::model::ModelVertex, error::BackendError};

pub mod gpu;
pub mod recording;

/// Owned vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u32);

/// Owned 2D texture or cubemap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

/// Compiled program (vertex + fragment stage and its pipeline state).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub(crate) u32);

impl BufferHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl TextureHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl ProgramHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Other,
}

impl UniformKind {
    /// Size of one element in bytes, as laid out in a uniform block.
    pub fn size(&self) -> u32 {
        match self {
            UniformKind::Float | UniformKind::Int | UniformKind::UInt => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
            UniformKind::Other => 0,
        }
    }
}

/// A uniform as it was found in a compiled program.
///
/// `location` is the byte offset of the member inside the program's uniform
/// block (group 0, binding 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Uniform {
    pub location: u32,
    pub kind: UniformKind,
    pub array_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    Cube,
}

/// What reflection learned about a program before it is handed to a backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramLayout {
    pub uniforms: HashMap<String, Uniform>,
    /// Size of the uniform block in bytes, zero when the program declares none.
    pub block_size: u32,
    pub texture: Option<TextureKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cull {
    None,
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthTest {
    Less,
    LessEqual,
    Always,
}

/// Fixed-function state baked into a program's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub cull: Cull,
    pub depth_test: DepthTest,
    pub depth_write: bool,
    pub alpha_blend: bool,
}

impl RenderState {
    /// Drawn from the inside: front faces culled and depth compared with `<=`
    /// so the box sits on the far plane.
    pub fn skybox() -> Self {
        Self {
            cull: Cull::Front,
            depth_test: DepthTest::LessEqual,
            depth_write: false,
            alpha_blend: false,
        }
    }

    /// Always on top and alpha blended, used for text.
    pub fn overlay() -> Self {
        Self {
            cull: Cull::None,
            depth_test: DepthTest::Always,
            depth_write: false,
            alpha_blend: true,
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            cull: Cull::Back,
            depth_test: DepthTest::Less,
            depth_write: true,
            alpha_blend: false,
        }
    }
}

/// Source strings plus everything reflection found out about them.
pub struct ProgramDesc<'a> {
    pub name: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub layout: &'a ProgramLayout,
    pub state: RenderState,
}

/// The graphics API as seen by [`crate::context::RenderContext`].
///
/// Binding calls are state changes that apply to the next [`draw`](Self::draw);
/// a frame ends with [`present`](Self::present).
pub trait GraphicsBackend {
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
    ) -> Result<BufferHandle, BackendError>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn create_texture(
        &mut self,
        label: &str,
        image: &image::RgbaImage,
    ) -> Result<TextureHandle, BackendError>;

    /// Faces are in the order right, left, top, bottom, front, back.
    fn create_cubemap(
        &mut self,
        label: &str,
        faces: &[image::RgbaImage; 6],
    ) -> Result<TextureHandle, BackendError>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError>;

    fn use_program(&mut self, program: ProgramHandle);

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle);

    fn bind_texture(&mut self, texture: Option<TextureHandle>);

    /// Writes raw bytes into the active program's uniform block.
    fn write_uniform(&mut self, uniform: &Uniform, data: &[u8]);

    fn clear(&mut self, colour: wgpu::Color);

    fn draw(&mut self, first: u32, count: u32) -> Result<(), BackendError>;

    fn present(&mut self) -> Result<(), BackendError>;

    fn resize(&mut self, _width: u32, _height: u32) {}
}
