//! Vertex layout and per-model placement inside a vertex buffer.

use std::ops::Range;

use crate::backend::TextureHandle;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One interleaved vertex in the T2F_N3F_V3F layout: 8 floats, 32 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub position: [f32; 3],
}

pub const FLOATS_PER_VERTEX: usize = 8;

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Where a named model lives in its vertex array context.
///
/// Immutable after load. Handles inside are only valid until the owning
/// context reloads.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Model {
    pub offset: u32,
    pub vertex_count: u32,
    pub texture: Option<TextureHandle>,
    pub bounding_radius: f32,
}

impl Model {
    pub fn range(&self) -> Range<u32> {
        self.offset..self.offset + self.vertex_count
    }
}

/// Largest distance of any vertex from the model origin in the x/z plane.
pub fn bounding_radius(vertices: &[ModelVertex]) -> f32 {
    vertices
        .iter()
        .map(|v| v.position[0] * v.position[0] + v.position[2] * v.position[2])
        .fold(0.0f32, f32::max)
        .sqrt()
}
