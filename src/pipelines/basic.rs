use crate::{
    backend::{Cull, DepthTest, RenderState, TextureKind},
    data_structures::{
        model::{self, Vertex},
        texture::Texture,
    },
    shader::reflect::{FRAGMENT_ENTRY, VERTEX_ENTRY},
};

/// Group 0: the program's uniform block, addressed with a dynamic offset per draw.
pub fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("uniform_block_layout"),
    })
}

/// Group 1: one texture and its sampler.
pub fn texture_layout(device: &wgpu::Device, kind: TextureKind) -> wgpu::BindGroupLayout {
    let view_dimension = match kind {
        TextureKind::D2 => wgpu::TextureViewDimension::D2,
        TextureKind::Cube => wgpu::TextureViewDimension::Cube,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some(match kind {
            TextureKind::D2 => "texture_2d_layout",
            TextureKind::Cube => "texture_cube_layout",
        }),
    })
}

pub fn mk_program_pipeline(
    device: &wgpu::Device,
    label: &str,
    color_format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    state: RenderState,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[uniform_layout, texture_layout],
        immediate_size: 0,
    });

    let blend = if state.alpha_blend {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };

    mk_render_pipeline(
        device,
        label,
        &layout,
        color_format,
        Some(blend),
        Some(Texture::DEPTH_FORMAT),
        &[model::ModelVertex::desc()],
        vertex,
        fragment,
        state,
    )
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    state: RenderState,
) -> wgpu::RenderPipeline {
    let cull_mode = match state.cull {
        Cull::None => None,
        Cull::Front => Some(wgpu::Face::Front),
        Cull::Back => Some(wgpu::Face::Back),
    };
    let depth_compare = match state.depth_test {
        DepthTest::Less => wgpu::CompareFunction::Less,
        DepthTest::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthTest::Always => wgpu::CompareFunction::Always,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some(VERTEX_ENTRY),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: state.depth_write,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
