//! wgpu implementation of [`GraphicsBackend`].
//!
//! Binding calls only update CPU-side state. Every [`draw`](GraphicsBackend::draw)
//! is recorded together with a snapshot of the active program's uniform block;
//! [`present`](GraphicsBackend::present) uploads all snapshots into one dynamic
//! uniform buffer and replays the draws in a single render pass.

use std::{collections::HashMap, ops::Range, sync::Arc};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    backend::{
        BufferHandle, GraphicsBackend, ProgramDesc, ProgramHandle, TextureHandle, TextureKind,
        Uniform,
    },
    data_structures::{
        model::ModelVertex,
        texture::{Texture, create_default_sampler},
    },
    error::BackendError,
    pipelines::basic,
};

const MIN_BLOCK_SIZE: u32 = 16;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct GpuTexture {
    kind: TextureKind,
    // keeps the texture alive as long as its bind group
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

struct GpuProgram {
    name: String,
    pipeline: wgpu::RenderPipeline,
    texture: TextureKind,
    block: Vec<u8>,
}

struct RecordedDraw {
    program: ProgramHandle,
    buffer: BufferHandle,
    texture: Option<TextureHandle>,
    vertices: Range<u32>,
    uniform_offset: u32,
}

/// The per-frame uniform buffer. Grows, never shrinks; bind groups are rebuilt on growth.
struct UniformRing {
    buffer: wgpu::Buffer,
    capacity: u64,
    bind_groups: HashMap<ProgramHandle, wgpu::BindGroup>,
}

/// Handles released during a frame. Their GPU objects stay alive until the
/// frame's draws have been submitted.
#[derive(Debug)]
struct Retired<H> {
    handles: Vec<H>,
}

impl<H> Default for Retired<H> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl<H: Copy + PartialEq> Retired<H> {
    /// Returns false if `handle` is not live or was already released.
    fn retire(&mut self, handle: H, live: bool) -> bool {
        if !live || self.contains(handle) {
            return false;
        }
        self.handles.push(handle);
        true
    }

    fn contains(&self, handle: H) -> bool {
        self.handles.contains(&handle)
    }

    fn drain(&mut self) -> std::vec::Drain<'_, H> {
        self.handles.drain(..)
    }
}

pub struct WgpuBackend {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: Texture,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layouts: HashMap<TextureKind, wgpu::BindGroupLayout>,
    default_textures: HashMap<TextureKind, GpuTexture>,
    uniform_alignment: u32,
    next_id: u32,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    textures: HashMap<TextureHandle, GpuTexture>,
    retired_buffers: Retired<BufferHandle>,
    retired_textures: Retired<TextureHandle>,
    programs: HashMap<ProgramHandle, GpuProgram>,
    active_program: Option<ProgramHandle>,
    bound_buffer: Option<BufferHandle>,
    bound_texture: Option<TextureHandle>,
    clear_colour: wgpu::Color,
    draws: Vec<RecordedDraw>,
    frame_uniforms: Vec<u8>,
    ring: Option<UniformRing>,
}

impl WgpuBackend {
    /// Sets up instance, surface, adapter and device for `window`.
    pub fn new(window: Arc<Window>) -> Result<Self, BackendError> {
        futures::executor::block_on(Self::new_async(window))
    }

    async fn new_async(window: Arc<Window>) -> Result<Self, BackendError> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendError::Adapter(e.to_string()))?;
        log::info!("adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("run42 device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| BackendError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and expect an sRGB surface to encode it.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| BackendError::Surface("no supported surface format".to_string()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let uniform_layout = basic::uniform_layout(&device);
        let texture_layouts: HashMap<_, _> = [TextureKind::D2, TextureKind::Cube]
            .into_iter()
            .map(|kind| (kind, basic::texture_layout(&device, kind)))
            .collect();

        let white = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let white_faces: [image::RgbaImage; 6] = std::array::from_fn(|_| white.clone());
        let mut default_textures = HashMap::new();
        default_textures.insert(
            TextureKind::D2,
            wrap_texture(
                &device,
                &texture_layouts[&TextureKind::D2],
                TextureKind::D2,
                Texture::create_white(&device, &queue),
            ),
        );
        default_textures.insert(
            TextureKind::Cube,
            wrap_texture(
                &device,
                &texture_layouts[&TextureKind::Cube],
                TextureKind::Cube,
                Texture::cube_from_faces(&device, &queue, &white_faces, Some("default cube")),
            ),
        );

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment;

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            uniform_layout,
            texture_layouts,
            default_textures,
            uniform_alignment,
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            retired_buffers: Retired::default(),
            retired_textures: Retired::default(),
            programs: HashMap::new(),
            active_program: None,
            bound_buffer: None,
            bound_texture: None,
            clear_colour: wgpu::Color::BLACK,
            draws: Vec::new(),
            frame_uniforms: Vec::new(),
            ring: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn add_texture(&mut self, kind: TextureKind, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.next_id());
        let wrapped = wrap_texture(&self.device, &self.texture_layouts[&kind], kind, texture);
        self.textures.insert(handle, wrapped);
        handle
    }

    fn configure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
    }

    /// Makes sure the uniform buffer holds this frame's snapshots and uploads them.
    fn upload_uniforms(&mut self) {
        let needed = (self.frame_uniforms.len() as u64).max(MIN_BLOCK_SIZE as u64);
        let grow = self.ring.as_ref().is_none_or(|ring| ring.capacity < needed);
        if grow {
            let capacity = needed.next_power_of_two();
            log::debug!("uniform buffer grows to {} bytes", capacity);
            self.ring = Some(UniformRing {
                buffer: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("frame uniforms"),
                    size: capacity,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                capacity,
                bind_groups: HashMap::new(),
            });
        }
        let Some(ring) = &mut self.ring else {
            return;
        };
        if !self.frame_uniforms.is_empty() {
            self.queue.write_buffer(&ring.buffer, 0, &self.frame_uniforms);
        }
        for draw in &self.draws {
            if ring.bind_groups.contains_key(&draw.program) {
                continue;
            }
            let Some(program) = self.programs.get(&draw.program) else {
                continue;
            };
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &ring.buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(program.block.len() as u64),
                    }),
                }],
                label: Some(&program.name),
            });
            ring.bind_groups.insert(draw.program, bind_group);
        }
    }

    fn end_frame(&mut self) {
        self.draws.clear();
        self.frame_uniforms.clear();
        for handle in self.retired_buffers.drain() {
            if let Some(gpu) = self.buffers.remove(&handle) {
                gpu.buffer.destroy();
            }
        }
        for handle in self.retired_textures.drain() {
            self.textures.remove(&handle);
        }
    }
}

fn wrap_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    kind: TextureKind,
    texture: Texture,
) -> GpuTexture {
    let sampler = texture
        .sampler
        .clone()
        .unwrap_or_else(|| create_default_sampler(device, wgpu::AddressMode::Repeat));
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: None,
    });
    GpuTexture {
        kind,
        _texture: texture,
        bind_group,
    }
}

fn align_to(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

impl GraphicsBackend for WgpuBackend {
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
    ) -> Result<BufferHandle, BackendError> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(
            handle,
            GpuBuffer {
                buffer,
                vertex_count: vertices.len() as u32,
            },
        );
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if !self.retired_buffers.retire(buffer, self.buffers.contains_key(&buffer)) {
            log::warn!("buffer #{} released twice", buffer.0);
        }
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &image::RgbaImage,
    ) -> Result<TextureHandle, BackendError> {
        let texture = Texture::from_rgba(&self.device, &self.queue, image, Some(label));
        Ok(self.add_texture(TextureKind::D2, texture))
    }

    fn create_cubemap(
        &mut self,
        label: &str,
        faces: &[image::RgbaImage; 6],
    ) -> Result<TextureHandle, BackendError> {
        let texture = Texture::cube_from_faces(&self.device, &self.queue, faces, Some(label));
        Ok(self.add_texture(TextureKind::Cube, texture))
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if !self.retired_textures.retire(texture, self.textures.contains_key(&texture)) {
            log::warn!("texture #{} released twice", texture.0);
        }
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError> {
        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}.vert", desc.name)),
            source: wgpu::ShaderSource::Wgsl(desc.vertex.into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}.frag", desc.name)),
            source: wgpu::ShaderSource::Wgsl(desc.fragment.into()),
        });
        let texture = desc.layout.texture.unwrap_or(TextureKind::D2);
        let pipeline = basic::mk_program_pipeline(
            &self.device,
            desc.name,
            self.config.format,
            &self.uniform_layout,
            &self.texture_layouts[&texture],
            &vertex,
            &fragment,
            desc.state,
        );
        let block_size = align_to(desc.layout.block_size.max(MIN_BLOCK_SIZE) as usize, 16);

        let handle = ProgramHandle(self.next_id());
        self.programs.insert(
            handle,
            GpuProgram {
                name: desc.name.to_string(),
                pipeline,
                texture,
                block: vec![0; block_size],
            },
        );
        Ok(handle)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.active_program = Some(program);
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.bound_buffer = Some(buffer);
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.bound_texture = texture;
    }

    fn write_uniform(&mut self, uniform: &Uniform, data: &[u8]) {
        let Some(program) = self
            .active_program
            .and_then(|handle| self.programs.get_mut(&handle))
        else {
            return;
        };
        let start = uniform.location as usize;
        let end = start + data.len();
        match program.block.get_mut(start..end) {
            Some(slot) => slot.copy_from_slice(data),
            None => log::warn!(
                "uniform write {}..{} is outside the block of `{}`",
                start,
                end,
                program.name
            ),
        }
    }

    fn clear(&mut self, colour: wgpu::Color) {
        self.clear_colour = colour;
        self.end_frame();
    }

    fn draw(&mut self, first: u32, count: u32) -> Result<(), BackendError> {
        let program_handle = self
            .active_program
            .ok_or_else(|| BackendError::InvalidDraw("no program in use".to_string()))?;
        let program = self
            .programs
            .get(&program_handle)
            .ok_or(BackendError::UnknownHandle {
                kind: "program",
                id: program_handle.0,
            })?;
        let buffer = self
            .bound_buffer
            .ok_or_else(|| BackendError::InvalidDraw("no vertex buffer bound".to_string()))?;
        let len = self
            .buffers
            .get(&buffer)
            .filter(|_| !self.retired_buffers.contains(buffer))
            .map(|b| b.vertex_count)
            .ok_or(BackendError::UnknownHandle {
                kind: "buffer",
                id: buffer.0,
            })?;
        if first + count > len {
            return Err(BackendError::InvalidDraw(format!(
                "vertices {}..{} are outside a buffer of {}",
                first,
                first + count,
                len
            )));
        }

        let offset = align_to(self.frame_uniforms.len(), self.uniform_alignment as usize);
        self.frame_uniforms.resize(offset, 0);
        self.frame_uniforms.extend_from_slice(&program.block);

        self.draws.push(RecordedDraw {
            program: program_handle,
            buffer,
            texture: self.bound_texture,
            vertices: first..first + count,
            uniform_offset: offset as u32,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.configure_surface();
                self.end_frame();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(BackendError::Surface("out of memory".to_string()));
            }
            Err(e) => {
                log::warn!("skipping frame: {}", e);
                self.end_frame();
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.upload_uniforms();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let Some(ring) = &self.ring {
                for draw in &self.draws {
                    let (Some(program), Some(buffer), Some(uniforms)) = (
                        self.programs.get(&draw.program),
                        self.buffers.get(&draw.buffer),
                        ring.bind_groups.get(&draw.program),
                    ) else {
                        continue;
                    };
                    // a texture of the wrong kind or a released one falls back to white
                    let texture = draw
                        .texture
                        .and_then(|t| self.textures.get(&t))
                        .filter(|t| t.kind == program.texture)
                        .or_else(|| self.default_textures.get(&program.texture));
                    let Some(texture) = texture else {
                        continue;
                    };

                    render_pass.set_pipeline(&program.pipeline);
                    render_pass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, buffer.buffer.slice(..));
                    render_pass.draw(draw.vertices.clone(), 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        self.end_frame();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.configure_surface();
    }
}
