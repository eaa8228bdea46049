//! Headless backend: no GPU, just bookkeeping.
//!
//! Used by `--headless` runs and by the test-suite. It validates draws the
//! same way a GPU would reject them (no program, no buffer, range outside the
//! buffer) and keeps enough state to answer "how many buffers are alive" or
//! "what ended up in uniform `MVP`".

use std::collections::HashMap;

use crate::{
    backend::{
        BufferHandle, GraphicsBackend, ProgramDesc, ProgramHandle, TextureHandle, TextureKind,
        Uniform,
    },
    data_structures::model::ModelVertex,
    error::BackendError,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateBuffer { buffer: BufferHandle, vertices: u32 },
    ReleaseBuffer(BufferHandle),
    CreateTexture { texture: TextureHandle, width: u32, height: u32 },
    CreateCubemap { texture: TextureHandle, size: u32 },
    ReleaseTexture(TextureHandle),
    CreateProgram { program: ProgramHandle, name: String },
    UseProgram(ProgramHandle),
    BindVertexBuffer(BufferHandle),
    BindTexture(Option<TextureHandle>),
    WriteUniform { location: u32, len: usize },
    Clear,
    Draw { first: u32, count: u32 },
    Present,
}

struct RecordedProgram {
    name: String,
    block: Vec<u8>,
}

pub struct RecordingBackend {
    next_id: u32,
    buffers: HashMap<BufferHandle, u32>,
    textures: HashMap<TextureHandle, TextureKind>,
    programs: HashMap<ProgramHandle, RecordedProgram>,
    active_program: Option<ProgramHandle>,
    bound_buffer: Option<BufferHandle>,
    bound_texture: Option<TextureHandle>,
    texture_uploads: usize,
    frames: u64,
    draws: u64,
    record_calls: bool,
    calls: Vec<Call>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            active_program: None,
            bound_buffer: None,
            bound_texture: None,
            texture_uploads: 0,
            frames: 0,
            draws: 0,
            record_calls: true,
            calls: Vec::new(),
        }
    }

    /// Keeps the bookkeeping but no call log, for long headless runs.
    pub fn without_call_log() -> Self {
        Self {
            record_calls: false,
            ..Self::new()
        }
    }

    pub fn records_calls(&self) -> bool {
        self.record_calls
    }

    fn record(&mut self, call: Call) {
        if self.record_calls {
            self.record(call);
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn is_live_texture(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture)
    }

    pub fn texture_kind(&self, texture: TextureHandle) -> Option<TextureKind> {
        self.textures.get(&texture).copied()
    }

    /// Number of times pixel data was uploaded, cubemaps count once.
    pub fn texture_uploads(&self) -> usize {
        self.texture_uploads
    }

    pub fn programs_compiled(&self) -> usize {
        self.programs.len()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws accepted so far, counted whether or not calls are logged.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw { first, count } => Some((*first, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_block(&self, program: ProgramHandle) -> Option<&[u8]> {
        self.programs.get(&program).map(|p| p.block.as_slice())
    }

    /// Reads back a mat4 uniform of `program` in column-major order.
    pub fn read_mat4(&self, program: ProgramHandle, uniform: &Uniform) -> Option<[[f32; 4]; 4]> {
        let block = self.uniform_block(program)?;
        let start = uniform.location as usize;
        let bytes = block.get(start..start + 64)?;
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let mut out = [[0.0; 4]; 4];
        for (i, column) in out.iter_mut().enumerate() {
            column.copy_from_slice(&floats[i * 4..i * 4 + 4]);
        }
        Some(out)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_vertex_buffer(
        &mut self,
        _label: &str,
        vertices: &[ModelVertex],
    ) -> Result<BufferHandle, BackendError> {
        let buffer = BufferHandle(self.next_id());
        let count = vertices.len() as u32;
        self.buffers.insert(buffer, count);
        self.record(Call::CreateBuffer {
            buffer,
            vertices: count,
        });
        Ok(buffer)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("buffer #{} released twice", buffer.0);
        }
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        self.record(Call::ReleaseBuffer(buffer));
    }

    fn create_texture(
        &mut self,
        _label: &str,
        image: &image::RgbaImage,
    ) -> Result<TextureHandle, BackendError> {
        let texture = TextureHandle(self.next_id());
        self.textures.insert(texture, TextureKind::D2);
        self.texture_uploads += 1;
        self.record(Call::CreateTexture {
            texture,
            width: image.width(),
            height: image.height(),
        });
        Ok(texture)
    }

    fn create_cubemap(
        &mut self,
        _label: &str,
        faces: &[image::RgbaImage; 6],
    ) -> Result<TextureHandle, BackendError> {
        let texture = TextureHandle(self.next_id());
        self.textures.insert(texture, TextureKind::Cube);
        self.texture_uploads += 1;
        self.record(Call::CreateCubemap {
            texture,
            size: faces[0].width(),
        });
        Ok(texture)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("texture #{} released twice", texture.0);
        }
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        self.record(Call::ReleaseTexture(texture));
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, BackendError> {
        let program = ProgramHandle(self.next_id());
        self.programs.insert(
            program,
            RecordedProgram {
                name: desc.name.to_string(),
                block: vec![0; desc.layout.block_size as usize],
            },
        );
        self.record(Call::CreateProgram {
            program,
            name: desc.name.to_string(),
        });
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.active_program = Some(program);
        self.record(Call::UseProgram(program));
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.bound_buffer = Some(buffer);
        self.record(Call::BindVertexBuffer(buffer));
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.bound_texture = texture;
        self.record(Call::BindTexture(texture));
    }

    fn write_uniform(&mut self, uniform: &Uniform, data: &[u8]) {
        if let Some(program) = self
            .active_program
            .and_then(|handle| self.programs.get_mut(&handle))
        {
            let start = uniform.location as usize;
            let end = start + data.len();
            if end <= program.block.len() {
                program.block[start..end].copy_from_slice(data);
            } else {
                log::warn!(
                    "uniform write {}..{} is outside the block of `{}`",
                    start,
                    end,
                    program.name
                );
            }
        }
        self.record(Call::WriteUniform {
            location: uniform.location,
            len: data.len(),
        });
    }

    fn clear(&mut self, _colour: wgpu::Color) {
        self.record(Call::Clear);
    }

    fn draw(&mut self, first: u32, count: u32) -> Result<(), BackendError> {
        if self.active_program.is_none() {
            return Err(BackendError::InvalidDraw("no program in use".to_string()));
        }
        let buffer = self
            .bound_buffer
            .ok_or_else(|| BackendError::InvalidDraw("no vertex buffer bound".to_string()))?;
        let len = self
            .buffers
            .get(&buffer)
            .copied()
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
        self.draws += 1;
        self.record(Call::Draw { first, count });
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.frames += 1;
        self.record(Call::Present);
        Ok(())
    }
}
