//! One line of HUD text, rasterized on the CPU and drawn as a textured quad.

use std::path::Path;

use cgmath::{Matrix4, Vector3};

use crate::{
    backend::{GraphicsBackend, RenderState},
    camera::Camera,
    context::{DEFAULT_VAO, RenderContext},
    error::{LoadError, RenderError},
    resources::font,
};

pub const HUD_VAO: &str = "hud";
pub const TEXT_PROGRAM: &str = "text";
pub const QUAD_MODEL: &str = "plane";

const CANVAS_WIDTH: u32 = 1024;
const CANVAS_HEIGHT: u32 = 128;
const GLYPH_PX: f32 = 72.0;
const TEXTURE_KEY: &str = "hud:text";

pub struct Hud {
    font: fontdue::Font,
    text: String,
    dirty: bool,
}

impl Hud {
    /// Sets up the `hud` vertex array context with the quad mesh and the text program.
    pub fn load<B: GraphicsBackend>(
        ctx: &mut RenderContext<B>,
        font_path: &Path,
    ) -> Result<Self, LoadError> {
        let font = font::load_font(font_path)?;
        ctx.create_program_with(TEXT_PROGRAM, RenderState::overlay())?;
        ctx.create_vao(HUD_VAO);
        ctx.use_vao(HUD_VAO)?;
        let loaded = ctx.load_models(&[QUAD_MODEL]);
        // the default context stays active for everything else
        ctx.use_vao(DEFAULT_VAO)?;
        loaded?;
        log::info!("HUD font {}", font_path.display());
        Ok(Self {
            font,
            text: String::new(),
            dirty: false,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The texture is only re-rasterized when the text changes.
    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            self.dirty = true;
        }
    }

    /// Draws the line across the top of the screen. Switches to the `hud`
    /// context and back to the default one.
    pub fn draw<B: GraphicsBackend>(
        &mut self,
        ctx: &mut RenderContext<B>,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        ctx.use_vao(HUD_VAO)?;
        let result = self.draw_quad(ctx, camera);
        ctx.use_vao(DEFAULT_VAO)?;
        result
    }

    fn draw_quad<B: GraphicsBackend>(
        &mut self,
        ctx: &mut RenderContext<B>,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        if self.dirty {
            let image = font::rasterize_line(
                &self.font,
                &self.text,
                GLYPH_PX,
                CANVAS_WIDTH,
                CANVAS_HEIGHT,
            );
            ctx.replace_texture(TEXTURE_KEY, &image)?;
            self.dirty = false;
        }
        let texture = ctx.geometry().texture(TEXTURE_KEY);

        ctx.use_program(TEXT_PROGRAM)?;
        ctx.draw_model(QUAD_MODEL, quad_transform(camera.aspect()), camera, texture)
    }
}

/// Places the unit quad (-1..1) near the top edge, keeping the canvas aspect.
fn quad_transform(screen_aspect: f32) -> Matrix4<f32> {
    let canvas_aspect = CANVAS_WIDTH as f32 / CANVAS_HEIGHT as f32;
    let sx = 0.9;
    let sy = sx * screen_aspect / canvas_aspect;
    Matrix4::from_translation(Vector3::new(0.0, 1.0 - sy - 0.05, 0.0))
        * Matrix4::from_nonuniform_scale(sx, sy, 1.0)
}
