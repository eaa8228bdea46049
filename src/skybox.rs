//! Cubemap background drawn around the camera.

use cgmath::{EuclideanSpace, Matrix4};

use crate::{
    backend::{GraphicsBackend, RenderState, TextureHandle},
    camera::Camera,
    context::{DEFAULT_VAO, RenderContext},
    error::{LoadError, RenderError},
};

pub const SKYBOX_PROGRAM: &str = "skybox";
pub const SKYBOX_MODEL: &str = "skybox";

pub struct Skybox {
    texture: TextureHandle,
}

impl Skybox {
    /// Compiles the skybox program and loads the cubemap in `dir` into the
    /// default vertex array context, which must already hold the `skybox` mesh.
    ///
    /// Returns `None` when `dir` does not exist below the assets directory.
    pub fn load<B: GraphicsBackend>(
        ctx: &mut RenderContext<B>,
        dir: &str,
    ) -> Result<Option<Self>, LoadError> {
        if !ctx.assets().join(dir).is_dir() {
            log::warn!("no cubemap directory `{}`, drawing without a skybox", dir);
            return Ok(None);
        }
        ctx.create_program_with(SKYBOX_PROGRAM, RenderState::skybox())?;
        let texture = ctx.load_cubemap(dir)?;
        Ok(Some(Self { texture }))
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Draws the box centred on the camera; leaves the skybox program active.
    pub fn draw<B: GraphicsBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        ctx.use_vao(DEFAULT_VAO)?;
        ctx.use_program(SKYBOX_PROGRAM)?;
        let transform = Matrix4::from_translation(camera.position().to_vec());
        ctx.draw_model(SKYBOX_MODEL, transform, camera, Some(self.texture))
    }
}
