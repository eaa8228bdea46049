//! Data types shared by the renderer and the game:
//!
//! - `model` holds the vertex layout and where a model lives in its buffer
//! - `geometry` is a vertex array context: models, their buffer and textures
//! - `texture` contains the GPU texture wrapper used by the wgpu backend
//! - `instance` is an entity's placement in world space

pub mod geometry;
pub mod instance;
pub mod model;
pub mod texture;
