//! run-ngin
//!
//! A small endless runner drawn straight through wgpu. The player dodges
//! obstacles across a few lanes while the world scrolls toward the camera.
//! Rendering goes through a tiny resource manager: named programs, named
//! vertex array contexts holding packed models, and a lazily recomputed
//! camera. Everything GPU-facing sits behind [`backend::GraphicsBackend`] so
//! the game also runs headless.
//!
//! High-level modules
//! - `backend`: the graphics interface, a wgpu implementation and a recording one
//! - `camera`: lazily recomputed view/projection and the per-draw matrices
//! - `context`: programs, vertex array contexts, the draw queue and model drawing
//! - `data_structures`: vertices, models, poses, GPU textures and geometry buffers
//! - `shader`: program compilation and uniform reflection
//! - `resources`: loading meshes, images, cubemaps and fonts from the assets directory
//! - `entity`, `lanes`, `collision`, `game`: the runner itself
//! - `skybox`, `text`: background cubemap and the HUD line
//! - `flow`: the frame loop, window integration and headless runs
//! - `config`, `logging`, `input`, `time`: ambient plumbing
//!

pub mod backend;
pub mod camera;
pub mod collision;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod entity;
pub mod error;
pub mod flow;
pub mod game;
pub mod input;
pub mod lanes;
pub mod logging;
pub mod pipelines;
pub mod resources;
pub mod shader;
pub mod skybox;
pub mod text;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use backend::{GraphicsBackend, gpu::WgpuBackend, recording::RecordingBackend};
pub use camera::Camera;
pub use config::GameConfig;
pub use context::RenderContext;
pub use error::{BackendError, LoadError, RenderError};
