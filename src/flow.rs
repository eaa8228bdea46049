//! Frame driver and window integration.
//!
//! [`GameLoop`] owns everything that lives for a whole session (render
//! context, camera, game, HUD) and runs one frame per [`GameLoop::step`]:
//!
//! 1. the draw queue is checked to be empty and the frame is cleared
//! 2. the game updates, resolves collisions and enqueues its draws
//! 3. skybox, queued models and HUD are drawn in that order
//! 4. the frame is presented and per-frame input edges are reset
//!
//! [`run`] drives a `GameLoop` from a winit event loop with the wgpu backend;
//! [`run_headless`] steps it a fixed number of frames on the recording backend.

use std::sync::Arc;

use anyhow::Context as _;
use cgmath::{Deg, Point3};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    backend::{GraphicsBackend, gpu::WgpuBackend, recording::RecordingBackend},
    camera::Camera,
    config::GameConfig,
    context::{DEFAULT_VAO, RenderContext},
    error::{LoadError, RenderError},
    game::{FrameReport, Game, Metrics, Status},
    input::{InputState, Key},
    resources::{self, font},
    skybox::{SKYBOX_MODEL, Skybox},
    text::Hud,
    time::FrameClock,
};

pub const MODEL_PROGRAM: &str = "model";
pub const GAME_MODELS: [&str; 3] = ["player", "obstacle", "ground"];

/// Fixed time step of headless runs.
pub const HEADLESS_DT: f32 = 1.0 / 60.0;

pub struct GameLoop<B: GraphicsBackend> {
    ctx: RenderContext<B>,
    camera: Camera,
    config: GameConfig,
    game: Game,
    skybox: Option<Skybox>,
    hud: Option<Hud>,
    input: InputState,
    frames: u64,
}

impl<B: GraphicsBackend> GameLoop<B> {
    /// Loads programs, meshes, the optional skybox and the optional HUD font.
    pub fn new(backend: B, config: GameConfig, width: u32, height: u32) -> Result<Self, LoadError> {
        let assets = resources::resolve_asset_root(&config.assets.root);
        log::info!("loading assets from {}", assets.display());
        let mut ctx = RenderContext::new(backend, assets)
            .with_clear_colour(config.render.clear_colour());

        ctx.create_program(MODEL_PROGRAM)?;

        let has_skybox = ctx.assets().join(&config.assets.skybox).is_dir()
            && ctx.assets().join(format!("{SKYBOX_MODEL}.obj")).is_file();
        let mut models = GAME_MODELS.to_vec();
        if has_skybox {
            models.push(SKYBOX_MODEL);
        }
        ctx.load_models(&models)?;

        let metrics = Metrics {
            player_radius: ctx.get_model("player")?.bounding_radius,
            obstacle_radius: ctx.get_model("obstacle")?.bounding_radius,
        };
        log::debug!("{:?}", metrics);

        let skybox = if has_skybox {
            Skybox::load(&mut ctx, &config.assets.skybox)?
        } else {
            log::warn!("skybox assets missing, drawing without a skybox");
            None
        };

        let hud = match font::find_font(ctx.assets(), &config.assets.font) {
            Some(path) => Some(Hud::load(&mut ctx, &path)?),
            None => {
                log::warn!("font `{}` not found, no HUD", config.assets.font);
                None
            }
        };

        let [px, py, pz] = config.camera.position;
        let [tx, ty, tz] = config.camera.target;
        let camera = Camera::new(
            Point3::new(px, py, pz),
            Point3::new(tx, ty, tz),
            Deg(config.camera.fov),
            width.max(1) as f32 / height.max(1) as f32,
        )
        .with_far(config.camera.far);

        let game = Game::new(&config, metrics);
        Ok(Self {
            ctx,
            camera,
            config,
            game,
            skybox,
            hud,
            input: InputState::new(),
            frames: 0,
        })
    }

    pub fn context(&self) -> &RenderContext<B> {
        &self.ctx
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn has_hud(&self) -> bool {
        self.hud.is_some()
    }

    /// Whether another frame should run: the window is open and the run has not ended.
    pub fn should_continue(&self, window_open: bool) -> bool {
        window_open && self.game.should_continue()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.resize(width, height);
        self.camera.resize(width, height);
    }

    pub fn step(&mut self, dt: f32) -> Result<FrameReport, RenderError> {
        self.ctx.begin_frame();
        self.ctx.clear();

        if self.game.status() == Status::GameOver && self.input.was_pressed(Key::Jump) {
            self.game.restart(&self.config);
        }

        let report = self.game.frame(dt, &self.input, self.ctx.queue_mut());

        if let Some(skybox) = &self.skybox {
            skybox.draw(&mut self.ctx, &self.camera)?;
        }

        self.ctx.use_vao(DEFAULT_VAO)?;
        self.ctx.use_program(MODEL_PROGRAM)?;
        self.ctx.render(&self.camera)?;

        if let Some(hud) = &mut self.hud {
            let line = match self.game.status() {
                Status::Running => format!(
                    "SCORE {}   HEALTH {}",
                    self.game.score(),
                    self.game.health()
                ),
                Status::GameOver => format!("GAME OVER   SCORE {}", self.game.score()),
            };
            hud.set_text(&line);
            hud.draw(&mut self.ctx, &self.camera)?;
        }

        self.ctx.present()?;
        self.input.end_frame();
        self.frames += 1;
        Ok(report)
    }

    pub fn shutdown(&mut self) {
        self.ctx.shutdown();
    }
}

/// Outcome of a headless run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub frames: u64,
    pub score: u32,
    pub health: u32,
    pub status: Status,
}

/// Steps the game `frames` times without a window, or until the run ends.
pub fn run_headless(config: GameConfig, frames: u64) -> anyhow::Result<Summary> {
    let (width, height) = (config.window.width, config.window.height);
    let mut game_loop = GameLoop::new(RecordingBackend::without_call_log(), config, width, height)
        .context("could not load the game")?;

    while game_loop.frames() < frames && game_loop.should_continue(true) {
        game_loop
            .step(HEADLESS_DT)
            .with_context(|| format!("frame {} failed", game_loop.frames()))?;
    }

    let summary = Summary {
        frames: game_loop.frames(),
        score: game_loop.game().score(),
        health: game_loop.game().health(),
        status: game_loop.game().status(),
    };
    game_loop.shutdown();
    Ok(summary)
}

struct Session {
    window: Arc<Window>,
    game_loop: GameLoop<WgpuBackend>,
    clock: FrameClock,
}

pub struct App {
    config: GameConfig,
    session: Option<Session>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            session: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Session> {
        let attributes = Window::default_attributes()
            .with_title(&self.config.window.title)
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("could not create the window")?,
        );
        let size = window.inner_size();

        let backend = WgpuBackend::new(window.clone()).context("could not set up wgpu")?;
        let game_loop = GameLoop::new(backend, self.config.clone(), size.width, size.height)
            .context("could not load the game")?;
        window.request_redraw();

        Ok(Session {
            window,
            game_loop,
            clock: FrameClock::new(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(session) => self.session = Some(session),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(session) = &mut self.session else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => session.game_loop.resize(size.width, size.height),
            WindowEvent::Focused(false) => session.game_loop.input_mut().clear(),
            WindowEvent::Focused(true) => session.clock.reset(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                } else {
                    session.game_loop.input_mut().handle_key_event(&event);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = session.clock.tick();
                match session.game_loop.step(dt) {
                    Ok(_) => session.window.request_redraw(),
                    Err(e) => {
                        let frame = session.game_loop.frames();
                        self.fail(
                            event_loop,
                            anyhow::Error::new(e).context(format!("frame {frame} failed")),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &mut self.session {
            log::info!(
                "leaving after {} frames, score {}",
                session.game_loop.frames(),
                session.game_loop.game().score()
            );
            session.game_loop.shutdown();
        }
    }
}

/// Opens the window and plays until it is closed.
pub fn run(config: GameConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
