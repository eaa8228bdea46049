use run_ngin::{
    backend::recording::RecordingBackend,
    context::{DEFAULT_VAO, RenderContext},
    flow::{GameLoop, HEADLESS_DT, run_headless},
    game::Status,
    input::Key,
    text::{HUD_VAO, Hud},
};

use crate::common::test_utils::{camera, game_config};
mod common;

#[test]
fn shipped_assets_load_and_render() {
    let mut game_loop = GameLoop::new(RecordingBackend::new(), game_config(), 800, 600).unwrap();
    assert!(game_loop.has_hud());

    let report = game_loop.step(HEADLESS_DT).unwrap();

    assert_eq!(report.status, Status::Running);
    assert!(report.drawn > 0);
    let backend = game_loop.context().backend();
    assert_eq!(backend.frames(), 1);
    // skybox, queued models and the HUD quad
    assert!(backend.draws().len() >= report.drawn + 2);
    assert_eq!(backend.programs_compiled(), 3);
}

#[test]
fn draw_queue_is_empty_after_every_frame() {
    let mut game_loop = GameLoop::new(RecordingBackend::new(), game_config(), 800, 600).unwrap();
    for frame in 0..5 {
        let report = game_loop.step(HEADLESS_DT).unwrap();
        assert!(report.drawn > 0);
        assert_eq!(game_loop.context().queue_len(), 0, "frame {frame}");
    }
    assert_eq!(game_loop.frames(), 5);
    assert_eq!(game_loop.context().backend().frames(), 5);
}

#[test]
fn collision_ends_the_run_and_jump_restarts_it() {
    let mut config = game_config();
    config.gameplay.health = 1;
    let mut game_loop = GameLoop::new(RecordingBackend::new(), config, 800, 600).unwrap();
    let centre = game_loop.game().player().as_player().unwrap().target_lane();
    game_loop.game_mut().spawn_obstacle(centre, 3.0);

    let mut frames = 0;
    while game_loop.should_continue(true) && frames < 120 {
        game_loop.step(HEADLESS_DT).unwrap();
        frames += 1;
    }
    assert_eq!(game_loop.game().status(), Status::GameOver);
    assert!(!game_loop.should_continue(true));

    // the end screen keeps rendering
    game_loop.step(HEADLESS_DT).unwrap();
    assert_eq!(game_loop.game().status(), Status::GameOver);

    game_loop.input_mut().press(Key::Jump);
    let report = game_loop.step(HEADLESS_DT).unwrap();
    assert_eq!(report.status, Status::Running);
    assert_eq!(game_loop.game().health(), 1);
}

#[test]
fn closed_window_stops_the_loop() {
    let game_loop = GameLoop::new(RecordingBackend::new(), game_config(), 800, 600).unwrap();
    assert!(game_loop.should_continue(true));
    assert!(!game_loop.should_continue(false));
}

#[test]
fn resize_updates_the_camera_aspect() {
    let mut game_loop = GameLoop::new(RecordingBackend::new(), game_config(), 800, 600).unwrap();
    game_loop.resize(1000, 500);
    assert_eq!(game_loop.camera().aspect(), 2.0);
    game_loop.resize(0, 0);
    assert_eq!(game_loop.camera().aspect(), 2.0);
}

#[test]
fn headless_run_reports_a_summary() {
    let summary = run_headless(game_config(), 30).unwrap();
    assert_eq!(summary.frames, 30);
    assert_eq!(summary.status, Status::Running);
    assert_eq!(summary.health, 3);
    assert!(summary.score >= 3);
}

#[test]
fn long_runs_keep_no_call_log() {
    let mut game_loop =
        GameLoop::new(RecordingBackend::without_call_log(), game_config(), 800, 600).unwrap();
    for _ in 0..120 {
        game_loop.step(HEADLESS_DT).unwrap();
    }
    let backend = game_loop.context().backend();
    assert!(backend.calls().is_empty());
    assert_eq!(backend.frames(), 120);
    assert!(backend.draw_count() >= 120);
}

#[test]
fn missing_assets_fail_to_load() {
    let empty = tempfile::tempdir().unwrap();
    let mut config = game_config();
    config.assets.root = empty.path().to_path_buf();
    assert!(matches!(
        GameLoop::new(RecordingBackend::new(), config, 800, 600),
        Err(run_ngin::error::LoadError::Io { .. })
    ));
}

#[test]
fn failed_hud_draw_switches_back_to_the_default_context() {
    let assets = game_config().assets.root;
    let mut ctx = RenderContext::new(RecordingBackend::new(), assets.clone());
    let mut hud = Hud::load(&mut ctx, &assets.join("font.ttf")).unwrap();
    assert_eq!(ctx.active_vao(), DEFAULT_VAO);

    // drop the quad from the hud context so the draw fails
    ctx.use_vao(HUD_VAO).unwrap();
    ctx.load_models(&["obstacle"]).unwrap();
    ctx.use_vao(DEFAULT_VAO).unwrap();

    hud.set_text("SCORE 1");
    assert!(hud.draw(&mut ctx, &camera()).is_err());
    assert_eq!(ctx.active_vao(), DEFAULT_VAO);
}
