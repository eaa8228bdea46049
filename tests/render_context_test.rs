use cgmath::{Matrix4, SquareMatrix, Vector3};
use run_ngin::{
    backend::{UniformKind, recording::Call},
    error::{LoadError, RenderError},
};

use crate::common::test_utils::{Assets, QUAD_MTL, QUAD_OBJ, assert_mat4_eq, camera};
mod common;

#[test]
fn create_program_is_idempotent() {
    let assets = Assets::standard();
    let mut ctx = assets.context();

    let first = ctx.create_program("lit").unwrap();
    let (first_handle, first_uniforms) = (first.handle, first.uniforms.clone());
    let second = ctx.create_program("lit").unwrap();

    assert_eq!(first_handle, second.handle);
    assert_eq!(first_uniforms, second.uniforms);
    assert_eq!(first_uniforms.len(), 4);
    assert_eq!(ctx.backend().programs_compiled(), 1);
    assert_eq!(ctx.shaders().len(), 1);
}

#[test]
fn reflection_finds_uniform_offsets() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    let program = ctx.create_program("lit").unwrap();

    for (i, name) in ["M", "V", "MV", "MVP"].iter().enumerate() {
        let uniform = program.uniforms[*name];
        assert_eq!(uniform.kind, UniformKind::Mat4);
        assert_eq!(uniform.location, 64 * i as u32);
    }
    assert!(!program.uniforms.contains_key("P"));
}

#[test]
fn use_program_only_switches_on_change() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.create_program("lit").unwrap();
    ctx.create_program("flat").unwrap();
    ctx.backend_mut().take_calls();

    ctx.use_program("lit").unwrap();
    ctx.use_program("lit").unwrap();
    ctx.use_program("flat").unwrap();

    let switches = ctx
        .backend()
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::UseProgram(_)))
        .count();
    assert_eq!(switches, 2);
    assert_eq!(ctx.shaders().active_name(), Some("flat"));
}

#[test]
fn unknown_program_is_an_error() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    assert!(matches!(
        ctx.use_program("nope"),
        Err(RenderError::UnknownProgram(name)) if name == "nope"
    ));
}

#[test]
fn missing_shader_file_fails_to_load() {
    let assets = Assets::standard();
    assets.file("half.vert", "");
    let mut ctx = assets.context();
    assert!(matches!(ctx.create_program("half"), Err(LoadError::Io { .. })));
    assert_eq!(ctx.backend().programs_compiled(), 0);
}

#[test]
fn camera_uniforms_missing_from_a_program_are_skipped() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.create_program("flat").unwrap();
    ctx.use_program("flat").unwrap();

    let uniforms = camera().gen_uniforms(Matrix4::identity());
    ctx.update_uniforms(uniforms.iter()).unwrap();

    let writes = ctx
        .backend()
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::WriteUniform { .. }))
        .count();
    assert_eq!(writes, 1);
}

#[test]
fn unknown_and_mistyped_uniforms_are_errors() {
    let assets = Assets::standard();
    let mut ctx = assets.context();

    assert!(matches!(
        ctx.update_uniforms([("MVP", Matrix4::identity())]),
        Err(RenderError::NoActiveProgram)
    ));

    ctx.create_program("tinted").unwrap();
    ctx.use_program("tinted").unwrap();

    assert!(matches!(
        ctx.update_uniforms([("colour", Matrix4::identity())]),
        Err(RenderError::UnknownUniform { uniform, .. }) if uniform == "colour"
    ));
    assert!(matches!(
        ctx.update_uniforms([("tint", Matrix4::identity())]),
        Err(RenderError::UniformType { kind: UniformKind::Vec4, .. })
    ));
}

#[test]
fn textures_are_cached_per_path() {
    let assets = Assets::standard();
    assets.png("other.png", 2, 2, [0, 255, 0, 255]);
    let mut ctx = assets.context();

    let a = ctx.load_texture("other.png").unwrap();
    let b = ctx.load_texture("other.png").unwrap();

    assert_eq!(a, b);
    assert_eq!(ctx.backend().texture_uploads(), 1);
    assert_eq!(ctx.geometry().texture_count(), 1);
}

#[test]
fn models_share_one_buffer_with_consecutive_offsets() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.load_models(&["triangle", "quad"]).unwrap();

    let triangle = *ctx.get_model("triangle").unwrap();
    let quad = *ctx.get_model("quad").unwrap();
    assert_eq!(triangle.range(), 0..3);
    assert_eq!(quad.range(), 3..9);
    assert_eq!(ctx.geometry().vertex_count(), 9);
    assert_eq!(ctx.backend().live_buffers(), 1);

    assert!(triangle.texture.is_none());
    let texture = quad.texture.expect("quad has a diffuse texture");
    assert!(ctx.backend().is_live_texture(texture));
    assert!((quad.bounding_radius - 5.0f32.sqrt()).abs() < 1e-5);
}

#[test]
fn reloading_releases_the_previous_buffer_and_textures() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.load_models(&["quad"]).unwrap();
    let old_texture = ctx.get_model("quad").unwrap().texture.unwrap();
    ctx.backend_mut().take_calls();

    ctx.load_models(&["triangle"]).unwrap();

    let calls = ctx.backend().calls();
    let release_buffer = calls
        .iter()
        .position(|c| matches!(c, Call::ReleaseBuffer(_)))
        .unwrap();
    let release_texture = calls
        .iter()
        .position(|c| *c == Call::ReleaseTexture(old_texture))
        .unwrap();
    let create_buffer = calls
        .iter()
        .position(|c| matches!(c, Call::CreateBuffer { .. }))
        .unwrap();
    assert!(release_buffer < create_buffer);
    assert!(release_texture < create_buffer);

    assert_eq!(ctx.backend().live_buffers(), 1);
    assert_eq!(ctx.backend().live_textures(), 0);
    assert!(!ctx.backend().is_live_texture(old_texture));
    assert!(matches!(
        ctx.get_model("quad"),
        Err(RenderError::UnknownModel { .. })
    ));
}

#[test]
fn failed_reload_keeps_the_previous_models() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.load_models(&["quad"]).unwrap();

    assert!(ctx.load_models(&["quad", "missing"]).is_err());

    assert!(ctx.get_model("quad").is_ok());
    assert_eq!(ctx.backend().live_buffers(), 1);
    assert_eq!(ctx.backend().live_textures(), 1);
}

#[test]
fn reload_with_a_missing_texture_keeps_the_previous_models() {
    let assets = Assets::standard();
    assets.file(
        "broken.obj",
        &QUAD_OBJ.replace("mtllib quad.mtl", "mtllib broken.mtl"),
    );
    assets.file("broken.mtl", &QUAD_MTL.replace("quad.png", "nothere.png"));
    let mut ctx = assets.context();
    ctx.load_models(&["quad"]).unwrap();
    let before = *ctx.get_model("quad").unwrap();

    assert!(matches!(
        ctx.load_models(&["quad", "broken"]),
        Err(LoadError::Io { .. })
    ));

    assert!(ctx.get_model("broken").is_err());
    let after = ctx.get_model("quad").unwrap();
    assert_eq!(after.texture, before.texture);
    assert_eq!(after.offset, before.offset);
    assert_eq!(ctx.backend().live_buffers(), 1);
    assert_eq!(ctx.backend().live_textures(), 1);
}

#[test]
fn vertex_array_contexts_are_isolated() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.load_models(&["triangle"]).unwrap();

    ctx.create_vao("overlay");
    ctx.use_vao("overlay").unwrap();
    ctx.load_models(&["quad"]).unwrap();
    assert!(ctx.get_model("triangle").is_err());

    ctx.use_vao("default").unwrap();
    assert!(ctx.get_model("quad").is_err());
    assert_eq!(ctx.backend().live_buffers(), 2);

    assert!(matches!(
        ctx.use_vao("nowhere"),
        Err(RenderError::UnknownVao(_))
    ));
}

#[test]
fn render_drains_the_queue_in_order() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.create_program("lit").unwrap();
    ctx.use_program("lit").unwrap();
    ctx.load_models(&["triangle", "quad"]).unwrap();

    ctx.enqueue("quad", Matrix4::identity());
    ctx.enqueue("triangle", Matrix4::from_translation(Vector3::unit_x()));
    let drawn = ctx.render(&camera()).unwrap();

    assert_eq!(drawn, 2);
    assert!(ctx.queue_mut().is_empty());
    assert_eq!(ctx.backend().draws(), vec![(3, 6), (0, 3)]);

    let binds = ctx
        .backend()
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::BindVertexBuffer(_)))
        .count();
    assert_eq!(binds, 1);
}

#[test]
fn begin_frame_drops_stale_commands() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.create_program("lit").unwrap();
    ctx.use_program("lit").unwrap();
    ctx.load_models(&["triangle"]).unwrap();

    ctx.enqueue("triangle", Matrix4::identity());
    ctx.enqueue("triangle", Matrix4::identity());
    assert_eq!(ctx.queue_len(), 2);

    ctx.begin_frame();
    assert_eq!(ctx.queue_len(), 0);

    let drawn = ctx.render(&camera()).unwrap();
    assert_eq!(drawn, 0);
    assert!(ctx.backend().draws().is_empty());
}

#[test]
fn draw_writes_the_camera_matrices() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    let handle = ctx.create_program("lit").unwrap().handle;
    ctx.use_program("lit").unwrap();
    ctx.load_models(&["triangle"]).unwrap();

    let camera = camera();
    let transform = Matrix4::from_translation(Vector3::new(2.0, 0.0, 5.0));
    ctx.draw_model("triangle", transform, &camera, None).unwrap();

    let expected = camera.projection() * camera.view() * transform;
    let uniform = ctx.shaders().uniform("MVP").unwrap();
    let written = ctx.backend().read_mat4(handle, uniform).unwrap();
    assert_mat4_eq(written, expected.into());
}

#[test]
fn drawing_an_unknown_model_fails_without_a_draw() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.create_program("lit").unwrap();
    ctx.use_program("lit").unwrap();
    ctx.load_models(&["triangle"]).unwrap();

    ctx.enqueue("ghost", Matrix4::identity());
    assert!(matches!(
        ctx.render(&camera()),
        Err(RenderError::UnknownModel { model, .. }) if model == "ghost"
    ));
    assert!(ctx.backend().draws().is_empty());
}

#[test]
fn shutdown_releases_everything() {
    let assets = Assets::standard();
    let mut ctx = assets.context();
    ctx.load_models(&["quad"]).unwrap();
    ctx.create_vao("overlay");
    ctx.use_vao("overlay").unwrap();
    ctx.load_models(&["triangle"]).unwrap();

    ctx.shutdown();

    assert_eq!(ctx.backend().live_buffers(), 0);
    assert_eq!(ctx.backend().live_textures(), 0);
}
