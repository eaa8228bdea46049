use run_ngin::{
    backend::{ShaderStage, TextureKind},
    error::LoadError,
    resources::{mesh, texture},
};

use crate::common::test_utils::{Assets, FLAT_FRAG, FLAT_VERT, NO_TEXCOORDS_OBJ, face_colour};
mod common;

#[test]
fn mesh_without_texture_coordinates_is_rejected() {
    let assets = Assets::new();
    assets.file("bare.obj", NO_TEXCOORDS_OBJ);

    let err = mesh::load_mesh(assets.path(), "bare").unwrap_err();
    assert!(matches!(err, LoadError::VertexLayout { model, .. } if model == "bare"));
}

#[test]
fn missing_mesh_reports_the_path() {
    let assets = Assets::new();
    match mesh::load_mesh(assets.path(), "ghost") {
        Err(LoadError::Io { path, .. }) => assert!(path.ends_with("ghost.obj")),
        other => panic!("unexpected {:?}", other.map(|m| m.vertices.len())),
    }
}

#[test]
fn texture_v_is_flipped() {
    let assets = Assets::standard();
    let mesh = mesh::load_mesh(assets.path(), "triangle").unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    // vt 0.0 1.0 on the third corner
    assert_eq!(mesh.vertices[2].tex_coords, [0.0, 0.0]);
    assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
}

#[test]
fn cubemap_faces_load_in_fixed_order() {
    let assets = Assets::new();
    assets.cubemap("sky", 8);

    let faces = texture::load_cube_faces(&assets.path().join("sky")).unwrap();
    for (i, face) in faces.iter().enumerate() {
        assert_eq!(face.get_pixel(0, 0).0, face_colour(i), "face {}", texture::CUBE_FACES[i]);
    }
}

#[test]
fn cubemap_faces_must_be_square_and_equal() {
    let assets = Assets::new();
    assets.cubemap("sky", 8);
    assets.png("sky/top.png", 16, 16, [0, 0, 255, 255]);
    assert!(matches!(
        texture::load_cube_faces(&assets.path().join("sky")),
        Err(LoadError::Cubemap { .. })
    ));

    let assets = Assets::new();
    assets.cubemap("wide", 8);
    for face in texture::CUBE_FACES {
        assets.png(&format!("wide/{face}.png"), 8, 4, [0, 0, 0, 255]);
    }
    assert!(matches!(
        texture::load_cube_faces(&assets.path().join("wide")),
        Err(LoadError::Cubemap { .. })
    ));
}

#[test]
fn cubemap_with_a_missing_face_fails() {
    let assets = Assets::new();
    assets.cubemap("sky", 8);
    std::fs::remove_file(assets.path().join("sky/back.png")).unwrap();

    match texture::load_cube_faces(&assets.path().join("sky")) {
        Err(LoadError::Cubemap { reason, .. }) => assert!(reason.contains("back")),
        other => panic!("expected a cubemap error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn cubemaps_are_cached_and_uploaded_as_cube_textures() {
    let assets = Assets::new();
    assets.cubemap("sky", 4);
    let mut ctx = assets.context();

    let a = ctx.load_cubemap("sky").unwrap();
    let b = ctx.load_cubemap("sky").unwrap();

    assert_eq!(a, b);
    assert_eq!(ctx.backend().texture_uploads(), 1);
    assert_eq!(ctx.backend().texture_kind(a), Some(TextureKind::Cube));
}

#[test]
fn shader_syntax_errors_name_the_stage() {
    let assets = Assets::new();
    assets.shader("broken", FLAT_VERT, "@fragment fn fs_main( -> {");
    let mut ctx = assets.context();

    match ctx.create_program("broken") {
        Err(LoadError::Shader { program, stage, .. }) => {
            assert_eq!(program, "broken");
            assert_eq!(stage, ShaderStage::Fragment);
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("broken shader compiled"),
    }
    assert_eq!(ctx.backend().programs_compiled(), 0);
}

#[test]
fn missing_entry_point_fails_to_link() {
    let assets = Assets::new();
    let renamed = FLAT_VERT.replace("vs_main", "main");
    assets.shader("renamed", &renamed, FLAT_FRAG);
    let mut ctx = assets.context();

    assert!(matches!(
        ctx.create_program("renamed"),
        Err(LoadError::Link { .. })
    ));
}
