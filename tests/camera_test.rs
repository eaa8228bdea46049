use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3, perspective};
use run_ngin::camera::{OPENGL_TO_WGPU_MATRIX, NEAR_PLANE};

use crate::common::test_utils::{assert_mat4_eq, camera};
mod common;

fn fresh_view(position: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    Matrix4::look_at_rh(position, target, Vector3::unit_y())
}

#[test]
fn reads_match_a_fresh_computation_after_every_change() {
    let mut camera = camera();

    camera.set_position(Point3::new(1.0, 4.0, -8.0));
    assert_mat4_eq(
        camera.view().into(),
        fresh_view(Point3::new(1.0, 4.0, -8.0), camera.target()).into(),
    );

    camera.set_target(Point3::new(0.0, 0.0, 20.0));
    assert_mat4_eq(
        camera.view().into(),
        fresh_view(camera.position(), Point3::new(0.0, 0.0, 20.0)).into(),
    );

    camera.set_fov(Deg(75.0));
    camera.resize(1920, 1080);
    let expected =
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(75.0), 1920.0 / 1080.0, NEAR_PLANE, camera.far());
    assert_mat4_eq(camera.projection().into(), expected.into());
}

#[test]
fn repeated_reads_are_stable() {
    let camera = camera();
    let first = camera.view();
    assert!(!camera.is_view_dirty());
    assert_eq!(camera.view(), first);
}

#[test]
fn zero_height_keeps_the_aspect() {
    let mut camera = camera();
    let aspect = camera.aspect();
    camera.projection();
    camera.resize(640, 0);
    assert_eq!(camera.aspect(), aspect);
    assert!(!camera.is_projection_dirty());
}

#[test]
fn uniforms_compose_model_view_projection() {
    let camera = camera().with_far(250.0);
    let model = Matrix4::from_translation(Vector3::new(-2.0, 0.0, 10.0));
    let u = camera.gen_uniforms(model);

    assert_eq!(u.m, model);
    assert_mat4_eq(u.mv.into(), (camera.view() * model).into());
    assert_mat4_eq(u.mvp.into(), (camera.projection() * camera.view() * model).into());
    assert_eq!(u.iter().count(), 5);
    assert!(u.iter().any(|(name, m)| name == "P" && m == camera.projection()));

    let identity = camera.gen_uniforms(Matrix4::identity());
    assert_mat4_eq(identity.mv.into(), camera.view().into());
}
