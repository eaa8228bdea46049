//! Perspective camera with lazily derived view and projection matrices.

use std::cell::Cell;

use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3, perspective};

/// wgpu clips depth to `0..1`, cgmath builds projections for `-1..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const NEAR_PLANE: f32 = 0.1;
pub const DEFAULT_FAR_PLANE: f32 = 100.0;

/// Uniform names a program may declare to receive camera matrices.
pub const CAMERA_UNIFORMS: [&str; 5] = ["M", "V", "MV", "MVP", "P"];

/// The matrices written for one draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraUniforms {
    pub m: Matrix4<f32>,
    pub v: Matrix4<f32>,
    pub mv: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    pub p: Matrix4<f32>,
}

impl CameraUniforms {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Matrix4<f32>)> {
        CAMERA_UNIFORMS
            .into_iter()
            .zip([self.m, self.v, self.mv, self.mvp, self.p])
    }
}

/**
 * A look-at camera.
 *
 * Setters only mark the derived matrix they invalidate; [`view`](Self::view)
 * and [`projection`](Self::projection) rebuild it on the next read. Reads are
 * therefore always equal to a fresh computation from the current fields.
 */
#[derive(Debug)]
pub struct Camera {
    position: Point3<f32>,
    target: Point3<f32>,
    fov: Deg<f32>,
    aspect: f32,
    near: f32,
    far: f32,
    view: Cell<Matrix4<f32>>,
    projection: Cell<Matrix4<f32>>,
    dirty_view: Cell<bool>,
    dirty_projection: Cell<bool>,
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>, fov: Deg<f32>, aspect: f32) -> Self {
        Self {
            position,
            target,
            fov,
            aspect,
            near: NEAR_PLANE,
            far: DEFAULT_FAR_PLANE,
            view: Cell::new(Matrix4::identity()),
            projection: Cell::new(Matrix4::identity()),
            dirty_view: Cell::new(true),
            dirty_projection: Cell::new(true),
        }
    }

    pub fn with_far(mut self, far: f32) -> Self {
        self.far = far;
        self.dirty_projection.set(true);
        self
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn fov(&self) -> Deg<f32> {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.dirty_view.set(true);
    }

    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
        self.dirty_view.set(true);
    }

    pub fn set_fov(&mut self, fov: Deg<f32>) {
        self.fov = fov;
        self.dirty_projection.set(true);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.dirty_projection.set(true);
    }

    /// Convenience for window resizes; a zero height keeps the old aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }

    pub fn is_view_dirty(&self) -> bool {
        self.dirty_view.get()
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.dirty_projection.get()
    }

    pub fn view(&self) -> Matrix4<f32> {
        if self.dirty_view.replace(false) {
            self.view.set(Matrix4::look_at_rh(
                self.position,
                self.target,
                Vector3::unit_y(),
            ));
        }
        self.view.get()
    }

    pub fn projection(&self) -> Matrix4<f32> {
        if self.dirty_projection.replace(false) {
            self.projection.set(
                OPENGL_TO_WGPU_MATRIX * perspective(self.fov, self.aspect, self.near, self.far),
            );
        }
        self.projection.get()
    }

    /// Matrices for drawing a model placed by `model`.
    pub fn gen_uniforms(&self, model: Matrix4<f32>) -> CameraUniforms {
        let v = self.view();
        let p = self.projection();
        let mv = v * model;
        CameraUniforms {
            m: model,
            v,
            mv,
            mvp: p * mv,
            p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_clear_the_dirty_flags() {
        let mut camera = Camera::new(
            Point3::new(0.0, 3.0, -6.0),
            Point3::new(0.0, 0.0, 4.0),
            Deg(60.0),
            16.0 / 9.0,
        );
        assert!(camera.is_view_dirty() && camera.is_projection_dirty());
        camera.gen_uniforms(Matrix4::identity());
        assert!(!camera.is_view_dirty() && !camera.is_projection_dirty());

        camera.set_aspect(1.0);
        assert!(!camera.is_view_dirty());
        assert!(camera.is_projection_dirty());
    }
}
