//! Placement of a single entity in world space.

use cgmath::{Euler, Matrix4, Rad, Vector3, Zero};

/// Position plus Euler rotation (radians, applied X then Y then Z).
///
/// The world transform is `T(position) * R(rotation)`: the model is rotated
/// about its own origin before being moved into place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

impl Pose {
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        let rotation = Euler::new(
            Rad(self.rotation.x),
            Rad(self.rotation.y),
            Rad(self.rotation.z),
        );
        Matrix4::from_translation(self.position) * Matrix4::from(rotation)
    }
}

impl From<Vector3<f32>> for Pose {
    fn from(position: Vector3<f32>) -> Self {
        Pose {
            position,
            ..Default::default()
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;

    #[test]
    fn rotation_happens_before_translation() {
        let pose = Pose {
            position: Vector3::new(2.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
        };
        // +x rotated a quarter turn about y ends up on -z, then moves by +2 in x
        let p = pose.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 2.0).abs() < 1e-5);
        assert!((p.z + 1.0).abs() < 1e-5);
    }
}
