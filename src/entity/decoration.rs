use cgmath::Vector3;

use crate::entity::{Behaviour, Body, Frame};

/// Scrolling towards -z with the run speed, wrapping back by `length` once
/// the body is behind `min_z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scroll {
    pub min_z: f32,
    pub length: f32,
}

/// Scenery: never collides, only spins and scrolls.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoration {
    /// Radians per second about each axis.
    pub spin: Vector3<f32>,
    pub scroll: Option<Scroll>,
}

impl Decoration {
    pub fn spinning(spin: [f32; 3]) -> Self {
        Self {
            spin: spin.into(),
            scroll: None,
        }
    }

    pub fn scrolling(scroll: Scroll) -> Self {
        Self {
            spin: Vector3::new(0.0, 0.0, 0.0),
            scroll: Some(scroll),
        }
    }

    pub fn with_spin(mut self, spin: [f32; 3]) -> Self {
        self.spin = spin.into();
        self
    }
}

impl Behaviour for Decoration {
    fn update(&mut self, body: &mut Body, frame: &Frame<'_>) {
        body.pose.rotation += self.spin * frame.dt;
        if let Some(scroll) = self.scroll {
            body.pose.position.z -= frame.speed * frame.dt;
            if scroll.length > 0.0 {
                while body.pose.position.z < scroll.min_z {
                    body.pose.position.z += scroll.length;
                }
            }
        }
    }
}
