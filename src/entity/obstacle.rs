use crate::{
    collision::Collider,
    entity::{Behaviour, Body, Frame},
};

/// Edge length of the obstacle mesh, which is centred on its origin.
pub const OBSTACLE_SIZE: f32 = 1.0;

const SPIN_SPEED: f32 = 1.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub lane: usize,
    pub radius: f32,
    /// The body dies once it is further than this behind the player.
    pub despawn_distance: f32,
    /// Set when the obstacle died by hitting the player rather than passing.
    pub consumed: bool,
}

impl Obstacle {
    pub fn new(lane: usize, radius: f32, despawn_distance: f32) -> Self {
        Self {
            lane,
            radius,
            despawn_distance,
            consumed: false,
        }
    }

    pub fn collider(&self, body: &Body) -> Collider {
        Collider {
            lane: self.lane,
            z: body.pose.position.z,
            elevation: body.pose.position.y - OBSTACLE_SIZE / 2.0,
            height: OBSTACLE_SIZE,
            radius: self.radius,
        }
    }

    pub fn consume(&mut self, body: &mut Body) {
        self.consumed = true;
        body.kill();
    }
}

impl Behaviour for Obstacle {
    fn update(&mut self, body: &mut Body, frame: &Frame<'_>) {
        body.pose.position.z -= frame.speed * frame.dt;
        body.pose.rotation.y += SPIN_SPEED * frame.dt;
        if body.pose.position.z < -self.despawn_distance {
            body.kill();
        }
    }
}
