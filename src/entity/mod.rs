//! Game entities.
//!
//! An [`Entity`] is a [`Body`] (pose, lifecycle, model) plus a [`Kind`] that
//! decides how the body moves. Updating mutates the pose only; drawing turns
//! the pose into a world transform and pushes it onto the draw queue.
//!
//! Lifecycle: an entity is alive until something calls [`Body::kill`]. Dead
//! entities are neither updated nor drawn, and the game removes them at the
//! end of the frame.

use cgmath::Matrix4;

use crate::{context::DrawQueue, data_structures::instance::Pose, input::InputState};

pub mod decoration;
pub mod obstacle;
pub mod player;

pub use decoration::{Decoration, Scroll};
pub use obstacle::Obstacle;
pub use player::Player;

/// Per-frame inputs every behaviour sees.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub dt: f32,
    pub input: &'a InputState,
    /// Current run speed, units per second towards -z.
    pub speed: f32,
}

pub trait Behaviour {
    fn update(&mut self, body: &mut Body, frame: &Frame<'_>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub pose: Pose,
    pub model: Option<String>,
    alive: bool,
}

impl Body {
    pub fn new(pose: Pose, model: Option<&str>) -> Self {
        Self {
            pose,
            model: model.map(str::to_string),
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn transform(&self) -> Matrix4<f32> {
        self.pose.to_matrix()
    }

    /// Enqueues the model at the current pose; bodies without a model draw nothing.
    pub fn draw(&self, queue: &mut DrawQueue) {
        if let Some(model) = &self.model {
            queue.push(model, self.transform());
        }
    }
}

#[derive(Clone, Debug)]
pub enum Kind {
    Player(Player),
    Obstacle(Obstacle),
    Decoration(Decoration),
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub body: Body,
    pub kind: Kind,
}

impl Entity {
    pub fn new(body: Body, kind: Kind) -> Self {
        Self { body, kind }
    }

    pub fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    pub fn update(&mut self, frame: &Frame<'_>) {
        if !self.body.is_alive() {
            return;
        }
        match &mut self.kind {
            Kind::Player(player) => player.update(&mut self.body, frame),
            Kind::Obstacle(obstacle) => obstacle.update(&mut self.body, frame),
            Kind::Decoration(decoration) => decoration.update(&mut self.body, frame),
        }
    }

    pub fn draw(&self, queue: &mut DrawQueue) {
        if self.body.is_alive() {
            self.body.draw(queue);
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            Kind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match &self.kind {
            Kind::Obstacle(obstacle) => Some(obstacle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_entities_do_not_draw() {
        let mut entity = Entity::new(
            Body::new(Pose::at(0.0, 0.0, 5.0), Some("obstacle")),
            Kind::Decoration(Decoration::spinning([0.0, 1.0, 0.0])),
        );
        let mut queue = DrawQueue::default();
        entity.draw(&mut queue);
        assert_eq!(queue.len(), 1);

        entity.body.kill();
        queue.clear();
        entity.draw(&mut queue);
        assert!(queue.is_empty());
    }
}
