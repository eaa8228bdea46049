use crate::{
    collision::Collider,
    entity::{Behaviour, Body, Frame},
    input::Key,
    lanes::{Easing, LaneSwitch, Lanes},
};

/// Height of the player mesh, whose origin sits at its feet.
pub const PLAYER_HEIGHT: f32 = 1.6;

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    lanes: Lanes,
    /// Lane the player is in or moving to.
    target_lane: usize,
    switch: Option<LaneSwitch>,
    switch_duration: f32,
    easing: Easing,
    vertical_velocity: f32,
    jump_velocity: f32,
    gravity: f32,
    health: u32,
    pub radius: f32,
}

impl Player {
    pub fn new(lanes: Lanes, switch_duration: f32, easing: Easing, health: u32) -> Self {
        let target_lane = lanes.centre();
        Self {
            lanes,
            target_lane,
            switch: None,
            switch_duration,
            easing,
            vertical_velocity: 0.0,
            jump_velocity: 7.0,
            gravity: 20.0,
            health,
            radius: 0.5,
        }
    }

    pub fn with_jump(mut self, jump_velocity: f32, gravity: f32) -> Self {
        self.jump_velocity = jump_velocity;
        self.gravity = gravity;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Lateral offset of the starting lane.
    pub fn start_x(&self) -> f32 {
        self.lanes.offset(self.target_lane)
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn target_lane(&self) -> usize {
        self.target_lane
    }

    pub fn is_switching(&self) -> bool {
        self.switch.is_some()
    }

    pub fn is_airborne(&self, body: &Body) -> bool {
        body.pose.position.y > 0.0
    }

    /// Lane the player occupies right now, the one closest to its x.
    pub fn lane(&self, body: &Body) -> usize {
        self.lanes.nearest(body.pose.position.x)
    }

    pub fn collider(&self, body: &Body) -> Collider {
        Collider {
            lane: self.lane(body),
            z: body.pose.position.z,
            elevation: body.pose.position.y,
            height: PLAYER_HEIGHT,
            radius: self.radius,
        }
    }

    /// Takes one point of damage; the body dies at zero health.
    pub fn hit(&mut self, body: &mut Body) {
        self.health = self.health.saturating_sub(1);
        log::debug!("player hit, {} health left", self.health);
        if self.health == 0 {
            body.kill();
        }
    }

    fn start_switch(&mut self, body: &Body, lane: usize) {
        if lane == self.target_lane {
            return;
        }
        self.target_lane = lane;
        self.switch = Some(LaneSwitch::new(
            body.pose.position.x,
            self.lanes.offset(lane),
            self.switch_duration,
            self.easing,
        ));
    }
}

impl Behaviour for Player {
    fn update(&mut self, body: &mut Body, frame: &Frame<'_>) {
        // the camera looks down +z, so screen-left is +x
        if frame.input.was_pressed(Key::Left) {
            self.start_switch(body, self.lanes.step_up(self.target_lane));
        }
        if frame.input.was_pressed(Key::Right) {
            self.start_switch(body, self.lanes.step_down(self.target_lane));
        }
        if let Some(switch) = &mut self.switch {
            body.pose.position.x = switch.advance(frame.dt);
            if switch.is_done() {
                self.switch = None;
            }
        }

        if frame.input.was_pressed(Key::Jump) && !self.is_airborne(body) {
            self.vertical_velocity = self.jump_velocity;
        }
        if self.vertical_velocity != 0.0 || self.is_airborne(body) {
            body.pose.position.y += self.vertical_velocity * frame.dt;
            self.vertical_velocity -= self.gravity * frame.dt;
            if body.pose.position.y <= 0.0 {
                body.pose.position.y = 0.0;
                self.vertical_velocity = 0.0;
            }
        }
    }
}
