//! Game state: the player, obstacles, scenery, scoring and the run speed.
//!
//! A frame runs in fixed phases: every entity updates, collisions resolve,
//! every entity draws, dead entities are swept. Nothing is removed while the
//! entity list is being iterated.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    collision,
    config::{GameConfig, GameplayConfig},
    context::DrawQueue,
    data_structures::instance::Pose,
    entity::{Body, Decoration, Entity, Frame, Kind, Obstacle, Player, Scroll, obstacle},
    input::InputState,
    lanes::Lanes,
};

/// Length along z of one ground tile.
pub const GROUND_TILE_LENGTH: f32 = 10.0;

/// Shortest time between two spawned obstacles.
pub const MIN_SPAWN_GAP: f32 = 0.05;

const PILLAR_SPACING: f32 = 12.0;
const PILLAR_OFFSET: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    GameOver,
}

/// Sizes taken from the loaded models.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub player_radius: f32,
    pub obstacle_radius: f32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            player_radius: 0.4,
            obstacle_radius: obstacle::OBSTACLE_SIZE / 2.0,
        }
    }
}

/// What happened during one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub status: Status,
    pub hits: u32,
    pub spawned: u32,
    pub removed: usize,
    pub drawn: usize,
}

pub struct Game {
    gameplay: GameplayConfig,
    lanes: Lanes,
    metrics: Metrics,
    player: Entity,
    entities: Vec<Entity>,
    rng: StdRng,
    status: Status,
    speed: f32,
    distance: f32,
    dodged: u32,
    spawn_timer: f32,
}

impl Game {
    pub fn new(config: &GameConfig, metrics: Metrics) -> Self {
        let seed = config.gameplay.seed.unwrap_or_else(rand::random);
        log::info!("new run, obstacle seed {}", seed);

        let lanes = Lanes::new(config.lanes.offsets.clone());
        let mut game = Self {
            gameplay: config.gameplay.clone(),
            player: Self::spawn_player(config, &lanes, metrics),
            lanes,
            metrics,
            entities: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            status: Status::Running,
            speed: config.gameplay.speed,
            distance: 0.0,
            dodged: 0,
            spawn_timer: config.gameplay.spawn_interval,
        };
        game.spawn_scenery();
        game
    }

    fn spawn_player(config: &GameConfig, lanes: &Lanes, metrics: Metrics) -> Entity {
        let player = Player::new(
            lanes.clone(),
            config.lanes.switch_duration,
            config.lanes.easing,
            config.gameplay.health,
        )
        .with_jump(config.gameplay.jump_velocity, config.gameplay.gravity)
        .with_radius(metrics.player_radius);
        let body = Body::new(Pose::at(player.start_x(), 0.0, 0.0), Some("player"));
        Entity::new(body, Kind::Player(player))
    }

    /// Ground tiles and pillars that scroll past and wrap around.
    fn spawn_scenery(&mut self) {
        let behind = self.gameplay.despawn_distance + GROUND_TILE_LENGTH;
        let span = behind + self.gameplay.spawn_distance + GROUND_TILE_LENGTH;

        let tiles = (span / GROUND_TILE_LENGTH).ceil() as usize;
        let scroll = Scroll {
            min_z: -behind,
            length: tiles as f32 * GROUND_TILE_LENGTH,
        };
        for i in 0..tiles {
            let z = -behind + GROUND_TILE_LENGTH * (i as f32 + 0.5);
            self.entities.push(Entity::new(
                Body::new(Pose::at(0.0, 0.0, z), Some("ground")),
                Kind::Decoration(Decoration::scrolling(scroll)),
            ));
        }

        let pillars = (span / PILLAR_SPACING).ceil() as usize;
        let scroll = Scroll {
            min_z: -behind,
            length: pillars as f32 * PILLAR_SPACING,
        };
        for i in 0..pillars {
            let z = -behind + PILLAR_SPACING * i as f32;
            for x in [-PILLAR_OFFSET, PILLAR_OFFSET] {
                self.entities.push(Entity::new(
                    Body::new(Pose::at(x, 2.0, z), Some("obstacle")),
                    Kind::Decoration(Decoration::scrolling(scroll).with_spin([0.4, 1.0, 0.0])),
                ));
            }
        }
    }

    /// Starts over with fresh state; the RNG keeps going so the next run differs.
    pub fn restart(&mut self, config: &GameConfig) {
        self.player = Self::spawn_player(config, &self.lanes, self.metrics);
        self.entities.clear();
        self.status = Status::Running;
        self.speed = self.gameplay.speed;
        self.distance = 0.0;
        self.dodged = 0;
        self.spawn_timer = self.gameplay.spawn_interval;
        self.spawn_scenery();
        log::info!("run restarted");
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// True while the run has not ended.
    pub fn should_continue(&self) -> bool {
        self.status == Status::Running
    }

    pub fn health(&self) -> u32 {
        self.player.as_player().map_or(0, Player::health)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Whole units run plus one per obstacle that was dodged.
    pub fn score(&self) -> u32 {
        self.distance as u32 + self.dodged
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.as_obstacle().is_some())
    }

    /// Places an obstacle `distance` ahead of the player in `lane`.
    pub fn spawn_obstacle(&mut self, lane: usize, distance: f32) {
        let lane = lane.min(self.lanes.len() - 1);
        let body = Body::new(
            Pose::at(
                self.lanes.offset(lane),
                obstacle::OBSTACLE_SIZE / 2.0,
                distance,
            ),
            Some("obstacle"),
        );
        let obstacle = Obstacle::new(
            lane,
            self.metrics.obstacle_radius,
            self.gameplay.despawn_distance,
        );
        self.entities
            .push(Entity::new(body, Kind::Obstacle(obstacle)));
    }

    /// Runs one whole frame: update, collide, draw, sweep.
    pub fn frame(&mut self, dt: f32, input: &InputState, queue: &mut DrawQueue) -> FrameReport {
        if self.status == Status::GameOver {
            // the scene stays frozen behind the end screen
            let before = queue.len();
            self.draw(queue);
            return FrameReport {
                status: self.status,
                hits: 0,
                spawned: 0,
                removed: 0,
                drawn: queue.len() - before,
            };
        }

        let spawned = self.update(dt, input);
        let hits = self.collide();
        let before = queue.len();
        self.draw(queue);
        let drawn = queue.len() - before;
        let removed = self.sweep();

        if !self.player.is_alive() {
            self.status = Status::GameOver;
            log::info!("game over, score {}", self.score());
        }
        FrameReport {
            status: self.status,
            hits,
            spawned,
            removed,
            drawn,
        }
    }

    /// Moves everything; returns the number of obstacles spawned.
    pub fn update(&mut self, dt: f32, input: &InputState) -> u32 {
        self.speed = (self.speed + self.gameplay.speed_ramp * dt).min(self.gameplay.max_speed);
        self.distance += self.speed * dt;

        let mut spawned = 0;
        self.spawn_timer -= dt;
        while self.spawn_timer <= 0.0 {
            let lane = self.rng.random_range(0..self.lanes.len());
            self.spawn_obstacle(lane, self.gameplay.spawn_distance);
            self.spawn_timer += self.spawn_gap();
            spawned += 1;
        }

        let frame = Frame {
            dt,
            input,
            speed: self.speed,
        };
        self.player.update(&frame);
        for entity in &mut self.entities {
            entity.update(&frame);
        }
        spawned
    }

    /// Seconds until the next obstacle. Shrinks as the speed grows so the
    /// distance between obstacles stays the same, never below [`MIN_SPAWN_GAP`].
    fn spawn_gap(&self) -> f32 {
        let scale = self.gameplay.speed / self.speed.max(f32::EPSILON);
        (self.gameplay.spawn_interval * scale).max(MIN_SPAWN_GAP)
    }

    /// Resolves player/obstacle hits; each hit consumes the obstacle.
    pub fn collide(&mut self) -> u32 {
        let Kind::Player(player) = &mut self.player.kind else {
            return 0;
        };
        let body = &mut self.player.body;
        let mut hits = 0;
        for entity in &mut self.entities {
            if !body.is_alive() {
                break;
            }
            if !entity.body.is_alive() {
                continue;
            }
            let Kind::Obstacle(obstacle) = &mut entity.kind else {
                continue;
            };
            if collision::hits(
                &player.collider(body),
                &obstacle.collider(&entity.body),
                self.gameplay.collision,
            ) {
                obstacle.consume(&mut entity.body);
                player.hit(body);
                hits += 1;
            }
        }
        hits
    }

    pub fn draw(&self, queue: &mut DrawQueue) {
        self.player.draw(queue);
        for entity in &self.entities {
            entity.draw(queue);
        }
    }

    /// Removes dead entities; returns how many went.
    pub fn sweep(&mut self) -> usize {
        let before = self.entities.len();
        let mut dodged = 0;
        self.entities.retain(|entity| {
            if entity.is_alive() {
                return true;
            }
            if entity.as_obstacle().is_some_and(|o| !o.consumed) {
                dodged += 1;
            }
            false
        });
        self.dodged += dodged;
        before - self.entities.len()
    }
}
