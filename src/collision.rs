//! One-dimensional collision along the running axis.

use serde::{Deserialize, Serialize};

/// How close along z an obstacle has to be to count as a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CollisionMode {
    /// Sum of the two bounding radii.
    #[default]
    Radius,
    /// A fixed window of `epsilon` world units.
    Window { epsilon: f32 },
}

impl CollisionMode {
    pub fn threshold(&self, a: f32, b: f32) -> f32 {
        match self {
            CollisionMode::Radius => a + b,
            CollisionMode::Window { epsilon } => *epsilon,
        }
    }
}

/// What collision needs to know about one side of a test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub lane: usize,
    /// Position along the running axis.
    pub z: f32,
    /// Height of the lowest point above the ground.
    pub elevation: f32,
    pub height: f32,
    pub radius: f32,
}

/// Whether `obstacle` hits `player`.
///
/// Both have to occupy the same lane and be within the mode's threshold
/// along z. A player whose lowest point is above the obstacle's top clears it.
pub fn hits(player: &Collider, obstacle: &Collider, mode: CollisionMode) -> bool {
    if player.lane != obstacle.lane {
        return false;
    }
    if player.elevation >= obstacle.elevation + obstacle.height {
        return false;
    }
    (player.z - obstacle.z).abs() <= mode.threshold(player.radius, obstacle.radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collider(lane: usize, z: f32) -> Collider {
        Collider {
            lane,
            z,
            elevation: 0.0,
            height: 1.0,
            radius: 0.5,
        }
    }

    #[test]
    fn window_mode_ignores_radii() {
        let player = collider(1, 0.0);
        let obstacle = Collider {
            radius: 10.0,
            ..collider(1, 0.8)
        };
        assert!(!hits(&player, &obstacle, CollisionMode::Window { epsilon: 0.5 }));
        assert!(hits(&player, &obstacle, CollisionMode::Radius));
    }

    #[test]
    fn airborne_player_clears_obstacle() {
        let player = Collider {
            elevation: 1.2,
            ..collider(0, 0.0)
        };
        assert!(!hits(&player, &collider(0, 0.0), CollisionMode::Radius));
    }
}
