//! Game configuration
//!
//! Every field has a default, so a missing config directory still yields a
//! playable game.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{camera::DEFAULT_FAR_PLANE, collision::CollisionMode, lanes::Easing};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "42run".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding shaders, meshes, textures and fonts.
    pub root: PathBuf,
    /// Cubemap directory below `root`, no skybox if it does not exist.
    pub skybox: String,
    /// Font file stem below `root`, no HUD text if it does not exist.
    pub font: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            skybox: "skybox".to_string(),
            font: "font".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            far: DEFAULT_FAR_PLANE,
            position: [0.0, 3.0, -6.0],
            target: [0.0, 0.5, 6.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub offsets: Vec<f32>,
    /// Seconds a lane switch takes.
    pub switch_duration: f32,
    pub easing: Easing,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            offsets: vec![-2.0, 0.0, 2.0],
            switch_duration: 0.2,
            easing: Easing::Cubic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub health: u32,
    /// Starting run speed in units per second.
    pub speed: f32,
    /// Speed gained per second of running.
    pub speed_ramp: f32,
    pub max_speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    /// Seconds between two obstacles at starting speed.
    pub spawn_interval: f32,
    /// Distance ahead of the player where obstacles appear.
    pub spawn_distance: f32,
    /// Distance behind the player where obstacles are removed.
    pub despawn_distance: f32,
    pub collision: CollisionMode,
    /// Seed of the obstacle lane RNG; random when absent.
    pub seed: Option<u64>,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            health: 3,
            speed: 8.0,
            speed_ramp: 0.25,
            max_speed: 25.0,
            jump_velocity: 7.0,
            gravity: 20.0,
            spawn_interval: 1.2,
            spawn_distance: 60.0,
            despawn_distance: 8.0,
            collision: CollisionMode::Radius,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Linear RGBA.
    pub clear_colour: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_colour: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

impl RenderConfig {
    pub fn clear_colour(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_colour;
        wgpu::Color { r, g, b, a }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub profile: String,
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub camera: CameraConfig,
    pub lanes: LaneConfig,
    pub gameplay: GameplayConfig,
    pub render: RenderConfig,
}

impl GameConfig {
    /// Loads `config/default.toml`, then `config/{profile}.toml`, then
    /// `RUN_`-prefixed environment variables (`RUN_CAMERA__FAR=300`).
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"), profile)
    }

    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(profile)).required(false))
            .add_source(
                Environment::with_prefix("RUN")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("profile", profile)?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the frame loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gameplay = &self.gameplay;
        if !positive(gameplay.spawn_interval) {
            return Err(invalid("gameplay.spawn_interval", "must be positive"));
        }
        if !positive(gameplay.speed) {
            return Err(invalid("gameplay.speed", "must be positive"));
        }
        if gameplay.max_speed.is_nan() || gameplay.max_speed < gameplay.speed {
            return Err(invalid("gameplay.max_speed", "must be at least gameplay.speed"));
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value > 0.0
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Message(format!("invalid `{key}`: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[gameplay]\nhealth = 5\n[lanes]\neasing = \"linear\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("hard.toml"),
            "[gameplay]\nhealth = 1\ncollision = { mode = \"window\", epsilon = 0.4 }\n",
        )
        .unwrap();

        let config = GameConfig::load_from(dir.path(), "hard").unwrap();
        assert_eq!(config.profile, "hard");
        assert_eq!(config.gameplay.health, 1);
        assert_eq!(config.lanes.easing, Easing::Linear);
        assert_eq!(
            config.gameplay.collision,
            CollisionMode::Window { epsilon: 0.4 }
        );
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn values_that_stall_the_spawner_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("no_interval", "[gameplay]\nspawn_interval = 0.0\n"),
            ("negative_interval", "[gameplay]\nspawn_interval = -1.0\n"),
            ("standing", "[gameplay]\nspeed = 0.0\nspeed_ramp = 1.0\n"),
            ("capped", "[gameplay]\nspeed = 10.0\nmax_speed = 5.0\n"),
        ] {
            std::fs::write(dir.path().join(format!("{name}.toml")), body).unwrap();
            let result = GameConfig::load_from(dir.path(), name);
            assert!(result.is_err(), "profile `{name}` loaded");
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }
}
