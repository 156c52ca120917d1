//! Game configuration
//!
//! Loaded through the engine's [`Config`] trait, so any of these sections can
//! come from a `.toml` or `.ron` file and omitted fields keep their defaults.

use serde::{Deserialize, Serialize};
use sweep_engine::config::{Config, ConfigError, SceneConfig};

/// Game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Gameplay settings
    pub gameplay: GameplayConfig,

    /// Headless run settings
    pub simulation: SimulationConfig,

    /// Engine scene settings
    pub scene: SceneConfig,
}

/// Gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Side length of the square room
    pub room_size: f32,

    /// Wall, floor and ceiling thickness
    pub wall_thickness: f32,

    /// Ceiling height
    pub wall_height: f32,

    /// Player eye height above the floor center
    pub eye_height: f32,

    /// Player walk speed, units per second
    pub player_speed: f32,

    /// Player hit points
    pub player_max_hp: u32,

    /// Seconds between player shots
    pub fire_cooldown: f32,

    /// Bullet speed, units per second
    pub bullet_speed: f32,

    /// Bullet lifetime (seconds)
    pub bullet_lifetime: f32,

    /// Enemy hit points
    pub enemy_max_hp: u32,

    /// Seconds between enemy fireballs
    pub enemy_fire_interval: f32,

    /// Distance within which enemies fire at the player
    pub enemy_detection_range: f32,

    /// Fireball speed, units per second
    pub fireball_speed: f32,

    /// Fireball lifetime (seconds)
    pub fireball_lifetime: f32,

    /// Most enemies alive at once
    pub max_enemies: u32,

    /// Seconds between enemy spawns while below the cap
    pub spawn_interval: f32,

    /// Points for each defeated enemy
    pub points_per_enemy: u32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            room_size: 30.0,
            wall_thickness: 1.0,
            wall_height: 6.0,
            eye_height: 1.7,
            player_speed: 10.0,
            player_max_hp: 5,
            fire_cooldown: 0.1,
            bullet_speed: 20.0,
            bullet_lifetime: 2.0,
            enemy_max_hp: 3,
            enemy_fire_interval: 1.0,
            enemy_detection_range: 20.0,
            fireball_speed: 15.0,
            fireball_lifetime: 3.0,
            max_enemies: 5,
            spawn_interval: 3.0,
            points_per_enemy: 100,
        }
    }
}

/// Headless run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed frame delta (seconds)
    pub timestep: f32,

    /// Simulated seconds before the run ends
    pub duration: f32,

    /// Seed for enemy placement
    pub seed: u64,

    /// Seconds between progress log lines
    pub report_interval: f32,

    /// Times the arena starts over after a game over
    pub restarts: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            duration: 60.0,
            seed: 7,
            report_interval: 5.0,
            restarts: 0,
        }
    }
}

impl ArenaConfig {
    /// Check the values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.validate()?;

        let positive = [
            ("simulation.timestep", self.simulation.timestep),
            ("simulation.report_interval", self.simulation.report_interval),
            ("gameplay.room_size", self.gameplay.room_size),
            ("gameplay.wall_thickness", self.gameplay.wall_thickness),
            ("gameplay.spawn_interval", self.gameplay.spawn_interval),
            ("gameplay.enemy_fire_interval", self.gameplay.enemy_fire_interval),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        if self.gameplay.wall_height <= self.gameplay.eye_height + 1.0 {
            return Err(ConfigError::Invalid {
                field: "gameplay.wall_height",
                reason: "the player must fit between floor and ceiling".to_string(),
            });
        }

        Ok(())
    }
}

impl Config for ArenaConfig {}
