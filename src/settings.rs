//! Simulation settings
//!
//! Every tunable scalar of the arena lives here. Settings are plain data:
//! they can be built in code, or read from a JSON file where any missing
//! field falls back to its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, SettingsError};

/// What happens when the ship reaches the edge of the level square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Hard wall: the ship is held inside [-level_size, level_size]
    #[default]
    Clamp,
    /// Leaving the square ends the episode
    Terminate,
}

impl BoundaryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryPolicy::Clamp => "clamp",
            BoundaryPolicy::Terminate => "terminate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clamp" | "wall" => Some(BoundaryPolicy::Clamp),
            "terminate" | "end" => Some(BoundaryPolicy::Terminate),
            _ => None,
        }
    }
}

/// How asteroids that nobody shoots eventually leave the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AsteroidExpiry {
    /// Removed by the per-tick sweep once outside level_size + padding
    #[default]
    Distance,
    /// Removed after living this many seconds
    Lifetime { seconds: f32 },
}

/// Reward and cost constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSettings {
    /// Multiplier on the centre-proximity term
    pub position_scale: f32,
    /// Exponent applied to the centre-proximity term (1 or 2)
    pub position_exponent: u32,
    /// Cost per second of thrusting
    pub move_cost: f32,
    /// Cost per second of turning
    pub turn_cost: f32,
    /// Cost per bullet fired
    pub shoot_cost: f32,
    /// Reward per asteroid destroyed by a bullet
    pub destroy_reward: f32,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            position_scale: 0.1,
            position_exponent: 2,
            move_cost: 0.01,
            turn_cost: 0.01,
            shoot_cost: 0.05,
            destroy_reward: 1.0,
        }
    }
}

/// Arena, ship, weapon and spawner tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Level ===
    /// Half-size of the square play area
    pub level_size: f32,
    /// Extra margin outside the level where asteroids spawn
    pub padding: f32,
    /// Boundary policy for the ship
    pub boundary: BoundaryPolicy,
    /// Episode truncation in ticks (0 = never)
    pub max_episode_ticks: u64,

    // === Spawner ===
    /// Seconds between asteroid spawns
    pub spawn_rate: f32,
    /// Max deviation (degrees) of an asteroid's course from the centre line
    pub trajectory_angle: f32,
    /// Asteroid launch speed
    pub asteroid_speed: f32,
    /// Smallest asteroid size (also the split floor)
    pub asteroid_min_size: f32,
    /// Largest asteroid size
    pub asteroid_max_size: f32,
    /// Angle (degrees) between the two children of a split
    pub split_spread: f32,
    /// Asteroid expiry policy
    pub asteroid_expiry: AsteroidExpiry,

    // === Ship ===
    /// Forward thrust (velocity gained per second of thrust)
    pub move_speed: f32,
    /// Turning torque (degrees/s gained per second of turning)
    pub turn_speed: f32,
    /// Linear damping coefficient
    pub ship_linear_drag: f32,
    /// Angular damping coefficient
    pub ship_angular_drag: f32,
    /// Collision radius
    pub ship_radius: f32,

    // === Weapon ===
    /// Bullet launch speed
    pub bullet_speed: f32,
    /// Seconds a bullet lives
    pub bullet_lifetime: f32,
    /// Collision radius
    pub bullet_radius: f32,
    /// Seconds between shots
    pub shoot_cooldown: f32,

    // === Rewards ===
    pub rewards: RewardSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level_size: 5.0,
            padding: 15.0,
            boundary: BoundaryPolicy::Clamp,
            max_episode_ticks: 5_000,

            spawn_rate: 1.0,
            trajectory_angle: 15.0,
            asteroid_speed: 2.0,
            asteroid_min_size: 0.35,
            asteroid_max_size: 1.5,
            split_spread: 30.0,
            asteroid_expiry: AsteroidExpiry::Distance,

            move_speed: 6.0,
            turn_speed: 720.0,
            ship_linear_drag: 1.0,
            ship_angular_drag: 5.0,
            ship_radius: 0.25,

            bullet_speed: 10.0,
            bullet_lifetime: 1.5,
            bullet_radius: 0.05,
            shoot_cooldown: 0.25,

            rewards: RewardSettings::default(),
        }
    }
}

impl Settings {
    /// Distance (infinity norm) beyond which asteroids are swept
    pub fn sweep_distance(&self) -> f32 {
        self.level_size + self.padding
    }

    /// Reject values that would break the simulation
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("level_size", self.level_size),
            ("spawn_rate", self.spawn_rate),
            ("asteroid_min_size", self.asteroid_min_size),
            ("bullet_lifetime", self.bullet_lifetime),
            ("ship_radius", self.ship_radius),
            ("bullet_radius", self.bullet_radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(SettingsError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("padding", self.padding),
            ("trajectory_angle", self.trajectory_angle),
            ("asteroid_speed", self.asteroid_speed),
            ("split_spread", self.split_spread),
            ("move_speed", self.move_speed),
            ("turn_speed", self.turn_speed),
            ("ship_linear_drag", self.ship_linear_drag),
            ("ship_angular_drag", self.ship_angular_drag),
            ("bullet_speed", self.bullet_speed),
            ("shoot_cooldown", self.shoot_cooldown),
            ("move_cost", self.rewards.move_cost),
            ("turn_cost", self.rewards.turn_cost),
            ("shoot_cost", self.rewards.shoot_cost),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(SettingsError::Negative { field, value });
            }
        }

        if self.asteroid_min_size > self.asteroid_max_size {
            return Err(SettingsError::SizeRange {
                min: self.asteroid_min_size,
                max: self.asteroid_max_size,
            });
        }

        if let AsteroidExpiry::Lifetime { seconds } = self.asteroid_expiry {
            if !(seconds > 0.0) {
                return Err(SettingsError::NonPositive {
                    field: "asteroid_expiry.seconds",
                    value: seconds,
                });
            }
        }

        if !matches!(self.rewards.position_exponent, 1 | 2) {
            return Err(SettingsError::Exponent {
                value: self.rewards.position_exponent,
            });
        }

        Ok(())
    }

    /// Parse settings from JSON text and validate them
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AgentError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
