//! Runtime and gameplay configuration.
//!
//! Every tuning value the gameplay reads lives here, grouped by feature.
//! Missing keys fall back to [`Default`], so a TOML file only needs to list
//! what it changes:
//!
//! ```toml
//! [runtime]
//! fixed_step = 0.02
//!
//! [asteroid_spawner]
//! cooldown = 3.0
//! speed = [1.0, 2.5]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};


/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value parsed but is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Scheduler timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Fixed-stage step in seconds.
    pub fixed_step: f32,
    /// Fixed steps allowed per external tick before time is dropped.
    pub max_fixed_steps: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { fixed_step: 0.02, max_fixed_steps: 8 }
    }
}

/// Player ship tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShipConfig {
    pub max_speed: f32,
    pub acceleration: f32,
    pub drag: f32,
    pub max_angular_speed: f32,
    pub angular_acceleration: f32,
    pub angular_drag: f32,
    /// Seconds spent disabled before respawning.
    pub respawn_time: f32,
    /// Minimum seconds between shots.
    pub shoot_cooldown: f32,
    pub bullet_speed: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            acceleration: 8.0,
            drag: 4.0,
            max_angular_speed: 2.0,
            angular_acceleration: 8.0,
            angular_drag: 4.0,
            respawn_time: 5.0,
            shoot_cooldown: 0.25,
            bullet_speed: 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulletConfig {
    /// Seconds a bullet lives.
    pub lifetime: f32,
}

impl Default for BulletConfig {
    fn default() -> Self { Self { lifetime: 1.5 } }
}

/// Asteroid wave spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnerConfig {
    /// Seconds between the field clearing and the next wave.
    pub cooldown: f32,
    /// Asteroids per wave.
    pub count: u32,
    /// Width and height of the no-spawn rectangle centred on the player.
    pub safe_area: [f32; 2],
    /// Initial speed range.
    pub speed: [f32; 2],
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self { cooldown: 2.0, count: 4, safe_area: [2.0, 2.0], speed: [1.0, 3.0] }
    }
}

/// Debris emitted when an asteroid or the ship goes away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebrisConfig {
    pub amount: u32,
    pub speed: [f32; 2],
    /// Angular speed range around Z.
    pub spin: [f32; 2],
    pub lifetime: f32,
}

impl Default for DebrisConfig {
    fn default() -> Self {
        Self { amount: 4, speed: [2.0, 4.0], spin: [-5.0, 5.0], lifetime: 1.0 }
    }
}

/// Play field rectangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundaryConfig {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Default for BoundaryConfig {
    fn default() -> Self { Self { min: [-8.0, -5.0], max: [8.0, 5.0] } }
}

/// Complete game configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub runtime: RuntimeConfig,
    pub ship: ShipConfig,
    pub bullet: BulletConfig,
    pub asteroid_spawner: SpawnerConfig,
    pub debris: DebrisConfig,
    pub boundary: BoundaryConfig,
}

impl GameConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let step = self.runtime.fixed_step;
        if !(step.is_finite() && step > 0.0) {
            return Err(invalid(format!("runtime.fixed_step must be positive, got {step}")));
        }
        if self.runtime.max_fixed_steps == 0 {
            return Err(invalid("runtime.max_fixed_steps must be at least 1".into()));
        }

        ordered("asteroid_spawner.speed", self.asteroid_spawner.speed)?;
        ordered("debris.speed", self.debris.speed)?;
        ordered("debris.spin", self.debris.spin)?;

        for (axis, (lo, hi)) in ["x", "y"].iter().zip(self.boundary.min.iter().zip(self.boundary.max.iter())) {
            if hi <= lo {
                return Err(invalid(format!("boundary.max.{axis} must exceed boundary.min.{axis}")));
            }
        }
        let width = self.boundary.max[0] - self.boundary.min[0];
        let height = self.boundary.max[1] - self.boundary.min[1];
        let [safe_w, safe_h] = self.asteroid_spawner.safe_area;
        if safe_w < 0.0 || safe_h < 0.0 || safe_w >= width || safe_h >= height {
            return Err(invalid(format!(
                "asteroid_spawner.safe_area {safe_w}x{safe_h} must fit inside the {width}x{height} boundary"
            )));
        }

        for (name, value) in [
            ("bullet.lifetime", self.bullet.lifetime),
            ("debris.lifetime", self.debris.lifetime),
            ("ship.respawn_time", self.ship.respawn_time),
            ("ship.shoot_cooldown", self.ship.shoot_cooldown),
            ("asteroid_spawner.cooldown", self.asteroid_spawner.cooldown),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

fn ordered(name: &str, [lo, hi]: [f32; 2]) -> Result<(), ConfigError> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be [low, high] with low <= high, got [{lo}, {hi}]")))
    }
}
