//! Arena configuration
//!
//! Tunables for the maze and its entities, loaded from an optional JSON file.
//! Missing fields fall back to the compiled-in constants.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::GridMetrics;

/// Why a configuration was rejected
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A size or speed that must be strictly positive
    NotPositive { field: &'static str, value: f32 },
    /// Walls leave no room inside a cell
    WallTooThick { thickness: f32, pitch: f32 },
    /// A tank does not fit in a cell interior
    TankTooWide { width: f32, interior: f32 },
    /// Bullets this fast could skip a wall in one tick
    BulletTooFast { speed: f32, max: f32 },
    /// Counts that must be at least one
    Empty { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read config: {err}"),
            ConfigError::Json(err) => write!(f, "invalid config JSON: {err}"),
            ConfigError::NotPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            ConfigError::WallTooThick { thickness, pitch } => {
                write!(f, "wall thickness {thickness} leaves no interior in a {pitch} cell")
            }
            ConfigError::TankTooWide { width, interior } => {
                write!(f, "tank width {width} does not fit a {interior} cell interior")
            }
            ConfigError::BulletTooFast { speed, max } => {
                write!(f, "bullet speed {speed} exceeds the tunneling limit {max}")
            }
            ConfigError::Empty { field } => write!(f, "{field} must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

/// Arena tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    // === Grid ===
    /// Wall segment length (visual cell size)
    pub cell_pitch: f32,
    pub wall_thickness: f32,

    // === Bullets ===
    pub bullet_radius: f32,
    /// Scene units per tick
    pub bullet_speed: f32,
    pub bullet_ttl_ticks: u32,
    pub bullets_per_tank: usize,

    // === Tanks ===
    pub tank_count: usize,
    pub tank_width: f32,
    /// Scene units per tick
    pub tank_speed: f32,
    /// Reverse speed as a fraction of `tank_speed`
    pub tank_reverse_factor: f32,
    /// Radians per tick
    pub tank_rotation_speed: f32,

    // === Rounds ===
    /// Ticks between the deciding kill and the next level
    pub round_end_ticks: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            cell_pitch: CELL_PITCH,
            wall_thickness: WALL_THICKNESS,

            bullet_radius: BULLET_RADIUS,
            bullet_speed: BULLET_SPEED,
            bullet_ttl_ticks: BULLET_TTL_TICKS,
            bullets_per_tank: BULLETS_PER_TANK,

            tank_count: TANK_COUNT,
            tank_width: TANK_WIDTH,
            tank_speed: TANK_SPEED,
            tank_reverse_factor: TANK_REVERSE_FACTOR,
            tank_rotation_speed: TANK_ROTATION_SPEED,

            round_end_ticks: ROUND_END_TICKS,
        }
    }
}

impl ArenaConfig {
    pub fn metrics(&self) -> GridMetrics {
        GridMetrics::new(self.cell_pitch, self.wall_thickness)
    }

    /// Fastest bullet that cannot tunnel through a wall in one tick
    pub fn max_bullet_speed(&self) -> f32 {
        self.bullet_radius + self.wall_thickness / 2.0
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a config file
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a config file, falling back to defaults if it is missing or bad
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(config) => {
                log::info!("Loaded arena config from {}", path.display());
                config
            }
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No arena config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("Ignoring arena config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Arena config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Check the physical constraints the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("cell_pitch", self.cell_pitch),
            ("wall_thickness", self.wall_thickness),
            ("bullet_radius", self.bullet_radius),
            ("bullet_speed", self.bullet_speed),
            ("tank_width", self.tank_width),
            ("tank_speed", self.tank_speed),
            ("tank_reverse_factor", self.tank_reverse_factor),
            ("tank_rotation_speed", self.tank_rotation_speed),
        ];
        for (field, value) in positive {
            // Also rejects NaN
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.tank_count == 0 {
            return Err(ConfigError::Empty { field: "tank_count" });
        }
        if self.bullets_per_tank == 0 {
            return Err(ConfigError::Empty { field: "bullets_per_tank" });
        }
        if self.bullet_ttl_ticks == 0 {
            return Err(ConfigError::Empty { field: "bullet_ttl_ticks" });
        }

        let interior = 2.0 * self.metrics().half_interior();
        if !(interior > 0.0) {
            return Err(ConfigError::WallTooThick {
                thickness: self.wall_thickness,
                pitch: self.cell_pitch,
            });
        }
        if self.tank_width >= interior {
            return Err(ConfigError::TankTooWide {
                width: self.tank_width,
                interior,
            });
        }

        let max = self.max_bullet_speed();
        if self.bullet_speed >= max {
            return Err(ConfigError::BulletTooFast {
                speed: self.bullet_speed,
                max,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tank_arena_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_default_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_bullet_speed(), 9.0);
        assert_eq!(config.metrics(), GridMetrics::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ArenaConfig::from_json(r#"{ "bullet_speed": 8.0 }"#).expect("valid config");
        assert_eq!(config.bullet_speed, 8.0);
        assert_eq!(config.cell_pitch, CELL_PITCH);
        assert_eq!(config.tank_count, TANK_COUNT);
    }

    #[test]
    fn test_rejects_tunneling_speed() {
        let err = ArenaConfig::from_json(r#"{ "bullet_speed": 9.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::BulletTooFast { .. }));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let config = ArenaConfig {
            wall_thickness: 85.0,
            ..ArenaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::WallTooThick { .. })));

        let config = ArenaConfig {
            tank_width: 150.0,
            ..ArenaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::TankTooWide { .. })));

        let config = ArenaConfig {
            bullet_radius: f32::NAN,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "bullet_radius", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_counts() {
        let config = ArenaConfig {
            bullets_per_tank: 0,
            ..ArenaConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "bullets_per_tank must be at least 1");
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = ArenaConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_save_and_read() {
        let path = temp_path("save");
        let config = ArenaConfig {
            tank_speed: 4.0,
            ..ArenaConfig::default()
        };
        config.save(&path).expect("write config");
        let loaded = ArenaConfig::read(&path).expect("read config");
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        assert_eq!(ArenaConfig::load(temp_path("missing")), ArenaConfig::default());

        let path = temp_path("broken");
        fs::write(&path, r#"{ "bullet_speed": 50.0 }"#).expect("write config");
        let loaded = ArenaConfig::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, ArenaConfig::default());
    }
}
