//! Tank Arena - maze and collision core for a two-tank arena shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze generation, collisions, round loop)
//! - `settings`: Runtime arena configuration

pub mod settings;
pub mod sim;

pub use settings::{ArenaConfig, ConfigError};
pub use sim::{CellCoord, GridMetrics};

use glam::Vec2;

/// Game configuration constants
///
/// All speeds are in scene units per simulation tick.
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const SIM_TPS: u32 = 60;

    /// Visual cell pitch: length of a wall segment, corners included
    pub const CELL_PITCH: f32 = 170.0;
    /// Wall thickness; neighbouring cells share it
    pub const WALL_THICKNESS: f32 = 10.0;

    /// Board bounds (rows/cols drawn from `MIN..MAX`)
    pub const MIN_BOARD_ROWS: usize = 3;
    pub const MAX_BOARD_ROWS: usize = 7;
    pub const MIN_BOARD_COLS: usize = 3;
    pub const MAX_BOARD_COLS: usize = 12;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const BULLET_SPEED: f32 = 6.0;
    pub const BULLETS_PER_TANK: usize = 5;
    /// Bullets expire after 5 seconds
    pub const BULLET_TTL_TICKS: u32 = 5 * SIM_TPS;

    /// Tank defaults (square footprint)
    pub const TANK_WIDTH: f32 = 70.0;
    pub const TANK_SPEED: f32 = 5.0;
    /// Reverse gear runs at 5/6 of the forward speed
    pub const TANK_REVERSE_FACTOR: f32 = 5.0 / 6.0;
    /// Radians per tick
    pub const TANK_ROTATION_SPEED: f32 = 0.05;
    pub const TANK_COUNT: usize = 2;

    /// Delay between the last kill and the next level (4 seconds)
    pub const ROUND_END_TICKS: u32 = 4 * SIM_TPS;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Scene position to `(row, col)` using the default cell metrics
#[inline]
pub fn scene_to_cell(pos: Vec2) -> CellCoord {
    GridMetrics::default().scene_to_cell(pos)
}

/// Centre of cell `(row, col)` using the default cell metrics
#[inline]
pub fn cell_to_scene(row: i32, col: i32) -> Vec2 {
    GridMetrics::default().cell_to_scene(row, col)
}
