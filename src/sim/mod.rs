//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod coords;
pub mod generators;
pub mod geometry;
pub mod maze;
pub mod reflect;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{Hitbox, circle_rect_collision, detect_collision, first_wall_overlap};
pub use coords::{CellCoord, GridMetrics};
pub use generators::{GridPos, SourceStrategy};
pub use maze::{Cell, Direction, Maze, Orientation, Wall, WallId, generate};
pub use reflect::{Reflection, launch, max_safe_speed, reflect};
pub use snapshot::{MazeSnapshot, SnapshotError};
pub use state::{Bullet, BulletPool, GameEvent, GameState, Pose, RoundPhase, Tank, TankInput};
pub use tick::tick;
