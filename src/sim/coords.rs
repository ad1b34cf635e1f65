//! Scene <-> cell coordinate mapping
//!
//! Walls are shared between neighbouring cells, so consecutive cells are
//! `pitch - thickness` apart even though each wall segment is `pitch` long.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CELL_PITCH, WALL_THICKNESS};

/// Discrete grid position. Signed so positions left of or above the grid map
/// to index 0 or below instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Cell pitch and wall thickness of a maze
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    /// Visual cell pitch (wall segment length)
    pub cell_pitch: f32,
    /// Wall thickness
    pub wall_thickness: f32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            cell_pitch: CELL_PITCH,
            wall_thickness: WALL_THICKNESS,
        }
    }
}

impl GridMetrics {
    pub fn new(cell_pitch: f32, wall_thickness: f32) -> Self {
        Self {
            cell_pitch,
            wall_thickness,
        }
    }

    /// Distance between the centres of two neighbouring cells
    #[inline]
    pub fn effective_pitch(&self) -> f32 {
        self.cell_pitch - self.wall_thickness
    }

    /// Distance from a cell centre to each of its inner wall faces
    #[inline]
    pub fn half_interior(&self) -> f32 {
        self.cell_pitch / 2.0 - self.wall_thickness
    }

    /// Cell containing `pos`
    ///
    /// Cell `k + 1` starts exactly at `thickness / 2 + k * effective_pitch`,
    /// i.e. in the middle of the wall it shares with cell `k`.
    pub fn scene_to_cell(&self, pos: Vec2) -> CellCoord {
        let ep = self.effective_pitch();
        let half_wall = self.wall_thickness / 2.0;

        let col = ((pos.x - half_wall) / ep).floor() as i32;
        let row = ((pos.y - half_wall) / ep).floor() as i32;

        CellCoord::new(row + 1, col + 1)
    }

    /// Centre of the free interior of cell `(row, col)`
    pub fn cell_to_scene(&self, row: i32, col: i32) -> Vec2 {
        let ep = self.effective_pitch();
        let half_pitch = self.cell_pitch / 2.0;

        Vec2::new(
            (col - 1) as f32 * ep + half_pitch,
            (row - 1) as f32 * ep + half_pitch,
        )
    }

    /// Scene extent of a `rows x cols` maze, outer walls included
    pub fn scene_size(&self, rows: usize, cols: usize) -> Vec2 {
        let ep = self.effective_pitch();
        Vec2::new(
            cols as f32 * ep + self.wall_thickness,
            rows as f32 * ep + self.wall_thickness,
        )
    }
}
