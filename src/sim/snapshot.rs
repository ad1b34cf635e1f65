//! Plain-data maze transfer
//!
//! A snapshot is just the board size and the wall list. Passages are implied:
//! an interior edge is open exactly when no wall lies on it.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::coords::GridMetrics;
use super::maze::{Direction, Maze, Orientation, Wall};
use crate::consts::{MAX_BOARD_COLS, MAX_BOARD_ROWS};

/// Serializable maze description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub walls: Vec<Wall>,
}

/// Why a snapshot could not be turned back into a maze
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    InvalidDimensions { rows: usize, cols: usize },
    /// Wall `index` does not sit on an edge of the grid
    WallOutOfBounds { index: usize },
    /// Two walls on the same edge
    DuplicateWall { index: usize },
    /// The outer boundary must be closed
    OpenBoundary { row: usize, col: usize, side: Direction },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(err) => write!(f, "invalid snapshot JSON: {err}"),
            SnapshotError::InvalidDimensions { rows, cols } => {
                write!(f, "invalid maze size {rows}x{cols}")
            }
            SnapshotError::WallOutOfBounds { index } => {
                write!(f, "wall {index} is not on a grid edge")
            }
            SnapshotError::DuplicateWall { index } => {
                write!(f, "wall {index} duplicates an earlier wall")
            }
            SnapshotError::OpenBoundary { row, col, side } => {
                write!(f, "boundary of cell ({row}, {col}) is open on the {side:?} side")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Json(err)
    }
}

impl MazeSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Maze {
    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            rows: self.rows(),
            cols: self.cols(),
            walls: self.walls().to_vec(),
        }
    }

    /// Rebuild a maze from its walls
    ///
    /// Wall ids follow the snapshot's order. Sizes and thickness come from
    /// `metrics`, only wall centres and orientations are read. Boards larger
    /// than `MAX_BOARD_ROWS` x `MAX_BOARD_COLS` are rejected.
    pub fn from_snapshot(snapshot: &MazeSnapshot, metrics: GridMetrics) -> Result<Self, SnapshotError> {
        let (rows, cols) = (snapshot.rows, snapshot.cols);
        if !(1..=MAX_BOARD_ROWS).contains(&rows) || !(1..=MAX_BOARD_COLS).contains(&cols) {
            return Err(SnapshotError::InvalidDimensions { rows, cols });
        }

        let mut maze = Maze::empty(rows, cols, metrics);
        let half_step = metrics.effective_pitch() / 2.0;

        for (index, wall) in snapshot.walls.iter().enumerate() {
            // The cell below / right of the wall owns it as its Up / Left side
            let (anchor, side) = match wall.orientation {
                Orientation::Horizontal => (wall.center + Vec2::new(0.0, half_step), Direction::Up),
                Orientation::Vertical => (wall.center + Vec2::new(half_step, 0.0), Direction::Left),
            };
            let coord = metrics.scene_to_cell(anchor);

            let (max_row, max_col) = match wall.orientation {
                Orientation::Horizontal => (rows + 1, cols),
                Orientation::Vertical => (rows, cols + 1),
            };
            let in_range = (1..=max_row as i32).contains(&coord.row) && (1..=max_col as i32).contains(&coord.col);
            if !in_range || metrics.cell_to_scene(coord.row, coord.col).distance(anchor) > 0.5 {
                return Err(SnapshotError::WallOutOfBounds { index });
            }

            let (row, col) = (coord.row as usize, coord.col as usize);
            if maze.cell(row, col).wall(side).is_some() {
                return Err(SnapshotError::DuplicateWall { index });
            }
            let id = maze.push_wall(wall.center, wall.orientation);
            maze.attach_wall(row, col, side, id);
        }

        for i in 1..=rows {
            for j in 1..=cols {
                for (side, on_boundary) in [
                    (Direction::Up, i == 1),
                    (Direction::Left, j == 1),
                    (Direction::Down, i == rows),
                    (Direction::Right, j == cols),
                ] {
                    if maze.cell(i, j).wall(side).is_some() {
                        continue;
                    }
                    if on_boundary {
                        return Err(SnapshotError::OpenBoundary { row: i, col: j, side });
                    }
                    if matches!(side, Direction::Down | Direction::Right) {
                        maze.open_passage(i, j, side);
                    }
                }
            }
        }

        log::debug!(
            "Rebuilt {}x{} maze from snapshot ({} walls)",
            rows,
            cols,
            maze.walls().len()
        );
        Ok(maze)
    }
}
