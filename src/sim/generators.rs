//! Source strategies for the maze connectivity pass
//!
//! A strategy names a few source cells and a deterministic space-filling walk
//! from any cell towards a root. Walking every source to the root visits every
//! interior cell, which is what makes the initial maze a spanning in-tree.

use serde::{Deserialize, Serialize};

/// Interior cell as `(row, col)`, both 1-based
pub type GridPos = (usize, usize);

/// Registered connectivity strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStrategy {
    /// Boustrophedon over rows: odd rows run right, even rows run left
    HorizontalSnake,
    /// Boustrophedon over columns: odd columns run down, even columns run up
    VerticalSnake,
}

impl SourceStrategy {
    pub const ALL: [SourceStrategy; 2] = [Self::HorizontalSnake, Self::VerticalSnake];

    /// Both ends of the snake
    pub fn sources(self, rows: usize, cols: usize) -> Vec<GridPos> {
        match self {
            Self::HorizontalSnake => {
                let last_col = if rows % 2 == 0 { 1 } else { cols };
                vec![(1, 1), (rows, last_col)]
            }
            Self::VerticalSnake => {
                let last_row = if cols % 2 == 0 { 1 } else { rows };
                vec![(1, 1), (last_row, cols)]
            }
        }
    }

    /// Next cell on the walk from `current` towards `root`, `None` once there
    pub fn next(self, current: GridPos, root: GridPos, rows: usize, cols: usize) -> Option<GridPos> {
        match self {
            Self::HorizontalSnake => snake_next(current, root, cols),
            Self::VerticalSnake => {
                let transpose = |(r, c): GridPos| (c, r);
                snake_next(transpose(current), transpose(root), rows).map(transpose)
            }
        }
    }
}

/// One step along a row-major snake, `(major, minor)` coordinates.
///
/// Odd major lines run towards increasing minor, even ones back. The walk goes
/// forward along the snake if the root lies ahead, backward otherwise.
fn snake_next(current: GridPos, root: GridPos, minor_len: usize) -> Option<GridPos> {
    if current == root {
        return None;
    }

    let (major, minor) = current;
    let odd_line = major % 2 == 1;
    let forward = root.0 > major
        || (root.0 == major && ((root.1 > minor && odd_line) || (root.1 < minor && !odd_line)));

    // Direction along the snake, then along the current line
    let dir: isize = if forward { 1 } else { -1 };
    let along = if odd_line { dir } else { -dir };

    let next_minor = minor as isize + along;
    if (1..=minor_len as isize).contains(&next_minor) {
        Some((major, next_minor as usize))
    } else {
        Some(((major as isize + dir) as usize, minor))
    }
}
