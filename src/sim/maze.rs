//! Maze grid, walls and the procedural generator
//!
//! The grid is `(rows + 2) x (cols + 2)` cells: row/col 0 and the last
//! row/col are padding without passages, so neighbour lookups from any
//! interior cell never leave the grid. Rows grow with scene `y`.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::coords::{CellCoord, GridMetrics};
use super::generators::{GridPos, SourceStrategy};
use super::geometry::rect_corners;
use crate::consts::{MAX_BOARD_COLS, MAX_BOARD_ROWS, MIN_BOARD_COLS, MIN_BOARD_ROWS};

/// Grid direction. `Up` is towards `row - 1` (smaller scene `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Order used by the carving weights
    pub const ALL: [Direction; 4] = [Self::Right, Self::Down, Self::Left, Self::Up];

    /// `(d_row, d_col)` of one step
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Right => (0, 1),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Up => (-1, 0),
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Up => Self::Down,
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Up => 3,
        }
    }

    /// Direction of a unit step between two neighbouring cells
    fn between(from: GridPos, to: GridPos) -> Self {
        match (to.0 as i64 - from.0 as i64, to.1 as i64 - from.1 as i64) {
            (0, 1) => Self::Right,
            (1, 0) => Self::Down,
            (0, -1) => Self::Left,
            (-1, 0) => Self::Up,
            step => unreachable!("cells {from:?} and {to:?} are not neighbours ({step:?})"),
        }
    }
}

/// Stable index of a wall in [`Maze::walls`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallId(pub u32);

/// Wall orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Runs along x, separates a cell from the one above it
    Horizontal,
    /// Runs along y, separates a cell from the one to its left
    Vertical,
}

/// A wall segment (axis-aligned rectangle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: WallId,
    pub center: Vec2,
    pub orientation: Orientation,
    /// Extent along the wall (the cell pitch, corners included)
    pub length: f32,
    pub thickness: f32,
}

impl Wall {
    pub fn new(id: WallId, center: Vec2, orientation: Orientation, metrics: &GridMetrics) -> Self {
        Self {
            id,
            center,
            orientation,
            length: metrics.cell_pitch,
            thickness: metrics.wall_thickness,
        }
    }

    /// Rotation of the unrotated (horizontal) wall sprite
    pub fn rotation(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => 0.0,
            Orientation::Vertical => FRAC_PI_2,
        }
    }

    /// Half size along scene x and y
    pub fn half_extents(&self) -> Vec2 {
        match self.orientation {
            Orientation::Horizontal => Vec2::new(self.length, self.thickness) / 2.0,
            Orientation::Vertical => Vec2::new(self.thickness, self.length) / 2.0,
        }
    }

    /// Corners in winding order
    pub fn corners(&self) -> [Vec2; 4] {
        rect_corners(self.center, self.half_extents(), 0.0)
    }
}

/// One grid unit: passage flags plus the walls bounding it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,

    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,

    pub top_wall: Option<WallId>,
    pub bottom_wall: Option<WallId>,
    pub left_wall: Option<WallId>,
    pub right_wall: Option<WallId>,
}

impl Cell {
    fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            ..Default::default()
        }
    }

    /// Open corridor towards `dir`
    #[inline]
    pub fn is_open(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set_open(&mut self, dir: Direction, open: bool) {
        match dir {
            Direction::Up => self.up = open,
            Direction::Down => self.down = open,
            Direction::Left => self.left = open,
            Direction::Right => self.right = open,
        }
    }

    /// Wall on the `dir` side, if any
    #[inline]
    pub fn wall(&self, dir: Direction) -> Option<WallId> {
        match dir {
            Direction::Up => self.top_wall,
            Direction::Down => self.bottom_wall,
            Direction::Left => self.left_wall,
            Direction::Right => self.right_wall,
        }
    }

    fn set_wall(&mut self, dir: Direction, id: WallId) {
        let slot = match dir {
            Direction::Up => &mut self.top_wall,
            Direction::Down => &mut self.bottom_wall,
            Direction::Left => &mut self.left_wall,
            Direction::Right => &mut self.right_wall,
        };
        *slot = Some(id);
    }

    pub fn has_any_passage(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    fn first_passage(&self) -> Option<Direction> {
        [Direction::Down, Direction::Up, Direction::Right, Direction::Left]
            .into_iter()
            .find(|&dir| self.is_open(dir))
    }
}

/// Generated maze: cell grid plus the wall arena
#[derive(Debug, Clone, PartialEq)]
pub struct Maze {
    rows: usize,
    cols: usize,
    metrics: GridMetrics,
    cells: Vec<Cell>,
    walls: Vec<Wall>,
}

/// Generate a `rows x cols` maze with the default cell metrics
pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Maze {
    Maze::generate(rows, cols, GridMetrics::default(), rng)
}

impl Maze {
    /// Grid with no passages and no walls
    pub fn empty(rows: usize, cols: usize, metrics: GridMetrics) -> Self {
        let cells = (0..rows + 2)
            .flat_map(|row| (0..cols + 2).map(move |col| Cell::new(row, col)))
            .collect();
        Self {
            rows,
            cols,
            metrics,
            cells,
            walls: Vec::new(),
        }
    }

    /// Maze with exactly the listed passages open, walls everywhere else
    ///
    /// Passages are `(row, col, dir)` and are opened from both sides. Passages
    /// leaving the interior are ignored.
    pub fn with_passages(
        rows: usize,
        cols: usize,
        metrics: GridMetrics,
        passages: impl IntoIterator<Item = (usize, usize, Direction)>,
    ) -> Self {
        let mut maze = Self::empty(rows, cols, metrics);
        for (row, col, dir) in passages {
            if maze.interior_step((row, col), dir).is_some()
                && maze.contains(CellCoord::new(row as i32, col as i32))
            {
                maze.open_passage(row, col, dir);
            } else {
                log::warn!("Ignoring passage ({row}, {col}) {dir:?} outside a {rows}x{cols} maze");
            }
        }
        maze.build_walls();
        maze
    }

    /// Random board size within `[MIN, MAX)` bounds
    pub fn random_dimensions<R: Rng + ?Sized>(rng: &mut R) -> (usize, usize) {
        let rows = rng.random_range(MIN_BOARD_ROWS..MAX_BOARD_ROWS);
        let cols = rng.random_range(MIN_BOARD_COLS..MAX_BOARD_COLS);
        (rows, cols)
    }

    /// Generate with a randomly chosen source strategy
    pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, metrics: GridMetrics, rng: &mut R) -> Self {
        debug_assert!(
            rows >= MIN_BOARD_ROWS && cols >= MIN_BOARD_COLS,
            "maze {rows}x{cols} is below the {MIN_BOARD_ROWS}x{MIN_BOARD_COLS} minimum"
        );

        let root = (rng.random_range(1..=rows), rng.random_range(1..=cols));
        let strategy = SourceStrategy::ALL[rng.random_range(0..SourceStrategy::ALL.len())];
        Self::generate_from(rows, cols, metrics, strategy, root, rng)
    }

    /// Generate with an explicit strategy and root
    pub fn generate_from<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        metrics: GridMetrics,
        strategy: SourceStrategy,
        root: GridPos,
        rng: &mut R,
    ) -> Self {
        let mut maze = Self::empty(rows, cols, metrics);

        maze.connect_sources(strategy, root);
        maze.carve(root, rng);
        maze.add_connections(rng);
        maze.symmetrize();
        maze.build_walls();

        log::debug!(
            "Maze {}x{} ({:?}, root {:?}): {} walls",
            rows,
            cols,
            strategy,
            root,
            maze.walls.len()
        );

        maze
    }

    /// Connectivity pass: walk each source towards the root, flagging the cell
    /// being left. A walk stops once it steps onto an already flagged cell.
    fn connect_sources(&mut self, strategy: SourceStrategy, root: GridPos) {
        for source in strategy.sources(self.rows, self.cols) {
            let mut cur = source;
            while let Some(next) = strategy.next(cur, root, self.rows, self.cols) {
                self.cell_mut(cur.0, cur.1).set_open(Direction::between(cur, next), true);
                cur = next;

                if self.cell(cur.0, cur.1).has_any_passage() {
                    break;
                }
            }
        }

        debug_assert!(self.is_in_tree(root), "connectivity pass left a cell unlinked");
    }

    /// Carving pass (origin shift). The root links to a random neighbour, which
    /// becomes the new root and drops its own outgoing link.
    fn carve<R: Rng + ?Sized>(&mut self, mut root: GridPos, rng: &mut R) {
        if self.rows * self.cols < 2 {
            return;
        }

        let mut prev = None;
        let mut steps = 0;
        while steps < self.rows * self.cols {
            let dir = random_direction(prev, rng);
            prev = Some(dir);

            let Some(next) = self.interior_step(root, dir) else {
                continue;
            };

            self.cell_mut(root.0, root.1).set_open(dir, true);
            let merged = self.cell_mut(next.0, next.1);
            if let Some(out) = merged.first_passage() {
                merged.set_open(out, false);
            }

            root = next;
            steps += 1;
        }

        debug_assert!(self.is_in_tree(root), "carving broke the spanning tree");
    }

    /// Densification: open extra `down`/`right` passages to add cycles
    fn add_connections<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (rows, cols) = (self.rows, self.cols);
        let total = (rows * cols) as i64 - rows as i64 - cols as i64;
        let p = if total <= 0 {
            1.0
        } else {
            (rows.min(cols) as f64 / total as f64).min(1.0)
        };

        for i in 1..=rows {
            for j in 1..=cols {
                let roll: f64 = rng.random();
                let cell = self.cell_mut(i, j);
                if i != rows && !cell.down && roll <= p {
                    cell.down = true;
                }

                let roll: f64 = rng.random();
                let cell = self.cell_mut(i, j);
                if j != cols && !cell.right && roll <= p {
                    cell.right = true;
                }
            }
        }
    }

    /// Make every edge open from both sides if either side opened it
    fn symmetrize(&mut self) {
        for i in 0..self.rows + 2 {
            for j in 0..self.cols + 2 {
                if i + 1 < self.rows + 2 {
                    let open = self.cell(i, j).down || self.cell(i + 1, j).up;
                    self.cell_mut(i, j).down = open;
                    self.cell_mut(i + 1, j).up = open;
                }
                if j + 1 < self.cols + 2 {
                    let open = self.cell(i, j).right || self.cell(i, j + 1).left;
                    self.cell_mut(i, j).right = open;
                    self.cell_mut(i, j + 1).left = open;
                }
            }
        }
    }

    /// Materialize closed edges as walls, the outer boundary included
    fn build_walls(&mut self) {
        let offset = self.metrics.effective_pitch() / 2.0;

        for i in 1..=self.rows + 1 {
            for j in 1..=self.cols + 1 {
                let center = self.metrics.cell_to_scene(i as i32, j as i32);

                let horizontal = j <= self.cols && !(self.cell(i, j).up || self.cell(i - 1, j).down);
                if horizontal {
                    let id = self.push_wall(center - Vec2::new(0.0, offset), Orientation::Horizontal);
                    self.cell_mut(i, j).set_wall(Direction::Up, id);
                    self.cell_mut(i - 1, j).set_wall(Direction::Down, id);
                }

                let vertical = i <= self.rows && !(self.cell(i, j).left || self.cell(i, j - 1).right);
                if vertical {
                    let id = self.push_wall(center - Vec2::new(offset, 0.0), Orientation::Vertical);
                    self.cell_mut(i, j).set_wall(Direction::Left, id);
                    self.cell_mut(i, j - 1).set_wall(Direction::Right, id);
                }
            }
        }
    }

    pub(crate) fn push_wall(&mut self, center: Vec2, orientation: Orientation) -> WallId {
        let id = WallId(self.walls.len() as u32);
        self.walls.push(Wall::new(id, center, orientation, &self.metrics));
        id
    }

    /// Register an existing wall on the edge between `(row, col)` and its
    /// neighbour towards `dir`
    pub(crate) fn attach_wall(&mut self, row: usize, col: usize, dir: Direction, id: WallId) {
        let (dr, dc) = dir.offset();
        let (nr, nc) = ((row as i32 + dr) as usize, (col as i32 + dc) as usize);
        self.cell_mut(row, col).set_wall(dir, id);
        self.cell_mut(nr, nc).set_wall(dir.opposite(), id);
    }

    /// Open the edge between `(row, col)` and its neighbour towards `dir`
    pub(crate) fn open_passage(&mut self, row: usize, col: usize, dir: Direction) {
        let (dr, dc) = dir.offset();
        let (nr, nc) = ((row as i32 + dr) as usize, (col as i32 + dc) as usize);
        self.cell_mut(row, col).set_open(dir, true);
        self.cell_mut(nr, nc).set_open(dir.opposite(), true);
    }

    /// Neighbour towards `dir` if it is an interior cell
    fn interior_step(&self, (row, col): GridPos, dir: Direction) -> Option<GridPos> {
        let (dr, dc) = dir.offset();
        let next = CellCoord::new(row as i32 + dr, col as i32 + dc);
        self.contains(next)
            .then_some((next.row as usize, next.col as usize))
    }

    /// Every interior cell except `root` has exactly one outgoing link, and
    /// following links from any cell ends at `root`
    fn is_in_tree(&self, root: GridPos) -> bool {
        let cells = self.rows * self.cols;
        (1..=self.rows)
            .flat_map(|i| (1..=self.cols).map(move |j| (i, j)))
            .all(|start| {
                let mut cur = start;
                for _ in 0..=cells {
                    if cur == root {
                        return !self.cell(cur.0, cur.1).has_any_passage();
                    }
                    let cell = self.cell(cur.0, cur.1);
                    let links = Direction::ALL.iter().filter(|&&d| cell.is_open(d)).count();
                    let Some(dir) = cell.first_passage() else {
                        return false;
                    };
                    if links != 1 {
                        return false;
                    }
                    let Some(next) = self.interior_step(cur, dir) else {
                        return false;
                    };
                    cur = next;
                }
                false
            })
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * (self.cols + 2) + col
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    /// Cell at `(row, col)`, padding included. Panics outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.index(row, col)]
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let idx = self.index(row, col);
        &mut self.cells[idx]
    }

    /// Cell at a signed coordinate, padding included
    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        let in_grid = (0..self.rows as i32 + 2).contains(&coord.row)
            && (0..self.cols as i32 + 2).contains(&coord.col);
        in_grid.then(|| self.cell(coord.row as usize, coord.col as usize))
    }

    /// Whether `coord` is an interior (playable) cell
    pub fn contains(&self, coord: CellCoord) -> bool {
        (1..=self.rows as i32).contains(&coord.row) && (1..=self.cols as i32).contains(&coord.col)
    }

    /// Neighbour of `cell` towards `dir`; padding cells have no neighbours
    /// outside the grid
    pub fn neighbour(&self, cell: &Cell, dir: Direction) -> Option<&Cell> {
        let (dr, dc) = dir.offset();
        self.get(CellCoord::new(cell.row as i32 + dr, cell.col as i32 + dc))
    }

    /// Interior cells in row-major order
    pub fn interior_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        (1..=self.rows).flat_map(move |i| (1..=self.cols).map(move |j| self.cell(i, j)))
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id.0 as usize)
    }

    /// Walls a tank centred in `coord` can touch: the cell's own four plus the
    /// perpendicular walls of its four neighbours. Empty outside the interior.
    pub fn walls_near(&self, coord: CellCoord) -> impl Iterator<Item = &Wall> + '_ {
        let mut ids = [None; 12];
        if self.contains(coord) {
            let (i, j) = (coord.row as usize, coord.col as usize);
            let here = self.cell(i, j);
            let above = self.cell(i - 1, j);
            let below = self.cell(i + 1, j);
            let left = self.cell(i, j - 1);
            let right = self.cell(i, j + 1);
            ids = [
                here.top_wall,
                here.bottom_wall,
                here.left_wall,
                here.right_wall,
                above.left_wall,
                above.right_wall,
                below.left_wall,
                below.right_wall,
                left.top_wall,
                left.bottom_wall,
                right.top_wall,
                right.bottom_wall,
            ];
        }
        ids.into_iter().flatten().filter_map(move |id| self.wall(id))
    }

    /// Number of interior cells reachable from `start` through open passages
    pub fn reachable_from(&self, start: CellCoord) -> usize {
        if !self.contains(start) {
            return 0;
        }

        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([(start.row as usize, start.col as usize)]);
        seen[self.index(start.row as usize, start.col as usize)] = true;
        let mut count = 0;

        while let Some((i, j)) = queue.pop_front() {
            count += 1;
            for dir in Direction::ALL {
                if !self.cell(i, j).is_open(dir) {
                    continue;
                }
                let Some(next) = self.interior_step((i, j), dir) else {
                    continue;
                };
                let idx = self.index(next.0, next.1);
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back(next);
                }
            }
        }
        count
    }

    /// Every interior cell reachable from every other
    pub fn is_connected(&self) -> bool {
        self.reachable_from(CellCoord::new(1, 1)) == self.rows * self.cols
    }

    /// Scene extent, outer walls included
    pub fn scene_size(&self) -> Vec2 {
        self.metrics.scene_size(self.rows, self.cols)
    }

    /// Centre of interior cell `(row, col)`
    pub fn cell_center(&self, row: usize, col: usize) -> Vec2 {
        self.metrics.cell_to_scene(row as i32, col as i32)
    }
}

/// Weighted direction draw: uniform at first, then repeating the previous
/// direction is three times less likely than any other
fn random_direction<R: Rng + ?Sized>(prev: Option<Direction>, rng: &mut R) -> Direction {
    let weights = match prev {
        None => [0.25; 4],
        Some(prev) => {
            let mut w = [0.3; 4];
            w[prev.index()] = 0.1;
            w
        }
    };

    let roll: f32 = rng.random();
    let mut acc = 0.0;
    for (dir, weight) in Direction::ALL.into_iter().zip(weights) {
        acc += weight;
        if roll <= acc {
            return dir;
        }
    }
    Direction::Up
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 1..=self.rows + 1 {
            let mut top = String::from("+");
            let mut mid = String::new();
            for j in 1..=self.cols {
                let cell = self.cell(i, j);
                top.push_str(if cell.top_wall.is_some() { "---+" } else { "   +" });
                mid.push(if cell.left_wall.is_some() { '|' } else { ' ' });
                mid.push_str("   ");
            }
            writeln!(f, "{top}")?;
            if i <= self.rows {
                let last = self.cell(i, self.cols);
                mid.push(if last.right_wall.is_some() { '|' } else { ' ' });
                writeln!(f, "{mid}")?;
            }
        }
        Ok(())
    }
}
