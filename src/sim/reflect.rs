//! Bullet vs wall reflection
//!
//! Bullets never run SAT against walls. A bullet is resolved against the four
//! inner faces of the cell it sits in: a face closer than the bullet radius
//! either has a wall (bounce) or is an open passage, in which case the
//! perpendicular faces are checked for wall stubs at the corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::coords::GridMetrics;
use super::maze::{Cell, Direction, Maze};
use super::state::Bullet;

/// Faces in tie-break order
const FACE_ORDER: [Direction; 4] = [Direction::Right, Direction::Left, Direction::Up, Direction::Down];

/// A bounce that happened this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    /// Cell face the bullet bounced off
    pub face: Direction,
    /// How far past tangency the bullet was before the correction
    pub overshoot: f32,
}

impl Reflection {
    /// Whether the x velocity was flipped (a vertical wall)
    pub fn flips_x(&self) -> bool {
        matches!(self.face, Direction::Left | Direction::Right)
    }
}

/// Fastest bullet that cannot skip a wall in one tick
///
/// Per tick a bullet must not move past the middle of a wall, otherwise the
/// cell lookup already places it on the far side.
pub fn max_safe_speed(metrics: &GridMetrics, radius: f32) -> f32 {
    radius + metrics.wall_thickness / 2.0
}

/// Resolve `bullet` against the walls of its cell
///
/// On a bounce the bullet is moved back along its path until it is tangent to
/// the face, then the velocity component normal to the face is negated. Speed
/// is preserved. Bullets outside the interior are left alone.
pub fn reflect(bullet: &mut Bullet, maze: &Maze) -> Option<Reflection> {
    let metrics = maze.metrics();
    let coord = metrics.scene_to_cell(bullet.pos);
    if !maze.contains(coord) {
        return None;
    }

    let cell = maze.cell(coord.row as usize, coord.col as usize);
    let centre = metrics.cell_to_scene(coord.row, coord.col);
    let half = metrics.half_interior();
    let pos = bullet.pos;

    let distance = |face: Direction| match face {
        Direction::Up => pos.y - (centre.y - half),
        Direction::Down => (centre.y + half) - pos.y,
        Direction::Left => pos.x - (centre.x - half),
        Direction::Right => (centre.x + half) - pos.x,
    };

    // min_by keeps the first of equal elements, which gives the tie order
    let primary = FACE_ORDER
        .into_iter()
        .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))?;
    if distance(primary) > bullet.radius {
        return None;
    }

    if !cell.is_open(primary) {
        if !approaching(bullet, primary) {
            return None;
        }
        let d = distance(primary);
        return Some(bounce(bullet, primary, d));
    }

    let face = perpendicular(primary)
        .into_iter()
        .filter(|&side| distance(side) < bullet.radius)
        .filter(|&side| corner_blocked(maze, cell, primary, side))
        .filter(|&side| approaching(bullet, side))
        .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))?;

    let d = distance(face);
    Some(bounce(bullet, face, d))
}

/// Carry a freshly fired bullet from `origin` out to its spawn point
///
/// The bullet starts at `origin` and covers the distance to its current
/// position in steps no longer than its radius, bouncing off walls on the
/// way. A shot fired with the barrel against a wall comes back instead of
/// spawning inside or behind it. `origin` must be a point bullets may occupy,
/// such as the centre of the shooter's hull.
pub fn launch(bullet: &mut Bullet, origin: Vec2, maze: &Maze) -> Vec<Reflection> {
    let mut bounces = Vec::new();
    let speed = bullet.speed();
    if !(speed > 0.0) || !(bullet.radius > 0.0) {
        return bounces;
    }

    let mut remaining = bullet.pos.distance(origin);
    bullet.pos = origin;
    while remaining > 0.0 {
        let step = remaining.min(bullet.radius);
        bullet.pos += bullet.vel / speed * step;
        remaining -= step;
        bounces.extend(reflect(bullet, maze));
    }
    bounces
}

/// Whether the corner between open face `toward` and face `side` has any wall
///
/// The corner is only free when the bullet could pass straight through it:
/// the side is open here, and both neighbours keep the corridor open.
fn corner_blocked(maze: &Maze, cell: &Cell, toward: Direction, side: Direction) -> bool {
    if !cell.is_open(side) || !cell.is_open(toward) {
        return true;
    }

    let ahead = maze.neighbour(cell, toward);
    let beside = maze.neighbour(cell, side);
    match (ahead, beside) {
        (Some(ahead), Some(beside)) => !(ahead.is_open(side) && beside.is_open(toward)),
        _ => true,
    }
}

fn perpendicular(face: Direction) -> [Direction; 2] {
    match face {
        Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
        Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
    }
}

/// Velocity component pointing into `face`
fn approach_speed(bullet: &Bullet, face: Direction) -> f32 {
    match face {
        Direction::Up => -bullet.vel.y,
        Direction::Down => bullet.vel.y,
        Direction::Left => -bullet.vel.x,
        Direction::Right => bullet.vel.x,
    }
}

#[inline]
fn approaching(bullet: &Bullet, face: Direction) -> bool {
    approach_speed(bullet, face) > 0.0
}

/// Back out to tangency along the velocity, then flip the normal component
fn bounce(bullet: &mut Bullet, face: Direction, distance: f32) -> Reflection {
    let overshoot = bullet.radius - distance;
    let speed = bullet.vel.length();
    let cos = approach_speed(bullet, face) / speed;

    let back = overshoot / cos;
    bullet.pos -= bullet.vel / speed * back;

    match face {
        Direction::Left | Direction::Right => bullet.vel.x = -bullet.vel.x,
        Direction::Up | Direction::Down => bullet.vel.y = -bullet.vel.y,
    }

    log::debug!(
        "Bullet {} bounced off {:?} (overshoot {:.3})",
        bullet.id,
        face,
        overshoot
    );

    Reflection { face, overshoot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::CellCoord;
    use crate::settings::ArenaConfig;
    use crate::sim::state::BulletPool;
    use proptest::prelude::*;

    fn bullet(pos: Vec2, vel: Vec2) -> Bullet {
        let config = ArenaConfig::default();
        let mut pool = BulletPool::new(&config);
        pool.fire(0, pos, 0.0, &config);
        let mut bullet = pool.active().next().expect("active bullet").clone();
        bullet.vel = vel;
        bullet
    }

    fn closed_maze() -> Maze {
        Maze::with_passages(3, 3, GridMetrics::default(), [])
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_head_on_bounce() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(10.0, 85.0), Vec2::new(-6.0, 0.0));

        let hit = reflect(&mut b, &maze).expect("bounce");
        assert_eq!(hit.face, Direction::Left);
        assert!(hit.flips_x());
        assert!((hit.overshoot - 4.0).abs() < 1e-6);
        assert!(approx(b.vel, Vec2::new(6.0, 0.0)));
        assert!(approx(b.pos, Vec2::new(14.0, 85.0)));
    }

    #[test]
    fn test_oblique_bounce_backs_out_along_path() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(12.0, 100.0), Vec2::new(-6.0, 3.0));

        reflect(&mut b, &maze).expect("bounce");
        assert!(approx(b.pos, Vec2::new(14.0, 99.0)));
        assert!(approx(b.vel, Vec2::new(6.0, 3.0)));
    }

    #[test]
    fn test_no_contact_is_noop() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(80.0, 85.0), Vec2::new(-6.0, 0.0));
        assert_eq!(reflect(&mut b, &maze), None);
        assert_eq!(b.vel, Vec2::new(-6.0, 0.0));
        assert_eq!(b.pos, Vec2::new(80.0, 85.0));
    }

    #[test]
    fn test_outside_grid_is_noop() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(-50.0, -50.0), Vec2::new(1.0, 1.0));
        assert_eq!(reflect(&mut b, &maze), None);
        assert_eq!(b.pos, Vec2::new(-50.0, -50.0));
    }

    #[test]
    fn test_receding_bullet_is_not_bounced() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(12.0, 85.0), Vec2::new(6.0, 0.0));
        assert_eq!(reflect(&mut b, &maze), None);
        assert_eq!(b.vel, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_resting_bullet_is_not_bounced() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(11.0, 85.0), Vec2::ZERO);
        assert_eq!(reflect(&mut b, &maze), None);
    }

    #[test]
    fn test_open_passage_lets_bullet_through() {
        let maze = Maze::with_passages(3, 3, GridMetrics::default(), [(1, 1, Direction::Right)]);
        let mut b = bullet(Vec2::new(157.0, 85.0), Vec2::new(6.0, 0.0));
        assert_eq!(reflect(&mut b, &maze), None);
        assert_eq!(b.vel, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_corner_tie_picks_one_face() {
        let maze = closed_maze();
        // Equally close to the left and top faces
        let mut b = bullet(Vec2::new(12.0, 12.0), Vec2::new(-3.0, -3.0));
        let hit = reflect(&mut b, &maze).expect("bounce");
        assert_eq!(hit.face, Direction::Left);
        assert!(approx(b.vel, Vec2::new(3.0, -3.0)));
    }

    #[test]
    fn test_corner_stub_of_neighbour_wall() {
        // (2,2) opens down and left, (2,1) opens down, but (3,1)|(3,2) is
        // walled: its top end pokes into the corner
        let maze = Maze::with_passages(
            3,
            3,
            GridMetrics::default(),
            [(2, 2, Direction::Down), (2, 2, Direction::Left), (2, 1, Direction::Down)],
        );
        assert_eq!(maze.metrics().scene_to_cell(Vec2::new(173.0, 319.0)), CellCoord::new(2, 2));

        let mut b = bullet(Vec2::new(173.0, 319.0), Vec2::new(-3.0, 3.0));
        let hit = reflect(&mut b, &maze).expect("bounce");
        assert_eq!(hit.face, Direction::Left);
        assert!(approx(b.pos, Vec2::new(174.0, 318.0)));
        assert!(approx(b.vel, Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_open_corner_passes() {
        let maze = Maze::with_passages(
            3,
            3,
            GridMetrics::default(),
            [
                (2, 2, Direction::Down),
                (2, 2, Direction::Left),
                (2, 1, Direction::Down),
                (3, 2, Direction::Left),
            ],
        );
        let mut b = bullet(Vec2::new(173.0, 319.0), Vec2::new(-3.0, 3.0));
        assert_eq!(reflect(&mut b, &maze), None);
    }

    #[test]
    fn test_side_wall_next_to_open_face() {
        let maze = Maze::with_passages(3, 3, GridMetrics::default(), [(2, 2, Direction::Down)]);
        let mut b = bullet(Vec2::new(173.0, 319.0), Vec2::new(-3.0, 3.0));
        let hit = reflect(&mut b, &maze).expect("bounce");
        assert_eq!(hit.face, Direction::Left);
        assert!(approx(b.vel, Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_bouncing_forever_stays_in_cell() {
        let maze = closed_maze();
        let centre = maze.cell_center(2, 2);
        let mut b = bullet(centre, Vec2::new(7.5, 0.0));

        let mut bounces = 0;
        for _ in 0..2_000 {
            b.advance();
            if reflect(&mut b, &maze).is_some() {
                bounces += 1;
            }
            assert_eq!(maze.metrics().scene_to_cell(b.pos), CellCoord::new(2, 2));
            assert!((b.vel.length() - 7.5).abs() < 1e-4);
        }
        assert!(bounces > 90);
    }

    #[test]
    fn test_max_safe_speed() {
        assert_eq!(max_safe_speed(&GridMetrics::default(), 4.0), 9.0);
    }

    #[test]
    fn test_launch_in_open_space_keeps_spawn_point() {
        let maze = closed_maze();
        let mut b = bullet(Vec2::new(124.0, 85.0), Vec2::new(6.0, 0.0));
        assert!(launch(&mut b, Vec2::new(85.0, 85.0), &maze).is_empty());
        assert!(approx(b.pos, Vec2::new(124.0, 85.0)));
        assert!(approx(b.vel, Vec2::new(6.0, 0.0)));
    }

    #[test]
    fn test_launch_through_wall_comes_back() {
        let maze = closed_maze();
        // Spawn point x = 323 is inside the wall right of (2, 2)
        let mut b = bullet(Vec2::new(323.0, 245.0), Vec2::new(6.0, 0.0));
        let bounces = launch(&mut b, Vec2::new(284.0, 245.0), &maze);

        assert_eq!(bounces.len(), 1);
        assert_eq!(bounces[0].face, Direction::Right);
        assert!(approx(b.pos, Vec2::new(309.0, 245.0)));
        assert!(approx(b.vel, Vec2::new(-6.0, 0.0)));
        assert_eq!(maze.metrics().scene_to_cell(b.pos), CellCoord::new(2, 2));
    }

    proptest! {
        #[test]
        fn prop_bounce_never_tunnels(
            speed in 0.5f32..8.9,
            angle in -1.2f32..1.2,
            lead in 0.0f32..1.0,
            dy in -40.0f32..40.0,
        ) {
            let maze = closed_maze();
            let metrics = *maze.metrics();
            let centre = maze.cell_center(2, 2);
            let face_x = centre.x - metrics.half_interior();
            let radius = ArenaConfig::default().bullet_radius;

            // Heading into the left wall, starting no closer than tangent
            let vel = Vec2::new(-angle.cos(), angle.sin()) * speed;
            let start = Vec2::new(face_x + radius + lead * -vel.x, centre.y + dy);
            let mut b = bullet(start, vel);

            b.advance();
            let in_reach = b.pos.x - face_x <= radius;
            let hit = reflect(&mut b, &maze);

            prop_assert_eq!(hit.is_some(), in_reach);
            prop_assert!((b.vel.length() - speed).abs() < 1e-3);
            prop_assert!(b.pos.x - face_x >= radius - 1e-3);
            prop_assert_eq!(metrics.scene_to_cell(b.pos), CellCoord::new(2, 2));
            if let Some(hit) = hit {
                prop_assert_eq!(hit.face, Direction::Left);
                prop_assert!(b.vel.x > 0.0);
                prop_assert!((b.vel.y - vel.y).abs() < 1e-6);
            }
        }
    }
}
