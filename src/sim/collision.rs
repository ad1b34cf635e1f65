//! Collision detection between tanks, bullets and walls
//!
//! Tanks and walls are rectangles and are tested with the separating axis
//! theorem. Bullets are circles; their wall response lives in `reflect`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::coords::CellCoord;
use super::geometry::{intervals_overlap, polygon_axes, project_polygon, rect_corners};
use super::maze::{Maze, WallId};

/// Shapes used by game objects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    Circle { radius: f32 },
    /// Centered rectangle, rotated with its owner
    Rectangle { half_extents: Vec2 },
}

impl Hitbox {
    /// Overlap test for two placed hitboxes
    pub fn overlaps(&self, pos: Vec2, rotation: f32, other: &Hitbox, other_pos: Vec2, other_rotation: f32) -> bool {
        match (*self, *other) {
            (Hitbox::Circle { radius: ra }, Hitbox::Circle { radius: rb }) => {
                pos.distance_squared(other_pos) <= (ra + rb) * (ra + rb)
            }
            (Hitbox::Circle { radius }, Hitbox::Rectangle { half_extents }) => {
                circle_rect_collision(pos, radius, other_pos, half_extents, other_rotation)
            }
            (Hitbox::Rectangle { half_extents }, Hitbox::Circle { radius }) => {
                circle_rect_collision(other_pos, radius, pos, half_extents, rotation)
            }
            (Hitbox::Rectangle { half_extents: ha }, Hitbox::Rectangle { half_extents: hb }) => {
                let a = rect_corners(pos, ha, rotation);
                let b = rect_corners(other_pos, hb, other_rotation);
                detect_collision(&a, &b)
            }
        }
    }
}

/// SAT overlap test for two convex polygons
///
/// Every edge normal of both polygons is a candidate separating axis; the first
/// axis on which the projections do not overlap ends the test.
pub fn detect_collision(a: &[Vec2], b: &[Vec2]) -> bool {
    polygon_axes(a)
        .into_iter()
        .chain(polygon_axes(b))
        .all(|axis| {
            let (min_a, max_a) = project_polygon(axis, a);
            let (min_b, max_b) = project_polygon(axis, b);
            intervals_overlap(min_a, max_a, min_b, max_b)
        })
}

/// Circle vs rotated rectangle: closest point in the rectangle's local frame
pub fn circle_rect_collision(
    circle_pos: Vec2,
    radius: f32,
    rect_pos: Vec2,
    half_extents: Vec2,
    rotation: f32,
) -> bool {
    let (sin, cos) = rotation.sin_cos();
    let d = circle_pos - rect_pos;
    let local = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos);

    let closest = local.clamp(-half_extents, half_extents);
    local.distance_squared(closest) <= radius * radius
}

/// First wall near `pos` that overlaps the polygon `corners`
///
/// Only the walls a body centred in `pos`'s cell can reach are tested.
pub fn first_wall_overlap(corners: &[Vec2], pos: Vec2, maze: &Maze) -> Option<WallId> {
    let coord: CellCoord = maze.metrics().scene_to_cell(pos);
    maze.walls_near(coord)
        .find(|wall| detect_collision(corners, &wall.corners()))
        .map(|wall| wall.id)
}
