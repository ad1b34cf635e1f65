//! Small 2D geometry kernel
//!
//! Everything the SAT detector and the tank/bullet tests need on top of `glam`.

use glam::Vec2;

/// Rotate `point` by `angle` radians about `center`
#[inline]
pub fn rotate_point(point: Vec2, center: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    let p = point - center;
    Vec2::new(p.x * c - p.y * s, p.x * s + p.y * c) + center
}

/// Scalar projection extrema of a point set on `axis`
///
/// `points` must not be empty.
pub fn project_polygon(axis: Vec2, points: &[Vec2]) -> (f32, f32) {
    debug_assert!(!points.is_empty(), "cannot project an empty polygon");

    let first = points[0].dot(axis);
    points[1..].iter().fold((first, first), |(min, max), p| {
        let proj = p.dot(axis);
        (min.min(proj), max.max(proj))
    })
}

/// One normalized normal per polygon edge
///
/// Zero-length edges have no normal and are skipped.
pub fn polygon_axes(points: &[Vec2]) -> Vec<Vec2> {
    let mut axes = Vec::with_capacity(points.len());
    for (i, &p1) in points.iter().enumerate() {
        let p2 = points[(i + 1) % points.len()];
        let edge = p2 - p1;
        let normal = Vec2::new(-edge.y, edge.x);

        let len = normal.length();
        debug_assert!(len > f32::EPSILON, "degenerate polygon edge at {p1}");
        if len <= f32::EPSILON {
            continue;
        }
        axes.push(normal / len);
    }
    axes
}

/// Closed interval overlap; touching intervals overlap
#[inline]
pub fn intervals_overlap(min_a: f32, max_a: f32, min_b: f32, max_b: f32) -> bool {
    !(max_a < min_b || max_b < min_a)
}

/// Corners of a rectangle in winding order, rotated about its center
pub fn rect_corners(center: Vec2, half_extents: Vec2, rotation: f32) -> [Vec2; 4] {
    let local = [
        Vec2::new(-half_extents.x, -half_extents.y),
        Vec2::new(half_extents.x, -half_extents.y),
        Vec2::new(half_extents.x, half_extents.y),
        Vec2::new(-half_extents.x, half_extents.y),
    ];
    if rotation == 0.0 {
        return local.map(|p| p + center);
    }
    local.map(|p| rotate_point(p + center, center, rotation))
}
