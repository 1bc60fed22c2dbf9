//! Static point-cloud decoration: the ground grid and the heart emblem.
//!
//! Neither has any animation state of its own. Both hang under the scene
//! parent, whose Y rotation is advanced every frame by the
//! [`AnimationContext`](crate::AnimationContext).

use crate::group::color_from_hex;
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// Grid plane edge length.
pub const GRID_SIZE: f32 = 15000.0;
/// Grid segments per edge.
pub const GRID_SEGMENTS: usize = 256;
/// Grid height below the scene origin.
pub const GRID_HEIGHT: f32 = -400.0;

/// Samples per Bézier segment of the emblem outline.
pub const EMBLEM_CURVE_SEGMENTS: usize = 100;
/// Bevel layers between the emblem's front and back.
pub const EMBLEM_BEVEL_SEGMENTS: usize = 100;
/// Bevel depth on each side of the outline.
pub const EMBLEM_BEVEL_THICKNESS: f32 = 15.0;
/// How far the bevel widens the outline.
pub const EMBLEM_BEVEL_SIZE: f32 = 3.0;

/// One static point cloud with its local transform under the parent.
#[derive(Debug, Clone)]
pub struct DecorationItem {
    pub label: &'static str,
    pub points: Vec<Vec3>,
    pub color: Vec3,
    pub point_size: f32,
    pub local: Mat4,
}

impl DecorationItem {
    /// World transform under a parent rotated by `parent_rotation_y`.
    pub fn world_matrix(&self, parent_rotation_y: f32) -> Mat4 {
        Mat4::from_rotation_y(parent_rotation_y) * self.local
    }
}

/// Build the grid and emblem.
pub fn build() -> Vec<DecorationItem> {
    vec![ground_grid(), heart_emblem()]
}

/// A flat grid of points lying on the floor.
pub fn ground_grid() -> DecorationItem {
    let step = GRID_SIZE / GRID_SEGMENTS as f32;
    let half = GRID_SIZE / 2.0;
    let mut points = Vec::with_capacity((GRID_SEGMENTS + 1) * (GRID_SEGMENTS + 1));
    for iy in 0..=GRID_SEGMENTS {
        let y = iy as f32 * step - half;
        for ix in 0..=GRID_SEGMENTS {
            let x = ix as f32 * step - half;
            points.push(Vec3::new(x, -y, 0.0));
        }
    }

    DecorationItem {
        label: "grid",
        points,
        color: color_from_hex(0xc3dbe5),
        point_size: 30.0,
        local: Mat4::from_translation(Vec3::new(0.0, GRID_HEIGHT, 0.0))
            * Mat4::from_rotation_x(FRAC_PI_2),
    }
}

/// Control points of the heart outline: start, then (c1, c2, end) per segment.
const HEART_START: [f32; 2] = [5.0, 5.0];
const HEART_SEGMENTS: [[[f32; 2]; 3]; 6] = [
    [[5.0, 5.0], [4.0, 0.0], [0.0, 0.0]],
    [[-6.0, 0.0], [-6.0, 7.0], [-6.0, 7.0]],
    [[-6.0, 11.0], [-3.0, 15.4], [5.0, 19.0]],
    [[12.0, 15.4], [16.0, 11.0], [16.0, 7.0]],
    [[16.0, 7.0], [16.0, 0.0], [10.0, 0.0]],
    [[7.0, 0.0], [5.0, 5.0], [5.0, 5.0]],
];

fn cubic(p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}

/// Sampled heart outline in shape space, without the closing duplicate.
pub fn heart_outline() -> Vec<Vec2> {
    let mut outline = Vec::with_capacity(HEART_SEGMENTS.len() * EMBLEM_CURVE_SEGMENTS);
    let mut from = Vec2::from_array(HEART_START);
    for [c1, c2, to] in HEART_SEGMENTS {
        let (c1, c2, to) = (Vec2::from_array(c1), Vec2::from_array(c2), Vec2::from_array(to));
        for i in 0..EMBLEM_CURVE_SEGMENTS {
            let t = i as f32 / EMBLEM_CURVE_SEGMENTS as f32;
            outline.push(cubic(from, c1, c2, to, t));
        }
        from = to;
    }
    outline
}

/// Outward unit normals of a closed outline.
fn outline_normals(outline: &[Vec2]) -> Vec<Vec2> {
    let n = outline.len();
    let centroid = outline.iter().copied().sum::<Vec2>() / n as f32;
    (0..n)
        .map(|i| {
            let prev = outline[(i + n - 1) % n];
            let next = outline[(i + 1) % n];
            let tangent = next - prev;
            let normal = Vec2::new(tangent.y, -tangent.x).normalize_or_zero();
            if normal.dot(outline[i] - centroid) < 0.0 {
                -normal
            } else {
                normal
            }
        })
        .collect()
}

/// The extruded heart, sampled as bevel rings on both faces.
pub fn heart_emblem() -> DecorationItem {
    let outline = heart_outline();
    let normals = outline_normals(&outline);

    let mut points = Vec::with_capacity(outline.len() * (EMBLEM_BEVEL_SEGMENTS + 1) * 2);
    for b in 0..=EMBLEM_BEVEL_SEGMENTS {
        let t = b as f32 / EMBLEM_BEVEL_SEGMENTS as f32;
        let z = EMBLEM_BEVEL_THICKNESS * (t * FRAC_PI_2).cos();
        let grow = EMBLEM_BEVEL_SIZE * (t * FRAC_PI_2).sin();
        for (p, n) in outline.iter().zip(&normals) {
            let q = *p + *n * grow;
            points.push(Vec3::new(q.x, q.y, -z));
            points.push(Vec3::new(q.x, q.y, z));
        }
    }

    DecorationItem {
        label: "emblem",
        points,
        color: color_from_hex(0xe400e8),
        point_size: 0.1,
        local: Mat4::from_translation(Vec3::new(-650.0, 400.0, -130.0))
            * Mat4::from_rotation_z(-3.0)
            * Mat4::from_scale(Vec3::splat(38.0)),
    }
}

/// Full turns are irrelevant to the parent; keep the angle bounded.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle % (2.0 * PI);
    if wrapped.is_nan() {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_point_count_and_extent() {
        let grid = ground_grid();
        assert_eq!(grid.points.len(), 257 * 257);
        assert_eq!(grid.points[0], Vec3::new(-7500.0, 7500.0, 0.0));
        assert_eq!(*grid.points.last().unwrap(), Vec3::new(7500.0, -7500.0, 0.0));
    }

    #[test]
    fn test_grid_lies_on_floor() {
        let grid = ground_grid();
        let world = grid.world_matrix(0.7);
        for p in grid.points.iter().step_by(997) {
            let w = world.transform_point3(*p);
            assert!((w.y - GRID_HEIGHT).abs() < 1e-2);
        }
    }

    #[test]
    fn test_heart_outline_is_closed_loop() {
        let outline = heart_outline();
        assert_eq!(outline.len(), 600);
        assert_eq!(outline[0], Vec2::new(5.0, 5.0));
        // The loop's last sample approaches the start again.
        assert!((*outline.last().unwrap() - outline[0]).length() < 0.2);
    }

    #[test]
    fn test_emblem_bevel_stays_within_thickness() {
        let emblem = heart_emblem();
        assert_eq!(emblem.points.len(), 600 * 101 * 2);
        assert!(emblem
            .points
            .iter()
            .all(|p| p.z.abs() <= EMBLEM_BEVEL_THICKNESS + 1e-4));
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-7.0) - (-7.0 + 2.0 * PI)).abs() < 1e-5);
        assert_eq!(wrap_angle(1.0), 1.0);
    }
}
