//! Presentational duplicates of a particle group.
//!
//! Each loaded figure is drawn many times around the scene. Every copy
//! shares the live position buffer of its group, so whatever the animation
//! step writes shows up in all of them, but each copy has its own world
//! offset. The last copy marks the source figure and takes the group's
//! accent colour.

use crate::group::{color_from_hex, Placement};
use glam::{Mat4, Vec3};

/// Offsets of the duplicates relative to the group origin.
pub const CLONE_OFFSETS: [[f32; 3]; 12] = [
    [5000.0, 0.0, -3000.0],
    [4000.0, 0.0, 0.0],
    [1000.0, 0.0, 4000.0],
    [1000.0, 0.0, -5000.0],
    [4000.0, 0.0, 2000.0],
    [900.0, 0.0, -900.0],
    [800.0, 0.0, 800.0],
    [-900.0, 0.0, -500.0],
    [-2000.0, 0.0, 300.0],
    [-4000.0, 0.0, 1000.0],
    [-5000.0, 0.0, -5000.0],
    [0.0, 0.0, 0.0],
];

/// Colour shared by every duplicate except the source.
pub const CLONE_COLOR: u32 = 0x4500d1;

/// Point size of figure clones.
pub const CLONE_POINT_SIZE: f32 = 20.0;

/// Base drift speed; each clone adds a uniform `[0, 1)` jitter.
pub const CLONE_BASE_SPEED: f32 = 0.03;

/// Index of a registered particle group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// One duplicate: a world offset, a colour and its own drift speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloneEntry {
    pub offset: Vec3,
    pub speed: f32,
    pub color: Vec3,
}

/// All duplicates of one group.
#[derive(Debug, Clone)]
pub struct CloneField {
    group: GroupId,
    scale: f32,
    origin: Vec3,
    entries: Vec<CloneEntry>,
}

impl CloneField {
    /// Lay out the standard twelve duplicates for `group`.
    ///
    /// `rand` draws one speed jitter per clone.
    pub fn new<F>(group: GroupId, placement: &Placement, mut rand: F) -> Self
    where
        F: FnMut() -> f32,
    {
        let shared = color_from_hex(CLONE_COLOR);
        let last = CLONE_OFFSETS.len() - 1;
        let entries = CLONE_OFFSETS
            .iter()
            .enumerate()
            .map(|(i, offset)| CloneEntry {
                offset: Vec3::from_array(*offset),
                speed: CLONE_BASE_SPEED + rand(),
                color: if i < last { shared } else { placement.color },
            })
            .collect();

        Self {
            group,
            scale: placement.scale,
            origin: placement.origin,
            entries,
        }
    }

    /// The group whose buffer every entry draws.
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn entries(&self) -> &[CloneEntry] {
        &self.entries
    }

    /// The clone drawn in the group's accent colour.
    pub fn source(&self) -> Option<&CloneEntry> {
        self.entries.last()
    }

    /// World transform of entry `i` under a parent rotated by `parent_rotation_y`.
    pub fn world_matrix(&self, i: usize, parent_rotation_y: f32) -> Mat4 {
        let entry = &self.entries[i];
        Mat4::from_rotation_y(parent_rotation_y)
            * Mat4::from_translation(self.origin + entry.offset)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}
