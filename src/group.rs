//! One animated point cloud and its fall/rise state machine.

use crate::reference::ReferenceBuffer;
use glam::Vec3;

/// Speed a group starts with before its first fall.
pub const INITIAL_SPEED: f32 = 15.0;

/// Speed every phase transition resets to.
pub const TRANSITION_SPEED: f32 = 2.0;

/// Frames a completed phase waits after every transition.
pub const TRANSITION_DELAY: i32 = 120;

/// Which half of the cycle a group is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Waiting for the start countdown to expire.
    #[default]
    Idle,
    /// Scattering downward until every particle reaches the floor.
    Falling,
    /// Returning to the reference positions.
    Rising,
}

impl Direction {
    /// Signed representation: `0`, `-1` or `+1`.
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Idle => 0,
            Direction::Falling => -1,
            Direction::Rising => 1,
        }
    }
}

/// Where a group's geometry sits in the world and how it is tinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Uniform scale applied to every clone.
    pub scale: f32,
    /// Origin that clone offsets are added to.
    pub origin: Vec3,
    /// Accent colour (linear RGB, 0-1) for the source clone.
    pub color: Vec3,
}

impl Placement {
    /// Placement from a `0xRRGGBB` colour.
    pub fn new(scale: f32, origin: Vec3, color: u32) -> Self {
        Self {
            scale,
            origin,
            color: color_from_hex(color),
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(1.0, Vec3::ZERO, 0xffffff)
    }
}

/// Convert `0xRRGGBB` to an RGB vector in 0-1.
pub fn color_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Live positions of one model plus the counters that drive its cycle.
///
/// The group exclusively owns its position buffer. Clones in a
/// [`CloneField`](crate::CloneField) only ever read it at render time.
#[derive(Debug, Clone)]
pub struct ParticleGroup {
    name: String,
    reference: ReferenceBuffer,
    placement: Placement,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) direction: Direction,
    pub(crate) vertices_down: usize,
    pub(crate) vertices_up: usize,
    pub(crate) speed: f32,
    pub(crate) delay: i32,
    pub(crate) start: i32,
    pub(crate) needs_upload: bool,
}

impl ParticleGroup {
    /// Seed a group from its reference buffer.
    ///
    /// `rand` must yield uniform values in `[0, 1)`; it draws the initial
    /// delay (`200..400` frames) and start countdown (`500..700` frames).
    pub fn new<F>(
        name: impl Into<String>,
        reference: ReferenceBuffer,
        placement: Placement,
        mut rand: F,
    ) -> Self
    where
        F: FnMut() -> f32,
    {
        let delay = (200.0 + 200.0 * rand()).floor() as i32;
        let start = (500.0 + 200.0 * rand()).floor() as i32;
        Self {
            name: name.into(),
            positions: reference.as_slice().to_vec(),
            reference,
            placement,
            direction: Direction::Idle,
            vertices_down: 0,
            vertices_up: 0,
            speed: INITIAL_SPEED,
            delay,
            start,
            needs_upload: true,
        }
    }

    /// Override the start countdown.
    pub fn with_start(mut self, start: i32) -> Self {
        self.start = start;
        self
    }

    /// Override the settle delay.
    pub fn with_delay(mut self, delay: i32) -> Self {
        self.delay = delay;
        self
    }

    /// Override the displacement speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Force a direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Replace the live positions.
    ///
    /// # Panics
    ///
    /// Panics if the count differs from the reference buffer.
    pub fn with_positions(mut self, positions: Vec<Vec3>) -> Self {
        assert_eq!(
            positions.len(),
            self.reference.len(),
            "live positions must match the reference buffer"
        );
        self.positions = positions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &ReferenceBuffer {
        &self.reference
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Current positions, one per particle.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Number of particles.
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn vertices_down(&self) -> usize {
        self.vertices_down
    }

    pub fn vertices_up(&self) -> usize {
        self.vertices_up
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn delay(&self) -> i32 {
        self.delay
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    /// Whether positions changed since the renderer last uploaded them.
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Called by the renderer once the buffer is on the GPU.
    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }
}
