//! Per-frame fall/rise update for particle groups.
//!
//! Every frame each [`ParticleGroup`] is advanced once:
//!
//! 1. The start countdown ticks; when it is exhausted an idle group
//!    begins falling.
//! 2. Every particle moves according to the group's direction:
//!    - **Falling**: particles above the floor (`y > 0`) drift by a random
//!      amount biased downward; particles on or below it stay put and are
//!      counted in `vertices_down`.
//!    - **Rising**: particles step toward their reference position on each
//!      axis; those already within the settle distance are counted in
//!      `vertices_up`.
//! 3. Once a counter reaches the particle count the group's delay counts
//!    down, and when it runs out the opposite direction is engaged.
//!
//! The counters are *not* reset per frame. They accumulate particle-frames
//! for the whole phase and only return to zero on a transition.
//!
//! # Settle distance
//!
//! The rising phase measures distance as `dx + dy + dx`. The z axis is not
//! part of it and x is counted twice. Changing this changes how long the
//! figures take to settle, so it is kept as is.
//!
//! # Zero-length axes
//!
//! While rising, each axis moves by `(p - r) / |p - r|`, which is `0 / 0`
//! once that axis has converged exactly. [`ZeroAxisPolicy`] decides what
//! happens then.

use crate::group::{Direction, ParticleGroup, TRANSITION_DELAY, TRANSITION_SPEED};

/// Multiplier from wall-clock seconds to simulation units.
pub const DELTA_SCALE: f32 = 10.0;

/// Largest simulation delta handed to a single step.
pub const MAX_DELTA: f32 = 2.0;

/// Convert a raw frame time into the simulation delta.
///
/// The raw seconds are scaled by [`DELTA_SCALE`] and capped at
/// [`MAX_DELTA`] so a slow frame or a refocused window never produces a
/// large jump. Negative and NaN inputs yield `0.0`.
pub fn clamp_delta(raw_seconds: f32) -> f32 {
    let delta = DELTA_SCALE * raw_seconds;
    if delta.is_nan() || delta <= 0.0 {
        0.0
    } else {
        delta.min(MAX_DELTA)
    }
}

/// What to do with a rising axis whose offset from the reference is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroAxisPolicy {
    /// Leave that axis where it is for this frame.
    #[default]
    Skip,
    /// Divide anyway. The coordinate becomes NaN, matching the reference
    /// scene pixel for pixel.
    Propagate,
}

impl ZeroAxisPolicy {
    #[inline]
    fn approach(self, p: f32, target: f32, distance: f32, amount: f32) -> f32 {
        if self == ZeroAxisPolicy::Skip && distance == 0.0 {
            return p;
        }
        p - (p - target) / distance * amount
    }
}

/// The per-frame update applied to every group.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationStep {
    policy: ZeroAxisPolicy,
}

impl AnimationStep {
    pub fn new(policy: ZeroAxisPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ZeroAxisPolicy {
        self.policy
    }

    /// Advance `group` by one frame.
    ///
    /// `delta` should already be clamped with [`clamp_delta`]. `rand` yields
    /// uniform values in `[0, 1)` and is called independently per axis, per
    /// particle, per frame.
    ///
    /// Returns the direction engaged this frame, if the group started
    /// falling or completed a phase.
    pub fn advance<F>(&self, group: &mut ParticleGroup, delta: f32, rand: &mut F) -> Option<Direction>
    where
        F: FnMut() -> f32,
    {
        let mut engaged = None;

        if group.start > 0 {
            group.start -= 1;
        } else if group.direction == Direction::Idle {
            group.direction = Direction::Falling;
            engaged = Some(Direction::Falling);
        }

        let count = group.positions.len();
        let speed = group.speed;

        match group.direction {
            Direction::Falling => {
                for p in group.positions.iter_mut() {
                    if p.y > 0.0 {
                        p.x += 1.5 * (0.30 - rand()) * speed * delta;
                        p.y += 3.0 * (0.35 - rand()) * speed * delta;
                        p.z += 1.5 * (0.30 - rand()) * speed * delta;
                    } else {
                        group.vertices_down += 1;
                    }
                }
            }
            Direction::Rising => {
                let reference = group.reference().clone();
                let stride = speed * delta;
                for (p, r) in group.positions.iter_mut().zip(reference.as_slice()) {
                    let dx = (p.x - r.x).abs();
                    let dy = (p.y - r.y).abs();
                    let dz = (p.z - r.z).abs();
                    let d = dx + dy + dx;
                    if d > 1.0 {
                        let fx = 0.85 - rand();
                        let fy = 0.95 + rand();
                        let fz = 0.85 - rand();
                        p.x = self.policy.approach(p.x, r.x, dx, stride * fx);
                        p.y = self.policy.approach(p.y, r.y, dy, stride * fy);
                        p.z = self.policy.approach(p.z, r.z, dz, stride * fz);
                    } else {
                        group.vertices_up += 1;
                    }
                }
            }
            Direction::Idle => {}
        }

        // An empty group has nothing to settle.
        if count > 0 {
            if group.vertices_down >= count {
                if group.delay <= 0 {
                    group.direction = Direction::Rising;
                    group.speed = TRANSITION_SPEED;
                    group.vertices_down = 0;
                    group.delay = TRANSITION_DELAY;
                    engaged = Some(Direction::Rising);
                } else {
                    group.delay -= 1;
                }
            }

            if group.vertices_up >= count {
                if group.delay <= 0 {
                    group.direction = Direction::Falling;
                    group.speed = TRANSITION_SPEED;
                    group.vertices_up = 0;
                    group.delay = TRANSITION_DELAY;
                    engaged = Some(Direction::Falling);
                } else {
                    group.delay -= 1;
                }
            }
        }

        group.needs_upload = true;
        engaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Placement;
    use crate::reference::ReferenceBuffer;
    use glam::Vec3;

    fn group_at(reference: Vec<Vec3>) -> ParticleGroup {
        ParticleGroup::new(
            "test",
            ReferenceBuffer::new(reference),
            Placement::default(),
            || 0.0,
        )
        .with_start(0)
    }

    #[test]
    fn test_clamp_delta_scales_and_caps() {
        assert!((clamp_delta(0.016) - 0.16).abs() < 1e-6);
        assert_eq!(clamp_delta(0.2), 2.0);
        assert_eq!(clamp_delta(5.0), 2.0);
        assert_eq!(clamp_delta(f32::INFINITY), 2.0);
        assert_eq!(clamp_delta(0.0), 0.0);
        assert_eq!(clamp_delta(-1.0), 0.0);
        assert_eq!(clamp_delta(f32::NAN), 0.0);
    }

    #[test]
    fn test_falling_displacement_formula() {
        let mut group = group_at(vec![Vec3::new(0.0, 100.0, 0.0)])
            .with_direction(Direction::Falling)
            .with_speed(10.0);
        AnimationStep::default().advance(&mut group, 1.0, &mut || 0.5);

        let p = group.positions()[0];
        assert!((p.x - 1.5 * (0.30 - 0.5) * 10.0).abs() < 1e-4);
        assert!((p.y - (100.0 + 3.0 * (0.35 - 0.5) * 10.0)).abs() < 1e-4);
        assert!((p.z - 1.5 * (0.30 - 0.5) * 10.0).abs() < 1e-4);
        assert_eq!(group.vertices_down(), 0);
    }

    #[test]
    fn test_particles_on_floor_are_counted_not_moved() {
        let mut group = group_at(vec![Vec3::new(3.0, 0.0, 4.0), Vec3::new(1.0, 50.0, 1.0)])
            .with_direction(Direction::Falling);
        AnimationStep::default().advance(&mut group, 1.0, &mut || 0.5);

        assert_eq!(group.positions()[0], Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(group.vertices_down(), 1);
    }

    #[test]
    fn test_settle_counter_accumulates_across_frames() {
        let mut group = group_at(vec![Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1000.0, 0.0)])
            .with_direction(Direction::Falling)
            .with_delay(50);
        let step = AnimationStep::default();

        step.advance(&mut group, 0.0, &mut || 0.5);
        assert_eq!(group.vertices_down(), 1);
        step.advance(&mut group, 0.0, &mut || 0.5);
        assert_eq!(group.vertices_down(), 2);
        // Reaching the particle count through one particle still starts the delay.
        assert_eq!(group.delay(), 49);
    }

    #[test]
    fn test_rising_moves_toward_reference() {
        let mut group = group_at(vec![Vec3::new(0.0, 100.0, 0.0)])
            .with_positions(vec![Vec3::new(10.0, 0.0, -10.0)])
            .with_direction(Direction::Rising)
            .with_speed(2.0);
        AnimationStep::default().advance(&mut group, 1.0, &mut || 0.0);

        let p = group.positions()[0];
        assert!((p.x - (10.0 - 2.0 * 0.85)).abs() < 1e-5);
        assert!((p.y - 2.0 * 0.95).abs() < 1e-5);
        assert!((p.z - (-10.0 + 2.0 * 0.85)).abs() < 1e-5);
        assert_eq!(group.vertices_up(), 0);
    }

    #[test]
    fn test_settle_distance_ignores_z() {
        let reference = Vec3::new(0.0, 10.0, 0.0);
        let mut group = group_at(vec![reference])
            .with_positions(vec![reference + Vec3::new(0.2, 0.2, 50.0)])
            .with_direction(Direction::Rising);
        AnimationStep::default().advance(&mut group, 1.0, &mut || 0.5);

        assert_eq!(group.positions()[0], reference + Vec3::new(0.2, 0.2, 50.0));
        assert_eq!(group.vertices_up(), 1);
    }

    #[test]
    fn test_settle_distance_counts_x_twice() {
        let reference = Vec3::ZERO;
        // dx + dy + dx = 0.6 + 0 + 0.6 > 1 even though the true offset is 0.6.
        let mut group = group_at(vec![reference])
            .with_positions(vec![Vec3::new(0.6, 0.0, 0.0)])
            .with_direction(Direction::Rising);
        AnimationStep::default().advance(&mut group, 0.1, &mut || 0.0);
        assert_eq!(group.vertices_up(), 0);
    }

    #[test]
    fn test_zero_axis_skip_leaves_axis_untouched() {
        let mut group = group_at(vec![Vec3::new(0.0, 50.0, 0.0)])
            .with_positions(vec![Vec3::new(20.0, 50.0, 0.0)])
            .with_direction(Direction::Rising);
        AnimationStep::new(ZeroAxisPolicy::Skip).advance(&mut group, 1.0, &mut || 0.0);

        let p = group.positions()[0];
        assert!(p.is_finite());
        assert_eq!(p.y, 50.0);
        assert_eq!(p.z, 0.0);
        assert!(p.x < 20.0);
    }

    #[test]
    fn test_zero_axis_propagate_yields_nan() {
        let mut group = group_at(vec![Vec3::new(0.0, 50.0, 0.0)])
            .with_positions(vec![Vec3::new(20.0, 50.0, 0.0)])
            .with_direction(Direction::Rising);
        AnimationStep::new(ZeroAxisPolicy::Propagate).advance(&mut group, 1.0, &mut || 0.0);

        let p = group.positions()[0];
        assert!(p.x.is_finite());
        assert!(p.y.is_nan());
        assert!(p.z.is_nan());
    }

    #[test]
    fn test_start_countdown_gates_falling() {
        let mut group = group_at(vec![Vec3::new(0.0, 100.0, 0.0)]).with_start(2);
        let step = AnimationStep::default();

        assert_eq!(step.advance(&mut group, 1.0, &mut || 0.9), None);
        assert_eq!(step.advance(&mut group, 1.0, &mut || 0.9), None);
        assert_eq!(group.positions()[0], Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(group.direction(), Direction::Idle);

        assert_eq!(
            step.advance(&mut group, 1.0, &mut || 0.9),
            Some(Direction::Falling)
        );
        assert!(group.positions()[0].y < 100.0);
    }

    #[test]
    fn test_down_to_up_transition_resets_state() {
        let mut group = group_at(vec![Vec3::new(0.0, 5.0, 0.0)])
            .with_positions(vec![Vec3::new(0.0, -2.0, 0.0)])
            .with_direction(Direction::Falling)
            .with_delay(0);
        let engaged = AnimationStep::default().advance(&mut group, 1.0, &mut || 0.5);

        assert_eq!(engaged, Some(Direction::Rising));
        assert_eq!(group.direction(), Direction::Rising);
        assert_eq!(group.speed(), TRANSITION_SPEED);
        assert_eq!(group.delay(), TRANSITION_DELAY);
        assert_eq!(group.vertices_down(), 0);
    }

    #[test]
    fn test_up_to_down_transition_resets_state() {
        let mut group = group_at(vec![Vec3::new(0.0, 5.0, 0.0)])
            .with_direction(Direction::Rising)
            .with_delay(0);
        let engaged = AnimationStep::default().advance(&mut group, 1.0, &mut || 0.5);

        assert_eq!(engaged, Some(Direction::Falling));
        assert_eq!(group.speed(), TRANSITION_SPEED);
        assert_eq!(group.delay(), TRANSITION_DELAY);
        assert_eq!(group.vertices_up(), 0);
    }

    #[test]
    fn test_step_marks_buffer_dirty() {
        let mut group = group_at(vec![Vec3::ONE]);
        group.mark_uploaded();
        AnimationStep::default().advance(&mut group, 0.0, &mut || 0.0);
        assert!(group.needs_upload());
    }

    #[test]
    fn test_empty_group_never_transitions() {
        let mut group = group_at(Vec::new()).with_delay(0);
        let step = AnimationStep::default();
        for _ in 0..5 {
            step.advance(&mut group, 1.0, &mut || 0.5);
        }
        assert_eq!(group.direction(), Direction::Falling);
        assert_eq!(group.delay(), 0);
    }
}
