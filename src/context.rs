//! The frame driver's state.
//!
//! [`AnimationContext`] is built once at startup and passed to whoever
//! drives frames. It owns the clock, every registered group with its
//! clones, the decoration and the parent rotation. One call to
//! [`AnimationContext::advance_frame`] is one frame of the scene:
//!
//! 1. register any models whose loads have completed,
//! 2. read the clock and clamp the delta,
//! 3. turn the parent,
//! 4. step every group in registration order.
//!
//! Rendering happens afterwards and only reads from the context.

use crate::animation::{clamp_delta, AnimationStep};
use crate::clone_field::{CloneField, GroupId};
use crate::decoration::{self, DecorationItem};
use crate::group::{Direction, ParticleGroup};
use crate::loader::{GroupSeed, LoadEvent};
use crate::time::Time;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::{Receiver, TryRecvError};

/// Auxiliary parameter handed to the compositor every frame.
pub const COMPOSER_TICK: f32 = 0.01;

/// Parent rotation per unit of simulation delta.
pub const PARENT_SPIN: f32 = -0.005;

/// A registered group and its duplicates.
#[derive(Debug, Clone)]
pub struct Figure {
    pub group: ParticleGroup,
    pub clones: CloneField,
}

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Clamped simulation delta used for this frame.
    pub delta: f32,
    /// Groups registered before the update pass.
    pub registered: usize,
    /// Directions engaged this frame.
    pub transitions: Vec<(GroupId, Direction)>,
}

/// Process-wide animation state.
pub struct AnimationContext {
    time: Time,
    step: AnimationStep,
    rng: SmallRng,
    figures: Vec<Figure>,
    decoration: Vec<DecorationItem>,
    rotation_y: f32,
    pending: Option<Receiver<LoadEvent>>,
}

impl AnimationContext {
    /// Create a context with no groups yet.
    ///
    /// `seed` fixes the random stream; `None` seeds from the OS.
    pub fn new(step: AnimationStep, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            time: Time::new(),
            step,
            rng,
            figures: Vec::new(),
            decoration: decoration::build(),
            rotation_y: 0.0,
            pending: None,
        }
    }

    /// Receive completed loads from `receiver`.
    pub fn with_loads(mut self, receiver: Receiver<LoadEvent>) -> Self {
        self.pending = Some(receiver);
        self
    }

    /// Register a loaded model as a new group with its clone field.
    pub fn register(&mut self, seed: GroupSeed) -> GroupId {
        let id = GroupId(self.figures.len());
        let rng = &mut self.rng;
        let group = ParticleGroup::new(seed.name, seed.reference, seed.placement, || rng.gen());
        let clones = CloneField::new(id, &seed.placement, || rng.gen());
        log::info!(
            "Registered '{}' with {} particles (starts in {} frames)",
            group.name(),
            group.particle_count(),
            group.start()
        );
        self.figures.push(Figure { group, clones });
        id
    }

    /// Register every load that has completed since the last call.
    ///
    /// Failed loads are logged and otherwise ignored.
    pub fn drain_pending(&mut self) -> usize {
        let mut seeds = Vec::new();
        if let Some(receiver) = &self.pending {
            loop {
                match receiver.try_recv() {
                    Ok(LoadEvent::Loaded(seed)) => seeds.push(seed),
                    Ok(LoadEvent::Failed { name, error }) => {
                        log::warn!("Model '{}' failed to load: {}", name, error);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.pending = None;
                        break;
                    }
                }
            }
        }

        let registered = seeds.len();
        for seed in seeds {
            self.register(seed);
        }
        registered
    }

    /// Advance one frame using the wall clock.
    pub fn advance_frame(&mut self) -> FrameReport {
        let raw = self.time.update();
        self.advance(raw)
    }

    /// Advance one frame by `raw_seconds` of wall time.
    pub fn advance(&mut self, raw_seconds: f32) -> FrameReport {
        let registered = self.drain_pending();
        let delta = clamp_delta(raw_seconds);

        self.rotation_y = decoration::wrap_angle(self.rotation_y + PARENT_SPIN * delta);

        let mut transitions = Vec::new();
        let step = self.step;
        let rng = &mut self.rng;
        let mut rand = || rng.gen::<f32>();
        for (i, figure) in self.figures.iter_mut().enumerate() {
            if let Some(direction) = step.advance(&mut figure.group, delta, &mut rand) {
                log::debug!("'{}' is now {:?}", figure.group.name(), direction);
                transitions.push((GroupId(i), direction));
            }
        }

        FrameReport {
            delta,
            registered,
            transitions,
        }
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn figures_mut(&mut self) -> &mut [Figure] {
        &mut self.figures
    }

    pub fn decoration(&self) -> &[DecorationItem] {
        &self.decoration
    }

    /// Current parent rotation about Y, in radians.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Whether loads may still arrive.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Placement;
    use crate::reference::ReferenceBuffer;
    use glam::Vec3;
    use std::sync::mpsc;

    fn seed(name: &str) -> GroupSeed {
        GroupSeed {
            name: name.to_string(),
            reference: ReferenceBuffer::new(vec![Vec3::new(0.0, 10.0, 0.0); 8]),
            placement: Placement::default(),
        }
    }

    #[test]
    fn test_register_assigns_ids_in_order() {
        let mut ctx = AnimationContext::new(AnimationStep::default(), Some(7));
        assert_eq!(ctx.register(seed("a")), GroupId(0));
        assert_eq!(ctx.register(seed("b")), GroupId(1));
        assert_eq!(ctx.figures()[1].group.name(), "b");
        assert_eq!(ctx.figures()[1].clones.group(), GroupId(1));
    }

    #[test]
    fn test_rotation_follows_clamped_delta() {
        let mut ctx = AnimationContext::new(AnimationStep::default(), Some(1));
        let report = ctx.advance(1.0);
        assert_eq!(report.delta, 2.0);
        assert!((ctx.rotation_y() - (-0.01)).abs() < 1e-7);
    }

    #[test]
    fn test_pending_loads_register_before_update() {
        let (tx, rx) = mpsc::channel();
        let mut ctx = AnimationContext::new(AnimationStep::default(), Some(3)).with_loads(rx);

        let report = ctx.advance(0.016);
        assert_eq!(report.registered, 0);
        assert!(ctx.figures().is_empty());

        tx.send(LoadEvent::Loaded(seed("late"))).unwrap();
        tx.send(LoadEvent::Failed {
            name: "broken".to_string(),
            error: crate::error::LoadError::NoVertices,
        })
        .unwrap();

        let report = ctx.advance(0.016);
        assert_eq!(report.registered, 1);
        assert_eq!(ctx.figures().len(), 1);
        // Stepped in the same frame it registered.
        assert!(ctx.figures()[0].group.start() < 700);
    }

    #[test]
    fn test_disconnected_channel_stops_loading() {
        let (tx, rx) = mpsc::channel::<LoadEvent>();
        let mut ctx = AnimationContext::new(AnimationStep::default(), Some(3)).with_loads(rx);
        assert!(ctx.is_loading());
        drop(tx);
        ctx.advance(0.016);
        assert!(!ctx.is_loading());
    }

    #[test]
    fn test_decoration_is_built() {
        let ctx = AnimationContext::new(AnimationStep::default(), Some(0));
        assert_eq!(ctx.decoration().len(), 2);
    }
}
