//! # Scatterform
//!
//! Point-cloud figures that fall apart onto the floor and pull themselves
//! back together, rendered with wgpu.
//!
//! ## Quick Start
//!
//! ```ignore
//! use scatterform::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     Scene::new()
//!         .with_default_models()
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Groups
//!
//! Every loaded model becomes a [`ParticleGroup`]: one live position per
//! triangle corner of the mesh, plus a read-only [`ReferenceBuffer`] holding
//! the rest shape. The live buffer is the only thing that moves.
//!
//! ### The cycle
//!
//! A group waits out its start countdown, then cycles forever:
//!
//! ```text
//! Idle --start elapsed--> Falling --all on floor, delay--> Rising
//!                            ^                               |
//!                            +------ all home, delay --------+
//! ```
//!
//! Falling particles drop at a per-group speed with a random sideways
//! jitter until they land on the floor plane. Rising particles walk back
//! toward their reference points along a per-axis approach and count as
//! home once they are close. See [`AnimationStep`] for the exact update.
//!
//! ### Clones
//!
//! Each group is drawn twelve times at fixed offsets around the scene
//! ([`CloneField`]). Every clone shares the group's live buffer, so they
//! all move in lockstep.
//!
//! ### Frames
//!
//! [`AnimationContext`] owns everything that changes between frames.
//! One [`AnimationContext::advance_frame`] registers finished loads, clamps
//! the frame delta, turns the parent and steps every group. The renderer
//! then uploads whatever changed and composites bloom, film grain and a
//! focus blur on top.
//!
//! ## Determinism
//!
//! Randomness flows through closures returning `[0, 1)` values, and the
//! context can be seeded with [`Scene::with_seed`], so runs repeat exactly
//! when given the same frame deltas.

pub mod animation;
pub mod clone_field;
pub mod context;
pub mod decoration;
pub mod error;
mod gpu;
pub mod group;
pub mod loader;
pub mod reference;
mod scene;
pub mod shader;
pub mod time;

pub use animation::{clamp_delta, AnimationStep, ZeroAxisPolicy};
pub use clone_field::{CloneEntry, CloneField, GroupId};
pub use context::{AnimationContext, Figure, FrameReport};
pub use decoration::DecorationItem;
pub use error::{GpuError, LoadError, SceneError};
pub use glam::{Mat4, Vec2, Vec3};
pub use gpu::Camera;
pub use group::{Direction, ParticleGroup, Placement};
pub use loader::{GroupSeed, LoadEvent, MeshLoader, ModelSpec};
pub use reference::ReferenceBuffer;
pub use scene::Scene;
pub use time::Time;

/// Convenient imports for building a scene.
pub mod prelude {
    pub use crate::animation::{AnimationStep, ZeroAxisPolicy};
    pub use crate::context::AnimationContext;
    pub use crate::error::SceneError;
    pub use crate::group::{Direction, ParticleGroup, Placement};
    pub use crate::loader::{default_models, ModelSpec};
    pub use crate::reference::ReferenceBuffer;
    pub use crate::scene::Scene;
    pub use crate::{Vec2, Vec3};
}
