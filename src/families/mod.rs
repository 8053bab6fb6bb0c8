//! The particle families and the per-frame inputs they read.
//!
//! Every family follows the same shape: immutable per-particle seeds plus
//! the clock plus its [`ControlState`] produce a new position for every
//! vertex of its [`PointBuffer`]. The families only differ in the geometry
//! rule.
//!
//! | Family | Geometry |
//! |--------|----------|
//! | [`BeamSystem`] | falling column bent by a path table or helix |
//! | [`SwarmSystem`] | eases toward the pointer history, ripples when idle |
//! | [`DriftSystem`] | wrapping Z drift with a soft depth fade |
//! | [`StreakSystem`] | head/tail line pairs stretched along Z |
//! | [`BrainSystem`] | image targets blended from a scatter start |

pub mod beam;
pub mod brain;
pub mod drift;
pub mod streak;
pub mod swarm;

pub use beam::{BeamShape, BeamSystem};
pub use brain::BrainSystem;
pub use drift::DriftSystem;
pub use streak::StreakSystem;
pub use swarm::SwarmSystem;

use glam::{Mat4, Vec3};

use crate::camera::LightBounds;
use crate::cloud::PointBuffer;
use crate::config::{Blend, Sprite};
use crate::control::ControlState;
use crate::input::{MouseTrail, Pointer};

/// Everything an update reads besides its own state.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Global clock time.
    pub time: f32,
    /// Clock increment applied this frame.
    pub step: f32,
    /// Scene-wide beam scatter ratio.
    pub scatter: f32,
    /// Current beam column bounds.
    pub bounds: LightBounds,
    /// Current scroll offset in pixels.
    pub scroll: f32,
    pub pointer: &'a Pointer,
    pub trail: &'a MouseTrail,
}

/// Primitive topology of a system's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// One sprite per vertex.
    Points,
    /// Consecutive vertex pairs form line segments.
    Lines,
}

/// How the renderer draws a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub primitive: Primitive,
    pub color: Vec3,
    /// Attenuated point size; the sprite edge is `size * tan(fov / 2)` world units.
    pub size: f32,
    /// Effective opacity: base opacity times the control multiplier.
    pub opacity: f32,
    pub sprite: Sprite,
    /// Falloff parameter passed to the sprite generator.
    pub blur: f32,
    pub blend: Blend,
    /// Use per-vertex colors instead of `color`.
    pub vertex_colors: bool,
}

/// One particle system of any family.
#[derive(Debug)]
pub enum ParticleSystem {
    Beam(BeamSystem),
    Swarm(SwarmSystem),
    Drift(DriftSystem),
    Streak(StreakSystem),
    Brain(BrainSystem),
}

impl ParticleSystem {
    /// Advance one frame and rewrite the position buffer.
    pub fn update(&mut self, frame: &FrameInput) {
        match self {
            Self::Beam(s) => s.update(frame),
            Self::Swarm(s) => s.update(frame),
            Self::Drift(s) => s.update(frame),
            Self::Streak(s) => s.update(frame),
            Self::Brain(s) => s.update(frame),
        }
    }

    pub fn buffer(&self) -> &PointBuffer {
        match self {
            Self::Beam(s) => s.buffer(),
            Self::Swarm(s) => s.buffer(),
            Self::Drift(s) => s.buffer(),
            Self::Streak(s) => s.buffer(),
            Self::Brain(s) => s.buffer(),
        }
    }

    pub fn buffer_mut(&mut self) -> &mut PointBuffer {
        match self {
            Self::Beam(s) => s.buffer_mut(),
            Self::Swarm(s) => s.buffer_mut(),
            Self::Drift(s) => s.buffer_mut(),
            Self::Streak(s) => s.buffer_mut(),
            Self::Brain(s) => s.buffer_mut(),
        }
    }

    pub fn control(&self) -> &ControlState {
        match self {
            Self::Beam(s) => &s.control,
            Self::Swarm(s) => &s.control,
            Self::Drift(s) => &s.control,
            Self::Streak(s) => &s.control,
            Self::Brain(s) => &s.control,
        }
    }

    pub fn control_mut(&mut self) -> &mut ControlState {
        match self {
            Self::Beam(s) => &mut s.control,
            Self::Swarm(s) => &mut s.control,
            Self::Drift(s) => &mut s.control,
            Self::Streak(s) => &mut s.control,
            Self::Brain(s) => &mut s.control,
        }
    }

    pub fn style(&self) -> DrawStyle {
        match self {
            Self::Beam(s) => s.style(),
            Self::Swarm(s) => s.style(),
            Self::Drift(s) => s.style(),
            Self::Streak(s) => s.style(),
            Self::Brain(s) => s.style(),
        }
    }

    /// Object transform. Identity for everything but the swarm.
    pub fn model(&self) -> Mat4 {
        match self {
            Self::Swarm(s) => s.model(),
            _ => Mat4::IDENTITY,
        }
    }
}

/// `smoothstep` with GLSL semantics, including reversed edges.
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span == 0.0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Wrap `z` into `[-range, range)`.
pub(crate) fn wrap_depth(z: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 0.0;
    }
    z.rem_euclid(range * 2.0) - range
}

/// Upward bend of the far end of a drifting field.
///
/// Returns the `(dx, dy)` displacement for a vertex at `(x, z)`.
pub(crate) fn bend_offset(x: f32, z: f32, range: f32, lift: f32, bend: f32) -> (f32, f32) {
    if bend <= 0.0 || range <= 0.0 {
        return (0.0, 0.0);
    }
    let progress = (z + range) / (range * 2.0);
    let dy = progress.powi(3) * lift * bend;
    (x * dy * 1e-4 * bend, dy)
}
