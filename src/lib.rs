//! # lumenscroll - scroll-driven particle scenes
//!
//! Layered particle systems whose visibility, density, speed and shape are
//! bound to the scroll position of a long document.
//!
//! lumenscroll keeps every particle on the CPU and rewrites one position
//! buffer per system each frame; the renderer only uploads and draws. A
//! declarative binding table maps scroll ranges onto per-system controls, so a
//! whole scene is data: see [`config::SceneConfig`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use lumenscroll::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     env_logger::init();
//!     Viewer::new(presets::portfolio()).run()
//! }
//! ```
//!
//! Or headless, with any [`Renderer`](driver::Renderer):
//!
//! ```ignore
//! let mut driver = FrameDriver::from_scene(&presets::portfolio(), 1280.0, 720.0);
//! driver.tick(scroll, 1.0 / 60.0, &mut NullRenderer);
//! ```
//!
//! ## Core Concepts
//!
//! ### Systems
//!
//! A system is a named particle cloud of one family drawn through one of two
//! cameras:
//!
//! | Family | Look | Pass |
//! |--------|------|------|
//! | Beam | falling column bent along a path or helix | light |
//! | Swarm | glowing sphere chasing the pointer | backdrop |
//! | Drift | starfield wrapping along Z | backdrop |
//! | Streak | short light streaks flying along Z | backdrop |
//! | Brain | cloud that settles onto an image silhouette | backdrop |
//!
//! Every system owns a [`ControlState`](control::ControlState): opacity,
//! density, flow limit, bend, morph mix, speed and scale.
//!
//! ### Bindings
//!
//! A [`Binding`](binder::Binding) spans a scroll range from a start to an end
//! [`TriggerPoint`](binder::TriggerPoint), each relative to a named document
//! region. Its progress is mapped onto control fields through
//! [`Mapping`](binder::Mapping)s and its edges fire
//! [`Action`](binder::Action)s:
//!
//! ```ignore
//! Binding::new("about", "top bottom".parse()?, "top top".parse()?, 1.0)
//!     .write(Target::system("drift", ControlField::Opacity), Mapping::Identity)
//!     .on(Transition::Enter, Action::SetRunning { system: "drift".into(), value: true })
//! ```
//!
//! ### Frame order
//!
//! [`FrameDriver::tick`](driver::FrameDriver::tick) advances the clock, runs the
//! bindings, attaches finished image loads, pushes the pointer trail, updates
//! every running system and submits the backdrop pass followed by the light
//! pass.

pub mod binder;
pub mod camera;
pub mod cloud;
pub mod config;
pub mod context;
pub mod control;
pub mod driver;
pub mod error;
pub mod families;
pub mod gpu;
pub mod input;
pub mod path;
pub mod presets;
pub mod sampler;
pub mod spawn;
pub mod textures;
pub mod time;
pub mod viewer;

pub use glam::{Vec2, Vec3, Vec4};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use lumenscroll::prelude::*;
/// ```
pub mod prelude {
    pub use crate::binder::{
        Action, Binder, Binding, Callback, ControlSink, Mapping, Offset, Regions, Target,
        Transition, TriggerPoint,
    };
    pub use crate::config::{
        BeamConfig, BeamLayout, Blend, BrainConfig, BrainMode, Color, DriftConfig, Pass,
        RegionConfig, SceneConfig, ShapeKind, Sprite, StreakConfig, SwarmConfig, SystemConfig,
        SystemKind,
    };
    pub use crate::context::AnimationContext;
    pub use crate::control::{ControlField, ControlState};
    pub use crate::driver::{FrameDriver, NullRenderer, Renderer};
    pub use crate::error::{SampleError, SceneError, ViewerError};
    pub use crate::presets;
    pub use crate::spawn::SpawnContext;
    pub use crate::time::Clock;
    pub use crate::viewer::Viewer;
    pub use crate::{Vec2, Vec3, Vec4};
}
