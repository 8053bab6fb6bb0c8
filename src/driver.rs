//! The per-frame loop: binder, then systems, then draw submission.
//!
//! [`FrameDriver::tick`] is the only thing a host has to call per displayed
//! frame. It never blocks on image loading and never touches the GPU
//! directly; drawing goes through the [`Renderer`] trait so the whole loop
//! runs headless in tests.

use glam::Mat4;

use crate::binder::{Binder, Regions};
use crate::camera::PerspectiveCamera;
use crate::cloud::PointBuffer;
use crate::config::{Pass, SceneConfig};
use crate::context::AnimationContext;
use crate::families::DrawStyle;

/// One system submitted for drawing.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub name: &'a str,
    pub buffer: &'a PointBuffer,
    pub style: DrawStyle,
    pub model: Mat4,
    /// Buffer contents changed since the last submission.
    pub dirty: bool,
}

/// Everything drawn through one camera.
#[derive(Debug, Clone)]
pub struct PassFrame<'a> {
    pub pass: Pass,
    pub view: Mat4,
    pub projection: Mat4,
    /// World units per unit of attenuated point size: `tan(fov / 2)`.
    pub size_scale: f32,
    pub items: Vec<DrawItem<'a>>,
}

impl<'a> PassFrame<'a> {
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    fn new(pass: Pass, camera: &PerspectiveCamera) -> Self {
        Self {
            pass,
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            size_scale: (camera.fov.to_radians() / 2.0).tan(),
            items: Vec::new(),
        }
    }
}

/// Draw backend.
///
/// Receives the backdrop pass first and the light pass second. The light
/// pass composites over the backdrop without clearing it.
pub trait Renderer {
    fn render(&mut self, passes: &[PassFrame<'_>]);
}

/// A renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _passes: &[PassFrame<'_>]) {}
}

/// Runs the frame loop for one scene.
pub struct FrameDriver {
    context: AnimationContext,
    binder: Binder,
    regions: Regions,
}

impl FrameDriver {
    pub fn from_scene(scene: &SceneConfig, width: f32, height: f32) -> Self {
        Self {
            context: AnimationContext::from_scene(scene, width, height),
            binder: Binder::new(scene.bindings.clone()),
            regions: Regions::from_config(&scene.regions, height, scene.document_height),
        }
    }

    /// Viewport changed.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.context.resize(width, height);
        self.regions.set_viewport_height(height);
    }

    /// Run one frame at scroll offset `scroll`, `dt` seconds after the last.
    ///
    /// Order: clock and pointer, bindings, finished loads, swarm trail,
    /// system updates, draw.
    pub fn tick<R: Renderer + ?Sized>(&mut self, scroll: f32, dt: f32, renderer: &mut R) {
        let ctx = &mut self.context;
        ctx.advance(dt);
        self.binder.update(scroll, dt, &self.regions, &mut *ctx);
        ctx.poll_loads();
        ctx.advance_trail(scroll);
        ctx.update_systems(scroll);

        // The dirty flag is consumed only by systems that are actually drawn.
        let dirty: Vec<bool> = ctx
            .slots_mut()
            .iter_mut()
            .map(|slot| {
                let drawn = slot.drawn;
                match slot.system_mut() {
                    Some(s) if drawn && s.style().opacity > 0.0 => s.buffer_mut().take_dirty(),
                    _ => false,
                }
            })
            .collect();

        let rig = *ctx.rig();
        let mut backdrop = PassFrame::new(Pass::Backdrop, &rig.backdrop);
        let mut light = PassFrame::new(Pass::Light, &rig.light);

        for (slot, dirty) in ctx.slots().iter().zip(dirty) {
            if !slot.drawn {
                continue;
            }
            let Some(system) = slot.system() else {
                continue;
            };
            let style = system.style();
            if style.opacity <= 0.0 {
                continue;
            }
            let item = DrawItem {
                name: slot.name(),
                buffer: system.buffer(),
                style,
                model: system.model(),
                dirty,
            };
            match slot.pass() {
                Pass::Backdrop => backdrop.items.push(item),
                Pass::Light => light.items.push(item),
            }
        }

        renderer.render(&[backdrop, light]);
    }

    pub fn context(&self) -> &AnimationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AnimationContext {
        &mut self.context
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    /// Largest scroll offset of the document.
    pub fn max_scroll(&self) -> f32 {
        self.regions.max_scroll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Binding, Mapping, Target};
    use crate::config::{BeamConfig, RegionConfig, SwarmConfig, SystemConfig, SystemKind};
    use crate::control::ControlField;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<(Pass, Vec<(String, bool)>)>>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, passes: &[PassFrame<'_>]) {
            self.frames.push(
                passes
                    .iter()
                    .map(|p| {
                        let items = p
                            .items
                            .iter()
                            .map(|i| (i.name.to_string(), i.dirty))
                            .collect();
                        (p.pass, items)
                    })
                    .collect(),
            );
        }
    }

    impl Recorder {
        fn names(&self, frame: usize, pass: usize) -> Vec<&str> {
            self.frames[frame][pass]
                .1
                .iter()
                .map(|(n, _)| n.as_str())
                .collect()
        }
    }

    fn scene() -> SceneConfig {
        SceneConfig {
            seed: Some(4),
            document_height: 3000.0,
            regions: vec![RegionConfig {
                name: "intro".into(),
                top: 1000.0,
                height: 1000.0,
            }],
            systems: vec![
                SystemConfig::new(
                    "swarm",
                    Pass::Backdrop,
                    SystemKind::Swarm(SwarmConfig {
                        count: 40,
                        ..SwarmConfig::default()
                    }),
                )
                .running(),
                SystemConfig::new(
                    "beam",
                    Pass::Light,
                    SystemKind::Beam(BeamConfig {
                        count: 40,
                        ..BeamConfig::default()
                    }),
                )
                .running(),
            ],
            bindings: vec![Binding::new(
                "intro",
                "top top".parse().unwrap(),
                "bottom top".parse().unwrap(),
                0.0,
            )
            .write(Target::system("beam", ControlField::Opacity), Mapping::Identity)],
            ..SceneConfig::default()
        }
    }

    #[test]
    fn test_passes_are_ordered() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        let mut rec = Recorder::default();
        driver.tick(0.0, 0.016, &mut rec);
        assert_eq!(rec.frames[0][0].0, Pass::Backdrop);
        assert_eq!(rec.frames[0][1].0, Pass::Light);
    }

    #[test]
    fn test_transparent_systems_are_skipped() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        let mut rec = Recorder::default();

        driver.tick(0.0, 0.016, &mut rec);
        assert_eq!(rec.names(0, 0), vec!["swarm"]);
        assert!(rec.names(0, 1).is_empty());

        // Halfway through the region the beam has half opacity
        driver.tick(1500.0, 0.016, &mut rec);
        assert_eq!(rec.names(1, 1), vec!["beam"]);
        let opacity = driver.context().system("beam").unwrap().control().opacity();
        assert!((opacity - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_undrawn_systems_neither_update_nor_render() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        let mut rec = Recorder::default();
        crate::binder::ControlSink::set_drawn(driver.context_mut(), "swarm", false);
        let before = driver
            .context()
            .system("swarm")
            .unwrap()
            .buffer()
            .positions()
            .to_vec();

        driver.tick(0.0, 0.016, &mut rec);
        assert!(rec.names(0, 0).is_empty());
        let after = driver.context().system("swarm").unwrap().buffer().positions();
        assert_eq!(after, &before[..]);
    }

    #[test]
    fn test_dirty_flag_is_consumed() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        let mut rec = Recorder::default();
        driver.tick(0.0, 0.016, &mut rec);
        assert!(rec.frames[0][0].1[0].1);

        crate::binder::ControlSink::set_running(driver.context_mut(), "swarm", false);
        driver.tick(0.0, 0.016, &mut rec);
        assert!(!rec.frames[1][0].1[0].1);
    }

    #[test]
    fn test_hidden_frames_keep_the_dirty_flag() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        let mut rec = Recorder::default();

        // The beam updates while fully transparent, then stops
        driver.tick(0.0, 0.016, &mut rec);
        assert!(rec.names(0, 1).is_empty());
        assert!(driver.context().system("beam").unwrap().buffer().is_dirty());
        crate::binder::ControlSink::set_running(driver.context_mut(), "beam", false);

        driver.tick(1500.0, 0.016, &mut rec);
        assert_eq!(rec.frames[1][1].1, vec![("beam".to_string(), true)]);

        driver.tick(1500.0, 0.016, &mut rec);
        assert_eq!(rec.frames[2][1].1, vec![("beam".to_string(), false)]);
    }

    #[test]
    fn test_resize_moves_trigger_points() {
        let mut driver = FrameDriver::from_scene(&scene(), 1280.0, 720.0);
        assert_eq!(driver.max_scroll(), 3000.0 - 720.0);
        driver.resize(1280.0, 1000.0);
        assert_eq!(driver.max_scroll(), 2000.0);
        assert_eq!(driver.regions().viewport_height(), 1000.0);
    }

    #[test]
    fn test_size_scale_follows_fov() {
        let rig = *FrameDriver::from_scene(&scene(), 1280.0, 720.0).context().rig();
        let frame = PassFrame::new(Pass::Light, &rig.light);
        assert!((frame.size_scale - (rig.light.fov.to_radians() / 2.0).tan()).abs() < 1e-6);
    }
}
