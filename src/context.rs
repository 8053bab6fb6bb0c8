//! The animation context: every system plus the state they share.
//!
//! [`AnimationContext`] owns the particle systems by name together with the
//! clock, the pointer and its history trail, the camera rig and the scene-wide
//! scatter ratio. It is the [`ControlSink`] the binder writes into, and the
//! host's pointer and resize callbacks land here.
//!
//! Brain layers load asynchronously: their slot exists from the start (so
//! bindings can address it), but the system itself only appears once a
//! background thread has decoded and sampled the image.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::binder::ControlSink;
use crate::camera::CameraRig;
use crate::config::{BrainConfig, Pass, SceneConfig, SystemConfig, SystemKind};
use crate::control::{ControlField, ControlState};
use crate::error::SampleError;
use crate::families::swarm::advance_trail;
use crate::families::{
    BeamShape, BeamSystem, BrainSystem, DriftSystem, FrameInput, ParticleSystem, StreakSystem,
    SwarmSystem,
};
use crate::input::{MouseTrail, Pointer};
use crate::path::PathTable;
use crate::sampler::{load_image, sample_points, SampledPoint};
use crate::spawn::SpawnContext;
use crate::time::Clock;

/// Idle timeout used when the scene has no swarm.
const DEFAULT_IDLE_TIMEOUT: f32 = 0.8;

type LoadResult = Result<Vec<SampledPoint>, SampleError>;

/// A named system and its flags.
#[derive(Debug)]
pub struct SystemSlot {
    name: String,
    pass: Pass,
    /// Updated each frame while set.
    pub running: bool,
    /// Submitted to the renderer while set.
    pub drawn: bool,
    system: Option<ParticleSystem>,
    /// Control writes received before the system was ready.
    pending_control: ControlState,
}

impl SystemSlot {
    fn new(name: &str, pass: Pass, running: bool, system: Option<ParticleSystem>) -> Self {
        Self {
            name: name.to_string(),
            pass,
            running,
            drawn: true,
            system,
            pending_control: ControlState::hidden(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Whether the system exists (always, except for loading image layers).
    pub fn is_ready(&self) -> bool {
        self.system.is_some()
    }

    pub fn system(&self) -> Option<&ParticleSystem> {
        self.system.as_ref()
    }

    pub fn system_mut(&mut self) -> Option<&mut ParticleSystem> {
        self.system.as_mut()
    }

    pub fn control(&self) -> &ControlState {
        match &self.system {
            Some(s) => s.control(),
            None => &self.pending_control,
        }
    }

    pub fn control_mut(&mut self) -> &mut ControlState {
        match &mut self.system {
            Some(s) => s.control_mut(),
            None => &mut self.pending_control,
        }
    }

    fn attach(&mut self, mut system: ParticleSystem) {
        *system.control_mut() = self.pending_control;
        self.system = Some(system);
    }
}

struct PendingLayer {
    name: String,
    config: BrainConfig,
    receiver: Receiver<LoadResult>,
}

/// Owns every particle system and the shared per-frame state.
pub struct AnimationContext {
    slots: Vec<SystemSlot>,
    index: HashMap<String, usize>,
    pending: Vec<PendingLayer>,
    clock: Clock,
    trail: MouseTrail,
    pointer: Pointer,
    rig: CameraRig,
    scatter: f32,
    spawn: SpawnContext,
    idle_timeout: f32,
    unbind_scroll: f32,
}

impl AnimationContext {
    /// Build every system of `scene` for a `width` × `height` viewport.
    ///
    /// Brain layers start loading in the background.
    pub fn from_scene(scene: &SceneConfig, width: f32, height: f32) -> Self {
        let spawn = match scene.seed {
            Some(seed) => SpawnContext::from_seed(seed),
            None => SpawnContext::from_entropy(),
        };
        let layout = scene.beams.clone().clamped();
        let rig = CameraRig::new(&layout, width, height);

        let mut ctx = Self {
            slots: Vec::with_capacity(scene.systems.len()),
            index: HashMap::new(),
            pending: Vec::new(),
            clock: Clock::with_step(scene.clock_step),
            trail: MouseTrail::default(),
            pointer: Pointer::default(),
            rig,
            scatter: 0.0,
            spawn,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            unbind_scroll: f32::INFINITY,
        };

        let left = Arc::new(path_table(&layout.path_left));
        let right = Arc::new(path_table(&layout.path_right));

        for cfg in &scene.systems {
            if ctx.index.contains_key(&cfg.name) {
                log::warn!("duplicate system name '{}', keeping the first", cfg.name);
                continue;
            }
            let system = match &cfg.kind {
                SystemKind::Beam(beam) => {
                    let shape = BeamShape::from_config(beam, &left, &right);
                    Some(ParticleSystem::Beam(BeamSystem::new(
                        beam.clone(),
                        shape,
                        &ctx.rig.bounds,
                        &layout,
                        &mut ctx.spawn,
                    )))
                }
                SystemKind::Swarm(swarm) => {
                    ctx.trail.set_capacity(swarm.trail_length.max(1));
                    ctx.idle_timeout = swarm.idle_timeout;
                    ctx.unbind_scroll = swarm.unbind_scroll;
                    Some(ParticleSystem::Swarm(SwarmSystem::new(swarm.clone(), &mut ctx.spawn)))
                }
                SystemKind::Drift(drift) => Some(ParticleSystem::Drift(DriftSystem::new(
                    drift.clone(),
                    &mut ctx.spawn,
                ))),
                SystemKind::Streak(streak) => Some(ParticleSystem::Streak(StreakSystem::new(
                    streak.clone(),
                    &mut ctx.spawn,
                ))),
                SystemKind::Brain(_) => None,
            };
            ctx.push_slot(cfg, system);
        }

        for cfg in &scene.systems {
            if let SystemKind::Brain(brain) = &cfg.kind {
                ctx.load_brain_layer(&cfg.name, brain.clone());
            }
        }

        log::info!(
            "scene ready: {} systems ({} loading), viewport {}x{}",
            ctx.slots.len(),
            ctx.pending.len(),
            width,
            height
        );
        ctx
    }

    fn push_slot(&mut self, cfg: &SystemConfig, system: Option<ParticleSystem>) {
        self.index.insert(cfg.name.clone(), self.slots.len());
        self.slots
            .push(SystemSlot::new(&cfg.name, cfg.pass, cfg.running, system));
    }

    // ========== Image layers ==========

    /// Decode and sample `config.image` on a background thread.
    ///
    /// Returns immediately. The layer's slot is created if needed; the system
    /// is attached by [`poll_loads`](Self::poll_loads) once the points arrive.
    pub fn load_brain_layer(&mut self, name: &str, config: BrainConfig) {
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.slots.len());
            self.slots
                .push(SystemSlot::new(name, Pass::Backdrop, false, None));
        }

        let (tx, rx) = mpsc::channel();
        let mut spawn = self.spawn.fork();
        let job = config.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                let result = load_image(&job.image).and_then(|img| {
                    let points =
                        sample_points(&img, job.count, job.scatter_range, job.z_offset, &mut spawn);
                    if points.is_empty() {
                        Err(SampleError::Empty(job.image.clone()))
                    } else {
                        Ok(points)
                    }
                });
                // The context may be gone by now
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => self.pending.push(PendingLayer {
                name: name.to_string(),
                config,
                receiver: rx,
            }),
            Err(e) => log::error!("failed to start loader for layer '{name}': {e}"),
        }
    }

    /// Attach any layers whose points have arrived. Never blocks.
    pub fn poll_loads(&mut self) {
        for layer in std::mem::take(&mut self.pending) {
            match layer.receiver.try_recv() {
                Ok(Ok(points)) => {
                    log::info!("layer '{}' ready with {} points", layer.name, points.len());
                    self.attach_brain_layer(&layer.name, layer.config, &points);
                }
                Ok(Err(e)) => log::error!("layer '{}' unavailable: {e}", layer.name),
                Err(TryRecvError::Empty) => self.pending.push(layer),
                Err(TryRecvError::Disconnected) => {
                    log::error!("{}", SampleError::Disconnected(layer.name.clone()));
                }
            }
        }
    }

    /// Build a brain layer from already-sampled points.
    pub fn attach_brain_layer(&mut self, name: &str, config: BrainConfig, points: &[SampledPoint]) {
        let system = ParticleSystem::Brain(BrainSystem::new(config, points, &mut self.spawn));
        match self.index.get(name) {
            Some(&i) => self.slots[i].attach(system),
            None => {
                self.index.insert(name.to_string(), self.slots.len());
                self.slots
                    .push(SystemSlot::new(name, Pass::Backdrop, false, Some(system)));
            }
        }
    }

    /// Number of image layers still loading.
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    // ========== Host callbacks ==========

    /// Viewport changed: recompute cameras and beam bounds.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.rig.resize(width, height);
    }

    /// Pointer moved to `(x, y)` in window pixels.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        let world = self.rig.pointer_to_world(x, y);
        self.pointer.moved(world, self.idle_timeout);
    }

    /// Pointer left the window.
    pub fn on_pointer_leave(&mut self) {
        self.pointer.left();
    }

    // ========== Frame steps ==========

    /// Advance the clock and the pointer idle timer.
    pub fn advance(&mut self, dt: f32) {
        self.clock.advance();
        self.pointer.tick(dt);
    }

    /// Push this frame's follow target if any swarm is running.
    pub fn advance_trail(&mut self, scroll: f32) {
        let swarm_running = self
            .slots
            .iter()
            .any(|s| s.running && matches!(s.system, Some(ParticleSystem::Swarm(_))));
        if swarm_running {
            advance_trail(&mut self.trail, &self.pointer, scroll, self.unbind_scroll);
        }
    }

    /// Update every running, drawn and ready system.
    pub fn update_systems(&mut self, scroll: f32) {
        let frame = FrameInput {
            time: self.clock.time(),
            step: self.clock.step(),
            scatter: self.scatter,
            bounds: self.rig.bounds,
            scroll,
            pointer: &self.pointer,
            trail: &self.trail,
        };
        for slot in &mut self.slots {
            if !(slot.running && slot.drawn) {
                continue;
            }
            if let Some(system) = slot.system.as_mut() {
                system.update(&frame);
            }
        }
    }

    // ========== Accessors ==========

    pub fn slot(&self, name: &str) -> Option<&SystemSlot> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut SystemSlot> {
        self.index.get(name).map(|&i| &mut self.slots[i])
    }

    pub fn system(&self, name: &str) -> Option<&ParticleSystem> {
        self.slot(name).and_then(SystemSlot::system)
    }

    pub fn slots(&self) -> &[SystemSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [SystemSlot] {
        &mut self.slots
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn trail(&self) -> &MouseTrail {
        &self.trail
    }

    pub fn scatter(&self) -> f32 {
        self.scatter
    }
}

impl ControlSink for AnimationContext {
    fn set_control(&mut self, system: &str, field: ControlField, value: f32) -> bool {
        match self.slot_mut(system) {
            Some(slot) => {
                slot.control_mut().set(field, value);
                true
            }
            None => false,
        }
    }

    fn set_running(&mut self, system: &str, running: bool) -> bool {
        match self.slot_mut(system) {
            Some(slot) => {
                slot.running = running;
                true
            }
            None => false,
        }
    }

    fn set_drawn(&mut self, system: &str, drawn: bool) -> bool {
        match self.slot_mut(system) {
            Some(slot) => {
                slot.drawn = drawn;
                true
            }
            None => false,
        }
    }

    fn set_scatter(&mut self, value: f32) {
        self.scatter = value.clamp(0.0, 1.0);
    }
}

fn path_table(d: &str) -> PathTable {
    if d.trim().is_empty() {
        PathTable::empty()
    } else {
        PathTable::from_svg(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeamConfig, DriftConfig, SwarmConfig};
    use glam::Vec3;

    fn scene() -> SceneConfig {
        SceneConfig {
            seed: Some(1),
            systems: vec![
                SystemConfig::new(
                    "swarm",
                    Pass::Backdrop,
                    SystemKind::Swarm(SwarmConfig {
                        count: 50,
                        trail_length: 8,
                        ..SwarmConfig::default()
                    }),
                )
                .running(),
                SystemConfig::new(
                    "beam",
                    Pass::Light,
                    SystemKind::Beam(BeamConfig {
                        count: 20,
                        ..BeamConfig::default()
                    }),
                ),
                SystemConfig::new(
                    "stars",
                    Pass::Backdrop,
                    SystemKind::Drift(DriftConfig {
                        count: 20,
                        ..DriftConfig::default()
                    }),
                ),
            ],
            ..SceneConfig::default()
        }
    }

    #[test]
    fn test_builds_named_slots() {
        let ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        assert_eq!(ctx.slots().len(), 3);
        assert!(ctx.slot("swarm").unwrap().running);
        assert!(!ctx.slot("beam").unwrap().running);
        assert_eq!(ctx.slot("beam").unwrap().pass(), Pass::Light);
        assert_eq!(ctx.trail().capacity(), 8);
        assert!(ctx.system("nope").is_none());
    }

    #[test]
    fn test_sink_routes_writes() {
        let mut ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        assert!(ctx.set_control("beam", ControlField::Density, 0.5));
        assert_eq!(ctx.slot("beam").unwrap().control().density(), 0.5);
        assert!(ctx.set_running("stars", true));
        assert!(ctx.set_drawn("stars", false));
        assert!(!ctx.slot("stars").unwrap().drawn);
        assert!(!ctx.set_control("ghost", ControlField::Opacity, 1.0));
        ctx.set_scatter(2.0);
        assert_eq!(ctx.scatter(), 1.0);
    }

    #[test]
    fn test_pending_layer_keeps_control_writes() {
        let mut ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        ctx.load_brain_layer("brain", BrainConfig::default());
        assert!(!ctx.slot("brain").unwrap().is_ready());
        assert!(ctx.set_control("brain", ControlField::Opacity, 0.75));

        let points = vec![SampledPoint {
            target: Vec3::ONE,
            initial: Vec3::ZERO,
        }];
        ctx.attach_brain_layer("brain", BrainConfig::default(), &points);
        let slot = ctx.slot("brain").unwrap();
        assert!(slot.is_ready());
        assert_eq!(slot.control().opacity(), 0.75);
    }

    #[test]
    fn test_failed_load_leaves_layer_absent() {
        let mut ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        ctx.load_brain_layer(
            "brain",
            BrainConfig {
                image: "/definitely/missing.png".into(),
                ..BrainConfig::default()
            },
        );
        for _ in 0..500 {
            ctx.poll_loads();
            if ctx.pending_loads() == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(ctx.pending_loads(), 0);
        assert!(!ctx.slot("brain").unwrap().is_ready());
    }

    #[test]
    fn test_pointer_drives_trail() {
        let mut ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        ctx.on_pointer_move(1280.0, 0.0);
        assert!(ctx.pointer().is_active());
        ctx.advance_trail(0.0);
        let head = ctx.trail().head();
        assert!(head.x > 0.0 && head.y > 0.0);
        assert_eq!(head.z, 0.0);

        ctx.on_pointer_leave();
        ctx.advance(0.2);
        assert!(!ctx.pointer().is_active());
        ctx.advance_trail(0.0);
        assert_eq!(ctx.trail().head(), Vec3::ZERO);
    }

    #[test]
    fn test_only_running_systems_update() {
        let mut ctx = AnimationContext::from_scene(&scene(), 1280.0, 720.0);
        let before = ctx.system("stars").unwrap().buffer().positions().to_vec();
        ctx.advance(0.016);
        ctx.update_systems(0.0);
        assert_eq!(ctx.system("stars").unwrap().buffer().positions(), &before[..]);

        ctx.set_running("stars", true);
        ctx.advance(0.016);
        ctx.update_systems(0.0);
        assert_ne!(ctx.system("stars").unwrap().buffer().positions(), &before[..]);
    }
}
