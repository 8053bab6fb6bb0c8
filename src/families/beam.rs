//! Falling beams: straight columns, path-following arcs and helix arms.
//!
//! All four shapes share one pipeline per particle:
//!
//! 1. Fall by the particle's speed, respawning just above the ceiling once
//!    below the floor.
//! 2. Compute the soft cutoff with [`effective_threshold`].
//! 3. Park the particle at [`HIDDEN_POSITION`] if its index is past the
//!    density cutoff or it sits below its threshold.
//! 4. Ask the [`BeamShape`] for a radius and base angle, add jitter, phase,
//!    rotation and noise, and convert to X/Z.
//! 5. Blend toward [`scatter_position`] by the scene-wide scatter ratio.
//!
//! ```ignore
//! let shape = BeamShape::LeftArc(Arc::new(PathTable::from_svg(layout.path_left.as_str())));
//! let mut beam = BeamSystem::new(config, shape, &bounds, &layout, &mut spawn);
//! beam.control.set(ControlField::Density, 1.0);
//! beam.update(&frame);
//! ```

use std::f32::consts::PI;
use std::sync::Arc;

use glam::Vec3;

use super::{DrawStyle, FrameInput, Primitive};
use crate::camera::LightBounds;
use crate::cloud::{PointBuffer, Seed, HIDDEN_POSITION};
use crate::config::{BeamConfig, BeamLayout, Blend, ShapeKind, Sprite};
use crate::control::ControlState;
use crate::path::PathTable;
use crate::spawn::SpawnContext;

/// Largest distance above the ceiling a respawned particle can appear at.
pub const MAX_OVERSHOOT: f32 = 100.0;

/// Amplitude of the index-hashed component of the scatter position.
const SCATTER_SCALE: f32 = 2500.0;
/// Amplitude of the slow drift added on top of it.
const SCATTER_DRIFT: f32 = 200.0;
/// Angular speed of that drift.
const SCATTER_DRIFT_SPEED: f32 = 0.3;

/// Position rule of a beam.
#[derive(Debug, Clone)]
pub enum BeamShape {
    /// Radius zero: the column is just jitter and noise.
    Straight,
    /// Radius from a path table, swung to the left.
    LeftArc(Arc<PathTable>),
    /// Radius from a path table, on the right.
    RightArc(Arc<PathTable>),
    /// Constant radius with an angle that twists with height.
    Helix { radius: f32, twist: f32 },
}

impl BeamShape {
    /// Build the shape a config asks for from the shared path tables.
    pub fn from_config(config: &BeamConfig, left: &Arc<PathTable>, right: &Arc<PathTable>) -> Self {
        match config.shape {
            ShapeKind::Straight => Self::Straight,
            ShapeKind::Left => Self::LeftArc(Arc::clone(left)),
            ShapeKind::Right => Self::RightArc(Arc::clone(right)),
            ShapeKind::Helix => Self::Helix {
                radius: config.arm_radius,
                twist: config.twist,
            },
        }
    }

    /// `(radius, base_angle)` at `height` before jitter and rotation.
    pub fn polar(&self, height: f32, bounds: &LightBounds) -> (f32, f32) {
        match self {
            Self::Straight => (0.0, 0.0),
            Self::LeftArc(table) => (arc_radius(table, height, bounds), PI),
            Self::RightArc(table) => (arc_radius(table, height, bounds), 0.0),
            Self::Helix { radius, twist } => (*radius, height * twist),
        }
    }
}

fn arc_radius(table: &PathTable, height: f32, bounds: &LightBounds) -> f32 {
    if bounds.pixel_scale <= 0.0 {
        return 0.0;
    }
    let px = ((height - bounds.floor) / bounds.pixel_scale).max(0.0);
    table.offset_at(px).abs() * bounds.pixel_scale
}

/// Height below which a particle is hidden.
///
/// The flow cutoff `draw_limit` moves from the ceiling down to the floor as
/// `flow_limit` goes from 0 to 1; each particle's own `fade_random` staggers
/// it upward by up to `fade_range` so the edge is soft.
pub fn effective_threshold(
    floor: f32,
    ceiling: f32,
    flow_limit: f32,
    fade_random: f32,
    fade_range: f32,
) -> f32 {
    let draw_limit = ceiling - (ceiling - floor) * flow_limit;
    draw_limit + fade_random * fade_range
}

/// Dispersed X/Z position for particle `index` at `time`.
pub fn scatter_position(index: usize, noise_phase: f32, time: f32) -> (f32, f32) {
    let i = index as f32;
    let drift = time * SCATTER_DRIFT_SPEED + i * 0.1;
    (
        (i * 12.9898 + noise_phase).sin() * SCATTER_SCALE + drift.sin() * SCATTER_DRIFT,
        (i * 78.233 + noise_phase).cos() * SCATTER_SCALE + drift.cos() * SCATTER_DRIFT,
    )
}

/// A falling column of particles.
#[derive(Debug)]
pub struct BeamSystem {
    config: BeamConfig,
    shape: BeamShape,
    seeds: Vec<Seed>,
    heights: Vec<f32>,
    buffer: PointBuffer,
    fade_range: f32,
    spawn: SpawnContext,
    /// Scroll-driven state.
    pub control: ControlState,
}

impl BeamSystem {
    /// Seed `config.count` particles between the floor and the ceiling plus
    /// the layout's spawn headroom.
    pub fn new(
        config: BeamConfig,
        shape: BeamShape,
        bounds: &LightBounds,
        layout: &BeamLayout,
        spawn: &mut SpawnContext,
    ) -> Self {
        let config = config.clamped();
        let top = bounds.top + layout.spawn_headroom.max(0.0);
        let seeds: Vec<Seed> = (0..config.count)
            .map(|_| Seed::draw(spawn, bounds.floor, top, config.spread, config.speed))
            .collect();
        let heights: Vec<f32> = seeds.iter().map(|s| s.base_height).collect();
        let positions = heights.iter().map(|h| Vec3::new(0.0, *h, 0.0)).collect();

        Self {
            config,
            shape,
            seeds,
            heights,
            buffer: PointBuffer::from_positions(positions),
            fade_range: layout.fade_range.max(0.0),
            spawn: spawn.fork(),
            control: ControlState::hidden(),
        }
    }

    /// Advance every particle one frame.
    pub fn update(&mut self, frame: &FrameInput) {
        let bounds = frame.bounds;
        let floor = bounds.floor;
        let ceiling = bounds.top;
        let visible_count = (self.config.count as f32 * self.control.density()).floor() as usize;
        let flow = self.control.flow_limit();
        let rotation = self.config.rotation_speed * frame.time;
        let scatter = frame.scatter.clamp(0.0, 1.0);

        for (i, (seed, height)) in self.seeds.iter().zip(self.heights.iter_mut()).enumerate() {
            *height -= seed.speed;
            if *height < floor {
                *height = ceiling + self.spawn.random_range(0.0, MAX_OVERSHOOT);
            }
            let h = *height;

            let threshold =
                effective_threshold(floor, ceiling, flow, seed.fade_random, self.fade_range);
            if i >= visible_count || h < threshold {
                self.buffer.set(i, HIDDEN_POSITION);
                continue;
            }

            let (radius, base_angle) = self.shape.polar(h, &bounds);
            let radius = radius + seed.thickness_jitter * self.config.thickness;
            let angle = base_angle + seed.phase + rotation;
            let noise = (frame.time * 2.0 + seed.noise_phase).sin() * self.config.noise;
            let path_x = radius * angle.cos() + noise;
            let path_z = radius * angle.sin() + noise * 0.5;

            let (scatter_x, scatter_z) = scatter_position(i, seed.noise_phase, frame.time);
            let x = path_x * (1.0 - scatter) + scatter_x * scatter;
            let z = path_z * (1.0 - scatter) + scatter_z * scatter;
            self.buffer.set(i, Vec3::new(x, h, z));
        }

        self.buffer.mark_dirty();
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn shape(&self) -> &BeamShape {
        &self.shape
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    /// Current particle heights.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn buffer(&self) -> &PointBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PointBuffer {
        &mut self.buffer
    }

    pub fn style(&self) -> DrawStyle {
        DrawStyle {
            primitive: Primitive::Points,
            color: self.config.color.to_vec3(),
            size: self.config.size,
            opacity: self.config.opacity * self.control.opacity(),
            sprite: Sprite::Blurry,
            blur: self.config.blur,
            blend: Blend::Normal,
            vertex_colors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlField;
    use crate::input::{MouseTrail, Pointer};

    fn bounds() -> LightBounds {
        LightBounds::with_range(-50.0, 50.0, 1.0)
    }

    fn layout() -> BeamLayout {
        BeamLayout {
            spawn_headroom: 0.0,
            ..BeamLayout::default()
        }
    }

    fn beam(count: usize, speed: f32, shape: BeamShape) -> BeamSystem {
        let config = BeamConfig {
            count,
            speed,
            thickness: 10.0,
            noise: 3.0,
            ..BeamConfig::default()
        };
        let mut spawn = SpawnContext::from_seed(5);
        BeamSystem::new(config, shape, &bounds(), &layout(), &mut spawn)
    }

    fn frame<'a>(time: f32, scatter: f32, pointer: &'a Pointer, trail: &'a MouseTrail) -> FrameInput<'a> {
        FrameInput {
            time,
            step: 0.015,
            scatter,
            bounds: bounds(),
            scroll: 0.0,
            pointer,
            trail,
        }
    }

    #[test]
    fn test_heights_stay_in_range() {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(4);
        let mut b = beam(500, 3.0, BeamShape::Straight);
        for step in 0..400 {
            b.update(&frame(step as f32 * 0.015, 0.0, &pointer, &trail));
            for h in b.heights() {
                assert!(*h >= -50.0 && *h <= 50.0 + MAX_OVERSHOOT, "height {h}");
            }
        }
    }

    #[test]
    fn test_negative_speed_still_falls_within_range() {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(4);
        let mut b = beam(200, -1.0, BeamShape::Straight);
        assert_eq!(b.config().speed, 0.0);
        for step in 0..500 {
            b.update(&frame(step as f32 * 0.015, 0.0, &pointer, &trail));
        }
        for h in b.heights() {
            assert!(*h >= -50.0 && *h <= 50.0 + MAX_OVERSHOOT, "height {h}");
        }
    }

    #[test]
    fn test_density_gates_by_index() {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(4);
        let mut b = beam(200, 0.5, BeamShape::Straight);
        b.control.set(ControlField::Density, 0.25);
        // Flow fully open so only density hides particles
        b.control.set(ControlField::FlowLimit, 1.0);
        b.fade_range = 0.0;
        b.update(&frame(0.0, 0.0, &pointer, &trail));

        let cutoff = 50;
        for i in 0..200 {
            if i >= cutoff {
                assert!(b.buffer().is_hidden(i), "{i} should be hidden");
            } else {
                assert!(!b.buffer().is_hidden(i), "{i} should be visible");
            }
        }
    }

    #[test]
    fn test_zero_density_hides_everything() {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(4);
        let mut b = beam(64, 1.0, BeamShape::Straight);
        b.update(&frame(0.0, 0.0, &pointer, &trail));
        assert!((0..64).all(|i| b.buffer().is_hidden(i)));
        assert!(b.buffer().is_dirty());
    }

    #[test]
    fn test_threshold_is_pure() {
        let a = effective_threshold(-50.0, 50.0, 0.4, 0.3, 300.0);
        let b = effective_threshold(-50.0, 50.0, 0.4, 0.3, 300.0);
        assert_eq!(a.to_bits(), b.to_bits());
        // flow 0 puts the line at the ceiling, flow 1 at the floor
        assert_eq!(effective_threshold(-50.0, 50.0, 0.0, 0.0, 300.0), 50.0);
        assert_eq!(effective_threshold(-50.0, 50.0, 1.0, 0.0, 300.0), -50.0);
        assert_eq!(effective_threshold(-50.0, 50.0, 1.0, 0.5, 300.0), 100.0);
    }

    #[test]
    fn test_scatter_blend_boundaries() {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(4);
        let time = 1.25;

        let mut path = beam(32, 0.0, BeamShape::Helix { radius: 40.0, twist: 0.005 });
        path.control.set(ControlField::Density, 1.0);
        path.control.set(ControlField::FlowLimit, 1.0);
        path.fade_range = 0.0;
        let mut scattered = beam(32, 0.0, BeamShape::Helix { radius: 40.0, twist: 0.005 });
        scattered.control = path.control;
        scattered.fade_range = 0.0;

        path.update(&frame(time, 0.0, &pointer, &trail));
        scattered.update(&frame(time, 1.0, &pointer, &trail));

        for i in 0..32 {
            let seed = path.seeds()[i];
            let p = path.buffer().get(i);
            let (radius, base) = path.shape().polar(p.y, &bounds());
            let r = radius + seed.thickness_jitter * 10.0;
            let a = base + seed.phase;
            let n = (time * 2.0 + seed.noise_phase).sin() * 3.0;
            assert_eq!(p.x, r * a.cos() + n);
            assert_eq!(p.z, r * a.sin() + n * 0.5);

            let (sx, sz) = scatter_position(i, seed.noise_phase, time);
            let s = scattered.buffer().get(i);
            assert_eq!(s.x, sx);
            assert_eq!(s.z, sz);
            assert_eq!(s.y, p.y);
        }
    }

    #[test]
    fn test_arc_radius_follows_table() {
        let table = Arc::new(PathTable::from_svg("M0 0 L50 100"));
        let shape = BeamShape::RightArc(Arc::clone(&table));
        let b = LightBounds::with_range(0.0, 100.0, 2.0);
        // 40 world units above the floor is 20 table pixels
        let (radius, angle) = shape.polar(40.0, &b);
        assert_eq!(radius, table.offset_at(20.0).abs() * 2.0);
        assert_eq!(angle, 0.0);

        let (_, left_angle) = BeamShape::LeftArc(table).polar(40.0, &b);
        assert_eq!(left_angle, PI);
    }

    #[test]
    fn test_below_floor_reads_first_entry() {
        let table = Arc::new(PathTable::from_svg("M0 0 L50 100"));
        let shape = BeamShape::LeftArc(Arc::clone(&table));
        let b = LightBounds::with_range(0.0, 100.0, 1.0);
        assert_eq!(shape.polar(-30.0, &b).0, table.offset_at(0.0).abs());
    }
}
