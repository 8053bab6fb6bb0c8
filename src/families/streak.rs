//! Comet streaks: line segments whose tail trails the head along Z.

use glam::Vec3;

use super::{bend_offset, wrap_depth, DrawStyle, FrameInput, Primitive};
use crate::cloud::PointBuffer;
use crate::config::{Blend, Sprite, StreakConfig};
use crate::control::ControlState;
use crate::spawn::SpawnContext;

const TRAVEL_SCALE: f32 = 20.0;
const DEPTH_STAGGER: f32 = 2000.0;

/// Head/tail vertex pairs drifting along Z.
///
/// Vertex `2i` is the opaque head of streak `i`, vertex `2i + 1` its fully
/// transparent tail, so the renderer's alpha interpolation draws a fading
/// comet.
#[derive(Debug)]
pub struct StreakSystem {
    config: StreakConfig,
    base: Vec<Vec3>,
    random: Vec<Vec3>,
    travel: f32,
    buffer: PointBuffer,
    pub control: ControlState,
}

impl StreakSystem {
    pub fn new(config: StreakConfig, spawn: &mut SpawnContext) -> Self {
        let config = config.clamped();
        let half = Vec3::new(config.range_xy, config.range_xy, config.range_z);
        let mut base = Vec::with_capacity(config.count);
        let mut random = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            base.push(spawn.random_in_box(half, Vec3::ZERO));
            random.push(spawn.random_vec3());
        }

        let mut buffer =
            PointBuffer::from_positions(base.iter().flat_map(|p| [*p, *p]).collect());
        for (i, a) in buffer.alpha_mut().iter_mut().enumerate() {
            *a = if i % 2 == 0 { 1.0 } else { 0.0 };
        }

        Self {
            config,
            base,
            random,
            travel: 0.0,
            buffer,
            control: ControlState::hidden(),
        }
    }

    pub fn update(&mut self, frame: &FrameInput) {
        let cfg = &self.config;
        let speed = self.control.speed_or(cfg.speed);
        self.travel += frame.step * speed * TRAVEL_SCALE * cfg.direction;

        let range = cfg.range_z;
        let bend = self.control.bend();
        let visible = self.control.visible_fraction();

        for (i, (base, r)) in self.base.iter().zip(&self.random).enumerate() {
            let (head, tail) = (2 * i, 2 * i + 1);
            if cfg.gated && r.x > visible {
                self.buffer.hide(head);
                self.buffer.hide(tail);
                continue;
            }

            let head_z = wrap_depth(base.z + self.travel + r.z * DEPTH_STAGGER, range);
            let tail_z = head_z - cfg.streak_length * (1.0 + r.x) * cfg.direction;

            for (vertex, z) in [(head, head_z), (tail, tail_z)] {
                let (dx, dy) = bend_offset(base.x, z, range, cfg.bend_lift, bend);
                self.buffer.set(vertex, Vec3::new(base.x + dx, base.y + dy, z));
            }
        }

        self.buffer.mark_dirty();
    }

    pub fn config(&self) -> &StreakConfig {
        &self.config
    }

    /// Number of streaks (half the vertex count).
    pub fn streak_count(&self) -> usize {
        self.base.len()
    }

    pub fn buffer(&self) -> &PointBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PointBuffer {
        &mut self.buffer
    }

    pub fn style(&self) -> DrawStyle {
        DrawStyle {
            primitive: Primitive::Lines,
            color: self.config.color.to_vec3(),
            size: 1.0,
            opacity: self.config.opacity * self.control.opacity(),
            sprite: Sprite::Blurry,
            blur: 0.0,
            blend: Blend::Additive,
            vertex_colors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::LightBounds;
    use crate::control::ControlField;
    use crate::input::{MouseTrail, Pointer};

    fn step(system: &mut StreakSystem, time: f32) {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(2);
        system.update(&FrameInput {
            time,
            step: 0.015,
            scatter: 0.0,
            bounds: LightBounds::with_range(-1.0, 1.0, 1.0),
            scroll: 0.0,
            pointer: &pointer,
            trail: &trail,
        });
    }

    #[test]
    fn test_pairs_and_alpha() {
        let mut spawn = SpawnContext::from_seed(12);
        let s = StreakSystem::new(StreakConfig::default(), &mut spawn);
        assert_eq!(s.buffer().len(), 12);
        assert_eq!(s.streak_count(), 6);
        assert_eq!(s.buffer().alpha()[0], 1.0);
        assert_eq!(s.buffer().alpha()[1], 0.0);
    }

    #[test]
    fn test_tail_trails_head() {
        let mut spawn = SpawnContext::from_seed(13);
        let mut s = StreakSystem::new(StreakConfig::default(), &mut spawn);
        step(&mut s, 0.0);
        for i in 0..s.streak_count() {
            let head = s.buffer().get(2 * i);
            let tail = s.buffer().get(2 * i + 1);
            let stretch = head.z - tail.z;
            assert!(stretch >= 200.0 - 1e-3 && stretch <= 400.0 + 1e-3, "{stretch}");
            assert_eq!(head.x, tail.x);
            assert_eq!(head.y, tail.y);
        }
    }

    #[test]
    fn test_gate_hides_both_vertices() {
        let mut spawn = SpawnContext::from_seed(14);
        let mut s = StreakSystem::new(
            StreakConfig {
                count: 50,
                gated: true,
                ..StreakConfig::default()
            },
            &mut spawn,
        );
        step(&mut s, 0.0);
        assert!((0..100).all(|v| s.buffer().is_hidden(v)));

        s.control.set(ControlField::VisibleFraction, 1.0);
        step(&mut s, 0.015);
        assert!((0..100).all(|v| !s.buffer().is_hidden(v)));
    }
}
