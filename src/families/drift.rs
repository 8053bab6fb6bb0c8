//! Starfield drift: points flying along Z through a wrapping box.

use glam::Vec3;

use super::{bend_offset, smoothstep, wrap_depth, DrawStyle, FrameInput, Primitive};
use crate::cloud::{PointBuffer, HIDDEN_POSITION};
use crate::config::{Blend, DriftConfig, Sprite};
use crate::control::ControlState;
use crate::spawn::SpawnContext;

/// Z travel per unit of speed per clock unit.
const TRAVEL_SCALE: f32 = 5.0;
/// Per-particle depth stagger, scaled by the random Z component.
const DEPTH_STAGGER: f32 = 200.0;

/// A field of points drifting along Z.
///
/// Positions wrap within `[-range_z, range_z)` and fade out toward both ends
/// of that range. With `gated` set, each point shows only while its random
/// rank is within the control's visible fraction.
#[derive(Debug)]
pub struct DriftSystem {
    config: DriftConfig,
    base: Vec<Vec3>,
    random: Vec<Vec3>,
    travel: f32,
    buffer: PointBuffer,
    pub control: ControlState,
}

impl DriftSystem {
    pub fn new(config: DriftConfig, spawn: &mut SpawnContext) -> Self {
        let config = config.clamped();
        let half = Vec3::new(config.range_xy, config.range_xy, config.range_z);
        let base: Vec<Vec3> = (0..config.count)
            .map(|_| spawn.random_in_box(half, config.bias))
            .collect();
        let random: Vec<Vec3> = (0..config.count).map(|_| spawn.random_vec3()).collect();
        let buffer = PointBuffer::from_positions(base.clone());

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
            if cfg.gated && r.x > visible {
                self.buffer.set(i, HIDDEN_POSITION);
                self.buffer.alpha_mut()[i] = 0.0;
                continue;
            }

            let z = wrap_depth(base.z + self.travel + r.z * DEPTH_STAGGER, range);
            let (dx, dy) = bend_offset(base.x, z, range, cfg.bend_lift, bend);
            self.buffer.set(i, Vec3::new(base.x + dx, base.y + dy, z));
            self.buffer.alpha_mut()[i] = smoothstep(range, range * 0.2, z.abs());
        }

        self.buffer.mark_dirty();
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Accumulated Z travel.
    pub fn travel(&self) -> f32 {
        self.travel
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
            sprite: Sprite::SoftDisc,
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

    fn run(system: &mut DriftSystem, frames: usize) {
        let pointer = Pointer::default();
        let trail = MouseTrail::new(2);
        for f in 0..frames {
            system.update(&FrameInput {
                time: f as f32 * 0.015,
                step: 0.015,
                scatter: 0.0,
                bounds: LightBounds::with_range(-1.0, 1.0, 1.0),
                scroll: 0.0,
                pointer: &pointer,
                trail: &trail,
            });
        }
    }

    fn config() -> DriftConfig {
        DriftConfig {
            count: 400,
            range_z: 600.0,
            range_xy: 2500.0,
            speed: 20.0,
            ..DriftConfig::default()
        }
    }

    #[test]
    fn test_depth_wraps_and_fades() {
        let mut spawn = SpawnContext::from_seed(8);
        let mut d = DriftSystem::new(config(), &mut spawn);
        run(&mut d, 500);
        for (p, a) in d.buffer().positions().iter().zip(d.buffer().alpha()) {
            assert!(p.z >= -600.0 && p.z < 600.0);
            assert!((0.0..=1.0).contains(a));
            if p.z.abs() <= 120.0 {
                assert_eq!(*a, 1.0);
            }
        }
    }

    #[test]
    fn test_travel_integrates_speed_override() {
        let mut spawn = SpawnContext::from_seed(9);
        let mut d = DriftSystem::new(config(), &mut spawn);
        run(&mut d, 10);
        let before = d.travel();
        assert!((before - 10.0 * 0.015 * 20.0 * 5.0).abs() < 1e-3);

        d.control.set(ControlField::Speed, 100.0);
        run(&mut d, 1);
        assert!((d.travel() - before - 0.015 * 100.0 * 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_gate_hides_by_random_rank() {
        let mut spawn = SpawnContext::from_seed(10);
        let mut d = DriftSystem::new(
            DriftConfig {
                gated: true,
                ..config()
            },
            &mut spawn,
        );
        d.control.set(ControlField::VisibleFraction, 0.5);
        run(&mut d, 1);
        for i in 0..400 {
            let hidden = d.buffer().is_hidden(i);
            assert_eq!(hidden, d.random[i].x > 0.5);
        }
    }

    #[test]
    fn test_bend_lifts_far_end() {
        let mut spawn = SpawnContext::from_seed(11);
        let mut flat = DriftSystem::new(config(), &mut spawn);
        let mut spawn = SpawnContext::from_seed(11);
        let mut bent = DriftSystem::new(config(), &mut spawn);
        bent.control.set(ControlField::Bend, 1.0);
        run(&mut flat, 1);
        run(&mut bent, 1);
        for i in 0..400 {
            let a = flat.buffer().get(i);
            let b = bent.buffer().get(i);
            assert_eq!(a.z, b.z);
            assert!(b.y >= a.y);
        }
    }
}
