//! The mouse-following swarm.
//!
//! Each particle is assigned a slot in the pointer history: a quadratic
//! distribution puts most particles near the head of the trail, where they
//! follow fast and tight, and a few toward the tail, where they lag and
//! spread. When the pointer goes idle (or the page scrolls past the unbind
//! offset) the swarm eases back to a golden-spiral disc that breathes with a
//! radial ripple, and the whole object slowly spins.

use std::f32::consts::PI;

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::{DrawStyle, FrameInput, Primitive};
use crate::cloud::PointBuffer;
use crate::config::{Blend, Sprite, SwarmConfig};
use crate::control::ControlState;
use crate::input::{MouseTrail, Pointer};
use crate::spawn::{hsl_to_rgb, SpawnContext};

/// Yaw added per frame while idle.
const IDLE_YAW_STEP: f32 = 0.003;
/// Per-frame decay of the spin while following the pointer.
const SPIN_DECAY: f32 = 0.92;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SwarmSeed {
    trail_index: usize,
    speed: f32,
    scatter_radius: f32,
    angle: f32,
}

/// Push this frame's follow target onto the shared trail.
///
/// The target is the pointer while it is active and the origin while idle.
/// Past `unbind_scroll` the trail is frozen.
pub fn advance_trail(trail: &mut MouseTrail, pointer: &Pointer, scroll: f32, unbind_scroll: f32) {
    if scroll > unbind_scroll {
        return;
    }
    let target = if pointer.is_active() {
        pointer.position()
    } else {
        Vec3::ZERO
    };
    trail.push(target);
}

/// Particle swarm that chases the pointer.
#[derive(Debug)]
pub struct SwarmSystem {
    config: SwarmConfig,
    seeds: Vec<SwarmSeed>,
    base: Vec<Vec3>,
    buffer: PointBuffer,
    yaw: f32,
    roll: f32,
    pub control: ControlState,
}

impl SwarmSystem {
    pub fn new(config: SwarmConfig, spawn: &mut SpawnContext) -> Self {
        let config = config.clamped();
        let count = config.count;
        let last_slot = config.trail_length.saturating_sub(1) as f32;
        let mut seeds = Vec::with_capacity(count);
        let mut base = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for i in 0..count {
            let distribution = spawn.random().powi(2);
            let speed = config.speed_fast * (1.0 - distribution) + config.speed_slow * distribution;
            let scatter =
                config.scatter_head * (1.0 - distribution) + config.scatter_tail * distribution;

            // Golden-spiral disc
            let r = config.sphere_radius * spawn.random().powf(0.8);
            let phi = (-1.0 + (2.0 * i as f32) / count as f32).clamp(-1.0, 1.0).acos();
            let theta = (count as f32 * PI).sqrt() * phi;
            base.push(Vec3::new(
                r * theta.cos() * phi.sin(),
                r * theta.sin() * phi.sin(),
                0.0,
            ));

            seeds.push(SwarmSeed {
                trail_index: (distribution * last_slot).floor() as usize,
                speed,
                scatter_radius: scatter * spawn.random(),
                angle: spawn.angle(),
            });

            let lightness = if config.sphere_radius > 0.0 {
                0.3 + 0.4 * r / config.sphere_radius
            } else {
                0.3
            };
            colors.push(hsl_to_rgb(0.6, 1.0, lightness));
        }

        let buffer = PointBuffer::from_positions(base.clone()).with_colors(colors);
        Self {
            config,
            seeds,
            base,
            buffer,
            yaw: 0.0,
            roll: 0.0,
            control: ControlState::shown(),
        }
    }

    pub fn update(&mut self, frame: &FrameInput) {
        let following = frame.pointer.is_active() && frame.scroll <= self.config.unbind_scroll;
        let cfg = &self.config;

        for (i, seed) in self.seeds.iter().enumerate() {
            let current = self.buffer.get(i);
            let (target, rate) = if following {
                let anchor = frame.trail.get(seed.trail_index);
                let offset = Vec3::new(seed.angle.cos(), seed.angle.sin(), 0.0) * seed.scatter_radius;
                (anchor + offset, seed.speed)
            } else {
                let b = self.base[i];
                let dist = b.length();
                let target = if dist > 0.0 {
                    let ripple = (frame.time * cfg.ripple_speed - dist * cfg.ripple_frequency).sin();
                    b * ((dist + ripple * cfg.ripple_intensity) / dist)
                } else {
                    b
                };
                (target, cfg.return_speed)
            };
            let mut next = current + (target - current) * rate;
            next.z = 0.0;
            self.buffer.set(i, next);
        }

        if following {
            self.yaw *= SPIN_DECAY;
            self.roll *= SPIN_DECAY;
        } else {
            self.yaw += IDLE_YAW_STEP;
            self.roll = (frame.time * 0.2).sin() * 0.05;
        }

        self.buffer.mark_dirty();
    }

    /// Scale from the control state, then the idle spin.
    pub fn model(&self) -> Mat4 {
        let s = self.control.scale();
        Mat4::from_scale_rotation_translation(
            Vec3::new(s, s, 1.0),
            Quat::from_euler(EulerRot::YXZ, self.yaw, 0.0, self.roll),
            Vec3::ZERO,
        )
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Resting position of particle `i` on the spiral disc.
    pub fn base_position(&self, i: usize) -> Vec3 {
        self.base[i]
    }

    pub fn spin(&self) -> (f32, f32) {
        (self.yaw, self.roll)
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
            sprite: Sprite::Glowing,
            blur: 0.0,
            blend: Blend::Additive,
            vertex_colors: true,
        }
    }
}
