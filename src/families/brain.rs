//! Image-sampled point clouds.

use glam::Vec3;

use super::{DrawStyle, FrameInput, Primitive};
use crate::cloud::PointBuffer;
use crate::config::{Blend, BrainConfig, BrainMode, Sprite};
use crate::control::ControlState;
use crate::sampler::SampledPoint;
use crate::spawn::SpawnContext;

/// A cloud of points that settle onto an image silhouette.
///
/// The system is built from already-sampled points, so it only exists once
/// the background decode has finished.
#[derive(Debug)]
pub struct BrainSystem {
    config: BrainConfig,
    targets: Vec<Vec3>,
    initial: Vec<Vec3>,
    random: Vec<f32>,
    buffer: PointBuffer,
    pub control: ControlState,
}

impl BrainSystem {
    pub fn new(config: BrainConfig, points: &[SampledPoint], spawn: &mut SpawnContext) -> Self {
        let config = config.clamped();
        let targets: Vec<Vec3> = points.iter().map(|p| p.target).collect();
        let initial: Vec<Vec3> = points.iter().map(|p| p.initial).collect();
        let random = (0..points.len()).map(|_| spawn.random()).collect();

        let start = match config.mode {
            BrainMode::Morph => initial.clone(),
            BrainMode::Locked | BrainMode::Flash => targets.clone(),
        };

        Self {
            config,
            targets,
            initial,
            random,
            buffer: PointBuffer::from_positions(start),
            control: ControlState::hidden(),
        }
    }

    pub fn update(&mut self, frame: &FrameInput) {
        match self.config.mode {
            BrainMode::Locked => {
                self.buffer.positions_mut().copy_from_slice(&self.targets);
            }
            BrainMode::Morph => {
                let mix = self.control.mix();
                for (i, (from, to)) in self.initial.iter().zip(&self.targets).enumerate() {
                    self.buffer.set(i, from.lerp(*to, mix));
                }
            }
            BrainMode::Flash => {
                self.buffer.positions_mut().copy_from_slice(&self.targets);
                let speed = self.config.flash_speed;
                for (a, r) in self.buffer.alpha_mut().iter_mut().zip(&self.random) {
                    let wave = ((frame.time * speed + r * 10.0).sin() + 1.0) * 0.5;
                    *a = 0.5 + wave * 0.5;
                }
            }
        }
        self.buffer.mark_dirty();
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.targets
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
            sprite: Sprite::Brain,
            blur: self.config.blur,
            blend: Blend::Additive,
            vertex_colors: false,
        }
    }
}
