//! Random draws for building particle seed records.
//!
//! Every constructor in [`crate::families`] takes a `&mut SpawnContext`
//! instead of reaching for a thread-local RNG, so a scene built from the same
//! seed always produces the same seeds, heights and scatter positions.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seeded random source with helpers for the spawn patterns the particle
/// families use.
///
/// ```ignore
/// let mut spawn = SpawnContext::from_seed(7);
/// let height = spawn.random_range(bounds.floor, bounds.top + 200.0);
/// let phase = spawn.signed(spread_radians);
/// ```
#[derive(Debug)]
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Deterministic context for a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Context seeded from the system clock. Different every run.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Derive an independent child context, e.g. one per particle system.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.rng.gen())
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. A degenerate range returns `min`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.random()
    }

    /// Random f32 in `[-width/2, width/2)`.
    #[inline]
    pub fn signed(&mut self, width: f32) -> f32 {
        (self.random() - 0.5) * width
    }

    /// Random angle in `[0, TAU)`.
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.random() * TAU
    }

    /// Random triple with each component in `[0, 1)`.
    pub fn random_vec3(&mut self) -> Vec3 {
        Vec3::new(self.random(), self.random(), self.random())
    }

    // ========== Position helpers ==========

    /// Random point in a box of the given half extents, shifted by `bias`.
    ///
    /// A bias of zero centers the box on the origin. Each component of
    /// `bias` moves the sampling window, e.g. `0.3` on Z samples
    /// `(u - 0.2) * 2 * half.z` instead of `(u - 0.5) * 2 * half.z`.
    pub fn random_in_box(&mut self, half: Vec3, bias: Vec3) -> Vec3 {
        Vec3::new(
            (self.random() - 0.5 + bias.x) * half.x * 2.0,
            (self.random() - 0.5 + bias.y) * half.y * 2.0,
            (self.random() - 0.5 + bias.z) * half.z * 2.0,
        )
    }
}

/// Convert HSL (all components 0-1) to RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
