//! Flat point buffers and per-particle seed records.
//!
//! A [`PointBuffer`] is what crosses the GPU boundary: one position per
//! vertex, a parallel alpha channel, and a dirty flag telling the renderer
//! whether the contents changed since the last upload.

use glam::Vec3;

use crate::spawn::SpawnContext;

/// Where hidden particles are parked. Far outside every camera frustum.
pub const HIDDEN_POSITION: Vec3 = Vec3::splat(99999.0);

/// Flat vertex buffer shared with the GPU upload boundary.
#[derive(Debug, Clone)]
pub struct PointBuffer {
    positions: Vec<Vec3>,
    alpha: Vec<f32>,
    colors: Option<Vec<Vec3>>,
    dirty: bool,
}

impl PointBuffer {
    /// Buffer of `len` vertices at the origin with full alpha.
    pub fn new(len: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; len],
            alpha: vec![1.0; len],
            colors: None,
            dirty: true,
        }
    }

    /// Buffer initialized from existing positions.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let len = positions.len();
        Self {
            positions,
            alpha: vec![1.0; len],
            colors: None,
            dirty: true,
        }
    }

    /// Attach per-vertex colors. Lengths must match.
    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(colors.len(), self.positions.len());
        self.colors = Some(colors);
        self
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the buffer holds no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable vertex positions. Callers mark the buffer dirty themselves.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Per-vertex alpha.
    #[inline]
    pub fn alpha(&self) -> &[f32] {
        &self.alpha
    }

    /// Mutable per-vertex alpha.
    #[inline]
    pub fn alpha_mut(&mut self) -> &mut [f32] {
        &mut self.alpha
    }

    /// Optional per-vertex colors.
    #[inline]
    pub fn colors(&self) -> Option<&[Vec3]> {
        self.colors.as_deref()
    }

    /// Position of vertex `i`.
    #[inline]
    pub fn get(&self, i: usize) -> Vec3 {
        self.positions[i]
    }

    /// Set position of vertex `i`.
    #[inline]
    pub fn set(&mut self, i: usize, p: Vec3) {
        self.positions[i] = p;
    }

    /// Park vertex `i` outside the frustum.
    #[inline]
    pub fn hide(&mut self, i: usize) {
        self.positions[i] = HIDDEN_POSITION;
    }

    /// Whether vertex `i` is parked.
    #[inline]
    pub fn is_hidden(&self, i: usize) -> bool {
        self.positions[i] == HIDDEN_POSITION
    }

    /// Flag the contents for re-upload.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the contents changed since the last [`PointBuffer::take_dirty`].
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Position bytes for GPU upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Alpha bytes for GPU upload.
    pub fn alpha_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.alpha)
    }
}

/// Immutable per-particle attributes of a beam-style system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    /// Height the particle was spawned at.
    pub base_height: f32,
    /// Angular offset in radians.
    pub phase: f32,
    /// Height lost per frame.
    pub speed: f32,
    /// Radius jitter in `[-0.5, 0.5)`, scaled by the configured thickness.
    pub thickness_jitter: f32,
    /// Phase of the sinusoidal noise term, in `[0, 100)`.
    pub noise_phase: f32,
    /// Stagger of the fade threshold, in `[0, 1)`.
    pub fade_random: f32,
}

impl Seed {
    /// Draw a seed record.
    ///
    /// * `floor`, `ceiling` - height range the particle spawns in
    /// * `spread_degrees` - total angular spread, centered on zero
    /// * `base_speed` - configured fall speed before per-particle variation
    pub fn draw(
        spawn: &mut SpawnContext,
        floor: f32,
        ceiling: f32,
        spread_degrees: f32,
        base_speed: f32,
    ) -> Self {
        let base_height = spawn.random_range(floor, ceiling);
        let phase = spawn.signed(spread_degrees.to_radians());
        let thickness_jitter = spawn.signed(1.0);
        let fade_random = spawn.random();
        Self {
            base_height,
            phase,
            speed: base_speed * spawn.random_range(0.8, 1.2),
            noise_phase: spawn.random_range(0.0, 100.0),
            thickness_jitter,
            fade_random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_flag() {
        let mut buf = PointBuffer::new(4);
        assert!(buf.take_dirty());
        assert!(!buf.is_dirty());
        buf.set(0, Vec3::ONE);
        buf.mark_dirty();
        assert!(buf.take_dirty());
    }

    #[test]
    fn test_hide() {
        let mut buf = PointBuffer::new(2);
        buf.hide(1);
        assert!(buf.is_hidden(1));
        assert!(!buf.is_hidden(0));
    }

    #[test]
    fn test_byte_views() {
        let buf = PointBuffer::new(3);
        assert_eq!(buf.position_bytes().len(), 3 * 12);
        assert_eq!(buf.alpha_bytes().len(), 3 * 4);
    }

    #[test]
    fn test_seed_ranges() {
        let mut spawn = SpawnContext::from_seed(11);
        for _ in 0..500 {
            let s = Seed::draw(&mut spawn, -50.0, 250.0, 360.0, 2.0);
            assert!((-50.0..250.0).contains(&s.base_height));
            assert!(s.phase >= -std::f32::consts::PI && s.phase < std::f32::consts::PI);
            assert!(s.speed >= 1.6 && s.speed < 2.4);
            assert!((-0.5..0.5).contains(&s.thickness_jitter));
            assert!((0.0..100.0).contains(&s.noise_phase));
            assert!((0.0..1.0).contains(&s.fade_random));
        }
    }
}
