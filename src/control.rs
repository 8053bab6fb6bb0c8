//! Per-system control state written by the scroll binder.
//!
//! Control values are plain numbers read by a system's update. Ratios are
//! clamped to `[0, 1]` on write; nothing else is validated. Values persist
//! until the binder overwrites them.

use serde::{Deserialize, Serialize};

/// A writable field of [`ControlState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    /// Fraction of a drift/streak system shown, by per-particle random rank.
    VisibleFraction,
    /// How far up the beam column the cutoff line has progressed.
    FlowLimit,
    /// Fraction of a beam system's particles that exist, by index.
    Density,
    /// Strength of the upward bend of drift and streak systems.
    Bend,
    /// Opacity multiplier applied to the configured base opacity.
    Opacity,
    /// Blend between scatter and target positions of a brain layer.
    Mix,
    /// Absolute drift speed override.
    Speed,
    /// Uniform object scale.
    Scale,
}

/// Scroll-driven numeric state of one particle system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    visible_fraction: f32,
    flow_limit: f32,
    density: f32,
    bend: f32,
    opacity: f32,
    mix: f32,
    speed: Option<f32>,
    scale: f32,
}

impl ControlState {
    /// Everything hidden: all ratios zero, configured speed, unit scale.
    pub fn hidden() -> Self {
        Self {
            visible_fraction: 0.0,
            flow_limit: 0.0,
            density: 0.0,
            bend: 0.0,
            opacity: 0.0,
            mix: 0.0,
            speed: None,
            scale: 1.0,
        }
    }

    /// Fully shown: unit opacity, density and visible fraction.
    pub fn shown() -> Self {
        Self {
            visible_fraction: 1.0,
            density: 1.0,
            opacity: 1.0,
            ..Self::hidden()
        }
    }

    /// Write a field. Ratios clamp to `[0, 1]`, speed and scale to `>= 0`.
    pub fn set(&mut self, field: ControlField, value: f32) {
        let ratio = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let positive = if value.is_nan() { 0.0 } else { value.max(0.0) };
        match field {
            ControlField::VisibleFraction => self.visible_fraction = ratio,
            ControlField::FlowLimit => self.flow_limit = ratio,
            ControlField::Density => self.density = ratio,
            ControlField::Bend => self.bend = ratio,
            ControlField::Opacity => self.opacity = ratio,
            ControlField::Mix => self.mix = ratio,
            ControlField::Speed => self.speed = Some(positive),
            ControlField::Scale => self.scale = positive,
        }
    }

    /// Read a field. An unset speed reads as 0.
    pub fn get(&self, field: ControlField) -> f32 {
        match field {
            ControlField::VisibleFraction => self.visible_fraction,
            ControlField::FlowLimit => self.flow_limit,
            ControlField::Density => self.density,
            ControlField::Bend => self.bend,
            ControlField::Opacity => self.opacity,
            ControlField::Mix => self.mix,
            ControlField::Speed => self.speed.unwrap_or(0.0),
            ControlField::Scale => self.scale,
        }
    }

    #[inline]
    pub fn visible_fraction(&self) -> f32 {
        self.visible_fraction
    }

    #[inline]
    pub fn flow_limit(&self) -> f32 {
        self.flow_limit
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[inline]
    pub fn bend(&self) -> f32 {
        self.bend
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    pub fn mix(&self) -> f32 {
        self.mix
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Speed override, falling back to the configured speed.
    #[inline]
    pub fn speed_or(&self, configured: f32) -> f32 {
        self.speed.unwrap_or(configured)
    }

    /// Drop the speed override.
    pub fn clear_speed(&mut self) {
        self.speed = None;
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_hidden() {
        let c = ControlState::default();
        assert_eq!(c.opacity(), 0.0);
        assert_eq!(c.density(), 0.0);
        assert_eq!(c.scale(), 1.0);
        assert_eq!(c.speed_or(20.0), 20.0);
    }

    #[test]
    fn test_ratios_clamp() {
        let mut c = ControlState::default();
        c.set(ControlField::Density, 1.7);
        assert_eq!(c.density(), 1.0);
        c.set(ControlField::FlowLimit, -0.3);
        assert_eq!(c.flow_limit(), 0.0);
        c.set(ControlField::Opacity, f32::NAN);
        assert_eq!(c.opacity(), 0.0);
    }

    #[test]
    fn test_speed_and_scale_are_not_ratios() {
        let mut c = ControlState::default();
        c.set(ControlField::Speed, 120.0);
        assert_eq!(c.speed_or(60.0), 120.0);
        c.set(ControlField::Scale, 4.0);
        assert_eq!(c.get(ControlField::Scale), 4.0);
        c.set(ControlField::Scale, -1.0);
        assert_eq!(c.scale(), 0.0);
        c.clear_speed();
        assert_eq!(c.speed_or(60.0), 60.0);
    }
}
