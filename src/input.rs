//! Pointer history, idle tracking and wheel-driven scrolling.
//!
//! [`MouseTrail`] is the ring buffer the swarm follows. [`Pointer`] tracks
//! whether the user has moved the pointer recently. [`WindowInput`] turns raw
//! winit events into the pointer and scroll values the viewer feeds the
//! animation context.
//!
//! ```ignore
//! let mut trail = MouseTrail::new(90);
//! trail.push(world_pos);
//! let target = trail.get(particle.trail_index);
//! ```

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use winit::event::{MouseScrollDelta, WindowEvent};

/// Seconds of inactivity granted after the pointer leaves the window.
pub const LEAVE_GRACE: f32 = 0.1;

/// Fixed-length history of world-space pointer positions. Newest first.
#[derive(Debug, Clone)]
pub struct MouseTrail {
    points: VecDeque<Vec3>,
    capacity: usize,
}

impl MouseTrail {
    /// A trail of `capacity` entries, all at the origin.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: std::iter::repeat(Vec3::ZERO).take(capacity).collect(),
            capacity,
        }
    }

    /// Push a new head position, dropping the oldest past capacity.
    pub fn push(&mut self, p: Vec3) {
        self.points.push_front(p);
        while self.points.len() > self.capacity {
            self.points.pop_back();
        }
    }

    /// Entry at `index`, clamped to the oldest entry.
    pub fn get(&self, index: usize) -> Vec3 {
        let last = self.points.len().saturating_sub(1);
        self.points.get(index.min(last)).copied().unwrap_or(Vec3::ZERO)
    }

    /// Newest entry.
    pub fn head(&self) -> Vec3 {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize, keeping the newest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.points.truncate(self.capacity);
    }
}

impl Default for MouseTrail {
    fn default() -> Self {
        Self::new(90)
    }
}

/// World-space pointer with an idle countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    position: Vec3,
    active_for: f32,
}

impl Pointer {
    /// Record a move. The pointer stays active for `idle_timeout` seconds.
    pub fn moved(&mut self, world: Vec3, idle_timeout: f32) {
        self.position = world;
        self.active_for = idle_timeout.max(0.0);
    }

    /// Pointer left the window: go idle shortly.
    pub fn left(&mut self) {
        self.active_for = self.active_for.min(LEAVE_GRACE);
    }

    /// Count down the idle timer.
    pub fn tick(&mut self, dt: f32) {
        self.active_for = (self.active_for - dt.max(0.0)).max(0.0);
    }

    /// Whether the pointer moved within the idle timeout.
    pub fn is_active(&self) -> bool {
        self.active_for > 0.0
    }

    /// Last unprojected position.
    pub fn position(&self) -> Vec3 {
        self.position
    }
}

/// Wheel-driven virtual scroll with eased catch-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothScroll {
    target: f32,
    current: f32,
    max: f32,
    /// Fraction of the remaining distance covered per 60Hz frame.
    pub lerp: f32,
    /// Pixels per wheel line.
    pub line_height: f32,
}

impl SmoothScroll {
    pub fn new(max: f32) -> Self {
        Self {
            target: 0.0,
            current: 0.0,
            max: max.max(0.0),
            lerp: 0.1,
            line_height: 100.0,
        }
    }

    /// Scroll by a pixel delta. Positive scrolls down the page.
    pub fn scroll_by(&mut self, pixels: f32) {
        self.target = (self.target + pixels).clamp(0.0, self.max);
    }

    /// Jump straight to an offset.
    pub fn jump_to(&mut self, offset: f32) {
        self.target = offset.clamp(0.0, self.max);
        self.current = self.target;
    }

    /// Ease toward the target. Returns the new offset.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let factor = 1.0 - (1.0 - self.lerp.clamp(0.0, 1.0)).powf(dt.max(0.0) * 60.0);
        self.current += (self.target - self.current) * factor;
        if (self.target - self.current).abs() < 0.01 {
            self.current = self.target;
        }
        self.current
    }

    pub fn offset(&self) -> f32 {
        self.current
    }

    pub fn set_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.target = self.target.min(self.max);
        self.current = self.current.min(self.max);
    }
}

/// Pointer and wheel state gathered from window events between frames.
#[derive(Debug, Default)]
pub struct WindowInput {
    cursor: Option<Vec2>,
    cursor_moved: bool,
    cursor_left: bool,
    scroll_delta: f32,
}

impl WindowInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position in pixels, if it is inside the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Take the per-frame events: (moved-to position, left window, wheel pixels).
    pub fn take_frame(&mut self, line_height: f32) -> (Option<Vec2>, bool, f32) {
        let moved = if std::mem::take(&mut self.cursor_moved) {
            self.cursor
        } else {
            None
        };
        let left = std::mem::take(&mut self.cursor_left);
        let scroll = std::mem::take(&mut self.scroll_delta) * line_height;
        (moved, left, scroll)
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
                self.cursor_moved = true;
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.cursor_left = true;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Wheel down (negative y) scrolls the page down
                self.scroll_delta -= match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_starts_full_at_origin() {
        let trail = MouseTrail::new(90);
        assert_eq!(trail.len(), 90);
        assert_eq!(trail.get(89), Vec3::ZERO);
    }

    #[test]
    fn test_trail_drops_oldest() {
        let mut trail = MouseTrail::new(3);
        for i in 1..=5 {
            trail.push(Vec3::splat(i as f32));
        }
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.head(), Vec3::splat(5.0));
        assert_eq!(trail.get(2), Vec3::splat(3.0));
        // Past the end reads the oldest
        assert_eq!(trail.get(50), Vec3::splat(3.0));
    }

    #[test]
    fn test_pointer_idle_timer() {
        let mut p = Pointer::default();
        assert!(!p.is_active());
        p.moved(Vec3::X, 0.8);
        assert!(p.is_active());
        p.tick(0.5);
        assert!(p.is_active());
        p.tick(0.5);
        assert!(!p.is_active());
    }

    #[test]
    fn test_pointer_leave_shortens_timer() {
        let mut p = Pointer::default();
        p.moved(Vec3::Y, 0.8);
        p.left();
        p.tick(0.05);
        assert!(p.is_active());
        p.tick(0.06);
        assert!(!p.is_active());
    }

    #[test]
    fn test_smooth_scroll_converges_and_clamps() {
        let mut s = SmoothScroll::new(1000.0);
        s.scroll_by(5000.0);
        for _ in 0..600 {
            s.advance(1.0 / 60.0);
        }
        assert_eq!(s.offset(), 1000.0);
        s.scroll_by(-200.0);
        let first = s.advance(1.0 / 60.0);
        assert!(first < 1000.0 && first > 800.0);
    }
}
