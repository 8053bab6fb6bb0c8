//! The global animation clock.
//!
//! Every particle family reads one shared scalar time value. It advances by a
//! fixed step once per frame rather than by wall-clock delta, so animation
//! speed is tied to the frame cadence the same way the hand-tuned constants
//! in the presets expect.
//!
//! # Example
//!
//! ```ignore
//! use lumenscroll::time::Clock;
//!
//! let mut clock = Clock::new();
//! let t = clock.advance(); // once per frame
//! log::debug!("t={t:.3} frame={} fps={:.1}", clock.frame(), clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Default per-frame increment of the animation clock.
pub const DEFAULT_STEP: f32 = 0.015;

/// Frames-per-second over a rolling half-second window.
#[derive(Debug, Clone, Copy)]
struct FpsMeter {
    window_start: Instant,
    frames_in_window: u32,
    fps: f32,
}

impl FpsMeter {
    const WINDOW: Duration = Duration::from_millis(500);

    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames_in_window: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames_in_window += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Self::WINDOW {
            self.fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
            self.frames_in_window = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Fixed-step animation clock.
#[derive(Debug)]
pub struct Clock {
    time: f32,
    step: f32,
    scale: f32,
    paused: bool,
    frames: u64,
    meter: FpsMeter,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_step(DEFAULT_STEP)
    }

    /// A clock that adds `step` per frame. Negative steps clamp to 0.
    pub fn with_step(step: f32) -> Self {
        Self {
            time: 0.0,
            step: step.max(0.0),
            scale: 1.0,
            paused: false,
            frames: 0,
            meter: FpsMeter::new(),
        }
    }

    /// Advance by one frame and return the new time.
    ///
    /// While paused the frame counter still moves but time does not.
    pub fn advance(&mut self) -> f32 {
        self.frames += 1;
        self.time += self.step();
        self.meter.tick();
        self.time
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// What the last [`advance`](Self::advance) added: 0 while paused.
    #[inline]
    pub fn step(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            self.step * self.scale
        }
    }

    /// Frames advanced so far, paused ones included.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frames
    }

    /// Measured display rate.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.meter.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.scale
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Multiply the step. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
