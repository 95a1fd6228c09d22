//! Frame timing
//!
//! The scene manager stamps every frame with a [`FrameTime`] produced by a
//! [`FrameClock`]. The clock can follow wall time or be advanced by a fixed
//! step, which keeps headless runs and tests deterministic.

use std::time::Instant;

/// Timestamp handed to every per-frame pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Monotonic frame counter, starting at 1 for the first ticked frame
    pub frame_index: u64,
    /// Seconds since the clock was created
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Source of frame timestamps
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    fixed_step: Option<f32>,
    current: FrameTime,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock that follows wall time
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            fixed_step: None,
            current: FrameTime::default(),
        }
    }

    /// Create a clock that advances by `step` seconds per tick
    pub fn fixed(step: f32) -> Self {
        Self {
            fixed_step: Some(step),
            ..Self::new()
        }
    }

    /// Advance to the next frame and return its timestamp
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = match self.fixed_step {
            Some(step) => self.current.elapsed + step,
            None => self.start.elapsed().as_secs_f32(),
        };
        self.current = FrameTime {
            frame_index: self.current.frame_index + 1,
            elapsed,
            delta: elapsed - self.current.elapsed,
        };
        self.current
    }

    /// Timestamp of the most recent frame
    pub fn current(&self) -> FrameTime {
        self.current
    }
}
