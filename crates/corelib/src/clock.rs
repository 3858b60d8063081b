//! Monotonic time sources and a frame-rate counter.

use std::cell::Cell;
use std::time::Instant;

/// Supplies monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by [`Instant`], zero at construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic stepping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

const FPS_WINDOW_MS: f64 = 1000.0;

/// Counts frames and publishes a rounded rate once per second.
#[derive(Clone, Copy, Debug, Default)]
pub struct FpsCounter {
    window_start: Option<f64>,
    frames: u32,
    fps: Option<u32>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame at `now_ms`. Returns the new rate when a window closes.
    pub fn frame(&mut self, now_ms: f64) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now_ms);
        self.frames += 1;
        let span = now_ms - start;
        if span < FPS_WINDOW_MS {
            return None;
        }
        let fps = (f64::from(self.frames) * 1000.0 / span).round() as u32;
        self.fps = Some(fps);
        self.frames = 0;
        self.window_start = Some(now_ms);
        Some(fps)
    }

    /// Last published rate.
    pub fn fps(&self) -> Option<u32> {
        self.fps
    }
}
