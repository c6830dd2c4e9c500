//! Time management utilities

use std::time::{Duration, Instant};

/// Pausable frame timer
///
/// Advanced once per frame by the engine. While paused, frame deltas read as
/// zero and the elapsed wall time accumulates into the pause counter instead
/// of the running total.
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    delta: Duration,
    total: Duration,
    paused_for: Duration,
    actual: Duration,
    frame_count: u64,
    paused: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            paused_for: Duration::ZERO,
            actual: Duration::ZERO,
            frame_count: 0,
            paused: false,
        }
    }

    /// Update the timer from the wall clock (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed);
    }

    /// Advance the timer by an explicit amount of wall time
    pub fn advance(&mut self, elapsed: Duration) {
        self.actual += elapsed;
        self.frame_count += 1;

        if self.paused {
            self.paused_for += elapsed;
            self.delta = Duration::ZERO;
        } else {
            self.total += elapsed;
            self.delta = elapsed;
        }
    }

    /// Time since the last frame in seconds (zero while paused)
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Running time in seconds, excluding pauses; cleared by [`reset`](Self::reset)
    pub fn total_time(&self) -> f32 {
        self.total.as_secs_f32()
    }

    /// Length of the current pause in seconds
    pub fn time_paused(&self) -> f32 {
        self.paused_for.as_secs_f32()
    }

    /// Wall time since the timer was created, including pauses; never reset
    pub fn actual_time(&self) -> f32 {
        self.actual.as_secs_f32()
    }

    /// Number of frames the timer has been advanced
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Pause the timer
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the timer and clear the pause counter
    pub fn unpause(&mut self) {
        self.paused = false;
        self.paused_for = Duration::ZERO;
    }

    /// Whether the timer is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Clear every counter except the actual elapsed time, and unpause
    pub fn reset(&mut self) {
        self.delta = Duration::ZERO;
        self.total = Duration::ZERO;
        self.paused_for = Duration::ZERO;
        self.paused = false;
        self.last_frame = Instant::now();
    }
}
