//! Time management utilities
//!
//! Everything in the guard runs on simulation time: the host supplies a
//! frame delta each tick and all timers accumulate that clamped delta.

/// Smallest delta accepted from the host, in seconds
pub const MIN_DELTA: f32 = 1e-4;

/// Largest delta accepted from the host, in seconds
pub const MAX_DELTA: f32 = 0.1;

/// Slack applied when comparing accumulated time against a duration
///
/// Summing many `f32` deltas drifts by a few ulps; without slack a timer
/// fed exactly `duration` worth of ticks can land one tick late.
pub const TIMER_EPSILON: f64 = 1e-5;

/// Clamp a raw host delta into `[MIN_DELTA, MAX_DELTA]`
///
/// Non-finite input is treated as the minimum step.
pub fn clamp_delta(raw: f32) -> f32 {
    if raw.is_finite() {
        raw.clamp(MIN_DELTA, MAX_DELTA)
    } else {
        MIN_DELTA
    }
}

/// Simulation clock advanced once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickClock {
    delta_time: f32,
    total_time: f64,
    tick_count: u64,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock {
    /// Create a clock at time zero
    pub const fn new() -> Self {
        Self {
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Advance by a raw host delta and return the clamped delta
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        self.delta_time = clamp_delta(raw_delta);
        self.total_time += f64::from(self.delta_time);
        self.tick_count += 1;
        self.delta_time
    }

    /// Clamped delta of the last tick
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total simulation time in seconds
    pub const fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of ticks since creation or last reset
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Accumulating timer for delays measured in simulation time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickTimer {
    elapsed: f64,
    running: bool,
}

impl TickTimer {
    /// Create a stopped timer
    pub const fn new() -> Self {
        Self {
            elapsed: 0.0,
            running: false,
        }
    }

    /// Restart from zero and run
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Stop and clear
    pub fn stop(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }

    /// Zero the accumulated time without changing the running state
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Accumulate a tick's delta if running
    pub fn advance(&mut self, delta_time: f32) {
        if self.running {
            self.elapsed += f64::from(delta_time);
        }
    }

    /// Whether the timer is running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Accumulated time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// Whether a running timer has reached `duration` seconds
    pub fn has_elapsed(&self, duration: f32) -> bool {
        self.running && self.elapsed + TIMER_EPSILON >= f64::from(duration)
    }

    /// Seconds left until `duration`, zero once reached
    pub fn remaining(&self, duration: f32) -> f32 {
        (f64::from(duration) - self.elapsed).max(0.0) as f32
    }
}
