//! Shield impact counting
//!
//! Counts qualifying blade-on-shield impacts inside a rolling window. When
//! enough land before the window runs out the effect fires and further
//! impacts are ignored for the lockout period.

use crate::core::config::ImpactConfig;
use crate::foundation::time::TickTimer;

/// Result of recording one impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactOutcome {
    /// Counting is disabled
    Disabled,
    /// Ignored because the lockout is running
    LockedOut,
    /// Counted toward the threshold
    Counted {
        /// Impacts in the current window
        count: u32,
    },
    /// Threshold reached; the effect fires and the lockout starts
    Fired,
}

/// Windowed impact counter with lockout
#[derive(Debug, Clone)]
pub struct ImpactCounter {
    config: ImpactConfig,

    count: u32,

    window: TickTimer,

    lockout: TickTimer,
}

impl ImpactCounter {
    /// Create an empty counter
    pub fn new(config: &ImpactConfig) -> Self {
        Self {
            config: config.clone(),
            count: 0,
            window: TickTimer::new(),
            lockout: TickTimer::new(),
        }
    }

    /// Pick up new settings; counts and running timers are kept
    pub fn apply_config(&mut self, config: &ImpactConfig) {
        self.config = config.clone();
    }

    /// Whether a hand collision is fast enough to count
    pub fn qualifies(&self, separating_velocity: f32) -> bool {
        separating_velocity > self.config.min_separating_velocity
    }

    /// Record one qualifying impact
    pub fn record_impact(&mut self) -> ImpactOutcome {
        if !self.config.enabled {
            return ImpactOutcome::Disabled;
        }
        if self.lockout.is_running() {
            log::debug!(
                "Shield impact ignored, lockout {:.1}s remaining",
                self.lockout_remaining()
            );
            return ImpactOutcome::LockedOut;
        }

        if self.count == 0 {
            self.window.start();
        }
        self.count += 1;

        if self.count >= self.config.threshold {
            log::info!("Shield impact threshold reached, effect fired");
            self.count = 0;
            self.window.stop();
            self.lockout.start();
            ImpactOutcome::Fired
        } else {
            log::debug!("Shield impact {}/{}", self.count, self.config.threshold);
            ImpactOutcome::Counted { count: self.count }
        }
    }

    /// Advance the window and lockout timers
    pub fn tick(&mut self, delta_time: f32) {
        self.window.advance(delta_time);
        if self.window.has_elapsed(self.config.window) {
            log::debug!("Shield impact window expired with {} impacts", self.count);
            self.count = 0;
            self.window.stop();
        }

        self.lockout.advance(delta_time);
        if self.lockout.has_elapsed(self.config.lockout) {
            log::info!("Shield impact lockout ended");
            self.lockout.stop();
        }
    }

    /// Impacts in the current window
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Whether impacts are currently ignored
    pub const fn is_locked_out(&self) -> bool {
        self.lockout.is_running()
    }

    /// Seconds until the lockout ends
    pub fn lockout_remaining(&self) -> f32 {
        if self.lockout.is_running() {
            self.lockout.remaining(self.config.lockout)
        } else {
            0.0
        }
    }

    /// Clear counts and timers
    pub fn reset(&mut self) {
        self.count = 0;
        self.window.stop();
        self.lockout.stop();
    }
}
