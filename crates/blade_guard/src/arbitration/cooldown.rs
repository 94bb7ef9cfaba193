//! Per-hand re-equip cooldown
//!
//! A hand that was just given its implement back is protected from every
//! interaction that can divert it, not only the one that re-equipped it.
//! The context owns one timer per hand and hands each machine a flag.

use crate::foundation::hand::Hand;
use crate::foundation::time::TickTimer;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HandTimer {
    timer: TickTimer,
    duration: f32,
}

/// Cooldown timers for both hands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandCooldowns {
    hands: [HandTimer; 2],
}

impl HandCooldowns {
    /// Both hands off cooldown
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the cooldown for a hand
    pub fn start(&mut self, hand: Hand, duration: f32) {
        let entry = &mut self.hands[hand.index()];
        entry.duration = duration.max(0.0);
        entry.timer.start();
        log::debug!("Cooldown of {:.2}s started for {} hand", entry.duration, hand);
    }

    /// Advance both timers; a timer that reaches its duration stops
    pub fn tick(&mut self, delta_time: f32) {
        for hand in Hand::BOTH {
            let entry = &mut self.hands[hand.index()];
            if !entry.timer.is_running() {
                continue;
            }
            entry.timer.advance(delta_time);
            if entry.timer.has_elapsed(entry.duration) {
                entry.timer.stop();
                log::info!("Cooldown for {} hand expired", hand);
            }
        }
    }

    /// Whether a hand is still cooling down
    pub fn is_active(&self, hand: Hand) -> bool {
        self.hands[hand.index()].timer.is_running()
    }

    /// Seconds left for a hand, zero when it is off cooldown
    pub fn remaining(&self, hand: Hand) -> f32 {
        let entry = &self.hands[hand.index()];
        if entry.timer.is_running() {
            entry.timer.remaining(entry.duration)
        } else {
            0.0
        }
    }

    /// Take both hands off cooldown
    pub fn reset(&mut self) {
        for entry in &mut self.hands {
            entry.timer.stop();
        }
    }
}
