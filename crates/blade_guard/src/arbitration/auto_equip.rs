//! Automatic equip of a freely held blade
//!
//! Grabbing a loose blade while the other hand is armed starts a timer for
//! the grabbing hand. The timer only runs while the held blade stays clear
//! of the other hand's implement; once it completes, the blade is picked up
//! and equipped.

use crate::foundation::hand::Hand;
use crate::foundation::handles::ImplementHandle;
use crate::foundation::time::TickTimer;

/// Per-tick inputs for an [`AutoEquipTimer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoEquipInputs {
    /// Clamped tick delta in seconds
    pub delta_time: f32,

    /// The other hand still has something equipped
    pub other_hand_equipped: bool,

    /// The tracked object is still held by this hand
    pub still_held: bool,

    /// Distance from the held blade to the other hand's implement
    pub distance: Option<f32>,
}

/// What the owner must do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoEquipAction {
    /// Pick up and equip this object
    Equip(ImplementHandle),
    /// The pending pick-up was dropped
    Cancelled(ImplementHandle),
}

/// Pick-up timer for one hand
#[derive(Debug, Clone)]
pub struct AutoEquipTimer {
    hand: Hand,

    pending: Option<ImplementHandle>,

    timer: TickTimer,

    close_logged: bool,
}

impl AutoEquipTimer {
    /// Create an idle timer for `hand`
    pub const fn new(hand: Hand) -> Self {
        Self {
            hand,
            pending: None,
            timer: TickTimer::new(),
            close_logged: false,
        }
    }

    /// Hand this timer belongs to
    pub const fn hand(&self) -> Hand {
        self.hand
    }

    /// Object waiting to be equipped
    pub const fn pending(&self) -> Option<ImplementHandle> {
        self.pending
    }

    /// Seconds accumulated toward the delay
    pub fn elapsed(&self) -> f32 {
        self.timer.elapsed()
    }

    /// Start tracking `handle`, replacing anything already pending
    pub fn start(&mut self, handle: ImplementHandle) {
        log::info!("Auto-equip armed for {} hand object {:?}", self.hand, handle);
        self.pending = Some(handle);
        self.timer.start();
        self.close_logged = false;
    }

    /// Stop tracking, returning what was pending
    pub fn cancel(&mut self) -> Option<ImplementHandle> {
        self.timer.stop();
        self.close_logged = false;
        self.pending.take()
    }

    /// Advance one tick
    ///
    /// While the held blade is within `proximity_threshold` of the other
    /// hand the timer is held at zero.
    pub fn tick(&mut self, inputs: &AutoEquipInputs, proximity_threshold: f32, delay: f32) -> Option<AutoEquipAction> {
        let handle = self.pending?;

        if !inputs.other_hand_equipped || !inputs.still_held {
            log::info!(
                "Auto-equip for {} hand cancelled ({})",
                self.hand,
                if inputs.still_held { "other hand emptied" } else { "object released" }
            );
            self.cancel();
            return Some(AutoEquipAction::Cancelled(handle));
        }

        if inputs.distance.is_some_and(|d| d < proximity_threshold) {
            if !self.close_logged {
                log::debug!("Auto-equip for {} hand held back, blades too close", self.hand);
                self.close_logged = true;
            }
            self.timer.reset();
            return None;
        }
        self.close_logged = false;

        self.timer.advance(inputs.delta_time);
        if self.timer.has_elapsed(delay) {
            self.cancel();
            return Some(AutoEquipAction::Equip(handle));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::handles::ImplementArena;

    fn handle() -> ImplementHandle {
        ImplementArena::new().insert(())
    }

    fn clear_inputs() -> AutoEquipInputs {
        AutoEquipInputs {
            delta_time: 0.1,
            other_hand_equipped: true,
            still_held: true,
            distance: Some(100.0),
        }
    }

    #[test]
    fn test_equips_after_delay() {
        let dagger = handle();
        let mut timer = AutoEquipTimer::new(Hand::Right);
        timer.start(dagger);
        for _ in 0..19 {
            assert_eq!(timer.tick(&clear_inputs(), 25.0, 2.0), None);
        }
        assert_eq!(timer.tick(&clear_inputs(), 25.0, 2.0), Some(AutoEquipAction::Equip(dagger)));
        assert_eq!(timer.pending(), None);
    }

    #[test]
    fn test_proximity_resets_timer() {
        let dagger = handle();
        let mut timer = AutoEquipTimer::new(Hand::Right);
        timer.start(dagger);
        for _ in 0..15 {
            timer.tick(&clear_inputs(), 25.0, 2.0);
        }
        let close = AutoEquipInputs {
            distance: Some(10.0),
            ..clear_inputs()
        };
        assert_eq!(timer.tick(&close, 25.0, 2.0), None);
        assert_eq!(timer.elapsed(), 0.0);
        for _ in 0..19 {
            assert_eq!(timer.tick(&clear_inputs(), 25.0, 2.0), None);
        }
        assert!(timer.tick(&clear_inputs(), 25.0, 2.0).is_some());
    }

    #[test]
    fn test_cancels_when_released_or_other_hand_empty() {
        let dagger = handle();
        let mut timer = AutoEquipTimer::new(Hand::Left);
        timer.start(dagger);
        let released = AutoEquipInputs {
            still_held: false,
            ..clear_inputs()
        };
        assert_eq!(timer.tick(&released, 25.0, 2.0), Some(AutoEquipAction::Cancelled(dagger)));

        timer.start(dagger);
        let unarmed = AutoEquipInputs {
            other_hand_equipped: false,
            ..clear_inputs()
        };
        assert_eq!(timer.tick(&unarmed, 25.0, 2.0), Some(AutoEquipAction::Cancelled(dagger)));
        assert_eq!(timer.tick(&clear_inputs(), 25.0, 2.0), None);
    }
}
