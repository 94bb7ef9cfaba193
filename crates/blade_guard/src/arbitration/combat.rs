//! Close-combat proximity
//!
//! Close-combat mode turns on when a hostile comes within the enter
//! distance and only turns off once it is beyond the larger exit distance,
//! so a hostile hovering between the two never toggles the mode.

use serde::{Deserialize, Serialize};

use crate::core::config::CloseCombatConfig;
use crate::host::CombatProvider;

/// Distance reported when no hostile is known
pub const UNKNOWN_DISTANCE: f32 = 9999.0;

/// Snapshot of combat proximity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatProximityState {
    /// Player is in combat
    pub in_combat: bool,

    /// Distance to the nearest hostile, [`UNKNOWN_DISTANCE`] if none
    pub nearest_hostile_distance: f32,

    /// Close-combat mode is on
    pub close_combat_mode: bool,
}

impl Default for CombatProximityState {
    fn default() -> Self {
        Self {
            in_combat: false,
            nearest_hostile_distance: UNKNOWN_DISTANCE,
            close_combat_mode: false,
        }
    }
}

/// Mode change produced by an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloseCombatTransition {
    /// Mode turned on
    Entered {
        /// Distance to the nearest hostile
        distance: f32,
    },
    /// Mode turned off
    Exited,
}

/// Hysteresis over hostile distance
#[derive(Debug, Clone)]
pub struct CombatProximityMonitor {
    state: CombatProximityState,

    enter_distance: f32,

    exit_distance: f32,
}

impl CombatProximityMonitor {
    /// Create a monitor outside close combat
    pub fn new(config: &CloseCombatConfig) -> Self {
        Self {
            state: CombatProximityState::default(),
            enter_distance: config.enter_distance,
            exit_distance: config.exit_distance,
        }
    }

    /// Pick up new distances; the current mode is kept
    pub fn apply_config(&mut self, config: &CloseCombatConfig) {
        self.enter_distance = config.enter_distance;
        self.exit_distance = config.exit_distance;
    }

    /// Query a combat provider and update
    pub fn sample<C: CombatProvider + ?Sized>(&mut self, provider: &C) -> Option<CloseCombatTransition> {
        self.update(provider.is_in_combat(), provider.nearest_hostile_distance())
    }

    /// Update from raw combat state
    pub fn update(&mut self, in_combat: bool, nearest_hostile: Option<f32>) -> Option<CloseCombatTransition> {
        self.state.in_combat = in_combat;
        if !in_combat {
            self.state.nearest_hostile_distance = UNKNOWN_DISTANCE;
            return self.exit();
        }

        let distance = nearest_hostile.filter(|d| d.is_finite()).unwrap_or(UNKNOWN_DISTANCE);
        self.state.nearest_hostile_distance = distance;

        if !self.state.close_combat_mode && distance <= self.enter_distance {
            log::info!("Close combat entered, hostile at {:.1}", distance);
            self.state.close_combat_mode = true;
            Some(CloseCombatTransition::Entered { distance })
        } else if self.state.close_combat_mode && distance > self.exit_distance {
            self.exit()
        } else {
            None
        }
    }

    fn exit(&mut self) -> Option<CloseCombatTransition> {
        if !self.state.close_combat_mode {
            return None;
        }
        log::info!("Close combat exited");
        self.state.close_combat_mode = false;
        Some(CloseCombatTransition::Exited)
    }

    /// Current state
    pub const fn state(&self) -> CombatProximityState {
        self.state
    }

    /// Whether close-combat mode is on
    pub const fn is_close_combat(&self) -> bool {
        self.state.close_combat_mode
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.state = CombatProximityState::default();
    }
}
