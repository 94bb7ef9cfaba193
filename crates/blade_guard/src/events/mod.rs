//! Guard event system
//!
//! Every state change the guard makes is reported as a [`GuardEvent`]:
//! - Events are queued during a tick and either drained by the host or
//!   dispatched to registered handlers
//! - Handlers register per event type and return `true` to consume an event
//! - Deferred [`ScheduledCommand`]s run once the simulation clock reaches
//!   their due time, replacing sleeping helper threads

use std::collections::HashMap;

use crate::arbitration::InteractionKind;
use crate::foundation::hand::Hand;
use crate::foundation::handles::ImplementHandle;
use crate::foundation::math::Vec3;
use crate::foundation::time::TIMER_EPSILON;

/// Why a divert was abandoned before the implement was restored normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// The hand never gripped the stand-in
    GripNotConfirmed,
    /// The hand let go of the stand-in and did not pick it up again
    GripLost,
    /// The stand-in no longer exists
    StandInVanished,
    /// The host refused to return the stand-in
    RestoreFailed,
    /// The host refused to re-equip the implement
    ReequipFailed,
}

/// Event type identification, used for handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardEventType {
    /// An implement was swapped for a stand-in
    Diverted,
    /// A divert was abandoned
    DivertAborted,
    /// The stand-in was sent back to inventory
    RestoreRequested,
    /// The implement was equipped again after a divert
    Reequipped,
    /// A post-reequip cooldown finished
    CooldownExpired,
    /// A pair came into contact
    ContactStarted,
    /// A pair left contact
    ContactEnded,
    /// Close-combat mode turned on
    CloseCombatEntered,
    /// Close-combat mode turned off
    CloseCombatExited,
    /// Close combat forced an implement back into the hand
    ForcedReequip,
    /// A freely held blade was equipped
    AutoEquipped,
    /// A pending auto-equip was dropped
    AutoEquipCancelled,
    /// The shield impact effect fired
    ImpactEffect,
    /// Crossed blades formed a guard
    GuardPoseStarted,
    /// The guard was broken
    GuardPoseEnded,
    /// All state was cleared
    StateCleared,
}

/// Event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardEventKind {
    /// An implement was swapped for a stand-in
    Diverted {
        /// Pair that triggered the divert
        interaction: InteractionKind,
        /// Hand whose implement was diverted
        hand: Hand,
        /// Closest distance when the divert fired
        distance: f32,
        /// Whether the divert fired during a cooldown
        bypassed_cooldown: bool,
    },
    /// A divert was abandoned
    DivertAborted {
        /// Pair that owned the divert
        interaction: InteractionKind,
        /// Hand whose implement was diverted
        hand: Hand,
        /// Why it was abandoned
        reason: AbortReason,
    },
    /// The stand-in was sent back to inventory
    RestoreRequested {
        /// Pair that owned the divert
        interaction: InteractionKind,
        /// Hand whose implement was diverted
        hand: Hand,
    },
    /// The implement was equipped again
    Reequipped {
        /// Pair that owned the divert
        interaction: InteractionKind,
        /// Hand that was re-equipped
        hand: Hand,
    },
    /// A cooldown finished
    CooldownExpired {
        /// Pair whose cooldown finished
        interaction: InteractionKind,
        /// Hand the cooldown protected
        hand: Hand,
    },
    /// A pair came into contact
    ContactStarted {
        /// Pair in contact
        interaction: InteractionKind,
        /// Closest distance
        distance: f32,
        /// Midpoint of the closest points
        point: Vec3,
    },
    /// A pair left contact
    ContactEnded {
        /// Pair that separated
        interaction: InteractionKind,
    },
    /// Close-combat mode turned on
    CloseCombatEntered {
        /// Distance to the nearest hostile
        distance: f32,
    },
    /// Close-combat mode turned off
    CloseCombatExited,
    /// Close combat forced an implement back into the hand
    ForcedReequip {
        /// Hand that was re-equipped
        hand: Hand,
        /// Implement that was re-equipped
        implement: ImplementHandle,
    },
    /// A freely held blade was equipped
    AutoEquipped {
        /// Hand that was equipped
        hand: Hand,
        /// Implement that was equipped
        implement: ImplementHandle,
    },
    /// A pending auto-equip was dropped
    AutoEquipCancelled {
        /// Hand whose timer was cancelled
        hand: Hand,
    },
    /// The shield impact effect fired
    ImpactEffect {
        /// Hand whose blade struck the shield
        hand: Hand,
    },
    /// Crossed blades formed a guard
    GuardPoseStarted,
    /// The guard was broken
    GuardPoseEnded,
    /// All state was cleared
    StateCleared,
}

impl GuardEventKind {
    /// Type tag of this payload
    pub const fn event_type(&self) -> GuardEventType {
        match self {
            Self::Diverted { .. } => GuardEventType::Diverted,
            Self::DivertAborted { .. } => GuardEventType::DivertAborted,
            Self::RestoreRequested { .. } => GuardEventType::RestoreRequested,
            Self::Reequipped { .. } => GuardEventType::Reequipped,
            Self::CooldownExpired { .. } => GuardEventType::CooldownExpired,
            Self::ContactStarted { .. } => GuardEventType::ContactStarted,
            Self::ContactEnded { .. } => GuardEventType::ContactEnded,
            Self::CloseCombatEntered { .. } => GuardEventType::CloseCombatEntered,
            Self::CloseCombatExited => GuardEventType::CloseCombatExited,
            Self::ForcedReequip { .. } => GuardEventType::ForcedReequip,
            Self::AutoEquipped { .. } => GuardEventType::AutoEquipped,
            Self::AutoEquipCancelled { .. } => GuardEventType::AutoEquipCancelled,
            Self::ImpactEffect { .. } => GuardEventType::ImpactEffect,
            Self::GuardPoseStarted => GuardEventType::GuardPoseStarted,
            Self::GuardPoseEnded => GuardEventType::GuardPoseEnded,
            Self::StateCleared => GuardEventType::StateCleared,
        }
    }
}

/// Event with its simulation timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardEvent {
    /// What happened
    pub kind: GuardEventKind,
    /// Simulation time in seconds when it happened
    pub timestamp: f64,
}

impl GuardEvent {
    /// Type tag of this event
    pub const fn event_type(&self) -> GuardEventType {
        self.kind.event_type()
    }
}

/// Host command deferred until a simulation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledCommand {
    /// Equip an implement into a hand
    Equip {
        /// Target hand
        hand: Hand,
        /// Implement to equip
        implement: ImplementHandle,
        /// Suppress the equip sound
        silent: bool,
    },
    /// Return an object to inventory
    RestoreToInventory {
        /// Object to restore
        handle: ImplementHandle,
    },
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait GuardEventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &GuardEvent) -> bool;
}

/// Event queue, handler registry and command scheduler
pub struct EventSystem {
    pending: Vec<GuardEvent>,
    scheduled: Vec<(f64, ScheduledCommand)>,
    handlers: HashMap<GuardEventType, Vec<Box<dyn GuardEventHandler>>>,
    current_time: f64,
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSystem {
    /// Create an empty event system
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            scheduled: Vec::new(),
            handlers: HashMap::new(),
            current_time: 0.0,
        }
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current time as last set
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: GuardEventType, handler: Box<dyn GuardEventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event stamped with the current time
    pub fn send(&mut self, kind: GuardEventKind) {
        log::trace!("event at {:.3}s: {:?}", self.current_time, kind);
        self.pending.push(GuardEvent {
            kind,
            timestamp: self.current_time,
        });
    }

    /// Events queued since the last drain or dispatch
    pub fn pending(&self) -> &[GuardEvent] {
        &self.pending
    }

    /// Take all queued events
    pub fn drain(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Deliver queued events to registered handlers
    ///
    /// Stops forwarding an event at the first handler that consumes it.
    pub fn dispatch(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for event in &pending {
            if let Some(handlers) = self.handlers.get_mut(&event.event_type()) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(event) {
                        break;
                    }
                }
            }
        }
    }

    /// Schedule a command `delay` seconds from now
    pub fn post(&mut self, delay: f32, command: ScheduledCommand) {
        let due = self.current_time + f64::from(delay.max(0.0));
        self.scheduled.push((due, command));
    }

    /// Remove and return commands whose due time has been reached, earliest first
    pub fn take_due_commands(&mut self) -> Vec<ScheduledCommand> {
        let now = self.current_time + TIMER_EPSILON;
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|(time, _)| *time <= now);
        self.scheduled = waiting;
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, command)| command).collect()
    }

    /// Number of commands still waiting
    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    /// Clear all queued events and scheduled commands
    pub fn clear(&mut self) {
        self.pending.clear();
        self.scheduled.clear();
    }
}
