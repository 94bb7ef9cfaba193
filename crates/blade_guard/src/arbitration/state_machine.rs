//! Per-interaction arbitration state machine
//!
//! One machine owns one pair (blade vs blade, or blade vs a shield in a
//! given hand) and the hand whose implement it may divert. The lifecycle
//! of a divert is:
//!
//! ```text
//! Idle -> Diverted -> MonitoringSeparation -> PendingReequip -> CooldownActive -> Idle
//! ```
//!
//! `Diverted` waits for the hand to grip the stand-in, `MonitoringSeparation`
//! waits for the pair to stay apart long enough, `PendingReequip` waits a
//! short delay after the stand-in is returned, and `CooldownActive`
//! suppresses fresh diverts unless the approach is inside the backup band.
//! Any failure along the way collapses the machine back to `Idle`.
//!
//! The cooldown belongs to the hand, not the machine: the context keeps the
//! timer and reports it through [`ArbitrationInputs::hand_on_cooldown`], so
//! every machine diverting the same hand sees the same cooldown.

use serde::{Deserialize, Serialize};

use crate::core::config::CollisionThresholds;
use crate::events::{AbortReason, EventSystem, GuardEventKind};
use crate::foundation::hand::Hand;
use crate::foundation::handles::ImplementHandle;
use crate::foundation::time::TickTimer;
use crate::host::{EquipCollaborator, HostError};

/// Which pair a machine arbitrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Left blade against right blade; the left implement is diverted
    BladeVsBlade,
    /// Blade against a shield; the blade in the other hand is diverted
    BladeVsShield {
        /// Hand holding the shield
        shield_hand: Hand,
    },
}

impl InteractionKind {
    /// Hand whose implement this interaction diverts
    pub const fn diverted_hand(self) -> Hand {
        match self {
            Self::BladeVsBlade => Hand::Left,
            Self::BladeVsShield { shield_hand } => shield_hand.other(),
        }
    }

    /// Hand holding the implement the diverted one is measured against
    pub const fn opposing_hand(self) -> Hand {
        self.diverted_hand().other()
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BladeVsBlade => f.write_str("blade-vs-blade"),
            Self::BladeVsShield { shield_hand } => write!(f, "blade-vs-shield({shield_hand})"),
        }
    }
}

/// Arbitration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Watching for an imminent approach
    Idle,
    /// Stand-in spawned, waiting for the grip to be confirmed
    Diverted,
    /// Waiting for the pair to stay apart
    MonitoringSeparation,
    /// Stand-in returned, waiting to re-equip
    PendingReequip,
    /// The diverted hand is on cooldown, fresh diverts suppressed
    CooldownActive,
}

/// Everything a machine needs to know about the current tick
///
/// Built by the guard context from the classifier and tracker; tests can
/// construct it directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrationInputs {
    /// Clamped tick delta in seconds
    pub delta_time: f32,

    /// The pair turned imminent this tick after a clear tick
    pub became_imminent: bool,

    /// Closest distance of the pair, `None` when geometry is missing
    pub distance: Option<f32>,

    /// The post-equip grace period is running
    pub in_grace_period: bool,

    /// Close-combat mode is on
    pub close_combat: bool,

    /// Both hands hold equipped implements of the kinds this pair needs
    pub armed: bool,

    /// The diverted hand was re-equipped recently and is still cooling down
    pub hand_on_cooldown: bool,
}

impl Default for ArbitrationInputs {
    fn default() -> Self {
        Self {
            delta_time: 0.0,
            became_imminent: false,
            distance: None,
            in_grace_period: false,
            close_combat: false,
            armed: false,
            hand_on_cooldown: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DivertRecord {
    implement: ImplementHandle,
    stand_in: Option<ImplementHandle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SuppressionLog {
    grace: bool,
    cooldown: bool,
    close_combat: bool,
}

/// State machine for one interaction
pub struct HandArbitrationStateMachine {
    kind: InteractionKind,

    hand: Hand,

    phase: Phase,

    thresholds: CollisionThresholds,

    confirm_window: f32,

    /// Confirm wait, separation or re-equip delay depending on phase
    phase_timer: TickTimer,

    /// Time the stand-in has been out of the hand while monitoring
    grip_timer: TickTimer,

    divert: Option<DivertRecord>,

    suppressed: SuppressionLog,
}

impl HandArbitrationStateMachine {
    /// Create an idle machine
    pub fn new(kind: InteractionKind, thresholds: CollisionThresholds, confirm_window: f32) -> Self {
        Self {
            kind,
            hand: kind.diverted_hand(),
            phase: Phase::Idle,
            thresholds,
            confirm_window,
            phase_timer: TickTimer::new(),
            grip_timer: TickTimer::new(),
            divert: None,
            suppressed: SuppressionLog::default(),
        }
    }

    /// Replace thresholds; running timers keep their elapsed time
    pub fn apply_thresholds(&mut self, thresholds: CollisionThresholds, confirm_window: f32) {
        self.thresholds = thresholds;
        self.confirm_window = confirm_window;
    }

    /// Interaction this machine arbitrates
    pub const fn kind(&self) -> InteractionKind {
        self.kind
    }

    /// Hand whose implement is diverted
    pub const fn hand(&self) -> Hand {
        self.hand
    }

    /// Current phase
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a divert is in progress
    pub const fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::Diverted | Phase::MonitoringSeparation | Phase::PendingReequip
        )
    }

    /// Stand-in currently substituting for the diverted implement
    pub fn stand_in(&self) -> Option<ImplementHandle> {
        self.divert.and_then(|record| record.stand_in)
    }

    /// Implement that will be re-equipped when the divert completes
    pub fn diverted_implement(&self) -> Option<ImplementHandle> {
        self.divert.map(|record| record.implement)
    }

    /// Cooldown the hand gets after this machine re-equips it
    pub const fn cooldown_duration(&self) -> f32 {
        self.thresholds.cooldown
    }

    /// Advance one tick
    ///
    /// Returns the implement put back in the hand when a divert completed
    /// this tick; the caller starts that hand's cooldown.
    pub fn tick<E>(&mut self, inputs: &ArbitrationInputs, equip: &mut E, events: &mut EventSystem) -> Option<ImplementHandle>
    where
        E: EquipCollaborator + ?Sized,
    {
        if !inputs.in_grace_period {
            self.suppressed.grace = false;
        }
        if !inputs.close_combat {
            self.suppressed.close_combat = false;
        }

        match self.phase {
            Phase::Idle | Phase::CooldownActive => {
                self.tick_ready(inputs, equip, events);
                None
            }
            Phase::Diverted => {
                self.tick_diverted(inputs, equip, events);
                None
            }
            Phase::MonitoringSeparation => {
                self.tick_monitoring(inputs, equip, events);
                None
            }
            Phase::PendingReequip => self.tick_pending(inputs, equip, events),
        }
    }

    fn tick_ready<E>(&mut self, inputs: &ArbitrationInputs, equip: &mut E, events: &mut EventSystem)
    where
        E: EquipCollaborator + ?Sized,
    {
        if inputs.hand_on_cooldown {
            self.phase = Phase::CooldownActive;
        } else if self.phase == Phase::CooldownActive {
            log::debug!("{}: {} hand off cooldown", self.kind, self.hand);
            self.phase = Phase::Idle;
            self.suppressed.cooldown = false;
            events.send(GuardEventKind::CooldownExpired {
                interaction: self.kind,
                hand: self.hand,
            });
        }

        if !inputs.became_imminent {
            return;
        }
        if !inputs.hand_on_cooldown {
            if self.divert_allowed(inputs) {
                self.start_divert(inputs.distance, false, equip, events);
            }
            return;
        }

        let in_backup_band = inputs
            .distance
            .is_some_and(|d| d > self.thresholds.imminent && d <= self.thresholds.imminent_backup);
        if in_backup_band {
            if self.divert_allowed(inputs) {
                log::info!("{}: backup threshold reached during cooldown, bypassing", self.kind);
                self.start_divert(inputs.distance, true, equip, events);
            }
        } else if !self.suppressed.cooldown {
            log::debug!(
                "{}: imminent while {} hand is on cooldown, letting it slide",
                self.kind,
                self.hand
            );
            self.suppressed.cooldown = true;
        }
    }

    fn divert_allowed(&mut self, inputs: &ArbitrationInputs) -> bool {
        if inputs.close_combat {
            if !self.suppressed.close_combat {
                log::debug!("{}: imminent in close combat, not diverting", self.kind);
                self.suppressed.close_combat = true;
            }
            return false;
        }
        if inputs.in_grace_period {
            if !self.suppressed.grace {
                log::debug!("{}: imminent during equip grace period, not diverting", self.kind);
                self.suppressed.grace = true;
            }
            return false;
        }
        inputs.armed
    }

    fn start_divert<E>(&mut self, distance: Option<f32>, bypassed_cooldown: bool, equip: &mut E, events: &mut EventSystem)
    where
        E: EquipCollaborator + ?Sized,
    {
        let Some(implement) = equip.equipped(self.hand) else {
            return;
        };
        if let Err(err) = equip.unequip(self.hand, true) {
            log::warn!("{}: could not unequip {} hand: {}", self.kind, self.hand, err);
            return;
        }
        let stand_in = match equip.divert(self.hand) {
            Ok(stand_in) => stand_in,
            Err(err) => {
                log::warn!("{}: divert of {} hand failed: {}", self.kind, self.hand, err);
                if let Err(err) = equip.equip(self.hand, implement, true) {
                    log::warn!("{}: could not put back {} hand implement: {}", self.kind, self.hand, err);
                }
                return;
            }
        };

        let distance = distance.unwrap_or(f32::INFINITY);
        log::info!(
            "{}: collision imminent at {:.1}, diverting {} hand implement",
            self.kind,
            distance,
            self.hand
        );
        self.divert = Some(DivertRecord {
            implement,
            stand_in: Some(stand_in),
        });
        self.phase = Phase::Diverted;
        self.phase_timer.start();
        self.grip_timer.stop();
        self.suppressed = SuppressionLog::default();
        events.send(GuardEventKind::Diverted {
            interaction: self.kind,
            hand: self.hand,
            distance,
            bypassed_cooldown,
        });
    }

    fn tick_diverted<E>(&mut self, inputs: &ArbitrationInputs, equip: &mut E, events: &mut EventSystem)
    where
        E: EquipCollaborator + ?Sized,
    {
        let Some(stand_in) = self.stand_in() else {
            self.abort(AbortReason::StandInVanished, events);
            return;
        };
        match equip.is_stand_in_held(stand_in) {
            Ok(true) => {
                log::info!("{}: {} hand gripped the stand-in, monitoring separation", self.kind, self.hand);
                self.phase = Phase::MonitoringSeparation;
                self.phase_timer.start();
                self.grip_timer.stop();
            }
            Ok(false) => {
                self.phase_timer.advance(inputs.delta_time);
                if self.phase_timer.has_elapsed(self.confirm_window) {
                    self.abort(AbortReason::GripNotConfirmed, events);
                }
            }
            Err(err) => {
                log::warn!("{}: stand-in check failed: {}", self.kind, err);
                self.abort(AbortReason::StandInVanished, events);
            }
        }
    }

    fn tick_monitoring<E>(&mut self, inputs: &ArbitrationInputs, equip: &mut E, events: &mut EventSystem)
    where
        E: EquipCollaborator + ?Sized,
    {
        if inputs.close_combat {
            return;
        }
        let Some(stand_in) = self.stand_in() else {
            self.abort(AbortReason::StandInVanished, events);
            return;
        };
        match equip.is_stand_in_held(stand_in) {
            Ok(true) => self.grip_timer.stop(),
            Ok(false) => {
                if !self.grip_timer.is_running() {
                    self.grip_timer.start();
                }
                self.grip_timer.advance(inputs.delta_time);
                if self.grip_timer.has_elapsed(self.confirm_window) {
                    self.abort(AbortReason::GripLost, events);
                    return;
                }
            }
            Err(err) => {
                log::warn!("{}: stand-in check failed: {}", self.kind, err);
                self.abort(AbortReason::StandInVanished, events);
                return;
            }
        }

        // Missing geometry holds the timer where it is.
        let Some(distance) = inputs.distance else {
            return;
        };
        if distance < self.thresholds.reequip {
            self.phase_timer.reset();
            return;
        }
        self.phase_timer.advance(inputs.delta_time);
        log::trace!(
            "{}: separated at {:.1} for {:.3}s",
            self.kind,
            distance,
            self.phase_timer.elapsed()
        );
        if self.phase_timer.has_elapsed(self.thresholds.separation_timeout) {
            self.request_restore(stand_in, equip, events);
        }
    }

    fn request_restore<E>(&mut self, stand_in: ImplementHandle, equip: &mut E, events: &mut EventSystem)
    where
        E: EquipCollaborator + ?Sized,
    {
        match equip.restore_to_inventory(stand_in) {
            Ok(()) => {
                log::info!("{}: pair separated, restoring {} hand implement", self.kind, self.hand);
                if let Some(record) = self.divert.as_mut() {
                    record.stand_in = None;
                }
                self.phase = Phase::PendingReequip;
                self.phase_timer.start();
                events.send(GuardEventKind::RestoreRequested {
                    interaction: self.kind,
                    hand: self.hand,
                });
            }
            Err(HostError::StaleHandle(_)) => self.abort(AbortReason::StandInVanished, events),
            Err(err) => {
                log::warn!("{}: restore failed: {}", self.kind, err);
                self.abort(AbortReason::RestoreFailed, events);
            }
        }
    }

    fn tick_pending<E>(&mut self, inputs: &ArbitrationInputs, equip: &mut E, events: &mut EventSystem) -> Option<ImplementHandle>
    where
        E: EquipCollaborator + ?Sized,
    {
        self.phase_timer.advance(inputs.delta_time);
        if !self.phase_timer.has_elapsed(self.thresholds.reequip_delay) {
            return None;
        }
        let Some(implement) = self.diverted_implement() else {
            self.abort(AbortReason::ReequipFailed, events);
            return None;
        };
        match equip.equip(self.hand, implement, true) {
            Ok(()) => {
                log::info!(
                    "{}: {} hand re-equipped, cooldown {:.2}s",
                    self.kind,
                    self.hand,
                    self.thresholds.cooldown
                );
                self.divert = None;
                self.phase = Phase::CooldownActive;
                self.phase_timer.stop();
                events.send(GuardEventKind::Reequipped {
                    interaction: self.kind,
                    hand: self.hand,
                });
                Some(implement)
            }
            Err(err) => {
                log::warn!("{}: re-equip of {} hand failed: {}", self.kind, self.hand, err);
                self.abort(AbortReason::ReequipFailed, events);
                None
            }
        }
    }

    fn abort(&mut self, reason: AbortReason, events: &mut EventSystem) {
        log::warn!("{}: divert of {} hand abandoned ({:?})", self.kind, self.hand, reason);
        self.clear();
        events.send(GuardEventKind::DivertAborted {
            interaction: self.kind,
            hand: self.hand,
            reason,
        });
    }

    fn clear(&mut self) {
        self.divert = None;
        self.phase = Phase::Idle;
        self.phase_timer.stop();
        self.grip_timer.stop();
        self.suppressed = SuppressionLog::default();
    }

    /// Enter `CooldownActive` because the hand's cooldown just started
    ///
    /// Only an idle or cooling machine is affected; it leaves the phase on
    /// the first tick its hand is reported off cooldown. Returns `false`
    /// when a divert is in progress.
    pub fn start_cooldown(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        log::debug!("{}: {} hand entered cooldown", self.kind, self.hand);
        self.phase = Phase::CooldownActive;
        true
    }

    /// A physics collision was reported on the diverted hand
    ///
    /// Restarts the separation timer while monitoring.
    pub fn note_collision(&mut self) {
        if self.phase == Phase::MonitoringSeparation {
            log::trace!("{}: collision on {} hand, separation timer reset", self.kind, self.hand);
            self.phase_timer.reset();
        }
    }

    /// Put the diverted implement straight back, skipping separation and cooldown
    ///
    /// Returns the re-equipped implement, if a divert was in progress.
    pub fn force_reequip<E>(&mut self, equip: &mut E, events: &mut EventSystem) -> Option<ImplementHandle>
    where
        E: EquipCollaborator + ?Sized,
    {
        let record = self.divert?;
        if let Some(stand_in) = record.stand_in {
            if let Err(err) = equip.restore_to_inventory(stand_in) {
                log::warn!("{}: could not restore stand-in: {}", self.kind, err);
            }
        }
        self.clear();
        match equip.equip(self.hand, record.implement, true) {
            Ok(()) => {
                log::info!("{}: close combat, {} hand implement forced back", self.kind, self.hand);
                events.send(GuardEventKind::ForcedReequip {
                    hand: self.hand,
                    implement: record.implement,
                });
                Some(record.implement)
            }
            Err(err) => {
                log::warn!("{}: forced re-equip of {} hand failed: {}", self.kind, self.hand, err);
                None
            }
        }
    }

    /// Drop everything and return to `Idle` without touching the host
    pub fn reset(&mut self) {
        self.clear();
    }
}
