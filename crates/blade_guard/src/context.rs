//! Guard context
//!
//! [`GuardContext`] owns every piece of guard state and drives it once per
//! host tick. A tick runs, in order:
//!
//! 1. the clock and any scheduled host commands that fell due
//! 2. close-combat hysteresis, forcing diverted implements back on entry
//! 3. geometry sampling for both hands
//! 4. classification and arbitration for each interaction
//! 5. guard pose detection, auto-equip timers and the impact counter
//!
//! Grab, drop and hand-collision notifications arrive between ticks through
//! the `on_*` methods. Nothing here is global: a host may run several
//! contexts side by side.

use serde::{Deserialize, Serialize};

use crate::arbitration::{
    ArbitrationInputs, AutoEquipAction, AutoEquipInputs, AutoEquipTimer, CloseCombatTransition,
    CombatProximityMonitor, CombatProximityState, HandArbitrationStateMachine, HandCooldowns, ImpactCounter,
    ImpactOutcome, InteractionKind, Phase,
};
use crate::core::config::{CollisionThresholds, GuardConfig};
use crate::events::{EventSystem, GuardEvent, GuardEventHandler, GuardEventKind, GuardEventType, ScheduledCommand};
use crate::foundation::hand::Hand;
use crate::foundation::handles::{ImplementHandle, ImplementKind};
use crate::foundation::time::TickClock;
use crate::host::GuardHost;
use crate::physics::collision::{closest_points_segment_disc, closest_points_segment_segment};
use crate::physics::{
    classify_blade_shield, classify_blades, CollisionClassifier, CollisionResult, GeometryTracker, GuardPoseDetector,
    GuardPoseEdge, TrackedSource, Verdict,
};

/// Interactions every context arbitrates
pub const INTERACTIONS: [InteractionKind; 3] = [
    InteractionKind::BladeVsBlade,
    InteractionKind::BladeVsShield { shield_hand: Hand::Left },
    InteractionKind::BladeVsShield { shield_hand: Hand::Right },
];

struct Interaction {
    classifier: CollisionClassifier,
    machine: HandArbitrationStateMachine,
    last_result: Option<CollisionResult>,
}

/// Serializable view of one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    /// Which pair
    pub kind: InteractionKind,
    /// Arbitration phase
    pub phase: Phase,
    /// Last verdict
    pub verdict: Verdict,
    /// Last closest distance, if geometry was available
    pub closest_distance: Option<f32>,
    /// Cooldown left on the diverted hand, in seconds
    pub cooldown_remaining: f32,
}

/// Serializable view of the whole guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardSnapshot {
    /// Ticks run so far
    pub tick: u64,
    /// Simulation time in seconds
    pub time: f64,
    /// Ticks since the equipped set changed
    pub ticks_since_equip_change: u32,
    /// Per-interaction state
    pub interactions: Vec<InteractionSnapshot>,
    /// Combat proximity
    pub combat: CombatProximityState,
    /// Impacts counted in the current window
    pub impact_count: u32,
    /// Impact lockout left in seconds
    pub impact_lockout_remaining: f32,
    /// Whether each hand (left, right) has an auto-equip pending
    pub auto_equip_pending: [bool; 2],
    /// Whether the crossed-blade guard is held
    pub guard_pose: bool,
}

/// All guard state for one player
pub struct GuardContext {
    config: GuardConfig,

    clock: TickClock,

    tracker: GeometryTracker,

    interactions: Vec<Interaction>,

    /// Shared by every interaction that diverts the same hand
    cooldowns: HandCooldowns,

    auto_equip: [AutoEquipTimer; 2],

    combat: CombatProximityMonitor,

    impacts: ImpactCounter,

    guard_pose: GuardPoseDetector,

    events: EventSystem,
}

impl Default for GuardContext {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

fn thresholds_for(config: &GuardConfig, kind: InteractionKind) -> CollisionThresholds {
    match kind {
        InteractionKind::BladeVsBlade => config.blade.thresholds(),
        InteractionKind::BladeVsShield { .. } => config.shield.thresholds(),
    }
}

fn classify(tracker: &GeometryTracker, kind: InteractionKind, thresholds: &CollisionThresholds) -> Option<CollisionResult> {
    match kind {
        InteractionKind::BladeVsBlade => {
            let left = tracker.blade(Hand::Left)?;
            let right = tracker.blade(Hand::Right)?;
            Some(classify_blades(left, right, thresholds))
        }
        InteractionKind::BladeVsShield { shield_hand } => {
            let blade = tracker.blade(shield_hand.other())?;
            let shield = tracker.shield(shield_hand)?;
            Some(classify_blade_shield(blade, shield, thresholds))
        }
    }
}

/// Whether both hands hold equipped implements of the kinds `kind` pairs
fn is_armed(tracker: &GeometryTracker, kind: InteractionKind) -> bool {
    let equipped_as = |hand: Hand, wanted: ImplementKind| {
        let frame = tracker.frame(hand);
        frame.source.is_some_and(TrackedSource::is_equipped) && frame.kind == Some(wanted)
    };
    let opposing_kind = match kind {
        InteractionKind::BladeVsBlade => ImplementKind::Blade,
        InteractionKind::BladeVsShield { .. } => ImplementKind::Shield,
    };
    equipped_as(kind.diverted_hand(), ImplementKind::Blade) && equipped_as(kind.opposing_hand(), opposing_kind)
}

/// Distance from a blade held in `hand` to whatever the other hand carries
fn held_blade_distance(tracker: &GeometryTracker, hand: Hand) -> Option<f32> {
    let held = tracker.blade(hand)?;
    let other = hand.other();
    if let Some(blade) = tracker.blade(other) {
        return Some(closest_points_segment_segment(&held.segment(), &blade.segment()).distance);
    }
    tracker
        .shield(other)
        .map(|shield| closest_points_segment_disc(&held.segment(), &shield.disc()).distance)
}

impl GuardContext {
    /// Create a context; the configuration is sanitized first
    pub fn new(config: GuardConfig) -> Self {
        let config = config.sanitized();
        let interactions = INTERACTIONS
            .iter()
            .map(|&kind| Interaction {
                classifier: CollisionClassifier::new(),
                machine: HandArbitrationStateMachine::new(
                    kind,
                    thresholds_for(&config, kind),
                    config.general.divert_confirm_window,
                ),
                last_result: None,
            })
            .collect();

        Self {
            clock: TickClock::new(),
            tracker: GeometryTracker::new(&config),
            interactions,
            cooldowns: HandCooldowns::new(),
            auto_equip: [AutoEquipTimer::new(Hand::Left), AutoEquipTimer::new(Hand::Right)],
            combat: CombatProximityMonitor::new(&config.close_combat),
            impacts: ImpactCounter::new(&config.impact),
            guard_pose: GuardPoseDetector::new(),
            events: EventSystem::new(),
            config,
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Swap in a new configuration without losing state
    pub fn apply_config(&mut self, config: GuardConfig) {
        let config = config.sanitized();
        self.tracker.apply_config(&config);
        for interaction in &mut self.interactions {
            let kind = interaction.machine.kind();
            interaction
                .machine
                .apply_thresholds(thresholds_for(&config, kind), config.general.divert_confirm_window);
        }
        self.combat.apply_config(&config.close_combat);
        self.impacts.apply_config(&config.impact);
        log::info!("Guard configuration reloaded");
        self.config = config;
    }

    /// Run one tick against the host
    pub fn tick<H: GuardHost + ?Sized>(&mut self, host: &mut H, raw_delta: f32) {
        let delta_time = self.clock.advance(raw_delta);
        self.events.update_time(self.clock.total_time());

        self.run_scheduled(host);

        if let Some(transition) = self.combat.sample(&*host) {
            self.on_close_combat_transition(transition, host);
        }
        let close_combat = self.combat.is_close_combat();

        let stand_ins = self.stand_ins();
        self.tracker.update(&*host, stand_ins, delta_time);
        let in_grace_period = self.tracker.in_grace_period(self.config.general.equip_grace_ticks);

        self.cooldowns.tick(delta_time);
        let mut reequipped = Vec::new();
        for interaction in &mut self.interactions {
            let kind = interaction.machine.kind();
            let thresholds = thresholds_for(&self.config, kind);
            let result = classify(&self.tracker, kind, &thresholds);
            let edge = interaction.classifier.observe(result.as_ref());

            if let Some(result) = result.filter(|_| edge.contact_started) {
                log::debug!("{}: contact at {:.1}", kind, result.closest_distance);
                self.events.send(GuardEventKind::ContactStarted {
                    interaction: kind,
                    distance: result.closest_distance,
                    point: result.collision_point(),
                });
            }
            if edge.contact_ended {
                log::debug!("{}: contact ended", kind);
                self.events.send(GuardEventKind::ContactEnded { interaction: kind });
            }

            let inputs = ArbitrationInputs {
                delta_time,
                became_imminent: edge.became_imminent,
                distance: result.map(|r| r.closest_distance),
                in_grace_period,
                close_combat,
                armed: is_armed(&self.tracker, kind),
                hand_on_cooldown: self.cooldowns.is_active(interaction.machine.hand()),
            };
            if interaction.machine.tick(&inputs, host, &mut self.events).is_some() {
                let hand = interaction.machine.hand();
                self.cooldowns.start(hand, interaction.machine.cooldown_duration());
                reequipped.push(hand);
            }
            interaction.last_result = result;
        }
        for hand in reequipped {
            self.enter_cooldown(hand);
        }

        self.update_guard_pose(host);

        if !close_combat {
            self.update_auto_equip(host, delta_time);
        }

        self.impacts.tick(delta_time);
    }

    fn run_scheduled<H: GuardHost + ?Sized>(&mut self, host: &mut H) {
        for command in self.events.take_due_commands() {
            let outcome = match command {
                ScheduledCommand::Equip { hand, implement, silent } => {
                    if host.equipped(hand) == Some(implement) {
                        Ok(())
                    } else {
                        host.equip(hand, implement, silent)
                    }
                }
                ScheduledCommand::RestoreToInventory { handle } => host.restore_to_inventory(handle),
            };
            if let Err(err) = outcome {
                log::warn!("Scheduled {:?} failed: {}", command, err);
            }
        }
    }

    fn on_close_combat_transition<H: GuardHost + ?Sized>(&mut self, transition: CloseCombatTransition, host: &mut H) {
        match transition {
            CloseCombatTransition::Entered { distance } => {
                self.events.send(GuardEventKind::CloseCombatEntered { distance });
                for interaction in &mut self.interactions {
                    interaction.machine.force_reequip(host, &mut self.events);
                }
                for hand in Hand::BOTH {
                    if let Some(handle) = self.auto_equip[hand.index()].cancel() {
                        self.equip_held(hand, handle, false, host);
                    }
                }
            }
            CloseCombatTransition::Exited => self.events.send(GuardEventKind::CloseCombatExited),
        }
    }

    fn update_guard_pose<H: GuardHost + ?Sized>(&mut self, host: &mut H) {
        let in_contact = self
            .interactions
            .iter()
            .find(|i| i.machine.kind() == InteractionKind::BladeVsBlade)
            .and_then(|i| i.last_result)
            .is_some_and(|r| r.is_contacting());
        let edge = self.guard_pose.update(
            in_contact,
            self.tracker.blade(Hand::Left),
            self.tracker.blade(Hand::Right),
            host.player_heading(),
        );
        match edge {
            Some(GuardPoseEdge::Started) => {
                log::info!("Crossed-blade guard formed");
                if let Err(err) = host.start_blocking() {
                    log::warn!("Could not start blocking: {}", err);
                }
                self.events.send(GuardEventKind::GuardPoseStarted);
            }
            Some(GuardPoseEdge::Ended) => {
                log::info!("Crossed-blade guard broken");
                if host.is_blocking() {
                    if let Err(err) = host.stop_blocking() {
                        log::warn!("Could not stop blocking: {}", err);
                    }
                }
                self.events.send(GuardEventKind::GuardPoseEnded);
            }
            None => {}
        }
    }

    fn update_auto_equip<H: GuardHost + ?Sized>(&mut self, host: &mut H, delta_time: f32) {
        for hand in Hand::BOTH {
            let Some(pending) = self.auto_equip[hand.index()].pending() else {
                continue;
            };
            let inputs = AutoEquipInputs {
                delta_time,
                other_hand_equipped: host.equipped(hand.other()).is_some(),
                still_held: host.held_object(hand) == Some(pending),
                distance: held_blade_distance(&self.tracker, hand),
            };
            let action = self.auto_equip[hand.index()].tick(
                &inputs,
                self.config.blade.imminent_threshold,
                self.config.auto_equip.delay,
            );
            match action {
                Some(AutoEquipAction::Equip(handle)) => self.equip_held(hand, handle, true, host),
                Some(AutoEquipAction::Cancelled(_)) => {
                    self.events.send(GuardEventKind::AutoEquipCancelled { hand });
                }
                None => {}
            }
        }
    }

    /// Pick up a held object and equip it into `hand`
    fn equip_held<H: GuardHost + ?Sized>(&mut self, hand: Hand, handle: ImplementHandle, with_cooldown: bool, host: &mut H) {
        if let Err(err) = host.restore_to_inventory(handle) {
            log::warn!("Could not pick up {} hand object: {}", hand, err);
            return;
        }
        if let Err(err) = host.equip(hand, handle, true) {
            log::warn!("Could not equip {} hand object: {}", hand, err);
            return;
        }
        log::info!("Held blade equipped into {} hand", hand);
        self.events.send(GuardEventKind::AutoEquipped {
            hand,
            implement: handle,
        });
        if with_cooldown {
            self.cooldowns.start(hand, self.config.blade.cooldown);
            self.enter_cooldown(hand);
        }
    }

    /// Move every machine diverting `hand` into its cooldown phase
    fn enter_cooldown(&mut self, hand: Hand) {
        for interaction in &mut self.interactions {
            if interaction.machine.hand() == hand {
                interaction.machine.start_cooldown();
            }
        }
    }

    fn stand_ins(&self) -> [Option<ImplementHandle>; 2] {
        let mut stand_ins = [None; 2];
        for interaction in &self.interactions {
            if let Some(stand_in) = interaction.machine.stand_in() {
                stand_ins[interaction.machine.hand().index()] = Some(stand_in);
            }
        }
        stand_ins
    }

    fn is_stand_in(&self, handle: ImplementHandle) -> bool {
        self.interactions
            .iter()
            .any(|interaction| interaction.machine.stand_in() == Some(handle))
    }

    /// A controller grabbed a world object
    ///
    /// Arms the auto-equip timer when the object is a blade, the other hand
    /// is equipped and the object is not a stand-in from an active divert.
    /// In close combat the blade is equipped straight away.
    pub fn on_grabbed<H: GuardHost + ?Sized>(&mut self, host: &mut H, is_left_controller: bool, handle: ImplementHandle) {
        let hand = Hand::from_controller(is_left_controller, self.config.general.left_handed_mode);
        if !self.config.auto_equip.enabled {
            return;
        }
        if host.implement_kind(handle) != Some(ImplementKind::Blade) {
            return;
        }
        if self.is_stand_in(handle) {
            log::debug!("{} hand grabbed its own stand-in, no auto-equip", hand);
            return;
        }
        if self
            .interactions
            .iter()
            .any(|interaction| interaction.machine.hand() == hand && interaction.machine.is_busy())
        {
            log::debug!("{} hand is mid-divert, no auto-equip", hand);
            return;
        }
        if host.equipped(hand.other()).is_none() {
            log::debug!("{} hand grabbed a blade but the other hand is empty", hand);
            return;
        }
        if self.combat.is_close_combat() {
            self.equip_held(hand, handle, false, host);
        } else {
            self.auto_equip[hand.index()].start(handle);
        }
    }

    /// A controller released a world object
    ///
    /// Cancels a pending auto-equip for that object and pulls a dropped
    /// stand-in back into its hand.
    pub fn on_dropped<H: GuardHost + ?Sized>(&mut self, host: &mut H, is_left_controller: bool, handle: ImplementHandle) {
        let hand = Hand::from_controller(is_left_controller, self.config.general.left_handed_mode);
        let timer = &mut self.auto_equip[hand.index()];
        if timer.pending() == Some(handle) {
            timer.cancel();
            log::info!("Auto-equip for {} hand cancelled, object dropped", hand);
            self.events.send(GuardEventKind::AutoEquipCancelled { hand });
        }

        let owner = self
            .interactions
            .iter()
            .map(|interaction| &interaction.machine)
            .find(|machine| machine.stand_in() == Some(handle) && machine.is_busy())
            .map(HandArbitrationStateMachine::hand);
        if let Some(owner) = owner {
            match host.regrab(owner, handle) {
                Ok(()) => log::info!("Stand-in dropped, regrabbed into {} hand", owner),
                Err(err) => log::warn!("Could not regrab stand-in into {} hand: {}", owner, err),
            }
        }
    }

    /// The physics engine reported a collision on `hand`
    ///
    /// Restarts separation timing for diverts on that hand and counts the
    /// collision as a shield impact when a blade strikes the shield in the
    /// other hand fast enough.
    pub fn on_hand_collision<H: GuardHost + ?Sized>(&mut self, host: &H, hand: Hand, separating_velocity: f32) {
        for interaction in &mut self.interactions {
            if interaction.machine.hand() == hand {
                interaction.machine.note_collision();
            }
        }

        let holds_blade = host
            .equipped(hand)
            .or_else(|| host.held_object(hand))
            .and_then(|handle| host.implement_kind(handle))
            == Some(ImplementKind::Blade);
        let other_has_shield = host
            .equipped(hand.other())
            .and_then(|handle| host.implement_kind(handle))
            == Some(ImplementKind::Shield);
        if !holds_blade || !other_has_shield || !self.impacts.qualifies(separating_velocity) {
            return;
        }

        if self.impacts.record_impact() == ImpactOutcome::Fired {
            self.events.send(GuardEventKind::ImpactEffect { hand });
        }
    }

    /// Schedule a host command `delay` seconds of simulation time from now
    pub fn schedule(&mut self, delay: f32, command: ScheduledCommand) {
        self.events.post(delay, command);
    }

    /// Reset everything to the freshly constructed state
    ///
    /// Hosts call this on load, death or any other discontinuity. No host
    /// commands are issued.
    pub fn clear_all_state(&mut self) {
        log::info!("Clearing all guard state");
        for interaction in &mut self.interactions {
            interaction.machine.reset();
            interaction.classifier.reset();
            interaction.last_result = None;
        }
        self.tracker.clear();
        self.cooldowns.reset();
        for timer in &mut self.auto_equip {
            timer.cancel();
        }
        self.combat.reset();
        self.impacts.reset();
        self.guard_pose.reset();
        self.events.clear();
        self.events.send(GuardEventKind::StateCleared);
    }

    /// Take events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }

    /// Deliver queued events to registered handlers
    pub fn dispatch_events(&mut self) {
        self.events.dispatch();
    }

    /// Register an event handler
    pub fn register_handler(&mut self, event_type: GuardEventType, handler: Box<dyn GuardEventHandler>) {
        self.events.register_handler(event_type, handler);
    }

    /// Machine for an interaction
    pub fn machine(&self, kind: InteractionKind) -> Option<&HandArbitrationStateMachine> {
        self.interactions
            .iter()
            .map(|interaction| &interaction.machine)
            .find(|machine| machine.kind() == kind)
    }

    /// Phase of an interaction
    pub fn phase(&self, kind: InteractionKind) -> Option<Phase> {
        self.machine(kind).map(HandArbitrationStateMachine::phase)
    }

    /// Last classification of an interaction
    pub fn last_result(&self, kind: InteractionKind) -> Option<&CollisionResult> {
        self.interactions
            .iter()
            .find(|interaction| interaction.machine.kind() == kind)
            .and_then(|interaction| interaction.last_result.as_ref())
    }

    /// Geometry tracker
    pub const fn tracker(&self) -> &GeometryTracker {
        &self.tracker
    }

    /// Simulation clock
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Combat proximity state
    pub const fn combat_state(&self) -> CombatProximityState {
        self.combat.state()
    }

    /// Impact counter
    pub const fn impacts(&self) -> &ImpactCounter {
        &self.impacts
    }

    /// Object awaiting auto-equip in `hand`
    pub const fn auto_equip_pending(&self, hand: Hand) -> Option<ImplementHandle> {
        self.auto_equip[hand.index()].pending()
    }

    /// Whether the crossed-blade guard is held
    pub const fn guard_pose_active(&self) -> bool {
        self.guard_pose.is_active()
    }

    /// Whether `hand` was re-equipped recently and is still cooling down
    pub fn is_hand_on_cooldown(&self, hand: Hand) -> bool {
        self.cooldowns.is_active(hand)
    }

    /// Serializable view of the current state
    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            tick: self.clock.tick_count(),
            time: self.clock.total_time(),
            ticks_since_equip_change: self.tracker.ticks_since_equip_change(),
            interactions: self
                .interactions
                .iter()
                .map(|interaction| InteractionSnapshot {
                    kind: interaction.machine.kind(),
                    phase: interaction.machine.phase(),
                    verdict: interaction.classifier.previous(),
                    closest_distance: interaction.last_result.map(|r| r.closest_distance),
                    cooldown_remaining: self.cooldowns.remaining(interaction.machine.hand()),
                })
                .collect(),
            combat: self.combat.state(),
            impact_count: self.impacts.count(),
            impact_lockout_remaining: self.impacts.lockout_remaining(),
            auto_equip_pending: [
                self.auto_equip[0].pending().is_some(),
                self.auto_equip[1].pending().is_some(),
            ],
            guard_pose: self.guard_pose.is_active(),
        }
    }
}
