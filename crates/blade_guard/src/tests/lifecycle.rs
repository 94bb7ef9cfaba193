//! Impacts, guard pose, scheduling, reset and reload

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::arbitration::{InteractionKind, Phase};
use crate::events::{GuardEvent, GuardEventHandler, GuardEventKind, ScheduledCommand};
use crate::physics::Verdict;
use crate::{GuardSnapshot, INTERACTIONS};
use approx::assert_relative_eq;

/// Shield on the left, sword on the right, far apart
fn shield_and_sword() -> (GuardContext, ScriptedHost) {
    logging::init_for_tests();
    let mut host = ScriptedHost::new();
    let buckler = host.add_implement("buckler", ImplementKind::Shield, 0.0);
    let sword = host.add_implement("steel sword", ImplementKind::Blade, 1.0);
    host.equip_now(Hand::Left, buckler);
    host.equip_now(Hand::Right, sword);
    host.set_hand_pose(Hand::Left, Some(upright(0.0)));
    host.set_hand_pose(Hand::Right, Some(upright(100.0)));
    (GuardContext::new(GuardConfig::default()), host)
}

fn run_for(guard: &mut GuardContext, host: &mut ScriptedHost, seconds: f32) {
    let ticks = (seconds / 0.1).round() as usize;
    for _ in 0..ticks {
        guard.tick(host, 0.1);
    }
}

#[test]
fn test_third_impact_fires_effect_then_locks_out() {
    let (mut guard, mut host) = shield_and_sword();

    guard.on_hand_collision(&host, Hand::Right, 5.0);
    run_for(&mut guard, &mut host, 2.0);
    guard.on_hand_collision(&host, Hand::Right, 5.0);
    assert_eq!(guard.impacts().count(), 2);
    run_for(&mut guard, &mut host, 2.0);
    guard.on_hand_collision(&host, Hand::Right, 5.0);

    let fired: Vec<_> = guard
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e.kind, GuardEventKind::ImpactEffect { hand: Hand::Right }))
        .collect();
    assert_eq!(fired.len(), 1);
    assert!(guard.impacts().is_locked_out());

    run_for(&mut guard, &mut host, 1.0);
    guard.on_hand_collision(&host, Hand::Right, 5.0);
    assert_eq!(guard.impacts().count(), 0);
    assert_relative_eq!(guard.impacts().lockout_remaining(), 239.0, epsilon = 1e-3);
    assert!(guard
        .drain_events()
        .iter()
        .all(|e| e.event_type() != GuardEventType::ImpactEffect));
}

#[test]
fn test_weak_or_shieldless_impacts_are_ignored() {
    let (mut guard, mut host) = shield_and_sword();
    guard.on_hand_collision(&host, Hand::Right, 3.0);
    assert_eq!(guard.impacts().count(), 0);

    // The shield hand striking the sword does not count.
    guard.on_hand_collision(&host, Hand::Left, 8.0);
    assert_eq!(guard.impacts().count(), 0);

    guard.on_hand_collision(&host, Hand::Right, 3.5);
    assert_eq!(guard.impacts().count(), 1);
    run_for(&mut guard, &mut host, 6.0);
    assert_eq!(guard.impacts().count(), 0);
}

#[test]
fn test_crossed_blades_toggle_blocking() {
    let mut duel = Duel::new(GuardConfig::default(), 40.0);
    duel.host.set_heading(Some(0.0));
    duel.host.set_hand_pose(
        Hand::Left,
        Some(Transform::looking_along(Vec3::zeros(), Vec3::new(1.0, 0.5, 1.0))),
    );
    duel.host.set_hand_pose(
        Hand::Right,
        Some(Transform::looking_along(Vec3::new(40.0, 0.0, 0.0), Vec3::new(-1.0, 0.5, 1.0))),
    );

    duel.tick();
    assert!(duel.guard.guard_pose_active());
    assert!(duel.host.is_blocking());
    assert_eq!(
        duel.guard.last_result(InteractionKind::BladeVsBlade).map(|r| r.verdict),
        Some(Verdict::Contacting)
    );
    let types = duel.event_types();
    assert!(types.contains(&GuardEventType::GuardPoseStarted));
    assert!(types.contains(&GuardEventType::ContactStarted));

    duel.move_right_to(200.0);
    duel.tick();
    assert!(!duel.guard.guard_pose_active());
    assert!(!duel.host.is_blocking());
    let types = duel.event_types();
    assert!(types.contains(&GuardEventType::GuardPoseEnded));
    assert!(types.contains(&GuardEventType::ContactEnded));
    assert_eq!(
        duel.host
            .commands()
            .iter()
            .filter(|c| matches!(c, HostCommand::StartBlocking | HostCommand::StopBlocking))
            .count(),
        2
    );
}

#[test]
fn test_clear_all_state_resets_everything() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    for step in 1..=10 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
    assert_eq!(duel.guard.phase(InteractionKind::BladeVsBlade), Some(Phase::Diverted));
    duel.guard.on_hand_collision(&duel.host, Hand::Right, 5.0);
    duel.guard.schedule(
        1.0,
        ScheduledCommand::Equip {
            hand: Hand::Left,
            implement: duel.left_sword,
            silent: true,
        },
    );
    let commands_before = duel.host.commands().len();

    duel.guard.clear_all_state();

    assert_eq!(duel.host.commands().len(), commands_before);
    for kind in INTERACTIONS {
        assert_eq!(duel.guard.phase(kind), Some(Phase::Idle));
        assert!(duel.guard.last_result(kind).is_none());
    }
    assert_eq!(duel.guard.tracker().ticks_since_equip_change(), 0);
    assert!(!duel.guard.combat_state().close_combat_mode);
    assert_eq!(duel.guard.impacts().count(), 0);
    assert!(!duel.guard.guard_pose_active());
    assert_eq!(duel.event_types(), vec![GuardEventType::StateCleared]);

    // The scheduled equip was dropped with the rest.
    duel.idle(150);
    assert_eq!(duel.host.equipped(Hand::Left), None);
}

#[test]
fn test_clear_all_state_drops_hand_cooldown() {
    let mut config = single_band_config();
    config.blade.cooldown = 5.0;
    let mut duel = Duel::new(config, 45.0);
    duel.idle(25);
    for step in 1..=10 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
    duel.tick();
    duel.move_right_to(45.0);
    duel.idle(92);
    assert!(duel.guard.is_hand_on_cooldown(Hand::Left));

    // Both interactions that divert the left hand report the same cooldown.
    let snapshot = duel.guard.snapshot();
    let left_diverting: Vec<_> = snapshot
        .interactions
        .iter()
        .filter(|i| i.kind.diverted_hand() == Hand::Left)
        .collect();
    assert_eq!(left_diverting.len(), 2);
    for interaction in &left_diverting {
        assert!(interaction.cooldown_remaining > 4.0);
        assert_relative_eq!(interaction.cooldown_remaining, left_diverting[0].cooldown_remaining);
    }

    duel.guard.clear_all_state();
    assert!(!duel.guard.is_hand_on_cooldown(Hand::Left));
    assert!(duel.guard.snapshot().interactions.iter().all(|i| i.cooldown_remaining == 0.0));
}

#[test]
fn test_scheduled_equip_runs_once_due() {
    let mut duel = Duel::new(GuardConfig::default(), 100.0);
    let spare = duel.host.add_implement("spare blade", ImplementKind::Blade, 1.0);
    duel.host.unequip(Hand::Right, true).unwrap();
    duel.host.restore_to_inventory(duel.right_sword).unwrap();
    duel.guard.schedule(
        0.05,
        ScheduledCommand::Equip {
            hand: Hand::Right,
            implement: spare,
            silent: true,
        },
    );

    duel.idle(4);
    assert_eq!(duel.host.equipped(Hand::Right), None);
    duel.idle(1);
    assert_eq!(duel.host.equipped(Hand::Right), Some(spare));
}

#[test]
fn test_snapshot_reflects_state_and_serializes() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    let snapshot = duel.guard.snapshot();
    assert_eq!(snapshot.tick, 25);
    assert_relative_eq!(snapshot.time, 0.25, epsilon = 1e-5);
    assert_eq!(snapshot.interactions.len(), INTERACTIONS.len());
    let blades = snapshot
        .interactions
        .iter()
        .find(|i| i.kind == InteractionKind::BladeVsBlade)
        .unwrap();
    assert_eq!(blades.phase, Phase::Idle);
    assert_eq!(blades.verdict, Verdict::Clear);
    assert_relative_eq!(blades.closest_distance.unwrap(), 45.0, epsilon = 1e-4);

    let text = ron::ser::to_string(&snapshot).unwrap();
    let parsed: GuardSnapshot = ron::from_str(&text).unwrap();
    assert_eq!(parsed, snapshot);
}

#[test]
fn test_apply_config_keeps_machine_state() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    for step in 1..=10 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
    duel.tick();
    assert_eq!(
        duel.guard.phase(InteractionKind::BladeVsBlade),
        Some(Phase::MonitoringSeparation)
    );

    let mut config = duel.guard.config().clone();
    config.blade.separation_timeout = 0.2;
    duel.guard.apply_config(config);
    assert_eq!(
        duel.guard.phase(InteractionKind::BladeVsBlade),
        Some(Phase::MonitoringSeparation)
    );

    duel.move_right_to(40.0);
    duel.idle(20);
    assert_eq!(duel.guard.phase(InteractionKind::BladeVsBlade), Some(Phase::PendingReequip));
}

#[test]
fn test_handlers_receive_dispatched_events() {
    struct Recorder(Rc<RefCell<Vec<GuardEventType>>>);

    impl GuardEventHandler for Recorder {
        fn on_event(&mut self, event: &GuardEvent) -> bool {
            self.0.borrow_mut().push(event.event_type());
            false
        }
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut duel = Duel::new(GuardConfig::default(), 45.0);
    duel.guard
        .register_handler(GuardEventType::CloseCombatEntered, Box::new(Recorder(Rc::clone(&seen))));

    duel.host.set_combat(true, Some(20.0));
    duel.tick();
    duel.guard.dispatch_events();
    assert_eq!(*seen.borrow(), vec![GuardEventType::CloseCombatEntered]);
}

#[test]
fn test_oversized_delta_is_clamped() {
    let mut duel = Duel::new(GuardConfig::default(), 45.0);
    duel.guard.tick(&mut duel.host, 3.0);
    assert_relative_eq!(duel.guard.clock().delta_time(), 0.1);
    duel.guard.tick(&mut duel.host, f32::NAN);
    assert_relative_eq!(duel.guard.clock().delta_time(), 1e-4);
}
