//! Divert, restore and suppression scenarios

use super::*;
use crate::arbitration::{InteractionKind, Phase};
use crate::events::GuardEventKind;
use crate::foundation::math::Quat;
use crate::physics::Verdict;
use approx::assert_relative_eq;

const BLADES: InteractionKind = InteractionKind::BladeVsBlade;

/// Approach from 45 units at 2 units per tick until the gap is 25
fn approach_to_divert(duel: &mut Duel) {
    for step in 1..=10 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
        if step < 10 {
            assert_eq!(duel.guard.phase(BLADES), Some(Phase::Idle), "diverted early at step {step}");
        }
    }
}

#[test]
fn test_divert_on_first_imminent_tick() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    duel.guard.drain_events();

    approach_to_divert(&mut duel);

    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Diverted));
    let result = duel.guard.last_result(BLADES).unwrap();
    assert_relative_eq!(result.closest_distance, 25.0, epsilon = 1e-4);
    assert_relative_eq!(result.closing_velocity, 200.0, epsilon = 0.5);
    assert_eq!(duel.host.equipped(Hand::Left), None);
    assert_eq!(duel.divert_count(), 1);

    let events = duel.guard.drain_events();
    assert!(events.iter().any(|e| matches!(
        e.kind,
        GuardEventKind::Diverted {
            hand: Hand::Left,
            bypassed_cooldown: false,
            ..
        }
    )));
}

#[test]
fn test_separation_restores_after_timeout() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    let stand_in = duel.guard.machine(BLADES).unwrap().stand_in().unwrap();

    duel.tick();
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::MonitoringSeparation));

    // Still close: the separation timer keeps restarting.
    duel.idle(50);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::MonitoringSeparation));

    duel.move_right_to(40.0);
    duel.idle(89);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::MonitoringSeparation));
    duel.tick();
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::PendingReequip));
    assert!(!duel.host.exists(stand_in));

    duel.tick();
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::CooldownActive));
    assert_eq!(duel.host.equipped(Hand::Left), Some(duel.left_sword));
    assert!(duel.host.commands().contains(&HostCommand::Equip {
        hand: Hand::Left,
        implement: duel.left_sword,
        silent: true,
    }));
}

#[test]
fn test_single_divert_per_approach() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    for step in 1..=8 {
        duel.move_right_to(25.0 - 2.0 * step as f32);
        duel.tick();
    }
    assert_eq!(duel.divert_count(), 1);
}

#[test]
fn test_no_divert_during_grace_period() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.tick();
    approach_to_divert_unchecked(&mut duel);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Idle));
    assert_eq!(duel.divert_count(), 0);
}

fn approach_to_divert_unchecked(duel: &mut Duel) {
    for step in 1..=10 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
}

const GRACE_TICKS: u32 = 10;

/// Swap the right sword for a spare 27 units out, wait `quiet_ticks`, then
/// step in to 25 at 200 units per second
fn strike_after_swap(quiet_ticks: usize) -> Duel {
    let mut config = single_band_config();
    config.general.equip_grace_ticks = GRACE_TICKS;
    let mut duel = Duel::new(config, 27.0);
    duel.idle(25);

    duel.swap_right("spare sword", ImplementKind::Blade, 1.0, upright(27.0));
    duel.idle(quiet_ticks);
    assert_eq!(duel.guard.snapshot().ticks_since_equip_change as usize, quiet_ticks - 1);

    duel.move_right_to(25.0);
    duel.tick();
    duel
}

#[test]
fn test_grace_covers_ticks_before_limit() {
    let duel = strike_after_swap(GRACE_TICKS as usize - 1);
    assert_eq!(duel.guard.snapshot().ticks_since_equip_change, GRACE_TICKS - 1);
    assert_eq!(duel.guard.last_result(BLADES).map(|r| r.verdict), Some(Verdict::Imminent));
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Idle));
    assert_eq!(duel.divert_count(), 0);
}

#[test]
fn test_grace_ends_at_limit() {
    let duel = strike_after_swap(GRACE_TICKS as usize);
    assert_eq!(duel.guard.snapshot().ticks_since_equip_change, GRACE_TICKS);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Diverted));
    assert_eq!(duel.divert_count(), 1);
}

#[test]
fn test_slow_approach_never_diverts() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    // 0.3 units per tick is 30 units per second, below the closing floor.
    for step in 1..=100 {
        duel.move_right_to(45.0 - 0.3 * step as f32);
        duel.tick();
    }
    assert_eq!(duel.divert_count(), 0);
}

#[test]
fn test_cooldown_blocks_fresh_approach() {
    let mut config = single_band_config();
    config.blade.cooldown = 5.0;
    let mut duel = Duel::new(config, 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    duel.tick();
    duel.move_right_to(45.0);
    duel.idle(92);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::CooldownActive));

    // Wait out the equip grace period, then swing in again.
    duel.idle(25);
    approach_to_divert_unchecked(&mut duel);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::CooldownActive));
    assert_eq!(duel.divert_count(), 1);
}

#[test]
fn test_cooldown_is_shared_by_interactions_on_one_hand() {
    let mut config = single_band_config();
    config.blade.cooldown = 5.0;
    config.shield.imminent_backup_threshold = config.shield.imminent_threshold;
    let mut duel = Duel::new(config, 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    duel.tick();
    duel.move_right_to(45.0);
    duel.idle(92);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::CooldownActive));
    assert!(duel.guard.is_hand_on_cooldown(Hand::Left));

    // Buckler in the right hand, its face turned toward the left blade.
    let facing_left = Transform::from_position_rotation(
        Vec3::new(45.0, 0.0, 35.0),
        Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
    );
    duel.swap_right("buckler", ImplementKind::Shield, 0.0, facing_left);
    let shield_right = InteractionKind::BladeVsShield { shield_hand: Hand::Right };
    assert_eq!(duel.guard.phase(shield_right), Some(Phase::CooldownActive));
    duel.idle(25);

    // Left blade swings at the buckler at 200 units per second.
    for step in 1..=12 {
        duel.host.set_hand_position(Hand::Left, Vec3::new(2.0 * step as f32, 0.0, 0.0));
        duel.tick();
        assert_ne!(duel.guard.phase(shield_right), Some(Phase::Diverted), "diverted at step {step}");
    }
    assert_eq!(duel.guard.last_result(shield_right).map(|r| r.verdict), Some(Verdict::Imminent));
    assert_eq!(duel.guard.phase(shield_right), Some(Phase::CooldownActive));
    assert_eq!(duel.host.equipped(Hand::Left), Some(duel.left_sword));
    assert_eq!(duel.divert_count(), 1);
    assert!(duel.guard.is_hand_on_cooldown(Hand::Left));
}

#[test]
fn test_backup_band_bypasses_cooldown() {
    let mut config = GuardConfig::default();
    config.blade.cooldown = 5.0;
    let mut duel = Duel::new(config, 45.0);
    duel.idle(25);
    duel.guard.drain_events();

    // First approach diverts at 29, inside the backup band.
    for step in 1..=8 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Diverted));
    duel.tick();
    duel.move_right_to(45.0);
    duel.idle(92);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::CooldownActive));
    duel.idle(25);
    duel.guard.drain_events();

    for step in 1..=8 {
        duel.move_right_to(45.0 - 2.0 * step as f32);
        duel.tick();
    }
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Diverted));
    assert!(duel.guard.drain_events().iter().any(|e| matches!(
        e.kind,
        GuardEventKind::Diverted {
            bypassed_cooldown: true,
            ..
        }
    )));
}

#[test]
fn test_close_combat_forces_reequip() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Diverted));

    duel.host.set_combat(true, Some(50.0));
    duel.tick();

    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Idle));
    assert_eq!(duel.host.equipped(Hand::Left), Some(duel.left_sword));
    assert!(duel.guard.combat_state().close_combat_mode);
    let types = duel.event_types();
    assert!(types.contains(&GuardEventType::CloseCombatEntered));
    assert!(types.contains(&GuardEventType::ForcedReequip));
    assert!(!types.contains(&GuardEventType::Reequipped));
}

#[test]
fn test_close_combat_suppresses_divert() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.host.set_combat(true, Some(40.0));
    duel.idle(25);
    approach_to_divert_unchecked(&mut duel);
    assert_eq!(duel.divert_count(), 0);

    duel.host.set_combat(true, Some(85.0));
    duel.tick();
    assert!(duel.guard.combat_state().close_combat_mode);
    duel.host.set_combat(false, None);
    duel.tick();
    assert!(!duel.guard.combat_state().close_combat_mode);
}

#[test]
fn test_dropped_stand_in_is_regrabbed() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    duel.tick();
    let stand_in = duel.guard.machine(BLADES).unwrap().stand_in().unwrap();

    duel.host.release(Hand::Left);
    duel.guard.on_dropped(&mut duel.host, true, stand_in);
    assert_eq!(duel.host.held_object(Hand::Left), Some(stand_in));
    assert!(duel.host.commands().contains(&HostCommand::Regrab {
        hand: Hand::Left,
        handle: stand_in,
    }));
    duel.tick();
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::MonitoringSeparation));
}

#[test]
fn test_lost_stand_in_collapses_to_idle() {
    let mut duel = Duel::new(single_band_config(), 45.0);
    duel.idle(25);
    approach_to_divert(&mut duel);
    duel.tick();
    let stand_in = duel.guard.machine(BLADES).unwrap().stand_in().unwrap();
    duel.host.despawn(stand_in);
    duel.tick();
    assert_eq!(duel.guard.phase(BLADES), Some(Phase::Idle));
    assert!(duel.event_types().contains(&GuardEventType::DivertAborted));
}

#[test]
fn test_shield_divert_moves_weapon_hand() {
    logging::init_for_tests();
    let mut config = GuardConfig::default();
    config.shield.imminent_backup_threshold = config.shield.imminent_threshold;
    let mut guard = GuardContext::new(config);
    let mut host = ScriptedHost::new();
    let buckler = host.add_implement("buckler", ImplementKind::Shield, 0.0);
    let sword = host.add_implement("steel sword", ImplementKind::Blade, 1.0);
    host.equip_now(Hand::Left, buckler);
    host.equip_now(Hand::Right, sword);

    // Shield faces +Z; the sword lies flat above it and drops toward the face.
    let face_up = Transform::from_position_rotation(
        Vec3::zeros(),
        crate::foundation::math::Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI),
    );
    host.set_hand_pose(Hand::Left, Some(face_up));
    let flat = |z: f32| Transform::looking_along(Vec3::new(-35.0, 0.0, z), Vec3::x());
    host.set_hand_pose(Hand::Right, Some(flat(60.0)));

    for _ in 0..25 {
        guard.tick(&mut host, DT);
    }
    let kind = InteractionKind::BladeVsShield { shield_hand: Hand::Left };
    for step in 1..=40 {
        host.set_hand_pose(Hand::Right, Some(flat(60.0 - step as f32)));
        guard.tick(&mut host, DT);
        if guard.phase(kind) == Some(Phase::Diverted) {
            break;
        }
    }
    assert_eq!(guard.phase(kind), Some(Phase::Diverted));
    assert_eq!(host.equipped(Hand::Right), None);
    assert_eq!(host.equipped(Hand::Left), Some(buckler));
    let result = guard.last_result(kind).unwrap();
    assert!(result.in_front);
    assert_relative_eq!(result.closest_distance, 25.0, epsilon = 1e-3);
}
