//! Whole-guard scenario tests driven through [`ScriptedHost`]

mod lifecycle;
mod scenarios;

use crate::core::config::GuardConfig;
use crate::events::GuardEventType;
use crate::foundation::hand::Hand;
use crate::foundation::handles::{ImplementHandle, ImplementKind};
use crate::foundation::logging;
use crate::foundation::math::{Transform, Vec3};
use crate::host::{BlockController, EquipCollaborator, HostCommand, ScriptedHost};
use crate::GuardContext;

/// Tick length used by every scenario
pub const DT: f32 = 0.01;

/// Blades point straight up so the pair stays parallel
pub fn upright(x: f32) -> Transform {
    Transform::looking_along(Vec3::new(x, 0.0, 0.0), Vec3::z())
}

/// Two sword-wielding hands facing each other along X
pub struct Duel {
    pub guard: GuardContext,
    pub host: ScriptedHost,
    pub left_sword: ImplementHandle,
    pub right_sword: ImplementHandle,
}

impl Duel {
    /// Left hand at the origin, right hand at `right_x`
    pub fn new(config: GuardConfig, right_x: f32) -> Self {
        logging::init_for_tests();
        let mut host = ScriptedHost::new();
        let left_sword = host.add_implement("iron sword", ImplementKind::Blade, 1.0);
        let right_sword = host.add_implement("steel sword", ImplementKind::Blade, 1.0);
        host.equip_now(Hand::Left, left_sword);
        host.equip_now(Hand::Right, right_sword);
        host.set_hand_pose(Hand::Left, Some(upright(0.0)));
        host.set_hand_pose(Hand::Right, Some(upright(right_x)));
        Self {
            guard: GuardContext::new(config),
            host,
            left_sword,
            right_sword,
        }
    }

    /// Run `count` ticks without moving anything
    pub fn idle(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Run one tick
    pub fn tick(&mut self) {
        self.guard.tick(&mut self.host, DT);
    }

    /// Move the right hand to `x`
    pub fn move_right_to(&mut self, x: f32) {
        self.host.set_hand_position(Hand::Right, Vec3::new(x, 0.0, 0.0));
    }

    /// Put a fresh implement in the right hand at `pose`
    pub fn swap_right(&mut self, name: &str, kind: ImplementKind, reach: f32, pose: Transform) -> ImplementHandle {
        self.host.unequip(Hand::Right, true).unwrap();
        let handle = self.host.add_implement(name, kind, reach);
        self.host.equip_now(Hand::Right, handle);
        self.host.set_hand_pose(Hand::Right, Some(pose));
        handle
    }

    /// Drain and return event types
    pub fn event_types(&mut self) -> Vec<GuardEventType> {
        self.guard.drain_events().iter().map(|e| e.event_type()).collect()
    }

    /// Number of divert commands the host has seen
    pub fn divert_count(&self) -> usize {
        self.host
            .commands()
            .iter()
            .filter(|c| matches!(c, HostCommand::Divert { .. }))
            .count()
    }
}

/// Defaults with the backup band collapsed onto the primary threshold
pub fn single_band_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.blade.imminent_backup_threshold = config.blade.imminent_threshold;
    config
}
