//! # Guard Configuration
//!
//! Every tunable the guard reads lives here, grouped by subsystem. All
//! sections use `#[serde(default)]` so a file only needs to name the values
//! it changes.
//!
//! ## Sections
//!
//! - **Blade**: distance bands and timers for blade-vs-blade arbitration
//! - **Shield**: the same bands for blade-vs-shield, plus the disc radius
//! - **Auto-equip**: pick-up of a freely held blade
//! - **Close combat**: hostile proximity hysteresis
//! - **Impact**: shield-impact counting and lockout
//! - **General**: grace period, handedness, blade reach scaling, logging
//!
//! Loaded values pass through [`GuardConfig::sanitized`] before use, which
//! repairs non-positive or mis-ordered thresholds and logs each repair.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Thresholds consumed by the classifier and the arbitration state machine
///
/// Built from either [`BladeConfig`] or [`ShieldConfig`]; distances are in
/// world units and times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionThresholds {
    /// Distance at or below which the pair is in contact
    pub contact: f32,

    /// Primary imminent distance
    pub imminent: f32,

    /// Secondary imminent distance that also bypasses the cooldown
    pub imminent_backup: f32,

    /// Distance the pair must exceed before the separation timer runs
    pub reequip: f32,

    /// Time the pair must stay separated before the implement is restored
    pub separation_timeout: f32,

    /// Time-to-collision below which an approach is flagged as fast
    pub time_to_collision_threshold: f32,

    /// Post-reequip cooldown
    pub cooldown: f32,

    /// Delay between the restore request and the re-equip
    pub reequip_delay: f32,

    /// Minimum closing velocity for an approach to count as imminent
    pub min_closing_velocity: f32,
}

/// Blade-vs-blade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BladeConfig {
    /// Contact distance
    pub contact_threshold: f32,

    /// Primary imminent distance
    pub imminent_threshold: f32,

    /// Backup imminent distance, bypasses the cooldown
    pub imminent_backup_threshold: f32,

    /// Separation distance required before restoring
    pub reequip_threshold: f32,

    /// Seconds of continuous separation before restoring
    pub separation_timeout: f32,

    /// Fast-approach time-to-collision threshold
    pub time_to_collision_threshold: f32,

    /// Post-reequip cooldown in seconds
    pub cooldown: f32,

    /// Seconds between restore and re-equip
    pub reequip_delay: f32,

    /// Minimum closing velocity in units per second
    pub min_closing_velocity: f32,
}

impl Default for BladeConfig {
    fn default() -> Self {
        Self {
            contact_threshold: 5.0,
            imminent_threshold: 25.0,
            imminent_backup_threshold: 30.0,
            reequip_threshold: 35.0,
            separation_timeout: 0.9,
            time_to_collision_threshold: 0.15,
            cooldown: 0.5,
            reequip_delay: 0.002,
            min_closing_velocity: 50.0,
        }
    }
}

impl BladeConfig {
    /// Thresholds for the classifier and state machine
    pub const fn thresholds(&self) -> CollisionThresholds {
        CollisionThresholds {
            contact: self.contact_threshold,
            imminent: self.imminent_threshold,
            imminent_backup: self.imminent_backup_threshold,
            reequip: self.reequip_threshold,
            separation_timeout: self.separation_timeout,
            time_to_collision_threshold: self.time_to_collision_threshold,
            cooldown: self.cooldown,
            reequip_delay: self.reequip_delay,
            min_closing_velocity: self.min_closing_velocity,
        }
    }

    fn sanitize(&mut self) {
        let defaults = Self::default();
        let mut t = self.thresholds();
        sanitize_thresholds(&mut t, &defaults.thresholds(), "blade");
        self.contact_threshold = t.contact;
        self.imminent_threshold = t.imminent;
        self.imminent_backup_threshold = t.imminent_backup;
        self.reequip_threshold = t.reequip;
        self.separation_timeout = t.separation_timeout;
        self.time_to_collision_threshold = t.time_to_collision_threshold;
        self.cooldown = t.cooldown;
        self.reequip_delay = t.reequip_delay;
        self.min_closing_velocity = t.min_closing_velocity;
    }
}

/// Blade-vs-shield settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Contact distance
    pub contact_threshold: f32,

    /// Primary imminent distance
    pub imminent_threshold: f32,

    /// Backup imminent distance, bypasses the cooldown
    pub imminent_backup_threshold: f32,

    /// Separation distance required before restoring
    pub reequip_threshold: f32,

    /// Seconds of continuous separation before restoring
    pub separation_timeout: f32,

    /// Fast-approach time-to-collision threshold
    pub time_to_collision_threshold: f32,

    /// Post-reequip cooldown in seconds
    pub cooldown: f32,

    /// Seconds between restore and re-equip
    pub reequip_delay: f32,

    /// Minimum closing velocity in units per second
    pub min_closing_velocity: f32,

    /// Radius of the shield disc
    pub radius: f32,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            contact_threshold: 5.0,
            imminent_threshold: 25.0,
            imminent_backup_threshold: 30.0,
            reequip_threshold: 35.0,
            separation_timeout: 0.9,
            time_to_collision_threshold: 0.15,
            cooldown: 0.5,
            reequip_delay: 0.002,
            min_closing_velocity: 5.0,
            radius: 15.0,
        }
    }
}

impl ShieldConfig {
    /// Thresholds for the classifier and state machine
    pub const fn thresholds(&self) -> CollisionThresholds {
        CollisionThresholds {
            contact: self.contact_threshold,
            imminent: self.imminent_threshold,
            imminent_backup: self.imminent_backup_threshold,
            reequip: self.reequip_threshold,
            separation_timeout: self.separation_timeout,
            time_to_collision_threshold: self.time_to_collision_threshold,
            cooldown: self.cooldown,
            reequip_delay: self.reequip_delay,
            min_closing_velocity: self.min_closing_velocity,
        }
    }

    fn sanitize(&mut self) {
        let defaults = Self::default();
        let mut t = self.thresholds();
        sanitize_thresholds(&mut t, &defaults.thresholds(), "shield");
        self.contact_threshold = t.contact;
        self.imminent_threshold = t.imminent;
        self.imminent_backup_threshold = t.imminent_backup;
        self.reequip_threshold = t.reequip;
        self.separation_timeout = t.separation_timeout;
        self.time_to_collision_threshold = t.time_to_collision_threshold;
        self.cooldown = t.cooldown;
        self.reequip_delay = t.reequip_delay;
        self.min_closing_velocity = t.min_closing_velocity;
        ensure_positive(&mut self.radius, defaults.radius, "shield.radius");
    }
}

/// Automatic pick-up of a freely held blade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoEquipConfig {
    /// Whether grabbing a loose blade starts the pick-up timer
    pub enabled: bool,

    /// Seconds the held blade must stay clear of the other hand
    pub delay: f32,
}

impl Default for AutoEquipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: 2.0,
        }
    }
}

/// Hostile proximity hysteresis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseCombatConfig {
    /// Close-combat mode turns on at or below this distance
    pub enter_distance: f32,

    /// Close-combat mode turns off above this distance
    pub exit_distance: f32,
}

impl Default for CloseCombatConfig {
    fn default() -> Self {
        Self {
            enter_distance: 70.0,
            exit_distance: 90.0,
        }
    }
}

/// Shield impact counting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Whether impacts are counted at all
    pub enabled: bool,

    /// Impacts within the window needed to fire the effect
    pub threshold: u32,

    /// Counting window in seconds
    pub window: f32,

    /// Seconds during which impacts are ignored after the effect fires
    pub lockout: f32,

    /// Separating velocity a hand collision needs to count as an impact
    pub min_separating_velocity: f32,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            window: 6.0,
            lockout: 240.0,
            min_separating_velocity: 3.0,
        }
    }
}

/// Settings shared by every subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Ticks after an equip change during which diverts are suppressed
    ///
    /// Zero disables the grace period.
    pub equip_grace_ticks: u32,

    /// Swap the controller to hand mapping
    pub left_handed_mode: bool,

    /// Seconds to wait for the stand-in grip before aborting a divert
    pub divert_confirm_window: f32,

    /// Multiplier from implement reach to blade length in world units
    pub reach_scale: f32,

    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            equip_grace_ticks: 20,
            left_handed_mode: false,
            divert_confirm_window: 0.3,
            reach_scale: 70.0,
            log_level: "info".to_string(),
        }
    }
}

/// Complete guard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Blade-vs-blade settings
    pub blade: BladeConfig,

    /// Blade-vs-shield settings
    pub shield: ShieldConfig,

    /// Auto-equip settings
    pub auto_equip: AutoEquipConfig,

    /// Close-combat settings
    pub close_combat: CloseCombatConfig,

    /// Impact counter settings
    pub impact: ImpactConfig,

    /// General settings
    pub general: GeneralConfig,
}

impl Config for GuardConfig {}

impl GuardConfig {
    /// Return a copy with every out-of-range value repaired
    pub fn sanitized(mut self) -> Self {
        self.blade.sanitize();
        self.shield.sanitize();

        let auto_default = AutoEquipConfig::default();
        ensure_positive(&mut self.auto_equip.delay, auto_default.delay, "auto_equip.delay");

        let combat_default = CloseCombatConfig::default();
        ensure_positive(
            &mut self.close_combat.enter_distance,
            combat_default.enter_distance,
            "close_combat.enter_distance",
        );
        if !(self.close_combat.exit_distance > self.close_combat.enter_distance) {
            let repaired =
                self.close_combat.enter_distance + (combat_default.exit_distance - combat_default.enter_distance);
            log::warn!(
                "close_combat.exit_distance {} must exceed enter_distance {}, using {}",
                self.close_combat.exit_distance,
                self.close_combat.enter_distance,
                repaired
            );
            self.close_combat.exit_distance = repaired;
        }

        let impact_default = ImpactConfig::default();
        if self.impact.threshold == 0 {
            log::warn!("impact.threshold must be at least 1, using {}", impact_default.threshold);
            self.impact.threshold = impact_default.threshold;
        }
        ensure_positive(&mut self.impact.window, impact_default.window, "impact.window");
        ensure_positive(&mut self.impact.lockout, impact_default.lockout, "impact.lockout");
        ensure_positive(
            &mut self.impact.min_separating_velocity,
            impact_default.min_separating_velocity,
            "impact.min_separating_velocity",
        );

        let general_default = GeneralConfig::default();
        ensure_positive(
            &mut self.general.divert_confirm_window,
            general_default.divert_confirm_window,
            "general.divert_confirm_window",
        );
        ensure_positive(&mut self.general.reach_scale, general_default.reach_scale, "general.reach_scale");
        if self.general.log_level.trim().is_empty() {
            self.general.log_level = general_default.log_level;
        }

        self
    }
}

fn ensure_positive(value: &mut f32, fallback: f32, name: &str) {
    if !value.is_finite() || *value <= 0.0 {
        log::warn!("{} = {} is not a positive number, using {}", name, value, fallback);
        *value = fallback;
    }
}

fn sanitize_thresholds(t: &mut CollisionThresholds, defaults: &CollisionThresholds, section: &str) {
    ensure_positive(&mut t.contact, defaults.contact, &format!("{section}.contact_threshold"));
    ensure_positive(&mut t.imminent, defaults.imminent, &format!("{section}.imminent_threshold"));
    ensure_positive(
        &mut t.imminent_backup,
        defaults.imminent_backup,
        &format!("{section}.imminent_backup_threshold"),
    );
    ensure_positive(&mut t.reequip, defaults.reequip, &format!("{section}.reequip_threshold"));
    ensure_positive(
        &mut t.separation_timeout,
        defaults.separation_timeout,
        &format!("{section}.separation_timeout"),
    );
    ensure_positive(
        &mut t.time_to_collision_threshold,
        defaults.time_to_collision_threshold,
        &format!("{section}.time_to_collision_threshold"),
    );
    ensure_positive(&mut t.cooldown, defaults.cooldown, &format!("{section}.cooldown"));
    ensure_positive(&mut t.reequip_delay, defaults.reequip_delay, &format!("{section}.reequip_delay"));
    ensure_positive(
        &mut t.min_closing_velocity,
        defaults.min_closing_velocity,
        &format!("{section}.min_closing_velocity"),
    );

    if t.imminent < t.contact {
        log::warn!("{section}.imminent_threshold {} below contact {}, raising", t.imminent, t.contact);
        t.imminent = t.contact;
    }
    if t.imminent_backup < t.imminent {
        log::warn!(
            "{section}.imminent_backup_threshold {} below imminent {}, raising",
            t.imminent_backup,
            t.imminent
        );
        t.imminent_backup = t.imminent;
    }
    if t.reequip < t.imminent {
        log::warn!("{section}.reequip_threshold {} below imminent {}, raising", t.reequip, t.imminent);
        t.reequip = t.imminent;
    }
}
