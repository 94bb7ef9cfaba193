//! Per-hand geometry tracking
//!
//! Each tick the tracker samples the implement in each hand from the host
//! and rebuilds that hand's [`GeometryFrame`]. It also watches for equip
//! changes: any change clears both frames and restarts the grace counter.

use super::geometry::{BladeGeometry, GeometryFrame, ShieldGeometry, TrackedSource};
use crate::core::config::GuardConfig;
use crate::foundation::hand::Hand;
use crate::foundation::handles::{ImplementHandle, ImplementKind};
use crate::foundation::time;
use crate::host::{EquipCollaborator, PoseProvider};

/// Samples blade and shield geometry for both hands
pub struct GeometryTracker {
    frames: [GeometryFrame; 2],

    last_equipped: [Option<ImplementHandle>; 2],

    ticks_since_equip_change: u32,

    reach_scale: f32,

    shield_radius: f32,

    missing_logged: [bool; 2],
}

impl GeometryTracker {
    /// Create a tracker using the reach scale and shield radius from `config`
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            frames: [GeometryFrame::new(); 2],
            last_equipped: [None; 2],
            ticks_since_equip_change: 0,
            reach_scale: config.general.reach_scale,
            shield_radius: config.shield.radius,
            missing_logged: [false; 2],
        }
    }

    /// Pick up new reach scale and shield radius
    pub fn apply_config(&mut self, config: &GuardConfig) {
        self.reach_scale = config.general.reach_scale;
        self.shield_radius = config.shield.radius;
    }

    /// Resample both hands
    ///
    /// `stand_ins` names the stand-in currently substituting for each hand's
    /// implement, if any. Returns `true` when the equipped set changed this
    /// tick.
    pub fn update<H>(&mut self, host: &H, stand_ins: [Option<ImplementHandle>; 2], delta_time: f32) -> bool
    where
        H: PoseProvider + EquipCollaborator + ?Sized,
    {
        let delta_time = time::clamp_delta(delta_time);
        let equipped = [host.equipped(Hand::Left), host.equipped(Hand::Right)];

        let changed = equipped != self.last_equipped;
        if changed {
            log::info!(
                "Equipped implements changed (left: {:?} -> {:?}, right: {:?} -> {:?}), geometry reset",
                self.last_equipped[0],
                equipped[0],
                self.last_equipped[1],
                equipped[1]
            );
            self.last_equipped = equipped;
            self.ticks_since_equip_change = 0;
            for frame in &mut self.frames {
                frame.clear();
            }
        } else {
            self.ticks_since_equip_change = self.ticks_since_equip_change.saturating_add(1);
        }

        for hand in Hand::BOTH {
            let source = equipped[hand.index()]
                .map(TrackedSource::Equipped)
                .or_else(|| stand_ins[hand.index()].map(TrackedSource::StandIn))
                .or_else(|| host.held_object(hand).map(TrackedSource::Held));
            self.sample_hand(host, hand, source, delta_time);
        }

        changed
    }

    fn sample_hand<H>(&mut self, host: &H, hand: Hand, source: Option<TrackedSource>, delta_time: f32)
    where
        H: PoseProvider + EquipCollaborator + ?Sized,
    {
        let frame = &mut self.frames[hand.index()];
        if frame.source != source {
            frame.clear();
            frame.source = source;
        }
        let Some(source) = source else {
            return;
        };

        let handle = source.handle();
        let transform = match source {
            TrackedSource::Equipped(_) => host.hand_node_transform(hand),
            TrackedSource::StandIn(_) | TrackedSource::Held(_) => host.world_transform(handle),
        };
        let kind = host.implement_kind(handle);

        let sampled = match (transform, kind) {
            (Some(transform), Some(ImplementKind::Blade)) => match host.implement_reach(handle) {
                Some(reach) => {
                    let base = transform.position;
                    let tip = base + transform.forward().normalize() * (reach * self.reach_scale);
                    frame.record_blade(base, tip, delta_time);
                    true
                }
                None => false,
            },
            (Some(transform), Some(ImplementKind::Shield)) => {
                frame.record_shield(transform.position, -transform.up(), self.shield_radius, delta_time);
                true
            }
            _ => false,
        };

        if sampled {
            self.missing_logged[hand.index()] = false;
        } else {
            frame.invalidate();
            if !self.missing_logged[hand.index()] {
                log::warn!("No usable pose for {} hand implement {:?}, skipping", hand, handle);
                self.missing_logged[hand.index()] = true;
            }
        }
        log::trace!("{} hand geometry: {:?}", hand, frame);
    }

    /// Frame for a hand
    pub fn frame(&self, hand: Hand) -> &GeometryFrame {
        &self.frames[hand.index()]
    }

    /// Valid blade sample for a hand
    pub fn blade(&self, hand: Hand) -> Option<&BladeGeometry> {
        self.frames[hand.index()].blade()
    }

    /// Valid shield sample for a hand
    pub fn shield(&self, hand: Hand) -> Option<&ShieldGeometry> {
        self.frames[hand.index()].shield()
    }

    /// Ticks since the equipped set last changed
    pub const fn ticks_since_equip_change(&self) -> u32 {
        self.ticks_since_equip_change
    }

    /// Whether the grace period after an equip change is still running
    pub const fn in_grace_period(&self, grace_ticks: u32) -> bool {
        self.ticks_since_equip_change < grace_ticks
    }

    /// Forget all geometry and equip history
    pub fn clear(&mut self) {
        self.frames = [GeometryFrame::new(); 2];
        self.last_equipped = [None; 2];
        self.ticks_since_equip_change = 0;
        self.missing_logged = [false; 2];
    }
}
