//! Crossed-blade guard pose
//!
//! Two blades in contact, crossed at a clear angle, both raised and neither
//! pointing behind the player form a guard. The detector reports when the
//! pose starts and ends so the host can toggle its blocking stance.

use super::geometry::BladeGeometry;
use crate::foundation::math::{utils, Vec3};

/// Smallest crossing angle in degrees
pub const MIN_CROSS_ANGLE: f32 = 30.0;

/// Largest crossing angle in degrees
pub const MAX_CROSS_ANGLE: f32 = 150.0;

/// Minimum vertical component of each blade direction
pub const MIN_RAISE: f32 = 0.3;

/// Minimum alignment of each blade's horizontal direction with the player's facing
pub const MIN_FORWARD_ALIGNMENT: f32 = -0.5;

/// Change in guard pose state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPoseEdge {
    /// The pose was formed this tick
    Started,
    /// The pose was broken this tick
    Ended,
}

/// Whether two blades form a guard
///
/// `heading` is the player heading in radians; when unknown the facing
/// check is skipped.
pub fn is_guard_pose(left: &BladeGeometry, right: &BladeGeometry, heading: Option<f32>) -> bool {
    let a = left.direction();
    let b = right.direction();

    let Some(angle) = utils::angle_between_degrees(a, b) else {
        return false;
    };
    if angle <= MIN_CROSS_ANGLE || angle >= MAX_CROSS_ANGLE {
        return false;
    }
    if a.z <= MIN_RAISE || b.z <= MIN_RAISE {
        return false;
    }

    heading.map_or(true, |heading| {
        let forward = Vec3::new(heading.sin(), heading.cos(), 0.0);
        [a, b].iter().all(|direction| {
            let horizontal = utils::normalize_or_zero(Vec3::new(direction.x, direction.y, 0.0), 1e-4);
            horizontal.dot(&forward) > MIN_FORWARD_ALIGNMENT
        })
    })
}

/// Tracks whether the guard pose is held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardPoseDetector {
    active: bool,
}

impl GuardPoseDetector {
    /// Create an inactive detector
    pub const fn new() -> Self {
        Self { active: false }
    }

    /// Evaluate one tick
    ///
    /// The pose can only start while the blades are in contact and ends as
    /// soon as contact is lost or the geometry stops qualifying.
    pub fn update(
        &mut self,
        in_contact: bool,
        left: Option<&BladeGeometry>,
        right: Option<&BladeGeometry>,
        heading: Option<f32>,
    ) -> Option<GuardPoseEdge> {
        let posed = in_contact
            && match (left, right) {
                (Some(left), Some(right)) => is_guard_pose(left, right, heading),
                _ => false,
            };

        match (self.active, posed) {
            (false, true) => {
                self.active = true;
                Some(GuardPoseEdge::Started)
            }
            (true, false) => {
                self.active = false;
                Some(GuardPoseEdge::Ended)
            }
            _ => None,
        }
    }

    /// Whether the pose is currently held
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Drop the pose without reporting an edge
    pub fn reset(&mut self) {
        self.active = false;
    }
}
