//! Collision classification
//!
//! Turns a pair of geometry samples into a [`CollisionResult`]: closest
//! points, closing velocity, time to collision and a [`Verdict`]. The
//! [`CollisionClassifier`] remembers the previous verdict so callers can act
//! on edges (a pair becoming imminent, contact starting or ending) rather
//! than on levels.

use serde::{Deserialize, Serialize};

use super::collision::{
    closest_points_segment_disc, closest_points_segment_segment, time_to_collision,
};
use super::geometry::{BladeGeometry, ShieldGeometry};
use crate::core::config::CollisionThresholds;
use crate::foundation::math::{utils, Vec3};

/// Separation below which no direction can be derived
const DIRECTION_EPSILON: f32 = 1e-4;

/// Proximity verdict for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Nothing to act on
    Clear,
    /// Approaching fast and close enough to divert
    Imminent,
    /// Within contact distance
    Contacting,
}

/// Classification of one blade-blade or blade-shield pair for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Distance between the closest points
    pub closest_distance: f32,

    /// Closest point on the first primitive (the blade for blade-shield)
    pub point_a: Vec3,

    /// Closest point on the second primitive
    pub point_b: Vec3,

    /// Parameter of `point_a` along its blade
    pub param_a: f32,

    /// Parameter of `point_b` along its blade, or radial fraction on a shield
    pub param_b: f32,

    /// Rate at which the gap is closing; positive means approaching
    pub closing_velocity: f32,

    /// Magnitude of the relative velocity at the closest points
    pub relative_speed: f32,

    /// Seconds until contact distance is reached, if approaching
    pub time_to_collision: Option<f32>,

    /// Whether the blade is on the face side of the shield; always true for blade pairs
    pub in_front: bool,

    /// Approach inside the backup band with time-to-collision below the threshold
    pub fast_approach: bool,

    /// Resulting verdict
    pub verdict: Verdict,
}

impl CollisionResult {
    /// Midpoint of the closest points
    pub fn collision_point(&self) -> Vec3 {
        (self.point_a + self.point_b) * 0.5
    }

    /// Whether the pair is in contact
    pub fn is_contacting(&self) -> bool {
        self.verdict == Verdict::Contacting
    }

    /// Whether the pair is imminent
    pub fn is_imminent(&self) -> bool {
        self.verdict == Verdict::Imminent
    }
}

/// Classify two blades
///
/// The result is symmetric: swapping the blades swaps the points and
/// parameters but leaves distance, closing velocity and verdict unchanged.
pub fn classify_blades(a: &BladeGeometry, b: &BladeGeometry, thresholds: &CollisionThresholds) -> CollisionResult {
    let closest = closest_points_segment_segment(&a.segment(), &b.segment());
    let relative_velocity = a.velocity_at(closest.param_a) - b.velocity_at(closest.param_b);
    let separation = utils::normalize_or_zero(closest.point_b - closest.point_a, DIRECTION_EPSILON);

    finish(
        CollisionResult {
            closest_distance: closest.distance,
            point_a: closest.point_a,
            point_b: closest.point_b,
            param_a: closest.param_a,
            param_b: closest.param_b,
            closing_velocity: relative_velocity.dot(&separation),
            relative_speed: relative_velocity.norm(),
            time_to_collision: None,
            in_front: true,
            fast_approach: false,
            verdict: Verdict::Clear,
        },
        thresholds,
    )
}

/// Classify a blade against a shield
///
/// The shield is treated as stationary; only the blade's motion counts
/// toward the closing velocity. Contact is purely positional, while an
/// imminent verdict also requires the blade to be on the face side.
pub fn classify_blade_shield(
    blade: &BladeGeometry,
    shield: &ShieldGeometry,
    thresholds: &CollisionThresholds,
) -> CollisionResult {
    let disc = shield.disc();
    let closest = closest_points_segment_disc(&blade.segment(), &disc);
    let blade_velocity = blade.velocity_at(closest.segment_param);
    let separation = utils::normalize_or_zero(closest.disc_point - closest.segment_point, DIRECTION_EPSILON);

    finish(
        CollisionResult {
            closest_distance: closest.distance,
            point_a: closest.segment_point,
            point_b: closest.disc_point,
            param_a: closest.segment_param,
            param_b: closest.radial_fraction,
            closing_velocity: blade_velocity.dot(&separation),
            relative_speed: blade_velocity.norm(),
            time_to_collision: None,
            in_front: disc.signed_plane_distance(closest.segment_point) > 0.0,
            fast_approach: false,
            verdict: Verdict::Clear,
        },
        thresholds,
    )
}

fn finish(mut result: CollisionResult, thresholds: &CollisionThresholds) -> CollisionResult {
    let distance = result.closest_distance;
    result.time_to_collision = time_to_collision(distance, result.closing_velocity, thresholds.contact);

    let approaching = result.closing_velocity >= thresholds.min_closing_velocity;
    let within_backup = distance <= thresholds.imminent_backup;

    result.fast_approach = approaching
        && within_backup
        && result
            .time_to_collision
            .is_some_and(|ttc| ttc > 0.0 && ttc < thresholds.time_to_collision_threshold);

    result.verdict = if distance <= thresholds.contact {
        Verdict::Contacting
    } else if approaching && within_backup && result.in_front {
        Verdict::Imminent
    } else {
        Verdict::Clear
    };
    result
}

/// Verdict transitions observed on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierEdge {
    /// Verdict this tick
    pub verdict: Verdict,

    /// Imminent this tick after a clear tick
    pub became_imminent: bool,

    /// Contacting this tick but not the previous one
    pub contact_started: bool,

    /// Contacting the previous tick but not this one
    pub contact_ended: bool,
}

/// Edge detector over successive verdicts for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionClassifier {
    previous: Verdict,
}

impl Default for CollisionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionClassifier {
    /// Create a detector that starts clear
    pub const fn new() -> Self {
        Self {
            previous: Verdict::Clear,
        }
    }

    /// Feed this tick's result; `None` (missing geometry) counts as clear
    pub fn observe(&mut self, result: Option<&CollisionResult>) -> ClassifierEdge {
        let verdict = result.map_or(Verdict::Clear, |r| r.verdict);
        let previous = std::mem::replace(&mut self.previous, verdict);
        ClassifierEdge {
            verdict,
            became_imminent: verdict == Verdict::Imminent && previous == Verdict::Clear,
            contact_started: verdict == Verdict::Contacting && previous != Verdict::Contacting,
            contact_ended: verdict != Verdict::Contacting && previous == Verdict::Contacting,
        }
    }

    /// Verdict seen on the last tick
    pub const fn previous(&self) -> Verdict {
        self.previous
    }

    /// Forget the last verdict
    pub fn reset(&mut self) {
        self.previous = Verdict::Clear;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GuardConfig;
    use approx::assert_relative_eq;

    fn blade(base: Vec3, tip: Vec3, velocity: Vec3) -> BladeGeometry {
        BladeGeometry {
            base,
            tip,
            base_velocity: velocity,
            tip_velocity: velocity,
            length: (tip - base).norm(),
            valid: true,
        }
    }

    fn blade_thresholds() -> CollisionThresholds {
        GuardConfig::default().blade.thresholds()
    }

    fn shield_thresholds() -> CollisionThresholds {
        GuardConfig::default().shield.thresholds()
    }

    fn shield_facing_up() -> ShieldGeometry {
        ShieldGeometry {
            center: Vec3::zeros(),
            normal: Vec3::z(),
            velocity: Vec3::zeros(),
            radius: 15.0,
            valid: true,
        }
    }

    #[test]
    fn test_approaching_blades_are_imminent() {
        let left = blade(Vec3::zeros(), Vec3::new(0.0, 0.0, 70.0), Vec3::new(100.0, 0.0, 0.0));
        let right = blade(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 70.0), Vec3::new(-100.0, 0.0, 0.0));
        let result = classify_blades(&left, &right, &blade_thresholds());
        assert_relative_eq!(result.closest_distance, 20.0, epsilon = 1e-4);
        assert_relative_eq!(result.closing_velocity, 200.0, epsilon = 1e-3);
        assert_relative_eq!(result.time_to_collision.unwrap(), 0.075, epsilon = 1e-4);
        assert!(result.fast_approach);
        assert_eq!(result.verdict, Verdict::Imminent);
    }

    #[test]
    fn test_classification_is_symmetric() {
        let left = blade(Vec3::zeros(), Vec3::new(10.0, 60.0, 5.0), Vec3::new(30.0, -5.0, 2.0));
        let right = blade(Vec3::new(22.0, 3.0, 1.0), Vec3::new(-4.0, 50.0, 30.0), Vec3::new(-45.0, 0.0, 8.0));
        let ab = classify_blades(&left, &right, &blade_thresholds());
        let ba = classify_blades(&right, &left, &blade_thresholds());
        assert_relative_eq!(ab.closest_distance, ba.closest_distance, epsilon = 1e-3);
        assert_relative_eq!(ab.closing_velocity, ba.closing_velocity, epsilon = 1e-2);
        assert_eq!(ab.verdict, ba.verdict);
    }

    #[test]
    fn test_slow_or_receding_blades_stay_clear() {
        let still = blade(Vec3::zeros(), Vec3::new(0.0, 0.0, 70.0), Vec3::zeros());
        let slow = blade(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 70.0), Vec3::new(-40.0, 0.0, 0.0));
        assert_eq!(classify_blades(&still, &slow, &blade_thresholds()).verdict, Verdict::Clear);

        let receding = blade(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 70.0), Vec3::new(300.0, 0.0, 0.0));
        let result = classify_blades(&still, &receding, &blade_thresholds());
        assert!(result.closing_velocity < 0.0);
        assert_eq!(result.time_to_collision, None);
        assert_eq!(result.verdict, Verdict::Clear);
    }

    #[test]
    fn test_contact_ignores_velocity() {
        let a = blade(Vec3::zeros(), Vec3::new(0.0, 0.0, 70.0), Vec3::zeros());
        let b = blade(Vec3::new(4.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 70.0), Vec3::new(500.0, 0.0, 0.0));
        assert_eq!(classify_blades(&a, &b, &blade_thresholds()).verdict, Verdict::Contacting);
    }

    #[test]
    fn test_backup_band_is_imminent() {
        let a = blade(Vec3::zeros(), Vec3::new(0.0, 0.0, 70.0), Vec3::new(100.0, 0.0, 0.0));
        let b = blade(Vec3::new(28.0, 0.0, 0.0), Vec3::new(28.0, 0.0, 70.0), Vec3::zeros());
        let result = classify_blades(&a, &b, &blade_thresholds());
        assert_eq!(result.verdict, Verdict::Imminent);

        let far = blade(Vec3::new(31.0, 0.0, 0.0), Vec3::new(31.0, 0.0, 70.0), Vec3::zeros());
        assert_eq!(classify_blades(&a, &far, &blade_thresholds()).verdict, Verdict::Clear);
    }

    #[test]
    fn test_blade_in_front_of_shield_is_imminent() {
        let sword = blade(Vec3::new(-30.0, 0.0, 20.0), Vec3::new(30.0, 0.0, 20.0), Vec3::new(0.0, 0.0, -50.0));
        let result = classify_blade_shield(&sword, &shield_facing_up(), &shield_thresholds());
        assert!(result.in_front);
        assert_relative_eq!(result.closest_distance, 20.0, epsilon = 1e-4);
        assert_relative_eq!(result.closing_velocity, 50.0, epsilon = 1e-3);
        assert_eq!(result.verdict, Verdict::Imminent);
    }

    #[test]
    fn test_blade_behind_shield_is_not_imminent() {
        let sword = blade(Vec3::new(-30.0, 0.0, -20.0), Vec3::new(30.0, 0.0, -20.0), Vec3::new(0.0, 0.0, 50.0));
        let result = classify_blade_shield(&sword, &shield_facing_up(), &shield_thresholds());
        assert!(!result.in_front);
        assert_eq!(result.verdict, Verdict::Clear);
    }

    #[test]
    fn test_blade_behind_shield_can_still_contact() {
        let sword = blade(Vec3::new(-30.0, 0.0, -3.0), Vec3::new(30.0, 0.0, -3.0), Vec3::zeros());
        let result = classify_blade_shield(&sword, &shield_facing_up(), &shield_thresholds());
        assert_eq!(result.verdict, Verdict::Contacting);
    }

    #[test]
    fn test_edges() {
        let mut classifier = CollisionClassifier::new();
        let clear = CollisionResult {
            closest_distance: 50.0,
            point_a: Vec3::zeros(),
            point_b: Vec3::zeros(),
            param_a: 0.0,
            param_b: 0.0,
            closing_velocity: 0.0,
            relative_speed: 0.0,
            time_to_collision: None,
            in_front: true,
            fast_approach: false,
            verdict: Verdict::Clear,
        };
        let imminent = CollisionResult { verdict: Verdict::Imminent, ..clear };
        let contacting = CollisionResult { verdict: Verdict::Contacting, ..clear };

        assert!(!classifier.observe(Some(&clear)).became_imminent);
        assert!(classifier.observe(Some(&imminent)).became_imminent);
        assert!(!classifier.observe(Some(&imminent)).became_imminent);
        assert!(classifier.observe(Some(&contacting)).contact_started);
        // Imminent straight after contact is not a fresh approach.
        let edge = classifier.observe(Some(&imminent));
        assert!(edge.contact_ended);
        assert!(!edge.became_imminent);
        assert_eq!(classifier.observe(None).verdict, Verdict::Clear);
        assert!(classifier.observe(Some(&imminent)).became_imminent);
    }
}
