//! Collision detection module
//!
//! Closest-distance queries between blades (segments) and shields (discs)
//! plus the time-to-collision estimate built on them.

pub mod disc;
pub mod primitives;
pub mod segment;

pub use disc::closest_points_segment_disc;
pub use primitives::{Disc, DiscClosest, Segment, SegmentClosest};
pub use segment::closest_points_segment_segment;

/// Estimates beyond this many seconds are discarded
pub const MAX_TIME_TO_COLLISION: f32 = 2.0;

/// Time until the gap closes to `contact_threshold` at the current closing velocity
///
/// Returns `None` when the pair is not approaching, is already within
/// contact distance, or would take longer than [`MAX_TIME_TO_COLLISION`].
pub fn time_to_collision(distance: f32, closing_velocity: f32, contact_threshold: f32) -> Option<f32> {
    if closing_velocity <= 0.0 || distance <= contact_threshold {
        return None;
    }
    let seconds = (distance - contact_threshold) / closing_velocity;
    (seconds <= MAX_TIME_TO_COLLISION).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_to_collision() {
        assert_relative_eq!(time_to_collision(25.0, 200.0, 5.0).unwrap(), 0.1);
        assert_eq!(time_to_collision(25.0, 0.0, 5.0), None);
        assert_eq!(time_to_collision(25.0, -10.0, 5.0), None);
        assert_eq!(time_to_collision(4.0, 100.0, 5.0), None);
        assert_eq!(time_to_collision(105.0, 10.0, 5.0), None);
    }
}
