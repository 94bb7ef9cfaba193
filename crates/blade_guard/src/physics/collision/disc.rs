//! Segment-disc closest points
//!
//! The segment is sampled at evenly spaced parameters and the closest disc
//! point is found for each sample; the best sample wins. This is an
//! approximation whose error is bounded by the sample spacing.

use super::primitives::{Disc, DiscClosest, Segment};

/// Number of intervals the segment is split into, giving `SAMPLE_INTERVALS + 1` samples
pub const SAMPLE_INTERVALS: u16 = 10;

/// Closest points between a segment and a disc
///
/// A degenerate segment is treated as its start point.
pub fn closest_points_segment_disc(segment: &Segment, disc: &Disc) -> DiscClosest {
    if segment.is_degenerate() {
        return closest_for_param(segment, disc, 0.0);
    }

    (0..=SAMPLE_INTERVALS)
        .map(|i| closest_for_param(segment, disc, f32::from(i) / f32::from(SAMPLE_INTERVALS)))
        .fold(None, |best: Option<DiscClosest>, candidate| match best {
            Some(best) if best.distance <= candidate.distance => Some(best),
            _ => Some(candidate),
        })
        .unwrap_or_else(|| closest_for_param(segment, disc, 0.0))
}

fn closest_for_param(segment: &Segment, disc: &Disc, t: f32) -> DiscClosest {
    let segment_point = segment.point_at(t);
    let disc_point = disc.closest_point(segment_point);
    let radial_fraction = if disc.radius > 0.0 {
        (disc_point - disc.center).norm() / disc.radius
    } else {
        0.0
    };
    DiscClosest {
        distance: (segment_point - disc_point).norm(),
        segment_point,
        disc_point,
        segment_param: t,
        radial_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn shield() -> Disc {
        Disc::new(Vec3::zeros(), Vec3::z(), 15.0)
    }

    #[test]
    fn test_segment_above_face() {
        let blade = Segment::new(Vec3::new(-5.0, 0.0, 10.0), Vec3::new(5.0, 0.0, 20.0));
        let result = closest_points_segment_disc(&blade, &shield());
        assert_relative_eq!(result.distance, 10.0, epsilon = 1e-5);
        assert_relative_eq!(result.segment_param, 0.0);
        assert_relative_eq!(result.disc_point, Vec3::new(-5.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_segment_beyond_rim() {
        let blade = Segment::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0));
        let result = closest_points_segment_disc(&blade, &shield());
        assert_relative_eq!(result.distance, 5.0, epsilon = 1e-5);
        assert_relative_eq!(result.radial_fraction, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let point = Segment::new(Vec3::new(3.0, 4.0, 6.0), Vec3::new(3.0, 4.0, 6.0));
        let result = closest_points_segment_disc(&point, &shield());
        assert_relative_eq!(result.distance, 6.0, epsilon = 1e-5);
        assert_relative_eq!(result.radial_fraction, 5.0 / 15.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sampling_error_is_bounded_by_spacing() {
        // Exact answer is 5.0 at parameter 0.525, between two samples.
        let blade = Segment::new(Vec3::new(20.0, 0.0, -10.5), Vec3::new(20.0, 0.0, 9.5));
        let result = closest_points_segment_disc(&blade, &shield());
        let spacing = blade.length() / f32::from(SAMPLE_INTERVALS);
        assert!(result.distance >= 5.0 - 1e-5);
        assert!(result.distance <= 5.0 + spacing);
        assert_relative_eq!(result.distance, (25.0f32 + 0.25).sqrt(), epsilon = 1e-4);
    }
}
