//! Segment-segment closest points
//!
//! Clamped closest-point solve between two segments: the unconstrained
//! parameter on the first segment is clamped, the second is derived from
//! it, and if that one leaves `[0, 1]` it is clamped and the first is
//! recomputed. Parallel and degenerate segments take the projection path.

use super::primitives::{Segment, SegmentClosest, DEGENERATE_EPSILON};
use crate::foundation::math::utils::clamp01;

/// Relative denominator below which two segments are treated as parallel
const PARALLEL_EPSILON: f32 = 1e-6;

/// Closest points between two segments
///
/// Degenerate segments (squared length at or below
/// [`DEGENERATE_EPSILON`]) are treated as points.
pub fn closest_points_segment_segment(first: &Segment, second: &Segment) -> SegmentClosest {
    let d1 = first.direction();
    let d2 = second.direction();
    let r = first.start - second.start;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= DEGENERATE_EPSILON && e <= DEGENERATE_EPSILON {
        (0.0, 0.0)
    } else if a <= DEGENERATE_EPSILON {
        (0.0, clamp01(f / e))
    } else {
        let c = d1.dot(&r);
        if e <= DEGENERATE_EPSILON {
            (clamp01(-c / a), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;

            let mut s = if denom > PARALLEL_EPSILON * a * e {
                clamp01((b * f - c * e) / denom)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;

            if t < 0.0 {
                t = 0.0;
                s = clamp01(-c / a);
            } else if t > 1.0 {
                t = 1.0;
                s = clamp01((b - c) / a);
            }
            (s, t)
        }
    };

    let point_a = first.point_at(s);
    let point_b = second.point_at(t);
    SegmentClosest {
        distance: (point_a - point_b).norm(),
        point_a,
        point_b,
        param_a: s,
        param_b: t,
    }
}
