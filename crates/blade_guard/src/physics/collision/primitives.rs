//! Primitive shapes for blade and shield proximity
//!
//! Blades are line segments from base to tip, shields are flat discs. The
//! result types carry the closest pair of points so callers can derive
//! velocities and separation directions at the point of interest.

use crate::foundation::math::Vec3;

/// Squared length at or below which a segment is treated as a point
pub const DEGENERATE_EPSILON: f32 = 1e-4;

/// A finite line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point, the base of a blade
    pub start: Vec3,
    /// End point, the tip of a blade
    pub end: Vec3,
}

impl Segment {
    /// Creates a segment between two points
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Direction vector from start to end, not normalized
    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    /// Length of the segment
    pub fn length(&self) -> f32 {
        self.direction().norm()
    }

    /// Whether the segment collapses to a point
    pub fn is_degenerate(&self) -> bool {
        self.direction().norm_squared() <= DEGENERATE_EPSILON
    }

    /// Point at parameter `t` in `[0, 1]`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start + self.direction() * t
    }

    /// Closest point on the segment to `point`, returned as `(parameter, point)`
    pub fn closest_point(&self, point: Vec3) -> (f32, Vec3) {
        let d = self.direction();
        let length_squared = d.norm_squared();
        if length_squared <= DEGENERATE_EPSILON {
            return (0.0, self.start);
        }
        let t = ((point - self.start).dot(&d) / length_squared).clamp(0.0, 1.0);
        (t, self.point_at(t))
    }
}

/// A flat disc, the shape of a shield face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    /// Centre of the disc
    pub center: Vec3,
    /// Unit normal of the face
    pub normal: Vec3,
    /// Radius of the disc
    pub radius: f32,
}

impl Disc {
    /// Creates a disc; the normal is normalized
    pub fn new(center: Vec3, normal: Vec3, radius: f32) -> Self {
        Self {
            center,
            normal: normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z),
            radius,
        }
    }

    /// Closest point on the disc to `point`
    ///
    /// The point is projected onto the disc plane and the in-plane offset is
    /// clamped to the radius.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        let in_plane = offset - self.normal * offset.dot(&self.normal);
        let radial = in_plane.norm();
        if radial > self.radius {
            self.center + in_plane * (self.radius / radial)
        } else {
            self.center + in_plane
        }
    }

    /// Signed distance of `point` from the disc plane, positive on the face side
    pub fn signed_plane_distance(&self, point: Vec3) -> f32 {
        (point - self.center).dot(&self.normal)
    }
}

/// Closest points between two segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClosest {
    /// Distance between the closest points
    pub distance: f32,
    /// Closest point on the first segment
    pub point_a: Vec3,
    /// Closest point on the second segment
    pub point_b: Vec3,
    /// Parameter of `point_a` along the first segment
    pub param_a: f32,
    /// Parameter of `point_b` along the second segment
    pub param_b: f32,
}

/// Closest points between a segment and a disc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscClosest {
    /// Distance between the closest points
    pub distance: f32,
    /// Closest point on the segment
    pub segment_point: Vec3,
    /// Closest point on the disc
    pub disc_point: Vec3,
    /// Parameter of `segment_point` along the segment
    pub segment_param: f32,
    /// Distance of `disc_point` from the centre as a fraction of the radius
    pub radial_fraction: f32,
}
