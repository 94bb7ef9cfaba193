//! Math utilities and types
//!
//! Provides the vector, rotation and pose types shared by the geometry
//! tracker and the closest-distance routines.

pub use nalgebra::{Matrix3, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// World-space pose of a skeleton node or a loose world object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,

    /// Orientation in world space
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity pose at the origin
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }

    /// Create a pose at a position with no rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
        }
    }

    /// Create a pose from position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a pose whose local forward (+Y) axis points along `direction`
    ///
    /// Falls back to identity rotation when `direction` is degenerate.
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let rotation = Quat::rotation_between(&Vec3::y(), &direction).unwrap_or_else(|| {
            if direction.dot(&Vec3::y()) < 0.0 {
                Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI)
            } else {
                Quat::identity()
            }
        });
        Self { position, rotation }
    }

    /// Local forward axis (+Y) in world space
    ///
    /// This is the axis a held blade extends along.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Local up axis (+Z) in world space
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::z()
    }

    /// Transform a point from local to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Math constants
pub mod constants {
    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;
}

/// Utility functions for common math operations
pub mod utils {
    use super::Vec3;

    /// Linear interpolation between two vectors
    pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Clamp a scalar to `[0, 1]`
    pub fn clamp01(value: f32) -> f32 {
        value.clamp(0.0, 1.0)
    }

    /// Normalize `v`, returning zero when its length is at or below `epsilon`
    pub fn normalize_or_zero(v: Vec3, epsilon: f32) -> Vec3 {
        let length = v.norm();
        if length > epsilon {
            v / length
        } else {
            Vec3::zeros()
        }
    }

    /// Angle between two vectors in degrees, or `None` if either is degenerate
    pub fn angle_between_degrees(a: Vec3, b: Vec3) -> Option<f32> {
        let denom = a.norm() * b.norm();
        if denom <= f32::EPSILON {
            return None;
        }
        let cos = (a.dot(&b) / denom).clamp(-1.0, 1.0);
        Some(cos.acos() * super::constants::RAD_TO_DEG)
    }
}
