//! Per-hand geometric snapshots
//!
//! A [`GeometryFrame`] holds the latest blade or shield sample for one hand
//! together with the previous sample, from which point velocities are
//! derived by finite difference.

use super::collision::{Disc, Segment};
use crate::foundation::handles::{ImplementHandle, ImplementKind};
use crate::foundation::math::{utils, Vec3};

/// Length at or below which a blade sample is not considered valid
pub const MIN_BLADE_LENGTH: f32 = 1e-4;

/// Where the tracked implement of a hand comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedSource {
    /// Equipped implement, posed by the hand offset node
    Equipped(ImplementHandle),
    /// Stand-in spawned by a divert
    StandIn(ImplementHandle),
    /// Loose object held in the hand
    Held(ImplementHandle),
}

impl TrackedSource {
    /// Handle of the tracked object
    pub const fn handle(self) -> ImplementHandle {
        match self {
            Self::Equipped(handle) | Self::StandIn(handle) | Self::Held(handle) => handle,
        }
    }

    /// Whether the source is an equipped implement
    pub const fn is_equipped(self) -> bool {
        matches!(self, Self::Equipped(_))
    }
}

/// Blade sample: a segment with per-end velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BladeGeometry {
    /// Hilt end of the blade
    pub base: Vec3,

    /// Point of the blade
    pub tip: Vec3,

    /// Velocity of the base in units per second
    pub base_velocity: Vec3,

    /// Velocity of the tip in units per second
    pub tip_velocity: Vec3,

    /// Distance from base to tip
    pub length: f32,

    /// Whether this sample can be used
    pub valid: bool,
}

impl Default for BladeGeometry {
    fn default() -> Self {
        Self {
            base: Vec3::zeros(),
            tip: Vec3::zeros(),
            base_velocity: Vec3::zeros(),
            tip_velocity: Vec3::zeros(),
            length: 0.0,
            valid: false,
        }
    }
}

impl BladeGeometry {
    /// Blade as a segment from base to tip
    pub const fn segment(&self) -> Segment {
        Segment::new(self.base, self.tip)
    }

    /// Velocity at parameter `t` along the blade
    pub fn velocity_at(&self, t: f32) -> Vec3 {
        utils::lerp(self.base_velocity, self.tip_velocity, t)
    }

    /// Unit direction from base to tip, zero for a degenerate blade
    pub fn direction(&self) -> Vec3 {
        utils::normalize_or_zero(self.tip - self.base, MIN_BLADE_LENGTH)
    }

    /// Mark the sample unusable
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Shield sample: a disc with the velocity of its centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldGeometry {
    /// Centre of the shield face
    pub center: Vec3,

    /// Outward facing unit normal
    pub normal: Vec3,

    /// Velocity of the centre in units per second
    pub velocity: Vec3,

    /// Radius of the disc
    pub radius: f32,

    /// Whether this sample can be used
    pub valid: bool,
}

impl Default for ShieldGeometry {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            normal: Vec3::z(),
            velocity: Vec3::zeros(),
            radius: 0.0,
            valid: false,
        }
    }
}

impl ShieldGeometry {
    /// Shield face as a disc
    pub fn disc(&self) -> Disc {
        Disc::new(self.center, self.normal, self.radius)
    }

    /// Mark the sample unusable
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PreviousSample {
    base: Vec3,
    tip: Vec3,
}

/// Latest geometry for one hand plus the sample before it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryFrame {
    /// Object the geometry was sampled from
    pub source: Option<TrackedSource>,

    /// Kind of the tracked object
    pub kind: Option<ImplementKind>,

    blade: BladeGeometry,

    shield: ShieldGeometry,

    previous: Option<PreviousSample>,
}

impl GeometryFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, including the source
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Invalidate the current sample and forget the previous one
    ///
    /// The next sample will report zero velocity instead of a jump.
    pub fn invalidate(&mut self) {
        self.blade.clear();
        self.shield.clear();
        self.previous = None;
    }

    /// Record a blade sample
    pub fn record_blade(&mut self, base: Vec3, tip: Vec3, delta_time: f32) {
        let (base_velocity, tip_velocity) = match self.previous {
            Some(previous) if delta_time > 0.0 => ((base - previous.base) / delta_time, (tip - previous.tip) / delta_time),
            _ => (Vec3::zeros(), Vec3::zeros()),
        };
        let length = (tip - base).norm();
        self.kind = Some(ImplementKind::Blade);
        self.shield.clear();
        self.blade = BladeGeometry {
            base,
            tip,
            base_velocity,
            tip_velocity,
            length,
            valid: length > MIN_BLADE_LENGTH,
        };
        self.previous = Some(PreviousSample { base, tip });
    }

    /// Record a shield sample
    pub fn record_shield(&mut self, center: Vec3, normal: Vec3, radius: f32, delta_time: f32) {
        let velocity = match self.previous {
            Some(previous) if delta_time > 0.0 => (center - previous.base) / delta_time,
            _ => Vec3::zeros(),
        };
        let normal = utils::normalize_or_zero(normal, f32::EPSILON);
        self.kind = Some(ImplementKind::Shield);
        self.blade.clear();
        self.shield = ShieldGeometry {
            center,
            normal,
            velocity,
            radius,
            valid: normal != Vec3::zeros() && radius > 0.0,
        };
        self.previous = Some(PreviousSample {
            base: center,
            tip: center,
        });
    }

    /// Valid blade sample, if any
    pub fn blade(&self) -> Option<&BladeGeometry> {
        self.blade.valid.then_some(&self.blade)
    }

    /// Valid shield sample, if any
    pub fn shield(&self) -> Option<&ShieldGeometry> {
        self.shield.valid.then_some(&self.shield)
    }
}
