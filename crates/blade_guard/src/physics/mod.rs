//! Physics module
//!
//! Geometry sampling, closest-distance queries and proximity
//! classification for hand-held blades and shields.

pub mod classifier;
pub mod collision;
pub mod geometry;
pub mod guard_pose;
pub mod tracker;

pub use classifier::{classify_blade_shield, classify_blades, ClassifierEdge, CollisionClassifier, CollisionResult, Verdict};
pub use geometry::{BladeGeometry, GeometryFrame, ShieldGeometry, TrackedSource};
pub use guard_pose::{GuardPoseDetector, GuardPoseEdge};
pub use tracker::GeometryTracker;
