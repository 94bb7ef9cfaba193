//! # Blade Guard
//!
//! Predictive collision avoidance for hand-held blades and shields.
//!
//! Two tracked implements that are about to clash are pulled apart before
//! contact: the implement in one hand is swapped for a freely simulated
//! stand-in, and once the pair has stayed apart long enough the original
//! implement is silently put back.
//!
//! ## Features
//!
//! - **Geometry Tracking**: Blade segments and shield discs sampled per hand
//! - **Closest-Distance Math**: Segment-segment and segment-disc queries with
//!   closing velocity and time to collision
//! - **Arbitration**: A per-interaction state machine with grace period,
//!   cooldown and backup threshold
//! - **Auto-Equip**: Freely held blades are equipped once they stay clear
//! - **Close Combat**: Diverts are suspended near hostiles, with hysteresis
//! - **Impact Counting**: Windowed shield impacts with a lockout
//!
//! ## Quick Start
//!
//! ```rust
//! use blade_guard::prelude::*;
//!
//! let mut host = ScriptedHost::new();
//! let sword = host.add_implement("iron sword", ImplementKind::Blade, 1.0);
//! host.equip_now(Hand::Right, sword);
//!
//! let mut guard = GuardContext::new(GuardConfig::default());
//! guard.tick(&mut host, 1.0 / 90.0);
//!
//! for event in guard.drain_events() {
//!     println!("{:?}", event.kind);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod arbitration;
pub mod config;
pub mod core;
pub mod events;
pub mod foundation;
pub mod host;
pub mod physics;

mod context;

pub use context::{GuardContext, GuardSnapshot, InteractionSnapshot, INTERACTIONS};

/// Common imports for guard users
pub mod prelude {
    pub use crate::{
        arbitration::{InteractionKind, Phase},
        config::{Config, ConfigError, ConfigFormat},
        core::config::GuardConfig,
        events::{GuardEvent, GuardEventHandler, GuardEventKind, GuardEventType, ScheduledCommand},
        foundation::{
            hand::Hand,
            handles::{ImplementHandle, ImplementKind},
            math::{Transform, Vec3},
        },
        host::{GuardHost, HostCommand, HostError, ScriptedHost},
        physics::Verdict,
        GuardContext, GuardSnapshot,
    };
}

#[cfg(test)]
mod tests;
