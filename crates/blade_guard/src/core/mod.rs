//! Core guard settings

pub mod config;

pub use config::{
    AutoEquipConfig, BladeConfig, CloseCombatConfig, CollisionThresholds, GeneralConfig, GuardConfig, ImpactConfig,
    ShieldConfig,
};
