//! Arbitration module
//!
//! Decides what to do about the classified geometry: when to divert an
//! implement, when to restore it, when a freely held blade gets equipped,
//! how long a hand stays on cooldown, whether close-combat mode is on and
//! when shield impacts fire an effect.

pub mod auto_equip;
pub mod combat;
pub mod cooldown;
pub mod impact_counter;
pub mod state_machine;

pub use auto_equip::{AutoEquipAction, AutoEquipInputs, AutoEquipTimer};
pub use combat::{CloseCombatTransition, CombatProximityMonitor, CombatProximityState};
pub use cooldown::HandCooldowns;
pub use impact_counter::{ImpactCounter, ImpactOutcome};
pub use state_machine::{ArbitrationInputs, HandArbitrationStateMachine, InteractionKind, Phase};
