//! Host collaborator interfaces
//!
//! The guard never touches the host world directly. Poses, equipment,
//! combat state and blocking are reached through the traits below; every
//! command returns a [`HostError`] the caller handles locally.

pub mod scripted;

pub use scripted::{HostCommand, ScriptedHost};

use crate::foundation::hand::Hand;
use crate::foundation::handles::{ImplementHandle, ImplementKind};
use crate::foundation::math::Transform;

/// Errors reported by host collaborators
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The handle no longer refers to a live object
    #[error("stale handle {0:?}")]
    StaleHandle(ImplementHandle),

    /// The hand has nothing equipped
    #[error("nothing equipped in {0} hand")]
    NothingEquipped(Hand),

    /// The collaborator cannot service requests right now
    #[error("host unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused the request
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Read access to world poses and implement properties
pub trait PoseProvider {
    /// World pose of the offset node an implement in `hand` is attached to
    fn hand_node_transform(&self, hand: Hand) -> Option<Transform>;

    /// World pose of a loose or held object
    fn world_transform(&self, handle: ImplementHandle) -> Option<Transform>;

    /// Reach of an implement, multiplied by the configured scale for blade length
    fn implement_reach(&self, handle: ImplementHandle) -> Option<f32>;

    /// Kind of an implement or world object
    fn implement_kind(&self, handle: ImplementHandle) -> Option<ImplementKind>;

    /// Player heading around the vertical axis in radians, zero facing +Y
    fn player_heading(&self) -> Option<f32>;
}

/// Equipment queries and commands
pub trait EquipCollaborator {
    /// Implement currently equipped in `hand`
    fn equipped(&self, hand: Hand) -> Option<ImplementHandle>;

    /// Loose world object currently held in `hand`
    fn held_object(&self, hand: Hand) -> Option<ImplementHandle>;

    /// Unequip whatever `hand` holds
    fn unequip(&mut self, hand: Hand, silent: bool) -> Result<(), HostError>;

    /// Replace the implement last unequipped from `hand` with a stand-in the hand grips
    fn divert(&mut self, hand: Hand) -> Result<ImplementHandle, HostError>;

    /// Whether a stand-in is still gripped by a hand
    ///
    /// Returns [`HostError::StaleHandle`] once the stand-in no longer exists.
    fn is_stand_in_held(&self, stand_in: ImplementHandle) -> Result<bool, HostError>;

    /// Return an object to inventory, despawning it if it is a stand-in
    fn restore_to_inventory(&mut self, handle: ImplementHandle) -> Result<(), HostError>;

    /// Equip an implement from inventory into `hand`
    fn equip(&mut self, hand: Hand, implement: ImplementHandle, silent: bool) -> Result<(), HostError>;

    /// Re-attach a dropped object to `hand`
    fn regrab(&mut self, hand: Hand, handle: ImplementHandle) -> Result<(), HostError>;
}

/// Combat state queries
pub trait CombatProvider {
    /// Whether the player is in combat
    fn is_in_combat(&self) -> bool;

    /// Distance to the nearest hostile, if one is known
    fn nearest_hostile_distance(&self) -> Option<f32>;
}

/// Blocking stance control
pub trait BlockController {
    /// Whether the player is currently blocking
    fn is_blocking(&self) -> bool;

    /// Enter the blocking stance
    fn start_blocking(&mut self) -> Result<(), HostError>;

    /// Leave the blocking stance
    fn stop_blocking(&mut self) -> Result<(), HostError>;
}

/// Everything the guard needs from its host
pub trait GuardHost: PoseProvider + EquipCollaborator + CombatProvider + BlockController {}

impl<T> GuardHost for T where T: PoseProvider + EquipCollaborator + CombatProvider + BlockController {}
