//! In-memory host used by the demo application and the test suite
//!
//! [`ScriptedHost`] keeps a small world of implements in an
//! [`ImplementArena`]: each one is either in inventory, equipped in a hand,
//! loose in the world or held by a hand. Hand poses are set directly by the
//! script; held objects follow the hand that grips them. Every command the
//! guard issues is appended to a log so scenarios can assert on it.

use super::{BlockController, CombatProvider, EquipCollaborator, HostError, PoseProvider};
use crate::foundation::hand::Hand;
use crate::foundation::handles::{ImplementArena, ImplementHandle, ImplementKind};
use crate::foundation::math::{Transform, Vec3};

/// Command received from the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// `unequip` was called
    Unequip {
        /// Hand that was emptied
        hand: Hand,
        /// Whether the sound was suppressed
        silent: bool,
    },
    /// `divert` spawned a stand-in
    Divert {
        /// Hand the stand-in was placed in
        hand: Hand,
        /// The stand-in object
        stand_in: ImplementHandle,
    },
    /// `restore_to_inventory` was called
    RestoreToInventory {
        /// Object that was restored
        handle: ImplementHandle,
    },
    /// `equip` changed what a hand holds
    Equip {
        /// Hand that was equipped
        hand: Hand,
        /// Implement that was equipped
        implement: ImplementHandle,
        /// Whether the sound was suppressed
        silent: bool,
    },
    /// `regrab` re-attached an object
    Regrab {
        /// Hand that grips the object again
        hand: Hand,
        /// The object
        handle: ImplementHandle,
    },
    /// Blocking stance entered
    StartBlocking,
    /// Blocking stance left
    StopBlocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Inventory,
    Equipped(Hand),
    World,
    Held(Hand),
}

#[derive(Debug, Clone)]
struct ImplementRecord {
    name: String,
    kind: ImplementKind,
    reach: f32,
    location: Location,
    world_pose: Transform,
    stand_in_for: Option<ImplementHandle>,
}

/// Scriptable in-memory host
pub struct ScriptedHost {
    implements: ImplementArena<ImplementRecord>,

    hand_nodes: [Option<Transform>; 2],

    equipped: [Option<ImplementHandle>; 2],

    held: [Option<ImplementHandle>; 2],

    last_unequipped: [Option<ImplementHandle>; 2],

    grip_fails: [bool; 2],

    in_combat: bool,

    hostile_distance: Option<f32>,

    heading: Option<f32>,

    blocking: bool,

    commands: Vec<HostCommand>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    /// Create an empty host with both hands at the origin
    pub fn new() -> Self {
        Self {
            implements: ImplementArena::new(),
            hand_nodes: [Some(Transform::identity()); 2],
            equipped: [None; 2],
            held: [None; 2],
            last_unequipped: [None; 2],
            grip_fails: [false; 2],
            in_combat: false,
            hostile_distance: None,
            heading: Some(0.0),
            blocking: false,
            commands: Vec::new(),
        }
    }

    /// Add an implement to inventory
    pub fn add_implement(&mut self, name: &str, kind: ImplementKind, reach: f32) -> ImplementHandle {
        self.implements.insert(ImplementRecord {
            name: name.to_string(),
            kind,
            reach,
            location: Location::Inventory,
            world_pose: Transform::identity(),
            stand_in_for: None,
        })
    }

    /// Place a loose object in the world
    pub fn spawn_loose(&mut self, name: &str, kind: ImplementKind, reach: f32, pose: Transform) -> ImplementHandle {
        self.implements.insert(ImplementRecord {
            name: name.to_string(),
            kind,
            reach,
            location: Location::World,
            world_pose: pose,
            stand_in_for: None,
        })
    }

    /// Equip an implement as part of scenario setup, without logging a command
    pub fn equip_now(&mut self, hand: Hand, implement: ImplementHandle) {
        if let Some(record) = self.implements.get_mut(implement) {
            record.location = Location::Equipped(hand);
            self.equipped[hand.index()] = Some(implement);
        }
    }

    /// Put a loose object into a hand, as a physics grab would
    pub fn grab(&mut self, hand: Hand, handle: ImplementHandle) {
        if let Some(record) = self.implements.get_mut(handle) {
            record.location = Location::Held(hand);
            self.held[hand.index()] = Some(handle);
        }
    }

    /// Let go of whatever `hand` holds, leaving it where the hand was
    pub fn release(&mut self, hand: Hand) -> Option<ImplementHandle> {
        let handle = self.held[hand.index()].take()?;
        let pose = self.hand_nodes[hand.index()].unwrap_or_default();
        if let Some(record) = self.implements.get_mut(handle) {
            record.location = Location::World;
            record.world_pose = pose;
        }
        Some(handle)
    }

    /// Destroy an object outright, invalidating its handle
    pub fn despawn(&mut self, handle: ImplementHandle) {
        for slot in self.held.iter_mut().chain(self.equipped.iter_mut()) {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
        self.implements.remove(handle);
    }

    /// Set a hand node pose, or `None` to make it unavailable
    pub fn set_hand_pose(&mut self, hand: Hand, pose: Option<Transform>) {
        self.hand_nodes[hand.index()] = pose;
    }

    /// Move a hand node, keeping its rotation
    pub fn set_hand_position(&mut self, hand: Hand, position: Vec3) {
        let pose = self.hand_nodes[hand.index()].get_or_insert_with(Transform::identity);
        pose.position = position;
    }

    /// Current hand node pose
    pub fn hand_pose(&self, hand: Hand) -> Option<Transform> {
        self.hand_nodes[hand.index()]
    }

    /// Make stand-ins spawned for `hand` fall out of the grip
    pub fn set_grip_failure(&mut self, hand: Hand, fails: bool) {
        self.grip_fails[hand.index()] = fails;
    }

    /// Set combat state and nearest hostile distance
    pub fn set_combat(&mut self, in_combat: bool, hostile_distance: Option<f32>) {
        self.in_combat = in_combat;
        self.hostile_distance = hostile_distance;
    }

    /// Set the player heading
    pub fn set_heading(&mut self, heading: Option<f32>) {
        self.heading = heading;
    }

    /// Whether an object is currently stored in inventory
    pub fn is_in_inventory(&self, handle: ImplementHandle) -> bool {
        self.implements
            .get(handle)
            .is_some_and(|record| record.location == Location::Inventory)
    }

    /// Whether an object still exists
    pub fn exists(&self, handle: ImplementHandle) -> bool {
        self.implements.contains(handle)
    }

    /// Display name of an object
    pub fn name_of(&self, handle: ImplementHandle) -> Option<&str> {
        self.implements.get(handle).map(|record| record.name.as_str())
    }

    /// Commands received so far
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Take and clear the command log
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl PoseProvider for ScriptedHost {
    fn hand_node_transform(&self, hand: Hand) -> Option<Transform> {
        self.hand_nodes[hand.index()]
    }

    fn world_transform(&self, handle: ImplementHandle) -> Option<Transform> {
        let record = self.implements.get(handle)?;
        match record.location {
            Location::Held(hand) | Location::Equipped(hand) => self.hand_nodes[hand.index()],
            Location::World => Some(record.world_pose),
            Location::Inventory => None,
        }
    }

    fn implement_reach(&self, handle: ImplementHandle) -> Option<f32> {
        self.implements.get(handle).map(|record| record.reach)
    }

    fn implement_kind(&self, handle: ImplementHandle) -> Option<ImplementKind> {
        self.implements.get(handle).map(|record| record.kind)
    }

    fn player_heading(&self) -> Option<f32> {
        self.heading
    }
}

impl EquipCollaborator for ScriptedHost {
    fn equipped(&self, hand: Hand) -> Option<ImplementHandle> {
        self.equipped[hand.index()].filter(|handle| self.implements.contains(*handle))
    }

    fn held_object(&self, hand: Hand) -> Option<ImplementHandle> {
        self.held[hand.index()].filter(|handle| self.implements.contains(*handle))
    }

    fn unequip(&mut self, hand: Hand, silent: bool) -> Result<(), HostError> {
        let handle = self.equipped[hand.index()].take().ok_or(HostError::NothingEquipped(hand))?;
        if let Some(record) = self.implements.get_mut(handle) {
            record.location = Location::Inventory;
        }
        self.last_unequipped[hand.index()] = Some(handle);
        self.commands.push(HostCommand::Unequip { hand, silent });
        Ok(())
    }

    fn divert(&mut self, hand: Hand) -> Result<ImplementHandle, HostError> {
        let original = self.last_unequipped[hand.index()]
            .take()
            .ok_or(HostError::NothingEquipped(hand))?;
        let source = self
            .implements
            .get(original)
            .ok_or(HostError::StaleHandle(original))?
            .clone();

        let gripped = !self.grip_fails[hand.index()];
        let stand_in = self.implements.insert(ImplementRecord {
            name: format!("{} (stand-in)", source.name),
            kind: source.kind,
            reach: source.reach,
            location: if gripped { Location::Held(hand) } else { Location::World },
            world_pose: self.hand_nodes[hand.index()].unwrap_or_default(),
            stand_in_for: Some(original),
        });
        if gripped {
            self.held[hand.index()] = Some(stand_in);
        }
        self.commands.push(HostCommand::Divert { hand, stand_in });
        Ok(stand_in)
    }

    fn is_stand_in_held(&self, stand_in: ImplementHandle) -> Result<bool, HostError> {
        let record = self.implements.get(stand_in).ok_or(HostError::StaleHandle(stand_in))?;
        Ok(matches!(record.location, Location::Held(_)))
    }

    fn restore_to_inventory(&mut self, handle: ImplementHandle) -> Result<(), HostError> {
        // Restoring something already gone is a no-op.
        let Some(record) = self.implements.get_mut(handle) else {
            return Ok(());
        };
        if let Location::Held(hand) = record.location {
            self.held[hand.index()] = None;
        }
        if record.stand_in_for.is_some() {
            self.implements.remove(handle);
        } else {
            record.location = Location::Inventory;
        }
        self.commands.push(HostCommand::RestoreToInventory { handle });
        Ok(())
    }

    fn equip(&mut self, hand: Hand, implement: ImplementHandle, silent: bool) -> Result<(), HostError> {
        if self.equipped[hand.index()] == Some(implement) {
            return Ok(());
        }
        let record = self.implements.get(implement).ok_or(HostError::StaleHandle(implement))?;
        if record.stand_in_for.is_some() {
            return Err(HostError::Rejected(format!("{} is a stand-in", record.name)));
        }

        match record.location {
            Location::Held(holder) => self.held[holder.index()] = None,
            Location::Equipped(other) => self.equipped[other.index()] = None,
            Location::Inventory | Location::World => {}
        }
        if let Some(previous) = self.equipped[hand.index()].take() {
            if let Some(previous) = self.implements.get_mut(previous) {
                previous.location = Location::Inventory;
            }
        }
        if let Some(record) = self.implements.get_mut(implement) {
            record.location = Location::Equipped(hand);
        }
        self.equipped[hand.index()] = Some(implement);
        self.commands.push(HostCommand::Equip { hand, implement, silent });
        Ok(())
    }

    fn regrab(&mut self, hand: Hand, handle: ImplementHandle) -> Result<(), HostError> {
        if !self.implements.contains(handle) {
            return Err(HostError::StaleHandle(handle));
        }
        if let Some(current) = self.held[hand.index()] {
            if current != handle {
                return Err(HostError::Rejected(format!("{hand} hand is already holding something")));
            }
        }
        if let Some(record) = self.implements.get_mut(handle) {
            record.location = Location::Held(hand);
        }
        self.held[hand.index()] = Some(handle);
        self.commands.push(HostCommand::Regrab { hand, handle });
        Ok(())
    }
}

impl CombatProvider for ScriptedHost {
    fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    fn nearest_hostile_distance(&self) -> Option<f32> {
        self.hostile_distance
    }
}

impl BlockController for ScriptedHost {
    fn is_blocking(&self) -> bool {
        self.blocking
    }

    fn start_blocking(&mut self) -> Result<(), HostError> {
        if !self.blocking {
            self.blocking = true;
            self.commands.push(HostCommand::StartBlocking);
        }
        Ok(())
    }

    fn stop_blocking(&mut self) -> Result<(), HostError> {
        if self.blocking {
            self.blocking = false;
            self.commands.push(HostCommand::StopBlocking);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divert_and_restore_cycle() {
        let mut host = ScriptedHost::new();
        let sword = host.add_implement("iron sword", ImplementKind::Blade, 1.0);
        host.equip_now(Hand::Left, sword);

        host.unequip(Hand::Left, true).unwrap();
        let stand_in = host.divert(Hand::Left).unwrap();
        assert_eq!(host.equipped(Hand::Left), None);
        assert_eq!(host.held_object(Hand::Left), Some(stand_in));
        assert_eq!(host.is_stand_in_held(stand_in), Ok(true));

        host.restore_to_inventory(stand_in).unwrap();
        assert!(!host.exists(stand_in));
        assert_eq!(host.is_stand_in_held(stand_in), Err(HostError::StaleHandle(stand_in)));
        assert_eq!(host.restore_to_inventory(stand_in), Ok(()));

        host.equip(Hand::Left, sword, true).unwrap();
        assert_eq!(host.equipped(Hand::Left), Some(sword));
    }

    #[test]
    fn test_divert_without_unequip_fails() {
        let mut host = ScriptedHost::new();
        assert_eq!(host.divert(Hand::Right), Err(HostError::NothingEquipped(Hand::Right)));
    }

    #[test]
    fn test_stand_in_cannot_be_equipped() {
        let mut host = ScriptedHost::new();
        let sword = host.add_implement("iron sword", ImplementKind::Blade, 1.0);
        host.equip_now(Hand::Right, sword);
        host.unequip(Hand::Right, true).unwrap();
        let stand_in = host.divert(Hand::Right).unwrap();
        assert!(matches!(host.equip(Hand::Right, stand_in, true), Err(HostError::Rejected(_))));
    }

    #[test]
    fn test_held_object_follows_hand() {
        let mut host = ScriptedHost::new();
        let dagger = host.spawn_loose("dagger", ImplementKind::Blade, 0.5, Transform::identity());
        host.grab(Hand::Right, dagger);
        host.set_hand_position(Hand::Right, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(host.world_transform(dagger).unwrap().position, Vec3::new(3.0, 0.0, 0.0));

        host.release(Hand::Right);
        host.set_hand_position(Hand::Right, Vec3::zeros());
        assert_eq!(host.world_transform(dagger).unwrap().position, Vec3::new(3.0, 0.0, 0.0));
    }
}
