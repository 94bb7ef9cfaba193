//! Generation-checked implement handles
//!
//! Hosts hand out [`ImplementHandle`]s for everything the guard tracks:
//! equipped implements, stand-ins spawned by a divert, and loose objects
//! held in a hand. A handle outlives the object it names; once the slot is
//! reused the old handle stops resolving, which is how stale caches are
//! detected.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to an implement or world object owned by the host
    pub struct ImplementHandle;
}

/// Broad category of a tracked implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImplementKind {
    /// Bladed implement modelled as a line segment
    Blade,
    /// Shield modelled as a disc
    Shield,
}

/// Arena of implements keyed by generation-checked handles
pub struct ImplementArena<T> {
    slots: SlotMap<ImplementHandle, T>,
}

impl<T> Default for ImplementArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ImplementArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Insert a value and return its handle
    pub fn insert(&mut self, value: T) -> ImplementHandle {
        self.slots.insert(value)
    }

    /// Remove a value, invalidating its handle
    pub fn remove(&mut self, handle: ImplementHandle) -> Option<T> {
        self.slots.remove(handle)
    }

    /// Resolve a handle
    pub fn get(&self, handle: ImplementHandle) -> Option<&T> {
        self.slots.get(handle)
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: ImplementHandle) -> Option<&mut T> {
        self.slots.get_mut(handle)
    }

    /// Whether the handle still refers to a live value
    pub fn contains(&self, handle: ImplementHandle) -> bool {
        self.slots.contains_key(handle)
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over live handles and values
    pub fn iter(&self) -> impl Iterator<Item = (ImplementHandle, &T)> {
        self.slots.iter()
    }
}
