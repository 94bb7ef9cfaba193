//! Hand identity
//!
//! The guard always reasons in terms of the player's game hands. Physical
//! controllers map onto game hands through [`Hand::from_controller`], which
//! swaps sides when left-handed mode is enabled.

use serde::{Deserialize, Serialize};

/// One of the player's two hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    /// Left game hand
    Left,
    /// Right game hand
    Right,
}

impl Hand {
    /// Both hands, left first
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// The opposite hand
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Stable index for per-hand arrays
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Map a physical controller to the game hand it drives
    pub const fn from_controller(is_left_controller: bool, left_handed_mode: bool) -> Self {
        if is_left_controller != left_handed_mode {
            Self::Left
        } else {
            Self::Right
        }
    }

    /// Lowercase display name used in log lines
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_hand() {
        assert_eq!(Hand::Left.other(), Hand::Right);
        assert_eq!(Hand::Right.other().other(), Hand::Right);
    }

    #[test]
    fn test_controller_mapping_swaps_in_left_handed_mode() {
        assert_eq!(Hand::from_controller(true, false), Hand::Left);
        assert_eq!(Hand::from_controller(false, false), Hand::Right);
        assert_eq!(Hand::from_controller(true, true), Hand::Right);
        assert_eq!(Hand::from_controller(false, true), Hand::Left);
    }
}
