//! Player Inputs
//!
//! Everything the host can feed the state machine. Each input is applied at
//! an explicit host time, which is what makes a run replayable.

use serde::{Serialize, Deserialize};

/// Keyboard digits map to choice slots `1..=6`.
pub const FIRST_SLOT_KEY: char = '1';

/// One host input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Begin (or replay) a run
    Start,
    /// Abandon the run and return to the menu
    BackToMenu,
    /// Pick an icon by id
    Choose {
        /// Icon id
        icon_id: String,
    },
    /// Pick the icon at a 0-based display slot
    Slot {
        /// Slot index
        index: usize,
    },
    /// Periodic poll: timers, pending advance, run clock
    Tick,
}

impl PlayerInput {
    /// Map a pressed key (`'1'`..`'6'`) to a slot pick.
    pub fn from_key(key: char) -> Option<Self> {
        let digit = key.to_digit(10)?;
        let first = FIRST_SLOT_KEY.to_digit(10)?;
        if digit < first {
            return None;
        }
        let index = (digit - first) as usize;
        (index < crate::game::choices::CHOICE_COUNT).then_some(PlayerInput::Slot { index })
    }

    /// Is this a periodic tick?
    pub fn is_tick(&self) -> bool {
        matches!(self, PlayerInput::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(PlayerInput::from_key('1'), Some(PlayerInput::Slot { index: 0 }));
        assert_eq!(PlayerInput::from_key('6'), Some(PlayerInput::Slot { index: 5 }));
        assert_eq!(PlayerInput::from_key('7'), None);
        assert_eq!(PlayerInput::from_key('0'), None);
        assert_eq!(PlayerInput::from_key('x'), None);
    }
}
