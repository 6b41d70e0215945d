//! Modifier keys and the virtual key codes they synthesize

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Virtual key codes for the modifiers this crate may synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum VirtualKey {
    Shift = 0x10,
    Control = 0x11,
    /// Alt
    Menu = 0x12,
}

impl VirtualKey {
    /// Raw Win32 virtual key code
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Composable set of requested modifier keys
///
/// Bit values match the tool-layer contract: Ctrl = 1, Shift = 2, Alt = 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet(u8);

impl ModifierSet {
    pub const NONE: ModifierSet = ModifierSet(0);
    pub const CTRL: ModifierSet = ModifierSet(1);
    pub const SHIFT: ModifierSet = ModifierSet(2);
    pub const ALT: ModifierSet = ModifierSet(4);

    const ALL_BITS: u8 = 1 | 2 | 4;

    /// Builds a set from raw bits, ignoring unknown bits
    pub fn from_bits_truncate(bits: u8) -> Self {
        ModifierSet(bits & Self::ALL_BITS)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every modifier in `other` is also in this set
    pub fn contains(self, other: ModifierSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Key codes for the requested modifiers, in press order (Ctrl, Shift, Alt)
    pub fn keys(self) -> impl Iterator<Item = VirtualKey> {
        [
            (ModifierSet::CTRL, VirtualKey::Control),
            (ModifierSet::SHIFT, VirtualKey::Shift),
            (ModifierSet::ALT, VirtualKey::Menu),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, key)| key)
    }
}

impl BitOr for ModifierSet {
    type Output = ModifierSet;

    fn bitor(self, rhs: ModifierSet) -> ModifierSet {
        ModifierSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierSet {
    fn bitor_assign(&mut self, rhs: ModifierSet) {
        self.0 |= rhs.0;
    }
}

impl std::str::FromStr for ModifierSet {
    type Err = String;

    /// Parses a `+` or `,` separated list such as `ctrl+shift`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = ModifierSet::NONE;
        for part in s.split(['+', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            set |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => ModifierSet::CTRL,
                "shift" => ModifierSet::SHIFT,
                "alt" => ModifierSet::ALT,
                other => return Err(format!("unknown modifier: {other}")),
            };
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_sets_compose() {
        let set = ModifierSet::CTRL | ModifierSet::ALT;
        assert!(set.contains(ModifierSet::CTRL));
        assert!(set.contains(ModifierSet::ALT));
        assert!(!set.contains(ModifierSet::SHIFT));
        assert_eq!(set.bits(), 5);
    }

    #[test]
    fn keys_follow_press_order() {
        let all = ModifierSet::ALT | ModifierSet::SHIFT | ModifierSet::CTRL;
        let keys: Vec<_> = all.keys().collect();
        assert_eq!(
            keys,
            vec![VirtualKey::Control, VirtualKey::Shift, VirtualKey::Menu]
        );
        assert_eq!(ModifierSet::NONE.keys().count(), 0);
    }

    #[test]
    fn unknown_bits_are_dropped() {
        assert_eq!(ModifierSet::from_bits_truncate(0xFF).bits(), 7);
    }

    #[test]
    fn parse_modifier_list() {
        assert_eq!(
            "ctrl+Shift".parse::<ModifierSet>().unwrap(),
            ModifierSet::CTRL | ModifierSet::SHIFT
        );
        assert_eq!("".parse::<ModifierSet>().unwrap(), ModifierSet::NONE);
        assert!("meta".parse::<ModifierSet>().is_err());
    }

    #[test]
    fn virtual_key_codes() {
        assert_eq!(VirtualKey::Control.code(), 0x11);
        assert_eq!(VirtualKey::Shift.code(), 0x10);
        assert_eq!(VirtualKey::Menu.code(), 0x12);
    }
}
