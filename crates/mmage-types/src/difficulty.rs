use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Difficulties a tile override is visible on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct Difficulty: u8 {
        const NORMAL = 0b001;
        const HARD   = 0b010;
        const HELL   = 0b100;
    }
}

impl Difficulty {
    /// Packed form used by the unitile stream: bits 5-7 are *set* for the
    /// difficulties the tile does NOT appear on. A value of 0xE0 means the
    /// tile appears nowhere.
    pub fn absence_bits(self) -> u8 {
        (if self.contains(Self::NORMAL) { 0 } else { 0x80 })
            | (if self.contains(Self::HARD) { 0 } else { 0x40 })
            | (if self.contains(Self::HELL) { 0 } else { 0x20 })
    }

    pub fn from_absence_bits(bits: u8) -> Self {
        let mut d = Self::empty();
        if bits & 0x80 == 0 {
            d |= Self::NORMAL;
        }
        if bits & 0x40 == 0 {
            d |= Self::HARD;
        }
        if bits & 0x20 == 0 {
            d |= Self::HELL;
        }
        d
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::all()
    }
}
