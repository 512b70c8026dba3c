use serde::Serialize;

use crate::difficulty::Difficulty;

/// A hard-mode macro-tile replacement. `x` is the macro column (0-3), `y`
/// the macro row, and `i` the nonzero replacement index (the engine maps it
/// to macro-tile `0x2F + i`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HardPatch {
    pub x: u8,
    pub y: u8,
    pub i: u8,
}

impl HardPatch {
    /// Raster position within the 4-wide patch grid.
    pub fn position(self) -> u16 {
        u16::from(self.y) * 4 + u16::from(self.x)
    }

    /// The macro-tile the patch resolves to.
    pub fn macro_tile(self) -> u8 {
        0x2F + self.i
    }
}

/// A single-med-tile override (mapper extension only). `x` spans the 16
/// med-tile columns, `y` the med-tile rows from the top of the level.
///
/// `med_tile` of `None` is a placeholder that only advances the stream
/// cursor; encoders insert these at region boundaries and they never
/// survive a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitilePatch {
    pub x: u8,
    pub y: u8,
    #[serde(rename = "med-tile")]
    pub med_tile: Option<u8>,
    /// Difficulties the override appears on.
    pub visible_on: Difficulty,
}

impl Default for UnitilePatch {
    fn default() -> Self {
        Self { x: 0, y: 0, med_tile: Some(0), visible_on: Difficulty::all() }
    }
}

impl UnitilePatch {
    /// Linear stream index: 16 med-tile columns per row.
    pub fn linear_index(self) -> u16 {
        u16::from(self.y) * 0x10 + u16::from(self.x)
    }

    pub fn absence_bits(self) -> u8 {
        self.visible_on.absence_bits()
    }
}
