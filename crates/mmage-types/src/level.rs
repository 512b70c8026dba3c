use serde::Serialize;

use crate::difficulty::Difficulty;
use crate::object::LevelObject;
use crate::patch::{HardPatch, UnitilePatch};

pub const LEVEL_COUNT: usize = 0xE;
pub const STANDARD_LEVEL_COUNT: usize = 0xD;

const STANDARD_MACRO_ROWS: usize = 0x20;
const FINALE_MACRO_ROWS: usize = 0x08;

/// Identifies one of the 14 levels and its place in the world layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LevelId(u8);

impl LevelId {
    pub const FINALE: Self = Self(0xD);

    pub fn new(idx: u8) -> Option<Self> {
        if usize::from(idx) < LEVEL_COUNT { Some(Self(idx)) } else { None }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..LEVEL_COUNT as u8).map(Self)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// World this level belongs to. Level 0xC is world 4's hidden fourth
    /// sublevel; the finale also takes place in world 4.
    pub const fn world(self) -> usize {
        match self.0 {
            0xC | 0xD => 3,
            idx => (idx / 3) as usize,
        }
    }

    pub const fn sublevel(self) -> usize {
        match self.0 {
            0xC | 0xD => 3,
            idx => (idx % 3) as usize,
        }
    }

    /// The finale is a short 8-row level; everything else is 32 rows tall.
    pub const fn macro_rows(self) -> usize {
        if self.0 == Self::FINALE.0 { FINALE_MACRO_ROWS } else { STANDARD_MACRO_ROWS }
    }

    /// Micro-tile y the object stream decoder starts from.
    pub const fn objects_start_y(self) -> u8 {
        (self.macro_rows() * 4) as u8
    }

    pub fn name(self) -> String {
        format!("Tower {}-{}", self.world() + 1, self.sublevel() + 1)
    }
}

/// One 4-macro-tile row of a level, bottom-up, plus the horizontal seam
/// offset the engine scrolls the row by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MacroRow {
    pub seam: u8,
    #[serde(rename = "macro-tiles")]
    pub tiles: [u8; 4],
}

/// An editable level: tile rows, object placements, and the two patch
/// layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Level {
    #[serde(rename = "macro-rows")]
    pub macro_rows: Vec<MacroRow>,
    pub objects: Vec<LevelObject>,
    #[serde(rename = "hardmode-patches")]
    pub hardmode_patches: Vec<HardPatch>,
    #[serde(rename = "unitile-patches")]
    pub unitile_patches: Vec<UnitilePatch>,
    #[serde(rename = "music-idx")]
    pub music_idx: u8,
}

impl Level {
    /// Rewrites the unitile list so a patch covering several difficulties
    /// becomes one single-difficulty patch per covered difficulty.
    pub fn split_unitiles_by_difficulty(&mut self) {
        let old = std::mem::take(&mut self.unitile_patches);
        for u in old {
            if u.med_tile.is_none() {
                continue;
            }
            for d in [Difficulty::NORMAL, Difficulty::HARD, Difficulty::HELL] {
                if u.visible_on.contains(d) {
                    self.unitile_patches.push(UnitilePatch { visible_on: d, ..u });
                }
            }
        }
    }

    /// Inverse of [`split_unitiles_by_difficulty`]: merges patches with the
    /// same position and med-tile, dropping placeholders and patches not
    /// visible anywhere.
    ///
    /// [`split_unitiles_by_difficulty`]: Level::split_unitiles_by_difficulty
    pub fn combine_unitiles_by_difficulty(&mut self) {
        let old = std::mem::take(&mut self.unitile_patches);
        for u in old {
            if u.med_tile.is_none() || u.visible_on.is_empty() {
                continue;
            }
            match self
                .unitile_patches
                .iter_mut()
                .find(|v| v.x == u.x && v.y == u.y && v.med_tile == u.med_tile)
            {
                Some(v) => v.visible_on |= u.visible_on,
                None => self.unitile_patches.push(u),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_layout() {
        let id = LevelId::new(0).unwrap();
        assert_eq!((id.world(), id.sublevel()), (0, 0));
        let id = LevelId::new(7).unwrap();
        assert_eq!((id.world(), id.sublevel()), (2, 1));
        let id = LevelId::new(0xC).unwrap();
        assert_eq!((id.world(), id.sublevel()), (3, 3));
        assert_eq!(LevelId::FINALE.world(), 3);
        assert!(LevelId::new(0xE).is_none());
    }

    #[test]
    fn finale_is_short() {
        assert_eq!(LevelId::FINALE.macro_rows(), 8);
        assert_eq!(LevelId::FINALE.objects_start_y(), 0x20);
        assert_eq!(LevelId::new(0).unwrap().objects_start_y(), 0x80);
    }

    #[test]
    fn split_and_combine_unitiles() {
        let mut level = Level::default();
        level.unitile_patches.push(UnitilePatch {
            x: 1,
            y: 2,
            med_tile: Some(0x33),
            visible_on: Difficulty::NORMAL | Difficulty::HELL,
        });
        level.split_unitiles_by_difficulty();
        assert_eq!(level.unitile_patches.len(), 2);
        assert!(level.unitile_patches.iter().all(|u| u.visible_on.bits().count_ones() == 1));

        level.combine_unitiles_by_difficulty();
        assert_eq!(level.unitile_patches.len(), 1);
        assert_eq!(level.unitile_patches[0].visible_on, Difficulty::NORMAL | Difficulty::HELL);
    }
}
