use serde::Serialize;

use crate::palette::Palette;
use crate::tile::{GLOBAL_MACRO_TILE_COUNT, GLOBAL_MED_TILE_COUNT, MirrorPairs, TileQuad};

pub const WORLD_COUNT: usize = 4;

/// Per-world tile definitions and palettes. World-local med- and
/// macro-tiles extend the global tables; a flat tile index below the global
/// count refers to the global table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct World {
    #[serde(skip)]
    pub idx: usize,
    #[serde(rename = "max-symmetry-idx")]
    pub max_symmetry_idx: u8,
    #[serde(rename = "med-tiles")]
    pub med_tiles: Vec<TileQuad>,
    #[serde(rename = "macro-tiles")]
    pub macro_tiles: Vec<TileQuad>,
    /// 2-bit palette index per med-tile flat index (global + local).
    #[serde(rename = "med-tile-palette-idxs")]
    pub med_tile_palettes: Vec<u8>,
    /// 4 normal palettes followed by 4 hard-mode palettes.
    #[serde(rename = "bg-palettes")]
    pub palettes: Vec<Palette>,
    /// RAM address of the world's data block, recorded at read time.
    #[serde(skip)]
    pub ram: u16,
    /// Total med + macro tile count the data block was read with. The
    /// block is committed in place, so the count may not grow.
    #[serde(skip)]
    pub capacity: usize,
}

impl World {
    pub fn get_med_tile(&self, idx: u8, globals: &[TileQuad]) -> TileQuad {
        let idx = usize::from(idx);
        if idx < GLOBAL_MED_TILE_COUNT {
            globals.get(idx).copied().unwrap_or_default()
        } else {
            self.med_tiles.get(idx - GLOBAL_MED_TILE_COUNT).copied().unwrap_or_default()
        }
    }

    pub fn get_macro_tile(&self, idx: u8, globals: &[TileQuad]) -> TileQuad {
        let idx = usize::from(idx);
        if idx < GLOBAL_MACRO_TILE_COUNT {
            globals.get(idx).copied().unwrap_or_default()
        } else {
            self.macro_tiles.get(idx - GLOBAL_MACRO_TILE_COUNT).copied().unwrap_or_default()
        }
    }

    /// World 2 tops its walls with ice on hard mode.
    pub fn get_micro_tile(&self, idx: u8, hard: bool) -> u8 {
        if self.idx == 1 && hard && (0x12..0x18).contains(&idx) { 0x10 } else { idx }
    }

    /// The med-tile shown at the mirrored position of `t`.
    pub fn mirror_tile(&self, t: u8, pairs: &MirrorPairs) -> u8 {
        if t == 0x11 {
            return 0;
        }
        if t < 0x1E || t >= self.max_symmetry_idx {
            pairs.partner(t).unwrap_or(t)
        } else {
            t ^ 0x01
        }
    }

    pub fn get_med_tile_palette_idx(&self, idx: u8, hard: bool) -> Option<usize> {
        let pal = *self.med_tile_palettes.get(usize::from(idx))?;
        Some(self.map_palette_idx(usize::from(pal), hard))
    }

    /// Hard mode shifts into the second palette bank and then reshuffles:
    /// all eight palettes are loaded into PPU RAM, but the engine remaps
    /// two of the slots depending on the world.
    pub fn map_palette_idx(&self, mut palette_idx: usize, hard: bool) -> usize {
        if hard {
            palette_idx += 4;
        }
        if palette_idx == 6 && self.idx != 3 {
            palette_idx = 4;
        }
        if palette_idx == 7 && self.idx == 0 {
            palette_idx = 6;
        }
        palette_idx
    }
}
