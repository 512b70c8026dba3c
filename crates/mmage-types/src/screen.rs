use serde::Serialize;

use crate::palette::Palette;

/// Expected tile-table lengths for the two screens (title, ending).
pub const SCREEN_TILE_COUNT: [usize; 2] = [0x340, 382];
/// Packed palette-index bytes per screen.
pub const SCREEN_PALETTE_IDX_COUNT: [usize; 2] = [0x1B, 0x1B];

/// The title and ending screens: nametable bytes, packed 2-bit palette
/// indices, and the fixed 4-palette block for each screen. All four arrays
/// are stored in one LZ-compressed blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleScreen {
    /// Nametable tiles, 32 per row. `tables[0]` is the title screen,
    /// `tables[1]` the ending screen.
    pub tables: [Vec<u8>; 2],
    /// Packed palette indices, four 2-bit entries per byte.
    #[serde(rename = "palette-idxs")]
    pub palette_idxs: [Vec<u8>; 2],
    pub palettes: [[Palette; 4]; 2],
}

impl Default for TitleScreen {
    fn default() -> Self {
        Self {
            tables: [vec![0; SCREEN_TILE_COUNT[0]], vec![0; SCREEN_TILE_COUNT[1]]],
            palette_idxs: [
                vec![0; SCREEN_PALETTE_IDX_COUNT[0]],
                vec![0; SCREEN_PALETTE_IDX_COUNT[1]],
            ],
            palettes: [[Palette::default(); 4]; 2],
        }
    }
}

impl TitleScreen {
    pub fn get_tile(&self, x: usize, y: usize, k: usize) -> u8 {
        self.tables[k].get(x + y * 32).copied().unwrap_or(0)
    }

    pub fn set_tile(&mut self, x: usize, y: usize, t: u8, k: usize) {
        if let Some(slot) = self.tables[k].get_mut(x + y * 32) {
            *slot = t;
        }
    }

    // The attribute arithmetic differs between the two screens; the ending
    // screen's nametable is offset by a tile in both axes.
    fn palette_slot(&self, x: usize, y: usize, k: usize) -> Option<(usize, usize)> {
        let (px, py) = (x * 8, y * 8);
        let (i, sub) = if k == 0 {
            let i = (px / 0x20) % 8 + ((py + 8) / 0x20) * 8;
            let sub = (px / 0x10) % 2 + 2 * (((py + 8) / 0x10) % 2);
            (i.checked_sub(0x1D)?, sub)
        } else {
            let py = py.checked_sub(8)?;
            let px = px + 0x20;
            let i = (px / 0x20) % 8 + (py / 0x20) * 8;
            let sub = (px / 0x10) % 2 + 2 * ((py / 0x10) % 2);
            (i, sub)
        };
        if i < self.palette_idxs[k].len() { Some((i, sub)) } else { None }
    }

    pub fn get_palette_idx(&self, x: usize, y: usize, k: usize) -> u8 {
        match self.palette_slot(x, y, k) {
            Some((i, sub)) => (self.palette_idxs[k][i] >> (2 * sub)) & 0x3,
            None => 0,
        }
    }

    pub fn set_palette_idx(&mut self, x: usize, y: usize, palette_idx: u8, k: usize) {
        if let Some((i, sub)) = self.palette_slot(x, y, k) {
            let mask = 0x3 << (2 * sub);
            let b = &mut self.palette_idxs[k][i];
            *b = (*b & !mask) | ((palette_idx << (2 * sub)) & mask);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_accessors() {
        let mut screen = TitleScreen::default();
        screen.set_tile(3, 2, 0x41, 0);
        assert_eq!(screen.get_tile(3, 2, 0), 0x41);
        // out of range is silently a blank tile
        assert_eq!(screen.get_tile(0, 100, 0), 0);
    }

    #[test]
    fn palette_idx_round_trip() {
        let mut screen = TitleScreen::default();
        // only the lower rows of the title screen carry attribute entries
        screen.set_palette_idx(16, 16, 3, 0);
        assert_eq!(screen.get_palette_idx(16, 16, 0), 3);
        assert_eq!(screen.get_palette_idx(0, 0, 0), 0);
    }
}
