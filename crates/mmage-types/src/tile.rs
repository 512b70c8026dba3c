use serde::Serialize;

/// Number of med-tiles shared by every world.
pub const GLOBAL_MED_TILE_COUNT: usize = 0x4C;

/// Number of macro-tiles shared by every world.
pub const GLOBAL_MACRO_TILE_COUNT: usize = 0x24;

pub const MIRROR_PAIR_COUNT: usize = 6;

/// A 2x2 composition: four corner indices in tl, tr, bl, br order.
///
/// A med-tile quad holds micro-tile (8x8) indices; a macro-tile quad holds
/// med-tile indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TileQuad(pub [u8; 4]);

impl TileQuad {
    pub const fn new(tl: u8, tr: u8, bl: u8, br: u8) -> Self {
        Self([tl, tr, bl, br])
    }

    pub const fn tl(self) -> u8 {
        self.0[0]
    }

    pub const fn tr(self) -> u8 {
        self.0[1]
    }

    pub const fn bl(self) -> u8 {
        self.0[2]
    }

    pub const fn br(self) -> u8 {
        self.0[3]
    }
}

/// Med-tiles swapped with each other when a row is mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorPairs(pub [[u8; 2]; MIRROR_PAIR_COUNT]);

impl MirrorPairs {
    /// The partner of `t`, if `t` belongs to a pair.
    pub fn partner(&self, t: u8) -> Option<u8> {
        for [a, b] in self.0 {
            if t == a {
                return Some(b);
            }
            if t == b {
                return Some(a);
            }
        }
        None
    }
}

/// An 8x8 CHR tile as 2-bit pixel values, `pixels[y][x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChrTile {
    pub pixels: [[u8; 8]; 8],
}

impl Default for ChrTile {
    fn default() -> Self {
        Self { pixels: [[0; 8]; 8] }
    }
}
