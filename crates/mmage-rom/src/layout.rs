//! CPU-address to file-offset mapping and the fixed data addresses of the
//! base ROM.
//!
//! PRG RAM addresses start at 0x8000 and map linearly into the file after
//! the 16-byte iNES header. The mapper extension inserts two PRG banks
//! after the original first bank, which shifts everything at 0xC000 and
//! above by the extension length and gives level data a bank of its own.

/// iNES header size.
pub const HEADER_LEN: usize = 0x10;

/// Exact file size of the base ROM.
pub const BASE_ROM_LEN: usize = 0xA010;

/// Bytes inserted by the mapper extension (two PRG banks).
pub const EXTENSION_LENGTH: usize = 0x8000;

pub const EXTENDED_ROM_LEN: usize = BASE_ROM_LEN + EXTENSION_LENGTH;

/// First PRG CPU address.
pub const RAM_BASE: u16 = 0x8000;

// Fixed tables.
pub const SPAWNABLE_TABLE: u16 = 0xDAB1;
pub const SPAWNABLE_COUNT: usize = 0x1F;
pub const LEVEL_TABLE: u16 = 0xDAD0;
pub const MUSIC_TABLE: u16 = 0xDAA3;
pub const MED_TILES_TABLE: u16 = 0xF883;
pub const MACRO_TILES_TABLE: u16 = 0xF88B;
pub const WORLD_MACRO_TILES_TABLE: u16 = 0xAF10;
pub const WORLD_MIRROR_INDEX_TABLE: u16 = 0xAF0C;
pub const MIRROR_PAIRS_TABLE: u16 = 0xAF00;
pub const SPRITE_PALETTE_TABLE: u16 = 0xBD5F;
pub const CHEST_TABLE: u16 = 0xC45B;
pub const CHEST_TABLE_LEN: usize = 0xD;
pub const DEFAULT_LIVES: u16 = 0xB8F1;

// Per-object config tables; entry 0 of each is unused.
pub const OBJECT_HP_TABLE: u16 = 0xBD9A;
pub const OBJECT_POINTS_TABLE: u16 = 0xBE56;
pub const OBJECT_FLAGS_TABLE: u16 = 0xBE6D;
pub const OBJECT_BBOX_TABLE: u16 = 0xBEF9;
pub const SKELETON_THROW_INTERVAL: u16 = 0xEAF8;
pub const SHOT_LIFESPAN_TABLE: u16 = 0xCCE2;

// Capacity windows, [start, end).
pub const MUSIC_RANGE: (u16, u16) = (0x8000, 0x860A);
pub const MUSIC_DURATION_TABLE: u16 = 0x8D9D;
pub const LEVEL_RANGE: (u16, u16) = (0xDAEC, 0xE6C3 + 49);
pub const EXT_LEVEL_RANGE: (u16, u16) = (0x8000, 0xC000);
pub const TEXT_RANGE: (u16, u16) = (0xEC67, 0xEE67);
pub const PAUSE_TEXT: u16 = 0xEE67;
pub const PAUSE_TEXT_LEN: usize = 5;
pub const PAUSE_TEXT_OFFSET: u16 = 0xBAD3;
pub const TITLE_RANGE: (u16, u16) = (0xC5A2, 0xC737);
pub const TITLE_PALETTE_TABLES: [u16; 2] = [0xC737, 0xC740];
pub const PRESS_START_TEXT_POSITION: [u16; 2] = [0xA82A, 0xA82C];
pub const PLAYERS_TEXT_POSITION: [u16; 2] = [0xE793, 0xE795];

// Mapper-extension data area: drop-object pointers, unitile region
// pointers, then the shared data heap.
pub const UNITILE_TABLE_RANGE: (u16, u16) = (0xDCD1, 0xE6C3);
pub const DIACRITICS_TABLE_RANGE: (u16, u16) = (0xDCC1, 0xDCD1);

/// Address translation for one image shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub extended: bool,
}

impl Layout {
    pub const BASE: Self = Self { extended: false };
    pub const EXTENDED: Self = Self { extended: true };

    pub fn rom_len(self) -> usize {
        if self.extended { EXTENDED_ROM_LEN } else { BASE_ROM_LEN }
    }

    /// File offset of a PRG CPU address.
    pub fn ram_to_rom(self, addr: u16) -> usize {
        let mut offset = HEADER_LEN + usize::from(addr) - usize::from(RAM_BASE);
        if self.extended && addr >= 0xC000 {
            offset += EXTENSION_LENGTH;
        }
        offset
    }

    /// File offset of an address in the level-data chunk. Under the
    /// extension, levels live in the first inserted bank.
    pub fn level_to_rom(self, addr: u16) -> usize {
        if self.extended {
            HEADER_LEN + usize::from(addr) - 0x4000
        } else {
            self.ram_to_rom(addr)
        }
    }

    /// File offset of a CHR address.
    pub fn chr_to_rom(self, addr: usize) -> usize {
        let mut offset = HEADER_LEN + 0x8000 + addr;
        if self.extended {
            offset += EXTENSION_LENGTH;
        }
        offset
    }

    pub fn level_range(self) -> (u16, u16) {
        if self.extended { EXT_LEVEL_RANGE } else { LEVEL_RANGE }
    }
}
