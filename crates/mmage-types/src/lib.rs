pub mod config;
pub mod difficulty;
pub mod level;
pub mod mods;
pub mod music;
pub mod object;
pub mod palette;
pub mod patch;
pub mod screen;
pub mod text;
pub mod tile;
pub mod world;

pub use config::{ConfigKind, ConfigValue, ObjectConfig, config_kinds};
pub use difficulty::Difficulty;
pub use level::{LEVEL_COUNT, Level, LevelId, MacroRow, STANDARD_LEVEL_COUNT};
pub use mods::Mods;
pub use music::{
    MusicArg, MusicArgKind, MusicCommand, MusicData, MusicItem, MusicOpcode, MusicTarget,
    NotePitch, Song, VCHANNEL_COUNT,
};
pub use object::LevelObject;
pub use palette::Palette;
pub use patch::{HardPatch, UnitilePatch};
pub use screen::{SCREEN_PALETTE_IDX_COUNT, SCREEN_TILE_COUNT, TitleScreen};
pub use text::{DEFAULT_ALPHABET, STRING_COUNT, TextBank};
pub use tile::{
    ChrTile, GLOBAL_MACRO_TILE_COUNT, GLOBAL_MED_TILE_COUNT, MIRROR_PAIR_COUNT, MirrorPairs,
    TileQuad,
};
pub use world::{WORLD_COUNT, World};
