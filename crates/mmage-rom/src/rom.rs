//! The editable ROM model and its read/commit cycle.
//!
//! [`RomData::read`] only accepts a vanilla-shaped image; committing
//! always starts from a pristine copy of that image, re-applies the
//! mapper extension if requested, and then re-encodes every subsystem
//! onto it. Commit keeps going after a subsystem fails so one pass
//! reports every problem.

use md5::{Digest, Md5};
use mmage_types::{
    ChrTile, GLOBAL_MACRO_TILE_COUNT, GLOBAL_MED_TILE_COUNT, LEVEL_COUNT, Level, LevelId,
    MIRROR_PAIR_COUNT, MirrorPairs, Mods, MusicData, ObjectConfig, Palette, TextBank, TileQuad,
    TitleScreen, WORLD_COUNT, World,
};
use thiserror::Error;

use crate::bitstream::{BitReader, BitWriter, StreamError, read_byte, read_word, write_byte};
use crate::layout::{self, BASE_ROM_LEN, Layout};
use crate::tables::BASE_HASHES;
use crate::{chr, level, mapper, mods, music, objectcfg, text, title, world};

const SPRITE_PALETTE_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("image is {len:#x} bytes; a vanilla ROM is exactly {BASE_ROM_LEN:#x}")]
    BadSize { len: usize },
    #[error("level data does not fit ({next:#06x} past {end:#06x})")]
    LevelSpace { next: u16, end: u16 },
    #[error("unitile data does not fit ({next:#06x} past {end:#06x})")]
    UnitileSpace { next: u16, end: u16 },
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("world: {0}")]
    World(#[from] world::WorldError),
    #[error("level: {0}")]
    Level(#[from] level::LevelError),
    #[error("music: {0}")]
    Music(#[from] music::MusicError),
    #[error("title screen: {0}")]
    Title(#[from] title::TitleError),
    #[error("text: {0}")]
    Text(#[from] text::TextError),
    #[error("mapper: {0}")]
    Mapper(#[from] mapper::MapperError),
}

/// Every failure from one commit pass.
#[derive(Debug, Error)]
#[error("commit failed with {} error(s)", .0.len())]
pub struct CommitErrors(pub Vec<RomError>);

/// The whole editable model plus the pristine image it was read from.
#[derive(Debug, Clone)]
pub struct RomData {
    /// Commit through the bank extension. Read images are always vanilla;
    /// the flag only shapes the output.
    pub mapper_extension: bool,
    pub mods: Mods,
    pub default_lives: u8,
    pub sprite_palettes: [Palette; SPRITE_PALETTE_COUNT],
    pub spawnable_objects: Vec<u8>,
    pub mirror_pairs: MirrorPairs,
    pub chest_objects: Vec<u8>,
    pub pause_text: [u8; layout::PAUSE_TEXT_LEN],
    pub pause_text_offset: u8,
    /// PPU addresses of the two movable text labels.
    pub press_start_text_position: u16,
    pub players_text_position: u16,
    pub chr: Vec<Vec<ChrTile>>,
    pub object_config: Vec<ObjectConfig>,
    /// Global med- and macro-tile tables shared by every world.
    pub med_tiles: Vec<TileQuad>,
    pub macro_tiles: Vec<TileQuad>,
    pub worlds: Vec<World>,
    pub levels: Vec<Level>,
    pub music: MusicData,
    pub title_screen: TitleScreen,
    pub text: TextBank,
    orgbin: Vec<u8>,
}

fn read_sprite_palettes(
    bin: &[u8],
    layout: Layout,
) -> Result<[Palette; SPRITE_PALETTE_COUNT], StreamError> {
    let mut r = BitReader::new(bin, layout.ram_to_rom(layout::SPRITE_PALETTE_TABLE));
    let mut palettes = [Palette::default(); SPRITE_PALETTE_COUNT];
    for palette in palettes.iter_mut() {
        let mut colors = [0u8; 3];
        for c in colors.iter_mut() {
            *c = r.read_bits(6)? as u8;
        }
        *palette = Palette::from_colors(colors);
    }
    Ok(palettes)
}

fn write_sprite_palettes(
    bin: &mut [u8],
    layout: Layout,
    palettes: &[Palette; SPRITE_PALETTE_COUNT],
) -> Result<(), StreamError> {
    let mut w = BitWriter::new(bin, layout.ram_to_rom(layout::SPRITE_PALETTE_TABLE));
    for palette in palettes {
        for c in palette.colors() {
            w.write_bits(u32::from(c), 6)?;
        }
    }
    Ok(())
}

/// Global quads are stored one corner per table; the four corner table
/// pointers live in a word table and are never moved.
fn corner_ptrs(bin: &[u8], layout: Layout, table: u16) -> Result<[u16; 4], StreamError> {
    let mut ptrs = [0u16; 4];
    for (j, ptr) in ptrs.iter_mut().enumerate() {
        *ptr = read_word(bin, layout.ram_to_rom(table + 2 * j as u16))?;
    }
    Ok(ptrs)
}

fn read_global_quads(
    bin: &[u8],
    layout: Layout,
    table: u16,
    count: usize,
) -> Result<Vec<TileQuad>, StreamError> {
    let ptrs = corner_ptrs(bin, layout, table)?;
    let mut quads = Vec::with_capacity(count);
    for i in 0..count {
        let mut quad = [0u8; 4];
        for (j, corner) in quad.iter_mut().enumerate() {
            *corner = read_byte(bin, layout.ram_to_rom(ptrs[j] + i as u16))?;
        }
        quads.push(TileQuad(quad));
    }
    Ok(quads)
}

fn write_global_quads(
    bin: &mut [u8],
    layout: Layout,
    table: u16,
    quads: &[TileQuad],
) -> Result<(), StreamError> {
    let ptrs = corner_ptrs(bin, layout, table)?;
    for (i, quad) in quads.iter().enumerate() {
        for (j, &corner) in quad.0.iter().enumerate() {
            write_byte(bin, layout.ram_to_rom(ptrs[j] + i as u16), corner)?;
        }
    }
    Ok(())
}

impl RomData {
    /// Parses a vanilla ROM image. Unknown digests are only warned about;
    /// a wrong size is fatal.
    pub fn read(bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.len() != BASE_ROM_LEN {
            return Err(RomError::BadSize { len: bytes.len() });
        }
        let digest = hex::encode(Md5::digest(&bytes));
        if !BASE_HASHES.contains(&digest.as_str()) {
            log::warn!("unexpected ROM digest {digest}; this is not a known base image");
        }

        let layout = Layout::BASE;
        let bin = bytes.as_slice();

        let mods = mods::read(bin, layout)?;

        let mut pause_text = [0u8; layout::PAUSE_TEXT_LEN];
        for (i, slot) in pause_text.iter_mut().enumerate() {
            *slot = read_byte(bin, layout.ram_to_rom(layout::TEXT_RANGE.1 + i as u16))?;
        }
        let pause_text_offset = read_byte(bin, layout.ram_to_rom(layout::PAUSE_TEXT_OFFSET))?;

        // the high and low bytes of each PPU position are not adjacent
        let read_split_word = |addrs: [u16; 2]| -> Result<u16, StreamError> {
            let hi = read_byte(bin, layout.ram_to_rom(addrs[0]))?;
            let lo = read_byte(bin, layout.ram_to_rom(addrs[1]))?;
            Ok(u16::from(hi) << 8 | u16::from(lo))
        };
        let press_start_text_position = read_split_word(layout::PRESS_START_TEXT_POSITION)?;
        let players_text_position = read_split_word(layout::PLAYERS_TEXT_POSITION)?;

        let chr = chr::read_all(bin, layout)?;
        let default_lives = read_byte(bin, layout.ram_to_rom(layout::DEFAULT_LIVES))?;
        let sprite_palettes = read_sprite_palettes(bin, layout)?;

        let mut spawnable_objects = Vec::with_capacity(layout::SPAWNABLE_COUNT);
        for i in 0..layout::SPAWNABLE_COUNT {
            spawnable_objects
                .push(read_byte(bin, layout.ram_to_rom(layout::SPAWNABLE_TABLE + i as u16))?);
        }

        let mut mirror_pairs = MirrorPairs::default();
        for (i, pair) in mirror_pairs.0.iter_mut().enumerate() {
            for (j, side) in pair.iter_mut().enumerate() {
                *side = read_byte(
                    bin,
                    layout.ram_to_rom(layout::MIRROR_PAIRS_TABLE)
                        + j * MIRROR_PAIR_COUNT
                        + i,
                )?;
            }
        }

        let mut chest_objects = Vec::with_capacity(layout::CHEST_TABLE_LEN);
        for i in 0..layout::CHEST_TABLE_LEN {
            chest_objects.push(read_byte(bin, layout.ram_to_rom(layout::CHEST_TABLE + i as u16))?);
        }

        let object_config = objectcfg::read_all(bin, layout)?;

        let med_tiles =
            read_global_quads(bin, layout, layout::MED_TILES_TABLE, GLOBAL_MED_TILE_COUNT)?;
        let macro_tiles =
            read_global_quads(bin, layout, layout::MACRO_TILES_TABLE, GLOBAL_MACRO_TILE_COUNT)?;

        let mut worlds = Vec::with_capacity(WORLD_COUNT);
        for idx in 0..WORLD_COUNT {
            worlds.push(world::read(bin, layout, idx as u8)?);
        }

        let mut levels = Vec::with_capacity(LEVEL_COUNT);
        for id in LevelId::iter() {
            levels.push(level::read(bin, layout, id, &spawnable_objects)?);
        }

        let music = music::read(bin, layout)?;
        let title_screen = title::read(bin, layout)?;
        let text = text::read(bin, layout)?;

        Ok(Self {
            mapper_extension: false,
            mods,
            default_lives,
            sprite_palettes,
            spawnable_objects,
            mirror_pairs,
            chest_objects,
            pause_text,
            pause_text_offset,
            press_start_text_position,
            players_text_position,
            chr,
            object_config,
            med_tiles,
            macro_tiles,
            worlds,
            levels,
            music,
            title_screen,
            text,
            orgbin: bytes,
        })
    }

    /// Re-encodes the model onto a pristine copy of the source image and
    /// returns the result. All subsystem failures from the pass are
    /// collected before reporting.
    pub fn commit(&self) -> Result<Vec<u8>, CommitErrors> {
        let mut errors: Vec<RomError> = Vec::new();
        let mut bin = self.orgbin.clone();
        let layout =
            if self.mapper_extension { Layout::EXTENDED } else { Layout::BASE };
        if self.mapper_extension {
            log::debug!("inserting mapper extension banks");
            mapper::extend_banks(&mut bin);
        }

        let check = |r: Result<(), RomError>, errors: &mut Vec<RomError>| {
            if let Err(e) = r {
                errors.push(e);
            }
        };

        log::debug!("committing chr and fixed tables");
        check(chr::write_all(&mut bin, layout, &self.chr).map_err(Into::into), &mut errors);
        check(self.commit_fixed_tables(&mut bin, layout), &mut errors);
        check(
            objectcfg::write_all(&mut bin, layout, &self.object_config).map_err(Into::into),
            &mut errors,
        );
        check(
            write_global_quads(&mut bin, layout, layout::MED_TILES_TABLE, &self.med_tiles)
                .map_err(Into::into),
            &mut errors,
        );
        check(
            write_global_quads(&mut bin, layout, layout::MACRO_TILES_TABLE, &self.macro_tiles)
                .map_err(Into::into),
            &mut errors,
        );

        log::debug!("committing worlds and levels");
        for w in &self.worlds {
            check(world::commit(w, &mut bin, layout).map_err(Into::into), &mut errors);
        }
        self.commit_levels(&mut bin, layout, &mut errors);

        log::debug!("committing music, screens and text");
        check(music::commit(&self.music, &mut bin, layout).map_err(Into::into), &mut errors);
        check(
            title::commit(&self.title_screen, &mut bin, layout).map_err(Into::into),
            &mut errors,
        );
        check(text::commit(&self.text, &mut bin, layout).map_err(Into::into), &mut errors);

        if self.mapper_extension {
            check(mapper::patch(&mut bin).map_err(Into::into), &mut errors);
        }
        mods::apply(&mut bin, layout, &self.mods);

        if errors.is_empty() { Ok(bin) } else { Err(CommitErrors(errors)) }
    }

    fn commit_fixed_tables(&self, bin: &mut [u8], layout: Layout) -> Result<(), RomError> {
        write_byte(bin, layout.ram_to_rom(layout::DEFAULT_LIVES), self.default_lives)?;
        write_sprite_palettes(bin, layout, &self.sprite_palettes)?;

        for (i, &gid) in
            self.spawnable_objects.iter().take(layout::SPAWNABLE_COUNT).enumerate()
        {
            write_byte(bin, layout.ram_to_rom(layout::SPAWNABLE_TABLE + i as u16), gid)?;
        }
        for (i, pair) in self.mirror_pairs.0.iter().enumerate() {
            for (j, &side) in pair.iter().enumerate() {
                write_byte(
                    bin,
                    layout.ram_to_rom(layout::MIRROR_PAIRS_TABLE) + j * MIRROR_PAIR_COUNT + i,
                    side,
                )?;
            }
        }
        for (i, &gid) in self.chest_objects.iter().take(layout::CHEST_TABLE_LEN).enumerate() {
            write_byte(bin, layout.ram_to_rom(layout::CHEST_TABLE + i as u16), gid)?;
        }

        write_byte(
            bin,
            layout.ram_to_rom(layout::PAUSE_TEXT_OFFSET),
            self.pause_text_offset,
        )?;
        for (i, &b) in self.pause_text.iter().enumerate() {
            write_byte(bin, layout.ram_to_rom(layout::TEXT_RANGE.1 + i as u16), b)?;
        }

        let mut write_split_word = |addrs: [u16; 2], value: u16| -> Result<(), StreamError> {
            write_byte(bin, layout.ram_to_rom(addrs[0]), (value >> 8) as u8)?;
            write_byte(bin, layout.ram_to_rom(addrs[1]), value as u8)
        };
        write_split_word(layout::PRESS_START_TEXT_POSITION, self.press_start_text_position)?;
        write_split_word(layout::PLAYERS_TEXT_POSITION, self.players_text_position)?;
        Ok(())
    }

    /// Levels are bump-allocated into the level chunk; under the mapper
    /// extension the unitile streams and drop tables share a second heap.
    fn commit_levels(&self, bin: &mut [u8], layout: Layout, errors: &mut Vec<RomError>) {
        let (mut level_ram, level_end) = layout.level_range();
        let mut unitile_ram =
            layout::UNITILE_TABLE_RANGE.0 + 10 * LEVEL_COUNT as u16;

        for (id, lvl) in LevelId::iter().zip(&self.levels) {
            match level::commit(
                lvl,
                bin,
                layout,
                id,
                level_ram,
                &self.spawnable_objects,
                self.mods.extended_objects,
            ) {
                Ok(next) => level_ram = next,
                Err(e) => errors.push(e.into()),
            }
            if self.mapper_extension {
                match level::commit_unitile(lvl, bin, layout, id, unitile_ram) {
                    Ok(next) => unitile_ram = next,
                    Err(e) => errors.push(e.into()),
                }
                match level::commit_drop_objects(lvl, bin, layout, id, unitile_ram) {
                    Ok(next) => unitile_ram = next,
                    Err(e) => errors.push(e.into()),
                }
            }
        }

        if level_ram > level_end {
            errors.push(RomError::LevelSpace { next: level_ram, end: level_end });
        }
        if self.mapper_extension && unitile_ram > layout::UNITILE_TABLE_RANGE.1 {
            errors.push(RomError::UnitileSpace {
                next: unitile_ram,
                end: layout::UNITILE_TABLE_RANGE.1,
            });
        }
    }

    /// The pristine image this model was read from.
    pub fn source(&self) -> &[u8] {
        &self.orgbin
    }
}
