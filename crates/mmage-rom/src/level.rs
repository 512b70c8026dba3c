//! Reads and writes a level's data block.
//!
//! The block layout is: one hardmode-length byte, the macro-tile rows
//! (4 bytes each, bottom-up), the hardmode patch list, then the object
//! bitstream. Blocks are packed back to back; the pointer table at
//! `LEVEL_TABLE` locates each one.

use mmage_types::{Level, LevelId, MacroRow};

use crate::bitstream::{BitReader, BitWriter, StreamError, read_byte, read_word, write_byte, write_word};
use crate::hardmode;
use crate::layout::{self, Layout};
use crate::objects::{self, ObjectStreamError};
use crate::unitile;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Objects(#[from] ObjectStreamError),
}

/// Serialized size of a level's main data block.
pub fn stored_len(level: &Level, id: LevelId, spawnable: &[u8], extended: bool) -> Result<usize, LevelError> {
    let patches = hardmode::encode(&level.hardmode_patches);
    let objs = objects::encode(&level.objects, spawnable, extended, id.objects_start_y())?;
    Ok(objs.len_bytes() + patches.len() + 4 * id.macro_rows() + 1)
}

fn read_macro_row(bin: &[u8], rom: usize) -> Result<MacroRow, StreamError> {
    let mut row = MacroRow::default();
    for i in 0..4 {
        row.seam >>= 1;
        let t = read_byte(bin, rom + 3 - i)?;
        row.seam |= (t & 1) << 3;
        row.tiles[i] = t >> 1;
    }
    Ok(row)
}

fn write_macro_row(bin: &mut [u8], rom: usize, row: &MacroRow) -> Result<(), StreamError> {
    let mut seam = row.seam;
    for i in 0..4 {
        let b = (seam & 1) | (row.tiles[i] << 1);
        seam >>= 1;
        write_byte(bin, rom + 3 - i, b)?;
    }
    Ok(())
}

pub fn read(bin: &[u8], layout: Layout, id: LevelId, spawnable: &[u8]) -> Result<Level, LevelError> {
    let idx = id.index() as u16;
    let music_idx = read_byte(bin, layout.ram_to_rom(layout::MUSIC_TABLE + idx))?;
    let ram = read_word(bin, layout.ram_to_rom(layout::LEVEL_TABLE + 2 * idx))?;

    let hardmode_len = usize::from(read_byte(bin, layout.ram_to_rom(ram))?);

    let rows = id.macro_rows();
    let mut macro_rows = Vec::with_capacity(rows);
    for i in 0..rows {
        macro_rows.push(read_macro_row(bin, layout.ram_to_rom(ram + (4 * i + 1) as u16))?);
    }

    let patch_start = layout.ram_to_rom(ram + (4 * rows + 1) as u16);
    let patch_bytes = bin
        .get(patch_start..patch_start + hardmode_len)
        .ok_or(StreamError::PastEnd { offset: patch_start })?;
    let hardmode_patches = hardmode::decode(patch_bytes);

    let mut r = BitReader::new(bin, patch_start + hardmode_len);
    let objects = objects::decode(&mut r, spawnable, false, id.objects_start_y())?;

    Ok(Level { macro_rows, objects, hardmode_patches, unitile_patches: Vec::new(), music_idx })
}

/// Writes the level at `ram` and returns the address just past it.
pub fn commit(
    level: &Level,
    bin: &mut [u8],
    layout: Layout,
    id: LevelId,
    ram: u16,
    spawnable: &[u8],
    extended: bool,
) -> Result<u16, LevelError> {
    let idx = id.index() as u16;
    let patches = hardmode::encode(&level.hardmode_patches);
    let objs = objects::encode(&level.objects, spawnable, extended, id.objects_start_y())?;

    write_byte(bin, layout.ram_to_rom(layout::MUSIC_TABLE + idx), level.music_idx)?;
    write_word(bin, layout.ram_to_rom(layout::LEVEL_TABLE + 2 * idx), ram)?;

    let rom = layout.level_to_rom(ram);
    write_byte(bin, rom, patches.len() as u8)?;

    for (i, row) in level.macro_rows.iter().take(id.macro_rows()).enumerate() {
        write_macro_row(bin, rom + 4 * i + 1, row)?;
    }

    let patch_start = rom + 4 * id.macro_rows() + 1;
    for (i, &b) in patches.iter().enumerate() {
        write_byte(bin, patch_start + i, b)?;
    }

    let mut w = BitWriter::new(bin, patch_start + patches.len());
    objs.write_to(&mut w)?;

    Ok(ram + (objs.len_bytes() + patches.len() + 4 * id.macro_rows() + 1) as u16)
}

/// Writes the level's drop-object table entry and records, returning the
/// address past the records. Only meaningful with the mapper extension.
pub fn commit_drop_objects(
    level: &Level,
    bin: &mut [u8],
    layout: Layout,
    id: LevelId,
    ram: u16,
) -> Result<u16, LevelError> {
    let table_start = layout::UNITILE_TABLE_RANGE.0;
    let idx = id.index() as u16;
    for j in 0..2u16 {
        let slot = layout.ram_to_rom(table_start + idx + mmage_types::LEVEL_COUNT as u16 * j);
        write_byte(bin, slot, 0)?;
    }

    let records = objects::encode_drops(&level.objects)?;
    if records.is_empty() {
        return Ok(ram);
    }

    // the engine indexes the records from 3 bytes before the pointer
    let ptr = ram - 3;
    for j in 0..2u16 {
        let slot = layout.ram_to_rom(table_start + idx + mmage_types::LEVEL_COUNT as u16 * j);
        let b = if j == 0 { ptr as u8 } else { (ptr >> 8) as u8 };
        write_byte(bin, slot, b)?;
    }

    let rom = layout.ram_to_rom(ram);
    for (i, &b) in records.iter().enumerate() {
        write_byte(bin, rom + i, b)?;
    }
    Ok(ram + records.len() as u16)
}

/// Writes the level's unitile stream and its four region pointers,
/// returning the address past the stream. Only meaningful with the
/// mapper extension.
pub fn commit_unitile(
    level: &Level,
    bin: &mut [u8],
    layout: Layout,
    id: LevelId,
    ram: u16,
) -> Result<u16, LevelError> {
    let table_start = layout::UNITILE_TABLE_RANGE.0 + 2 * mmage_types::LEVEL_COUNT as u16;
    let idx = id.index() as u16;
    for j in 0..4u16 {
        write_word(bin, layout.ram_to_rom(table_start + 8 * idx + 2 * j), 0)?;
    }

    let mut combined = level.clone();
    combined.combine_unitiles_by_difficulty();
    let stream = unitile::encode(&combined.unitile_patches);
    if stream.stored_len() == 0 {
        return Ok(ram);
    }

    let rom = layout.ram_to_rom(ram);
    for (i, &b) in stream.bytes.iter().enumerate() {
        if let Some(j) = stream.region_starts.iter().position(|&s| s == Some(i)) {
            write_word(
                bin,
                layout.ram_to_rom(table_start + 8 * idx + 2 * j as u16),
                ram + i as u16,
            )?;
        }
        write_byte(bin, rom + i, b)?;
    }
    Ok(ram + stream.stored_len() as u16)
}
