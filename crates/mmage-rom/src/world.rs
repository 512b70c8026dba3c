//! Reads and writes a world's tile and palette tables.
//!
//! A world's data block is: med-tile count, macro-tile count, the world
//! med-tiles (column-major, corner j at `ptr + count * j`), packed 2-bit
//! med-tile palette indices covering the global tiles too, the world
//! macro-tiles (column-major again), then eight background palettes of
//! three 6-bit colors each.

use mmage_types::{GLOBAL_MED_TILE_COUNT, Palette, TileQuad, World};

use crate::bitstream::{BitReader, BitWriter, StreamError, read_byte, read_word, write_byte, write_word};
use crate::layout::{self, Layout};

pub const PALETTE_COUNT: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("world {idx} data does not fit: capacity {capacity} tiles, need {need}")]
    Capacity { idx: usize, capacity: usize, need: usize },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

fn read_tile_quads(bin: &[u8], layout: Layout, ptr: u16, count: usize) -> Result<Vec<TileQuad>, StreamError> {
    let mut quads = Vec::with_capacity(count);
    for i in 0..count {
        let mut quad = [0u8; 4];
        for (j, corner) in quad.iter_mut().enumerate() {
            *corner = read_byte(bin, layout.ram_to_rom(ptr + (i + count * j) as u16))?;
        }
        quads.push(TileQuad(quad));
    }
    Ok(quads)
}

fn write_tile_quads(bin: &mut [u8], layout: Layout, ptr: u16, quads: &[TileQuad]) -> Result<(), StreamError> {
    for (i, quad) in quads.iter().enumerate() {
        for (j, &corner) in quad.0.iter().enumerate() {
            write_byte(bin, layout.ram_to_rom(ptr + (i + quads.len() * j) as u16), corner)?;
        }
    }
    Ok(())
}

pub fn read(bin: &[u8], layout: Layout, idx: u8) -> Result<World, WorldError> {
    let max_symmetry_idx = read_byte(
        bin,
        layout.ram_to_rom(layout::WORLD_MIRROR_INDEX_TABLE + u16::from(idx)),
    )?;
    let ram = read_word(
        bin,
        layout.ram_to_rom(layout::WORLD_MACRO_TILES_TABLE + 2 * u16::from(idx)),
    )?;

    let mut ptr = ram;
    let med_count = usize::from(read_byte(bin, layout.ram_to_rom(ptr))?);
    ptr += 1;
    let macro_count = usize::from(read_byte(bin, layout.ram_to_rom(ptr))?);
    ptr += 1;

    let med_tiles = read_tile_quads(bin, layout, ptr, med_count)?;
    ptr += (4 * med_count) as u16;

    // 2-bit palette indices, low bits first, covering global tiles too
    let palette_entries = med_count + GLOBAL_MED_TILE_COUNT;
    let mut med_tile_palettes = vec![0u8; palette_entries];
    for (i, slot) in med_tile_palettes.iter_mut().enumerate() {
        let b = read_byte(bin, layout.ram_to_rom(ptr + (i / 4) as u16))?;
        *slot = (b >> (2 * (i % 4))) & 3;
    }
    ptr += palette_entries.div_ceil(4) as u16;

    let macro_tiles = read_tile_quads(bin, layout, ptr, macro_count)?;
    ptr += (4 * macro_count) as u16;

    let mut palettes = Vec::with_capacity(PALETTE_COUNT);
    let mut r = BitReader::new(bin, layout.ram_to_rom(ptr));
    for _ in 0..PALETTE_COUNT {
        let mut colors = [0u8; 3];
        for c in colors.iter_mut() {
            *c = r.read_bits(6)? as u8;
        }
        palettes.push(Palette::from_colors(colors));
    }

    Ok(World {
        idx: usize::from(idx),
        max_symmetry_idx,
        med_tiles,
        macro_tiles,
        med_tile_palettes,
        palettes,
        ram,
        capacity: med_count + macro_count,
    })
}

/// Writes the world back at its original location. The block may not
/// grow past the tile capacity it was read with.
pub fn commit(world: &World, bin: &mut [u8], layout: Layout) -> Result<(), WorldError> {
    let need = world.med_tiles.len() + world.macro_tiles.len();
    if world.capacity < need {
        return Err(WorldError::Capacity { idx: world.idx, capacity: world.capacity, need });
    }

    write_byte(
        bin,
        layout.ram_to_rom(layout::WORLD_MIRROR_INDEX_TABLE + world.idx as u16),
        world.max_symmetry_idx,
    )?;
    write_word(
        bin,
        layout.ram_to_rom(layout::WORLD_MACRO_TILES_TABLE + 2 * world.idx as u16),
        world.ram,
    )?;

    let mut ptr = world.ram;
    write_byte(bin, layout.ram_to_rom(ptr), world.med_tiles.len() as u8)?;
    ptr += 1;
    write_byte(bin, layout.ram_to_rom(ptr), world.macro_tiles.len() as u8)?;
    ptr += 1;

    write_tile_quads(bin, layout, ptr, &world.med_tiles)?;
    ptr += (4 * world.med_tiles.len()) as u16;

    let palette_entries = world.med_tiles.len() + GLOBAL_MED_TILE_COUNT;
    for i in 0..palette_entries.div_ceil(4) {
        let mut b = 0u8;
        for j in 0..4 {
            let idx = world.med_tile_palettes.get(4 * i + j).copied().unwrap_or(0);
            b |= (idx & 3) << (2 * j);
        }
        write_byte(bin, layout.ram_to_rom(ptr + i as u16), b)?;
    }
    ptr += palette_entries.div_ceil(4) as u16;

    write_tile_quads(bin, layout, ptr, &world.macro_tiles)?;
    ptr += (4 * world.macro_tiles.len()) as u16;

    let mut w = BitWriter::new(bin, layout.ram_to_rom(ptr));
    for palette in world.palettes.iter().take(PALETTE_COUNT) {
        for c in palette.colors() {
            w.write_bits(u32::from(c), 6)?;
        }
    }
    Ok(())
}
