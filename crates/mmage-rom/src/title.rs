//! LZ codec for the title and ending screens.
//!
//! Both screens' nametable and attribute bytes live in one compressed
//! blob. Tokens: a single `0` bit is a zero byte, `10` + 8 bits is a
//! literal, `11` + 8-bit offset + 5-bit length is a back-reference into
//! the already-decoded output (offset 1 = previous byte; runs may
//! overlap themselves).

use mmage_types::{Palette, SCREEN_PALETTE_IDX_COUNT, SCREEN_TILE_COUNT, TitleScreen};

use crate::bitstream::{BitReader, BitWriter, StreamError};
use crate::layout::{self, Layout};

const OFFSET_BITS: u32 = 8;
const COUNT_BITS: u32 = 5;
/// Bit cost of a back-reference token.
const REF_COST: usize = 2 + OFFSET_BITS as usize + COUNT_BITS as usize;

#[derive(Debug, thiserror::Error)]
pub enum TitleError {
    #[error("screen data exceeds its window ({need:#x} > {limit:#x})")]
    Range { need: usize, limit: usize },
    #[error("screen tables have the wrong lengths")]
    Shape,
    #[error(transparent)]
    Stream(#[from] StreamError),
}

fn common_prefix_len(a: &[u8], b: &[u8], max: usize) -> usize {
    a.iter().zip(b).take(max).take_while(|(x, y)| x == y).count()
}

/// Greedy encoder. At each position it weighs a run of zero bits, a
/// back-reference, and a literal by explicit bit cost; short matches
/// that zero bits would cover more cheaply are discarded.
fn compress(table: &[u8], w: &mut BitWriter<'_>) -> Result<(), StreamError> {
    let mut i = 0;
    while i < table.len() {
        let mut best = (0usize, 0usize);
        let lo = i.saturating_sub(1 << OFFSET_BITS);
        for j in lo..i {
            let max = (table.len() - i).min(1 << COUNT_BITS);
            let l = common_prefix_len(&table[i..], &table[j..], max);
            if l > best.1 {
                best = (j, l);
            }
        }
        if best.1 <= 1 {
            best = (0, 0);
        }
        if best.1 <= REF_COST {
            let altsize: usize =
                table[best.0..best.0 + best.1].iter().map(|&t| if t == 0 { 1 } else { 8 }).sum();
            if altsize <= REF_COST {
                best = (0, 0);
            }
        }

        let zeros = {
            let max = (table.len() - i).min(0x100);
            table[i..].iter().take(max).take_while(|&&t| t == 0).count()
        };

        if zeros <= REF_COST && zeros >= best.1 && zeros > 0 {
            for _ in 0..zeros {
                w.write_bit(false)?;
            }
            i += zeros;
        } else if zeros > REF_COST + 2 && zeros > best.1 && i > 0 && table[i - 1] != 0 {
            // a lone zero bit here lets the whole run go as zero bits
            // on the next pass
            w.write_bit(false)?;
            i += 1;
        } else if best.1 > 1 {
            w.write_bit(true)?;
            w.write_bit(true)?;
            w.write_bits((i - best.0 - 1) as u32, OFFSET_BITS)?;
            w.write_bits((best.1 - 1) as u32, COUNT_BITS)?;
            i += best.1;
        } else {
            w.write_bit(true)?;
            w.write_bit(false)?;
            w.write_bits(u32::from(table[i]), 8)?;
            i += 1;
        }
    }
    Ok(())
}

fn decompress(r: &mut BitReader<'_>, rom_end: usize) -> Result<Vec<u8>, StreamError> {
    let mut table = Vec::new();
    while r.first_unread_byte() < rom_end {
        if !r.read_bit()? {
            table.push(0);
        } else if r.read_bit()? {
            let sub = r.read_bits(OFFSET_BITS)? as usize + 1;
            let count = r.read_bits(COUNT_BITS)? as usize + 1;
            for _ in 0..count {
                // references past the start of the output resolve to zero
                let b = if table.len() <= sub { 0 } else { table[table.len() - sub] };
                table.push(b);
            }
        } else {
            table.push(r.read_bits(8)? as u8);
        }
    }
    Ok(table)
}

pub fn read(bin: &[u8], layout: Layout) -> Result<TitleScreen, TitleError> {
    let start = layout.ram_to_rom(layout::TITLE_RANGE.0);
    let end = layout.ram_to_rom(layout::TITLE_RANGE.1);
    let mut r = BitReader::new(bin, start);
    let table = decompress(&mut r, end)?;

    // layout of the blob: title tiles, title attributes, ending tiles,
    // ending attributes
    let t0 = SCREEN_TILE_COUNT[0];
    let p0 = SCREEN_PALETTE_IDX_COUNT[0];
    let p1 = SCREEN_PALETTE_IDX_COUNT[1];
    if table.len() < t0 + p0 + p1 {
        return Err(TitleError::Shape);
    }
    let tables = [
        table[..t0].to_vec(),
        table[t0 + p0..table.len() - p1].to_vec(),
    ];
    let palette_idxs = [
        table[t0..t0 + p0].to_vec(),
        table[table.len() - p1..].to_vec(),
    ];

    let mut palettes = [[Palette::default(); 4]; 2];
    for (k, block) in palettes.iter_mut().enumerate() {
        let mut r = BitReader::new(bin, layout.ram_to_rom(layout::TITLE_PALETTE_TABLES[k]));
        for palette in block.iter_mut() {
            let mut colors = [0u8; 3];
            for c in colors.iter_mut() {
                *c = r.read_bits(6)? as u8;
            }
            *palette = Palette::from_colors(colors);
        }
    }

    Ok(TitleScreen { tables, palette_idxs, palettes })
}

pub fn commit(screen: &TitleScreen, bin: &mut [u8], layout: Layout) -> Result<(), TitleError> {
    for k in 0..2 {
        if screen.palette_idxs[k].len() != SCREEN_PALETTE_IDX_COUNT[k] {
            return Err(TitleError::Shape);
        }
    }
    if screen.tables[0].len() != SCREEN_TILE_COUNT[0] {
        return Err(TitleError::Shape);
    }

    let mut table = Vec::new();
    table.extend_from_slice(&screen.tables[0]);
    table.extend_from_slice(&screen.palette_idxs[0]);
    table.extend_from_slice(&screen.tables[1]);
    table.extend_from_slice(&screen.palette_idxs[1]);

    let start = layout.ram_to_rom(layout::TITLE_RANGE.0);
    let end = layout.ram_to_rom(layout::TITLE_RANGE.1);
    let mut w = BitWriter::new(bin, start);
    compress(&table, &mut w)?;
    let need = w.first_untouched_byte();
    if need > end {
        return Err(TitleError::Range { need, limit: end });
    }

    for (k, block) in screen.palettes.iter().enumerate() {
        let mut w = BitWriter::new(bin, layout.ram_to_rom(layout::TITLE_PALETTE_TABLES[k]));
        for palette in block {
            for c in palette.colors() {
                w.write_bits(u32::from(c), 6)?;
            }
        }
    }
    Ok(())
}
