//! Planar 2bpp CHR tile codec.
//!
//! A tile is 16 bytes: eight low-plane rows then eight high-plane rows,
//! pixel x in bit `7 - x`. The ROM carries two pages of 0x100 tiles.

use mmage_types::ChrTile;

use crate::bitstream::{StreamError, read_byte, write_byte};
use crate::layout::Layout;

pub const PAGE_COUNT: usize = 2;
pub const TILES_PER_PAGE: usize = 0x100;
const TILE_BYTES: usize = 0x10;
const PAGE_BYTES: usize = 0x1000;

pub fn read_tile(bin: &[u8], layout: Layout, chr_addr: usize) -> Result<ChrTile, StreamError> {
    let mut tile = ChrTile::default();
    for y in 0..8 {
        let l = read_byte(bin, layout.chr_to_rom(chr_addr + y))?;
        let u = read_byte(bin, layout.chr_to_rom(chr_addr + y + 8))?;
        for x in 0..8 {
            let bl = (l >> (7 - x)) & 1;
            let bu = (u >> (7 - x)) & 1;
            tile.pixels[y][x] = (bu << 1) | bl;
        }
    }
    Ok(tile)
}

pub fn write_tile(
    bin: &mut [u8],
    layout: Layout,
    chr_addr: usize,
    tile: &ChrTile,
) -> Result<(), StreamError> {
    for plane in 0..2 {
        for y in 0..8 {
            let mut v = 0u8;
            for x in 0..8 {
                v <<= 1;
                v |= (tile.pixels[y][x] >> plane) & 1;
            }
            write_byte(bin, layout.chr_to_rom(chr_addr + y + 8 * plane), v)?;
        }
    }
    Ok(())
}

/// Reads both CHR pages.
pub fn read_all(bin: &[u8], layout: Layout) -> Result<Vec<Vec<ChrTile>>, StreamError> {
    let mut pages = Vec::with_capacity(PAGE_COUNT);
    for page in 0..PAGE_COUNT {
        let mut tiles = Vec::with_capacity(TILES_PER_PAGE);
        for i in 0..TILES_PER_PAGE {
            tiles.push(read_tile(bin, layout, page * PAGE_BYTES + i * TILE_BYTES)?);
        }
        pages.push(tiles);
    }
    Ok(pages)
}

pub fn write_all(
    bin: &mut [u8],
    layout: Layout,
    pages: &[Vec<ChrTile>],
) -> Result<(), StreamError> {
    for (page, tiles) in pages.iter().enumerate().take(PAGE_COUNT) {
        for (i, tile) in tiles.iter().enumerate().take(TILES_PER_PAGE) {
            write_tile(bin, layout, page * PAGE_BYTES + i * TILE_BYTES, tile)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BASE_ROM_LEN;

    #[test]
    fn planes_split_pixel_bits() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let mut tile = ChrTile::default();
        tile.pixels[0] = [0, 1, 2, 3, 0, 1, 2, 3];
        write_tile(&mut bin, Layout::BASE, 0x20, &tile).unwrap();

        let rom = Layout::BASE.chr_to_rom(0x20);
        // low plane row 0: pixels 1 and 3 set
        assert_eq!(bin[rom], 0b0101_0101);
        // high plane row 0: pixels 2 and 3 set
        assert_eq!(bin[rom + 8], 0b0011_0011);
        assert_eq!(read_tile(&bin, Layout::BASE, 0x20).unwrap(), tile);
    }

    #[test]
    fn pages_round_trip() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let mut pages = vec![vec![ChrTile::default(); TILES_PER_PAGE]; PAGE_COUNT];
        pages[1][0x42].pixels[3][5] = 2;
        pages[0][0xFF].pixels[7][7] = 3;
        write_all(&mut bin, Layout::BASE, &pages).unwrap();
        assert_eq!(read_all(&bin, Layout::BASE).unwrap(), pages);
    }
}
