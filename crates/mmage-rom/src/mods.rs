//! Optional gameplay patches layered over the committed image.
//!
//! Patch bytes come from <https://github.com/nstbayless/mm-patches>. The
//! two code-replacing mods are detected on read by their first byte; the
//! relic mods overwrite collection hooks with NOPs and cannot be told
//! apart from the unpatched image, so they read back as disabled.

use mmage_types::Mods;

use crate::bitstream::{StreamError, read_byte};
use crate::layout::Layout;

const NO_BOUNCE: (u16, &[u8]) = (0xD5D7, &[0x00]);
const NO_AUTO_SCROLL: (u16, &[u8]) = (
    0x8D81,
    &[
        0xA5, 0xD0, 0x88, 0xF0, 0x05, 0xD9, 0x15, 0x8D, 0x90, 0x0F, 0xE0, 0x0F, 0x90,
        0x0D, 0xA5, 0xD0, 0xF0, 0x09, 0xC6, 0xD0, 0xF0, 0x05, 0xC6, 0xD0, 0x60, 0xE6,
        0xD0, 0x60,
    ],
);
const NO_RELIC: [(u16, &[u8]); 4] = [
    (0xCB0C, &[0xEA, 0xEA, 0xEA]),
    (0xE894, &[0xEA, 0xEA, 0xEA]),
    (0xCD9D, &[0xEA, 0xEA, 0xEA]),
    (0xBCBE, &[0xEA, 0xEA, 0xEA]),
];

/// Object-spawn dispatch hooks for the raw-gid object format. The third
/// patch retargets the extension's dispatcher and only applies to the
/// extended image.
const EXTENDED_OBJECTS: [(u16, &[u8]); 3] = [
    (0xDAC1, &[0xA0, 0x06, 0x20, 0xB7, 0xCA, 0x4C, 0x07, 0xF8]),
    (0xF800, &[0x4C, 0xC1, 0xDA]),
    (0xDAC4, &[0x0E, 0xDB]),
];

fn patch(bin: &mut [u8], layout: Layout, addr: u16, bytes: &[u8]) {
    let rom = layout.ram_to_rom(addr);
    bin[rom..rom + bytes.len()].copy_from_slice(bytes);
}

/// Detects which mods a vanilla-shaped image carries.
pub fn read(bin: &[u8], layout: Layout) -> Result<Mods, StreamError> {
    Ok(Mods {
        no_bounce: read_byte(bin, layout.ram_to_rom(NO_BOUNCE.0))? == NO_BOUNCE.1[0],
        no_auto_scroll: read_byte(bin, layout.ram_to_rom(NO_AUTO_SCROLL.0))?
            == NO_AUTO_SCROLL.1[0],
        extended_objects: false,
        no_relic: [false; 4],
    })
}

pub fn apply(bin: &mut [u8], layout: Layout, mods: &Mods) {
    if mods.no_bounce {
        patch(bin, layout, NO_BOUNCE.0, NO_BOUNCE.1);
    }
    if mods.no_auto_scroll {
        patch(bin, layout, NO_AUTO_SCROLL.0, NO_AUTO_SCROLL.1);
    }
    for (i, &(addr, bytes)) in NO_RELIC.iter().enumerate() {
        if mods.no_relic[i] {
            patch(bin, layout, addr, bytes);
        }
    }
    if mods.extended_objects {
        for (i, &(addr, bytes)) in EXTENDED_OBJECTS.iter().enumerate() {
            if !layout.extended && i == 2 {
                continue;
            }
            patch(bin, layout, addr, bytes);
        }
    }
}
