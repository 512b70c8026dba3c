//! The MMC5 mapper extension: two inserted PRG banks plus the code
//! patches that bank-switch level reads and add unitile support.
//!
//! Patch blobs come from <https://github.com/nstbayless/mm-patches>; the
//! bank-switch trampolines were written by negativeseven. All offsets
//! here are file offsets into the already-extended image.

use thiserror::Error;

use crate::layout::{EXTENSION_LENGTH, HEADER_LEN};

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("bad patch blob: {0}")]
    BadBlob(#[from] hex::FromHexError),
}

/// Bank-switch trampolines at 0xDAEC-0xDB45 and the hooks that call them.
/// The first entry redirects the reset vector through the new entry stub.
const PATCHES: &[(usize, &str)] = &[
    (0x1000C, "ec da"),
    (0xDAFC, "a9 00 8d f8 ff 4c 57 95"),
    (0xDB04, "a9 01 8d e8 ff a0 00 b1 c0 8c f8 ff 60"),
    (0xDB11, "a9 01 8d e8 ff a0 00 b1 84 8c f8 ff 60"),
    (0xDB1E, "a9 01 8d e8 ff 20 b7 ca 8c f8 ff 60"),
    (0xDB2A, "a0 04 4c 0e db"),
    (0xDB2F, "a0 05 4c 0e db"),
    (0xDB34, "a0 01 8c e8 ff 88 b1 ca 8c f8 ff 60"),
    (0xDB40, "8d d3 05 4c 24 db"),
    (0xF5C6, "20 f4 da ea"),
    (0xF3C3, "20 f4 da ea"),
    (0xF5A0, "20 24 db ea"),
    (0xF5A6, "20 30 db ea ea"),
    (0xF7E5, "20 0e db"),
    (0xF7F7, "20 0e db"),
    (0xF800, "20 0e db"),
    (0xF808, "20 1f db"),
    (0xF810, "20 1f db"),
    (0xF843, "20 1a db"),
    (0xF84F, "20 1a db"),
];

/// Unitile hooks and the render-path interpreter at 0xDB46.
const UNITILE_PATCHES: &[(usize, &str)] = &[
    (0xF630, "20 D1 DB EA"),
    (0xC481, "4C 64 DB"),
    (0xC4A7, "4C 50 DB EA"),
    (
        0xDB46,
        "25 30 85 30 A5 CE 85 0B A5 31 38 E5 18 C5 CD B0
         02 E6 0B A9 F8 25 31 85 31 60 A9 F0 20 36 DB 20
         86 DB 90 03 4C A1 C4 A5 7F 29 0F 4C 9B C4 A9 F8
         20 36 DB 20 86 DB 90 03 4C 91 C4 A5 7F 4A 4C 74
         C4 B1 08 48 E6 08 D0 02 E6 09 68 60 A4 0A 18 60
         84 0A A4 BC B9 D1 DC 85 08 B9 DE DC 85 09 F0 EC
         A0 00 20 77 DB 20 77 DB 20 77 DB 20 77 DB C9 01
         F0 DA C5 30 D0 EC 20 77 DB C5 31 D0 E8 20 77 DB
         C5 0B D0 E4 20 77 DB A4 0A 20 4D 8B 38 60 A0 00
         B1 00 A8 E6 00 D0 02 E6 01 98 60 8A 48 98 48 A5
         00 48 A5 01 48 A5 02 48 A5 03 48 A5 04 48 A5 05
         48 A5 BC 0A A8 B9 D0 DA 85 00 38 A5 C0 E5 00 4A
         4A 0A 85 00 C6 00 C6 00 AD C9 05 4A 4A 4A 4A 29
         01 05 00 85 02 A9 00 85 03 85 04 A5 BC 0A 0A 85
         00 A5 02 4A 4A 4A 4A 29 03 85 04 05 00 0A A8 B9
         EB DC 85 00 B9 EC DC 85 01 05 00 F0 22 20 C4 DB
         C9 FE F0 7C 48 29 E0 AA A5 03 4A 4A 4A 4A 85 05
         A5 04 0A 0A 0A 0A 05 05 C5 02 90 47 F0 04 68 4C
         B6 DC 8A F0 1A C9 E0 F0 42 24 6F 50 06 29 20 D0
         37 F0 0C 10 06 29 40 D0 2F F0 04 29 80 D0 29 A5
         02 48 0A 0A 0A 0A 85 02 38 A9 F0 E5 02 85 02 A5
         03 29 0F 18 65 02 AA 68 85 02 20 C4 DB 9D 00 06
         4C A1 DC 8A C9 E0 F0 03 20 C4 DB 68 29 1F C9 1D
         D0 02 A9 41 18 65 03 85 03 90 82 E6 04 4C 33 DC
         68 85 05 68 85 04 68 85 03 68 85 02 68 85 01 68
         85 00 68 A8 68 AA A5 D2 29 03 60",
    ),
];

fn decode_blob(blob: &str) -> Result<Vec<u8>, MapperError> {
    let compact: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(hex::decode(compact)?)
}

/// Grows a vanilla-shaped image in place: updates the iNES header for
/// MMC5 with four PRG banks and inserts the two new (zeroed) banks after
/// the first.
pub fn extend_banks(bin: &mut Vec<u8>) {
    bin[0x4] = (EXTENSION_LENGTH / 0x4000) as u8 + 2;
    bin[0x5] = 0x01;
    bin[0x6] = 0x20;
    bin.splice(0x4010..0x4010, std::iter::repeat_n(0, EXTENSION_LENGTH));
}

/// Applies the trampoline and unitile patches to an extended image.
pub fn patch(bin: &mut [u8]) -> Result<(), MapperError> {
    for &(offset, blob) in PATCHES.iter().chain(UNITILE_PATCHES) {
        let bytes = decode_blob(blob)?;
        bin[offset..offset + bytes.len()].copy_from_slice(&bytes);
    }
    Ok(())
}
