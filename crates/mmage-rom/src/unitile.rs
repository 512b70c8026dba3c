//! Codec for the single-med-tile patch stream used by the mapper
//! extension.
//!
//! The stream walks a cursor over the level's med-tile grid in linear
//! order (`i = y * 0x10 + x`). Tokens:
//!
//! * `111` + 5-bit advance: move the cursor forward; code 0x1D stands
//!   for an advance of 0x41
//! * flags byte + med-tile byte: patch at the cursor; the flags byte's
//!   top 3 bits are difficulty-absence bits and its low 5 bits are a
//!   folded advance applied after the patch
//! * `0xFE`: end of stream
//!
//! The engine keeps four entry pointers per level, one per 0x100-tile
//! region, so the encoder pins the cursor to each region boundary it
//! crosses and records where in the stream that boundary falls.

use mmage_types::{Difficulty, UnitilePatch};

const REGION_BOUNDARIES: [u16; 4] = [0, 0x100, 0x200, 0x300];

/// End-of-stream marker. An advance token may never alias this value.
const EOS: u8 = 0xFE;

#[derive(Debug, Default)]
pub struct UnitileStream {
    pub bytes: Vec<u8>,
    /// Byte offset of each region boundary within the stream, if the
    /// stream reaches it.
    pub region_starts: [Option<usize>; 4],
}

impl UnitileStream {
    /// Serialized size; a stream holding nothing but the terminator
    /// is not stored at all.
    pub fn stored_len(&self) -> usize {
        if self.bytes.len() <= 1 { 0 } else { self.bytes.len() }
    }
}

struct Encoder {
    bytes: Vec<u8>,
    cur: u16,
    region_starts: [Option<usize>; 4],
    /// Index of the last patch's flags byte, still open for an advance
    /// to be folded into its low 5 bits.
    open_flags: Option<usize>,
}

impl Encoder {
    fn add(&mut self, pos: u16, entry: Option<(u8, u8)>) {
        for (j, &boundary) in REGION_BOUNDARIES.iter().enumerate() {
            if pos >= boundary && self.cur < boundary && entry.is_some() {
                // pin the cursor to the boundary so the region pointer
                // has a byte to land on
                self.add(boundary, None);
            }
            if self.cur == boundary && self.region_starts[j].is_none() {
                self.region_starts[j] = Some(self.bytes.len());
            }
        }

        while pos > self.cur {
            let mut adv = (pos - self.cur).min(0x41);
            if (0x20..0x41).contains(&adv) {
                adv = 0x1F;
            }
            if adv == 0x1E && self.open_flags.is_none() {
                // 0xE0 | 0x1E would alias the terminator
                adv -= 1;
            }
            if adv == 0x1D {
                // 0x1D is the code for 0x41
                adv -= 1;
            }
            self.cur += adv;
            let code = if adv == 0x41 { 0x1D } else { adv as u8 };
            match self.open_flags.take() {
                Some(k) => self.bytes[k] = (self.bytes[k] & 0xE0) | code,
                None => self.bytes.push(0xE0 | code),
            }
        }

        match entry {
            Some((flags, med)) => {
                self.bytes.push(flags);
                self.bytes.push(med);
                self.open_flags = Some(self.bytes.len() - 2);
            }
            None => self.open_flags = None,
        }
    }
}

/// Serializes a level's unitile patches.
pub fn encode(patches: &[UnitilePatch]) -> UnitileStream {
    let mut sorted: Vec<&UnitilePatch> = patches.iter().collect();
    sorted.sort_by_key(|p| p.linear_index());

    let mut enc = Encoder {
        bytes: Vec::new(),
        cur: 0,
        region_starts: [None; 4],
        open_flags: None,
    };
    for patch in sorted {
        // invisible patches have no representation
        if patch.absence_bits() == 0xE0 {
            continue;
        }
        if let Some(med) = patch.med_tile {
            enc.add(patch.linear_index(), Some((patch.absence_bits(), med)));
        }
    }
    enc.bytes.push(EOS);
    UnitileStream { bytes: enc.bytes, region_starts: enc.region_starts }
}

fn advance_of(code: u8) -> u16 {
    let code = u16::from(code & 0x1F);
    if code == 0x1D { 0x41 } else { code }
}

/// Parses a serialized stream back into patches. Stops at the
/// terminator; returns `None` if the bytes run out first.
pub fn decode(bytes: &[u8]) -> Option<Vec<UnitilePatch>> {
    let mut patches = Vec::new();
    let mut cur: u16 = 0;
    let mut it = bytes.iter();
    loop {
        let &b = it.next()?;
        if b == EOS {
            return Some(patches);
        }
        if b & 0xE0 == 0xE0 {
            cur += advance_of(b);
        } else {
            let &med = it.next()?;
            patches.push(UnitilePatch {
                x: (cur % 0x10) as u8,
                y: (cur / 0x10) as u8,
                med_tile: Some(med),
                visible_on: Difficulty::from_absence_bits(b & 0xE0),
            });
            cur += advance_of(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(x: u8, y: u8, med: u8, visible_on: Difficulty) -> UnitilePatch {
        UnitilePatch { x, y, med_tile: Some(med), visible_on }
    }

    #[test]
    fn empty_stream_is_not_stored() {
        let s = encode(&[]);
        assert_eq!(s.bytes, vec![EOS]);
        assert_eq!(s.stored_len(), 0);
        assert_eq!(s.region_starts, [Some(0), None, None, None]);
    }

    #[test]
    fn single_patch_round_trip() {
        let p = patch(3, 2, 0x4D, Difficulty::HARD);
        let s = encode(&[p]);
        // advance 0x23 splits as 0x1F + 4, then flags + med + terminator
        assert_eq!(s.bytes, vec![0xE0 | 0x1F, 0xE0 | 0x04, p.absence_bits(), 0x4D, EOS]);
        assert_eq!(decode(&s.bytes).unwrap(), vec![p]);
    }

    #[test]
    fn advance_folds_into_flags_byte() {
        let a = patch(0, 0, 0x10, Difficulty::all());
        let b = patch(5, 0, 0x11, Difficulty::all());
        let s = encode(&[a, b]);
        // the advance to the second patch rides in the first flags byte
        assert_eq!(
            s.bytes,
            vec![a.absence_bits() | 5, 0x10, b.absence_bits(), 0x11, EOS]
        );
        assert_eq!(decode(&s.bytes).unwrap(), vec![a, b]);
    }

    #[test]
    fn reserved_codes_are_never_emitted_standalone() {
        // advances of 0x1D and 0x1E would collide with the 0x41 code
        // and the terminator; both get split
        for gap in [0x1Du8, 0x1E] {
            let p = patch(gap % 0x10, gap / 0x10, 0x20, Difficulty::NORMAL);
            let s = encode(&[p]);
            assert!(!s.bytes[..s.bytes.len() - 1].contains(&EOS));
            assert!(!s.bytes.contains(&(0xE0 | 0x1D)));
            assert_eq!(decode(&s.bytes).unwrap(), vec![p]);
        }
    }

    #[test]
    fn long_advance_uses_the_0x41_code() {
        let p = patch(1, 8, 0x30, Difficulty::HELL);
        let s = encode(&[p]);
        // 0x81 = 0x41 + 0x40; the 0x41 leg is the 0x1D code and a folded
        // advance cannot occur since no patch precedes it
        assert_eq!(decode(&s.bytes).unwrap(), vec![p]);
        assert_eq!(s.bytes[0], 0xE0 | 0x1D);
    }

    #[test]
    fn region_boundaries_pin_the_cursor() {
        let a = patch(0, 2, 0x10, Difficulty::all());
        let b = patch(4, 0x22, 0x11, Difficulty::all());
        let s = encode(&[a, b]);
        let decoded = decode(&s.bytes).unwrap();
        assert_eq!(decoded, vec![a, b]);
        // region 0 starts at the stream head; region 2 (i = 0x200) has a
        // recorded offset; regions 1 and 3 are crossed or unreached
        assert_eq!(s.region_starts[0], Some(0));
        let r2 = s.region_starts[2].unwrap();
        // decoding from the region-2 offset with a rebased cursor finds
        // only the second patch
        let tail = decode(&s.bytes[r2..]).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].linear_index() + 0x200, b.linear_index());
        assert_eq!(tail[0].med_tile, b.med_tile);
    }

    #[test]
    fn invisible_patches_are_skipped() {
        let p = UnitilePatch {
            x: 1,
            y: 1,
            med_tile: Some(0x10),
            visible_on: Difficulty::empty(),
        };
        let s = encode(&[p]);
        assert_eq!(s.stored_len(), 0);
    }
}
