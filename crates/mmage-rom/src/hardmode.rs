//! Codec for a level's hardmode patch list.
//!
//! Each byte is `(tile << 4) | gap`: the engine walks a cursor over the
//! 4-wide macro-tile grid (`pos = y * 4 + x`), advancing by `gap + 1` per
//! byte and applying the high nibble as a macro-tile override when it is
//! nonzero. Gap 0x0F is a plain skip when the previous byte carried a
//! tile, but chains with the next byte otherwise.

use mmage_types::HardPatch;

/// Encoder state for the gap bytes. Positions must be fed in ascending
/// order; `produce` handles the sort.
struct GapWriter {
    bytes: Vec<u8>,
    cur: u16,
}

impl GapWriter {
    fn new() -> Self {
        GapWriter { bytes: Vec::new(), cur: 0 }
    }

    fn advance(&mut self, pos: u16) {
        if pos == self.cur {
            return;
        }
        if self.bytes.is_empty() {
            self.bytes.push(0);
        }
        loop {
            let diff = pos - self.cur - 1;
            let last = self.bytes.len() - 1;
            let prev_zero = self.bytes[last] & 0xF0 == 0;
            if diff < 0x0F || (diff == 0x0F && !prev_zero) {
                self.bytes[last] |= diff as u8;
                self.cur = pos;
                return;
            }
            // gap 0x0F after a tile byte only moves 0x0F; after a zero
            // byte the chain continues, moving 0x10
            if pos - self.cur == 0x0F || self.bytes.len() == 1 {
                self.bytes[last] |= 0x0E;
                self.cur += 0x0F;
            } else {
                self.bytes[last] |= 0x0F;
                self.cur += 0x10;
            }
            if pos == self.cur {
                return;
            }
            self.bytes.push(0);
        }
    }
}

/// Serializes hardmode patches. The stream always covers position 0x80
/// (the top of the visible level) so the engine's cursor terminates.
pub fn encode(patches: &[HardPatch]) -> Vec<u8> {
    let mut sorted: Vec<&HardPatch> = patches.iter().collect();
    sorted.sort_by_key(|p| p.position());

    let mut w = GapWriter::new();
    let mut last_pos = None;
    for patch in sorted {
        w.advance(patch.position());
        w.bytes.push(patch.i << 4);
        last_pos = Some(patch.position());
    }
    if last_pos.is_none_or(|p| p < 0x80) {
        w.advance(0x80);
    }
    w.bytes
}

/// Walks a serialized patch list back into patches.
pub fn decode(bytes: &[u8]) -> Vec<HardPatch> {
    let mut patches = Vec::new();
    let mut pos: u16 = 0;
    for &b in bytes {
        let i = b >> 4;
        if i != 0 {
            patches.push(HardPatch { x: (pos % 4) as u8, y: (pos / 4) as u8, i });
        }
        pos += u16::from(b & 0x0F) + 1;
    }
    patches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_still_reaches_the_top() {
        let bytes = encode(&[]);
        assert!(!bytes.is_empty());
        let mut pos = 0u16;
        for &b in &bytes {
            assert_eq!(b & 0xF0, 0);
            pos += u16::from(b & 0x0F) + 1;
        }
        assert_eq!(pos, 0x80);
        assert!(decode(&bytes).is_empty());
    }

    #[test]
    fn round_trip_is_sorted_by_position() {
        let patches = vec![
            HardPatch { x: 2, y: 9, i: 3 },
            HardPatch { x: 0, y: 0, i: 1 },
            HardPatch { x: 3, y: 0x1F, i: 7 },
            HardPatch { x: 1, y: 9, i: 2 },
        ];
        let bytes = encode(&patches);
        let decoded = decode(&bytes);
        let mut expected = patches.clone();
        expected.sort_by_key(|p| p.position());
        assert_eq!(decoded, expected);
    }

    #[test]
    fn adjacent_patches_use_zero_gaps() {
        let patches = vec![
            HardPatch { x: 0, y: 0, i: 1 },
            HardPatch { x: 1, y: 0, i: 2 },
            HardPatch { x: 2, y: 0, i: 3 },
        ];
        let bytes = encode(&patches);
        assert_eq!(&bytes[..3], &[0x10, 0x20, 0x30]);
        assert_eq!(decode(&bytes), patches);
    }

    #[test]
    fn long_gap_chains_through_maximum_skips() {
        // a single patch far up the level forces chained skip bytes
        let patches = vec![HardPatch { x: 0, y: 0x18, i: 5 }];
        let bytes = encode(&patches);
        assert_eq!(decode(&bytes), patches);
        // leading skips carry no tile nibble
        let tile_idx = bytes.iter().position(|&b| b & 0xF0 != 0).unwrap();
        assert!(bytes[..tile_idx].iter().all(|&b| b & 0xF0 == 0));
    }

    #[test]
    fn gap_of_exactly_fifteen_from_start() {
        // pos 0x0F from a fresh stream takes the short chain rule
        let patches = vec![HardPatch { x: 3, y: 3, i: 4 }];
        let bytes = encode(&patches);
        assert_eq!(decode(&bytes), patches);
    }
}
