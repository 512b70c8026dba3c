//! Codec for the in-game text bank.
//!
//! Text is a stream of 5-bit codes: 0 is a space, 1 separates strings,
//! 2 prefixes an extended code, 3 is `%` (the player glyph), and 4..
//! index the alphabet. Extended codes continue the alphabet from index
//! 0x1A; under the mapper extension, extended codes of 0x13 and above
//! select a diacritic from a small table instead, written in text as a
//! `\dXX` escape.

use mmage_types::{STRING_COUNT, TextBank};

use crate::bitstream::{BitReader, BitWriter, StreamError, read_byte, write_byte};
use crate::layout::{self, Layout};

const MARKER: u32 = 1;
/// First extended code that selects a diacritic rather than a letter.
const DIACRITIC_BASE: u8 = 0x13;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("text symbol {0:?} is not in the alphabet")]
    InvalidSymbol(String),
    #[error("alphabet index {0:#x} cannot be encoded in an extended code")]
    SymbolOutOfRange(usize),
    #[error("diacritics need the mapper extension")]
    DiacriticsNeedExtension,
    #[error("too many unique diacritics; the table holds {0}")]
    TooManyDiacritics(usize),
    #[error("text section exceeds its window ({need:#x} > {limit:#x})")]
    Range { need: usize, limit: usize },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

fn diacritics_capacity() -> usize {
    usize::from(layout::DIACRITICS_TABLE_RANGE.1 - layout::DIACRITICS_TABLE_RANGE.0)
}

pub fn read(bin: &[u8], layout: Layout) -> Result<TextBank, TextError> {
    let mut bank = TextBank::default();
    let alphabet: Vec<char> = bank.alphabet.chars().collect();
    let mut r = BitReader::new(bin, layout.ram_to_rom(layout::TEXT_RANGE.0));

    // leading marker
    while r.read_bits(5)? != MARKER {}

    bank.strings.clear();
    for _ in 0..STRING_COUNT {
        let mut text = String::new();
        loop {
            match r.read_bits(5)? {
                0 => text.push(' '),
                MARKER => break,
                2 => {
                    let b = r.read_bits(5)? as u8;
                    if layout.extended && b >= DIACRITIC_BASE {
                        let slot = layout::DIACRITICS_TABLE_RANGE.0
                            + u16::from(b - DIACRITIC_BASE);
                        let diacritic = read_byte(bin, layout.ram_to_rom(slot))?;
                        text.push_str(&format!("\\d{diacritic:02X}"));
                    } else if let Some(&c) = alphabet.get(usize::from(b) + 0x1A) {
                        text.push(c);
                    }
                }
                3 => text.push('%'),
                b => {
                    if let Some(&c) = alphabet.get(b as usize - 4) {
                        text.push(c);
                    }
                }
            }
        }
        bank.strings.push(text);
    }
    Ok(bank)
}

pub fn commit(bank: &TextBank, bin: &mut [u8], layout: Layout) -> Result<(), TextError> {
    let alphabet: Vec<char> = bank.alphabet.chars().collect();
    let start = layout.ram_to_rom(layout::TEXT_RANGE.0);
    let end = layout.ram_to_rom(layout::TEXT_RANGE.1);
    let mut w = BitWriter::new(bin, start);
    let mut diacritics: Vec<u8> = Vec::new();
    let mut pending_diacritics: Vec<(u16, u8)> = Vec::new();

    for text in bank.strings.iter().take(STRING_COUNT) {
        w.write_bits(MARKER, 5)?;
        let chars: Vec<char> = text.chars().collect();
        let mut j = 0;
        while j < chars.len() {
            let c = chars[j];
            j += 1;
            match c {
                ' ' => w.write_bits(0, 5)?,
                '%' | '\n' => w.write_bits(3, 5)?,
                '\\' if chars.get(j) == Some(&'d') => {
                    let hex: String = chars.iter().skip(j + 1).take(2).collect();
                    let diacritic = u8::from_str_radix(&hex, 16)
                        .map_err(|_| TextError::InvalidSymbol(format!("\\d{hex}")))?;
                    j += 3;
                    if !layout.extended {
                        return Err(TextError::DiacriticsNeedExtension);
                    }
                    let idx = match diacritics.iter().position(|&d| d == diacritic) {
                        Some(idx) => idx,
                        None => {
                            if diacritics.len() >= diacritics_capacity() {
                                return Err(TextError::TooManyDiacritics(diacritics_capacity()));
                            }
                            diacritics.push(diacritic);
                            let slot = layout::DIACRITICS_TABLE_RANGE.0
                                + (diacritics.len() - 1) as u16;
                            pending_diacritics.push((slot, diacritic));
                            diacritics.len() - 1
                        }
                    };
                    w.write_bits(2, 5)?;
                    w.write_bits(u32::from(DIACRITIC_BASE) + idx as u32, 5)?;
                }
                _ => match alphabet.iter().position(|&a| a == c) {
                    Some(i) if i <= 0x1B => w.write_bits(i as u32 + 4, 5)?,
                    Some(i) => {
                        if i - 0x1A >= usize::from(DIACRITIC_BASE) {
                            return Err(TextError::SymbolOutOfRange(i));
                        }
                        w.write_bits(2, 5)?;
                        w.write_bits((i - 0x1A) as u32, 5)?;
                    }
                    None => return Err(TextError::InvalidSymbol(c.to_string())),
                },
            }
        }
    }
    // terminate the last string
    w.write_bits(MARKER, 5)?;

    let need = w.first_untouched_byte();
    if need > end {
        return Err(TextError::Range { need, limit: end });
    }
    for (slot, diacritic) in pending_diacritics {
        write_byte(bin, layout.ram_to_rom(slot), diacritic)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BASE_ROM_LEN, EXTENDED_ROM_LEN};

    fn bank_with(strings: &[&str]) -> TextBank {
        let mut bank = TextBank::default();
        bank.strings = strings.iter().map(|s| s.to_string()).collect();
        while bank.strings.len() < STRING_COUNT {
            bank.strings.push(String::new());
        }
        bank
    }

    #[test]
    fn commit_then_read_round_trips() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let bank = bank_with(&["HELLO WORLD", "READY%", "A-1"]);
        commit(&bank, &mut bin, Layout::BASE).unwrap();
        let back = read(&bin, Layout::BASE).unwrap();
        assert_eq!(back.strings[..3], bank.strings[..3]);
        assert_eq!(back.strings.len(), STRING_COUNT);
    }

    #[test]
    fn extended_codes_cover_the_alphabet_tail() {
        // '1' sits past index 0x1B and needs the two-code form
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let bank = bank_with(&["123"]);
        commit(&bank, &mut bin, Layout::BASE).unwrap();
        let back = read(&bin, Layout::BASE).unwrap();
        assert_eq!(back.strings[0], "123");
    }

    #[test]
    fn unknown_symbols_are_refused() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let bank = bank_with(&["J"]);
        let err = commit(&bank, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, TextError::InvalidSymbol(_)));
    }

    #[test]
    fn diacritics_round_trip_under_the_extension() {
        let mut bin = vec![0u8; EXTENDED_ROM_LEN];
        let bank = bank_with(&["GO\\dA2GO", "\\dA2 \\d07"]);
        commit(&bank, &mut bin, Layout::EXTENDED).unwrap();
        let back = read(&bin, Layout::EXTENDED).unwrap();
        assert_eq!(back.strings[0], "GO\\dA2GO");
        assert_eq!(back.strings[1], "\\dA2 \\d07");
        // table holds each unique diacritic once
        let table = Layout::EXTENDED.ram_to_rom(layout::DIACRITICS_TABLE_RANGE.0);
        assert_eq!(bin[table], 0xA2);
        assert_eq!(bin[table + 1], 0x07);
    }

    #[test]
    fn diacritics_without_extension_are_refused() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let bank = bank_with(&["\\d01"]);
        let err = commit(&bank, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, TextError::DiacriticsNeedExtension));
    }

    #[test]
    fn overlong_text_is_refused() {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let long = "A".repeat(0x20);
        let strings: Vec<&str> = (0..STRING_COUNT).map(|_| long.as_str()).collect();
        let bank = bank_with(&strings);
        let err = commit(&bank, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, TextError::Range { .. }));
    }
}
