use serde::Serialize;

/// Character table matching the letter order in CHR-ROM. The first 24
/// entries are reachable directly from a 5-bit code; the rest need the
/// extended-character escape.
pub const DEFAULT_ALPHABET: &str = "EOSRATINMLDHYCGUFP-.W!V:'BKZ@X123456789";

/// Number of compressed strings in the text bank.
pub const STRING_COUNT: usize = 29;

/// The game's compressed strings plus the character table they are encoded
/// against. Strings use `%` for a line break and `\dXX` for a diacritic
/// (mapper extension only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBank {
    pub strings: Vec<String>,
    pub alphabet: String,
}

impl Default for TextBank {
    fn default() -> Self {
        Self { strings: Vec::new(), alphabet: DEFAULT_ALPHABET.to_owned() }
    }
}
