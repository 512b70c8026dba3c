use serde::Serialize;
use strum::{AsRefStr, EnumCount, EnumIter, FromRepr};

/// Musical virtual channels; the engine has two more for sound effects.
pub const VCHANNEL_COUNT: usize = 4;

/// Music engine opcodes, in nibble-value order. Values 0-7 double as note
/// codes: they only execute as opcodes when followed by an 0xF postfix
/// nibble.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter, EnumCount, AsRefStr,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum MusicOpcode {
    Hold0 = 0,
    Hold1 = 1,
    Hold2 = 2,
    Art = 3,
    Port = 4,
    Harm = 5,
    Jmp = 6,
    Nop = 7,
    Dyn = 8,
    Mod = 9,
    Rts = 10,
    Sub = 11,
    Ctl = 12,
    Doct = 13,
    Rep = 14,
    Orch = 15,
}

/// Shape of one opcode argument in the nibble stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MusicArgKind {
    /// One nibble.
    Nibble,
    /// Two nibbles, high first.
    Byte,
    /// A 12-bit nibble address, stored low nibble first.
    Abs,
    /// Two nibbles (low first) subtracted from the current position; the
    /// target must be at most 0x100 nibbles behind.
    RelBack,
}

impl MusicOpcode {
    pub fn arg_kinds(self) -> &'static [MusicArgKind] {
        use MusicArgKind::*;
        match self {
            Self::Hold0 | Self::Hold1 | Self::Hold2 | Self::Nop | Self::Rts | Self::Doct => &[],
            Self::Art | Self::Harm | Self::Dyn => &[Nibble],
            Self::Port | Self::Ctl => &[Nibble, Nibble],
            Self::Jmp => &[Abs],
            Self::Mod => &[Byte],
            Self::Sub => &[Nibble, RelBack, Nibble],
            Self::Rep => &[Nibble, RelBack],
            Self::Orch => &[Nibble, Nibble, Nibble],
        }
    }

    /// Whether the opcode value collides with the note range and must be
    /// followed by an 0xF escape nibble.
    pub fn needs_escape(self) -> bool {
        (self as u8) < 8
    }
}

/// A code-relative reference, either symbolic or a raw nibble address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MusicTarget {
    Label(String),
    Addr(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MusicArg {
    Nibble(u8),
    Byte(u8),
    Target(MusicTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotePitch {
    /// Scale degree 0-0xC relative to the current key.
    Tone(u8),
    Tie,
    Portamento,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MusicCommand {
    /// Play or hold a note. `duration` is the raw frame count; it must
    /// appear in the engine's duration table.
    Note { pitch: NotePitch, duration: u8 },
    Op { op: MusicOpcode, args: Vec<MusicArg> },
}

impl MusicCommand {
    /// Encoded width in nibbles. Fixed per command, which is what makes
    /// single-pass layout possible.
    pub fn nibble_len(&self) -> u16 {
        match self {
            Self::Note { .. } => 2,
            Self::Op { op, .. } => {
                let mut n = 1;
                if op.needs_escape() {
                    n += 1;
                }
                for kind in op.arg_kinds() {
                    n += match kind {
                        MusicArgKind::Nibble => 1,
                        MusicArgKind::Byte | MusicArgKind::RelBack => 2,
                        MusicArgKind::Abs => 3,
                    };
                }
                n
            }
        }
    }
}

/// One line of music code: a command plus any labels defined at its
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MusicItem {
    pub labels: Vec<String>,
    pub command: MusicCommand,
}

impl MusicItem {
    pub fn new(command: MusicCommand) -> Self {
        Self { labels: Vec::new(), command }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    pub name: String,
    pub tempo: u8,
    /// Entry point per musical v-channel.
    #[serde(rename = "channel-entries")]
    pub channel_entries: [MusicTarget; VCHANNEL_COUNT],
}

/// The whole music bank: song headers plus a single shared code stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MusicData {
    pub songs: Vec<Song>,
    pub code: Vec<MusicItem>,
    /// Nibble offset of the first code item from the start of the bank.
    #[serde(rename = "code-start")]
    pub code_start: u16,
}
