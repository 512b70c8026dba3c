//! Codec for the music bank.
//!
//! The bank opens with one header per song (a 4-bit tempo plus four
//! 12-bit channel entry addresses) followed by a single shared nibble
//! stream of code. Addresses are in nibbles from the start of the bank.
//!
//! Nibble values 0-7 are note codes: the value indexes the engine's
//! duration table and the following nibble selects the pitch, with 0xF
//! escaping to the opcode of the same value. Values 8-15 are always
//! opcodes.
//!
//! Commit runs in two passes: the first lays out every item's address
//! from its fixed nibble width and collects label definitions, the
//! second emits nibbles and resolves targets against that table.

use std::collections::HashMap;

use mmage_types::{
    MusicArg, MusicArgKind, MusicCommand, MusicData, MusicItem, MusicOpcode, MusicTarget,
    NotePitch, Song, VCHANNEL_COUNT,
};

use crate::bitstream::{NibbleReader, NibbleWriter, StreamError, read_byte};
use crate::layout::{self, Layout};
use crate::tables::{SONG_NAMES, VCHANNEL_NAMES};

/// Nibbles per song header: tempo plus four 3-nibble entry addresses.
const HEADER_NIBBLES: u16 = 1 + 3 * VCHANNEL_COUNT as u16;
const DURATION_TABLE_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum MusicError {
    #[error("label {0:?} is not defined anywhere in the code")]
    UnknownLabel(String),
    #[error("note duration {0:#x} is not in the engine's duration table")]
    BadDuration(u8),
    #[error("{op:?} target is {distance:#x} nibbles back; the engine reaches at most 0xff")]
    TargetTooFar { op: MusicOpcode, distance: i32 },
    #[error("{op:?} takes {expect} arguments, found {found}")]
    ArgCount { op: MusicOpcode, expect: usize, found: usize },
    #[error("{op:?} argument {idx} has the wrong shape")]
    ArgShape { op: MusicOpcode, idx: usize },
    #[error("music code exceeds its window at nibble {addr:#x}")]
    Range { addr: u16 },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

fn duration_table(bin: &[u8], layout: Layout) -> Result<[u8; DURATION_TABLE_LEN], StreamError> {
    let rom = layout.ram_to_rom(layout::MUSIC_DURATION_TABLE);
    let mut table = [0u8; DURATION_TABLE_LEN];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = read_byte(bin, rom + i)?;
    }
    Ok(table)
}

/// Highest nibble address still inside the music window.
fn in_window(addr: u16) -> bool {
    layout::MUSIC_RANGE.0 + addr / 2 < layout::MUSIC_RANGE.1
}

fn read_addr(r: &mut NibbleReader<'_>) -> Result<u16, StreamError> {
    // low nibble first
    let mut addr = 0u16;
    for _ in 0..3 {
        addr >>= 4;
        addr |= u16::from(r.read_nibble()?) << 8;
    }
    Ok(addr)
}

pub fn read(bin: &[u8], layout: Layout) -> Result<MusicData, MusicError> {
    let start = layout.ram_to_rom(layout::MUSIC_RANGE.0);
    let end = layout.ram_to_rom(layout::MUSIC_RANGE.1);
    let durations = duration_table(bin, layout)?;

    let mut r = NibbleReader::new(bin, start);
    let mut headers = Vec::with_capacity(SONG_NAMES.len());
    for _ in SONG_NAMES {
        let tempo = r.read_nibble()?;
        let mut entries = [0u16; VCHANNEL_COUNT];
        for i in (0..VCHANNEL_COUNT).rev() {
            entries[i] = read_addr(&mut r)?;
        }
        headers.push((tempo, entries));
    }
    let code_start = r.nibble_pos();

    // first pass: raw targets, remembering where each item starts
    let mut code = Vec::new();
    let mut item_addrs = Vec::new();
    // (item, arg, name prefix) for every in-window reference
    let mut refs: Vec<(usize, usize, &'static str)> = Vec::new();
    while r.byte_pos() < end {
        item_addrs.push(r.nibble_pos());
        let opc = r.read_nibble()?;
        let op = match MusicOpcode::from_repr(opc) {
            Some(op) if !op.needs_escape() => op,
            _ => {
                let postfix = r.read_nibble()?;
                if postfix != 0xF {
                    let pitch = match postfix {
                        0xD => NotePitch::Tie,
                        0xE => NotePitch::Portamento,
                        tone => NotePitch::Tone(tone),
                    };
                    let duration = durations[usize::from(opc)];
                    code.push(MusicItem::new(MusicCommand::Note { pitch, duration }));
                    continue;
                }
                // the 0xF postfix escapes to the opcode itself
                match MusicOpcode::from_repr(opc) {
                    Some(op) => op,
                    None => unreachable!("nibble {opc} is below 8"),
                }
            }
        };

        let mut args = Vec::with_capacity(op.arg_kinds().len());
        for kind in op.arg_kinds() {
            match kind {
                MusicArgKind::Nibble => args.push(MusicArg::Nibble(r.read_nibble()?)),
                MusicArgKind::Byte => {
                    let hi = r.read_nibble()?;
                    let lo = r.read_nibble()?;
                    args.push(MusicArg::Byte(hi << 4 | lo));
                }
                MusicArgKind::Abs => {
                    let addr = read_addr(&mut r)?;
                    if in_window(addr) {
                        refs.push((code.len(), args.len(), "label"));
                    }
                    args.push(MusicArg::Target(MusicTarget::Addr(addr)));
                }
                MusicArgKind::RelBack => {
                    let pos = r.nibble_pos();
                    let lo = r.read_nibble()?;
                    let hi = r.read_nibble()?;
                    let back = u16::from(hi) << 4 | u16::from(lo);
                    let addr = (pos + 2).wrapping_sub(back);
                    if in_window(addr) {
                        let prefix = if op == MusicOpcode::Rep { "rep" } else { "sub" };
                        refs.push((code.len(), args.len(), prefix));
                    }
                    args.push(MusicArg::Target(MusicTarget::Addr(addr)));
                }
            }
        }
        code.push(MusicItem::new(MusicCommand::Op { op, args }));
    }

    let by_addr: HashMap<u16, usize> =
        item_addrs.iter().enumerate().map(|(i, &a)| (a, i)).collect();
    let mut define = |code: &mut Vec<MusicItem>, addr: u16, name: String| -> Option<String> {
        let &i = by_addr.get(&addr)?;
        if !code[i].labels.contains(&name) {
            code[i].labels.push(name.clone());
        }
        Some(name)
    };

    // symbolic code references where an item starts at the address
    for (item, arg, prefix) in refs {
        let MusicCommand::Op { args, .. } = &code[item].command else { continue };
        let MusicArg::Target(MusicTarget::Addr(addr)) = args[arg] else { continue };
        if let Some(name) = define(&mut code, addr, format!("{prefix}{addr:X}")) {
            let MusicCommand::Op { args, .. } = &mut code[item].command else { continue };
            args[arg] = MusicArg::Target(MusicTarget::Label(name));
        }
    }

    let mut songs = Vec::with_capacity(headers.len());
    for (song_idx, (tempo, entries)) in headers.into_iter().enumerate() {
        let name = SONG_NAMES[song_idx].to_string();
        let channel_entries = std::array::from_fn(|i| {
            let label = format!("entry_{}_{}", name, VCHANNEL_NAMES[i]);
            match define(&mut code, entries[i], label) {
                Some(label) => MusicTarget::Label(label),
                None => MusicTarget::Addr(entries[i]),
            }
        });
        songs.push(Song { name, tempo, channel_entries });
    }

    Ok(MusicData { songs, code, code_start })
}

struct Assembler {
    labels: HashMap<String, u16>,
}

impl Assembler {
    fn layout(music: &MusicData) -> Self {
        let mut labels = HashMap::new();
        let mut addr = HEADER_NIBBLES * music.songs.len() as u16;
        for item in &music.code {
            for label in &item.labels {
                labels.insert(label.clone(), addr);
            }
            addr += item.command.nibble_len();
        }
        Assembler { labels }
    }

    fn resolve(&self, target: &MusicTarget) -> Result<u16, MusicError> {
        match target {
            MusicTarget::Addr(addr) => Ok(*addr),
            MusicTarget::Label(name) => self
                .labels
                .get(name)
                .copied()
                .ok_or_else(|| MusicError::UnknownLabel(name.clone())),
        }
    }

    fn emit(
        &self,
        item: &MusicCommand,
        addr: u16,
        durations: &[u8; DURATION_TABLE_LEN],
    ) -> Result<Vec<u8>, MusicError> {
        let mut nibbles = Vec::new();
        match item {
            MusicCommand::Note { pitch, duration } => {
                let idx = durations
                    .iter()
                    .position(|&d| d == *duration)
                    .ok_or(MusicError::BadDuration(*duration))?;
                nibbles.push(idx as u8);
                nibbles.push(match pitch {
                    NotePitch::Tie => 0xD,
                    NotePitch::Portamento => 0xE,
                    NotePitch::Tone(t) => *t,
                });
            }
            MusicCommand::Op { op, args } => {
                nibbles.push(*op as u8);
                if op.needs_escape() {
                    nibbles.push(0xF);
                }
                let kinds = op.arg_kinds();
                if kinds.len() != args.len() {
                    return Err(MusicError::ArgCount {
                        op: *op,
                        expect: kinds.len(),
                        found: args.len(),
                    });
                }
                for (idx, (kind, arg)) in kinds.iter().zip(args).enumerate() {
                    match (kind, arg) {
                        (MusicArgKind::Nibble, MusicArg::Nibble(v)) => nibbles.push(v & 0xF),
                        (MusicArgKind::Byte, MusicArg::Byte(v)) => {
                            nibbles.push(v >> 4);
                            nibbles.push(v & 0xF);
                        }
                        (MusicArgKind::Abs, MusicArg::Target(t)) => {
                            let target = self.resolve(t)?;
                            nibbles.push((target & 0xF) as u8);
                            nibbles.push((target >> 4 & 0xF) as u8);
                            nibbles.push((target >> 8 & 0xF) as u8);
                        }
                        (MusicArgKind::RelBack, MusicArg::Target(t)) => {
                            let target = self.resolve(t)?;
                            let distance =
                                i32::from(addr) + nibbles.len() as i32 + 2 - i32::from(target);
                            if !(0..0x100).contains(&distance) {
                                return Err(MusicError::TargetTooFar { op: *op, distance });
                            }
                            nibbles.push((distance & 0xF) as u8);
                            nibbles.push((distance >> 4) as u8);
                        }
                        _ => return Err(MusicError::ArgShape { op: *op, idx }),
                    }
                }
            }
        }
        Ok(nibbles)
    }
}

pub fn commit(music: &MusicData, bin: &mut [u8], layout: Layout) -> Result<(), MusicError> {
    let start = layout.ram_to_rom(layout::MUSIC_RANGE.0);
    let end = layout.ram_to_rom(layout::MUSIC_RANGE.1);
    let durations = duration_table(bin, layout)?;
    let asm = Assembler::layout(music);

    let mut w = NibbleWriter::new(bin, start);
    for song in &music.songs {
        w.write_nibble(song.tempo & 0xF)?;
        for entry in song.channel_entries.iter().rev() {
            let addr = asm.resolve(entry)?;
            for j in 0..3 {
                w.write_nibble((addr >> (4 * j) & 0xF) as u8)?;
            }
        }
    }

    let mut addr = HEADER_NIBBLES * music.songs.len() as u16;
    for item in &music.code {
        for nibble in asm.emit(&item.command, addr, &durations)? {
            if w.byte_pos() >= end {
                return Err(MusicError::Range { addr: w.nibble_pos() });
            }
            w.write_nibble(nibble)?;
        }
        addr += item.command.nibble_len();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BASE_ROM_LEN;

    const DURATIONS: [u8; 8] = [1, 2, 3, 4, 6, 8, 0x10, 0x20];

    fn bin_with_durations() -> Vec<u8> {
        let mut bin = vec![0u8; BASE_ROM_LEN];
        let rom = Layout::BASE.ram_to_rom(layout::MUSIC_DURATION_TABLE);
        bin[rom..rom + 8].copy_from_slice(&DURATIONS);
        bin
    }

    fn note(tone: u8, duration: u8) -> MusicCommand {
        MusicCommand::Note { pitch: NotePitch::Tone(tone), duration }
    }

    fn music_fixture() -> MusicData {
        let code_start = HEADER_NIBBLES * SONG_NAMES.len() as u16;
        let mut code = vec![
            MusicItem {
                labels: vec!["top".into()],
                command: note(4, 6),
            },
            MusicItem::new(note(2, 0x20)),
            MusicItem::new(MusicCommand::Op {
                op: MusicOpcode::Dyn,
                args: vec![MusicArg::Nibble(3)],
            }),
            MusicItem::new(MusicCommand::Op {
                op: MusicOpcode::Sub,
                args: vec![
                    MusicArg::Nibble(2),
                    MusicArg::Target(MusicTarget::Label("top".into())),
                    MusicArg::Nibble(1),
                ],
            }),
            MusicItem::new(MusicCommand::Op {
                op: MusicOpcode::Jmp,
                args: vec![MusicArg::Target(MusicTarget::Label("top".into()))],
            }),
        ];
        code[0].labels.push("entry_all".into());

        let songs = SONG_NAMES
            .iter()
            .map(|&name| Song {
                name: name.to_string(),
                tempo: 9,
                channel_entries: std::array::from_fn(|_| {
                    MusicTarget::Label("entry_all".into())
                }),
            })
            .collect();
        MusicData { songs, code, code_start }
    }

    #[test]
    fn headers_store_entries_low_nibble_first() {
        let mut bin = bin_with_durations();
        let music = music_fixture();
        commit(&music, &mut bin, Layout::BASE).unwrap();

        let rom = Layout::BASE.ram_to_rom(layout::MUSIC_RANGE.0);
        // code_start = 9 * 13 = 117 = 0x075; first header nibble is the
        // tempo, then the noise channel entry: 5, 7, 0
        assert_eq!(bin[rom], 0x95);
        assert_eq!(bin[rom + 1], 0x70);
    }

    #[test]
    fn commit_then_read_round_trips() {
        let mut bin = bin_with_durations();
        let music = music_fixture();
        commit(&music, &mut bin, Layout::BASE).unwrap();
        let back = read(&bin, Layout::BASE).unwrap();

        assert_eq!(back.songs.len(), SONG_NAMES.len());
        assert_eq!(back.code_start, music.code_start);
        for song in &back.songs {
            assert_eq!(song.tempo, 9);
            // all channels resolve to the first code item
            for entry in &song.channel_entries {
                assert!(matches!(entry, MusicTarget::Label(_)));
            }
        }
        let first = &back.songs[0];
        assert_eq!(
            first.channel_entries[0],
            MusicTarget::Label("entry_Mysterious_Lead".into())
        );
        assert!(back.code[0].labels.contains(&"entry_Mysterious_Lead".to_string()));

        // the window's zero padding decodes as extra zero-duration notes
        let decoded = &back.code[..music.code.len()];
        assert_eq!(decoded[0].command, note(4, 6));
        assert_eq!(decoded[1].command, note(2, 0x20));
        assert_eq!(
            decoded[2].command,
            MusicCommand::Op { op: MusicOpcode::Dyn, args: vec![MusicArg::Nibble(3)] }
        );
        // back-reference and jump both return as labels on item 0
        let MusicCommand::Op { op: MusicOpcode::Sub, args } = &decoded[3].command else {
            panic!("expected sub, got {:?}", decoded[3].command);
        };
        let MusicArg::Target(MusicTarget::Label(sub_label)) = &args[1] else {
            panic!("expected label target");
        };
        assert!(back.code[0].labels.contains(sub_label));
        let MusicCommand::Op { op: MusicOpcode::Jmp, args } = &decoded[4].command else {
            panic!("expected jmp, got {:?}", decoded[4].command);
        };
        assert_eq!(
            args[0],
            MusicArg::Target(MusicTarget::Label(format!("label{:X}", music.code_start)))
        );
    }

    #[test]
    fn escaped_opcodes_survive() {
        let mut bin = bin_with_durations();
        let mut music = music_fixture();
        music.code.truncate(2);
        music.code.push(MusicItem::new(MusicCommand::Op {
            op: MusicOpcode::Art,
            args: vec![MusicArg::Nibble(7)],
        }));
        commit(&music, &mut bin, Layout::BASE).unwrap();
        let back = read(&bin, Layout::BASE).unwrap();
        assert_eq!(
            back.code[2].command,
            MusicCommand::Op { op: MusicOpcode::Art, args: vec![MusicArg::Nibble(7)] }
        );
    }

    #[test]
    fn unknown_duration_is_an_error() {
        let mut bin = bin_with_durations();
        let mut music = music_fixture();
        music.code[1] = MusicItem::new(note(0, 5));
        let err = commit(&music, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, MusicError::BadDuration(5)));
    }

    #[test]
    fn forward_subroutine_target_is_refused() {
        let mut bin = bin_with_durations();
        let mut music = music_fixture();
        // point the back-reference at a label defined after it
        music.code.push(MusicItem {
            labels: vec!["below".into()],
            command: note(0, 1),
        });
        let MusicCommand::Op { args, .. } = &mut music.code[3].command else {
            unreachable!();
        };
        args[1] = MusicArg::Target(MusicTarget::Label("below".into()));
        let err = commit(&music, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, MusicError::TargetTooFar { op: MusicOpcode::Sub, .. }));
    }

    #[test]
    fn oversized_code_is_refused() {
        let mut bin = bin_with_durations();
        let mut music = music_fixture();
        music.code.truncate(2);
        // the window holds 0x60a bytes; pack it past full with notes
        for _ in 0..0x800 {
            music.code.push(MusicItem::new(note(1, 2)));
        }
        let err = commit(&music, &mut bin, Layout::BASE).unwrap_err();
        assert!(matches!(err, MusicError::Range { .. }));
    }
}
