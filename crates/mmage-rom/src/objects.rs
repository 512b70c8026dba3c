//! Codec for the per-level object placement stream.
//!
//! The stream is a sequence of 2-bit tokens walking the level top-down:
//!
//! * `00` + 3 bits: move down by value+1 micro-tile rows
//! * `10` + 4-bit half-x + 4-bit spawn slot: the short format; only odd x
//!   positions and the first 16 spawnable slots are reachable
//! * `01` + flip-y + flip-x + 5-bit x + 5-bit spawn slot (or a 6-bit raw
//!   object id when the extended-objects mod is active)
//! * `11`: end of stream

use mmage_types::LevelObject;

use crate::bitstream::{BitBuf, BitReader, StreamError};

#[derive(Debug, thiserror::Error)]
pub enum ObjectStreamError {
    #[error("object gid {gid:#04x} is not in the spawnable table")]
    NotSpawnable { gid: u8 },
    #[error("object gid {gid:#04x} does not fit the 6-bit extended field")]
    GidTooLarge { gid: u8 },
    #[error("object x {x:#04x} does not fit the 5-bit coordinate field")]
    XTooLarge { x: u8 },
    #[error("object y {y:#04x} is above the stream start y {start_y:#04x}")]
    YAboveStart { y: u8, start_y: u8 },
    #[error("spawn slot {slot:#04x} has no entry in the spawnable table")]
    BadSlot { slot: u8 },
    #[error("drop object at y {y:#04x} maps outside the screen window")]
    DropOutOfRange { y: u8 },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Spawnable-table slot of `gid`, if any.
pub fn spawn_slot(spawnable: &[u8], gid: u8) -> Option<u8> {
    spawnable.iter().position(|&g| g == gid).map(|i| i as u8)
}

/// Whether an object can use the short format.
pub fn compressible(obj: &LevelObject, spawnable: &[u8]) -> bool {
    if obj.flip_x || obj.flip_y {
        return false;
    }
    if obj.x % 2 == 0 {
        return false;
    }
    matches!(spawn_slot(spawnable, obj.gid), Some(slot) if slot < 0x10)
}

/// Encodes the non-drop objects of a level. Objects are emitted sorted by
/// descending y; the row-skip token moves at most 8 rows at a time.
pub fn encode(
    objects: &[LevelObject],
    spawnable: &[u8],
    extended: bool,
    start_y: u8,
) -> Result<BitBuf, ObjectStreamError> {
    let mut sorted: Vec<&LevelObject> = objects.iter().filter(|o| !o.drop).collect();
    sorted.sort_by_key(|o| std::cmp::Reverse(o.y));

    let mut buf = BitBuf::new();
    let mut y = start_y;
    for obj in sorted {
        if obj.y > y {
            return Err(ObjectStreamError::YAboveStart { y: obj.y, start_y });
        }
        while obj.y < y {
            let ydiff = (y - obj.y).clamp(1, 8);
            y -= ydiff;
            buf.push_bits(0b00, 2);
            buf.push_bits(u32::from(ydiff - 1), 3);
        }
        if compressible(obj, spawnable) {
            let slot = spawn_slot(spawnable, obj.gid)
                .ok_or(ObjectStreamError::NotSpawnable { gid: obj.gid })?;
            buf.push_bits(0b10, 2);
            buf.push_bits(u32::from(obj.x - 1) / 2, 4);
            buf.push_bits(u32::from(slot), 4);
        } else {
            if obj.x >= 0x20 {
                return Err(ObjectStreamError::XTooLarge { x: obj.x });
            }
            buf.push_bits(0b01, 2);
            buf.push_bit(obj.flip_y);
            buf.push_bit(obj.flip_x);
            buf.push_bits(u32::from(obj.x), 5);
            if extended {
                if obj.gid >= 0x40 {
                    return Err(ObjectStreamError::GidTooLarge { gid: obj.gid });
                }
                buf.push_bits(u32::from(obj.gid), 6);
            } else {
                let slot = spawn_slot(spawnable, obj.gid)
                    .ok_or(ObjectStreamError::NotSpawnable { gid: obj.gid })?;
                buf.push_bits(u32::from(slot), 5);
            }
        }
    }
    buf.push_bits(0b11, 2);
    Ok(buf)
}

/// Decodes an object stream. Objects decoded below the level floor (the
/// cursor can move past y 0) are dropped, matching the engine.
pub fn decode(
    r: &mut BitReader<'_>,
    spawnable: &[u8],
    extended: bool,
    start_y: u8,
) -> Result<Vec<LevelObject>, ObjectStreamError> {
    let mut objects = Vec::new();
    let mut y = i16::from(start_y);
    loop {
        match r.read_bits(2)? {
            0b00 => {
                y -= r.read_bits(3)? as i16 + 1;
            }
            0b01 => {
                let flip_y = r.read_bit()?;
                let flip_x = r.read_bit()?;
                let x = r.read_bits(5)? as u8;
                let gid = if extended {
                    r.read_bits(6)? as u8
                } else {
                    let slot = r.read_bits(5)? as u8;
                    *spawnable
                        .get(usize::from(slot))
                        .ok_or(ObjectStreamError::BadSlot { slot })?
                };
                if y >= 0 {
                    objects.push(LevelObject {
                        x,
                        y: y as u8,
                        gid,
                        flip_x,
                        flip_y,
                        compressed: false,
                        drop: false,
                    });
                }
            }
            0b10 => {
                let x = r.read_bits(4)? as u8 * 2 + 1;
                let slot = r.read_bits(4)? as u8;
                let gid = *spawnable
                    .get(usize::from(slot))
                    .ok_or(ObjectStreamError::BadSlot { slot })?;
                if y >= 0 {
                    objects.push(LevelObject {
                        x,
                        y: y as u8,
                        gid,
                        flip_x: false,
                        flip_y: false,
                        compressed: true,
                        drop: false,
                    });
                }
            }
            _ => break,
        }
    }
    Ok(objects)
}

/// Serialized size of a level's drop-object table, terminator included.
pub fn drop_table_len(objects: &[LevelObject]) -> usize {
    let n = objects.iter().filter(|o| o.drop).count();
    if n == 0 { 0 } else { n * 4 + 1 }
}

/// Encodes the drop objects of a level as the plain 4-byte records the
/// engine walks: x and y in pixels, the screen index, and the raw gid.
pub fn encode_drops(objects: &[LevelObject]) -> Result<Vec<u8>, ObjectStreamError> {
    let mut out = Vec::new();
    for obj in objects.iter().filter(|o| o.drop) {
        let ypx = i32::from(obj.y) * 8;
        let screen = (ypx - 0x18).div_euclid(256) + 0xFC;
        if !(0xFB..0x100).contains(&screen) {
            return Err(ObjectStreamError::DropOutOfRange { y: obj.y });
        }
        out.push(obj.x.wrapping_mul(8));
        out.push((ypx & 0xFF) as u8);
        out.push(screen as u8);
        out.push(obj.gid);
    }
    if !out.is_empty() {
        out.push(0x01);
    }
    Ok(out)
}

/// Parses a drop-object table back into placements.
pub fn decode_drops(bytes: &[u8]) -> Result<Vec<LevelObject>, ObjectStreamError> {
    let mut out = Vec::new();
    for chunk in bytes.chunks_exact(4) {
        let [xpx, ylow, screen, gid] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        // ypx was truncated to 8 bits on write; the screen index pins the
        // high part (screen s covers pixel rows s*256+0x18 .. +0x117)
        let base = (i32::from(screen) - 0xFC) * 256;
        let ypx = if i32::from(ylow) >= 0x18 { base + i32::from(ylow) } else { base + 256 + i32::from(ylow) };
        out.push(LevelObject {
            x: xpx / 8,
            y: (ypx / 8) as u8,
            gid,
            flip_x: false,
            flip_y: false,
            compressed: false,
            drop: true,
        });
    }
    Ok(out)
}
