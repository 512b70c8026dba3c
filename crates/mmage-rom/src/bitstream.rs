//! Byte- and bit-level access to the ROM image.
//!
//! The packed formats are all MSB-first: the first bit of a byte is bit 7.
//! The music codec additionally works in nibbles; the nibble cursors can
//! only be constructed at byte boundaries, so they are 4-bit aligned by
//! construction.

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("access past end of image at offset {offset:#x}")]
    PastEnd { offset: usize },
}

pub fn read_byte(bin: &[u8], offset: usize) -> Result<u8, StreamError> {
    bin.get(offset).copied().ok_or(StreamError::PastEnd { offset })
}

/// Little-endian word.
pub fn read_word(bin: &[u8], offset: usize) -> Result<u16, StreamError> {
    let lo = read_byte(bin, offset)?;
    let hi = read_byte(bin, offset + 1)?;
    Ok(u16::from(lo) | u16::from(hi) << 8)
}

pub fn write_byte(bin: &mut [u8], offset: usize, b: u8) -> Result<(), StreamError> {
    match bin.get_mut(offset) {
        Some(slot) => {
            *slot = b;
            Ok(())
        }
        None => Err(StreamError::PastEnd { offset }),
    }
}

pub fn write_word(bin: &mut [u8], offset: usize, w: u16) -> Result<(), StreamError> {
    write_byte(bin, offset, (w & 0xFF) as u8)?;
    write_byte(bin, offset + 1, (w >> 8) as u8)
}

/// MSB-first bit cursor over a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, byte: offset, bit: 0 }
    }

    /// Offset of the byte the next bit comes from.
    pub fn byte_pos(&self) -> usize {
        self.byte
    }

    /// Offset of the first byte no bit has been read from.
    pub fn first_unread_byte(&self) -> usize {
        if self.bit == 0 { self.byte } else { self.byte + 1 }
    }

    pub fn read_bit(&mut self) -> Result<bool, StreamError> {
        let b = read_byte(self.data, self.byte)?;
        let bit = b & (1 << (7 - self.bit)) != 0;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Ok(bit)
    }

    pub fn read_bits(&mut self, n: u32) -> Result<u32, StreamError> {
        debug_assert!(n <= 32);
        let mut v = 0;
        for _ in 0..n {
            v = v << 1 | u32::from(self.read_bit()?);
        }
        Ok(v)
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<(), StreamError> {
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }
}

/// MSB-first bit cursor writing into a mutable byte slice.
pub struct BitWriter<'a> {
    data: &'a mut [u8],
    byte: usize,
    bit: u8,
}

impl<'a> BitWriter<'a> {
    pub fn new(data: &'a mut [u8], offset: usize) -> Self {
        Self { data, byte: offset, bit: 0 }
    }

    pub fn byte_pos(&self) -> usize {
        self.byte
    }

    /// Offset one past the last byte touched.
    pub fn first_untouched_byte(&self) -> usize {
        if self.bit == 0 { self.byte } else { self.byte + 1 }
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), StreamError> {
        let offset = self.byte;
        let slot = self.data.get_mut(offset).ok_or(StreamError::PastEnd { offset })?;
        let mask = 1 << (7 - self.bit);
        *slot = (*slot & !mask) | if bit { mask } else { 0 };
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Ok(())
    }

    pub fn write_bits(&mut self, value: u32, n: u32) -> Result<(), StreamError> {
        debug_assert!(n <= 32);
        for i in (0..n).rev() {
            self.write_bit(value >> i & 1 != 0)?;
        }
        Ok(())
    }
}

/// Growable MSB-first bit buffer for encoders that must know their length
/// before placement.
#[derive(Debug, Clone, Default)]
pub struct BitBuf {
    bytes: Vec<u8>,
    len_bits: usize,
}

impl BitBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len_bits(&self) -> usize {
        self.len_bits
    }

    pub fn len_bytes(&self) -> usize {
        self.len_bits.div_ceil(8)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.len_bits % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.len_bits % 8);
        }
        self.len_bits += 1;
    }

    pub fn push_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32);
        for i in (0..n).rev() {
            self.push_bit(value >> i & 1 != 0);
        }
    }

    pub fn write_to(&self, w: &mut BitWriter<'_>) -> Result<(), StreamError> {
        for i in 0..self.len_bits {
            w.write_bit(self.bytes[i / 8] & 1 << (7 - i % 8) != 0)?;
        }
        Ok(())
    }
}

/// Nibble cursor over the music bank. Constructible only at a byte
/// boundary; every read keeps it 4-bit aligned.
pub struct NibbleReader<'a> {
    inner: BitReader<'a>,
    start: usize,
}

impl<'a> NibbleReader<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { inner: BitReader::new(data, offset), start: offset }
    }

    pub fn read_nibble(&mut self) -> Result<u8, StreamError> {
        Ok(self.inner.read_bits(4)? as u8)
    }

    /// Nibbles consumed since the cursor was created.
    pub fn nibble_pos(&self) -> u16 {
        (2 * (self.inner.byte - self.start) + usize::from(self.inner.bit >= 4)) as u16
    }

    pub fn byte_pos(&self) -> usize {
        self.inner.byte
    }
}

/// Nibble cursor writing into the music bank.
pub struct NibbleWriter<'a> {
    inner: BitWriter<'a>,
    start: usize,
}

impl<'a> NibbleWriter<'a> {
    pub fn new(data: &'a mut [u8], offset: usize) -> Self {
        Self { inner: BitWriter::new(data, offset), start: offset }
    }

    pub fn write_nibble(&mut self, v: u8) -> Result<(), StreamError> {
        self.inner.write_bits(u32::from(v & 0xF), 4)
    }

    pub fn nibble_pos(&self) -> u16 {
        (2 * (self.inner.byte - self.start) + usize::from(self.inner.bit >= 4)) as u16
    }

    pub fn byte_pos(&self) -> usize {
        self.inner.byte
    }
}
