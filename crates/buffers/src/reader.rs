//! Binary buffer reader with cursor tracking.

use std::str;

use crate::{BufferError, WireType};

/// A cursor over an immutable byte slice, bounded by `end`.
///
/// Every read is bounds-checked against `end` rather than the length of the
/// underlying slice, so a nested reader can never see bytes past its own
/// value even when the parent buffer continues. Failed reads leave the cursor
/// where it was.
///
/// # Example
///
/// ```
/// use statecast_buffers::{Reader, WireType};
///
/// let data = [0x08, 0x96, 0x01];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.read_key(), Ok((1, WireType::Varint)));
/// assert_eq!(reader.read_varint32(), Ok(150));
/// assert!(reader.end_of_stream());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    uint8: &'a [u8],
    /// Current cursor position.
    x: usize,
    /// End position (exclusive).
    end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader over the whole slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    fn from_slice(uint8: &'a [u8], x: usize, end: usize) -> Self {
        Self { uint8, x, end }
    }

    /// Cursor position relative to the start of the underlying slice.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Number of bytes left before the bound.
    pub fn remaining(&self) -> usize {
        self.end - self.x
    }

    /// True once every byte up to the bound has been consumed.
    pub fn end_of_stream(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread bytes, without advancing.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.uint8[self.x..self.end]
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if n > self.remaining() {
            Err(BufferError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    /// Reads one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads exactly `n` bytes. The count is validated before anything is
    /// sliced.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        self.check(n)?;
        let x = self.x;
        let bin = &self.uint8[x..x + n];
        self.x += n;
        Ok(bin)
    }

    /// Reads `n` bytes as UTF-8.
    pub fn read_utf8(&mut self, n: usize) -> Result<&'a str, BufferError> {
        self.check(n)?;
        let text = str::from_utf8(&self.uint8[self.x..self.x + n])
            .map_err(|_| BufferError::InvalidUtf8)?;
        self.x += n;
        Ok(text)
    }

    /// Advances the cursor by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), BufferError> {
        self.check(n)?;
        self.x += n;
        Ok(())
    }

    /// Decodes an unsigned LEB128 integer of at most 5 bytes.
    ///
    /// An empty stream is `UnexpectedEof`; a stream that stops after a
    /// continuation byte, a 5th byte with the continuation bit set, or a 5th
    /// byte carrying bits past bit 31 is `MalformedVarint`.
    pub fn read_varint32(&mut self) -> Result<u32, BufferError> {
        self.check(1)?;
        let mut result: u32 = 0;
        for i in 0..5 {
            let Some(&b) = self.uint8[..self.end].get(self.x + i) else {
                return Err(BufferError::MalformedVarint);
            };
            if i == 4 && b & 0xf0 != 0 {
                return Err(BufferError::MalformedVarint);
            }
            result |= ((b & 0x7f) as u32) << (7 * i);
            if b & 0x80 == 0 {
                self.x += i + 1;
                return Ok(result);
            }
        }
        Err(BufferError::MalformedVarint)
    }

    /// Decodes an unsigned LEB128 integer of at most 10 bytes.
    pub fn read_varint64(&mut self) -> Result<u64, BufferError> {
        self.check(1)?;
        let mut result: u64 = 0;
        for i in 0..10 {
            let Some(&b) = self.uint8[..self.end].get(self.x + i) else {
                return Err(BufferError::MalformedVarint);
            };
            if i == 9 && b & 0xfe != 0 {
                return Err(BufferError::MalformedVarint);
            }
            result |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                self.x += i + 1;
                return Ok(result);
            }
        }
        Err(BufferError::MalformedVarint)
    }

    /// Reads an 8-byte little-endian value.
    pub fn read_fixed64(&mut self) -> Result<u64, BufferError> {
        let bytes = self.read(WireType::FIXED64_WIDTH)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Decodes a key into `(tag, wire_type)`.
    pub fn read_key(&mut self) -> Result<(u32, WireType), BufferError> {
        let start = self.x;
        let key = self.read_varint32()?;
        match WireType::try_from((key & 0x7) as u8) {
            Ok(wire_type) => Ok((key >> 3, wire_type)),
            Err(err) => {
                self.x = start;
                Err(err)
            }
        }
    }

    /// Reads the length prefix of a sized value and returns a reader bounded
    /// to exactly that many bytes. The parent cursor moves past the value;
    /// the returned reader keeps its own cursor.
    pub fn get_nested(&mut self) -> Result<Reader<'a>, BufferError> {
        let start = self.x;
        let len = self.read_varint32()? as usize;
        if len > self.remaining() {
            self.x = start;
            return Err(BufferError::UnexpectedEof);
        }
        let nested = Reader::from_slice(self.uint8, self.x, self.x + len);
        self.x += len;
        Ok(nested)
    }

    /// Advances past one value of `wire_type`, consuming exactly the bytes a
    /// full parse would.
    pub fn skip_field(&mut self, wire_type: WireType) -> Result<(), BufferError> {
        match wire_type {
            WireType::Varint => self.read_varint64().map(|_| ()),
            WireType::Fixed64 => self.skip(WireType::FIXED64_WIDTH),
            WireType::Sized => self.get_nested().map(|_| ()),
        }
    }

    /// Returns a reader over exactly one encoded value of `wire_type`
    /// (length prefix included for sized values) and advances past it.
    pub fn take_field(&mut self, wire_type: WireType) -> Result<Reader<'a>, BufferError> {
        let start = self.x;
        self.skip_field(wire_type)?;
        Ok(Reader::from_slice(self.uint8, start, self.x))
    }
}
