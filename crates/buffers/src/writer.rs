//! Binary buffer writer producing the keyed wire layout.

use crate::WireType;

/// A growable byte buffer with wire-format helpers.
///
/// # Example
///
/// ```
/// use statecast_buffers::{WireType, Writer};
///
/// let mut writer = Writer::new();
/// writer.key(1, WireType::Varint);
/// writer.varint32(1);
/// writer.key(2, WireType::Varint);
/// writer.varint32(2);
/// assert_eq!(writer.flush(), [0x08, 0x01, 0x10, 0x02]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    uint8: Vec<u8>,
    /// Position where last flush happened.
    x0: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.uint8.len() - self.x0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data written since the last flush.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..].to_vec();
        self.x0 = self.uint8.len();
        result
    }

    /// Makes room for `capacity` more bytes. When the buffer is full, the
    /// already flushed prefix is dropped first so a long-lived writer only
    /// holds its unflushed window.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let free = self.uint8.capacity() - self.uint8.len();
        if free < capacity {
            if self.x0 > 0 {
                self.uint8.drain(..self.x0);
                self.x0 = 0;
            }
            self.uint8.reserve(capacity);
        }
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8.push(val);
    }

    /// Appends raw bytes.
    pub fn buf(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.uint8.extend_from_slice(bytes);
    }

    pub fn varint32(&mut self, val: u32) {
        self.varint64(val as u64);
    }

    pub fn varint64(&mut self, mut val: u64) {
        self.ensure_capacity(10);
        while val >= 0x80 {
            self.uint8.push((val as u8 & 0x7f) | 0x80);
            val >>= 7;
        }
        self.uint8.push(val as u8);
    }

    /// Writes an 8-byte little-endian value.
    pub fn fixed64(&mut self, val: u64) {
        self.ensure_capacity(WireType::FIXED64_WIDTH);
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes `varint(tag << 3 | wire_type)`. `tag` must not exceed
    /// [`MAX_TAG`](crate::MAX_TAG).
    pub fn key(&mut self, tag: u32, wire_type: WireType) {
        debug_assert!(tag <= crate::MAX_TAG, "tag {tag} does not fit in a key");
        self.varint32((tag << 3) | wire_type.as_u8() as u32);
    }

    /// Writes a length-prefixed value.
    pub fn sized(&mut self, bytes: &[u8]) {
        self.varint32(bytes.len() as u32);
        self.buf(bytes);
    }
}
