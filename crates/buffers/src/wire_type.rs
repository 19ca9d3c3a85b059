//! Wire encodings and their fixed sizes.

use std::fmt;

use crate::BufferError;

/// How a value is laid out on the wire. Stored in the low 3 bits of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Little-endian base-128 unsigned integer.
    Varint,
    /// Eight raw bytes, little-endian.
    Fixed64,
    /// `varint(length)` followed by `length` raw bytes.
    Sized,
}

impl WireType {
    /// Byte width of a fixed-width value.
    pub const FIXED64_WIDTH: usize = 8;

    pub fn as_u8(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::Sized => 2,
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = BufferError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Sized),
            other => Err(BufferError::UnknownWireType(other)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::Sized => "sized",
        };
        f.write_str(name)
    }
}
