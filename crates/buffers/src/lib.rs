//! Binary buffers for the statecast wire format.
//!
//! Every encoded value is prefixed by a key, `varint(tag << 3 | wire_type)`.
//! [`Reader`] decodes keys and values over an immutable byte slice with a
//! cursor, and can hand out bounded sub-readers for length-delimited values.
//! [`Writer`] produces the same layout.

mod error;
mod reader;
mod wire_type;
mod writer;

pub use error::BufferError;
pub use reader::Reader;
pub use wire_type::WireType;
pub use writer::Writer;

/// Largest tag that still fits in a 32-bit key once shifted by 3 bits.
pub const MAX_TAG: u32 = u32::MAX >> 3;
