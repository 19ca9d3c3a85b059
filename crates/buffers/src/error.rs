/// Errors raised while decoding a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    #[error("malformed varint")]
    MalformedVarint,
    #[error("unknown wire type {0}")]
    UnknownWireType(u8),
    #[error("invalid UTF-8")]
    InvalidUtf8,
}
