use statecast_buffers::{BufferError, WireType};
use thiserror::Error;

use crate::Path;

/// Failures raised while decoding or replaying into a state tree.
///
/// Every error is terminal for the call that raised it. A failing replay
/// leaves the addressed container as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("decode failed: {0}")]
    Buffer(#[from] BufferError),
    #[error("tag {tag} is out of range for the list at {path} ({len} items)")]
    IndexOutOfRange { path: Path, tag: u32, len: usize },
    #[error("cannot pop from the empty list at {path}")]
    ListEmpty { path: Path },
    #[error("key {key} not found in the map at {path}")]
    KeyNotFound { path: Path, key: u32 },
    #[error("{operation} is not supported on the {kind} at {path}")]
    UnsupportedOperation {
        path: Path,
        operation: &'static str,
        kind: &'static str,
    },
    #[error("the {kind} at {path} has no nested state")]
    TypeMismatch { path: Path, kind: &'static str },
    #[error("expected {expected} value at {path}, found {actual}")]
    WireTypeMismatch {
        path: Path,
        expected: WireType,
        actual: WireType,
    },
    #[error("tag {tag} at {path} does not fit in a key")]
    TagTooLarge { path: Path, tag: u32 },
    #[error("no state at {0}")]
    PathNotFound(Path),
    #[error("unknown replay entry kind {0}")]
    UnknownEntryKind(u32),
    #[error("replay entry is missing its {0}")]
    MissingField(&'static str),
    #[error("{0} trailing bytes after replay entry")]
    TrailingBytes(usize),
}

impl StateError {
    /// The buffer-level cause, if this error came from the reader.
    pub fn buffer_error(&self) -> Option<BufferError> {
        match self {
            StateError::Buffer(err) => Some(*err),
            _ => None,
        }
    }
}

/// Schema loading and validation failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate field tag {0}")]
    DuplicateTag(u32),
    #[error("field tag {0} does not fit in a key")]
    TagTooLarge(u32),
}
