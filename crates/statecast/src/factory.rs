//! Chooses and decodes the state variant for one value.

use std::sync::Arc;

use statecast_buffers::{Reader, WireType};

use crate::state::{Leaf, State};
use crate::{Path, Scalar, Schema, StateError};

/// Decodes the value `reader` is positioned at into the state for `tag`
/// under `parent`.
///
/// Container schemas are read as a sized value and decoded from a reader
/// bounded to it; scalar schemas are read in place. A key whose wire type
/// disagrees with the schema fails before anything is consumed.
pub fn deserialize(
    schema: &Arc<Schema>,
    wire_type: WireType,
    reader: &mut Reader<'_>,
    parent: &Path,
    tag: u32,
) -> Result<State, StateError> {
    let path = parent.child(tag);
    let expected = schema.wire_type();
    if wire_type != expected {
        return Err(StateError::WireTypeMismatch {
            path,
            expected,
            actual: wire_type,
        });
    }
    match schema.as_scalar() {
        Some(kind) => Ok(State::Leaf(Leaf::new(path, Scalar::decode(kind, reader)?))),
        None => {
            let mut nested = reader.get_nested()?;
            State::deserialize(schema, &mut nested, path)
        }
    }
}
