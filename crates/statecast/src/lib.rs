//! Replicated state trees over a tag-based binary stream.
//!
//! A snapshot is decoded once into a [`StateTree`]; afterwards the tree only
//! changes through small replay records (replace, list push, list pop, map
//! remove), each of which notifies the observers registered on the
//! container it touches.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use statecast::{encode_list_pop, encode_list_push, Path, Scalar, Schema, StateTree};
//!
//! let mut tree = StateTree::deserialize(Schema::list(Schema::Uint), &[0x08, 0x01, 0x10, 0x02]).unwrap();
//! tree.replay(&encode_list_push(&Path::root(), &Scalar::Uint(3))).unwrap();
//! assert_eq!(tree.view(), serde_json::json!([1, 2, 3]));
//!
//! let popped = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&popped);
//! tree.root_mut().as_list_mut().unwrap().on_pop(move |ev| {
//!     sink.lock().unwrap().push((ev.tag, ev.item.view()));
//! });
//! tree.replay(&encode_list_pop(&Path::root())).unwrap();
//! assert_eq!(popped.lock().unwrap().as_slice(), &[(2, serde_json::json!(3))]);
//! ```

mod encode;
mod error;
pub mod events;
pub mod factory;
mod path;
mod replay;
mod scalar;
mod schema;
pub mod state;
mod tree;

pub use encode::{ContainerBody, WireValue};
pub use error::{SchemaError, StateError};
pub use path::Path;
pub use replay::{
    encode_list_pop, encode_list_push, encode_map_remove, encode_update, ReplayEntry, ReplayKind,
};
pub use scalar::{Scalar, ScalarKind};
pub use schema::{FieldSchema, Schema};
pub use state::{Leaf, State, StateList, StateMap, StateStruct};
pub use statecast_buffers::{BufferError, Reader, WireType, Writer, MAX_TAG};
pub use tree::{ReplayOptions, StateTree};

/// Decodes a full snapshot.
pub fn deserialize(schema: impl Into<std::sync::Arc<Schema>>, bytes: &[u8]) -> Result<StateTree, StateError> {
    StateTree::deserialize(schema, bytes)
}

/// Applies one mutation record to `tree`.
pub fn replay(tree: &mut StateTree, bytes: &[u8]) -> Result<(), StateError> {
    tree.replay(bytes)
}
