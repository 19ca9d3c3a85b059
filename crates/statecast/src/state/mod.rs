//! The replicated state tree.
//!
//! | Variant  | Addressed by          | Mutations                          |
//! |----------|-----------------------|------------------------------------|
//! | `Leaf`   | -                     | none, replaced by its parent       |
//! | `List`   | index `0..len`        | replace, push, pop                 |
//! | `Map`    | `u32` key             | replace (insert), remove           |
//! | `Struct` | declared field tag    | replace                            |
//!
//! Children are owned exclusively by their container. Nodes carry no link to
//! their parent, only the [`Path`] captured when they were built.

mod leaf;
mod list;
mod map;
mod record;

use std::sync::Arc;

use serde_json::Value;
use statecast_buffers::{Reader, WireType, Writer};

use crate::{Path, Scalar, Schema, StateError};

pub use leaf::Leaf;
pub use list::StateList;
pub use map::StateMap;
pub use record::StateStruct;

#[derive(Debug, PartialEq)]
pub enum State {
    Leaf(Leaf),
    List(StateList),
    Map(StateMap),
    Struct(StateStruct),
}

impl State {
    /// Decodes a container body, reading until `reader` is exhausted.
    ///
    /// Scalar schemas have no body and fail with `TypeMismatch`.
    pub fn deserialize(
        schema: &Arc<Schema>,
        reader: &mut Reader<'_>,
        path: Path,
    ) -> Result<State, StateError> {
        match &**schema {
            Schema::List { items } => {
                StateList::deserialize(Arc::clone(items), reader, path).map(State::List)
            }
            Schema::Map { values } => {
                StateMap::deserialize(Arc::clone(values), reader, path).map(State::Map)
            }
            Schema::Struct { .. } => {
                StateStruct::deserialize(Arc::clone(schema), reader, path).map(State::Struct)
            }
            other => Err(StateError::TypeMismatch {
                path,
                kind: other.kind_name(),
            }),
        }
    }

    /// The state a declared value holds before anything was decoded into it.
    pub fn default_for(schema: &Arc<Schema>, path: Path) -> State {
        if let Some(kind) = schema.as_scalar() {
            return State::Leaf(Leaf::new(path, Scalar::default_for(kind)));
        }
        match &**schema {
            Schema::List { items } => State::List(StateList::new(path, Arc::clone(items))),
            Schema::Map { values } => State::Map(StateMap::new(path, Arc::clone(values))),
            _ => State::Struct(StateStruct::new(path, Arc::clone(schema))),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            State::Leaf(leaf) => leaf.path(),
            State::List(list) => list.path(),
            State::Map(map) => map.path(),
            State::Struct(record) => record.path(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            State::Leaf(_) => "leaf",
            State::List(_) => "list",
            State::Map(_) => "map",
            State::Struct(_) => "struct",
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, State::Leaf(_))
    }

    pub fn scalar(&self) -> Option<&Scalar> {
        match self {
            State::Leaf(leaf) => Some(leaf.value()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&StateList> {
        match self {
            State::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut StateList> {
        match self {
            State::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&StateMap> {
        match self {
            State::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut StateMap> {
        match self {
            State::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StateStruct> {
        match self {
            State::Struct(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StateStruct> {
        match self {
            State::Struct(record) => Some(record),
            _ => None,
        }
    }

    fn no_nested(&self) -> StateError {
        StateError::TypeMismatch {
            path: self.path().clone(),
            kind: self.kind_name(),
        }
    }

    fn unsupported(&self, operation: &'static str) -> StateError {
        StateError::UnsupportedOperation {
            path: self.path().clone(),
            operation,
            kind: self.kind_name(),
        }
    }

    /// Wire type this node is encoded with when it is a value.
    pub fn wire_type(&self) -> WireType {
        match self {
            State::Leaf(leaf) => leaf.value().wire_type(),
            _ => WireType::Sized,
        }
    }

    /// Wire type expected for the child at `tag`. `None` for a struct tag
    /// that is not declared.
    pub fn wire_type_at(&self, tag: u32) -> Result<Option<WireType>, StateError> {
        match self {
            State::Leaf(_) => Err(self.no_nested()),
            State::List(list) => Ok(Some(list.wire_type(tag))),
            State::Map(map) => Ok(Some(map.wire_type(tag))),
            State::Struct(record) => Ok(record.wire_type(tag)),
        }
    }

    /// Child at `tag`; absence is `Ok(None)`, asking a leaf is an error.
    pub fn get_nested(&self, tag: u32) -> Result<Option<&State>, StateError> {
        match self {
            State::Leaf(_) => Err(self.no_nested()),
            State::List(list) => Ok(list.get_nested(tag)),
            State::Map(map) => Ok(map.get_nested(tag)),
            State::Struct(record) => Ok(record.get_nested(tag)),
        }
    }

    pub fn get_nested_mut(&mut self, tag: u32) -> Result<Option<&mut State>, StateError> {
        match self {
            State::Leaf(_) => Err(self.no_nested()),
            State::List(list) => Ok(list.get_nested_mut(tag)),
            State::Map(map) => Ok(map.get_nested_mut(tag)),
            State::Struct(record) => Ok(record.get_nested_mut(tag)),
        }
    }

    /// Walks `tags` from this node.
    pub fn resolve(&self, tags: &[u32]) -> Result<&State, StateError> {
        let mut node = self;
        for (depth, &tag) in tags.iter().enumerate() {
            node = node
                .get_nested(tag)?
                .ok_or_else(|| StateError::PathNotFound(missing_path(self.path(), tags, depth)))?;
        }
        Ok(node)
    }

    pub fn resolve_mut(&mut self, tags: &[u32]) -> Result<&mut State, StateError> {
        let base = self.path().clone();
        let mut node = self;
        for (depth, &tag) in tags.iter().enumerate() {
            node = node
                .get_nested_mut(tag)?
                .ok_or_else(|| StateError::PathNotFound(missing_path(&base, tags, depth)))?;
        }
        Ok(node)
    }

    /// Decodes the value at `reader` and installs it at `tag`.
    pub fn replace_at(
        &mut self,
        tag: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
        notify: bool,
    ) -> Result<(), StateError> {
        match self {
            State::Leaf(_) => Err(self.no_nested()),
            State::List(list) => list.replace_at(tag, wire_type, reader, notify),
            State::Map(map) => map.replace_at(tag, wire_type, reader, notify),
            State::Struct(record) => record.replace_at(tag, wire_type, reader, notify),
        }
    }

    pub fn replay_list_push(&mut self, reader: &mut Reader<'_>) -> Result<(), StateError> {
        match self {
            State::List(list) => list.replay_list_push(reader),
            _ => Err(self.unsupported("list push")),
        }
    }

    pub fn replay_list_pop(&mut self) -> Result<(), StateError> {
        match self {
            State::List(list) => list.replay_list_pop(),
            _ => Err(self.unsupported("list pop")),
        }
    }

    pub fn replay_map_remove(&mut self, key: u32) -> Result<(), StateError> {
        match self {
            State::Map(map) => map.replay_map_remove(key),
            State::List(list) => list.replay_map_remove(key),
            State::Struct(record) => record.replay_map_remove(key),
            State::Leaf(_) => Err(self.unsupported("map remove")),
        }
    }

    /// Writes the node as a value: a scalar, or a length-prefixed body.
    pub fn encode_value(&self, writer: &mut Writer) {
        match self {
            State::Leaf(leaf) => leaf.value().encode(writer),
            _ => {
                let mut body = Writer::new();
                self.encode_body(&mut body);
                writer.sized(&body.flush());
            }
        }
    }

    /// Writes the key/value sequence of a container. A leaf writes its
    /// scalar.
    pub fn encode_body(&self, writer: &mut Writer) {
        match self {
            State::Leaf(leaf) => leaf.value().encode(writer),
            State::List(list) => list.encode_body(writer),
            State::Map(map) => map.encode_body(writer),
            State::Struct(record) => record.encode_body(writer),
        }
    }

    /// Container body bytes, the inverse of [`State::deserialize`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode_body(&mut writer);
        writer.flush()
    }

    pub fn view(&self) -> Value {
        match self {
            State::Leaf(leaf) => leaf.value().to_json(),
            State::List(list) => list.view(),
            State::Map(map) => map.view(),
            State::Struct(record) => record.view(),
        }
    }
}

fn missing_path(base: &Path, tags: &[u32], depth: usize) -> Path {
    let mut missing = base.tags().to_vec();
    missing.extend_from_slice(&tags[..=depth]);
    Path::from(missing)
}

/// Writes `key(tag, wire_type)` followed by the value.
pub(crate) fn encode_entry(writer: &mut Writer, tag: u32, state: &State) {
    writer.key(tag, state.wire_type());
    state.encode_value(writer);
}
