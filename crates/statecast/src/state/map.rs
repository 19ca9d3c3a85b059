use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use statecast_buffers::{Reader, WireType, Writer, MAX_TAG};

use super::{encode_entry, State};
use crate::events::{
    ContainerRef, EventHandler, FieldUpdateEvent, MapRemoveEvent, RemoveListener, UpdateListener,
};
use crate::{factory, Path, Schema, StateError};

/// States keyed by an unsigned key. Iteration is in key order.
///
/// A new key is inserted by replacing at a key that was absent.
pub struct StateMap {
    path: Path,
    value_schema: Arc<Schema>,
    entries: BTreeMap<u32, State>,
    update_handlers: EventHandler<UpdateListener>,
    remove_handlers: EventHandler<RemoveListener>,
}

impl StateMap {
    pub fn new(path: Path, value_schema: Arc<Schema>) -> Self {
        Self {
            path,
            value_schema,
            entries: BTreeMap::new(),
            update_handlers: EventHandler::default(),
            remove_handlers: EventHandler::default(),
        }
    }

    /// Decodes every remaining entry; a repeated key keeps the last value.
    pub fn deserialize(
        value_schema: Arc<Schema>,
        reader: &mut Reader<'_>,
        path: Path,
    ) -> Result<Self, StateError> {
        let mut map = Self::new(path, value_schema);
        while !reader.end_of_stream() {
            let (key, wire_type) = reader.read_key()?;
            let value = factory::deserialize(&map.value_schema, wire_type, reader, &map.path, key)?;
            map.entries.insert(key, value);
        }
        Ok(map)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value_schema(&self) -> &Arc<Schema> {
        &self.value_schema
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: u32) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &State)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn wire_type(&self, _tag: u32) -> WireType {
        self.value_schema.wire_type()
    }

    pub fn get_nested(&self, key: u32) -> Option<&State> {
        self.entries.get(&key)
    }

    pub fn get_nested_mut(&mut self, key: u32) -> Option<&mut State> {
        self.entries.get_mut(&key)
    }

    /// Installs the value decoded from `reader` at `key`, inserting when the
    /// key is new. The update event's `old_value` is `None` for inserts.
    ///
    /// Keys above [`MAX_TAG`] cannot be written back as a key and are
    /// rejected before anything is read.
    pub fn replace_at(
        &mut self,
        key: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
        notify: bool,
    ) -> Result<(), StateError> {
        if key > MAX_TAG {
            return Err(StateError::TagTooLarge {
                path: self.path.clone(),
                tag: key,
            });
        }
        let new_value = factory::deserialize(&self.value_schema, wire_type, reader, &self.path, key)?;

        if notify && !self.update_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.update_handlers);
            handlers.emit(&FieldUpdateEvent {
                tag: key,
                new_value: &new_value,
                old_value: self.entries.get(&key),
                container: ContainerRef::Map(&*self),
            });
            self.update_handlers = handlers;
        }

        self.entries.insert(key, new_value);
        Ok(())
    }

    /// Removes `key`. Remove observers still see the entry in the map.
    pub fn replay_map_remove(&mut self, key: u32) -> Result<(), StateError> {
        let Some(value) = self.entries.get(&key) else {
            return Err(StateError::KeyNotFound {
                path: self.path.clone(),
                key,
            });
        };

        if !self.remove_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.remove_handlers);
            handlers.emit(&MapRemoveEvent {
                key,
                value,
                map: &*self,
            });
            self.remove_handlers = handlers;
        }

        self.entries.remove(&key);
        Ok(())
    }

    pub fn on_update<F>(&mut self, listener: F) -> u64
    where
        F: for<'e> FnMut(&FieldUpdateEvent<'e>) + Send + Sync + 'static,
    {
        self.update_handlers.subscribe(Box::new(listener))
    }

    pub fn off_update(&mut self, id: u64) -> bool {
        self.update_handlers.unsubscribe(id)
    }

    pub fn clear_update_handlers(&mut self) {
        self.update_handlers.clear();
    }

    pub fn on_remove<F>(&mut self, listener: F) -> u64
    where
        F: for<'e> FnMut(&MapRemoveEvent<'e>) + Send + Sync + 'static,
    {
        self.remove_handlers.subscribe(Box::new(listener))
    }

    pub fn off_remove(&mut self, id: u64) -> bool {
        self.remove_handlers.unsubscribe(id)
    }

    pub fn clear_remove_handlers(&mut self) {
        self.remove_handlers.clear();
    }

    pub(crate) fn encode_body(&self, writer: &mut Writer) {
        for (key, value) in &self.entries {
            encode_entry(writer, *key, value);
        }
    }

    /// JSON object keyed by the decimal key.
    pub fn view(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.entries {
            out.insert(key.to_string(), value.view());
        }
        Value::Object(out)
    }
}

impl fmt::Debug for StateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMap")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl PartialEq for StateMap {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.value_schema == other.value_schema
            && self.entries == other.entries
    }
}
