use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use statecast_buffers::{Reader, WireType, Writer};
use tracing::trace;

use super::{encode_entry, State};
use crate::events::{ContainerRef, EventHandler, FieldUpdateEvent, UpdateListener};
use crate::{factory, Path, Schema, StateError};

/// A fixed set of declared fields, each its own state.
///
/// Every declared field is always present, holding its default until the
/// stream sets it. Undeclared tags are skipped on decode and on replay.
pub struct StateStruct {
    path: Path,
    schema: Arc<Schema>,
    fields: BTreeMap<u32, State>,
    update_handlers: EventHandler<UpdateListener>,
}

impl StateStruct {
    /// A struct with every declared field at its default.
    pub fn new(path: Path, schema: Arc<Schema>) -> Self {
        let mut fields = BTreeMap::new();
        if let Schema::Struct { fields: declared } = &*schema {
            for field in declared {
                fields.insert(
                    field.tag,
                    State::default_for(&field.schema, path.child(field.tag)),
                );
            }
        }
        Self {
            path,
            schema,
            fields,
            update_handlers: EventHandler::default(),
        }
    }

    pub fn deserialize(
        schema: Arc<Schema>,
        reader: &mut Reader<'_>,
        path: Path,
    ) -> Result<Self, StateError> {
        let mut record = Self::new(path, schema);
        while !reader.end_of_stream() {
            let (tag, wire_type) = reader.read_key()?;
            match record.schema.field(tag) {
                Some(field) => {
                    let value =
                        factory::deserialize(&field.schema, wire_type, reader, &record.path, tag)?;
                    record.fields.insert(tag, value);
                }
                None => record.skip_unknown(tag, wire_type, reader)?,
            }
        }
        Ok(record)
    }

    fn skip_unknown(
        &self,
        tag: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<(), StateError> {
        trace!(tag, %wire_type, path = %self.path, "skipping unknown field");
        reader.skip_field(wire_type)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &State)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Field by declared name.
    pub fn field(&self, name: &str) -> Option<&State> {
        let Schema::Struct { fields } = &*self.schema else {
            return None;
        };
        let declared = fields.iter().find(|f| f.name == name)?;
        self.fields.get(&declared.tag)
    }

    pub fn wire_type(&self, tag: u32) -> Option<WireType> {
        self.schema.field(tag).map(|f| f.schema.wire_type())
    }

    pub fn get_nested(&self, tag: u32) -> Option<&State> {
        self.fields.get(&tag)
    }

    pub fn get_nested_mut(&mut self, tag: u32) -> Option<&mut State> {
        self.fields.get_mut(&tag)
    }

    /// Replaces the declared field at `tag`. An undeclared tag has its value
    /// skipped and nothing changes.
    pub fn replace_at(
        &mut self,
        tag: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
        notify: bool,
    ) -> Result<(), StateError> {
        let Some(field) = self.schema.field(tag) else {
            return self.skip_unknown(tag, wire_type, reader);
        };
        let new_value = factory::deserialize(&field.schema, wire_type, reader, &self.path, tag)?;

        if notify && !self.update_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.update_handlers);
            handlers.emit(&FieldUpdateEvent {
                tag,
                new_value: &new_value,
                old_value: self.fields.get(&tag),
                container: ContainerRef::Struct(&*self),
            });
            self.update_handlers = handlers;
        }

        self.fields.insert(tag, new_value);
        Ok(())
    }

    pub fn replay_map_remove(&mut self, _key: u32) -> Result<(), StateError> {
        Err(StateError::UnsupportedOperation {
            path: self.path.clone(),
            operation: "map remove",
            kind: "struct",
        })
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

    pub(crate) fn encode_body(&self, writer: &mut Writer) {
        for (tag, value) in &self.fields {
            encode_entry(writer, *tag, value);
        }
    }

    /// JSON object keyed by declared field name.
    pub fn view(&self) -> Value {
        let mut out = Map::new();
        if let Schema::Struct { fields } = &*self.schema {
            for field in fields {
                if let Some(value) = self.fields.get(&field.tag) {
                    out.insert(field.name.clone(), value.view());
                }
            }
        }
        Value::Object(out)
    }
}

impl fmt::Debug for StateStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStruct")
            .field("path", &self.path)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl PartialEq for StateStruct {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.schema == other.schema && self.fields == other.fields
    }
}
