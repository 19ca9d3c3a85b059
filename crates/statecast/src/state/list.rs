use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use statecast_buffers::{Reader, WireType, Writer, MAX_TAG};

use super::{encode_entry, State};
use crate::events::{
    ContainerRef, EventHandler, FieldUpdateEvent, ListPopEvent, ListPushEvent, PopListener,
    PushListener, UpdateListener,
};
use crate::{factory, Path, Schema, StateError};

/// An ordered, homogeneous sequence of states.
///
/// Item tags are always exactly `0..len`: push appends at `len`, pop removes
/// at `len - 1`, and nothing removes from the middle. Items are keyed
/// `index + 1` on the wire, so a list holds at most [`MAX_TAG`] items.
pub struct StateList {
    path: Path,
    item_schema: Arc<Schema>,
    items: Vec<State>,
    update_handlers: EventHandler<UpdateListener>,
    push_handlers: EventHandler<PushListener>,
    pop_handlers: EventHandler<PopListener>,
}

impl StateList {
    pub fn new(path: Path, item_schema: Arc<Schema>) -> Self {
        Self {
            path,
            item_schema,
            items: Vec::new(),
            update_handlers: EventHandler::default(),
            push_handlers: EventHandler::default(),
            pop_handlers: EventHandler::default(),
        }
    }

    /// Decodes every remaining item in `reader`.
    ///
    /// Each item is keyed by its 1-based running position on the wire; in the
    /// tree it is addressed by its zero-based index.
    pub fn deserialize(
        item_schema: Arc<Schema>,
        reader: &mut Reader<'_>,
        path: Path,
    ) -> Result<Self, StateError> {
        let mut list = Self::new(path, item_schema);
        while !reader.end_of_stream() {
            let (_position, wire_type) = reader.read_key()?;
            let tag = list.next_tag()?;
            let item = factory::deserialize(&list.item_schema, wire_type, reader, &list.path, tag)?;
            list.items.push(item);
        }
        Ok(list)
    }

    fn next_tag(&self) -> Result<u32, StateError> {
        item_tag(self.items.len()).ok_or_else(|| StateError::TagTooLarge {
            path: self.path.clone(),
            tag: MAX_TAG,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn item_schema(&self) -> &Arc<Schema> {
        &self.item_schema
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[State] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.items.iter()
    }

    /// Items share one schema, so the tag does not matter.
    pub fn wire_type(&self, _tag: u32) -> WireType {
        self.item_schema.wire_type()
    }

    pub fn get_nested(&self, tag: u32) -> Option<&State> {
        self.items.get(tag as usize)
    }

    pub fn get_nested_mut(&mut self, tag: u32) -> Option<&mut State> {
        self.items.get_mut(tag as usize)
    }

    /// Replaces the item at `tag` with the value decoded from `reader`.
    ///
    /// Update observers see the incoming item next to the one it replaces,
    /// before the swap.
    pub fn replace_at(
        &mut self,
        tag: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
        notify: bool,
    ) -> Result<(), StateError> {
        let index = tag as usize;
        if index >= self.items.len() {
            return Err(StateError::IndexOutOfRange {
                path: self.path.clone(),
                tag,
                len: self.items.len(),
            });
        }
        let new_item = factory::deserialize(&self.item_schema, wire_type, reader, &self.path, tag)?;

        if notify && !self.update_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.update_handlers);
            handlers.emit(&FieldUpdateEvent {
                tag,
                new_value: &new_item,
                old_value: Some(&self.items[index]),
                container: ContainerRef::List(&*self),
            });
            self.update_handlers = handlers;
        }

        self.items[index] = new_item;
        Ok(())
    }

    /// Appends the item decoded from `reader` at tag `len`.
    pub fn replay_list_push(&mut self, reader: &mut Reader<'_>) -> Result<(), StateError> {
        let tag = self.next_tag()?;
        let wire_type = self.wire_type(tag);
        let item = factory::deserialize(&self.item_schema, wire_type, reader, &self.path, tag)?;

        if !self.push_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.push_handlers);
            handlers.emit(&ListPushEvent {
                tag,
                item: &item,
                list: &*self,
            });
            self.push_handlers = handlers;
        }

        self.items.push(item);
        Ok(())
    }

    /// Removes the last item. Pop observers still see it in the list.
    pub fn replay_list_pop(&mut self) -> Result<(), StateError> {
        let Some(index) = self.items.len().checked_sub(1) else {
            return Err(StateError::ListEmpty {
                path: self.path.clone(),
            });
        };
        let tag = item_tag(index).ok_or_else(|| StateError::TagTooLarge {
            path: self.path.clone(),
            tag: MAX_TAG,
        })?;

        if !self.pop_handlers.is_empty() {
            let mut handlers = std::mem::take(&mut self.pop_handlers);
            handlers.emit(&ListPopEvent {
                tag,
                item: &self.items[index],
                list: &*self,
            });
            self.pop_handlers = handlers;
        }

        self.items.pop();
        Ok(())
    }

    /// Lists have no keyed removal.
    pub fn replay_map_remove(&mut self, _key: u32) -> Result<(), StateError> {
        Err(StateError::UnsupportedOperation {
            path: self.path.clone(),
            operation: "map remove",
            kind: "list",
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

    pub fn on_push<F>(&mut self, listener: F) -> u64
    where
        F: for<'e> FnMut(&ListPushEvent<'e>) + Send + Sync + 'static,
    {
        self.push_handlers.subscribe(Box::new(listener))
    }

    pub fn off_push(&mut self, id: u64) -> bool {
        self.push_handlers.unsubscribe(id)
    }

    pub fn clear_push_handlers(&mut self) {
        self.push_handlers.clear();
    }

    pub fn on_pop<F>(&mut self, listener: F) -> u64
    where
        F: for<'e> FnMut(&ListPopEvent<'e>) + Send + Sync + 'static,
    {
        self.pop_handlers.subscribe(Box::new(listener))
    }

    pub fn off_pop(&mut self, id: u64) -> bool {
        self.pop_handlers.unsubscribe(id)
    }

    pub fn clear_pop_handlers(&mut self) {
        self.pop_handlers.clear();
    }

    pub(crate) fn encode_body(&self, writer: &mut Writer) {
        for (position, item) in (1..=MAX_TAG).zip(&self.items) {
            encode_entry(writer, position, item);
        }
    }

    pub fn view(&self) -> Value {
        Value::Array(self.items.iter().map(State::view).collect())
    }
}

/// Tag of the item at `index`, if its wire position `index + 1` fits in a key.
fn item_tag(index: usize) -> Option<u32> {
    u32::try_from(index).ok().filter(|tag| *tag < MAX_TAG)
}

impl fmt::Debug for StateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateList")
            .field("path", &self.path)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

/// Structural equality; observers are not compared.
impl PartialEq for StateList {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.item_schema == other.item_schema
            && self.items == other.items
    }
}
