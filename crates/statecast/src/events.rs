//! Mutation events and per-container observer lists.
//!
//! Events borrow from the container while it is being mutated: an update
//! event shows the value about to be installed next to the value it
//! replaces, and a pop/remove event shows the value before it leaves the
//! container. Observers run synchronously, in subscription order, before the
//! mutating call returns.

use std::collections::BTreeMap;
use std::fmt;

use crate::state::{State, StateList, StateMap, StateStruct};
use crate::Path;

/// The container a mutation happened in.
#[derive(Debug, Clone, Copy)]
pub enum ContainerRef<'a> {
    List(&'a StateList),
    Map(&'a StateMap),
    Struct(&'a StateStruct),
}

impl<'a> ContainerRef<'a> {
    pub fn path(&self) -> &'a Path {
        match self {
            ContainerRef::List(list) => list.path(),
            ContainerRef::Map(map) => map.path(),
            ContainerRef::Struct(record) => record.path(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldUpdateEvent<'a> {
    pub tag: u32,
    pub new_value: &'a State,
    /// `None` when a map key is inserted for the first time.
    pub old_value: Option<&'a State>,
    pub container: ContainerRef<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListPushEvent<'a> {
    pub tag: u32,
    pub item: &'a State,
    pub list: &'a StateList,
}

#[derive(Debug, Clone, Copy)]
pub struct ListPopEvent<'a> {
    pub tag: u32,
    pub item: &'a State,
    pub list: &'a StateList,
}

#[derive(Debug, Clone, Copy)]
pub struct MapRemoveEvent<'a> {
    pub key: u32,
    pub value: &'a State,
    pub map: &'a StateMap,
}

pub type UpdateListener = dyn for<'e> FnMut(&FieldUpdateEvent<'e>) + Send + Sync;
pub type PushListener = dyn for<'e> FnMut(&ListPushEvent<'e>) + Send + Sync;
pub type PopListener = dyn for<'e> FnMut(&ListPopEvent<'e>) + Send + Sync;
pub type RemoveListener = dyn for<'e> FnMut(&MapRemoveEvent<'e>) + Send + Sync;

/// Ordered listeners for one event kind on one container.
///
/// Ids grow monotonically, so iteration order is subscription order.
pub struct EventHandler<F: ?Sized> {
    next_id: u64,
    listeners: BTreeMap<u64, Box<F>>,
}

impl<F: ?Sized> Default for EventHandler<F> {
    fn default() -> Self {
        Self {
            next_id: 1,
            listeners: BTreeMap::new(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for EventHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<F: ?Sized> EventHandler<F> {
    /// Adds a listener and returns its subscription id.
    pub fn subscribe(&mut self, listener: Box<F>) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(id, listener);
        id
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventHandler<UpdateListener> {
    pub(crate) fn emit(&mut self, event: &FieldUpdateEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}

impl EventHandler<PushListener> {
    pub(crate) fn emit(&mut self, event: &ListPushEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}

impl EventHandler<PopListener> {
    pub(crate) fn emit(&mut self, event: &ListPopEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}

impl EventHandler<RemoveListener> {
    pub(crate) fn emit(&mut self, event: &MapRemoveEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}
