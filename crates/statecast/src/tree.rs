use std::sync::Arc;

use serde_json::Value;
use statecast_buffers::Reader;
use tracing::debug;

use crate::{Path, ReplayEntry, Schema, State, StateError};

/// Knobs for applying replay records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Whether replaced values fire update observers. Push, pop and remove
    /// always notify.
    pub notify: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { notify: true }
    }
}

/// A root container state plus the schema it was decoded with.
#[derive(Debug)]
pub struct StateTree {
    schema: Arc<Schema>,
    root: State,
    options: ReplayOptions,
}

impl StateTree {
    /// An empty tree: every declared value at its default.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Result<Self, StateError> {
        let schema = schema.into();
        ensure_container(&schema)?;
        let root = State::default_for(&schema, Path::root());
        Ok(Self {
            schema,
            root,
            options: ReplayOptions::default(),
        })
    }

    /// Decodes a complete snapshot. The root container's body is the whole
    /// buffer; any failure aborts the whole decode.
    pub fn deserialize(schema: impl Into<Arc<Schema>>, bytes: &[u8]) -> Result<Self, StateError> {
        let schema = schema.into();
        ensure_container(&schema)?;
        let mut reader = Reader::new(bytes);
        let root = State::deserialize(&schema, &mut reader, Path::root())?;
        debug!(bytes = bytes.len(), kind = root.kind_name(), "decoded snapshot");
        Ok(Self {
            schema,
            root,
            options: ReplayOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ReplayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ReplayOptions {
        self.options
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn root(&self) -> &State {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut State {
        &mut self.root
    }

    pub fn into_root(self) -> State {
        self.root
    }

    pub fn resolve(&self, tags: &[u32]) -> Result<&State, StateError> {
        self.root.resolve(tags)
    }

    pub fn resolve_mut(&mut self, tags: &[u32]) -> Result<&mut State, StateError> {
        self.root.resolve_mut(tags)
    }

    /// Applies exactly one record; bytes left after it are an error and
    /// nothing is applied.
    pub fn replay(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        let mut reader = Reader::new(bytes);
        let entry = ReplayEntry::decode(&mut reader)?;
        if !reader.end_of_stream() {
            return Err(StateError::TrailingBytes(reader.remaining()));
        }
        entry.apply(&mut self.root, &self.options)
    }

    /// Applies every record in `bytes` in order, stopping at the first
    /// failure. Returns how many records were applied.
    pub fn replay_log(&mut self, bytes: &[u8]) -> Result<usize, StateError> {
        let mut reader = Reader::new(bytes);
        let mut applied = 0;
        while !reader.end_of_stream() {
            ReplayEntry::decode(&mut reader)?.apply(&mut self.root, &self.options)?;
            applied += 1;
        }
        debug!(applied, "replayed log");
        Ok(applied)
    }

    /// Snapshot bytes that decode back to this tree.
    pub fn encode(&self) -> Vec<u8> {
        self.root.to_bytes()
    }

    pub fn view(&self) -> Value {
        self.root.view()
    }
}

fn ensure_container(schema: &Schema) -> Result<(), StateError> {
    if schema.is_container() {
        Ok(())
    } else {
        Err(StateError::TypeMismatch {
            path: Path::root(),
            kind: schema.kind_name(),
        })
    }
}
