//! Mutation records.
//!
//! A record is a single key/value pair. The key's tag is the entry kind and
//! its wire type is always sized; the body holds:
//!
//! | Tag | Wire type | Content                                             |
//! |-----|-----------|-----------------------------------------------------|
//! | 0   | sized     | path, packed varint tags (absent means the root)    |
//! | 1   | any       | update/push: the value; map remove: the key         |
//!
//! An update's path ends with the tag being replaced. Every other kind
//! addresses the container itself.

use statecast_buffers::{Reader, WireType, Writer};
use tracing::debug;

use crate::{Path, ReplayOptions, State, StateError, WireValue};

const PATH_TAG: u32 = 0;
const PAYLOAD_TAG: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayKind {
    Update,
    ListPush,
    ListPop,
    MapRemove,
}

impl ReplayKind {
    pub fn tag(self) -> u32 {
        match self {
            ReplayKind::Update => 0,
            ReplayKind::ListPush => 1,
            ReplayKind::ListPop => 2,
            ReplayKind::MapRemove => 3,
        }
    }

    pub fn from_tag(tag: u32) -> Result<Self, StateError> {
        match tag {
            0 => Ok(ReplayKind::Update),
            1 => Ok(ReplayKind::ListPush),
            2 => Ok(ReplayKind::ListPop),
            3 => Ok(ReplayKind::MapRemove),
            other => Err(StateError::UnknownEntryKind(other)),
        }
    }
}

/// One decoded record. The payload borrows the record bytes.
#[derive(Debug, Clone)]
pub struct ReplayEntry<'a> {
    pub kind: ReplayKind,
    pub path: Path,
    payload: Option<(WireType, Reader<'a>)>,
}

impl<'a> ReplayEntry<'a> {
    /// Reads one record from `reader`, leaving it after the record.
    pub fn decode(reader: &mut Reader<'a>) -> Result<Self, StateError> {
        let (kind_tag, wire_type) = reader.read_key()?;
        let kind = ReplayKind::from_tag(kind_tag)?;
        expect_wire_type(&Path::root(), WireType::Sized, wire_type)?;
        let mut body = reader.get_nested()?;

        let mut path = Path::root();
        let mut payload = None;
        while !body.end_of_stream() {
            let (tag, wire_type) = body.read_key()?;
            match tag {
                PATH_TAG => {
                    expect_wire_type(&Path::root(), WireType::Sized, wire_type)?;
                    path = decode_path(&mut body.get_nested()?)?;
                }
                PAYLOAD_TAG => payload = Some((wire_type, body.take_field(wire_type)?)),
                _ => body.skip_field(wire_type)?,
            }
        }

        let entry = Self {
            kind,
            path,
            payload,
        };
        if kind != ReplayKind::ListPop && entry.payload.is_none() {
            return Err(StateError::MissingField("payload"));
        }
        Ok(entry)
    }

    fn payload(&self) -> Result<(WireType, Reader<'a>), StateError> {
        self.payload.ok_or(StateError::MissingField("payload"))
    }

    /// Applies the record to the tree rooted at `root`.
    pub fn apply(&self, root: &mut State, options: &ReplayOptions) -> Result<(), StateError> {
        debug!(kind = ?self.kind, path = %self.path, "replaying entry");
        match self.kind {
            ReplayKind::Update => {
                let (tag, parent) = self
                    .path
                    .tags()
                    .split_last()
                    .ok_or(StateError::MissingField("target tag"))?;
                let (wire_type, mut value) = self.payload()?;
                root.resolve_mut(parent)?
                    .replace_at(*tag, wire_type, &mut value, options.notify)
            }
            ReplayKind::ListPush => {
                let (wire_type, mut value) = self.payload()?;
                let target = root.resolve_mut(self.path.tags())?;
                if let State::List(list) = &*target {
                    let tag = list.len() as u32;
                    expect_wire_type(&list.path().child(tag), list.wire_type(tag), wire_type)?;
                }
                target.replay_list_push(&mut value)
            }
            ReplayKind::ListPop => root.resolve_mut(self.path.tags())?.replay_list_pop(),
            ReplayKind::MapRemove => {
                let (wire_type, mut value) = self.payload()?;
                expect_wire_type(&self.path, WireType::Varint, wire_type)?;
                let key = value.read_varint32()?;
                root.resolve_mut(self.path.tags())?.replay_map_remove(key)
            }
        }
    }
}

fn expect_wire_type(path: &Path, expected: WireType, actual: WireType) -> Result<(), StateError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StateError::WireTypeMismatch {
            path: path.clone(),
            expected,
            actual,
        })
    }
}

fn decode_path(reader: &mut Reader<'_>) -> Result<Path, StateError> {
    let mut tags = Vec::new();
    while !reader.end_of_stream() {
        tags.push(reader.read_varint32()?);
    }
    Ok(Path::from(tags))
}

fn encode_entry(kind: ReplayKind, path: &Path, payload: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut packed = Writer::new();
    for tag in path.tags() {
        packed.varint32(*tag);
    }
    let mut body = Writer::new();
    body.key(PATH_TAG, WireType::Sized);
    body.sized(&packed.flush());
    payload(&mut body);

    let mut writer = Writer::new();
    writer.key(kind.tag(), WireType::Sized);
    writer.sized(&body.flush());
    writer.flush()
}

/// Record replacing the value at `path` (container path plus target tag).
pub fn encode_update(path: &Path, value: &impl WireValue) -> Vec<u8> {
    encode_entry(ReplayKind::Update, path, |body| {
        body.key(PAYLOAD_TAG, value.wire_type());
        value.encode_value(body);
    })
}

/// Record appending `item` to the list at `path`.
pub fn encode_list_push(path: &Path, item: &impl WireValue) -> Vec<u8> {
    encode_entry(ReplayKind::ListPush, path, |body| {
        body.key(PAYLOAD_TAG, item.wire_type());
        item.encode_value(body);
    })
}

/// Record popping the last item of the list at `path`.
pub fn encode_list_pop(path: &Path) -> Vec<u8> {
    encode_entry(ReplayKind::ListPop, path, |_| {})
}

/// Record removing `key` from the map at `path`.
pub fn encode_map_remove(path: &Path, key: u32) -> Vec<u8> {
    encode_entry(ReplayKind::MapRemove, path, |body| {
        body.key(PAYLOAD_TAG, WireType::Varint);
        body.varint32(key);
    })
}
