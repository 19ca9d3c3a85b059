//! Declared shapes for state trees.
//!
//! The decoder never inspects application types. It asks a schema one
//! question per value, "is this a container?", and derives the wire type
//! from the answer. Schemas are plain serde data so they can be shipped as
//! JSON next to the stream they describe:
//!
//! ```
//! use statecast::Schema;
//!
//! let schema = Schema::from_json_str(r#"{
//!     "kind": "struct",
//!     "fields": [
//!         { "tag": 1, "name": "hp", "schema": { "kind": "uint" } },
//!         { "tag": 2, "name": "items", "schema": { "kind": "list", "items": { "kind": "string" } } }
//!     ]
//! }"#).unwrap();
//! assert!(schema.is_container());
//! assert_eq!(schema.field(2).unwrap().name, "items");
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statecast_buffers::{WireType, MAX_TAG};

use crate::{ScalarKind, SchemaError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schema {
    Bool,
    /// Unsigned varint.
    Uint,
    /// Zig-zag varint.
    Int,
    /// IEEE-754 binary64, fixed width.
    Float,
    Bytes,
    String,
    List {
        items: Arc<Schema>,
    },
    Map {
        values: Arc<Schema>,
    },
    Struct {
        fields: Vec<FieldSchema>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub tag: u32,
    pub name: String,
    pub schema: Arc<Schema>,
}

impl FieldSchema {
    pub fn new(tag: u32, name: impl Into<String>, schema: Schema) -> Self {
        Self {
            tag,
            name: name.into(),
            schema: Arc::new(schema),
        }
    }
}

impl Schema {
    pub fn list(items: Schema) -> Self {
        Schema::List {
            items: Arc::new(items),
        }
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map {
            values: Arc::new(values),
        }
    }

    pub fn structure(fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        Schema::Struct {
            fields: fields.into_iter().collect(),
        }
    }

    /// Parses and validates a JSON schema description.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Rejects duplicate struct tags and tags that cannot be keyed.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            Schema::List { items } => items.validate(),
            Schema::Map { values } => values.validate(),
            Schema::Struct { fields } => {
                let mut seen = BTreeSet::new();
                for field in fields {
                    if field.tag > MAX_TAG {
                        return Err(SchemaError::TagTooLarge(field.tag));
                    }
                    if !seen.insert(field.tag) {
                        return Err(SchemaError::DuplicateTag(field.tag));
                    }
                    field.schema.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Schema::List { .. } | Schema::Map { .. } | Schema::Struct { .. }
        )
    }

    /// The encoding a value of this schema uses on the wire.
    pub fn wire_type(&self) -> WireType {
        match self.as_scalar() {
            Some(kind) => kind.wire_type(),
            None => WireType::Sized,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Schema::Bool => Some(ScalarKind::Bool),
            Schema::Uint => Some(ScalarKind::Uint),
            Schema::Int => Some(ScalarKind::Int),
            Schema::Float => Some(ScalarKind::Float),
            Schema::Bytes => Some(ScalarKind::Bytes),
            Schema::String => Some(ScalarKind::String),
            Schema::List { .. } | Schema::Map { .. } | Schema::Struct { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Schema::Bool => "bool",
            Schema::Uint => "uint",
            Schema::Int => "int",
            Schema::Float => "float",
            Schema::Bytes => "bytes",
            Schema::String => "string",
            Schema::List { .. } => "list",
            Schema::Map { .. } => "map",
            Schema::Struct { .. } => "struct",
        }
    }

    /// Declared field for `tag`; `None` for non-structs and unknown tags.
    pub fn field(&self, tag: u32) -> Option<&FieldSchema> {
        match self {
            Schema::Struct { fields } => fields.iter().find(|f| f.tag == tag),
            _ => None,
        }
    }
}
