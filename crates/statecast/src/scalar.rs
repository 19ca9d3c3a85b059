use serde_json::{Number, Value};
use statecast_buffers::{BufferError, Reader, WireType, Writer};

/// The primitive kinds a leaf can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Uint,
    Int,
    Float,
    Bytes,
    String,
}

impl ScalarKind {
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarKind::Bool | ScalarKind::Uint | ScalarKind::Int => WireType::Varint,
            ScalarKind::Float => WireType::Fixed64,
            ScalarKind::Bytes | ScalarKind::String => WireType::Sized,
        }
    }
}

/// A decoded leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Uint(u64),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
}

impl Scalar {
    pub fn default_for(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::Uint => Scalar::Uint(0),
            ScalarKind::Int => Scalar::Int(0),
            ScalarKind::Float => Scalar::Float(0.0),
            ScalarKind::Bytes => Scalar::Bytes(Vec::new()),
            ScalarKind::String => Scalar::String(String::new()),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Uint(_) => ScalarKind::Uint,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Bytes(_) => ScalarKind::Bytes,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    pub fn wire_type(&self) -> WireType {
        self.kind().wire_type()
    }

    /// Reads one value of `kind`; the reader sits right after the key.
    pub fn decode(kind: ScalarKind, reader: &mut Reader<'_>) -> Result<Self, BufferError> {
        Ok(match kind {
            ScalarKind::Bool => Scalar::Bool(reader.read_varint64()? != 0),
            ScalarKind::Uint => Scalar::Uint(reader.read_varint64()?),
            ScalarKind::Int => Scalar::Int(zigzag_decode(reader.read_varint64()?)),
            ScalarKind::Float => Scalar::Float(f64::from_bits(reader.read_fixed64()?)),
            ScalarKind::Bytes => {
                let mut nested = reader.get_nested()?;
                let len = nested.remaining();
                Scalar::Bytes(nested.read(len)?.to_vec())
            }
            ScalarKind::String => {
                let mut nested = reader.get_nested()?;
                let len = nested.remaining();
                Scalar::String(nested.read_utf8(len)?.to_owned())
            }
        })
    }

    /// Writes the value without a key.
    pub fn encode(&self, writer: &mut Writer) {
        match self {
            Scalar::Bool(v) => writer.varint64(*v as u64),
            Scalar::Uint(v) => writer.varint64(*v),
            Scalar::Int(v) => writer.varint64(zigzag_encode(*v)),
            Scalar::Float(v) => writer.fixed64(v.to_bits()),
            Scalar::Bytes(v) => writer.sized(v),
            Scalar::String(v) => writer.sized(v.as_bytes()),
        }
    }

    /// JSON view. Bytes become an array of numbers; non-finite floats become
    /// `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(v) => Value::Bool(*v),
            Scalar::Uint(v) => Value::Number(Number::from(*v)),
            Scalar::Int(v) => Value::Number(Number::from(*v)),
            Scalar::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Scalar::Bytes(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
            Scalar::String(v) => Value::String(v.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Scalar::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::Uint(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bytes(v)
    }
}

fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}
