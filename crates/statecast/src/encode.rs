use statecast_buffers::{WireType, Writer};

use crate::{Scalar, State};

/// Anything that can be written as a keyed value.
pub trait WireValue {
    fn wire_type(&self) -> WireType;

    /// Writes the value without its key.
    fn encode_value(&self, writer: &mut Writer);
}

impl WireValue for Scalar {
    fn wire_type(&self) -> WireType {
        Scalar::wire_type(self)
    }

    fn encode_value(&self, writer: &mut Writer) {
        self.encode(writer);
    }
}

impl WireValue for State {
    fn wire_type(&self) -> WireType {
        State::wire_type(self)
    }

    fn encode_value(&self, writer: &mut Writer) {
        State::encode_value(self, writer);
    }
}

/// Already-encoded container body, written length-prefixed.
#[derive(Debug, Clone, Copy)]
pub struct ContainerBody<'a>(pub &'a [u8]);

impl WireValue for ContainerBody<'_> {
    fn wire_type(&self) -> WireType {
        WireType::Sized
    }

    fn encode_value(&self, writer: &mut Writer) {
        writer.sized(self.0);
    }
}
