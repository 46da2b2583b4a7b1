//! Packet wrapper handed to remappers
//!
//! A packet starts as its id plus undecoded body bytes. Remappers pull typed
//! fields off the front and push fields in the layout of the next version.
//! Fields read by one step stay materialized for the following steps, so a
//! field is decoded from bytes at most once per traversal. Whatever nobody
//! reads is forwarded untouched.

use crate::codecs::{read_varint, write_varint, CodecResult, WireType};
use crate::packet_kinds::PacketKind;
use bridge_core::CodecError;
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

/// A decoded field with enough type information to encode it again
pub struct Field {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
    encode: fn(&(dyn Any + Send), &mut BytesMut),
}

fn encode_field<T: WireType + 'static>(value: &(dyn Any + Send), buf: &mut BytesMut) {
    if let Some(value) = value.downcast_ref::<T>() {
        value.write(buf);
    }
}

impl Field {
    pub fn new<T: WireType + Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
            encode: encode_field::<T>,
        }
    }

    fn into_value<T: 'static>(self) -> CodecResult<T> {
        let type_name = self.type_name;
        self.value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            CodecError::malformed(
                "Field",
                format!(
                    "expected {} but the field was decoded as {}",
                    std::any::type_name::<T>(),
                    type_name
                ),
            )
        })
    }

    fn write_to(&self, buf: &mut BytesMut) {
        (self.encode)(self.value.as_ref(), buf);
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field<{}>", self.type_name)
    }
}

/// Where an emitted packet goes relative to the one that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOrder {
    Before,
    After,
}

#[derive(Debug)]
pub struct Emitted {
    pub order: EmitOrder,
    pub packet: PacketWrapper,
}

#[derive(Debug)]
pub struct PacketWrapper {
    id: i32,
    kind: Option<PacketKind>,
    input: Bytes,
    readable: VecDeque<Field>,
    written: Vec<Field>,
    cancelled: bool,
    emitted: Vec<Emitted>,
}

impl PacketWrapper {
    /// Wrap a body whose id has already been split off
    pub fn new(id: i32, body: Bytes) -> Self {
        Self {
            id,
            kind: None,
            input: body,
            readable: VecDeque::new(),
            written: Vec::new(),
            cancelled: false,
            emitted: Vec::new(),
        }
    }

    /// Split the VarInt id off a raw payload
    pub fn decode(mut payload: Bytes) -> CodecResult<Self> {
        let id = read_varint(&mut payload)?;
        Ok(Self::new(id, payload))
    }

    /// Empty packet of a known kind, for remappers that synthesize packets
    ///
    /// The id is assigned from the target registry when the packet is sent.
    pub fn create(kind: PacketKind) -> Self {
        let mut wrapper = Self::new(-1, Bytes::new());
        wrapper.kind = Some(kind);
        wrapper
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn kind(&self) -> Option<PacketKind> {
        self.kind
    }

    pub fn set_kind(&mut self, kind: PacketKind) {
        self.kind = Some(kind);
    }

    /// Take the next field in the current layout
    pub fn read<T: WireType + 'static>(&mut self) -> CodecResult<T> {
        match self.readable.pop_front() {
            Some(field) => field.into_value(),
            None => T::read(&mut self.input),
        }
    }

    /// Append a field in the next layout
    pub fn write<T: WireType + Send + 'static>(&mut self, value: T) {
        self.written.push(Field::new(value));
    }

    /// Read a field and write it back unchanged
    pub fn passthrough<T: WireType + Clone + Send + 'static>(&mut self) -> CodecResult<T> {
        let value = self.read::<T>()?;
        self.write(value.clone());
        Ok(value)
    }

    /// Forward every already materialized field as is
    ///
    /// Raw bytes not yet decoded are always forwarded, so this only matters
    /// after a remapper has inserted fields ahead of unread ones.
    pub fn passthrough_all(&mut self) {
        self.written.extend(self.readable.drain(..));
    }

    /// Drop everything that has not been read yet
    pub fn clear_input(&mut self) {
        self.readable.clear();
        self.input = Bytes::new();
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn send_before(&mut self, packet: PacketWrapper) {
        self.emitted.push(Emitted {
            order: EmitOrder::Before,
            packet,
        });
    }

    pub fn send_after(&mut self, packet: PacketWrapper) {
        self.emitted.push(Emitted {
            order: EmitOrder::After,
            packet,
        });
    }

    pub fn take_emitted(&mut self) -> Vec<Emitted> {
        std::mem::take(&mut self.emitted)
    }

    /// Make the fields written by the last step the input of the next
    ///
    /// Written fields come first, followed by materialized fields nobody
    /// consumed, followed by the raw remainder.
    pub fn reset_reader(&mut self) {
        let unread = std::mem::take(&mut self.readable);
        self.readable = self.written.drain(..).collect();
        self.readable.extend(unread);
    }

    /// Encode id and body
    pub fn into_bytes(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(5 + self.input.len());
        write_varint(&mut buf, self.id);
        for field in self.written.iter().chain(self.readable.iter()) {
            field.write_to(&mut buf);
        }
        buf.extend_from_slice(&self.input);
        buf.freeze()
    }
}
