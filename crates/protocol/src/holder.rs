//! Registry reference or inline value
//!
//! # Format
//! - Boolean: true when a registry id follows
//! - VarInt id, or the inline value when the flag is false

use crate::codecs::{read_varint, write_varint, CodecResult, WireType};
use bridge_core::CodecError;
use bytes::{Bytes, BytesMut};

/// Registry id that fits the non-negative VarInt range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u32);

impl RegistryId {
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(id: u32) -> Option<Self> {
        (id <= Self::MAX).then_some(RegistryId(id))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i32> for RegistryId {
    type Error = CodecError;

    fn try_from(id: i32) -> CodecResult<Self> {
        u32::try_from(id)
            .ok()
            .and_then(RegistryId::new)
            .ok_or_else(|| CodecError::malformed("Holder", format!("negative registry id {}", id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Holder<T> {
    Id(RegistryId),
    Direct(T),
}

impl<T> Holder<T> {
    pub fn is_id(&self) -> bool {
        matches!(self, Holder::Id(_))
    }

    /// Reference holder, or `None` when `id` is out of VarInt range
    pub fn reference(id: u32) -> Option<Self> {
        RegistryId::new(id).map(Holder::Id)
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            Holder::Id(id) => Some(id.get()),
            Holder::Direct(_) => None,
        }
    }

    pub fn direct(&self) -> Option<&T> {
        match self {
            Holder::Direct(value) => Some(value),
            Holder::Id(_) => None,
        }
    }
}

impl<T: WireType> WireType for Holder<T> {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        if bool::read(buf)? {
            Ok(Holder::Id(RegistryId::try_from(read_varint(buf)?)?))
        } else {
            Ok(Holder::Direct(T::read(buf)?))
        }
    }

    fn write(&self, buf: &mut BytesMut) {
        match self {
            Holder::Id(id) => {
                true.write(buf);
                // bounded by RegistryId::MAX
                write_varint(buf, id.get() as i32);
            }
            Holder::Direct(value) => {
                false.write(buf);
                value.write(buf);
            }
        }
    }
}
