//! Armor trim pattern, the payload carried by trim holders

use crate::codecs::{
    read_string, read_varint, write_string, write_varint, CodecResult, WireType,
    DEFAULT_MAX_STRING_LEN,
};
use crate::tag::Tag;
use bytes::{Bytes, BytesMut};

/// # Format
/// - String: asset identifier
/// - VarInt: template item id
/// - Tag: description text component
/// - Boolean: decal
#[derive(Debug, Clone, PartialEq)]
pub struct ArmorTrimPattern {
    pub asset_name: String,
    pub item_id: i32,
    pub description: Tag,
    pub decal: bool,
}

impl WireType for ArmorTrimPattern {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Ok(Self {
            asset_name: read_string(buf, DEFAULT_MAX_STRING_LEN)?,
            item_id: read_varint(buf)?,
            description: Tag::read(buf)?,
            decal: bool::read(buf)?,
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        write_string(buf, &self.asset_name);
        write_varint(buf, self.item_id);
        self.description.write(buf);
        self.decal.write(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{decode, encode};
    use crate::holder::Holder;

    fn coast() -> ArmorTrimPattern {
        ArmorTrimPattern {
            asset_name: "minecraft:coast".into(),
            item_id: 3,
            description: Tag::String("Coast".into()),
            decal: false,
        }
    }

    #[test]
    fn test_pattern_layout() {
        let encoded = encode(&coast());
        assert_eq!(encoded[0], 15);
        assert_eq!(&encoded[1..16], b"minecraft:coast");
        assert_eq!(encoded[16], 0x03);
        assert_eq!(*encoded.last().unwrap(), 0x00);
    }

    #[test]
    fn test_inline_holder_roundtrip() {
        let holder = Holder::Direct(coast());
        let encoded = encode(&holder);
        assert_eq!(encoded[0], 0x00);
        let (decoded, consumed) = decode::<Holder<ArmorTrimPattern>>(&encoded).unwrap();
        assert_eq!(decoded, holder);
        assert_eq!(consumed, encoded.len());
    }
}
