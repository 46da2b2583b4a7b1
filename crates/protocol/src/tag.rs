//! Binary named tags
//!
//! Network form used since 1.20.2: the root is a type byte followed directly
//! by the payload, without a root name. A root type byte of 0 means "no tag".
//!
//! # Payload formats
//! - Compound: repeated (type byte, u16-prefixed name, payload), ended by 0
//! - List: element type byte, i32 count, payloads
//! - Arrays: i32 count, elements
//! - String: u16 byte length, UTF-8 bytes

use crate::codecs::{ensure, CodecResult, WireType};
use bridge_core::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for compounds and lists
pub const MAX_DEPTH: usize = 512;

/// Longest string or name the u16 length prefix can describe
pub const MAX_TAG_STRING_LEN: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    /// Element type id and elements; the id is kept so empty lists re-encode
    /// exactly
    List(u8, Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn type_id(&self) -> u8 {
        match self {
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(..) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Build a list, taking the element type from the first element
    pub fn list(items: Vec<Tag>) -> Tag {
        let element = items.first().map(Tag::type_id).unwrap_or(TAG_END);
        Tag::List(element, items)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric value of any integral tag
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(*v as i64),
            Tag::Short(v) => Some(*v as i64),
            Tag::Int(v) => Some(*v as i64),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Read a network root tag; `None` when the type byte is 0
    /// Check that every length fits its prefix
    ///
    /// Writing is infallible, so anything built from untrusted input goes
    /// through here before it reaches the wire.
    pub fn check_encodable(&self) -> CodecResult<()> {
        match self {
            Tag::String(v) => check_tag_string(v),
            Tag::ByteArray(v) => check_count("ByteArray", v.len()),
            Tag::IntArray(v) => check_count("IntArray", v.len()),
            Tag::LongArray(v) => check_count("LongArray", v.len()),
            Tag::List(_, items) => {
                check_count("List", items.len())?;
                items.iter().try_for_each(Tag::check_encodable)
            }
            Tag::Compound(compound) => compound.iter().try_for_each(|(name, value)| {
                check_tag_string(name)?;
                value.check_encodable()
            }),
            _ => Ok(()),
        }
    }

    pub fn read_root(buf: &mut Bytes) -> CodecResult<Option<Tag>> {
        ensure(buf, 1, "Tag")?;
        let type_id = buf.get_u8();
        if type_id == TAG_END {
            return Ok(None);
        }
        read_payload(buf, type_id, 0).map(Some)
    }

    pub fn write_root(tag: Option<&Tag>, buf: &mut BytesMut) {
        match tag {
            Some(tag) => {
                buf.put_u8(tag.type_id());
                write_payload(tag, buf);
            }
            None => buf.put_u8(TAG_END),
        }
    }
}

/// Tag that must be present
impl WireType for Tag {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Tag::read_root(buf)?.ok_or_else(|| CodecError::malformed("Tag", "unexpected end tag"))
    }

    fn write(&self, buf: &mut BytesMut) {
        Tag::write_root(Some(self), buf);
    }
}

/// Tag that may be absent (root type byte 0)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionalTag(pub Option<Tag>);

impl WireType for OptionalTag {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        Tag::read_root(buf).map(OptionalTag)
    }

    fn write(&self, buf: &mut BytesMut) {
        Tag::write_root(self.0.as_ref(), buf);
    }
}

/// Compound tag with entries kept in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: Tag) -> Option<Tag> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        let mut compound = Compound::new();
        for (key, value) in iter {
            compound.insert(key, value);
        }
        compound
    }
}

fn read_len(buf: &mut Bytes, what: &'static str, element_size: usize) -> CodecResult<usize> {
    ensure(buf, 4, what)?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(CodecError::malformed(what, format!("negative length {}", len)));
    }
    let len = len as usize;
    ensure(buf, len.saturating_mul(element_size), what)?;
    Ok(len)
}

fn read_tag_string(buf: &mut Bytes) -> CodecResult<String> {
    ensure(buf, 2, "TagString")?;
    let len = buf.get_u16() as usize;
    ensure(buf, len, "TagString")?;
    let bytes = buf.split_to(len);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CodecError::malformed("TagString", format!("invalid UTF-8: {}", e)))
}

fn check_tag_string(value: &str) -> CodecResult<()> {
    if value.len() > MAX_TAG_STRING_LEN {
        return Err(CodecError::malformed(
            "TagString",
            format!("{} bytes exceed the {} byte limit", value.len(), MAX_TAG_STRING_LEN),
        ));
    }
    Ok(())
}

fn check_count(what: &'static str, count: usize) -> CodecResult<()> {
    if count > i32::MAX as usize {
        return Err(CodecError::malformed(what, format!("{} elements", count)));
    }
    Ok(())
}

fn write_tag_string(value: &str, buf: &mut BytesMut) {
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

fn read_payload(buf: &mut Bytes, type_id: u8, depth: usize) -> CodecResult<Tag> {
    if depth > MAX_DEPTH {
        return Err(CodecError::malformed(
            "Tag",
            format!("nesting deeper than {}", MAX_DEPTH),
        ));
    }

    let tag = match type_id {
        TAG_BYTE => {
            ensure(buf, 1, "ByteTag")?;
            Tag::Byte(buf.get_i8())
        }
        TAG_SHORT => {
            ensure(buf, 2, "ShortTag")?;
            Tag::Short(buf.get_i16())
        }
        TAG_INT => {
            ensure(buf, 4, "IntTag")?;
            Tag::Int(buf.get_i32())
        }
        TAG_LONG => {
            ensure(buf, 8, "LongTag")?;
            Tag::Long(buf.get_i64())
        }
        TAG_FLOAT => {
            ensure(buf, 4, "FloatTag")?;
            Tag::Float(buf.get_f32())
        }
        TAG_DOUBLE => {
            ensure(buf, 8, "DoubleTag")?;
            Tag::Double(buf.get_f64())
        }
        TAG_BYTE_ARRAY => {
            let len = read_len(buf, "ByteArrayTag", 1)?;
            Tag::ByteArray(buf.split_to(len).to_vec())
        }
        TAG_STRING => Tag::String(read_tag_string(buf)?),
        TAG_LIST => {
            ensure(buf, 1, "ListTag")?;
            let element = buf.get_u8();
            let len = read_len(buf, "ListTag", 0)?;
            if len > 0 && element == TAG_END {
                return Err(CodecError::malformed("ListTag", "non-empty list of end tags"));
            }
            // every element takes at least one byte except end tags
            ensure(buf, len, "ListTag")?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(read_payload(buf, element, depth + 1)?);
            }
            Tag::List(element, items)
        }
        TAG_COMPOUND => {
            let mut compound = Compound::new();
            loop {
                ensure(buf, 1, "CompoundTag")?;
                let child = buf.get_u8();
                if child == TAG_END {
                    break;
                }
                let name = read_tag_string(buf)?;
                let value = read_payload(buf, child, depth + 1)?;
                compound.insert(name, value);
            }
            Tag::Compound(compound)
        }
        TAG_INT_ARRAY => {
            let len = read_len(buf, "IntArrayTag", 4)?;
            Tag::IntArray((0..len).map(|_| buf.get_i32()).collect())
        }
        TAG_LONG_ARRAY => {
            let len = read_len(buf, "LongArrayTag", 8)?;
            Tag::LongArray((0..len).map(|_| buf.get_i64()).collect())
        }
        other => {
            return Err(CodecError::malformed(
                "Tag",
                format!("unknown tag type {}", other),
            ))
        }
    };
    Ok(tag)
}

fn write_payload(tag: &Tag, buf: &mut BytesMut) {
    match tag {
        Tag::Byte(v) => buf.put_i8(*v),
        Tag::Short(v) => buf.put_i16(*v),
        Tag::Int(v) => buf.put_i32(*v),
        Tag::Long(v) => buf.put_i64(*v),
        Tag::Float(v) => buf.put_f32(*v),
        Tag::Double(v) => buf.put_f64(*v),
        Tag::ByteArray(v) => {
            buf.put_i32(v.len() as i32);
            buf.put_slice(v);
        }
        Tag::String(v) => write_tag_string(v, buf),
        Tag::List(element, items) => {
            buf.put_u8(*element);
            buf.put_i32(items.len() as i32);
            for item in items {
                write_payload(item, buf);
            }
        }
        Tag::Compound(compound) => {
            for (name, value) in compound.iter() {
                buf.put_u8(value.type_id());
                write_tag_string(name, buf);
                write_payload(value, buf);
            }
            buf.put_u8(TAG_END);
        }
        Tag::IntArray(v) => {
            buf.put_i32(v.len() as i32);
            for value in v {
                buf.put_i32(*value);
            }
        }
        Tag::LongArray(v) => {
            buf.put_i32(v.len() as i32);
            for value in v {
                buf.put_i64(*value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{decode, encode};

    #[test]
    fn test_empty_root_is_none() {
        let (tag, consumed) = decode::<OptionalTag>(&[0x00]).unwrap();
        assert_eq!(tag, OptionalTag(None));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_required_tag_rejects_end() {
        assert!(decode::<Tag>(&[0x00]).is_err());
    }

    #[test]
    fn test_string_root_layout() {
        let encoded = encode(&Tag::String("hi".into()));
        assert_eq!(&encoded[..], &[TAG_STRING, 0x00, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_compound_keeps_order() {
        let mut compound = Compound::new();
        compound.insert("zeta", Tag::Byte(1));
        compound.insert("alpha", Tag::Int(2));
        compound.insert("zeta", Tag::Byte(3));

        let keys: Vec<&str> = compound.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        let tag = Tag::Compound(compound);
        let (decoded, _) = decode::<Tag>(&encode(&tag)).unwrap();
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_nested_structures() {
        let mut inner = Compound::new();
        inner.insert("values", Tag::IntArray(vec![1, -2, 3]));
        inner.insert("longs", Tag::LongArray(vec![i64::MIN]));
        inner.insert("bytes", Tag::ByteArray(vec![9, 8]));

        let mut outer = Compound::new();
        outer.insert("list", Tag::list(vec![Tag::Compound(inner)]));
        outer.insert("empty", Tag::List(TAG_STRING, Vec::new()));
        outer.insert("pi", Tag::Double(3.5));

        let tag = Tag::Compound(outer);
        let encoded = encode(&tag);
        let (decoded, consumed) = decode::<Tag>(&encoded).unwrap();
        assert_eq!(decoded, tag);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = decode::<Tag>(&[13]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn test_oversized_array_is_truncated() {
        let err = decode::<Tag>(&[TAG_INT_ARRAY, 0x7F, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_long_strings_are_not_encodable() {
        let fits = Tag::String("a".repeat(MAX_TAG_STRING_LEN));
        assert!(fits.check_encodable().is_ok());

        let long = Tag::String("a".repeat(70_000));
        let err = long.check_encodable().unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));

        let mut compound = Compound::new();
        compound.insert("b".repeat(MAX_TAG_STRING_LEN + 1), Tag::Byte(0));
        let nested = Tag::list(vec![Tag::Compound(compound)]);
        assert!(nested.check_encodable().is_err());
    }

    #[test]
    fn test_depth_limit() {
        // lists of lists, each level: element type 9, count 1
        let mut bytes = vec![TAG_LIST];
        for _ in 0..=MAX_DEPTH + 1 {
            bytes.extend_from_slice(&[TAG_LIST, 0, 0, 0, 1]);
        }
        let err = decode::<Tag>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }
}
