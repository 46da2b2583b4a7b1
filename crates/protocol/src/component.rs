//! Text components
//!
//! Up to 1.20.2 text components travel as JSON strings. From 1.20.3 on they
//! travel as tags. The conversion keeps the structure and maps scalar types:
//!
//! - JSON booleans become byte tags; bytes holding 0 or 1 and style flags
//!   convert back to booleans
//! - integral numbers become int tags, or long tags when they do not fit
//! - other numbers become double tags
//! - lists whose elements differ in type wrap every element as `{"": value}`
//!
//! Object keys keep their order in both directions. Strings longer than a tag
//! can carry are rejected rather than cut.

use crate::codecs::{read_string, write_string, CodecResult, WireType};
use crate::tag::{Compound, Tag, TAG_COMPOUND};
use bridge_core::{BridgeError, Result};
use bytes::{Bytes, BytesMut};
use serde_json::{Map, Number, Value};

/// Character limit for JSON text components
pub const MAX_COMPONENT_LEN: usize = 262_144;

/// Style keys whose byte tags convert back to JSON booleans
const BOOLEAN_KEYS: &[&str] = &[
    "bold",
    "italic",
    "underlined",
    "strikethrough",
    "obfuscated",
    "interpret",
];

/// JSON text component as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonComponent(pub String);

impl WireType for JsonComponent {
    fn read(buf: &mut Bytes) -> CodecResult<Self> {
        read_string(buf, MAX_COMPONENT_LEN).map(JsonComponent)
    }

    fn write(&self, buf: &mut BytesMut) {
        write_string(buf, &self.0);
    }
}

impl JsonComponent {
    pub fn plain(text: &str) -> Self {
        JsonComponent(Value::String(text.to_owned()).to_string())
    }

    /// Parse and convert to the tag form
    pub fn to_tag(&self) -> Result<Tag> {
        let value: Value = serde_json::from_str(&self.0)
            .map_err(|e| BridgeError::Remap(format!("invalid JSON component: {}", e)))?;
        let tag = json_to_tag(&value)?;
        tag.check_encodable()?;
        Ok(tag)
    }

    pub fn from_tag(tag: &Tag) -> Result<Self> {
        Ok(JsonComponent(tag_to_json(tag, None)?.to_string()))
    }
}

pub fn json_to_tag(value: &Value) -> Result<Tag> {
    match value {
        Value::Null => Err(BridgeError::Remap("null in text component".into())),
        Value::Bool(flag) => Ok(Tag::Byte(*flag as i8)),
        Value::Number(number) => Ok(number_to_tag(number)),
        Value::String(text) => Ok(Tag::String(text.clone())),
        Value::Array(items) => {
            let tags = items.iter().map(json_to_tag).collect::<Result<Vec<_>>>()?;
            let uniform = tags
                .windows(2)
                .all(|pair| pair[0].type_id() == pair[1].type_id());
            if uniform {
                Ok(Tag::list(tags))
            } else {
                let wrapped = tags
                    .into_iter()
                    .map(|tag| match tag {
                        Tag::Compound(compound) => Tag::Compound(compound),
                        other => {
                            let mut wrapper = Compound::new();
                            wrapper.insert("", other);
                            Tag::Compound(wrapper)
                        }
                    })
                    .collect();
                Ok(Tag::List(TAG_COMPOUND, wrapped))
            }
        }
        Value::Object(fields) => {
            let mut compound = Compound::new();
            for (key, value) in fields {
                compound.insert(key.clone(), json_to_tag(value)?);
            }
            Ok(Tag::Compound(compound))
        }
    }
}

fn number_to_tag(number: &Number) -> Tag {
    if let Some(value) = number.as_i64() {
        match i32::try_from(value) {
            Ok(small) => Tag::Int(small),
            Err(_) => Tag::Long(value),
        }
    } else {
        Tag::Double(number.as_f64().unwrap_or_default())
    }
}

/// Convert a tag back to JSON; `key` is the name the tag is stored under
pub fn tag_to_json(tag: &Tag, key: Option<&str>) -> Result<Value> {
    let value = match tag {
        Tag::Byte(v) if key.is_some_and(|k| BOOLEAN_KEYS.contains(&k)) => Value::Bool(*v != 0),
        Tag::Byte(v @ (0 | 1)) => Value::Bool(*v == 1),
        Tag::Byte(v) => Value::from(*v),
        Tag::Short(v) => Value::from(*v),
        Tag::Int(v) => Value::from(*v),
        Tag::Long(v) => Value::from(*v),
        Tag::Float(v) => float_value(*v as f64)?,
        Tag::Double(v) => float_value(*v)?,
        Tag::String(v) => Value::String(v.clone()),
        Tag::ByteArray(v) => Value::Array(v.iter().map(|b| Value::from(*b as i8)).collect()),
        Tag::IntArray(v) => Value::Array(v.iter().map(|i| Value::from(*i)).collect()),
        Tag::LongArray(v) => Value::Array(v.iter().map(|l| Value::from(*l)).collect()),
        Tag::List(_, items) => Value::Array(
            items
                .iter()
                .map(|item| match item.as_compound() {
                    Some(wrapper) if wrapper.len() == 1 && wrapper.contains_key("") => {
                        tag_to_json(wrapper.get("").unwrap_or(item), None)
                    }
                    _ => tag_to_json(item, None),
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Tag::Compound(compound) => {
            let mut fields = Map::new();
            for (name, value) in compound.iter() {
                fields.insert(name.to_owned(), tag_to_json(value, Some(name))?);
            }
            Value::Object(fields)
        }
    };
    Ok(value)
}

fn float_value(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| BridgeError::Remap(format!("non-finite number {} in text component", value)))
}
