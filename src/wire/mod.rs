//! Tagged attribute-value wire format.
//!
//! Source rows arrive either wire-encoded (every attribute wrapped in a
//! single-key envelope such as `{"S": "hi"}`) or already decoded into plain
//! JSON. Both shapes are normalized into [`PlainValue`] so that downstream
//! code matches on an explicit scalar/sequence/mapping discriminator.

use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

mod decode;
mod encode;

pub use decode::{decode_record, decode_value, is_wire_envelope};
pub use encode::{encode_record, key_text};

/// A raw row exactly as the collection client returned it.
pub type RawRecord = Map<String, Value>;

/// Ordered string-keyed record of plain values.
pub type Record = IndexMap<String, PlainValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    /// Exact decimal text; never routed through floating point.
    Number(String),
    Bool(bool),
    /// Opaque encoded bytes, kept in their transport (base64) form.
    Binary(String),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Scalar(Scalar),
    Sequence(Vec<PlainValue>),
    Mapping(Record),
}

/// The closed set of envelope keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Text,
    Number,
    Boolean,
    Null,
    Binary,
    List,
    Map,
    StringSet,
    NumberSet,
    BinarySet,
}

impl TypeTag {
    pub const ALL: [TypeTag; 10] = [
        TypeTag::Text,
        TypeTag::Number,
        TypeTag::Boolean,
        TypeTag::Null,
        TypeTag::Binary,
        TypeTag::List,
        TypeTag::Map,
        TypeTag::StringSet,
        TypeTag::NumberSet,
        TypeTag::BinarySet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "S",
            Self::Number => "N",
            Self::Boolean => "BOOL",
            Self::Null => "NULL",
            Self::Binary => "B",
            Self::List => "L",
            Self::Map => "M",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == key)
    }
}

impl PlainValue {
    pub fn text(value: impl Into<String>) -> Self {
        PlainValue::Scalar(Scalar::Text(value.into()))
    }

    pub fn empty_text() -> Self {
        PlainValue::text(String::new())
    }

    /// Structural conversion of plain JSON. Envelope-shaped objects are kept
    /// as ordinary mappings.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PlainValue::Scalar(Scalar::Null),
            Value::Bool(flag) => PlainValue::Scalar(Scalar::Bool(*flag)),
            Value::Number(number) => PlainValue::Scalar(Scalar::Number(number.to_string())),
            Value::String(text) => PlainValue::text(text.clone()),
            Value::Array(items) => {
                PlainValue::Sequence(items.iter().map(PlainValue::from_json).collect())
            }
            Value::Object(map) => PlainValue::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), PlainValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PlainValue::Scalar(Scalar::Text(text)) => Value::String(text.clone()),
            PlainValue::Scalar(Scalar::Number(text)) => match Number::from_str(text) {
                Ok(number) => Value::Number(number),
                Err(_) => Value::String(text.clone()),
            },
            PlainValue::Scalar(Scalar::Bool(flag)) => Value::Bool(*flag),
            PlainValue::Scalar(Scalar::Binary(encoded)) => Value::String(encoded.clone()),
            PlainValue::Scalar(Scalar::Null) => Value::Null,
            PlainValue::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            PlainValue::Mapping(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Compact JSON text of this value.
    pub fn to_json_text(&self) -> String {
        self.to_json().to_string()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlainValue::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Text view that also accepts numbers and still-wrapped `{"S": ..}` or
    /// `{"N": ..}` fragments left behind by partially decoded rows.
    pub fn as_text_lenient(&self) -> Option<String> {
        match self {
            PlainValue::Scalar(Scalar::Text(text) | Scalar::Number(text)) => Some(text.clone()),
            PlainValue::Mapping(fields) if fields.len() == 1 => {
                let (key, inner) = fields.first()?;
                match TypeTag::from_key(key)? {
                    TypeTag::Text | TypeTag::Number => inner.as_text_lenient(),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[PlainValue]> {
        match self {
            PlainValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Record> {
        match self {
            PlainValue::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    /// Replace every number, at any depth, with its text form.
    pub fn stringify_numbers(self) -> Self {
        match self {
            PlainValue::Scalar(Scalar::Number(text)) => PlainValue::text(text),
            PlainValue::Sequence(items) => PlainValue::Sequence(
                items.into_iter().map(PlainValue::stringify_numbers).collect(),
            ),
            PlainValue::Mapping(fields) => PlainValue::Mapping(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, value.stringify_numbers()))
                    .collect(),
            ),
            scalar => scalar,
        }
    }
}

pub fn record_to_json(record: &Record) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}
