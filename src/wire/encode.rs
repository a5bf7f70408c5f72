use serde_json::{Map, Value};

use super::{PlainValue, RawRecord, Record, Scalar, TypeTag};

pub fn encode_record(record: &Record) -> RawRecord {
    record
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &PlainValue) -> Value {
    match value {
        PlainValue::Scalar(Scalar::Text(text)) => envelope(TypeTag::Text, Value::String(text.clone())),
        PlainValue::Scalar(Scalar::Number(text)) => {
            envelope(TypeTag::Number, Value::String(text.clone()))
        }
        PlainValue::Scalar(Scalar::Bool(flag)) => envelope(TypeTag::Boolean, Value::Bool(*flag)),
        PlainValue::Scalar(Scalar::Binary(encoded)) => {
            envelope(TypeTag::Binary, Value::String(encoded.clone()))
        }
        PlainValue::Scalar(Scalar::Null) => envelope(TypeTag::Null, Value::Bool(true)),
        PlainValue::Sequence(items) => {
            envelope(TypeTag::List, Value::Array(items.iter().map(encode_value).collect()))
        }
        PlainValue::Mapping(fields) => envelope(TypeTag::Map, Value::Object(encode_record(fields))),
    }
}

fn envelope(tag: TypeTag, inner: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(tag.as_str().to_string(), inner);
    Value::Object(map)
}

/// Key attribute text for a raw row in either encoding.
pub fn key_text(value: &Value) -> Option<String> {
    let text = match super::decode_value(value) {
        PlainValue::Scalar(Scalar::Text(text) | Scalar::Number(text)) => text,
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
