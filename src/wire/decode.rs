use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::{PlainValue, RawRecord, Record, Scalar, TypeTag};

#[derive(Debug, Error)]
#[error("`{tag}` envelope expects {expected}")]
struct MalformedEnvelope {
    tag: &'static str,
    expected: &'static str,
}

impl MalformedEnvelope {
    fn new(tag: TypeTag, expected: &'static str) -> Self {
        Self {
            tag: tag.as_str(),
            expected,
        }
    }
}

/// True when `value` has the single-key shape of a wire envelope.
pub fn is_wire_envelope(value: &Value) -> bool {
    match value {
        Value::Object(map) => envelope_parts(map).is_some(),
        _ => false,
    }
}

/// Decode every attribute of a wire-encoded row. Each top-level field is
/// classified on its own, so rows mixing wrapped and plain attributes decode
/// field by field.
pub fn decode_record(raw: &RawRecord) -> Record {
    raw.iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

pub fn decode_value(value: &Value) -> PlainValue {
    match value {
        Value::Object(map) => match envelope_parts(map) {
            Some((tag, inner)) => decode_envelope(tag, inner).unwrap_or_else(|err| {
                warn!(fragment = %value, error = %err, "malformed wire envelope, decoding structurally");
                decode_mapping(map)
            }),
            None => decode_mapping(map),
        },
        Value::Array(items) => PlainValue::Sequence(items.iter().map(decode_value).collect()),
        scalar => PlainValue::from_json(scalar),
    }
}

fn envelope_parts(map: &Map<String, Value>) -> Option<(TypeTag, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    TypeTag::from_key(key).map(|tag| (tag, inner))
}

fn decode_mapping(map: &Map<String, Value>) -> PlainValue {
    PlainValue::Mapping(
        map.iter()
            .map(|(key, value)| (key.clone(), decode_value(value)))
            .collect(),
    )
}

fn decode_envelope(tag: TypeTag, inner: &Value) -> Result<PlainValue, MalformedEnvelope> {
    let value = match (tag, inner) {
        (TypeTag::Text, Value::String(text)) => PlainValue::text(text.clone()),
        (TypeTag::Number, number) => PlainValue::Scalar(Scalar::Number(
            number_text(number).ok_or_else(|| MalformedEnvelope::new(tag, "numeric text"))?,
        )),
        (TypeTag::Boolean, Value::Bool(flag)) => PlainValue::Scalar(Scalar::Bool(*flag)),
        (TypeTag::Null, _) => PlainValue::Scalar(Scalar::Null),
        (TypeTag::Binary, Value::String(encoded)) => {
            PlainValue::Scalar(Scalar::Binary(encoded.clone()))
        }
        (TypeTag::List, Value::Array(items)) => {
            PlainValue::Sequence(items.iter().map(decode_value).collect())
        }
        (TypeTag::Map, Value::Object(map)) => decode_mapping(map),
        (TypeTag::StringSet, Value::Array(items)) => {
            PlainValue::Sequence(set_members(tag, items, |member| {
                member.as_str().map(PlainValue::text)
            })?)
        }
        (TypeTag::NumberSet, Value::Array(items)) => {
            PlainValue::Sequence(set_members(tag, items, |member| {
                number_text(member).map(|text| PlainValue::Scalar(Scalar::Number(text)))
            })?)
        }
        (TypeTag::BinarySet, Value::Array(items)) => {
            PlainValue::Sequence(set_members(tag, items, |member| {
                member
                    .as_str()
                    .map(|encoded| PlainValue::Scalar(Scalar::Binary(encoded.to_string())))
            })?)
        }
        (TypeTag::Text, _) => return Err(MalformedEnvelope::new(tag, "a string")),
        (TypeTag::Boolean, _) => return Err(MalformedEnvelope::new(tag, "a boolean")),
        (TypeTag::Binary, _) => return Err(MalformedEnvelope::new(tag, "encoded text")),
        (TypeTag::List, _) => return Err(MalformedEnvelope::new(tag, "an array")),
        (TypeTag::Map, _) => return Err(MalformedEnvelope::new(tag, "an object")),
        (TypeTag::StringSet | TypeTag::NumberSet | TypeTag::BinarySet, _) => {
            return Err(MalformedEnvelope::new(tag, "an array of members"));
        }
    };
    Ok(value)
}

fn set_members(
    tag: TypeTag,
    items: &[Value],
    member: impl Fn(&Value) -> Option<PlainValue>,
) -> Result<Vec<PlainValue>, MalformedEnvelope> {
    items
        .iter()
        .map(|item| member(item).ok_or_else(|| MalformedEnvelope::new(tag, "members of one kind")))
        .collect()
}

fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if is_decimal_text(text.trim()) => {
            Some(json_number_text(text.trim()))
        }
        _ => None,
    }
}

/// Rewrite accepted decimal text into JSON number grammar: no leading `+`,
/// no redundant leading zeros, and a digit on both sides of the point.
fn json_number_text(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match digits.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (digits, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };

    let whole = whole.trim_start_matches('0');
    let mut normalized = String::from(sign);
    normalized.push_str(if whole.is_empty() { "0" } else { whole });
    if let Some(fraction) = fraction {
        normalized.push('.');
        normalized.push_str(if fraction.is_empty() { "0" } else { fraction });
    }
    if let Some(exponent) = exponent {
        normalized.push('e');
        normalized.push_str(exponent);
    }
    normalized
}

fn is_decimal_text(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match digits.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (digits, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let mantissa_ok = (!whole.is_empty() || !fraction.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit());

    let exponent_ok = exponent
        .map(|exp| {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && exp.bytes().all(|b| b.is_ascii_digit())
        })
        .unwrap_or(true);

    mantissa_ok && exponent_ok
}
