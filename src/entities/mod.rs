//! Per-entity reshaping rules.
//!
//! Every job shares one transformation engine; the entities differ only in
//! their [`EntityRules`] table. A transform is total: absent or oddly shaped
//! source fields degrade to the neutral value of the target field.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::translate::{Language, TranslationGateway};
use crate::wire::{PlainValue, Record, Scalar, decode_value};

/// Rule list copying each named field under the same name, followed by any
/// extra rules given after `;`.
macro_rules! copied_fields {
    ($($field:literal),* $(,)? $(; $($extra:expr),* $(,)?)?) => {
        &[
            $(FieldRule::Copy { from: $field, to: $field },)*
            $($($extra,)*)?
        ]
    };
}

mod course;
mod metric;
mod notification;
mod passage;
mod section;
mod trivia;
mod user;
mod vocabulary;


const EMPTY_JSON_ARRAY: &str = "[]";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    #[value(alias = "user-action")]
    Metric,
    Notification,
    Passage,
    Section,
    Trivia,
    User,
    #[value(alias = "vocab")]
    Vocabulary,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Course,
        EntityKind::Metric,
        EntityKind::Notification,
        EntityKind::Passage,
        EntityKind::Section,
        EntityKind::Trivia,
        EntityKind::User,
        EntityKind::Vocabulary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Metric => "metric",
            Self::Notification => "notification",
            Self::Passage => "passage",
            Self::Section => "section",
            Self::Trivia => "trivia",
            Self::User => "user",
            Self::Vocabulary => "vocabulary",
        }
    }

    pub fn rules(self) -> &'static EntityRules {
        match self {
            Self::Course => &course::RULES,
            Self::Metric => &metric::RULES,
            Self::Notification => &notification::RULES,
            Self::Passage => &passage::RULES,
            Self::Section => &section::RULES,
            Self::Trivia => &trivia::RULES,
            Self::User => &user::RULES,
            Self::Vocabulary => &vocabulary::RULES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPolicy {
    Preserve,
    /// Every number, at any depth, is stored as text.
    AsText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    pub base: Language,
    pub target: Language,
}

pub type DeriveFn = fn(&SourceRecord<'_>) -> PlainValue;

#[derive(Clone, Copy)]
pub enum FieldRule {
    /// Verbatim copy; absent becomes empty text.
    Copy { from: &'static str, to: &'static str },
    CopyOr {
        from: &'static str,
        to: &'static str,
        default: &'static str,
    },
    /// First source field holding a non-blank value.
    FirstNonBlank {
        from: &'static [&'static str],
        to: &'static str,
    },
    Constant { to: &'static str, value: &'static str },
    Translate {
        from: &'static str,
        to: &'static str,
        source: Language,
        target: Language,
    },
    /// JSON array text of a source list; anything else becomes `[]`.
    JsonArray { from: &'static str, to: &'static str },
    /// JSON array text of a source list with every member translated.
    TranslatedJsonArray {
        from: &'static str,
        to: &'static str,
        source: Language,
        target: Language,
    },
    Derived { to: &'static str, derive: DeriveFn },
}

impl FieldRule {
    pub fn target(&self) -> &'static str {
        match *self {
            FieldRule::Copy { to, .. }
            | FieldRule::CopyOr { to, .. }
            | FieldRule::FirstNonBlank { to, .. }
            | FieldRule::Constant { to, .. }
            | FieldRule::Translate { to, .. }
            | FieldRule::JsonArray { to, .. }
            | FieldRule::TranslatedJsonArray { to, .. }
            | FieldRule::Derived { to, .. } => to,
        }
    }

    fn apply(&self, source: &SourceRecord<'_>, gateway: &TranslationGateway<'_>) -> PlainValue {
        match *self {
            FieldRule::Copy { from, .. } => source.value_or_empty(from),
            FieldRule::CopyOr { from, default, .. } => source
                .get(from)
                .cloned()
                .unwrap_or_else(|| PlainValue::text(default)),
            FieldRule::FirstNonBlank { from, .. } => from
                .iter()
                .filter_map(|field| source.get(field))
                .find(|value| !is_blank(value))
                .cloned()
                .unwrap_or_else(PlainValue::empty_text),
            FieldRule::Constant { value, .. } => PlainValue::text(value),
            FieldRule::Translate {
                from,
                source: from_lang,
                target: to_lang,
                ..
            } => PlainValue::text(gateway.translate(&source.text(from), from_lang, to_lang)),
            FieldRule::JsonArray { from, .. } => PlainValue::text(json_array_text(source.get(from))),
            FieldRule::TranslatedJsonArray {
                from,
                source: from_lang,
                target: to_lang,
                ..
            } => {
                let translated = source
                    .sequence(from)
                    .iter()
                    .map(|member| {
                        let text = member.as_text_lenient().unwrap_or_default();
                        PlainValue::text(gateway.translate(&text, from_lang, to_lang))
                    })
                    .collect();
                PlainValue::text(PlainValue::Sequence(translated).to_json_text())
            }
            FieldRule::Derived { derive, .. } => derive(source),
        }
    }
}

pub struct EntityRules {
    pub kind: EntityKind,
    pub source_collection: &'static str,
    pub destination_collection: &'static str,
    pub key_attributes: &'static [&'static str],
    pub languages: Option<LanguagePair>,
    pub numbers: NumericPolicy,
    /// Target fields echoed in the per-record progress line.
    pub progress_fields: &'static [&'static str],
    pub fields: &'static [FieldRule],
}

impl EntityRules {
    /// Whether any field goes through the translation dependency.
    pub fn translates(&self) -> bool {
        self.fields.iter().any(|rule| {
            matches!(
                rule,
                FieldRule::Translate { .. } | FieldRule::TranslatedJsonArray { .. }
            )
        })
    }
}

/// Read-only view of a decoded source record with default-on-absence getters.
pub struct SourceRecord<'a> {
    fields: &'a Record,
}

impl<'a> SourceRecord<'a> {
    pub fn new(fields: &'a Record) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&'a PlainValue> {
        self.fields.get(field)
    }

    pub fn value_or_empty(&self, field: &str) -> PlainValue {
        self.get(field).cloned().unwrap_or_else(PlainValue::empty_text)
    }

    pub fn text(&self, field: &str) -> String {
        self.get(field)
            .and_then(PlainValue::as_text_lenient)
            .unwrap_or_default()
    }

    pub fn sequence(&self, field: &str) -> &'a [PlainValue] {
        self.get(field)
            .and_then(PlainValue::as_sequence)
            .unwrap_or_default()
    }
}

/// Reshape one decoded source record into the target schema.
pub fn transform(
    rules: &EntityRules,
    record: &Record,
    gateway: &TranslationGateway<'_>,
) -> Record {
    let normalized;
    let record = match rules.numbers {
        NumericPolicy::Preserve => record,
        NumericPolicy::AsText => {
            normalized = record
                .iter()
                .map(|(key, value)| (key.clone(), value.clone().stringify_numbers()))
                .collect::<Record>();
            &normalized
        }
    };

    let source = SourceRecord::new(record);
    rules
        .fields
        .iter()
        .map(|rule| (rule.target().to_string(), rule.apply(&source, gateway)))
        .collect()
}

/// JSON array text for a nested list field. Members still wrapped in wire
/// envelopes are unwrapped first; a value that is already JSON array text is
/// kept as is.
pub fn json_array_text(value: Option<&PlainValue>) -> String {
    match value {
        Some(PlainValue::Sequence(members)) => {
            let members = members.iter().map(unwrap_fragment).collect();
            PlainValue::Sequence(members).to_json_text()
        }
        Some(value) => match value.as_str() {
            Some(text) if matches!(serde_json::from_str::<Value>(text), Ok(Value::Array(_))) => {
                text.to_string()
            }
            _ => EMPTY_JSON_ARRAY.to_string(),
        },
        None => EMPTY_JSON_ARRAY.to_string(),
    }
}

fn unwrap_fragment(member: &PlainValue) -> PlainValue {
    match member {
        PlainValue::Mapping(_) => decode_value(&member.to_json()),
        other => other.clone(),
    }
}

fn is_blank(value: &PlainValue) -> bool {
    match value {
        PlainValue::Scalar(Scalar::Text(text)) => text.trim().is_empty(),
        PlainValue::Scalar(Scalar::Null) => true,
        PlainValue::Sequence(items) => items.is_empty(),
        PlainValue::Mapping(fields) => fields.is_empty(),
        PlainValue::Scalar(_) => false,
    }
}
