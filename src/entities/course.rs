use super::{EntityKind, EntityRules, FieldRule, LanguagePair, NumericPolicy, SourceRecord};
use crate::translate::Language;
use crate::wire::{PlainValue, Record};

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Course,
    source_collection: "dev-languageApp-spanishCourse",
    destination_collection: "juno-middleware-languageApp-ChatterBoxCourses",
    key_attributes: &["Identifier"],
    languages: Some(LanguagePair {
        base: Language::En,
        target: Language::Es,
    }),
    numbers: NumericPolicy::Preserve,
    progress_fields: &["City"],
    fields: &[
        FieldRule::Copy {
            from: "Identifier",
            to: "Identifier",
        },
        FieldRule::Constant {
            to: "Targ_Lang_Code",
            value: Language::Es.tag(),
        },
        FieldRule::Constant {
            to: "Base_Lang_Code",
            value: Language::En.tag(),
        },
        FieldRule::Copy {
            from: "City",
            to: "City",
        },
        FieldRule::Copy {
            from: "Country",
            to: "Country",
        },
        FieldRule::Translate {
            from: "Description",
            to: "Base_Lang_Description",
            source: Language::En,
            target: Language::Es,
        },
        FieldRule::Copy {
            from: "Description",
            to: "Target_Lang_Description",
        },
        FieldRule::Derived {
            to: "Images",
            derive: image_urls,
        },
        FieldRule::Copy {
            from: "Vocabulary_List",
            to: "Vocabulary_List",
        },
    ],
};

/// Keep only the URL of each image entry.
fn image_urls(record: &SourceRecord<'_>) -> PlainValue {
    let images = record
        .sequence("Images")
        .iter()
        .filter_map(PlainValue::as_mapping)
        .map(|image| {
            let url = image
                .get("URL")
                .cloned()
                .unwrap_or_else(PlainValue::empty_text);
            PlainValue::Mapping(Record::from([("URL".to_string(), url)]))
        })
        .collect();
    PlainValue::text(PlainValue::Sequence(images).to_json_text())
}
