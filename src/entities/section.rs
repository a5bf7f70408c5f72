use super::{EntityKind, EntityRules, FieldRule, NumericPolicy, SourceRecord};
use crate::translate::Language;
use crate::wire::{PlainValue, Record, Scalar};

const PHOTO_LIST: &str = "PhotoList";
const IMAGE_INFO: &str = "ImageInfo";

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Section,
    source_collection: "dev-languageApp-spanishSections",
    destination_collection: "juno-middleware-languageApp-ChatterBoxSections",
    key_attributes: &["Identifier"],
    languages: None,
    numbers: NumericPolicy::Preserve,
    progress_fields: &[],
    fields: &[
        FieldRule::CopyOr {
            from: "Identifier",
            to: "Identifier",
            default: "Unknown",
        },
        FieldRule::Constant {
            to: "Targ_Lang_Code",
            value: Language::Es.tag(),
        },
        FieldRule::Constant {
            to: "Base_Lang_Code",
            value: Language::En.tag(),
        },
        FieldRule::Derived {
            to: "Lessons",
            derive: cleaned_lessons,
        },
    ],
};

fn cleaned_lessons(record: &SourceRecord<'_>) -> PlainValue {
    let lessons = record
        .sequence("Lessons")
        .iter()
        .filter_map(PlainValue::as_mapping)
        .map(|lesson| PlainValue::Mapping(clean_lesson(lesson.clone())))
        .collect();
    PlainValue::text(PlainValue::Sequence(lessons).to_json_text())
}

/// Drop `ImageInfo` unless the lesson is a photo list that actually carries
/// image objects.
pub(super) fn clean_lesson(mut lesson: Record) -> Record {
    if !keeps_image_info(&lesson) {
        lesson.shift_remove(IMAGE_INFO);
    }
    lesson
}

fn keeps_image_info(lesson: &Record) -> bool {
    if lesson.get("Type").and_then(PlainValue::as_str) != Some(PHOTO_LIST) {
        return false;
    }

    match lesson.get(IMAGE_INFO) {
        None => true,
        Some(PlainValue::Mapping(info)) => match info.get("ImageObjects") {
            Some(PlainValue::Sequence(objects)) => !objects.is_empty(),
            Some(PlainValue::Scalar(Scalar::Text(text))) => text.trim() != "[]",
            _ => true,
        },
        Some(_) => false,
    }
}
