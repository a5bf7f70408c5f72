use super::{EntityKind, EntityRules, FieldRule, LanguagePair, NumericPolicy, SourceRecord};
use crate::translate::Language;
use crate::wire::PlainValue;

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Vocabulary,
    source_collection: "dev-languageApp-spanishVocab",
    destination_collection: "jared-data-languageApp-ChatterBoxVocab",
    key_attributes: &["Identifier"],
    languages: Some(LanguagePair {
        base: Language::En,
        target: Language::Es,
    }),
    numbers: NumericPolicy::Preserve,
    progress_fields: &["Targ_Word"],
    fields: &[
        FieldRule::Copy {
            from: "Identifier",
            to: "Identifier",
        },
        FieldRule::Copy {
            from: "Level",
            to: "Level",
        },
        FieldRule::Copy {
            from: "EnglishWord",
            to: "Base_Word",
        },
        FieldRule::Constant {
            to: "Base_Lang_Code",
            value: Language::En.tag(),
        },
        FieldRule::JsonArray {
            from: "EnglishOptions",
            to: "Base_Lang_Options",
        },
        FieldRule::Copy {
            from: "SpanishWord",
            to: "Targ_Word",
        },
        FieldRule::Constant {
            to: "Targ_Lang_Code",
            value: Language::Es.tag(),
        },
        FieldRule::JsonArray {
            from: "SpanishOptions",
            to: "Targ_Lang_Options",
        },
        FieldRule::Copy {
            from: "Explanation_Word_Timing",
            to: "Explanation_Word_Timing",
        },
        FieldRule::Copy {
            from: "Phonetic_Transcription",
            to: "Phonetic_Transcription",
        },
        FieldRule::Copy {
            from: "Pronunciation_Explanation",
            to: "Pronunciation_Explanation",
        },
        FieldRule::Copy {
            from: "Pronunciation_Explanation_Audio",
            to: "Pronunciation_Explanation_Audio",
        },
        FieldRule::Derived {
            to: "Targ_Syllable",
            derive: trimmed_syllables,
        },
        FieldRule::JsonArray {
            from: "Syllable_Sounds",
            to: "Targ_Syllable_Sounds",
        },
        FieldRule::Copy {
            from: "Word_Audio",
            to: "Word_Audio",
        },
        FieldRule::FirstNonBlank {
            from: &["ImageUrl", "ImageURL"],
            to: "ImageURL",
        },
    ],
};

/// Syllables as a JSON array of trimmed strings. Members still wrapped as
/// `{"S": ..}` are unwrapped; members with no text form are skipped.
fn trimmed_syllables(record: &SourceRecord<'_>) -> PlainValue {
    let syllables = record
        .sequence("Syllables")
        .iter()
        .filter_map(PlainValue::as_text_lenient)
        .map(|syllable| PlainValue::text(syllable.trim()))
        .collect();
    PlainValue::text(PlainValue::Sequence(syllables).to_json_text())
}
