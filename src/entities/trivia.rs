use super::{EntityKind, EntityRules, FieldRule, LanguagePair, NumericPolicy};
use crate::translate::Language;

// Questions are authored in Spanish; options and answers in English.
pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Trivia,
    source_collection: "dev-languageApp-spanishTriviaQuestions",
    destination_collection: "juno-middleware-languageApp-ChatterBoxTriviaQuestions",
    key_attributes: &["identifier"],
    languages: Some(LanguagePair {
        base: Language::En,
        target: Language::Es,
    }),
    numbers: NumericPolicy::Preserve,
    progress_fields: &["Targ_Lang_Question"],
    fields: &[
        FieldRule::Copy {
            from: "identifier",
            to: "identifier",
        },
        FieldRule::Copy {
            from: "level",
            to: "level",
        },
        FieldRule::Constant {
            to: "Base_Lang_Code",
            value: Language::En.tag(),
        },
        FieldRule::Translate {
            from: "question",
            to: "Base_Lang_Question",
            source: Language::Es,
            target: Language::En,
        },
        FieldRule::JsonArray {
            from: "options",
            to: "Base_Lang_Options",
        },
        FieldRule::Copy {
            from: "answer",
            to: "Base_Lang_Answer",
        },
        FieldRule::Constant {
            to: "Targ_Lang_Code",
            value: Language::Es.tag(),
        },
        FieldRule::Copy {
            from: "question",
            to: "Targ_Lang_Question",
        },
        FieldRule::TranslatedJsonArray {
            from: "options",
            to: "Targ_Lang_Options",
            source: Language::En,
            target: Language::Es,
        },
        FieldRule::Translate {
            from: "answer",
            to: "Targ_Lang_Answer",
            source: Language::En,
            target: Language::Es,
        },
        FieldRule::Copy {
            from: "imageUrl",
            to: "imageURL",
        },
    ],
};
