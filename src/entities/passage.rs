use super::{EntityKind, EntityRules, FieldRule, LanguagePair, NumericPolicy};
use crate::translate::Language;

const AUTHORED: Language = Language::Es;
const BASE: Language = Language::En;

/// Base-language copy of an authored field, machine-translated.
const fn translated(from: &'static str, to: &'static str) -> FieldRule {
    FieldRule::Translate {
        from,
        to,
        source: AUTHORED,
        target: BASE,
    }
}

const fn copied(from: &'static str, to: &'static str) -> FieldRule {
    FieldRule::Copy { from, to }
}

const fn options(from: &'static str, to: &'static str) -> FieldRule {
    FieldRule::JsonArray { from, to }
}

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Passage,
    source_collection: "dev-languageApp-spanishPassages",
    destination_collection: "juno-middleware-languageApp-ChatterBoxPassages",
    key_attributes: &["Identifier"],
    languages: Some(LanguagePair {
        base: BASE,
        target: AUTHORED,
    }),
    numbers: NumericPolicy::Preserve,
    progress_fields: &["Targ_Lang_Title"],
    fields: &[
        copied("Identifier", "Identifier"),
        copied("Level", "Level"),
        copied("Genre", "Genre"),
        FieldRule::Constant {
            to: "Base_Lang_Code",
            value: BASE.tag(),
        },
        translated("#name", "Base_Lang_Title"),
        translated("Description", "Base_Lang_Description"),
        translated("Answer_1", "Base_Lang_Answer_1"),
        translated("Answer_2", "Base_Lang_Answer_2"),
        translated("Answer_3", "Base_Lang_Answer_3"),
        translated("Answer_4", "Base_Lang_Answer_4"),
        options("Options_1", "Base_Lang_Options_1"),
        options("Options_2", "Base_Lang_Options_2"),
        options("Options_3", "Base_Lang_Options_3"),
        options("Options_4", "Base_Lang_Options_4"),
        translated("Passage", "Base_Lang_Passage"),
        translated("Question_1", "Base_Lang_Question_1"),
        translated("Question_2", "Base_Lang_Question_2"),
        translated("Question_3", "Base_Lang_Question_3"),
        translated("Question_4", "Base_Lang_Question_4"),
        FieldRule::Constant {
            to: "Targ_Lang_Code",
            value: AUTHORED.tag(),
        },
        copied("#name", "Targ_Lang_Title"),
        copied("Description", "Targ_Lang_Description"),
        copied("Answer_1", "Targ_Lang_Answer_1"),
        copied("Answer_2", "Targ_Lang_Answer_2"),
        copied("Answer_3", "Targ_Lang_Answer_3"),
        copied("Answer_4", "Targ_Lang_Answer_4"),
        options("Options_1", "Targ_Lang_Options_1"),
        options("Options_2", "Targ_Lang_Options_2"),
        options("Options_3", "Targ_Lang_Options_3"),
        options("Options_4", "Targ_Lang_Options_4"),
        copied("Passage", "Targ_Lang_Passage"),
        FieldRule::JsonArray {
            from: "Passage_Word_Timings",
            to: "Targ_Passage_Word_Timings",
        },
        copied("Passage_Audio_URL", "Targ_Passage_Audio_URL"),
        copied("Question_1", "Targ_Lang_Question_1"),
        copied("Question_2", "Targ_Lang_Question_2"),
        copied("Question_3", "Targ_Lang_Question_3"),
        copied("Question_4", "Targ_Lang_Question_4"),
        copied("ImageUrl", "ImageURL"),
        copied("Prompt", "Prompt"),
        copied("Level", "Section"),
    ],
};
