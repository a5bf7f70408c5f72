use super::{EntityKind, EntityRules, FieldRule, NumericPolicy};
use crate::translate::Language;

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Notification,
    source_collection: "dev-languageApp-Notificationsv2",
    destination_collection: "juno-middleware-languageApp-Notificationsv3",
    key_attributes: &["Identifier"],
    languages: None,
    numbers: NumericPolicy::Preserve,
    progress_fields: &["Title"],
    fields: copied_fields![
        "Identifier",
        "Language",
        "Type",
        "Title",
        "Body",
        "Date_Started",
        "Date_Retired",
        "isActive",
        "Use_Case";
        FieldRule::Constant {
            to: "Lang_Code",
            value: Language::En.tag(),
        },
    ],
};
