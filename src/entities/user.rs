use super::{EntityKind, EntityRules, FieldRule, NumericPolicy, SourceRecord};
use crate::translate::Language;
use crate::wire::{PlainValue, Record};

pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::User,
    source_collection: "dev-languageApp-spanishUsers",
    destination_collection: "juno-middleware-languageApp-ChatterBoxUsers",
    key_attributes: &["Identifier"],
    languages: None,
    numbers: NumericPolicy::AsText,
    progress_fields: &[],
    fields: copied_fields![
        "Identifier",
        "Email",
        "Account_Creation_Date",
        "Birthday",
        "Commitment_Level",
        "Country",
        "DailyAvailability",
        "Device_Information",
        "FCM_Token",
        "First_Name",
        "Gender",
        "Preffered_Language",
        "Profile_Picture",
        "Role",
        "Streak",
        "Subscription_End_Date",
        "Subscription_Start_Date",
        "Subscription_Status",
        "Time_Zone",
        "Usage_Metrics",
        "User_Preferences",
        "User_subscription_experiation",
        "Last_Login",
        "Last_Name",
        "Last_Streak_Change",
        "Lives",
        "Location",
        "Motivations";
        FieldRule::Constant {
            to: "Base_Lang",
            value: Language::En.tag(),
        },
        FieldRule::Derived {
            to: "Targ_Lang",
            derive: target_language_progress,
        },
    ],
};

/// Top-level `Current_Section` / `Current_Lesson` move under the target
/// language tag: `{"ES": {"Current_Section": .., "Current_Lesson": ..}}`.
fn target_language_progress(record: &SourceRecord<'_>) -> PlainValue {
    let progress = Record::from([
        (
            "Current_Section".to_string(),
            record.value_or_empty("Current_Section"),
        ),
        (
            "Current_Lesson".to_string(),
            record.value_or_empty("Current_Lesson"),
        ),
    ]);
    let details = Record::from([(Language::Es.tag().to_string(), PlainValue::Mapping(progress))]);
    PlainValue::text(PlainValue::Mapping(details).to_json_text())
}
