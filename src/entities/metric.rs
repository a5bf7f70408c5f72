use super::{EntityKind, EntityRules, FieldRule, NumericPolicy};

// Legacy `event_id` is dropped.
pub(super) const RULES: EntityRules = EntityRules {
    kind: EntityKind::Metric,
    source_collection: "dev-languageApp-userActions",
    destination_collection: "userActions",
    key_attributes: &["user_id", "timestamp"],
    languages: None,
    numbers: NumericPolicy::Preserve,
    progress_fields: &["event"],
    fields: copied_fields![
        "user_id",
        "event",
        "device_id",
        "event_detail",
        "event_detail_2",
        "event_detail_3",
        "event_type",
        "location_id",
        "section",
        "section_level",
        "session_id",
        "timestamp",
    ],
};
