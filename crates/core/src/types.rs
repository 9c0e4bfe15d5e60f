/// Schema-unique key of a form field.
pub type FieldId = String;

/// Raw submitted values keyed by `field_id`.
pub type SubmissionData = serde_json::Map<String, serde_json::Value>;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
