//! Form schema model.
//!
//! The JSON field names here (`field_id`, `field_type`, `required`,
//! `validation_rules`, `field_options`, `conditional_logic`) are a stable
//! contract with the schema-authoring side and must not be renamed.
//! Decoding is lenient wherever a malformed extension could otherwise
//! reject a whole schema.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::condition::Condition;
use crate::error::CoreError;
use crate::value::{to_list, to_number};

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// Field types with a dedicated intrinsic check. Everything else is
/// [`FieldType::Other`] and only runs its declared rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Email,
    Url,
    Numeric,
    Date,
    Phone,
    FileUpload,
    Image,
    Coordinates,
    Json,
    Xml,
    Select,
    MultiSelect,
    Other,
}

impl FieldType {
    /// Map a schema `field_type` tag to its intrinsic check.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "url" => Self::Url,
            "numeric" | "number" => Self::Numeric,
            "date" => Self::Date,
            "phone" | "tel" => Self::Phone,
            "file" | "file_upload" => Self::FileUpload,
            "image" => Self::Image,
            "coordinates" | "location" => Self::Coordinates,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "select" | "radio" => Self::Select,
            "multiselect" | "multi_select" | "checkbox" | "checkboxes" => Self::MultiSelect,
            _ => Self::Other,
        }
    }

    /// Noun used in the type-mismatch message.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Email => "email address",
            Self::Url => "URL",
            Self::Numeric => "number",
            Self::Date => "date",
            Self::Phone => "phone number",
            Self::FileUpload => "file",
            Self::Image => "image",
            Self::Coordinates => "set of coordinates",
            Self::Json => "JSON document",
            Self::Xml => "XML document",
            Self::Select | Self::MultiSelect => "option",
            Self::Other => "value",
        }
    }
}

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

const DEFAULT_FIELD_TYPE: &str = "text";

fn default_field_type() -> String {
    DEFAULT_FIELD_TYPE.to_string()
}

/// Declarative description of one form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field_id: String,
    #[serde(default = "default_field_type", deserialize_with = "lenient_field_type")]
    pub field_type: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub required: bool,
    /// Rule name -> parameter, in declared order.
    #[serde(default, deserialize_with = "lenient_rules")]
    pub validation_rules: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<Condition>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub field_options: Map<String, Value>,
}

impl FieldSchema {
    pub fn new(field_id: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            field_type: field_type.into(),
            required: false,
            validation_rules: Map::new(),
            conditional_logic: None,
            field_options: Map::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, name: impl Into<String>, param: Value) -> Self {
        self.validation_rules.insert(name.into(), param);
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditional_logic = Some(condition);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.field_options.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> FieldType {
        FieldType::from_tag(&self.field_type)
    }

    /// Per-field override for the message of `rule`, from
    /// `field_options.messages.<rule>`.
    pub fn message_override(&self, rule: &str) -> Option<&str> {
        self.field_options
            .get("messages")
            .and_then(|m| m.get(rule))
            .and_then(Value::as_str)
    }
}

/// Non-string types fall back to `"text"`.
fn lenient_field_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(tag) => tag,
        _ => default_field_type(),
    })
}

/// `true`, `"true"`, `"1"` and `1` are set; anything else is not.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    })
}

/// Accept a rule map, or a list of rule names (each enabled with `true`).
fn lenient_rules<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some((name, Value::Bool(true))),
                _ => None,
            })
            .collect(),
        _ => Map::new(),
    })
}

/// Accept a map; anything else decodes as empty.
fn lenient_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

// ---------------------------------------------------------------------------
// Cross-field rules
// ---------------------------------------------------------------------------

/// Kind of a schema-level invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossFieldKind {
    Matches,
    Sum,
    AtLeastOne,
    Unknown(String),
}

impl CrossFieldKind {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "matches" => Self::Matches,
            "sum" => Self::Sum,
            "at_least_one" => Self::AtLeastOne,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Matches => "matches",
            Self::Sum => "sum",
            Self::AtLeastOne => "at_least_one",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Serialize for CrossFieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CrossFieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::parse(&s),
            _ => Self::Unknown(String::new()),
        })
    }
}

/// Constraint spanning several fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossFieldRule {
    #[serde(rename = "type")]
    pub kind: CrossFieldKind,
    #[serde(default, deserialize_with = "field_list")]
    pub fields: Vec<String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub params: Map<String, Value>,
    /// Replaces the default failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CrossFieldRule {
    pub fn new(kind: CrossFieldKind, fields: &[&str]) -> Self {
        Self {
            kind,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            params: Map::new(),
            message: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Describe why this rule cannot be evaluated as written, if it cannot.
    pub fn anomaly(&self) -> Option<String> {
        match &self.kind {
            CrossFieldKind::Matches if self.fields.len() < 2 => {
                Some("'matches' needs at least two fields".to_string())
            }
            CrossFieldKind::AtLeastOne if self.fields.is_empty() => {
                Some("'at_least_one' needs at least one field".to_string())
            }
            CrossFieldKind::Sum if self.fields.is_empty() => {
                Some("'sum' needs at least one field".to_string())
            }
            CrossFieldKind::Sum if self.params.get("target").and_then(to_number).is_none() => {
                Some("'sum' needs a numeric target".to_string())
            }
            CrossFieldKind::Unknown(raw) => Some(format!("unsupported cross-field rule '{raw}'")),
            _ => None,
        }
    }
}

/// Accept a list or a single rule object; entries that do not decode as
/// a rule are dropped.
fn lenient_cross_field_rules<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CrossFieldRule>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        rule @ Value::Object(_) => vec![rule],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable cross-field rule");
                None
            }
        })
        .collect())
}

fn field_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(to_list(&Value::deserialize(deserializer)?))
}

// ---------------------------------------------------------------------------
// Form schema
// ---------------------------------------------------------------------------

/// Ordered field list plus schema-level invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default, deserialize_with = "lenient_cross_field_rules")]
    pub cross_field_rules: Vec<CrossFieldRule>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self {
            fields,
            cross_field_rules: Vec::new(),
        }
    }

    pub fn with_cross_field(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field_rules.push(rule);
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    /// Parse a schema from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::InvalidSchema(e.to_string()))
    }

    /// Check the schema for authoring mistakes.
    ///
    /// Advisory only: [`ValidationEngine::validate`](crate::engine::ValidationEngine::validate)
    /// never calls this and tolerates every problem reported here.
    pub fn lint(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.field_id.trim().is_empty() {
                return Err(CoreError::InvalidSchema(
                    "field_id must not be empty".into(),
                ));
            }
            if !seen.insert(field.field_id.as_str()) {
                return Err(CoreError::InvalidSchema(format!(
                    "Duplicate field_id '{}'",
                    field.field_id
                )));
            }
            if let Some(problem) = field.conditional_logic.as_ref().and_then(Condition::anomaly) {
                return Err(CoreError::InvalidSchema(format!(
                    "Field '{}': {problem}",
                    field.field_id
                )));
            }
        }

        for (index, rule) in self.cross_field_rules.iter().enumerate() {
            if let Some(problem) = rule.anomaly() {
                return Err(CoreError::InvalidSchema(format!(
                    "Cross-field rule #{index}: {problem}"
                )));
            }
        }

        Ok(())
    }
}
