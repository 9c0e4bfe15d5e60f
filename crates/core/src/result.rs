//! Validation result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::FieldId;

/// Error bucket shared by every cross-field rule.
pub const CROSS_FIELD_KEY: &str = "cross_field";

/// Outcome of validating one submission.
///
/// `errors` maps a field id (or [`CROSS_FIELD_KEY`]) to its messages and is
/// empty exactly when `valid` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: BTreeMap<FieldId, Vec<String>>,
}

impl ValidationResult {
    /// Build a result from its violations; `valid` is derived.
    pub fn from_violations(violations: impl IntoIterator<Item = FieldViolation>) -> Self {
        let mut errors: BTreeMap<FieldId, Vec<String>> = BTreeMap::new();
        for violation in violations {
            errors.entry(violation.field).or_default().push(violation.message);
        }
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Messages recorded for `field_id`, empty if none.
    pub fn errors_for(&self, field_id: &str) -> &[String] {
        self.errors.get(field_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn cross_field_errors(&self) -> &[String] {
        self.errors_for(CROSS_FIELD_KEY)
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Turn an invalid result into [`CoreError::Validation`], for callers
    /// that treat a rejected submission as an error.
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        if self.valid {
            return Ok(());
        }
        let summary = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
            .collect::<Vec<_>>()
            .join(", ");
        Err(CoreError::Validation(summary))
    }
}

/// A single rule or type-check violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field id, or [`CROSS_FIELD_KEY`].
    pub field: String,
    /// Rule that failed: a rule name, `type`, `conditional_logic`, or a cross-field kind.
    pub rule: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Terminal state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    /// Its conditional logic evaluated to false.
    Skipped,
    Passed,
    Failed,
}

impl FieldState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// [`ValidationResult`] plus the state each field ended in and the
/// violations behind the messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(flatten)]
    pub result: ValidationResult,
    /// Field id -> terminal state, in schema order.
    pub fields: Vec<(FieldId, FieldState)>,
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn state_of(&self, field_id: &str) -> Option<FieldState> {
        self.fields
            .iter()
            .find(|(id, _)| id == field_id)
            .map(|(_, state)| *state)
    }

    pub fn into_result(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_violations_are_valid() {
        let result = ValidationResult::from_violations(Vec::new());
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn violations_group_by_field() {
        let result = ValidationResult::from_violations(vec![
            FieldViolation::new("email", "email", "Please enter a valid email address"),
            FieldViolation::new(CROSS_FIELD_KEY, "matches", "a"),
            FieldViolation::new(CROSS_FIELD_KEY, "sum", "b"),
        ]);
        assert!(!result.valid);
        assert_eq!(result.errors_for("email"), ["Please enter a valid email address"]);
        assert_eq!(result.cross_field_errors().len(), 2);
        assert!(result.errors_for("phone").is_empty());
        assert_eq!(result.error_count(), 3);
    }

    #[test]
    fn result_serializes_as_valid_and_errors() {
        let result =
            ValidationResult::from_violations(vec![FieldViolation::new("a", "required", "x")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "errors": {"a": ["x"]}}));
    }

    #[test]
    fn ensure_valid_summarises_errors() {
        assert!(ValidationResult::from_violations(Vec::new()).ensure_valid().is_ok());
        let result = ValidationResult::from_violations(vec![
            FieldViolation::new("age", "min_value", "Minimum value is 18"),
            FieldViolation::new("email", "required", "This field is required"),
        ]);
        let err = result.ensure_valid().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: age: Minimum value is 18, email: This field is required"
        );
    }

    #[test]
    fn field_state_display() {
        assert_eq!(FieldState::Skipped.to_string(), "skipped");
        assert_eq!(serde_json::to_value(FieldState::Failed).unwrap(), "failed");
    }
}
