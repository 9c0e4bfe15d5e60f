//! Conditional field activation.
//!
//! A [`Condition`] gates whether a field is validated at all. Conditions are
//! authored externally, so decoding never fails: anything that is not a
//! well-formed `{field, operator, value}` object becomes a condition that
//! always evaluates to `true`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::types::SubmissionData;
use crate::value::{is_empty, loose_cmp, loose_eq, to_text};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
    /// An operator this engine does not know; carries the raw token.
    Unknown(String),
}

impl Operator {
    /// Parse from a wire-format string. Never fails.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "equals" | "==" => Self::Equals,
            "not_equals" | "!=" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "is_empty" => Self::IsEmpty,
            "is_not_empty" => Self::IsNotEmpty,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Return the canonical wire-format string for this variant.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// `{ field, operator, value }` predicate over other submitted values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    /// Referenced field. `None` when the schema omitted it or it was blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value,
        }
    }

    /// Decode a condition from arbitrary JSON.
    pub fn from_value(raw: &Value) -> Self {
        let Value::Object(map) = raw else {
            return Self {
                field: None,
                operator: Operator::Unknown(String::new()),
                value: Value::Null,
            };
        };

        let field = map
            .get("field")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        let operator = map
            .get("operator")
            .and_then(Value::as_str)
            .map(Operator::parse)
            .unwrap_or_else(|| Operator::Unknown(String::new()));
        let value = map.get("value").cloned().unwrap_or(Value::Null);

        Self {
            field,
            operator,
            value,
        }
    }

    /// Describe why this condition cannot be evaluated as written, if it
    /// cannot. Such conditions gate to `true`.
    pub fn anomaly(&self) -> Option<String> {
        if self.field.is_none() {
            return Some("condition does not name a field".to_string());
        }
        match &self.operator {
            Operator::Unknown(raw) if raw.is_empty() => {
                Some("condition does not name an operator".to_string())
            }
            Operator::Unknown(raw) => Some(format!("unsupported operator '{raw}'")),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&raw))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate `condition` against the submission.
///
/// A referenced field that is absent from `data` is treated as `null`.
/// Unknown operators and conditions without a `field` evaluate to `true`.
pub fn evaluate(condition: &Condition, data: &SubmissionData) -> bool {
    let Some(field) = condition.field.as_deref() else {
        return true;
    };
    let actual = data.get(field).unwrap_or(&Value::Null);
    let expected = &condition.value;

    match &condition.operator {
        Operator::Equals => loose_eq(actual, expected),
        Operator::NotEquals => !loose_eq(actual, expected),
        Operator::Contains => contains(actual, expected),
        Operator::NotContains => !contains(actual, expected),
        Operator::StartsWith => to_text(actual).starts_with(&to_text(expected)),
        Operator::EndsWith => to_text(actual).ends_with(&to_text(expected)),
        Operator::GreaterThan => loose_cmp(actual, expected).is_gt(),
        Operator::LessThan => loose_cmp(actual, expected).is_lt(),
        Operator::IsEmpty => is_empty(Some(actual)),
        Operator::IsNotEmpty => !is_empty(Some(actual)),
        Operator::Unknown(_) => true,
    }
}

/// Membership for list values (multi-selects), substring otherwise.
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
        _ => to_text(actual).contains(&to_text(expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> SubmissionData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn cond(raw: Value) -> Condition {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn equals_is_coercive() {
        let c = cond(json!({"field": "age", "operator": "equals", "value": 18}));
        assert!(evaluate(&c, &data(&[("age", json!("18"))])));
        assert!(!evaluate(&c, &data(&[("age", json!("19"))])));
    }

    #[test]
    fn symbolic_aliases() {
        let eq = cond(json!({"field": "a", "operator": "==", "value": "x"}));
        let ne = cond(json!({"field": "a", "operator": "!=", "value": "x"}));
        let d = data(&[("a", json!("x"))]);
        assert_eq!(eq.operator, Operator::Equals);
        assert!(evaluate(&eq, &d));
        assert!(!evaluate(&ne, &d));
    }

    #[test]
    fn contains_and_not_contains() {
        let c = cond(json!({"field": "note", "operator": "contains", "value": "urgent"}));
        let nc = cond(json!({"field": "note", "operator": "not_contains", "value": "urgent"}));
        let d = data(&[("note", json!("this is urgent!"))]);
        assert!(evaluate(&c, &d));
        assert!(!evaluate(&nc, &d));
    }

    #[test]
    fn contains_coerces_numbers_to_text() {
        let c = cond(json!({"field": "code", "operator": "contains", "value": 42}));
        assert!(evaluate(&c, &data(&[("code", json!(14250))])));
    }

    #[test]
    fn contains_tests_membership_for_lists() {
        let c = cond(json!({"field": "tags", "operator": "contains", "value": "red"}));
        assert!(evaluate(&c, &data(&[("tags", json!(["blue", "red"]))])));
        assert!(!evaluate(&c, &data(&[("tags", json!(["redish"]))])));
    }

    #[test]
    fn prefix_and_suffix() {
        let sw = cond(json!({"field": "f", "operator": "starts_with", "value": "ab"}));
        let ew = cond(json!({"field": "f", "operator": "ends_with", "value": "yz"}));
        let d = data(&[("f", json!("abc-xyz"))]);
        assert!(evaluate(&sw, &d));
        assert!(evaluate(&ew, &d));
    }

    #[test]
    fn greater_than_numeric_vs_lexical() {
        let gt = cond(json!({"field": "n", "operator": "greater_than", "value": "9"}));
        assert!(evaluate(&gt, &data(&[("n", json!("10"))])));

        let lt = cond(json!({"field": "s", "operator": "less_than", "value": "b"}));
        assert!(evaluate(&lt, &data(&[("s", json!("apple"))])));
        assert!(!evaluate(&lt, &data(&[("s", json!("cherry"))])));
    }

    #[test]
    fn emptiness_operators_treat_absent_as_null() {
        let e = cond(json!({"field": "x", "operator": "is_empty"}));
        let ne = cond(json!({"field": "x", "operator": "is_not_empty"}));
        let d = data(&[]);
        assert!(evaluate(&e, &d));
        assert!(!evaluate(&ne, &d));
        assert!(evaluate(&e, &data(&[("x", json!([]))])));
    }

    #[test]
    fn absent_field_compares_as_null() {
        let c = cond(json!({"field": "missing", "operator": "equals", "value": "yes"}));
        assert!(!evaluate(&c, &data(&[])));
    }

    #[test]
    fn unknown_operator_defaults_to_true() {
        let c = cond(json!({"field": "a", "operator": "matches_regex", "value": "x"}));
        assert_eq!(c.operator, Operator::Unknown("matches_regex".into()));
        assert!(evaluate(&c, &data(&[("a", json!("nope"))])));
        assert!(c.anomaly().is_some());
    }

    #[test]
    fn missing_field_defaults_to_true() {
        let c = cond(json!({"operator": "equals", "value": "x"}));
        assert!(c.field.is_none());
        assert!(evaluate(&c, &data(&[])));
    }

    #[test]
    fn non_object_decodes_as_malformed() {
        let c = cond(json!("show when A is yes"));
        assert!(c.anomaly().is_some());
        assert!(evaluate(&c, &data(&[])));
    }

    #[test]
    fn well_formed_condition_has_no_anomaly() {
        let c = Condition::new("a", Operator::IsEmpty, Value::Null);
        assert!(c.anomaly().is_none());
    }

    #[test]
    fn serializes_canonical_operator() {
        let c = cond(json!({"field": "a", "operator": "==", "value": 1}));
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"field": "a", "operator": "equals", "value": 1})
        );
    }
}
