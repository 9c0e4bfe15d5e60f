//! Built-in rule catalogue.
//!
//! Category modules own their predicates; this module wires everything into
//! a registry and holds the few rules that look beyond the field's own
//! value (`matches`, `unique`) or that belong to no category.

use serde_json::Value;

use super::{files, formats, identifiers, numeric, temporal, text, RuleRegistry};
use crate::types::SubmissionData;
use crate::value::{is_empty, loose_eq};

/// Message used by the required-ness check.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Populate `registry` with every built-in rule.
pub fn register_all(registry: &RuleRegistry) {
    registry.register_builtin(
        "required",
        REQUIRED_MESSAGE,
        |v: &Value, _: &Value, _: &SubmissionData| !is_empty(Some(v)),
    );
    registry.register_builtin("matches", "Must match {param}", matches);
    registry.register_builtin("unique", "This value is already taken", unique);
    registry.register_builtin(
        "in",
        "Selected value is not allowed",
        |v: &Value, p: &Value, _: &SubmissionData| one_of(v, p).unwrap_or(true),
    );
    registry.register_builtin(
        "not_in",
        "Selected value is not allowed",
        |v: &Value, p: &Value, _: &SubmissionData| none_of(v, p).unwrap_or(true),
    );

    text::register(registry);
    numeric::register(registry);
    temporal::register(registry);
    files::register(registry);
    identifiers::register(registry);
    formats::register(registry);
}

/// The value must equal (coercively) the value of the field named by `param`.
fn matches(value: &Value, param: &Value, all_values: &SubmissionData) -> bool {
    let Some(other) = param.as_str() else {
        return true;
    };
    let other_value = all_values.get(other).unwrap_or(&Value::Null);
    loose_eq(value, other_value)
}

/// Pass-through. Existence checks need an external collaborator; see
/// [`crate::lookup`].
fn unique(_value: &Value, _param: &Value, _all_values: &SubmissionData) -> bool {
    true
}

/// Allowed (or forbidden) values: a list, or a comma-separated string.
/// `None` when `param` is neither.
fn listed_values(param: &Value) -> Option<Vec<Value>> {
    match param {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => Some(
            s.split(',')
                .map(|p| Value::String(p.trim().to_string()))
                .collect(),
        ),
        _ => None,
    }
}

fn elements(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Every element of `value` (or `value` itself) appears in `param`.
fn one_of(value: &Value, param: &Value) -> Option<bool> {
    let listed = listed_values(param)?;
    Some(
        elements(value)
            .iter()
            .all(|v| listed.iter().any(|a| loose_eq(a, v))),
    )
}

/// No element of `value` (or `value` itself) appears in `param`.
fn none_of(value: &Value, param: &Value) -> Option<bool> {
    let listed = listed_values(param)?;
    Some(
        !elements(value)
            .iter()
            .any(|v| listed.iter().any(|a| loose_eq(a, v))),
    )
}
