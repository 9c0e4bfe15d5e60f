//! Coercion helpers over raw submitted values.
//!
//! Form data arrives loosely typed: numbers as strings, booleans as
//! numbers, lists where a scalar was expected. Every comparison in the
//! engine goes through these helpers so the coercion rules live in one
//! place.

use std::cmp::Ordering;

use serde_json::Value;

/// `true` for an absent value, `null`, `""`, or an empty list / map.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Coerce any value to its string form.
///
/// Strings are returned verbatim, `null` becomes `""`, lists and maps are
/// rendered as compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Coerce a value to a finite number, parsing numeric strings.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a trimmed decimal string. Rejects `inf`, `NaN` and friends.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || trimmed
            .chars()
            .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Coerce a parameter to a non-negative count (lengths, sizes, places).
pub fn to_count(value: &Value) -> Option<usize> {
    let n = to_number(value)?;
    if n < 0.0 || n.fract() != 0.0 {
        return None;
    }
    Some(n as usize)
}

/// Coercive equality shared by the `equals` operator and both `matches`
/// rules: numeric when both sides are numeric, otherwise two empties are
/// equal, otherwise string forms are compared.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (to_number(a), to_number(b)) {
        return x == y;
    }
    let (a_empty, b_empty) = (is_empty(Some(a)), is_empty(Some(b)));
    if a_empty || b_empty {
        return a_empty && b_empty;
    }
    to_text(a) == to_text(b)
}

/// Ordering used by `greater_than` / `less_than`: numeric when both sides
/// parse as numbers, lexical otherwise.
pub fn loose_cmp(a: &Value, b: &Value) -> Ordering {
    match (to_number(a), to_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => to_text(a).cmp(&to_text(b)),
    }
}

/// Strings contained in a list parameter, or the comma-separated parts of a
/// string parameter.
pub fn to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => vec![to_text(other)],
    }
}
