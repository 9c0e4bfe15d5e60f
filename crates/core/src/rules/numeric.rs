//! Numeric rules: number shapes, bounds, percentages, coordinates.

use serde_json::Value;

use super::RuleRegistry;
use crate::types::SubmissionData;
use crate::value::{parse_number, to_count, to_number};

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "numeric",
        "Must be a number",
        |v: &Value, _: &Value, _: &SubmissionData| is_numeric(v),
    );
    registry.register_builtin(
        "integer",
        "Must be a whole number",
        |v: &Value, _: &Value, _: &SubmissionData| is_integer(v),
    );
    registry.register_builtin(
        "decimal",
        "Must be a valid decimal number",
        |v: &Value, p: &Value, _: &SubmissionData| is_decimal(v, to_count(p)),
    );
    registry.register_builtin(
        "min_value",
        "Minimum value is {param}",
        |v: &Value, p: &Value, _: &SubmissionData| bound_check(v, p, |n, limit| n >= limit),
    );
    registry.register_builtin(
        "max_value",
        "Maximum value is {param}",
        |v: &Value, p: &Value, _: &SubmissionData| bound_check(v, p, |n, limit| n <= limit),
    );
    registry.register_builtin(
        "range",
        "Value must be between {min} and {max}",
        |v: &Value, p: &Value, _: &SubmissionData| in_range(v, p),
    );
    registry.register_builtin(
        "percentage",
        "Must be a percentage between 0 and 100",
        |v: &Value, _: &Value, _: &SubmissionData| is_percentage(v),
    );
    registry.register_builtin(
        "coordinates",
        "Please enter valid coordinates",
        |v: &Value, _: &Value, _: &SubmissionData| is_coordinates(v),
    );
}

pub fn is_numeric(value: &Value) -> bool {
    to_number(value).is_some()
}

/// Whole numbers, including `"42"` and `42.0`.
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        Value::String(s) => {
            let digits = s.trim().strip_prefix(['+', '-']).unwrap_or(s.trim());
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

/// Plain decimal notation, optionally limited to `places` fraction digits.
pub fn is_decimal(value: &Value, places: Option<usize>) -> bool {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return false,
    };
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(&text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let well_formed = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
        && !(unsigned.contains('.') && fraction.is_empty());
    well_formed && places.map_or(true, |max| fraction.len() <= max)
}

/// A non-numeric value cannot satisfy a bound. An unusable bound passes.
fn bound_check(value: &Value, param: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let Some(limit) = to_number(param) else {
        return true;
    };
    to_number(value).is_some_and(|n| cmp(n, limit))
}

/// `param` is `{min, max}` or `[min, max]`; either bound may be missing.
fn in_range(value: &Value, param: &Value) -> bool {
    let (min, max) = match param {
        Value::Object(map) => (
            map.get("min").and_then(to_number),
            map.get("max").and_then(to_number),
        ),
        Value::Array(items) if items.len() == 2 => (to_number(&items[0]), to_number(&items[1])),
        _ => return true,
    };
    let Some(n) = to_number(value) else {
        return false;
    };
    min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
}

/// 0..=100, with or without a trailing `%`.
pub fn is_percentage(value: &Value) -> bool {
    let n = match value {
        Value::String(s) => parse_number(s.trim().trim_end_matches('%')),
        other => to_number(other),
    };
    n.is_some_and(|n| (0.0..=100.0).contains(&n))
}

/// `"lat,lng"`, `[lat, lng]`, `{lat, lng}` or `{latitude, longitude}` within
/// geographic bounds.
pub fn is_coordinates(value: &Value) -> bool {
    let pair = match value {
        Value::String(s) => {
            let mut parts = s.split(',');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(lat), Some(lng), None) => (parse_number(lat), parse_number(lng)),
                _ => return false,
            }
        }
        Value::Array(items) if items.len() == 2 => (to_number(&items[0]), to_number(&items[1])),
        Value::Object(map) => (
            map.get("lat").or_else(|| map.get("latitude")).and_then(to_number),
            map.get("lng")
                .or_else(|| map.get("lon"))
                .or_else(|| map.get("longitude"))
                .and_then(to_number),
        ),
        _ => return false,
    };
    match pair {
        (Some(lat), Some(lng)) => (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_values() {
        assert!(is_numeric(&json!(3.5)));
        assert!(is_numeric(&json!("-12.75")));
        assert!(!is_numeric(&json!("12abc")));
        assert!(!is_numeric(&json!(true)));
    }

    #[test]
    fn integers() {
        assert!(is_integer(&json!(42)));
        assert!(is_integer(&json!(42.0)));
        assert!(is_integer(&json!("-7")));
        assert!(!is_integer(&json!("7.5")));
        assert!(!is_integer(&json!(7.5)));
        assert!(!is_integer(&json!("-")));
    }

    #[test]
    fn decimals() {
        assert!(is_decimal(&json!("19.99"), Some(2)));
        assert!(!is_decimal(&json!("19.999"), Some(2)));
        assert!(is_decimal(&json!("20"), None));
        assert!(!is_decimal(&json!("20."), None));
        assert!(!is_decimal(&json!("1e5"), None));
    }

    #[test]
    fn min_and_max_value() {
        assert!(bound_check(&json!("10"), &json!(5), |n, l| n >= l));
        assert!(!bound_check(&json!(3), &json!(5), |n, l| n >= l));
        assert!(!bound_check(&json!("abc"), &json!(5), |n, l| n >= l));
        assert!(bound_check(&json!("abc"), &json!("five"), |n, l| n >= l));
    }

    #[test]
    fn ranges() {
        assert!(in_range(&json!(5), &json!({"min": 1, "max": 10})));
        assert!(!in_range(&json!(11), &json!({"min": 1, "max": 10})));
        assert!(in_range(&json!("1"), &json!([1, 10])));
        assert!(in_range(&json!(500), &json!({"min": 1})));
        assert!(!in_range(&json!("x"), &json!({"min": 1})));
    }

    #[test]
    fn percentages() {
        assert!(is_percentage(&json!("45%")));
        assert!(is_percentage(&json!(100)));
        assert!(!is_percentage(&json!("101")));
        assert!(!is_percentage(&json!(-1)));
    }

    #[test]
    fn coordinates() {
        assert!(is_coordinates(&json!("40.7128,-74.0060")));
        assert!(is_coordinates(&json!([51.5, -0.12])));
        assert!(is_coordinates(&json!({"lat": -33.86, "lng": 151.2})));
        assert!(is_coordinates(&json!({"latitude": "0", "longitude": "180"})));
        assert!(!is_coordinates(&json!("91,0")));
        assert!(!is_coordinates(&json!("0,181")));
        assert!(!is_coordinates(&json!("1,2,3")));
        assert!(!is_coordinates(&json!({"lat": 1})));
    }
}
