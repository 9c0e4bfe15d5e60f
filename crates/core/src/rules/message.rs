//! Message template rendering.
//!
//! Scalar parameters fill `{param}`; map parameters fill `{key}` for each of
//! their keys (e.g. `{min}` and `{max}` for a range). Placeholders with no
//! matching value are left as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::value::to_text;

/// Regex matching `{placeholder}` tokens in message templates.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

/// Render `template` with `param`.
pub fn format_message(template: &str, param: &Value) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match param {
                Value::Object(map) => match map.get(key) {
                    Some(v) => render(v),
                    None if key == "param" => render(param),
                    None => caps[0].to_string(),
                },
                _ if key == "param" => render(param),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn render(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(", "),
        other => to_text(other),
    }
}
