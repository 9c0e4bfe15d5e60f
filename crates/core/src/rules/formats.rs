//! Structured-text rules: JSON, XML, base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;

use super::RuleRegistry;
use crate::types::SubmissionData;

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "json",
        "Please enter valid JSON",
        |v: &Value, _: &Value, _: &SubmissionData| is_json(v),
    );
    registry.register_builtin(
        "xml",
        "Please enter valid XML",
        |v: &Value, _: &Value, _: &SubmissionData| v.as_str().is_some_and(is_well_formed_xml),
    );
    registry.register_builtin(
        "base64",
        "Please enter valid base64",
        |v: &Value, _: &Value, _: &SubmissionData| v.as_str().is_some_and(is_base64),
    );
}

/// Strings must parse as JSON; already-structured values pass.
pub fn is_json(value: &Value) -> bool {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(s).is_ok(),
        Value::Array(_) | Value::Object(_) => true,
        _ => false,
    }
}

/// Standard alphabet with padding; surrounding whitespace is ignored.
pub fn is_base64(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && STANDARD.decode(trimmed).is_ok()
}

/// Well-formedness only: one root element, balanced tags, unique quoted
/// attributes, known entities. No DTD or namespace processing.
pub fn is_well_formed_xml(s: &str) -> bool {
    let mut reader = Reader::from_str(s);
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut roots = 0;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(_) => return false,
        };
        match event {
            Event::Eof => break,
            Event::Start(ref tag) | Event::Empty(ref tag) => {
                if open.is_empty() {
                    roots += 1;
                    if roots > 1 {
                        return false;
                    }
                }
                if !start_tag_ok(tag) {
                    return false;
                }
                if matches!(event, Event::Start(_)) {
                    open.push(tag.name().as_ref().to_vec());
                }
            }
            Event::End(tag) => {
                if open.pop().as_deref() != Some(tag.name().as_ref()) {
                    return false;
                }
            }
            Event::Text(text) => {
                let Ok(unescaped) = text.unescape() else {
                    return false;
                };
                // Text outside the root element is not allowed.
                if open.is_empty() && !unescaped.trim().is_empty() {
                    return false;
                }
            }
            Event::CData(_) if open.is_empty() => return false,
            Event::DocType(_) if roots > 0 || !open.is_empty() => return false,
            _ => {}
        }
    }
    roots == 1 && open.is_empty()
}

fn start_tag_ok(tag: &BytesStart<'_>) -> bool {
    let name = tag.name();
    let starts_ok = name
        .as_ref()
        .first()
        .is_some_and(|&b| b.is_ascii_alphabetic() || matches!(b, b'_' | b':') || b >= 0x80);
    starts_ok
        && tag.attributes().all(|attr| {
            attr.is_ok_and(|attr| !attr.value.contains(&b'<') && attr.unescape_value().is_ok())
        })
}
