//! Text-shaped rules: lengths, patterns, contact details, passwords.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use validator::ValidateEmail;

use super::{with_text, RuleRegistry};
use crate::types::SubmissionData;
use crate::value::{to_count, to_text};

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

static US_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("valid regex"));
static CA_POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d$").expect("valid regex"));
static UK_POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{1,2}\d[A-Za-z\d]? ?\d[A-Za-z]{2}$").expect("valid regex")
});
static NL_POSTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4} ?[A-Za-z]{2}$").expect("valid regex"));
static JP_POSTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{4}$").expect("valid regex"));
static GENERIC_POSTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\- ]{1,9}$").expect("valid regex"));

/// Default minimum length for `password_strength`.
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "email",
        "Please enter a valid email address",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_email),
    );
    registry.register_builtin(
        "url",
        "Please enter a valid URL",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_url),
    );
    registry.register_builtin(
        "min_length",
        "Minimum length is {param} characters",
        |v: &Value, p: &Value, _: &SubmissionData| length_check(v, p, |len, n| len >= n),
    );
    registry.register_builtin(
        "max_length",
        "Maximum length is {param} characters",
        |v: &Value, p: &Value, _: &SubmissionData| length_check(v, p, |len, n| len <= n),
    );
    registry.register_builtin(
        "exact_length",
        "Must be exactly {param} characters",
        |v: &Value, p: &Value, _: &SubmissionData| length_check(v, p, |len, n| len == n),
    );
    registry.register_builtin(
        "regex",
        "Invalid format",
        |v: &Value, p: &Value, _: &SubmissionData| matches_pattern(&to_text(v), p),
    );
    registry.register_builtin(
        "phone",
        "Please enter a valid phone number",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_phone),
    );
    registry.register_builtin(
        "postal_code",
        "Please enter a valid postal code",
        |v: &Value, p: &Value, _: &SubmissionData| {
            let country = p.as_str().unwrap_or_default().to_string();
            with_text(v, |s| is_postal_code(s, &country))
        },
    );
    registry.register_builtin(
        "password_strength",
        "Password is not strong enough",
        |v: &Value, p: &Value, _: &SubmissionData| {
            v.as_str().is_some_and(|s| is_strong_password(s, &PasswordPolicy::from_param(p)))
        },
    );
    registry.register_builtin(
        "hex_color",
        "Please enter a valid hex color",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, |s| HEX_COLOR_RE.is_match(s)),
    );
}

pub fn is_email(s: &str) -> bool {
    s.validate_email()
}

/// Absolute `http`, `https`, `ftp` or `ftps` URL with a host.
pub fn is_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https" | "ftp" | "ftps")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Lengths count characters, not bytes. Lists count elements. An
/// unusable parameter passes.
fn length_check(value: &Value, param: &Value, cmp: impl Fn(usize, usize) -> bool) -> bool {
    let Some(limit) = to_count(param) else {
        return true;
    };
    let len = match value {
        Value::Array(items) => items.len(),
        other => to_text(other).chars().count(),
    };
    cmp(len, limit)
}

/// Match `text` against a pattern parameter.
///
/// Accepts a bare pattern or a `/pattern/flags` literal; `i`, `m`, `s` and
/// `x` flags are honoured. A pattern that does not compile passes.
pub fn matches_pattern(text: &str, param: &Value) -> bool {
    let Some(raw) = param.as_str() else {
        return true;
    };
    let (pattern, flags) = split_delimited(raw);
    let compiled = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build();
    match compiled {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::debug!(pattern = %raw, error = %e, "Invalid regex pattern, rule skipped");
            true
        }
    }
}

fn split_delimited(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                return (&rest[..end], flags);
            }
        }
    }
    (raw, "")
}

/// 7 to 15 digits (E.164 bound) with an optional leading `+`; spaces,
/// dots, dashes and parentheses are ignored.
pub fn is_phone(s: &str) -> bool {
    let body = s.strip_prefix('+').unwrap_or(s);
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}

pub fn is_postal_code(s: &str, country: &str) -> bool {
    match country.trim().to_ascii_uppercase().as_str() {
        "US" => US_ZIP_RE.is_match(s),
        "CA" => CA_POSTAL_RE.is_match(s),
        "GB" | "UK" => UK_POSTCODE_RE.is_match(s),
        "NL" => NL_POSTCODE_RE.is_match(s),
        "JP" => JP_POSTCODE_RE.is_match(s),
        "DE" | "FR" | "ES" | "IT" => s.len() == 5 && s.chars().all(|c| c.is_ascii_digit()),
        "AU" | "AT" | "BE" | "CH" | "DK" | "NO" => {
            s.len() == 4 && s.chars().all(|c| c.is_ascii_digit())
        }
        "IN" => s.len() == 6 && s.chars().all(|c| c.is_ascii_digit()),
        _ => GENERIC_POSTCODE_RE.is_match(s),
    }
}

/// Requirements checked by `password_strength`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_symbol: true,
        }
    }
}

impl PasswordPolicy {
    /// A number sets the minimum length; a map may set any field.
    pub fn from_param(param: &Value) -> Self {
        let mut policy = Self::default();
        match param {
            Value::Object(map) => {
                if let Some(n) = map.get("min_length").and_then(to_count) {
                    policy.min_length = n;
                }
                let flag = |key: &str, default: bool| {
                    map.get(key).and_then(Value::as_bool).unwrap_or(default)
                };
                policy.require_uppercase = flag("require_uppercase", true);
                policy.require_lowercase = flag("require_lowercase", true);
                policy.require_digit = flag("require_digit", true);
                policy.require_symbol = flag("require_symbol", true);
            }
            other => {
                if let Some(n) = to_count(other) {
                    policy.min_length = n;
                }
            }
        }
        policy
    }
}

pub fn is_strong_password(s: &str, policy: &PasswordPolicy) -> bool {
    s.chars().count() >= policy.min_length
        && (!policy.require_uppercase || s.chars().any(char::is_uppercase))
        && (!policy.require_lowercase || s.chars().any(char::is_lowercase))
        && (!policy.require_digit || s.chars().any(|c| c.is_ascii_digit()))
        && (!policy.require_symbol || s.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()))
}
