//! Identifier rules: payment numbers, national ids, network addresses.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{with_text, RuleRegistry};
use crate::types::SubmissionData;

static SWIFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}(?:[A-Z0-9]{3})?$").expect("valid regex")
});
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})-?(\d{2})-?(\d{4})$").expect("valid regex"));
static PASSPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,9}$").expect("valid regex"));
static LICENSE_PLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9](?:[A-Z0-9 \-]{0,8}[A-Z0-9])$").expect("valid regex"));
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[$€£¥]?\s?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?$").expect("valid regex")
});
static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}$",
        r"|^[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5}$",
        r"|^[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}$",
    ))
    .expect("valid regex")
});
static US_EIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-?\d{7}$").expect("valid regex"));
static IN_PAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}\d{4}[A-Z]$").expect("valid regex"));
static GENERIC_TAX_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9\-]{4,19}$").expect("valid regex"));

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "credit_card",
        "Please enter a valid credit card number",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_credit_card),
    );
    registry.register_builtin(
        "iban",
        "Please enter a valid IBAN",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_iban),
    );
    registry.register_builtin(
        "swift",
        "Please enter a valid SWIFT/BIC code",
        |v: &Value, _: &Value, _: &SubmissionData| {
            with_text(v, |s| SWIFT_RE.is_match(&s.to_ascii_uppercase()))
        },
    );
    registry.register_builtin(
        "tax_id",
        "Please enter a valid tax ID",
        |v: &Value, p: &Value, _: &SubmissionData| {
            let country = p.as_str().unwrap_or_default().to_string();
            with_text(v, |s| is_tax_id(s, &country))
        },
    );
    registry.register_builtin(
        "isbn",
        "Please enter a valid ISBN",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_isbn),
    );
    registry.register_builtin(
        "ssn",
        "Please enter a valid SSN",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_ssn),
    );
    registry.register_builtin(
        "passport",
        "Please enter a valid passport number",
        |v: &Value, _: &Value, _: &SubmissionData| {
            with_text(v, |s| PASSPORT_RE.is_match(&s.to_ascii_uppercase()))
        },
    );
    registry.register_builtin(
        "license_plate",
        "Please enter a valid license plate",
        |v: &Value, _: &Value, _: &SubmissionData| {
            with_text(v, |s| LICENSE_PLATE_RE.is_match(&s.to_ascii_uppercase()))
        },
    );
    registry.register_builtin(
        "currency",
        "Please enter a valid amount",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, |s| CURRENCY_RE.is_match(s)),
    );
    registry.register_builtin(
        "ip_address",
        "Please enter a valid IP address",
        |v: &Value, p: &Value, _: &SubmissionData| {
            let version = IpVersion::from_param(p);
            v.as_str().is_some_and(|s| is_ip_address(s.trim(), version))
        },
    );
    registry.register_builtin(
        "mac_address",
        "Please enter a valid MAC address",
        |v: &Value, _: &Value, _: &SubmissionData| {
            v.as_str().is_some_and(|s| MAC_RE.is_match(s.trim()))
        },
    );
}

/// 12 to 19 digits passing the Luhn checksum; spaces and dashes ignored.
pub fn is_credit_card(s: &str) -> bool {
    let Some(digits) = digits_ignoring(s, &[' ', '-']) else {
        return false;
    };
    (12..=19).contains(&digits.len()) && luhn(&digits)
}

fn luhn(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn digits_ignoring(s: &str, separators: &[char]) -> Option<Vec<u32>> {
    s.chars()
        .filter(|c| !separators.contains(c))
        .map(|c| c.to_digit(10))
        .collect()
}

/// ISO 13616: country code, check digits, BBAN; mod-97 of the rearranged
/// number must be 1.
pub fn is_iban(s: &str) -> bool {
    let compact: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !(15..=34).contains(&compact.len()) || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    let (head, bban) = compact.split_at(4);
    let mut head_chars = head.chars();
    let country_ok = head_chars.by_ref().take(2).all(|c| c.is_ascii_alphabetic());
    let check_ok = head_chars.all(|c| c.is_ascii_digit());
    if !country_ok || !check_ok {
        return false;
    }

    let mut remainder: u32 = 0;
    for c in bban.chars().chain(head.chars()) {
        // Letters expand to two digits: A = 10 .. Z = 35.
        let n = match c.to_digit(36) {
            Some(n) => n,
            None => return false,
        };
        remainder = if n >= 10 {
            (remainder * 100 + n) % 97
        } else {
            (remainder * 10 + n) % 97
        };
    }
    remainder == 1
}

pub fn is_tax_id(s: &str, country: &str) -> bool {
    let upper = s.to_ascii_uppercase();
    let all_digits = |len: usize| upper.len() == len && upper.chars().all(|c| c.is_ascii_digit());
    match country.trim().to_ascii_uppercase().as_str() {
        "US" => US_EIN_RE.is_match(&upper),
        "GB" | "UK" => all_digits(10),
        "DE" => all_digits(11),
        "IN" => IN_PAN_RE.is_match(&upper),
        _ => GENERIC_TAX_ID_RE.is_match(&upper),
    }
}

/// ISBN-10 (trailing `X` allowed) or ISBN-13, with valid check digit.
pub fn is_isbn(s: &str) -> bool {
    let compact: Vec<char> = s.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    match compact.len() {
        10 => {
            let mut sum = 0;
            for (i, c) in compact.iter().enumerate() {
                let d = match (c, i) {
                    ('X' | 'x', 9) => 10,
                    _ => match c.to_digit(10) {
                        Some(d) => d,
                        None => return false,
                    },
                };
                sum += d * (10 - i as u32);
            }
            sum % 11 == 0
        }
        13 => {
            let Some(digits) = compact
                .iter()
                .map(|c| c.to_digit(10))
                .collect::<Option<Vec<_>>>()
            else {
                return false;
            };
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
                .sum();
            sum % 10 == 0
        }
        _ => false,
    }
}

/// US SSN shape, excluding never-issued areas, groups and serials.
pub fn is_ssn(s: &str) -> bool {
    let Some(caps) = SSN_RE.captures(s) else {
        return false;
    };
    let area = &caps[1];
    area != "000"
        && area != "666"
        && !area.starts_with('9')
        && &caps[2] != "00"
        && &caps[3] != "0000"
}

/// Address family accepted by `ip_address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    Any,
    V4,
    V6,
}

impl IpVersion {
    /// `"v4"`, `"ipv4"`, `4` and their v6 counterparts; anything else is
    /// [`IpVersion::Any`].
    pub fn from_param(param: &Value) -> Self {
        let text = match param {
            Value::String(s) => s.trim().to_ascii_lowercase(),
            Value::Number(n) => n.to_string(),
            _ => return Self::Any,
        };
        match text.as_str() {
            "4" | "v4" | "ipv4" => Self::V4,
            "6" | "v6" | "ipv6" => Self::V6,
            _ => Self::Any,
        }
    }
}

pub fn is_ip_address(s: &str, version: IpVersion) -> bool {
    match (s.parse::<IpAddr>(), version) {
        (Ok(_), IpVersion::Any) => true,
        (Ok(addr), IpVersion::V4) => addr.is_ipv4(),
        (Ok(addr), IpVersion::V6) => addr.is_ipv6(),
        (Err(_), _) => false,
    }
}
