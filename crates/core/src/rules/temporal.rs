//! Date, time and timezone rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::{with_text, RuleRegistry};
use crate::types::{SubmissionData, Timestamp};

/// Date-only layouts accepted by `date`, `future_date` and `past_date`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Date-time layouts accepted in addition to RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "date",
        "Please enter a valid date",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, |s| parse_moment(s).is_some()),
    );
    registry.register_builtin(
        "date_format",
        "Date must be in the format {param}",
        |v: &Value, p: &Value, _: &SubmissionData| match p.as_str() {
            Some(format) => with_text(v, |s| matches_format(s, format)),
            None => true,
        },
    );
    registry.register_builtin(
        "future_date",
        "Date must be in the future",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, |s| is_future(s, Utc::now())),
    );
    registry.register_builtin(
        "past_date",
        "Date must be in the past",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, |s| is_past(s, Utc::now())),
    );
    registry.register_builtin(
        "timezone",
        "Please enter a valid timezone",
        |v: &Value, _: &Value, _: &SubmissionData| with_text(v, is_timezone),
    );
}

/// A parsed date, keeping whether a time of day was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

/// Parse a date or date-time in one of the accepted layouts.
pub fn parse_moment(s: &str) -> Option<Moment> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Moment::Instant(dt.with_timezone(&Utc)));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(Moment::Instant(dt.and_utc()));
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(Moment::Day)
}

/// Dates compare by calendar day, instants by the clock.
pub fn is_future(s: &str, now: Timestamp) -> bool {
    match parse_moment(s) {
        Some(Moment::Day(day)) => day > now.date_naive(),
        Some(Moment::Instant(at)) => at > now,
        None => false,
    }
}

pub fn is_past(s: &str, now: Timestamp) -> bool {
    match parse_moment(s) {
        Some(Moment::Day(day)) => day < now.date_naive(),
        Some(Moment::Instant(at)) => at < now,
        None => false,
    }
}

/// Check `s` against a strftime layout, or a `Y-m-d` style layout which is
/// translated first.
pub fn matches_format(s: &str, format: &str) -> bool {
    let layout = if format.contains('%') {
        format.to_string()
    } else {
        translate_layout(format)
    };
    NaiveDateTime::parse_from_str(s, &layout).is_ok()
        || NaiveDate::parse_from_str(s, &layout).is_ok()
        || NaiveTime::parse_from_str(s, &layout).is_ok()
}

/// Map `Y-m-d H:i:s` style tokens to strftime.
fn translate_layout(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    for c in format.chars() {
        let token = match c {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'n' => "%m",
            'd' | 'j' => "%d",
            'H' | 'G' => "%H",
            'i' => "%M",
            's' => "%S",
            'M' => "%b",
            'F' => "%B",
            'D' => "%a",
            'A' => "%p",
            '%' => "%%",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(token);
    }
    out
}

/// `UTC`/`GMT`/`Z`, a `±HH[:MM]` offset, or a zone in the IANA database.
pub fn is_timezone(s: &str) -> bool {
    if matches!(s, "UTC" | "GMT" | "Z") {
        return true;
    }
    if let Some(offset) = s.strip_prefix(['+', '-']) {
        return is_offset(offset);
    }
    s.parse::<Tz>().is_ok()
}

fn is_offset(offset: &str) -> bool {
    let (hours, minutes) = offset.split_once(':').unwrap_or((offset, "00"));
    let parse = |part: &str| {
        (part.len() == 2 && part.chars().all(|c| c.is_ascii_digit()))
            .then(|| part.parse::<u32>().ok())
            .flatten()
    };
    matches!((parse(hours), parse(minutes)), (Some(h), Some(m)) if h <= 14 && m < 60)
}
