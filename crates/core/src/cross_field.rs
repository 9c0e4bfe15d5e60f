//! Schema-level invariants spanning several fields.
//!
//! Every rule runs once per submission, after all per-field checks and
//! regardless of their outcome. Failures are reported under
//! [`CROSS_FIELD_KEY`].

use serde_json::{Map, Value};

use crate::config::Policy;
use crate::result::{FieldViolation, CROSS_FIELD_KEY};
use crate::rules::message::format_message;
use crate::schema::{CrossFieldKind, CrossFieldRule};
use crate::types::SubmissionData;
use crate::value::{is_empty, loose_eq, to_number};

const MATCHES_MESSAGE: &str = "Fields {fields} must match";
const SUM_MESSAGE: &str = "The sum of {fields} must equal {target}";
const AT_LEAST_ONE_MESSAGE: &str = "At least one of {fields} is required";

/// Evaluates [`CrossFieldRule`]s over a whole submission.
#[derive(Debug, Clone, Copy)]
pub struct CrossFieldValidator {
    policy: Policy,
    /// Used by `sum` rules without their own `tolerance`.
    default_tolerance: f64,
}

impl CrossFieldValidator {
    pub fn new(policy: Policy, default_tolerance: f64) -> Self {
        Self {
            policy,
            default_tolerance,
        }
    }

    /// One violation per failing rule, in rule order.
    pub fn validate(&self, rules: &[CrossFieldRule], data: &SubmissionData) -> Vec<FieldViolation> {
        rules
            .iter()
            .filter_map(|rule| self.check(rule, data))
            .collect()
    }

    fn check(&self, rule: &CrossFieldRule, data: &SubmissionData) -> Option<FieldViolation> {
        if let Some(problem) = rule.anomaly() {
            if self.policy.is_strict() {
                return Some(FieldViolation::new(
                    CROSS_FIELD_KEY,
                    rule.kind.as_str(),
                    format!("Invalid cross-field rule: {problem}"),
                ));
            }
            tracing::debug!(rule = %rule.kind.as_str(), %problem, "Cross-field rule skipped");
            return None;
        }

        let passed = match &rule.kind {
            CrossFieldKind::Matches => all_match(&rule.fields, data),
            CrossFieldKind::Sum => self.sum_matches(rule, data),
            CrossFieldKind::AtLeastOne => rule.fields.iter().any(|f| !is_empty(data.get(f))),
            CrossFieldKind::Unknown(_) => true,
        };
        if passed {
            return None;
        }

        let template = rule.message.as_deref().unwrap_or(match rule.kind {
            CrossFieldKind::Matches => MATCHES_MESSAGE,
            CrossFieldKind::Sum => SUM_MESSAGE,
            _ => AT_LEAST_ONE_MESSAGE,
        });
        Some(FieldViolation::new(
            CROSS_FIELD_KEY,
            rule.kind.as_str(),
            format_message(template, &message_params(rule)),
        ))
    }

    /// `|sum - target| <= tolerance`; missing or non-numeric values count as 0.
    fn sum_matches(&self, rule: &CrossFieldRule, data: &SubmissionData) -> bool {
        let Some(target) = rule.params.get("target").and_then(to_number) else {
            return true;
        };
        let tolerance = rule
            .params
            .get("tolerance")
            .and_then(to_number)
            .unwrap_or(self.default_tolerance);
        let sum: f64 = rule
            .fields
            .iter()
            .map(|f| data.get(f).and_then(to_number).unwrap_or(0.0))
            .sum();
        (sum - target).abs() <= tolerance
    }
}

/// Every pair of listed values is equal, so one divergent value fails the
/// rule once.
fn all_match(fields: &[String], data: &SubmissionData) -> bool {
    let values: Vec<&Value> = fields
        .iter()
        .map(|f| data.get(f).unwrap_or(&Value::Null))
        .collect();
    values
        .iter()
        .enumerate()
        .all(|(i, a)| values[i + 1..].iter().all(|b| loose_eq(a, b)))
}

/// Rule params plus `{fields}` for message rendering.
fn message_params(rule: &CrossFieldRule) -> Value {
    let mut params: Map<String, Value> = rule.params.clone();
    params.insert("fields".to_string(), Value::String(rule.fields.join(", ")));
    Value::Object(params)
}
