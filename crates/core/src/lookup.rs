//! Uniqueness lookups against an external store.
//!
//! The synchronous `unique` rule is a pass-through. Callers that can reach
//! the store use [`ValidationEngine::validate_with_lookup`], which runs the
//! normal validation first and then looks up every evaluated, non-empty,
//! otherwise-passing field that declares `unique`. Lookups run concurrently
//! and each is bounded by [`EngineConfig::unique_timeout`]; a lookup that
//! times out or errors is inconclusive and the field passes. The async
//! entry points need a Tokio runtime for their timers.
//!
//! [`EngineConfig::unique_timeout`]: crate::config::EngineConfig::unique_timeout

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::engine::ValidationEngine;
use crate::error::CoreError;
use crate::result::{FieldState, FieldViolation, ValidationReport, ValidationResult};
use crate::rules::message::format_message;
use crate::schema::FormSchema;
use crate::types::SubmissionData;
use crate::value::is_empty;

const UNIQUE_RULE: &str = "unique";
const UNIQUE_MESSAGE: &str = "This value is already taken";

/// Existence check collaborator.
#[async_trait]
pub trait UniquenessCheck: Send + Sync {
    /// `Ok(true)` when `value` is not yet taken. `param` is the rule
    /// parameter from the schema (typically a table or column reference).
    async fn is_unique(
        &self,
        field_id: &str,
        value: &Value,
        param: &Value,
    ) -> Result<bool, CoreError>;
}

/// A field due for a uniqueness lookup.
struct PendingLookup<'a> {
    field_id: &'a str,
    value: &'a Value,
    param: &'a Value,
    message: Option<&'a str>,
}

impl ValidationEngine {
    /// [`ValidationEngine::validate`] plus uniqueness lookups.
    ///
    /// Must be polled inside a Tokio runtime: lookups are bounded with
    /// [`tokio::time::timeout`], which panics without one.
    pub async fn validate_with_lookup(
        &self,
        schema: &FormSchema,
        data: &SubmissionData,
        lookup: &dyn UniquenessCheck,
    ) -> ValidationResult {
        self.validate_detailed_with_lookup(schema, data, lookup)
            .await
            .into_result()
    }

    /// Detailed variant of [`ValidationEngine::validate_with_lookup`]; same
    /// Tokio runtime requirement.
    pub async fn validate_detailed_with_lookup(
        &self,
        schema: &FormSchema,
        data: &SubmissionData,
        lookup: &dyn UniquenessCheck,
    ) -> ValidationReport {
        let mut report = self.validate_detailed(schema, data);

        let pending: Vec<PendingLookup<'_>> = schema
            .fields
            .iter()
            .filter(|field| report.state_of(&field.field_id) == Some(FieldState::Passed))
            .filter_map(|field| {
                let param = field.validation_rules.get(UNIQUE_RULE)?;
                let value = data.get(&field.field_id)?;
                if param == &Value::Bool(false) || is_empty(Some(value)) {
                    return None;
                }
                Some(PendingLookup {
                    field_id: &field.field_id,
                    value,
                    param,
                    message: field.message_override(UNIQUE_RULE),
                })
            })
            .collect();
        if pending.is_empty() {
            return report;
        }

        let timeout = self.config().unique_timeout();
        let outcomes = join_all(pending.iter().map(|item| async move {
            let check = lookup.is_unique(item.field_id, item.value, item.param);
            let outcome = tokio::time::timeout(timeout, check).await;
            (item, outcome)
        }))
        .await;

        let template = self
            .registry()
            .message_template(UNIQUE_RULE)
            .unwrap_or_else(|| UNIQUE_MESSAGE.to_string());
        let mut taken = Vec::new();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    let message = format_message(item.message.unwrap_or(&template), item.param);
                    taken.push(FieldViolation::new(item.field_id, UNIQUE_RULE, message));
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        field = %item.field_id,
                        error = %e,
                        "Uniqueness lookup failed, treating as unique"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        field = %item.field_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Uniqueness lookup timed out, treating as unique"
                    );
                }
            }
        }

        if !taken.is_empty() {
            for violation in &taken {
                let entry = report
                    .fields
                    .iter_mut()
                    .find(|(id, _)| id == &violation.field);
                if let Some(entry) = entry {
                    entry.1 = FieldState::Failed;
                }
            }
            report.violations.extend(taken);
            report.result = ValidationResult::from_violations(report.violations.iter().cloned());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::schema::FieldSchema;
    use serde_json::json;
    use std::time::Duration;

    struct Taken(&'static [&'static str]);

    #[async_trait]
    impl UniquenessCheck for Taken {
        async fn is_unique(
            &self,
            _field_id: &str,
            value: &Value,
            _param: &Value,
        ) -> Result<bool, CoreError> {
            Ok(!value.as_str().is_some_and(|v| self.0.iter().any(|taken| *taken == v)))
        }
    }

    struct Broken;

    #[async_trait]
    impl UniquenessCheck for Broken {
        async fn is_unique(&self, _: &str, _: &Value, _: &Value) -> Result<bool, CoreError> {
            Err(CoreError::Lookup("connection refused".into()))
        }
    }

    fn data(pairs: &[(&str, Value)]) -> SubmissionData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSchema::new("username", "text").rule("unique", json!("users.username"))
        ])
    }

    #[tokio::test]
    async fn taken_value_fails() {
        let engine = ValidationEngine::new();
        let result = engine
            .validate_with_lookup(
                &schema(),
                &data(&[("username", json!("admin"))]),
                &Taken(&["admin"]),
            )
            .await;
        assert!(!result.valid);
        assert_eq!(result.errors_for("username"), ["This value is already taken"]);
    }

    #[tokio::test]
    async fn free_value_passes() {
        let engine = ValidationEngine::new();
        let result = engine
            .validate_with_lookup(
                &schema(),
                &data(&[("username", json!("newbie"))]),
                &Taken(&["admin"]),
            )
            .await;
        assert!(result.valid);
    }

    #[tokio::test]
    async fn lookup_error_is_inconclusive() {
        let engine = ValidationEngine::new();
        let result = engine
            .validate_with_lookup(&schema(), &data(&[("username", json!("admin"))]), &Broken)
            .await;
        assert!(result.valid);
    }

    #[tokio::test]
    async fn slow_lookup_times_out_and_passes() {
        struct Slow;

        #[async_trait]
        impl UniquenessCheck for Slow {
            async fn is_unique(&self, _: &str, _: &Value, _: &Value) -> Result<bool, CoreError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(false)
            }
        }

        let engine = ValidationEngine::with_config(EngineConfig {
            unique_timeout_ms: 50,
            ..EngineConfig::default()
        });
        let result = engine
            .validate_with_lookup(&schema(), &data(&[("username", json!("admin"))]), &Slow)
            .await;
        assert!(result.valid);
    }

    #[test]
    fn sync_validation_never_looks_up() {
        let engine = ValidationEngine::new();
        assert!(engine.validate(&schema(), &data(&[("username", json!("admin"))])).valid);
    }

    #[tokio::test]
    async fn failed_fields_are_not_looked_up() {
        let engine = ValidationEngine::new();
        let schema = FormSchema::new(vec![FieldSchema::new("username", "text")
            .rule("min_length", json!(10))
            .rule("unique", json!(true))]);
        let report = engine
            .validate_detailed_with_lookup(
                &schema,
                &data(&[("username", json!("admin"))]),
                &Taken(&["admin"]),
            )
            .await;
        assert_eq!(report.result.errors_for("username"), ["Minimum length is 10 characters"]);
        assert_eq!(report.state_of("username"), Some(FieldState::Failed));
    }
}
