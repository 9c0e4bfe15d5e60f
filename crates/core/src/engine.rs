//! Submission validation.
//!
//! [`ValidationEngine`] owns a [`RuleRegistry`] and an [`EngineConfig`] and
//! drives every field of a schema through the same state machine:
//!
//! ```text
//! not evaluated --(condition gate)--> skipped
//!                                 \--> evaluated --(field checks)--> passed | failed
//! ```
//!
//! Once every field is terminal, cross-field rules run exactly once over the
//! whole submission. Validation never returns an error: invalid data is
//! reported in the result, unrecognised configuration is handled according
//! to the [`Policy`](crate::config::Policy).

use crate::condition::evaluate;
use crate::config::EngineConfig;
use crate::cross_field::CrossFieldValidator;
use crate::extension::ValidatorExtension;
use crate::field::FieldValidator;
use crate::result::{FieldState, FieldViolation, ValidationReport, ValidationResult};
use crate::rules::{RuleRegistry, Validator};
use crate::schema::{FieldSchema, FormSchema};
use crate::types::SubmissionData;

/// Rule label for violations raised by malformed conditional logic.
pub const CONDITION_RULE: &str = "conditional_logic";

/// Validation context: rule table plus runtime settings.
///
/// `Send + Sync`; share one engine behind an `Arc` across request handlers.
/// Custom rules may be registered at any time, though registering before
/// traffic starts keeps results stable across concurrent submissions.
#[derive(Debug)]
pub struct ValidationEngine {
    registry: RuleRegistry,
    config: EngineConfig,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Engine with the built-in rules and default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let registry = RuleRegistry::with_builtins();
        tracing::debug!(
            rules = registry.len(),
            policy = %config.policy,
            "Validation engine initialised"
        );
        Self { registry, config }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register (or replace) a rule.
    pub fn add_custom_validator<V>(
        &self,
        name: impl Into<String>,
        validator: V,
        message_template: impl Into<String>,
    ) where
        V: Validator + 'static,
    {
        self.registry.register(name, message_template, validator);
    }

    pub fn install_extension(&self, extension: &dyn ValidatorExtension) {
        extension.install(&self.registry);
        tracing::info!(extension = %extension.name(), "Validator extension installed");
    }

    /// Validate `data` against `schema`.
    pub fn validate(&self, schema: &FormSchema, data: &SubmissionData) -> ValidationResult {
        self.validate_detailed(schema, data).into_result()
    }

    /// Like [`ValidationEngine::validate`], also reporting each field's
    /// terminal state.
    pub fn validate_detailed(
        &self,
        schema: &FormSchema,
        data: &SubmissionData,
    ) -> ValidationReport {
        let field_validator = FieldValidator::new(&self.registry, self.config.policy);
        let mut violations: Vec<FieldViolation> = Vec::new();
        let mut fields = Vec::with_capacity(schema.fields.len());

        for field in &schema.fields {
            let state = match self.gate(field, data) {
                Gate::Closed => {
                    tracing::debug!(field = %field.field_id, "Condition not met, field skipped");
                    FieldState::Skipped
                }
                Gate::Open(anomaly) => {
                    let mut failed = false;
                    let value = data.get(&field.field_id);
                    if let Some(violation) = field_validator.validate(field, value, data) {
                        violations.push(violation);
                        failed = true;
                    }
                    if let Some(violation) = anomaly {
                        violations.push(violation);
                        failed = true;
                    }
                    if failed {
                        FieldState::Failed
                    } else {
                        FieldState::Passed
                    }
                }
            };
            fields.push((field.field_id.clone(), state));
        }

        let cross_field = CrossFieldValidator::new(self.config.policy, self.config.sum_tolerance);
        violations.extend(cross_field.validate(&schema.cross_field_rules, data));

        let result = ValidationResult::from_violations(violations.iter().cloned());
        tracing::debug!(
            fields = schema.fields.len(),
            errors = result.error_count(),
            valid = result.valid,
            "Submission validated"
        );
        ValidationReport {
            result,
            fields,
            violations,
        }
    }

    /// Decide whether `field` is evaluated. Malformed conditions keep the
    /// gate open; under a strict policy they also yield a violation.
    fn gate(&self, field: &FieldSchema, data: &SubmissionData) -> Gate {
        let Some(condition) = &field.conditional_logic else {
            return Gate::Open(None);
        };
        if let Some(problem) = condition.anomaly() {
            if self.config.policy.is_strict() {
                return Gate::Open(Some(FieldViolation::new(
                    &field.field_id,
                    CONDITION_RULE,
                    format!("Invalid conditional logic: {problem}"),
                )));
            }
            tracing::debug!(
                field = %field.field_id,
                %problem,
                "Malformed condition, field always evaluated"
            );
            return Gate::Open(None);
        }
        if evaluate(condition, data) {
            Gate::Open(None)
        } else {
            Gate::Closed
        }
    }
}

enum Gate {
    Closed,
    Open(Option<FieldViolation>),
}
