//! Per-field validation.
//!
//! One field is checked in a fixed order, stopping at the first violation:
//!
//! 1. required-ness (an empty required value fails, an empty optional value
//!    passes without further checks);
//! 2. declared `validation_rules`, in declared order;
//! 3. the intrinsic check selected by `field_type`.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::config::Policy;
use crate::file::{descriptors, FileDescriptor};
use crate::result::FieldViolation;
use crate::rules::builtin::REQUIRED_MESSAGE;
use crate::rules::files::{accepts_type, within_size, DimensionBounds};
use crate::rules::message::format_message;
use crate::rules::{formats, numeric, temporal, text, with_text, RuleDefinition, RuleRegistry};
use crate::schema::{FieldSchema, FieldType};
use crate::types::SubmissionData;
use crate::value::{is_empty, loose_eq, to_list, to_number};

/// Message reported when a validator panics.
pub const PANIC_MESSAGE: &str = "This field could not be validated";

/// Rule label used for type-check violations and message overrides.
pub const TYPE_RULE: &str = "type";

/// Validates single fields against a registry.
#[derive(Debug, Clone, Copy)]
pub struct FieldValidator<'a> {
    registry: &'a RuleRegistry,
    policy: Policy,
}

impl<'a> FieldValidator<'a> {
    pub fn new(registry: &'a RuleRegistry, policy: Policy) -> Self {
        Self { registry, policy }
    }

    /// Validate `value` (the field's entry in `all_values`, if any).
    ///
    /// Returns the first violation, or `None` when the field passes.
    pub fn validate(
        &self,
        field: &FieldSchema,
        value: Option<&Value>,
        all_values: &SubmissionData,
    ) -> Option<FieldViolation> {
        if is_empty(value) {
            return is_required(field).then(|| self.required_violation(field));
        }
        let value = value?;

        for (rule, param) in &field.validation_rules {
            if rule == "required" || param == &Value::Bool(false) {
                continue;
            }
            let Some(definition) = self.registry.lookup(rule) else {
                if self.policy.is_strict() {
                    return Some(FieldViolation::new(
                        &field.field_id,
                        rule,
                        format!("Unknown validation rule '{rule}'"),
                    ));
                }
                tracing::debug!(
                    field = %field.field_id,
                    rule = %rule,
                    "Unknown validation rule, skipped"
                );
                continue;
            };

            match run_guarded(&definition, value, param, all_values) {
                Some(true) => {}
                Some(false) => {
                    let template = field
                        .message_override(rule)
                        .unwrap_or(&definition.message_template);
                    return Some(FieldViolation::new(
                        &field.field_id,
                        rule,
                        format_message(template, param),
                    ));
                }
                None => {
                    tracing::error!(field = %field.field_id, rule = %rule, "Validator panicked");
                    return Some(FieldViolation::new(&field.field_id, rule, PANIC_MESSAGE));
                }
            }
        }

        if type_check(field, value) {
            None
        } else {
            let message = field
                .message_override(TYPE_RULE)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Please provide a valid {}", field.kind().noun()));
            Some(FieldViolation::new(&field.field_id, TYPE_RULE, message))
        }
    }

    fn required_violation(&self, field: &FieldSchema) -> FieldViolation {
        let message = field
            .message_override("required")
            .map(str::to_string)
            .or_else(|| self.registry.message_template("required"))
            .unwrap_or_else(|| REQUIRED_MESSAGE.to_string());
        FieldViolation::new(&field.field_id, "required", message)
    }
}

/// The `required` flag, or an enabled `required` rule.
fn is_required(field: &FieldSchema) -> bool {
    field.required
        || field
            .validation_rules
            .get("required")
            .is_some_and(|param| param != &Value::Bool(false) && !param.is_null())
}

/// Run a validator, mapping a panic to `None`.
fn run_guarded(
    definition: &RuleDefinition,
    value: &Value,
    param: &Value,
    all_values: &SubmissionData,
) -> Option<bool> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        definition.validator.validate(value, param, all_values)
    }))
    .ok()
}

// ---------------------------------------------------------------------------
// Type-intrinsic checks
// ---------------------------------------------------------------------------

/// The semantic check implied by `field_type`, independent of declared rules.
pub fn type_check(field: &FieldSchema, value: &Value) -> bool {
    match field.kind() {
        FieldType::Email => with_text(value, text::is_email),
        FieldType::Url => with_text(value, text::is_url),
        FieldType::Numeric => numeric::is_numeric(value),
        FieldType::Date => with_text(value, |s| temporal::parse_moment(s).is_some()),
        FieldType::Phone => with_text(value, text::is_phone),
        FieldType::FileUpload => uploads_ok(field, value, false),
        FieldType::Image => uploads_ok(field, value, true),
        FieldType::Coordinates => numeric::is_coordinates(value),
        FieldType::Json => formats::is_json(value),
        FieldType::Xml => value.as_str().is_some_and(formats::is_well_formed_xml),
        FieldType::Select => match value {
            Value::Array(_) | Value::Object(_) => false,
            scalar => is_declared_option(field, scalar),
        },
        FieldType::MultiSelect => match value {
            Value::Array(items) => items.iter().all(|item| is_declared_option(field, item)),
            Value::Object(_) => false,
            scalar => is_declared_option(field, scalar),
        },
        FieldType::Other => true,
    }
}

/// Descriptors must decode and satisfy `accepted_types`, `max_size` (KB)
/// and, for images, the dimension bounds in `field_options`.
fn uploads_ok(field: &FieldSchema, value: &Value, image: bool) -> bool {
    let Some(files) = descriptors(value) else {
        return false;
    };
    let options = &field.field_options;
    let accepted = options
        .get("accepted_types")
        .or_else(|| options.get("allowed_types"))
        .map(to_list)
        .unwrap_or_default();
    let max_kb = options.get("max_size").and_then(to_number);
    let bounds = DimensionBounds::from_map(options);

    files.iter().all(|file: &FileDescriptor| {
        file.is_present()
            && (accepted.is_empty() || accepts_type(file, &accepted))
            && max_kb.map_or(true, |kb| within_size(file, kb))
            && (!image || (file.is_image() && bounds.admits(file)))
    })
}

/// Membership in `field_options.options`; passes when no options are
/// declared.
fn is_declared_option(field: &FieldSchema, value: &Value) -> bool {
    let Some(Value::Array(options)) = field.field_options.get("options") else {
        return true;
    };
    if options.is_empty() {
        return true;
    }
    options.iter().any(|option| {
        let allowed = match option {
            Value::Object(map) => map.get("value").unwrap_or(&Value::Null),
            other => other,
        };
        loose_eq(allowed, value)
    })
}
