use assert_matches::assert_matches;
use formcheck_core::config::{EngineConfig, Policy};
use formcheck_core::engine::ValidationEngine;
use formcheck_core::error::CoreError;
use formcheck_core::extension::RuleSet;
use formcheck_core::result::{FieldState, CROSS_FIELD_KEY};
use formcheck_core::schema::FormSchema;
use formcheck_core::types::SubmissionData;
use serde_json::{json, Value};

fn data(value: Value) -> SubmissionData {
    match value {
        Value::Object(map) => map,
        other => panic!("submission fixture must be an object, got {other}"),
    }
}

fn schema(value: Value) -> FormSchema {
    serde_json::from_value(value).unwrap()
}

#[test]
fn contact_form_reports_each_failing_field() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "email", "field_type": "text", "required": true,
             "validation_rules": {"email": true}},
            {"field_id": "phone", "field_type": "text", "validation_rules": {"min_length": 10}}
        ]
    }));
    let submission = data(json!({"email": "bad", "phone": "12345"}));
    let result = ValidationEngine::new().validate(&schema, &submission);

    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors_for("email"), ["Please enter a valid email address"]);
    assert_eq!(result.errors_for("phone"), ["Minimum length is 10 characters"]);
}

#[test]
fn conditional_field_is_skipped_when_condition_fails() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "A", "field_type": "radio"},
            {"field_id": "B", "field_type": "text", "required": true,
             "conditional_logic": {"field": "A", "operator": "equals", "value": "yes"}}
        ]
    }));
    let result = ValidationEngine::new().validate(&schema, &data(json!({"A": "no"})));

    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn cross_field_matches_over_three_fields() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "a"}, {"field_id": "b"}, {"field_id": "c"}
        ],
        "cross_field_rules": [{"type": "matches", "fields": ["a", "b", "c"]}]
    }));
    let engine = ValidationEngine::new();

    assert!(engine.validate(&schema, &data(json!({"a": "x", "b": "x", "c": "x"}))).valid);

    let result = engine.validate(&schema, &data(json!({"a": "x", "b": "y", "c": "x"})));
    assert!(!result.valid);
    assert_eq!(result.errors.keys().collect::<Vec<_>>(), vec![CROSS_FIELD_KEY]);
    assert_eq!(result.cross_field_errors().len(), 1);
}

#[test]
fn checksum_rules() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "card", "validation_rules": {"credit_card": true}},
            {"field_id": "book", "validation_rules": {"isbn": true}}
        ]
    }));
    let engine = ValidationEngine::new();

    let valid = data(json!({"card": "4111111111111111", "book": "0306406152"}));
    assert!(engine.validate(&schema, &valid).valid);

    let invalid = data(json!({"card": "4111111111111112", "book": "0306406153"}));
    let result = engine.validate(&schema, &invalid);
    assert_eq!(result.errors_for("card"), ["Please enter a valid credit card number"]);
    assert_eq!(result.errors_for("book"), ["Please enter a valid ISBN"]);
}

#[test]
fn registration_form_end_to_end() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "username", "required": true,
             "validation_rules": {"min_length": 3, "max_length": 20, "regex": "/^[a-z0-9_]+$/i"}},
            {"field_id": "password", "required": true,
             "validation_rules": {"password_strength": {"min_length": 10, "require_symbol": true}}},
            {"field_id": "password_confirmation", "required": true},
            {"field_id": "age", "field_type": "number",
             "validation_rules": {"range": {"min": 18, "max": 120}}},
            {"field_id": "country", "field_type": "select",
             "field_options": {"options": [
                 {"value": "NL", "label": "Netherlands"},
                 {"value": "US", "label": "United States"}
             ]}},
            {"field_id": "zip", "validation_rules": {"postal_code": "US"},
             "conditional_logic": {"field": "country", "operator": "==", "value": "US"}}
        ],
        "cross_field_rules": [
            {"type": "matches", "fields": ["password", "password_confirmation"],
             "message": "Passwords do not match"}
        ]
    }));
    let engine = ValidationEngine::new();

    let good = data(json!({
        "username": "Ada_Lovelace",
        "password": "Analytical-Engine1",
        "password_confirmation": "Analytical-Engine1",
        "age": "36",
        "country": "NL",
        "zip": "not checked"
    }));
    let report = engine.validate_detailed(&schema, &good);
    assert!(report.result.valid, "{:?}", report.result.errors);
    assert_eq!(report.state_of("zip"), Some(FieldState::Skipped));

    let bad = data(json!({
        "username": "ada lovelace",
        "password": "short",
        "password_confirmation": "different",
        "age": 12,
        "country": "DE",
        "zip": "1234"
    }));
    let result = engine.validate(&schema, &bad);
    assert_eq!(result.errors_for("username"), ["Invalid format"]);
    assert_eq!(result.errors_for("password"), ["Password is not strong enough"]);
    assert_eq!(result.errors_for("age"), ["Value must be between 18 and 120"]);
    assert_eq!(result.errors_for("country"), ["Please provide a valid option"]);
    assert!(result.errors_for("zip").is_empty());
    assert_eq!(result.cross_field_errors(), ["Passwords do not match"]);
}

#[test]
fn strict_policy_fails_closed() {
    let schema = schema(json!({
        "fields": [
            {"field_id": "vat", "validation_rules": {"eu_vat": true}},
            {"field_id": "note",
             "conditional_logic": {"field": "vat", "operator": "resembles", "value": "x"}}
        ],
        "cross_field_rules": [{"type": "xor", "fields": ["vat", "note"]}]
    }));
    let submission = data(json!({"vat": "NL123", "note": "hello"}));

    assert!(ValidationEngine::new().validate(&schema, &submission).valid);

    let strict = ValidationEngine::with_config(EngineConfig {
        policy: Policy::Strict,
        ..EngineConfig::default()
    });
    let result = strict.validate(&schema, &submission);
    assert_eq!(result.errors_for("vat"), ["Unknown validation rule 'eu_vat'"]);
    assert_eq!(
        result.errors_for("note"),
        ["Invalid conditional logic: unsupported operator 'resembles'"]
    );
    assert_eq!(
        result.cross_field_errors(),
        ["Invalid cross-field rule: unsupported cross-field rule 'xor'"]
    );
}

#[test]
fn extension_rules_apply_to_later_validations() {
    let schema = schema(json!({
        "fields": [{"field_id": "bsn", "validation_rules": {"nl_bsn": true}}]
    }));
    let engine = ValidationEngine::new();
    let submission = data(json!({"bsn": "111222333"}));
    assert!(engine.validate(&schema, &submission).valid);

    engine.install_extension(&RuleSet::new("nl").rule(
        "nl_bsn",
        "Please enter a valid BSN",
        |v: &Value, _: &Value, _: &SubmissionData| {
            let Some(s) = v.as_str() else { return false };
            let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
            digits.len() == 9
                && digits
                    .iter()
                    .enumerate()
                    .map(|(i, d)| if i == 8 { -(*d as i64) } else { (9 - i as i64) * *d as i64 })
                    .sum::<i64>()
                    % 11
                    == 0
        },
    ));

    assert!(engine.validate(&schema, &submission).valid);
    assert_eq!(
        engine.validate(&schema, &data(json!({"bsn": "123456789"}))).errors_for("bsn"),
        ["Please enter a valid BSN"]
    );
    assert_eq!(engine.registry().custom_rule_names(), vec!["nl_bsn".to_string()]);
}

#[test]
fn schema_lint_is_advisory() {
    let schema = schema(json!({
        "fields": [{"field_id": "a", "required": true}, {"field_id": "a"}],
        "cross_field_rules": [{"type": "at_least_one", "fields": []}]
    }));
    assert_matches!(schema.lint(), Err(CoreError::InvalidSchema(msg)) if msg.contains("Duplicate"));

    let result = ValidationEngine::new().validate(&schema, &SubmissionData::new());
    assert_eq!(result.errors_for("a"), ["This field is required"]);
}

#[test]
fn from_json_rejects_non_schema_text() {
    assert_matches!(FormSchema::from_json("42"), Err(CoreError::InvalidSchema(_)));
    assert_matches!(FormSchema::from_json(r#"{"fields": []}"#), Ok(s) if s.fields.is_empty());
}

#[test]
fn uploads_are_checked_by_descriptor() {
    let schema = schema(json!({
        "fields": [{
            "field_id": "scan",
            "field_type": "file",
            "required": true,
            "validation_rules": {"file_type": ["pdf", "image/*"], "file_size": 512}
        }]
    }));
    let engine = ValidationEngine::new();

    let ok = json!({
        "name": "passport.png",
        "size": 200_000,
        "mime_type": "image/png",
        "temp_storage_handle": "u/1"
    });
    assert!(engine.validate(&schema, &data(json!({"scan": ok}))).valid);

    let too_big = json!({"name": "passport.pdf", "size": 600_000, "mime_type": "application/pdf"});
    assert_eq!(
        engine.validate(&schema, &data(json!({"scan": too_big}))).errors_for("scan"),
        ["File size must not exceed 512 KB"]
    );

    let wrong = json!({"name": "run.exe", "size": 10, "mime_type": "application/x-msdownload"});
    assert_eq!(
        engine.validate(&schema, &data(json!({"scan": wrong}))).errors_for("scan"),
        ["File type must be one of: pdf, image/*"]
    );
}

#[test]
fn loosely_authored_schema_still_validates() {
    let schema = FormSchema::from_json(
        r#"{
            "fields": [
                {"field_id": "name", "required": "1"},
                {"field_id": "code", "field_type": null, "validation_rules": {"not_in": 5}},
                {"field_id": "payload", "field_type": "xml"},
                {"field_id": "tz", "validation_rules": {"timezone": true}},
                {"field_id": "a"},
                {"field_id": "b"}
            ],
            "cross_field_rules": {"type": "matches", "fields": ["a", "b"]}
        }"#,
    )
    .unwrap();
    let engine = ValidationEngine::new();

    let result = engine.validate(
        &schema,
        &data(json!({
            "code": "anything",
            "payload": "<a>&</a>",
            "tz": "Europe/Atlantis",
            "a": "x",
            "b": "y"
        })),
    );
    assert_eq!(result.errors_for("name"), ["This field is required"]);
    assert!(result.errors_for("code").is_empty());
    assert_eq!(result.errors_for("payload"), ["Please provide a valid XML document"]);
    assert_eq!(result.errors_for("tz"), ["Please enter a valid timezone"]);
    assert_eq!(result.cross_field_errors().len(), 1);

    let fixed = data(json!({
        "name": "Ada",
        "code": "anything",
        "payload": "<a>fish &amp; chips</a>",
        "tz": "Europe/Amsterdam",
        "a": "x",
        "b": "x"
    }));
    assert!(engine.validate(&schema, &fixed).valid);
}
