//! Rule registry: rule name -> (message template, validator).
//!
//! The registry is built once per [`ValidationEngine`](crate::engine::ValidationEngine)
//! with the built-in catalogue and can be extended at runtime. Entries are
//! never removed; registering an existing name replaces it (last writer
//! wins), which is how built-ins are overridden.
//!
//! Reads vastly outnumber writes, so the map sits behind a `RwLock`:
//! validations take the read side, registrations the write side.

pub mod builtin;
pub mod files;
pub mod formats;
pub mod identifiers;
pub mod message;
pub mod numeric;
pub mod temporal;
pub mod text;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::types::SubmissionData;

/// A named, pluggable predicate.
///
/// Implementations must be pure and non-blocking: no I/O, and `false`
/// (never a panic) for an invalid value.
pub trait Validator: Send + Sync {
    /// `value` is the field's non-empty submitted value, `param` the rule
    /// parameter from the schema, `all_values` the whole submission.
    fn validate(&self, value: &Value, param: &Value, all_values: &SubmissionData) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&Value, &Value, &SubmissionData) -> bool + Send + Sync,
{
    fn validate(&self, value: &Value, param: &Value, all_values: &SubmissionData) -> bool {
        self(value, param, all_values)
    }
}

/// Where a registry entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    Builtin,
    Custom,
}

/// A registered rule.
#[derive(Clone)]
pub struct RuleDefinition {
    pub message_template: String,
    pub validator: Arc<dyn Validator>,
    pub origin: RuleOrigin,
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("message_template", &self.message_template)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Thread-safe rule table.
#[derive(Default)]
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, RuleDefinition>>,
}

impl RuleRegistry {
    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the full built-in catalogue.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        builtin::register_all(&registry);
        registry
    }

    /// Register a custom rule, replacing any existing entry of that name.
    pub fn register<V>(
        &self,
        name: impl Into<String>,
        message_template: impl Into<String>,
        validator: V,
    ) where
        V: Validator + 'static,
    {
        self.insert(
            name.into(),
            message_template.into(),
            Arc::new(validator),
            RuleOrigin::Custom,
        );
    }

    pub(crate) fn register_builtin<V>(&self, name: &str, message_template: &str, validator: V)
    where
        V: Validator + 'static,
    {
        self.insert(
            name.to_string(),
            message_template.to_string(),
            Arc::new(validator),
            RuleOrigin::Builtin,
        );
    }

    fn insert(
        &self,
        name: String,
        message_template: String,
        validator: Arc<dyn Validator>,
        origin: RuleOrigin,
    ) {
        let definition = RuleDefinition {
            message_template,
            validator,
            origin,
        };
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = rules.insert(name.clone(), definition) {
            tracing::debug!(
                rule = %name,
                previous_origin = ?previous.origin,
                "Rule definition replaced"
            );
        }
    }

    /// Look up a rule. `None` means "not registered", never an error.
    pub fn lookup(&self, name: &str) -> Option<RuleDefinition> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Message template for `name`, if registered.
    pub fn message_template(&self, name: &str) -> Option<String> {
        self.lookup(name).map(|def| def.message_template)
    }

    /// All registered rule names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Names whose current definition was registered at runtime, sorted.
    pub fn custom_rule_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, def)| def.origin == RuleOrigin::Custom)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.len())
            .finish()
    }
}

/// Apply `check` to the value's text form; non-scalar values fail.
pub(crate) fn with_text(value: &Value, check: impl Fn(&str) -> bool) -> bool {
    match value {
        Value::String(s) => check(s.trim()),
        Value::Number(n) => check(&n.to_string()),
        _ => false,
    }
}
