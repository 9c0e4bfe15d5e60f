//! Plugin hook for registering bundles of custom rules.
//!
//! Extension collaborators (jurisdiction-specific id checks, house rules)
//! implement [`ValidatorExtension`] and are installed into an engine before
//! validation traffic begins. Installing registers through the same
//! last-writer-wins path as [`RuleRegistry::register`], so an extension may
//! override built-ins.

use std::sync::Arc;

use crate::rules::{RuleRegistry, Validator};

/// A named bundle of custom rules.
pub trait ValidatorExtension: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Register this extension's rules.
    fn install(&self, registry: &RuleRegistry);
}

/// A [`ValidatorExtension`] assembled from closures or validator values.
pub struct RuleSet {
    name: String,
    rules: Vec<(String, String, Arc<dyn Validator>)>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule<V>(
        mut self,
        name: impl Into<String>,
        message_template: impl Into<String>,
        validator: V,
    ) -> Self
    where
        V: Validator + 'static,
    {
        self.rules
            .push((name.into(), message_template.into(), Arc::new(validator)));
        self
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _, _)| name.as_str())
    }
}

impl ValidatorExtension for RuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, registry: &RuleRegistry) {
        for (name, template, validator) in &self.rules {
            registry.register(
                name.clone(),
                template.clone(),
                SharedValidator(Arc::clone(validator)),
            );
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("rules", &self.rule_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Lets one validator instance back several registries.
struct SharedValidator(Arc<dyn Validator>);

impl Validator for SharedValidator {
    fn validate(
        &self,
        value: &serde_json::Value,
        param: &serde_json::Value,
        all_values: &crate::types::SubmissionData,
    ) -> bool {
        self.0.validate(value, param, all_values)
    }
}
