//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default bound on a single uniqueness lookup, in milliseconds.
pub const DEFAULT_UNIQUE_TIMEOUT_MS: u64 = 2_000;

/// Default tolerance for `sum` cross-field rules.
pub const DEFAULT_SUM_TOLERANCE: f64 = 0.01;

/// How the engine treats configuration it does not understand (unknown rule
/// names, unknown operators, malformed conditions, under-specified
/// cross-field rules).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Unrecognised configuration passes silently.
    #[default]
    Permissive,
    /// Unrecognised configuration is reported as a violation.
    Strict,
}

impl Policy {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        }
    }

    /// Parse from a wire-format string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(CoreError::Config(format!(
                "Invalid policy: '{other}'. Must be one of: permissive, strict"
            ))),
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings for a [`ValidationEngine`](crate::engine::ValidationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treatment of unrecognised configuration (default: permissive).
    pub policy: Policy,
    /// Upper bound for each uniqueness lookup (default: `2000`).
    pub unique_timeout_ms: u64,
    /// Tolerance used by `sum` rules that do not declare their own.
    pub sum_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Permissive,
            unique_timeout_ms: DEFAULT_UNIQUE_TIMEOUT_MS,
            sum_tolerance: DEFAULT_SUM_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default      |
    /// |-------------------------------|--------------|
    /// | `FORMCHECK_POLICY`            | `permissive` |
    /// | `FORMCHECK_UNIQUE_TIMEOUT_MS` | `2000`       |
    /// | `FORMCHECK_SUM_TOLERANCE`     | `0.01`       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Split out from [`EngineConfig::from_env`] so tests do not have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("FORMCHECK_POLICY") {
            config.policy = Policy::parse(&raw)?;
        }

        if let Some(raw) = lookup("FORMCHECK_UNIQUE_TIMEOUT_MS") {
            config.unique_timeout_ms = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!(
                    "FORMCHECK_UNIQUE_TIMEOUT_MS must be a valid u64, got '{raw}'"
                ))
            })?;
        }

        if let Some(raw) = lookup("FORMCHECK_SUM_TOLERANCE") {
            let tolerance: f64 = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!(
                    "FORMCHECK_SUM_TOLERANCE must be a number, got '{raw}'"
                ))
            })?;
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(CoreError::Config(format!(
                    "FORMCHECK_SUM_TOLERANCE must be a non-negative number, got {tolerance}"
                )));
            }
            config.sum_tolerance = tolerance;
        }

        Ok(config)
    }

    pub fn unique_timeout(&self) -> Duration {
        Duration::from_millis(self.unique_timeout_ms)
    }
}
