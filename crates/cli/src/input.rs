//! Loading schemas, submissions and configuration from disk.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use formcheck_core::config::{EngineConfig, Policy};
use formcheck_core::schema::FormSchema;
use formcheck_core::types::SubmissionData;
use serde_json::Value;

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn load_schema(path: &Path) -> anyhow::Result<FormSchema> {
    let text = read(path)?;
    FormSchema::from_json(&text)
        .with_context(|| format!("Failed to parse schema {}", path.display()))
}

/// A submission must be a JSON object keyed by `field_id`.
pub fn load_submission(path: &Path) -> anyhow::Result<SubmissionData> {
    let text = read(path)?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse submission {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "Submission {} must be a JSON object, got {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

/// Environment first, then the config file (if any) replaces it, then
/// `--strict` forces the strict policy.
pub fn load_config(path: Option<&Path>, strict: bool) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = read(path)?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => EngineConfig::from_env().context("Invalid engine configuration in environment")?,
    };
    if strict {
        config.policy = Policy::Strict;
    }
    Ok(config)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn submission_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.json", "[1, 2]");
        let err = load_submission(&path).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object, got an array"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_schema(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn config_file_and_strict_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "config.json", r#"{"sum_tolerance": 0.5}"#);
        let config = load_config(Some(&path), true).unwrap();
        assert_eq!(config.sum_tolerance, 0.5);
        assert_eq!(config.policy, Policy::Strict);
        assert_eq!(config.unique_timeout_ms, 2_000);
    }
}
