//! `formcheck validate`

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use formcheck_core::engine::ValidationEngine;

use crate::input::{load_config, load_schema, load_submission};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the form schema (JSON).
    #[arg(long)]
    pub schema: PathBuf,

    /// Path to the submitted values (JSON object).
    #[arg(long)]
    pub data: PathBuf,

    /// Report unknown rules, operators and malformed conditions as errors.
    #[arg(long)]
    pub strict: bool,

    /// Engine configuration file (JSON); replaces environment settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Include per-field states and violations in the output.
    #[arg(long)]
    pub detailed: bool,
}

/// Validate and print the result as pretty JSON. Returns whether the
/// submission is valid.
pub fn run(args: &ValidateArgs, out: &mut impl Write) -> anyhow::Result<bool> {
    let config = load_config(args.config.as_deref(), args.strict)?;
    let schema = load_schema(&args.schema)?;
    let data = load_submission(&args.data)?;

    let engine = ValidationEngine::with_config(config);
    let report = engine.validate_detailed(&schema, &data);
    let valid = report.result.valid;
    tracing::info!(
        schema = %args.schema.display(),
        fields = schema.fields.len(),
        errors = report.result.error_count(),
        valid,
        "Validation finished"
    );

    let rendered = if args.detailed {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.result)?
    };
    writeln!(out, "{rendered}").context("Failed to write result")?;
    Ok(valid)
}
