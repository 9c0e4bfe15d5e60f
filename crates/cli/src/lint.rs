//! `formcheck lint`

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::input::load_schema;

/// Arguments for the lint subcommand.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Path to the form schema (JSON).
    #[arg(long)]
    pub schema: PathBuf,
}

/// Returns `false` when the schema has a problem; the problem is written to
/// `out`.
pub fn run(args: &LintArgs, out: &mut impl Write) -> anyhow::Result<bool> {
    let schema = load_schema(&args.schema)?;
    match schema.lint() {
        Ok(()) => {
            writeln!(
                out,
                "{}: ok ({} fields, {} cross-field rules)",
                args.schema.display(),
                schema.fields.len(),
                schema.cross_field_rules.len()
            )?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "{}: {e}", args.schema.display())?;
            Ok(false)
        }
    }
}
