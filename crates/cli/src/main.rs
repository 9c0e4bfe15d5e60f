//! # formcheck CLI entry point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use formcheck_cli::{lint, rules, validate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Schema-driven form validation.
#[derive(Parser, Debug)]
#[command(name = "formcheck", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a submission against a schema.
    Validate(validate::ValidateArgs),
    /// Check a schema for authoring mistakes.
    Lint(lint::LintArgs),
    /// List registered rules.
    Rules(rules::RulesArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut stdout = io::stdout().lock();
    let ok = match &cli.command {
        Commands::Validate(args) => validate::run(args, &mut stdout)?,
        Commands::Lint(args) => lint::run(args, &mut stdout)?,
        Commands::Rules(args) => {
            rules::run(args, &mut stdout)?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "formcheck=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}
