//! `formcheck rules`

use std::io::Write;

use clap::Args;
use formcheck_core::engine::ValidationEngine;
use serde::Serialize;

/// Arguments for the rules subcommand.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Print as a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RuleListing {
    name: String,
    message_template: String,
}

pub fn run(args: &RulesArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let engine = ValidationEngine::new();
    let registry = engine.registry();
    let listings: Vec<RuleListing> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let message_template = registry.message_template(&name)?;
            Some(RuleListing { name, message_template })
        })
        .collect();

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&listings)?)?;
    } else {
        let width = listings.iter().map(|l| l.name.len()).max().unwrap_or(0);
        for listing in &listings {
            writeln!(out, "{:<width$}  {}", listing.name, listing.message_template)?;
        }
    }
    Ok(())
}
