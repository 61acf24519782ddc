//! lotgen: lottery line generation with a durable per-variant batch store.
//!
//! # Architecture
//!
//! - **Rule table** ([`plugins::rules`]): variant name -> pool and pick sizes,
//!   loaded from an embedded TOML table plus optional `config.toml` overrides.
//! - **Draw engine** ([`plugins::draw`]): unbiased sampling without
//!   replacement; the randomness source is injected so batches are
//!   reproducible under a fixed seed.
//! - **Batch store** ([`plugins::batch`]): one SQLite record per variant,
//!   replaced atomically on save, with checksum and schema-version checks on load.
//! - **Session** ([`plugins::session`]): turns a front end's request into an
//!   immutable outcome with formatted lines and status text.
//!
//! Generation never touches disk; saving is a separate step composed by the
//! session, so a failed save still returns the generated lines.
//!
//! # Examples
//!
//! ```bash
//! lotgen generate --variant EuroMillions --lines 5 --save
//! lotgen show --variant EuroMillions
//! lotgen delete --variant EuroMillions
//! ```

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{Cli, Command, OutputFormat};
use crate::core::error;
use crate::plugins::rules::RuleTable;
use crate::plugins::session::{Action, Outcome, Request, Session};

use clap::Parser;
use colored::Colorize;
use rand::Rng;

pub fn run() -> Result<(), error::LottoError> {
    let cli = Cli::parse();
    match cli.seed {
        Some(seed) => dispatch(Session::open_seeded(&cli.root, seed)?, &cli),
        None => dispatch(Session::open(&cli.root)?, &cli),
    }
}

fn dispatch<R: Rng>(mut session: Session<R>, cli: &Cli) -> Result<(), error::LottoError> {
    let request = match &cli.command {
        Command::Variants => return print_variants(session.rules(), cli.format),
        Command::Generate {
            variant,
            lines,
            save,
        } => {
            let action = if *save {
                Action::GenerateAndSave
            } else {
                Action::Generate
            };
            let lines = lines.unwrap_or(session.config().lines.default);
            Request::new(resolve_variant(session.rules(), variant)?, lines, action)
        }
        Command::Show { variant } => Request::new(
            resolve_variant(session.rules(), variant)?,
            0,
            Action::LoadSaved,
        ),
        Command::Delete { variant } => Request::new(
            resolve_variant(session.rules(), variant)?,
            0,
            Action::DeleteSaved,
        ),
    };

    let outcome = session.handle(&request)?;
    print_outcome(&outcome, cli.format)
}

fn resolve_variant(
    rules: &RuleTable,
    variant: &Option<String>,
) -> Result<String, error::LottoError> {
    match variant {
        Some(v) => Ok(v.clone()),
        None => rules
            .default_variant()
            .map(str::to_string)
            .ok_or_else(|| error::LottoError::ConfigError("no variants configured".to_string())),
    }
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> Result<(), error::LottoError> {
    if format == OutputFormat::Json {
        let text = serde_json::to_string_pretty(outcome)
            .map_err(|e| error::LottoError::IoError(e.into()))?;
        println!("{}", text);
        return Ok(());
    }

    let title = outcome.title();
    if !title.is_empty() {
        println!("{}", title.bold());
        for line in outcome.numbered_lines() {
            println!("  {}", line);
        }
    }
    let status = outcome.status_text();
    if outcome.was_saved || outcome.lines.is_empty() {
        println!("{}", status.bright_green());
    } else {
        println!("{}", status.bright_yellow());
    }
    Ok(())
}

fn print_variants(rules: &RuleTable, format: OutputFormat) -> Result<(), error::LottoError> {
    if format == OutputFormat::Json {
        let list: Vec<serde_json::Value> = rules
            .iter()
            .map(|(name, spec)| serde_json::json!({ "name": name, "rules": spec }))
            .collect();
        let text = serde_json::to_string_pretty(&list)
            .map_err(|e| error::LottoError::IoError(e.into()))?;
        println!("{}", text);
        return Ok(());
    }

    for (name, spec) in rules.iter() {
        let mut line = format!(
            "{:<14} {} from {}",
            name, spec.primary_pick, spec.primary_pool
        );
        if spec.has_secondary() {
            line.push_str(&format!(
                " + {} from {}",
                spec.secondary_pick, spec.secondary_pool
            ));
        }
        println!("{}", line);
    }
    Ok(())
}
