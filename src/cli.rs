//! CLI struct definitions for the lotgen command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "lotgen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate lottery lines and keep the last batch per variant."
)]
pub(crate) struct Cli {
    /// Store directory holding saved batches and config.toml.
    #[clap(long, global = true, default_value = ".lotgen")]
    pub root: PathBuf,
    /// Seed the generator for reproducible output.
    #[clap(long, global = true)]
    pub seed: Option<u64>,
    /// Output format.
    #[clap(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Generate lines, optionally saving them as the variant's current batch
    Generate {
        /// Lottery variant (defaults to the first configured variant)
        #[clap(long, short)]
        variant: Option<String>,
        /// Number of lines (defaults to lines.default from config)
        #[clap(long, short)]
        lines: Option<u32>,
        /// Save the batch, replacing any previous one for this variant
        #[clap(long)]
        save: bool,
    },
    /// Show the saved batch for a variant
    Show {
        #[clap(long, short)]
        variant: Option<String>,
    },
    /// Delete the saved batch for a variant
    Delete {
        #[clap(long, short)]
        variant: Option<String>,
    },
    /// List configured variants and their rules
    Variants,
}
