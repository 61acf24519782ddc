//! Request dispatcher between a front end and the engine/store pair.
//!
//! A front end sends a `Request` and renders the returned `Outcome` as-is:
//! the outcome already carries formatted lines and the exact status text,
//! so no front end needs branching logic of its own.

use crate::core::config::{self, Config};
use crate::core::error::LottoError;
use crate::core::output::{self, NumberFormat, TwoDigit};
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::batch::BatchStore;
use crate::plugins::draw::{Batch, DrawEngine};
use crate::plugins::rules::RuleTable;
use rand::Rng;
use rand::rngs::StdRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Generate,
    GenerateAndSave,
    LoadSaved,
    DeleteSaved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub variant: String,
    pub line_count: u32,
    pub action: Action,
}

impl Request {
    pub fn new(variant: impl Into<String>, line_count: u32, action: Action) -> Self {
        Self {
            variant: variant.into(),
            line_count,
            action,
        }
    }
}

/// What happened, in the terms a user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Saved { lines: u32 },
    NotSaved { lines: u32 },
    SaveFailed { lines: u32, reason: String },
    Loaded { lines: u32, saved_on: String },
    Missing { path: PathBuf },
    Deleted { path: PathBuf },
    NotFound { path: PathBuf },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Saved { lines } => write!(
                f,
                "The numbers have been saved and {} lines were generated",
                lines
            ),
            Status::NotSaved { lines } => write!(
                f,
                "The numbers have not been saved and {} lines were generated",
                lines
            ),
            Status::SaveFailed { lines, reason } => write!(
                f,
                "The numbers could not be saved ({}) and {} lines were generated",
                reason, lines
            ),
            Status::Loaded { lines, saved_on } => {
                write!(f, "Showing {} stored lines saved on {}", lines, saved_on)
            }
            Status::Missing { path } => write!(f, "File <{}> is missing", path.display()),
            Status::Deleted { path } => write!(f, "File: <{}> was deleted", path.display()),
            Status::NotFound { path } => write!(f, "File: <{}> was not found", path.display()),
        }
    }
}

/// Immutable result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub variant: String,
    pub line_count: u32,
    pub was_saved: bool,
    pub was_generated: bool,
    pub created_at: Option<String>,
    pub lines: Vec<String>,
    pub status: Status,
}

impl Outcome {
    fn from_batch(batch: &Batch, fmt: &dyn NumberFormat, was_generated: bool, status: Status) -> Self {
        Self {
            variant: batch.variant.clone(),
            line_count: batch.line_count,
            was_saved: batch.persisted,
            was_generated,
            created_at: Some(time::display_local(&batch.created_at)),
            lines: batch.render_lines(fmt),
            status,
        }
    }

    fn empty(variant: &str, status: Status) -> Self {
        Self {
            variant: variant.to_string(),
            line_count: 0,
            was_saved: false,
            was_generated: false,
            created_at: None,
            lines: Vec::new(),
            status,
        }
    }

    /// Heading for a result listing, empty when there is nothing to list.
    pub fn title(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let action = if self.was_generated { "Generated" } else { "Stored" };
        format!("{} {} Lottery numbers", action, self.variant)
    }

    pub fn numbered_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| output::numbered(i, line))
            .collect()
    }

    pub fn status_text(&self) -> String {
        self.status.to_string()
    }
}

pub struct Session<R: Rng> {
    config: Config,
    rules: RuleTable,
    store: BatchStore,
    engine: DrawEngine<R>,
    format: Box<dyn NumberFormat>,
}

impl Session<StdRng> {
    /// Open the store at `root` with an OS-seeded engine.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, LottoError> {
        let (store, config, rules) = prepare(root.as_ref())?;
        let engine = DrawEngine::from_os_rng(config.lines, config.draw.range_start);
        Ok(Self::assemble(config, rules, store, engine))
    }
}

impl Session<ChaCha8Rng> {
    /// Open the store at `root` with a reproducible engine.
    pub fn open_seeded(root: impl AsRef<Path>, seed: u64) -> Result<Self, LottoError> {
        let (store, config, rules) = prepare(root.as_ref())?;
        let engine = DrawEngine::seeded(config.lines, config.draw.range_start, seed);
        Ok(Self::assemble(config, rules, store, engine))
    }
}

fn prepare(root: &Path) -> Result<(Store, Config, RuleTable), LottoError> {
    let store = Store::new(root);
    let config = config::load_config(&store)?;
    let rules = RuleTable::load(&config)?;
    Ok((store, config, rules))
}

impl<R: Rng> Session<R> {
    pub fn assemble(config: Config, rules: RuleTable, store: Store, engine: DrawEngine<R>) -> Self {
        Self {
            config,
            rules,
            store: BatchStore::new(store),
            engine,
            format: Box::new(TwoDigit),
        }
    }

    pub fn with_format(mut self, format: Box<dyn NumberFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    pub fn handle(&mut self, request: &Request) -> Result<Outcome, LottoError> {
        match request.action {
            Action::Generate => self.generate(request, false),
            Action::GenerateAndSave => self.generate(request, true),
            Action::LoadSaved => self.show_saved(&request.variant),
            Action::DeleteSaved => self.delete_saved(&request.variant),
        }
    }

    fn generate(&mut self, request: &Request, save: bool) -> Result<Outcome, LottoError> {
        let spec = *self.rules.lookup(&request.variant)?;
        let mut batch = self
            .engine
            .generate(&request.variant, &spec, request.line_count)?;
        let lines = batch.line_count;

        let status = if !save {
            Status::NotSaved { lines }
        } else {
            match self.store.save(&batch) {
                Ok(saved_at) => {
                    batch.created_at = saved_at;
                    batch.persisted = true;
                    Status::Saved { lines }
                }
                Err(LottoError::StoreWriteError { path, reason }) => {
                    log::warn!("save to {} failed: {}", path.display(), reason);
                    Status::SaveFailed { lines, reason }
                }
                Err(e) => return Err(e),
            }
        };
        Ok(Outcome::from_batch(&batch, self.format.as_ref(), true, status))
    }

    fn show_saved(&self, variant: &str) -> Result<Outcome, LottoError> {
        self.rules.lookup(variant)?;
        match self.store.load(variant) {
            Ok(batch) => {
                let status = Status::Loaded {
                    lines: batch.line_count,
                    saved_on: time::display_local(&batch.created_at),
                };
                Ok(Outcome::from_batch(&batch, self.format.as_ref(), false, status))
            }
            Err(LottoError::NoSuchRecord(path)) => {
                Ok(Outcome::empty(variant, Status::Missing { path }))
            }
            Err(e) => Err(e),
        }
    }

    fn delete_saved(&self, variant: &str) -> Result<Outcome, LottoError> {
        self.rules.lookup(variant)?;
        let path = self.store.record_path(variant)?;
        let status = if self.store.delete(variant)? {
            Status::Deleted { path }
        } else {
            Status::NotFound { path }
        };
        Ok(Outcome::empty(variant, status))
    }
}
