//! Store-level configuration loaded from `<root>/config.toml`.
//!
//! ```toml
//! [lines]
//! min = 1
//! max = 99
//! default = 5
//!
//! [draw]
//! range_start = 1
//!
//! [[variant]]
//! name = "SmallLotto"
//! primary_pool = 50
//! primary_pick = 6
//! ```

use crate::core::error::LottoError;
use crate::core::store::Store;
use serde::{Deserialize, Serialize};
use std::fs;

/// Allowed number of lines per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePolicy {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for LinePolicy {
    fn default() -> Self {
        Self {
            min: 1,
            max: 99,
            default: 5,
        }
    }
}

impl LinePolicy {
    pub fn check(&self, count: u32) -> Result<(), LottoError> {
        if count < self.min || count > self.max {
            return Err(LottoError::InvalidLineCount {
                count,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Lowest number that can be drawn from any pool.
    pub range_start: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self { range_start: 1 }
    }
}

/// One `[[variant]]` table, shared by the embedded rule table and user config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    pub primary_pool: u32,
    pub primary_pick: u32,
    #[serde(default)]
    pub secondary_pool: u32,
    #[serde(default)]
    pub secondary_pick: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lines: LinePolicy,
    pub draw: DrawConfig,
    #[serde(rename = "variant")]
    pub variants: Vec<VariantEntry>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, LottoError> {
        let config: Config =
            toml::from_str(content).map_err(|e| LottoError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LottoError> {
        let p = &self.lines;
        if p.min == 0 {
            return Err(LottoError::ConfigError(
                "lines.min must be at least 1".to_string(),
            ));
        }
        if p.min > p.max {
            return Err(LottoError::ConfigError(format!(
                "lines.min ({}) exceeds lines.max ({})",
                p.min, p.max
            )));
        }
        if p.default < p.min || p.default > p.max {
            return Err(LottoError::ConfigError(format!(
                "lines.default ({}) is outside {}-{}",
                p.default, p.min, p.max
            )));
        }
        Ok(())
    }
}

/// Load `<root>/config.toml`. No config file means defaults, not an error.
pub fn load_config(store: &Store) -> Result<Config, LottoError> {
    let path = store.config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path).map_err(LottoError::IoError)?;
    Config::from_toml(&content).map_err(|e| match e {
        LottoError::ConfigError(msg) => {
            LottoError::ConfigError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}
