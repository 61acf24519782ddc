//! Rule table: lottery variant name -> draw parameters.
//!
//! The table is pure data. Built-in variants come from the embedded
//! `assets/rules.toml`; `[[variant]]` tables in the store config add new
//! variants or replace built-in ones by name.

use crate::core::config::{Config, VariantEntry};
use crate::core::error::LottoError;
use crate::core::store;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BUILTIN_RULES: &str = include_str!("../../assets/rules.toml");

/// Draw parameters for one variant. Pools are exclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub primary_pool: u32,
    pub primary_pick: u32,
    pub secondary_pool: u32,
    pub secondary_pick: u32,
}

impl RuleSpec {
    pub fn new(primary_pool: u32, primary_pick: u32) -> Self {
        Self {
            primary_pool,
            primary_pick,
            secondary_pool: 0,
            secondary_pick: 0,
        }
    }

    pub fn with_secondary(mut self, pool: u32, pick: u32) -> Self {
        self.secondary_pool = pool;
        self.secondary_pick = pick;
        self
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary_pick > 0
    }

    /// Check `0 < pick <= |[range_start, pool)|` for each active group.
    pub fn validate(&self, variant: &str, range_start: u32) -> Result<(), LottoError> {
        let invalid = |reason: String| LottoError::InvalidRule {
            variant: variant.to_string(),
            reason,
        };
        if self.primary_pick == 0 {
            return Err(invalid("primary pick count must be positive".to_string()));
        }
        let primary_size = self.primary_pool.saturating_sub(range_start);
        if self.primary_pick > primary_size {
            return Err(invalid(format!(
                "cannot pick {} distinct numbers from {}..{}",
                self.primary_pick, range_start, self.primary_pool
            )));
        }
        if self.has_secondary() {
            let secondary_size = self.secondary_pool.saturating_sub(range_start);
            if self.secondary_pick > secondary_size {
                return Err(invalid(format!(
                    "cannot pick {} distinct secondary numbers from {}..{}",
                    self.secondary_pick, range_start, self.secondary_pool
                )));
            }
        }
        Ok(())
    }
}

impl From<&VariantEntry> for RuleSpec {
    fn from(entry: &VariantEntry) -> Self {
        RuleSpec::new(entry.primary_pool, entry.primary_pick)
            .with_secondary(entry.secondary_pool, entry.secondary_pick)
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    variant: Vec<VariantEntry>,
}

/// Ordered variant table. Declaration order is kept; the first entry is the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    entries: Vec<(String, RuleSpec)>,
}

impl RuleTable {
    pub fn builtin() -> Result<Self, LottoError> {
        Self::from_toml(BUILTIN_RULES)
    }

    pub fn from_toml(content: &str) -> Result<Self, LottoError> {
        let file: RulesFile =
            toml::from_str(content).map_err(|e| LottoError::ConfigError(e.to_string()))?;
        Self::from_entries(&file.variant)
    }

    pub fn from_entries(entries: &[VariantEntry]) -> Result<Self, LottoError> {
        let mut seen = HashSet::new();
        let mut table = RuleTable::default();
        for entry in entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(LottoError::InvalidRule {
                    variant: entry.name.clone(),
                    reason: "declared more than once".to_string(),
                });
            }
            table.insert(entry)?;
        }
        Ok(table)
    }

    /// Built-in table with the config's `[[variant]]` overrides applied and
    /// every entry validated against the configured range start.
    pub fn load(config: &Config) -> Result<Self, LottoError> {
        let mut table = Self::builtin()?;
        table.merge(&config.variants)?;
        table.validate(config.draw.range_start)?;
        Ok(table)
    }

    /// Replace entries with matching names, append the rest.
    pub fn merge(&mut self, overrides: &[VariantEntry]) -> Result<(), LottoError> {
        for entry in overrides {
            self.insert(entry)?;
        }
        Ok(())
    }

    fn insert(&mut self, entry: &VariantEntry) -> Result<(), LottoError> {
        store::validate_key(&entry.name).map_err(|_| LottoError::InvalidRule {
            variant: entry.name.clone(),
            reason: "name may only contain ASCII letters, digits, '-' and '_'".to_string(),
        })?;
        let spec = RuleSpec::from(entry);
        match self.entries.iter_mut().find(|(name, _)| *name == entry.name) {
            Some(slot) => slot.1 = spec,
            None => self.entries.push((entry.name.clone(), spec)),
        }
        Ok(())
    }

    pub fn validate(&self, range_start: u32) -> Result<(), LottoError> {
        for (name, spec) in &self.entries {
            spec.validate(name, range_start)?;
        }
        Ok(())
    }

    pub fn lookup(&self, variant: &str) -> Result<&RuleSpec, LottoError> {
        self.entries
            .iter()
            .find(|(name, _)| name == variant)
            .map(|(_, spec)| spec)
            .ok_or_else(|| LottoError::UnknownVariant(variant.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn default_variant(&self) -> Option<&str> {
        self.entries.first().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
