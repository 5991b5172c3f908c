//! Roadmap configuration.
//!
//! # Responsibility
//! - Describe the period horizon, import normalization and category rules.
//! - Load overrides from a TOML file; every section falls back to defaults.
//!
//! # Invariants
//! - A loaded config always yields a valid `PeriodRegistry`.
//! - Category rules are evaluated in declaration order, first match wins.

use crate::model::period::{
    PeriodDescriptor, PeriodNormalizer, PeriodRegistry, PeriodRegistryError,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Maps a responsible-party substring onto a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Lowercase substring searched in the lowercased responsible text.
    pub needle: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(needle: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            category: category.into(),
        }
    }
}

/// Tabular import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Minimum fields a row needs to recover a name.
    pub min_columns: usize,
    /// Responsible value used when the cell is empty.
    pub unassigned_responsible: String,
    /// Category used when no rule matches.
    pub default_category: String,
    pub category_rules: Vec<CategoryRule>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            min_columns: 2,
            unassigned_responsible: "Belirlenmemiş".to_string(),
            default_category: "Genel".to_string(),
            category_rules: vec![
                CategoryRule::new("ürün geliştirme", "Ürün Geliştirme"),
                CategoryRule::new("merve", "Sistem Geliştirme"),
                CategoryRule::new("dilruba", "Platform"),
            ],
        }
    }
}

impl ImportConfig {
    /// Resolves the category for a raw responsible value.
    pub fn category_for(&self, responsible: &str) -> String {
        let lowered = responsible.to_lowercase();
        self.category_rules
            .iter()
            .find(|rule| lowered.contains(rule.needle.to_lowercase().as_str()))
            .map(|rule| rule.category.clone())
            .unwrap_or_else(|| self.default_category.clone())
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapConfig {
    pub periods: Vec<PeriodDescriptor>,
    pub normalizer: PeriodNormalizer,
    pub import: ImportConfig,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            periods: PeriodRegistry::default().periods().to_vec(),
            normalizer: PeriodNormalizer::default(),
            import: ImportConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Periods(PeriodRegistryError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Periods(err) => write!(f, "invalid period list: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Periods(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<PeriodRegistryError> for ConfigError {
    fn from(value: PeriodRegistryError) -> Self {
        Self::Periods(value)
    }
}

impl RoadmapConfig {
    /// Parses a TOML document and validates the period list.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.period_registry()?;
        Ok(config)
    }

    /// Loads config from `path`.
    ///
    /// # Side effects
    /// - Emits `config_load` logging events with status.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|text| Self::from_toml_str(&text));
        match &loaded {
            Ok(config) => info!(
                "event=config_load module=config status=ok periods={} category_rules={}",
                config.periods.len(),
                config.import.category_rules.len()
            ),
            Err(err) => error!(
                "event=config_load module=config status=error error_code=config_invalid error={}",
                err
            ),
        }
        loaded
    }

    /// Builds the ordered period registry described by `periods`.
    pub fn period_registry(&self) -> Result<PeriodRegistry, PeriodRegistryError> {
        PeriodRegistry::from_descriptors(self.periods.clone())
    }
}
