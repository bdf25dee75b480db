//! Milestone catalog.
//!
//! A [`MilestoneRule`] awards a one-time bonus when a user's streak reaches
//! exactly its threshold. The catalog is read-only for the lifetime of a
//! calculation and indexed by threshold so lookups don't scan every rule.
//!
//! Catalog files are TOML:
//!
//! ```toml
//! [[milestone]]
//! name = "坚持三天"
//! threshold_days = 3
//! bonus = 2
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result, ValidationError};

/// A streak-length threshold and the bonus awarded on reaching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRule {
    pub name: String,
    pub threshold_days: i64,
    pub bonus: i64,
}

impl MilestoneRule {
    pub fn new(name: impl Into<String>, threshold_days: i64, bonus: i64) -> Self {
        Self {
            name: name.into(),
            threshold_days,
            bonus,
        }
    }

    /// Reject rules that could never fire or would subtract score.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidMilestone {
            name: self.name.clone(),
            message: message.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.threshold_days < 1 {
            return Err(invalid("threshold_days must be at least 1"));
        }
        if self.threshold_days > i64::from(u32::MAX) {
            return Err(invalid("threshold_days is out of range"));
        }
        if self.bonus < 0 {
            return Err(invalid("bonus must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    milestone: Vec<MilestoneRule>,
}

/// Validated set of milestone rules, indexed by threshold.
///
/// Rules sharing a threshold are all kept, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneCatalog {
    by_threshold: BTreeMap<u32, Vec<MilestoneRule>>,
}

impl MilestoneCatalog {
    /// A catalog with no rules. Scoring proceeds with base and streak only.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog, validating every rule.
    ///
    /// # Errors
    /// Returns the first invalid rule's error.
    pub fn from_rules(rules: impl IntoIterator<Item = MilestoneRule>) -> Result<Self, ValidationError> {
        let mut by_threshold: BTreeMap<u32, Vec<MilestoneRule>> = BTreeMap::new();
        for rule in rules {
            rule.validate()?;
            let threshold = u32::try_from(rule.threshold_days).map_err(|_| {
                ValidationError::InvalidMilestone {
                    name: rule.name.clone(),
                    message: "threshold_days is out of range".into(),
                }
            })?;
            by_threshold.entry(threshold).or_default().push(rule);
        }
        Ok(Self { by_threshold })
    }

    /// Default catalog written by `config init`.
    pub fn builtin() -> Self {
        let rules = vec![
            MilestoneRule::new("坚持三天", 3, 2),
            MilestoneRule::new("坚持一周", 7, 5),
            MilestoneRule::new("坚持一个月", 30, 20),
            MilestoneRule::new("百日记账", 100, 50),
        ];
        Self::from_rules(rules).unwrap_or_else(|e| {
            tracing::error!(error = %e, "built-in milestone catalog is invalid");
            Self::empty()
        })
    }

    /// Rules whose threshold equals `streak` exactly.
    pub fn matching(&self, streak: u32) -> &[MilestoneRule] {
        self.by_threshold
            .get(&streak)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All rules ordered by threshold.
    pub fn rules(&self) -> impl Iterator<Item = &MilestoneRule> {
        self.by_threshold.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_threshold.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_threshold.is_empty()
    }

    /// Parse a catalog from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML or a rule is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(Self::from_rules(file.milestone)?)
    }

    /// Load a catalog file.
    ///
    /// A missing file is not an error: it means no bonuses are available.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let catalog = Self::from_toml_str(&content)?;
                tracing::debug!(path = %path.display(), rules = catalog.len(), "loaded milestone catalog");
                Ok(catalog)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "milestone catalog not found, no bonuses available");
                Ok(Self::empty())
            }
            Err(e) => Err(CoreError::Config(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })),
        }
    }

    /// Write the catalog as TOML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = CatalogFile {
            milestone: self.rules().cloned().collect(),
        };
        let save_failed = |message: String| {
            CoreError::Config(ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message,
            })
        };
        let content = toml::to_string_pretty(&file).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }
}
