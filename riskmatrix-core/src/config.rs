//! Configuration file support for the risk matrix
//!
//! Loads deployment-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.riskmatrixrc.json` in project root
//! 3. `riskmatrix.config.json` in project root
//! 4. `"riskmatrix"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::combine::{CombineOptions, JoinStrategy, DEFAULT_PLACEHOLDER_NAME};
use crate::labels::LevelLabels;
use crate::matrix::{MATRIX_SIZE, RISK_MATRIX};
use crate::risk::BandThresholds;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_RISK_VALUE: u32 = RISK_MATRIX[MATRIX_SIZE - 1][MATRIX_SIZE - 1];

/// Risk matrix configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskMatrixConfig {
    /// Custom band thresholds
    #[serde(default)]
    pub thresholds: Option<ThresholdConfig>,

    /// Custom level labels
    #[serde(default)]
    pub labels: Option<LabelConfig>,

    /// How residual observations are paired with inherent ones (default: positional)
    #[serde(default)]
    pub join: Option<JoinStrategy>,

    /// Name for inherent observations without a description
    #[serde(default)]
    pub placeholder_name: Option<String>,
}

/// Lowest risk value of each band above Low
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Medium starts at this value (default: 6)
    pub medium: Option<u32>,
    /// High starts at this value (default: 11)
    pub high: Option<u32>,
    /// Critical starts at this value (default: 16)
    pub critical: Option<u32>,
}

/// Labels for each level, lowest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelConfig {
    pub probability: Option<Vec<String>>,
    pub impact: Option<Vec<String>>,
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub thresholds: BandThresholds,
    pub labels: LevelLabels,
    pub join: JoinStrategy,
    pub placeholder_name: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn validate_labels(axis: &str, labels: &Option<Vec<String>>) -> Result<()> {
    if let Some(labels) = labels {
        if labels.len() != MATRIX_SIZE {
            anyhow::bail!(
                "labels.{} must have exactly {} entries (got {})",
                axis,
                MATRIX_SIZE,
                labels.len()
            );
        }
        if let Some(position) = labels.iter().position(|l| l.trim().is_empty()) {
            anyhow::bail!("labels.{}[{}] must not be empty", axis, position);
        }
    }
    Ok(())
}

fn to_label_array(labels: &[String]) -> [String; MATRIX_SIZE] {
    std::array::from_fn(|index| labels[index].clone())
}

impl RiskMatrixConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        // Validate thresholds are positive, ordered and reachable
        if let Some(ref t) = self.thresholds {
            let defaults = BandThresholds::default();
            let medium = t.medium.unwrap_or(defaults.medium);
            let high = t.high.unwrap_or(defaults.high);
            let critical = t.critical.unwrap_or(defaults.critical);

            if medium < 2 {
                anyhow::bail!("thresholds.medium must be at least 2 (got {})", medium);
            }
            if medium >= high {
                anyhow::bail!(
                    "thresholds.medium ({}) must be less than thresholds.high ({})",
                    medium,
                    high
                );
            }
            if high >= critical {
                anyhow::bail!(
                    "thresholds.high ({}) must be less than thresholds.critical ({})",
                    high,
                    critical
                );
            }
            if critical > MAX_RISK_VALUE {
                anyhow::bail!(
                    "thresholds.critical must be at most {} (got {})",
                    MAX_RISK_VALUE,
                    critical
                );
            }
        }

        if let Some(ref labels) = self.labels {
            validate_labels("probability", &labels.probability)?;
            validate_labels("impact", &labels.impact)?;
        }

        if let Some(ref name) = self.placeholder_name {
            if name.trim().is_empty() {
                anyhow::bail!("placeholder_name must not be empty");
            }
        }

        Ok(())
    }

    /// Resolve config into the form used by the engine
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let defaults = BandThresholds::default();
        let thresholds = match &self.thresholds {
            Some(t) => BandThresholds {
                medium: t.medium.unwrap_or(defaults.medium),
                high: t.high.unwrap_or(defaults.high),
                critical: t.critical.unwrap_or(defaults.critical),
            },
            None => defaults,
        };

        let mut labels = LevelLabels::default();
        if let Some(ref custom) = self.labels {
            if let Some(ref probability) = custom.probability {
                labels.probability = to_label_array(probability);
            }
            if let Some(ref impact) = custom.impact {
                labels.impact = to_label_array(impact);
            }
        }

        Ok(ResolvedConfig {
            thresholds,
            labels,
            join: self.join.unwrap_or_default(),
            placeholder_name: self
                .placeholder_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_NAME.to_string()),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        RiskMatrixConfig::default().resolve()
    }

    /// Options for a combination pass
    pub fn combine_options(&self) -> CombineOptions {
        CombineOptions {
            strategy: self.join,
            thresholds: self.thresholds,
            labels: self.labels.clone(),
            placeholder_name: self.placeholder_name.clone(),
        }
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.riskmatrixrc.json`
/// 2. `riskmatrix.config.json`
/// 3. `"riskmatrix"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(RiskMatrixConfig, PathBuf)>> {
    // 1. .riskmatrixrc.json
    let rc_path = project_root.join(".riskmatrixrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    // 2. riskmatrix.config.json
    let config_path = project_root.join("riskmatrix.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    // 3. package.json "riskmatrix" key
    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<RiskMatrixConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: RiskMatrixConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load config from the "riskmatrix" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<RiskMatrixConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("riskmatrix") {
        Some(value) => {
            let config: RiskMatrixConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid riskmatrix config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid riskmatrix config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (RiskMatrixConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
