//! Configuration system for Perturbench.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/perturbench/config.toml` and/or
//! `.perturbench/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BenchError, Result};

/// Direction in which attributions are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Largest raw attribution first; non-positive attributions are never perturbed.
    Positive,
    /// Smallest raw attribution first; non-negative attributions are never perturbed.
    Negative,
    /// Largest magnitude first; every feature is perturbed.
    Absolute,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Positive => "positive",
            SortOrder::Negative => "negative",
            SortOrder::Absolute => "absolute",
        }
    }

    /// Sign applied to the area under a curve measured with this order.
    pub fn curve_sign(&self) -> f64 {
        match self {
            SortOrder::Negative => -1.0,
            SortOrder::Positive | SortOrder::Absolute => 1.0,
        }
    }

    /// Whether a feature with this attribution is left untouched by the masking loop.
    pub fn skips(&self, attribution: f64) -> bool {
        match self {
            SortOrder::Positive => attribution <= 0.0,
            SortOrder::Negative => attribution >= 0.0,
            SortOrder::Absolute => false,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "positive" => Ok(SortOrder::Positive),
            "negative" => Ok(SortOrder::Negative),
            "absolute" => Ok(SortOrder::Absolute),
            other => Err(BenchError::invalid_configuration(format!(
                "sort_order must be either \"positive\", \"negative\", or \"absolute\", got \"{other}\""
            ))),
        }
    }
}

/// Whether features are progressively revealed or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationMode {
    /// Start fully masked and reveal features in ranking order.
    Keep,
    /// Start fully visible and hide features in ranking order.
    Remove,
}

impl PerturbationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerturbationMode::Keep => "keep",
            PerturbationMode::Remove => "remove",
        }
    }

    /// Value every mask entry holds before the first ranked feature is processed.
    pub fn initial_mask_value(&self) -> bool {
        matches!(self, PerturbationMode::Remove)
    }

    /// Value a mask entry is driven to once its feature is processed.
    pub fn perturbed_mask_value(&self) -> bool {
        matches!(self, PerturbationMode::Keep)
    }
}

impl fmt::Display for PerturbationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerturbationMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep" => Ok(PerturbationMode::Keep),
            "remove" => Ok(PerturbationMode::Remove),
            other => Err(BenchError::invalid_configuration(format!(
                "perturbation must be either \"keep\" or \"remove\", got \"{other}\""
            ))),
        }
    }
}

/// Chart orientation hint: the y axis is flipped when exactly one of
/// "negative order" and "remove mode" holds.
pub fn invert_display(sort_order: SortOrder, perturbation: PerturbationMode) -> bool {
    (sort_order == SortOrder::Negative) != (perturbation == PerturbationMode::Remove)
}

/// Top-level configuration for a perturbation benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Ranking direction and AUC sign convention.
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    /// Keep (insertion) or remove (deletion) curves.
    #[serde(default = "default_perturbation")]
    pub perturbation: PerturbationMode,
    /// Seconds a scoring pass runs before progress is surfaced.
    #[serde(default = "default_progress_threshold_secs")]
    pub progress_threshold_secs: f64,
    /// Suppress progress reporting entirely.
    #[serde(default)]
    pub silent: bool,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            sort_order: default_sort_order(),
            perturbation: default_perturbation(),
            progress_threshold_secs: default_progress_threshold_secs(),
            silent: false,
        }
    }
}

impl PerturbationConfig {
    pub fn new(sort_order: SortOrder, perturbation: PerturbationMode) -> Self {
        Self {
            sort_order,
            perturbation,
            ..Self::default()
        }
    }

    /// Build a config from the string names used on the command line and in TOML files.
    pub fn from_names(sort_order: &str, perturbation: &str) -> Result<Self> {
        Ok(Self::new(sort_order.parse()?, perturbation.parse()?))
    }

    pub fn invert_display(&self) -> bool {
        invert_display(self.sort_order, self.perturbation)
    }
}

fn default_sort_order() -> SortOrder {
    SortOrder::Absolute
}

fn default_perturbation() -> PerturbationMode {
    PerturbationMode::Keep
}

fn default_progress_threshold_secs() -> f64 {
    5.0
}

/// Explicit overrides, typically from CLI flags. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perturbation: Option<PerturbationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_threshold_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `PERTURBENCH_`)
/// 3. Workspace-local config (`.perturbench/config.toml`)
/// 4. User config (`~/.config/perturbench/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<PerturbationConfig> {
    let mut figment = Figment::from(Serialized::defaults(PerturbationConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "perturbench", "perturbench") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // PERTURBENCH_SORT_ORDER, PERTURBENCH_PERTURBATION, ...
    figment = figment.merge(Env::prefixed("PERTURBENCH_"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    extract(figment)
}

/// Load a single TOML file layered over the built-in defaults.
pub fn load_config_file(path: &Path) -> Result<PerturbationConfig> {
    if !path.exists() {
        return Err(BenchError::invalid_configuration(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let figment = Figment::from(Serialized::defaults(PerturbationConfig::default()))
        .merge(Toml::file(path));
    extract(figment)
}

/// Location of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> std::path::PathBuf {
    workspace.join(".perturbench").join("config.toml")
}

fn extract(figment: Figment) -> Result<PerturbationConfig> {
    let config: PerturbationConfig = figment
        .extract()
        .map_err(|e| BenchError::invalid_configuration(e.to_string()))?;
    if !config.progress_threshold_secs.is_finite() || config.progress_threshold_secs < 0.0 {
        return Err(BenchError::invalid_configuration(format!(
            "progress_threshold_secs must be a non-negative number, got {}",
            config.progress_threshold_secs
        )));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("positive".parse::<SortOrder>().unwrap(), SortOrder::Positive);
        assert_eq!("negative".parse::<SortOrder>().unwrap(), SortOrder::Negative);
        assert_eq!("absolute".parse::<SortOrder>().unwrap(), SortOrder::Absolute);
        let err = "descending".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("descending"));
    }

    #[test]
    fn test_perturbation_parse() {
        assert_eq!("keep".parse::<PerturbationMode>().unwrap(), PerturbationMode::Keep);
        assert_eq!("remove".parse::<PerturbationMode>().unwrap(), PerturbationMode::Remove);
        assert!(matches!(
            "Keep".parse::<PerturbationMode>(),
            Err(BenchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_mask_values() {
        assert!(!PerturbationMode::Keep.initial_mask_value());
        assert!(PerturbationMode::Keep.perturbed_mask_value());
        assert!(PerturbationMode::Remove.initial_mask_value());
        assert!(!PerturbationMode::Remove.perturbed_mask_value());
    }

    #[test]
    fn test_skip_rule() {
        assert!(SortOrder::Positive.skips(0.0));
        assert!(SortOrder::Positive.skips(-1.0));
        assert!(!SortOrder::Positive.skips(0.1));
        assert!(SortOrder::Negative.skips(0.0));
        assert!(!SortOrder::Negative.skips(-0.1));
        assert!(!SortOrder::Absolute.skips(0.0));
    }

    #[test]
    fn test_invert_display_table() {
        use PerturbationMode::*;
        use SortOrder::*;
        assert!(!invert_display(Negative, Remove));
        assert!(invert_display(Negative, Keep));
        assert!(invert_display(Positive, Remove));
        assert!(!invert_display(Absolute, Keep));
    }

    #[test]
    fn test_default_config() {
        let config = PerturbationConfig::default();
        assert_eq!(config.sort_order, SortOrder::Absolute);
        assert_eq!(config.perturbation, PerturbationMode::Keep);
        assert_eq!(config.progress_threshold_secs, 5.0);
        assert!(!config.silent);
    }

    #[test]
    fn test_load_workspace_config() {
        let dir = TempDir::new().unwrap();
        let path = workspace_config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "sort_order = \"negative\"\nperturbation = \"remove\"\n").unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.sort_order, SortOrder::Negative);
        assert_eq!(config.perturbation, PerturbationMode::Remove);
        assert_eq!(config.progress_threshold_secs, 5.0);
    }

    #[test]
    fn test_overrides_win() {
        let dir = TempDir::new().unwrap();
        let path = workspace_config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "sort_order = \"negative\"\n").unwrap();

        let overrides = ConfigOverrides {
            sort_order: Some(SortOrder::Positive),
            silent: Some(true),
            ..Default::default()
        };
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.sort_order, SortOrder::Positive);
        assert!(config.silent);
    }

    #[test]
    fn test_invalid_sort_order_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "sort_order = \"sideways\"\n").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "progress_threshold_secs = -1.0\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn test_config_toml_roundtrip_names() {
        let config = PerturbationConfig::from_names("positive", "remove").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"positive\""));
        assert!(json.contains("\"remove\""));
    }
}
