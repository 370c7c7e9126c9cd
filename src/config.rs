//! Configuration for vahan_report.
//!
//! [`Config::load`] reads a TOML file; any key it leaves out falls back to
//! the embedded defaults. [`Config::defaults`] returns those defaults
//! without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[data]
dir          = "."
file_pattern = "vahan_data_{year}.csv"
years        = [2021, 2022, 2023, 2024]

[reports]
top_manufacturers = 10
top_growth        = 5
top_share         = 5
preview_rows      = 10

[export]
dir         = "."
file_prefix = "vahan_vehicle_analysis"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[data]`: where the yearly source files live.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    /// File name with a `{year}` placeholder.
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_years")]
    pub years: Vec<i32>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_pattern() -> String {
    "vahan_data_{year}.csv".to_string()
}

fn default_years() -> Vec<i32> {
    vec![2021, 2022, 2023, 2024]
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            file_pattern: default_file_pattern(),
            years: default_years(),
        }
    }
}

/// `[reports]`: table sizes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_top_manufacturers")]
    pub top_manufacturers: usize,
    #[serde(default = "default_top_growth")]
    pub top_growth: usize,
    #[serde(default = "default_top_share")]
    pub top_share: usize,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_top_manufacturers() -> usize {
    10
}

fn default_top_growth() -> usize {
    5
}

fn default_top_share() -> usize {
    5
}

fn default_preview_rows() -> usize {
    10
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            top_manufacturers: default_top_manufacturers(),
            top_growth: default_top_growth(),
            top_share: default_top_share(),
            preview_rows: default_preview_rows(),
        }
    }
}

/// `[export]`: where CSV/JSON outputs go.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "vahan_vehicle_analysis".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// The embedded defaults.
    pub fn defaults() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| Config {
            data: DataConfig::default(),
            reports: ReportsConfig::default(),
            export: ExportConfig::default(),
        })
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.data.file_pattern.contains("{year}") {
            return Err(ReportError::Config(format!(
                "data.file_pattern '{}' has no {{year}} placeholder",
                self.data.file_pattern
            )));
        }
        if self.data.years.is_empty() {
            return Err(ReportError::Config("data.years is empty".to_string()));
        }
        Ok(())
    }
}
