//! Configuration file loading and parsing.
//!
//! dwell reads optional settings from `dwell.toml` (or the file passed with
//! `--config`). If no config file exists, built-in defaults apply. Command-line
//! flags take precedence over the file.
//!
//! ```toml
//! [business_hours]
//! start_hour = 9
//! end_hour = 17
//!
//! [analysis]
//! state_field = "status"
//! basis = "business_hours"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::analyzer::{AnalyzerConfig, TimeBasis};
use crate::clock::{BusinessHoursWindow, DEFAULT_END_HOUR, DEFAULT_START_HOUR};
use crate::errors::{config_not_found, invalid_window};
use crate::extract::DEFAULT_STATE_FIELD;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dwell.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwellConfig {
    /// Business-hours window (optional).
    pub business_hours: Option<BusinessHoursConfig>,
    /// Extraction and reporting settings (optional).
    pub analysis: Option<AnalysisConfig>,
}

/// Business-hours window configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessHoursConfig {
    /// First hour of the working day (default: 9).
    pub start_hour: Option<u32>,
    /// Hour the working day ends (default: 17).
    pub end_hour: Option<u32>,
}

impl BusinessHoursConfig {
    pub fn start_hour(&self) -> u32 {
        self.start_hour.unwrap_or(DEFAULT_START_HOUR)
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour.unwrap_or(DEFAULT_END_HOUR)
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Changelog field carrying state changes (default: "status").
    pub state_field: Option<String>,
    /// Reporting basis: "calendar" or "business_hours" (default: "calendar").
    pub basis: Option<TimeBasis>,
}

impl AnalysisConfig {
    pub fn state_field(&self) -> String {
        self.state_field
            .clone()
            .unwrap_or_else(|| DEFAULT_STATE_FIELD.to_string())
    }

    pub fn basis(&self) -> TimeBasis {
        self.basis.unwrap_or_default()
    }
}

/// Command-line values that override the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub state_field: Option<String>,
    /// `--business-hours` forces the business-hours basis
    pub business_hours: bool,
}

impl DwellConfig {
    /// Load configuration from `path` if it exists.
    ///
    /// Returns the default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration from a path the user named explicitly.
    ///
    /// Unlike [`DwellConfig::load`], a missing file is an error.
    pub fn load_explicit(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(config_not_found(&path.display().to_string()).into());
        }
        Self::load(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the analyzer settings: overrides, then file, then defaults.
    pub fn analyzer_config(&self, overrides: &ConfigOverrides) -> Result<AnalyzerConfig> {
        let hours = self.business_hours.clone().unwrap_or_default();
        let analysis = self.analysis.clone().unwrap_or_default();

        let start_hour = overrides.start_hour.unwrap_or_else(|| hours.start_hour());
        let end_hour = overrides.end_hour.unwrap_or_else(|| hours.end_hour());
        let window = BusinessHoursWindow::new(start_hour, end_hour).map_err(invalid_window)?;

        let basis = if overrides.business_hours {
            TimeBasis::BusinessHours
        } else {
            analysis.basis()
        };

        let state_field = overrides
            .state_field
            .clone()
            .unwrap_or_else(|| analysis.state_field());

        Ok(AnalyzerConfig {
            window,
            basis,
            state_field,
        })
    }
}
