//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::nominal::{LeadHeightRatio, Options, PartTypeMode, Unit};

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Default calculation options.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Summary export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Directories the MCP server may write summaries into.
    #[serde(default)]
    pub allowed_paths: Vec<PathBuf>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.defaults;

        if Unit::from_str_loose(&defaults.unit).is_none() {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid unit '{}'. Must be one of: mm, inches",
                    defaults.unit
                ),
            });
        }

        if LeadHeightRatio::from_str_loose(&defaults.lead_height_ratio).is_none() {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid lead height ratio '{}'. Must be one of: 1/2, 2/3",
                    defaults.lead_height_ratio
                ),
            });
        }

        if PartTypeMode::from_str_loose(&defaults.part_type_mode).is_none() {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid part type mode '{}'. Must be one of: Standard, Diode, Flag",
                    defaults.part_type_mode
                ),
            });
        }

        Ok(())
    }
}

/// Default option values applied when an input leaves an option out.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Input unit: "mm" or "inches".
    /// Default: "mm"
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Derive standoff-adjusted thickness and lead height.
    #[serde(default = "default_true")]
    pub include_standoff_in_thickness: bool,

    /// Lead height ratio: "1/2" or "2/3".
    #[serde(default = "default_lead_height_ratio")]
    pub lead_height_ratio: String,

    /// Derive die width and length.
    #[serde(default)]
    pub include_die_calculation: bool,

    /// Die mode: "Standard", "Diode" or "Flag".
    #[serde(default = "default_part_type_mode")]
    pub part_type_mode: String,

    /// Split package thickness into BGA overmold and laminate.
    #[serde(default)]
    pub bga_mode: bool,
}

impl DefaultsConfig {
    /// Builds calculation options from these defaults.
    ///
    /// Values that fail to parse fall back to the built-in option defaults;
    /// [`Config::validate`] rejects them up front.
    #[must_use]
    pub fn to_options(&self) -> Options {
        Options {
            unit: Unit::from_str_loose(&self.unit).unwrap_or_default(),
            include_standoff_in_thickness: self.include_standoff_in_thickness,
            lead_height_ratio: LeadHeightRatio::from_str_loose(&self.lead_height_ratio)
                .unwrap_or_default(),
            include_die_calculation: self.include_die_calculation,
            part_type_mode: PartTypeMode::from_str_or_standard(&self.part_type_mode),
            bga_mode: self.bga_mode,
            flag_length: None,
            flag_width: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            include_standoff_in_thickness: default_true(),
            lead_height_ratio: default_lead_height_ratio(),
            include_die_calculation: false,
            part_type_mode: default_part_type_mode(),
            bga_mode: false,
        }
    }
}

fn default_unit() -> String {
    "mm".to_string()
}

fn default_lead_height_ratio() -> String {
    "1/2".to_string()
}

fn default_part_type_mode() -> String {
    "Standard".to_string()
}

const fn default_true() -> bool {
    true
}

/// Summary export configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// File summaries are appended to until another is selected.
    #[serde(default)]
    pub target: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
