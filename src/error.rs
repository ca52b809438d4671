//! Error types for package-nominal.
//!
//! Calculation itself never fails; malformed tolerance text is reported per
//! field by the [`crate::nominal`] engine. The errors here cover
//! configuration loading and summary export.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while appending a summary to an export file.
///
/// All of these are recoverable: the caller can pick a new target or fix
/// the reference designator and try again.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No export file has been selected yet.
    #[error("no export file selected")]
    NoTarget,

    /// The reference designator is empty.
    #[error("reference designator must not be empty")]
    EmptyReferenceDesignator,

    /// The selected export file is no longer available.
    #[error("the selected file is no longer available: {path}")]
    TargetUnavailable {
        /// The export file that could not be opened.
        path: PathBuf,
    },

    /// Writing to the export file failed.
    #[error("failed to write summary to {path}")]
    Write {
        /// The export file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Returns `true` if a new export target should be selected.
    #[must_use]
    pub const fn needs_new_target(&self) -> bool {
        matches!(self, Self::NoTarget | Self::TargetUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid unit".to_string(),
        };
        assert!(error.to_string().contains("invalid unit"));
    }

    #[test]
    fn export_error_display() {
        let error = ExportError::TargetUnavailable {
            path: PathBuf::from("/gone/summary.txt"),
        };
        assert!(error.to_string().contains("no longer available"));
        assert!(error.needs_new_target());
        assert!(ExportError::NoTarget.needs_new_target());
        assert!(!ExportError::EmptyReferenceDesignator.needs_new_target());
    }
}
