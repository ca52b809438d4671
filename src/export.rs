//! Appending calculation summaries to a text file.
//!
//! Each export writes the reference designator on its own line followed by
//! the report text. Files are only ever appended to, and are created on
//! first use.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::nominal::Report;

/// Appends `report` to the file at `path`, preceded by `ref_des`.
///
/// # Errors
///
/// Returns [`ExportError::TargetUnavailable`] if the file (or its
/// directory) has disappeared, [`ExportError::EmptyReferenceDesignator`]
/// for a blank designator, and [`ExportError::Write`] for other I/O
/// failures.
pub fn append_summary(path: &Path, ref_des: &str, report: &Report) -> Result<(), ExportError> {
    let ref_des = ref_des.trim();
    if ref_des.is_empty() {
        return Err(ExportError::EmptyReferenceDesignator);
    }

    let entry = format!("{ref_des}\n{}\n", report.to_text());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| map_io_error(path, e))?;

    file.write_all(entry.as_bytes())
        .map_err(|e| map_io_error(path, e))?;

    tracing::info!(path = %path.display(), ref_des, "Summary exported");
    Ok(())
}

fn map_io_error(path: &Path, error: io::Error) -> ExportError {
    if error.kind() == io::ErrorKind::NotFound {
        ExportError::TargetUnavailable {
            path: path.to_path_buf(),
        }
    } else {
        ExportError::Write {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

/// Remembers the selected export file between exports.
///
/// When the file turns out to be unavailable the selection is dropped, so
/// the next export asks for a new one.
#[derive(Debug, Default)]
pub struct ExportSession {
    target: Option<PathBuf>,
}

impl ExportSession {
    /// Creates a session with an optional initial target.
    #[must_use]
    pub const fn new(target: Option<PathBuf>) -> Self {
        Self { target }
    }

    /// Selects the file subsequent exports append to.
    pub fn select(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::debug!(path = %path.display(), "Export target selected");
        self.target = Some(path);
    }

    /// Returns the selected file, if any.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Forgets the selected file.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// Appends `report` to the selected file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoTarget`] if nothing is selected. On
    /// [`ExportError::TargetUnavailable`] the selection is cleared.
    pub fn export(&mut self, ref_des: &str, report: &Report) -> Result<(), ExportError> {
        let path = self.target.as_deref().ok_or(ExportError::NoTarget)?;

        let result = append_summary(path, ref_des, report);
        if let Err(ExportError::TargetUnavailable { path }) = &result {
            tracing::warn!(path = %path.display(), "Export target unavailable, clearing selection");
            self.target = None;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nominal::ReportLine;

    fn sample_report() -> Report {
        let mut report = Report::default();
        report.push(ReportLine::measure("Package Width", 3.9, "mm"));
        report
    }

    #[test]
    fn session_without_target() {
        let mut session = ExportSession::default();
        let err = session.export("U1", &sample_report()).unwrap_err();
        assert!(matches!(err, ExportError::NoTarget));
    }

    #[test]
    fn blank_reference_designator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");

        let err = append_summary(&path, "   ", &sample_report()).unwrap_err();
        assert!(matches!(err, ExportError::EmptyReferenceDesignator));
        assert!(!path.exists());
    }

    #[test]
    fn session_select_and_clear() {
        let mut session = ExportSession::new(None);
        session.select("/tmp/summary.txt");
        assert_eq!(session.target(), Some(Path::new("/tmp/summary.txt")));
        session.clear();
        assert!(session.target().is_none());
    }
}
