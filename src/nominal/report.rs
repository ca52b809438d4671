//! Text report of nominal and derived values.

use std::fmt;

use serde::Serialize;

/// Number of decimal places used for every value in a report.
pub const DECIMAL_PLACES: usize = 3;

/// Header line opening every report.
pub const REPORT_HEADER: &str = "Summary:";

/// Value part of a report line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LineValue {
    /// A measurement and the unit label printed after it.
    Measure { value: f64, unit: &'static str },
    /// Free text, printed as given.
    Text(String),
}

/// A single `Label: value unit` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub label: String,
    pub value: LineValue,
}

impl ReportLine {
    /// Creates a measurement line.
    #[must_use]
    pub fn measure(label: impl Into<String>, value: f64, unit: &'static str) -> Self {
        Self {
            label: label.into(),
            value: LineValue::Measure { value, unit },
        }
    }

    /// Creates a passthrough text line.
    #[must_use]
    pub fn text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: LineValue::Text(text.into()),
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LineValue::Measure { value, unit } => {
                write!(f, "{}: {} {unit}", self.label, format_value(*value))
            }
            LineValue::Text(text) => write!(f, "{}: {text}", self.label),
        }
    }
}

/// Ordered report lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Appends a line.
    pub fn push(&mut self, line: ReportLine) {
        self.lines.push(line);
    }

    /// Finds the first line with the given label.
    #[must_use]
    pub fn line(&self, label: &str) -> Option<&ReportLine> {
        self.lines.iter().find(|l| l.label == label)
    }

    /// Renders the report, header first, every line newline-terminated.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{REPORT_HEADER}")?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Formats a value with [`DECIMAL_PLACES`] decimals.
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{value:.DECIMAL_PLACES$}")
}

/// Rounds a value to [`DECIMAL_PLACES`] decimals.
#[must_use]
pub fn round_value(value: f64) -> f64 {
    // Round-trip through the formatted text so the number matches the report
    format_value(value).parse().unwrap_or(value)
}
