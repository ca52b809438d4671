//! Tolerance ranges and nominal value resolution.

use serde::{Deserialize, Deserializer, Serialize};

use crate::nominal::options::Unit;

/// Per-field error recorded while resolving a tolerance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldError {
    /// The min or max text is not a finite decimal number.
    InvalidNumber,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber => write!(f, "invalid number"),
        }
    }
}

/// Raw min/max text for one dimension.
///
/// Either side may be left empty. When deserialising, JSON numbers are
/// accepted as well as strings and kept in their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceRange {
    /// Minimum value text.
    #[serde(default, deserialize_with = "raw_text")]
    pub min: Option<String>,
    /// Maximum value text.
    #[serde(default, deserialize_with = "raw_text")]
    pub max: Option<String>,
}

/// Outcome of resolving a [`ToleranceRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Both sides are empty.
    Empty,
    /// Nominal value in millimetres, at full precision.
    Nominal(f64),
    /// One side failed to parse.
    Invalid(FieldError),
}

impl ToleranceRange {
    /// Creates a range from min and max text.
    #[must_use]
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// Creates a range where min and max are the same value.
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            min: Some(value.clone()),
            max: Some(value),
        }
    }

    /// Resolves the range to a nominal value in millimetres.
    ///
    /// An empty side takes the value of the other side. The nominal is the
    /// mean of min and max after conversion from `unit`.
    #[must_use]
    pub fn resolve(&self, unit: Unit) -> Resolution {
        let min = self.min.as_deref().map_or("", str::trim);
        let max = self.max.as_deref().map_or("", str::trim);

        let (min, max) = match (min.is_empty(), max.is_empty()) {
            (true, true) => return Resolution::Empty,
            (true, false) => (max, max),
            (false, true) => (min, min),
            (false, false) => (min, max),
        };

        let (Some(min), Some(max)) = (parse_decimal(min), parse_decimal(max)) else {
            return Resolution::Invalid(FieldError::InvalidNumber);
        };

        let (min, max) = (unit.to_mm(min), unit.to_mm(max));
        if !(min.is_finite() && max.is_finite()) {
            return Resolution::Invalid(FieldError::InvalidNumber);
        }
        Resolution::Nominal(midpoint(min, max))
    }
}

/// Arithmetic mean of a min/max pair.
///
/// Halves before adding so two finite values never overflow.
#[must_use]
pub fn midpoint(min: f64, max: f64) -> f64 {
    min / 2.0 + max / 2.0
}

/// Parses trimmed text as a finite decimal number.
///
/// `inf` and `NaN` are rejected.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts either a JSON string or a JSON number for a raw value.
fn raw_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
