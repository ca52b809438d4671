//! Calculation options: input unit, lead height ratio, part type mode and
//! the feature switches that gate derived values.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Unit the raw tolerance values are entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Unit {
    /// Millimetres (no conversion).
    #[default]
    Millimetres,
    /// Inches, converted to millimetres before averaging.
    Inches,
}

impl Unit {
    /// Parses a unit from a string.
    ///
    /// Accepts: "mm", "millimetres", "millimeters", "in", "inch", "inches"
    /// (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimetres" | "millimeters" => Some(Self::Millimetres),
            "in" | "inch" | "inches" => Some(Self::Inches),
            _ => None,
        }
    }

    /// Returns the label printed after nominal values in a report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Millimetres => "mm",
            Self::Inches => "inches",
        }
    }

    /// Converts a value in this unit to millimetres.
    #[must_use]
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Self::Millimetres => value,
            Self::Inches => value * MM_PER_INCH,
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_loose(&value)
            .ok_or_else(|| format!("invalid unit '{value}', expected \"mm\" or \"inches\""))
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proportion of package thickness used when lead height is not measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum LeadHeightRatio {
    /// One half of the package thickness.
    #[default]
    Half,
    /// Two thirds of the package thickness.
    TwoThirds,
}

impl LeadHeightRatio {
    /// Parses a ratio from "1/2" or "2/3" (surrounding whitespace ignored).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim() {
            "1/2" | "0.5" | "half" => Some(Self::Half),
            "2/3" | "two-thirds" => Some(Self::TwoThirds),
            _ => None,
        }
    }

    /// Returns the fractional value of the ratio.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::TwoThirds => 2.0 / 3.0,
        }
    }

    /// Returns the textual form, "1/2" or "2/3".
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Half => "1/2",
            Self::TwoThirds => "2/3",
        }
    }
}

impl TryFrom<String> for LeadHeightRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_loose(&value).ok_or_else(|| {
            format!("invalid lead height ratio '{value}', expected \"1/2\" or \"2/3\"")
        })
    }
}

impl Serialize for LeadHeightRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for LeadHeightRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How die dimensions are derived from the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum PartTypeMode {
    /// Half the package width by half the package length.
    #[default]
    Standard,
    /// Square die, half the package width on each side.
    Diode,
    /// Die sized from the lead frame flag, less a fixed clearance.
    Flag,
}

impl PartTypeMode {
    /// Parses a mode from a string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "diode" => Some(Self::Diode),
            "flag" => Some(Self::Flag),
            _ => None,
        }
    }

    /// Parses a mode, resolving anything unrecognised to [`Self::Standard`].
    #[must_use]
    pub fn from_str_or_standard(s: &str) -> Self {
        Self::from_str_loose(s).unwrap_or_else(|| {
            tracing::debug!(mode = s, "Unrecognised part type mode, using Standard");
            Self::Standard
        })
    }

    /// Returns the display name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Diode => "Diode",
            Self::Flag => "Flag",
        }
    }
}

impl From<String> for PartTypeMode {
    fn from(value: String) -> Self {
        Self::from_str_or_standard(&value)
    }
}

impl Serialize for PartTypeMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PartTypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    /// Unit the tolerance ranges are entered in.
    pub unit: Unit,
    /// Derive standoff-adjusted thickness and lead height.
    pub include_standoff_in_thickness: bool,
    /// Ratio used when lead height has to be estimated.
    pub lead_height_ratio: LeadHeightRatio,
    /// Derive die width and length.
    pub include_die_calculation: bool,
    /// Die derivation mode.
    pub part_type_mode: PartTypeMode,
    /// Split package thickness into BGA overmold and laminate.
    pub bga_mode: bool,
    /// Raw flag length in mm, read only in [`PartTypeMode::Flag`].
    pub flag_length: Option<String>,
    /// Raw flag width in mm, read only in [`PartTypeMode::Flag`].
    pub flag_width: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            unit: Unit::Millimetres,
            include_standoff_in_thickness: true,
            lead_height_ratio: LeadHeightRatio::Half,
            include_die_calculation: false,
            part_type_mode: PartTypeMode::Standard,
            bga_mode: false,
            flag_length: None,
            flag_width: None,
        }
    }
}

/// A partial set of options, layered over a base [`Options`].
///
/// Used for input files, tool arguments and command-line flags, where any
/// key left out keeps the configured default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionOverrides {
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub include_standoff_in_thickness: Option<bool>,
    #[serde(default)]
    pub lead_height_ratio: Option<LeadHeightRatio>,
    #[serde(default)]
    pub include_die_calculation: Option<bool>,
    #[serde(default)]
    pub part_type_mode: Option<PartTypeMode>,
    #[serde(default)]
    pub bga_mode: Option<bool>,
    #[serde(default)]
    pub flag_length: Option<String>,
    #[serde(default)]
    pub flag_width: Option<String>,
}

impl OptionOverrides {
    /// Applies these overrides on top of `base`.
    #[must_use]
    pub fn apply(self, base: Options) -> Options {
        Options {
            unit: self.unit.unwrap_or(base.unit),
            include_standoff_in_thickness: self
                .include_standoff_in_thickness
                .unwrap_or(base.include_standoff_in_thickness),
            lead_height_ratio: self.lead_height_ratio.unwrap_or(base.lead_height_ratio),
            include_die_calculation: self
                .include_die_calculation
                .unwrap_or(base.include_die_calculation),
            part_type_mode: self.part_type_mode.unwrap_or(base.part_type_mode),
            bga_mode: self.bga_mode.unwrap_or(base.bga_mode),
            flag_length: self.flag_length.or(base.flag_length),
            flag_width: self.flag_width.or(base.flag_width),
        }
    }

    /// Merges `other` into these overrides, `other` taking precedence.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            unit: other.unit.or(self.unit),
            include_standoff_in_thickness: other
                .include_standoff_in_thickness
                .or(self.include_standoff_in_thickness),
            lead_height_ratio: other.lead_height_ratio.or(self.lead_height_ratio),
            include_die_calculation: other
                .include_die_calculation
                .or(self.include_die_calculation),
            part_type_mode: other.part_type_mode.or(self.part_type_mode),
            bga_mode: other.bga_mode.or(self.bga_mode),
            flag_length: other.flag_length.or(self.flag_length),
            flag_width: other.flag_width.or(self.flag_width),
        }
    }
}
