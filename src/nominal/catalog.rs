//! Fixed catalogues: package dimensions, part type codes and mount styles.
//!
//! The dimension order here is the order nominal lines appear in a report.
//! It has no effect on any computed value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A named physical dimension of a component package.
///
/// Serialised using its canonical label (e.g. `"Package Thickness"`).
/// Deserialisation goes through [`Dimension::from_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dimension {
    /// Toe-to-toe width including leads.
    #[serde(rename = "Overall Width")]
    OverallWidth,
    /// Body length.
    #[serde(rename = "Package Length")]
    PackageLength,
    /// Body width, excluding leads.
    #[serde(rename = "Package Width")]
    PackageWidth,
    /// Body height above the seating plane.
    #[serde(rename = "Package Thickness")]
    PackageThickness,
    #[serde(rename = "Pad Length")]
    PadLength,
    #[serde(rename = "Pad Width")]
    PadWidth,
    #[serde(rename = "Pad Pitch")]
    PadPitch,
    /// Height of the lead above the seating plane.
    #[serde(rename = "Lead Height")]
    LeadHeight,
    #[serde(rename = "Lead Width")]
    LeadWidth,
    /// Lead material thickness.
    #[serde(rename = "Lead Thickness")]
    LeadThickness,
    /// Length of the lead foot in contact with the land.
    #[serde(rename = "Lead Foot Length")]
    LeadFootLength,
    #[serde(rename = "Lead Pitch")]
    LeadPitch,
    #[serde(rename = "Lead Shoulder")]
    LeadShoulder,
    /// Gap between the seating plane and the package underside.
    #[serde(rename = "Lead Standoff")]
    LeadStandoff,
    #[serde(rename = "Sink Length")]
    SinkLength,
    #[serde(rename = "Sink Width")]
    SinkWidth,
    #[serde(rename = "Sink Thickness")]
    SinkThickness,
    #[serde(rename = "Die Length")]
    DieLength,
    #[serde(rename = "Die Width")]
    DieWidth,
    #[serde(rename = "Die Thickness")]
    DieThickness,
    #[serde(rename = "Flag Length")]
    FlagLength,
    #[serde(rename = "Flag Width")]
    FlagWidth,
    #[serde(rename = "Flag Thickness")]
    FlagThickness,
}

impl Dimension {
    /// Every dimension, in report order.
    pub const ALL: [Self; 23] = [
        Self::OverallWidth,
        Self::PackageLength,
        Self::PackageWidth,
        Self::PackageThickness,
        Self::PadLength,
        Self::PadWidth,
        Self::PadPitch,
        Self::LeadHeight,
        Self::LeadWidth,
        Self::LeadThickness,
        Self::LeadFootLength,
        Self::LeadPitch,
        Self::LeadShoulder,
        Self::LeadStandoff,
        Self::SinkLength,
        Self::SinkWidth,
        Self::SinkThickness,
        Self::DieLength,
        Self::DieWidth,
        Self::DieThickness,
        Self::FlagLength,
        Self::FlagWidth,
        Self::FlagThickness,
    ];

    /// Returns the canonical label used in reports and on the wire.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OverallWidth => "Overall Width",
            Self::PackageLength => "Package Length",
            Self::PackageWidth => "Package Width",
            Self::PackageThickness => "Package Thickness",
            Self::PadLength => "Pad Length",
            Self::PadWidth => "Pad Width",
            Self::PadPitch => "Pad Pitch",
            Self::LeadHeight => "Lead Height",
            Self::LeadWidth => "Lead Width",
            Self::LeadThickness => "Lead Thickness",
            Self::LeadFootLength => "Lead Foot Length",
            Self::LeadPitch => "Lead Pitch",
            Self::LeadShoulder => "Lead Shoulder",
            Self::LeadStandoff => "Lead Standoff",
            Self::SinkLength => "Sink Length",
            Self::SinkWidth => "Sink Width",
            Self::SinkThickness => "Sink Thickness",
            Self::DieLength => "Die Length",
            Self::DieWidth => "Die Width",
            Self::DieThickness => "Die Thickness",
            Self::FlagLength => "Flag Length",
            Self::FlagWidth => "Flag Width",
            Self::FlagThickness => "Flag Thickness",
        }
    }

    /// Looks up a dimension by label.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(label))
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::from_label(&label).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown dimension '{}'", label.trim()))
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Part type codes offered to the user.
///
/// Reports carry the part type as free text; this list is advisory.
pub const PART_TYPES: &[&str] = &[
    "AVX", "AXIAL", "BGA", "BOX", "BTC", "CBEND", "CBGA", "CDIP", "CC", "CGA", "CQFP", "DFN",
    "DIE", "DIP", "DISC", "DPAK", "HSOP", "KEMET", "LCCC", "LSOP", "MELF", "MSOP", "OTHER",
    "PDIP", "PDSO", "PLCC", "PQFP", "QFJ", "QFN", "QFP", "RADIAL", "SIP", "SM", "SOD", "SOIC",
    "SOJ", "SON", "SOT", "SPAK", "SSOP", "TO", "TSOP", "TSSOP", "USON", "VCHIP",
];

/// Package mount styles: surface mount and through hole.
pub const PACKAGE_MOUNTS: &[&str] = &["SMT", "TH"];

/// Returns `true` if `code` is one of [`PART_TYPES`] (case-insensitive).
#[must_use]
pub fn is_known_part_type(code: &str) -> bool {
    let code = code.trim();
    PART_TYPES.iter().any(|p| p.eq_ignore_ascii_case(code))
}

/// Returns `true` if `mount` is one of [`PACKAGE_MOUNTS`] (case-insensitive).
#[must_use]
pub fn is_known_package_mount(mount: &str) -> bool {
    let mount = mount.trim();
    PACKAGE_MOUNTS.iter().any(|m| m.eq_ignore_ascii_case(mount))
}
