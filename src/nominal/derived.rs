//! Derived secondary dimensions.
//!
//! Each rule reads nominal values (millimetres) and returns `None` when a
//! prerequisite is missing. A skipped rule is not an error.

use indexmap::IndexMap;
use serde::Serialize;

use crate::nominal::catalog::Dimension;
use crate::nominal::options::{Options, PartTypeMode};
use crate::nominal::range::parse_decimal;

/// Share of BGA package thickness taken by the overmold.
pub const BGA_OVERMOLD_RATIO: f64 = 0.67;

/// Share of BGA package thickness taken by the laminate substrate.
pub const BGA_LAMINATE_RATIO: f64 = 0.33;

/// Clearance subtracted from each flag dimension to size the die (mm).
pub const FLAG_DIE_CLEARANCE: f64 = 0.1;

/// Nominal values keyed by dimension, in millimetres.
pub type Nominals = IndexMap<Dimension, f64>;

/// A named derived quantity, always in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedValue {
    /// Report label.
    pub label: &'static str,
    /// Value in millimetres.
    pub value: f64,
}

impl DerivedValue {
    /// Unit every derived value is reported in.
    pub const UNIT: &'static str = "mm";

    const fn new(label: &'static str, value: f64) -> Self {
        Self { label, value }
    }
}

/// BGA overmold/laminate split of the package thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgaStack {
    pub overmold: f64,
    pub laminate: f64,
}

impl BgaStack {
    /// Splits a positive package thickness.
    #[must_use]
    pub fn split(thickness: f64) -> Option<Self> {
        (thickness > 0.0).then(|| Self {
            overmold: thickness * BGA_OVERMOLD_RATIO,
            laminate: thickness * BGA_LAMINATE_RATIO,
        })
    }

    fn values(self) -> [DerivedValue; 2] {
        [
            DerivedValue::new("BGA Overmold Thickness", self.overmold),
            DerivedValue::new("BGA Laminate Thickness", self.laminate),
        ]
    }
}

/// Package thickness above the standoff, and the lead height at half the
/// lead thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandoffAdjustment {
    pub thickness_minus_standoff: f64,
    pub adjusted_lead_height: f64,
}

impl StandoffAdjustment {
    /// Computes the adjustment from nominal values.
    ///
    /// Requires package thickness and lead standoff. A missing lead
    /// thickness counts as zero. When lead height is not given it is
    /// estimated from the package thickness and `options.lead_height_ratio`.
    #[must_use]
    pub fn from_nominals(nominals: &Nominals, options: &Options) -> Option<Self> {
        let thickness = *nominals.get(&Dimension::PackageThickness)?;
        let standoff = *nominals.get(&Dimension::LeadStandoff)?;
        let half_lead = nominals
            .get(&Dimension::LeadThickness)
            .copied()
            .unwrap_or(0.0)
            / 2.0;

        let adjusted_lead_height = nominals.get(&Dimension::LeadHeight).map_or_else(
            || thickness.mul_add(options.lead_height_ratio.factor(), standoff) - half_lead,
            |lead_height| lead_height - half_lead,
        );

        Some(Self {
            thickness_minus_standoff: thickness - standoff,
            adjusted_lead_height,
        })
    }

    fn values(self) -> [DerivedValue; 2] {
        [
            DerivedValue::new("Thickness Minus Standoff", self.thickness_minus_standoff),
            DerivedValue::new("Adjusted Lead Height", self.adjusted_lead_height),
        ]
    }
}

/// Estimated die size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DieGeometry {
    pub width: f64,
    pub length: f64,
}

impl DieGeometry {
    /// Estimates the die from the package outline, or from the flag size in
    /// [`PartTypeMode::Flag`].
    ///
    /// Requires package width. Package length defaults to the width. Flag
    /// text that does not parse gives a zero-sized die.
    #[must_use]
    pub fn from_nominals(nominals: &Nominals, options: &Options) -> Option<Self> {
        let width = *nominals.get(&Dimension::PackageWidth)?;
        let length = nominals
            .get(&Dimension::PackageLength)
            .copied()
            .unwrap_or(width);

        let die = match options.part_type_mode {
            PartTypeMode::Diode => Self {
                width: width / 2.0,
                length: width / 2.0,
            },
            PartTypeMode::Flag => Self::from_flag(
                options.flag_length.as_deref(),
                options.flag_width.as_deref(),
            ),
            PartTypeMode::Standard => Self {
                width: width / 2.0,
                length: length / 2.0,
            },
        };
        Some(die)
    }

    fn from_flag(flag_length: Option<&str>, flag_width: Option<&str>) -> Self {
        let parsed = flag_length
            .and_then(parse_decimal)
            .zip(flag_width.and_then(parse_decimal));

        match parsed {
            Some((length, width)) => Self {
                width: width - FLAG_DIE_CLEARANCE,
                length: length - FLAG_DIE_CLEARANCE,
            },
            None => {
                tracing::debug!(
                    flag_length,
                    flag_width,
                    "Flag dimensions did not parse, die set to zero"
                );
                Self {
                    width: 0.0,
                    length: 0.0,
                }
            }
        }
    }

    fn values(self) -> [DerivedValue; 2] {
        [
            DerivedValue::new("Die Width", self.width),
            DerivedValue::new("Die Length", self.length),
        ]
    }
}

/// Exposed lead shoulder between the package body and the lead foot.
#[must_use]
pub fn lead_shoulder_width(nominals: &Nominals) -> Option<f64> {
    let overall = *nominals.get(&Dimension::OverallWidth)?;
    let package = *nominals.get(&Dimension::PackageWidth)?;
    let foot = *nominals.get(&Dimension::LeadFootLength)?;
    Some((overall - package) / 2.0 - foot)
}

/// Runs every derived rule in report order.
#[must_use]
pub fn derive_all(nominals: &Nominals, options: &Options) -> Vec<DerivedValue> {
    let mut derived = Vec::new();

    if options.bga_mode {
        let thickness = nominals
            .get(&Dimension::PackageThickness)
            .copied()
            .unwrap_or(0.0);
        match BgaStack::split(thickness) {
            Some(stack) => derived.extend(stack.values()),
            None => tracing::debug!("BGA split skipped: no positive package thickness"),
        }
    }

    if options.include_standoff_in_thickness {
        match StandoffAdjustment::from_nominals(nominals, options) {
            Some(adjustment) => derived.extend(adjustment.values()),
            None => tracing::debug!("Standoff adjustment skipped: thickness or standoff missing"),
        }
    }

    if options.include_die_calculation {
        match DieGeometry::from_nominals(nominals, options) {
            Some(die) => derived.extend(die.values()),
            None => tracing::debug!("Die calculation skipped: package width missing"),
        }
    }

    if let Some(shoulder) = lead_shoulder_width(nominals) {
        derived.push(DerivedValue::new("Lead Shoulder Width", shoulder));
    }

    derived
}
