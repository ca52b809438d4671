//! Nominal dimension engine.
//!
//! Turns raw min/max tolerance text for a package into nominal values and a
//! set of derived dimensions (BGA stack split, standoff-adjusted lead height,
//! die size, lead shoulder width).
//!
//! # Calculation
//!
//! 1. Each dimension's range resolves to a nominal: an empty side copies the
//!    other, inch input is converted to millimetres, and the nominal is the
//!    mean of min and max. Text that does not parse is recorded as a
//!    per-field error and the dimension is left out of everything below.
//! 2. Derived rules run in a fixed order, each skipped when a nominal it
//!    needs is absent.
//! 3. The report lists nominals in catalogue order, the part type and mount,
//!    then the derived values.
//!
//! [`compute`] is pure: the same inputs always give the same result.
//!
//! # Example
//!
//! ```
//! use package_nominal::nominal::{compute, Dimension, Inputs, Options, ToleranceRange};
//!
//! let mut inputs = Inputs::default();
//! inputs.set(Dimension::PackageThickness, ToleranceRange::new("0.9", "1.1"));
//! inputs.set(Dimension::LeadStandoff, ToleranceRange::new("0.15", "0.25"));
//!
//! let result = compute(&inputs, &Options::default());
//! assert_eq!(result.display(Dimension::PackageThickness), "1.000");
//! assert!(result.report.to_text().contains("Adjusted Lead Height: 0.700 mm"));
//! ```

pub mod catalog;
pub mod derived;
pub mod options;
pub mod range;
pub mod report;

pub use catalog::{Dimension, PACKAGE_MOUNTS, PART_TYPES};
pub use derived::{DerivedValue, Nominals};
pub use options::{LeadHeightRatio, OptionOverrides, Options, PartTypeMode, Unit};
pub use range::{FieldError, Resolution, ToleranceRange};
pub use report::{Report, ReportLine};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::nominal::report::format_value;

/// Raw inputs for one calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inputs {
    /// Tolerance ranges keyed by dimension. Dimensions not listed are empty.
    #[serde(default)]
    pub dimensions: IndexMap<Dimension, ToleranceRange>,
    /// Part type code, reported as given.
    #[serde(default)]
    pub part_type: String,
    /// Package mount style, reported as given.
    #[serde(default)]
    pub package_mount: String,
}

impl Inputs {
    /// Sets the range for a dimension, replacing any previous one.
    pub fn set(&mut self, dimension: Dimension, range: ToleranceRange) {
        self.dimensions.insert(dimension, range);
    }

    /// Empties every range and both passthrough fields.
    pub fn clear(&mut self) {
        self.dimensions.clear();
        self.part_type.clear();
        self.package_mount.clear();
    }
}

/// Inputs plus option overrides, as read from input files and tool calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalculationRequest {
    #[serde(default)]
    pub dimensions: IndexMap<Dimension, ToleranceRange>,
    #[serde(default)]
    pub part_type: String,
    #[serde(default)]
    pub package_mount: String,
    /// Options to change; the rest come from the defaults passed to
    /// [`Self::into_parts`].
    #[serde(default)]
    pub options: OptionOverrides,
}

impl CalculationRequest {
    /// Splits the request into engine inputs and options layered over
    /// `defaults`.
    #[must_use]
    pub fn into_parts(self, defaults: Options) -> (Inputs, Options) {
        let inputs = Inputs {
            dimensions: self.dimensions,
            part_type: self.part_type,
            package_mount: self.package_mount,
        };
        (inputs, self.options.apply(defaults))
    }

    /// Logs part type and mount codes missing from the catalogue. They are
    /// still reported as given.
    pub fn warn_unknown_codes(&self) {
        let part_type = self.part_type.trim();
        if !part_type.is_empty() && !catalog::is_known_part_type(part_type) {
            tracing::warn!(part_type, "Part type not in catalogue");
        }
        let package_mount = self.package_mount.trim();
        if !package_mount.is_empty() && !catalog::is_known_package_mount(package_mount) {
            tracing::warn!(package_mount, "Package mount not in catalogue");
        }
    }
}

/// Result of [`compute`].
#[derive(Debug, Clone, Serialize)]
pub struct Computation {
    /// Nominal values in millimetres, full precision, catalogue order.
    pub nominals: Nominals,
    /// Dimensions whose text did not parse.
    pub errors: IndexMap<Dimension, FieldError>,
    /// Derived values in report order.
    pub derived: Vec<DerivedValue>,
    /// Formatted report.
    pub report: Report,
}

impl Computation {
    /// Returns the text displayed beside a dimension's input fields.
    ///
    /// Empty and invalid dimensions display as `0.000`.
    #[must_use]
    pub fn display(&self, dimension: Dimension) -> String {
        format_value(self.nominals.get(&dimension).copied().unwrap_or(0.0))
    }

    /// Returns the nominal for a dimension, if it resolved.
    #[must_use]
    pub fn nominal(&self, dimension: Dimension) -> Option<f64> {
        self.nominals.get(&dimension).copied()
    }

    /// Returns the derived value with the given label.
    #[must_use]
    pub fn derived_value(&self, label: &str) -> Option<f64> {
        self.derived
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.value)
    }

    /// Returns `true` if any dimension failed to parse.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Computes nominals, derived values and the report.
///
/// Never fails: text that does not parse becomes a per-field error and
/// derived rules whose inputs are missing are skipped.
#[must_use]
pub fn compute(inputs: &Inputs, options: &Options) -> Computation {
    let mut nominals = Nominals::new();
    let mut errors = IndexMap::new();

    for dimension in Dimension::ALL {
        let Some(range) = inputs.dimensions.get(&dimension) else {
            continue;
        };
        match range.resolve(options.unit) {
            Resolution::Empty => {}
            Resolution::Nominal(value) => {
                nominals.insert(dimension, value);
            }
            Resolution::Invalid(error) => {
                tracing::debug!(%dimension, ?range, "Tolerance text did not parse");
                errors.insert(dimension, error);
            }
        }
    }

    let derived = derived::derive_all(&nominals, options);

    let mut report = Report::default();
    for (dimension, value) in &nominals {
        report.push(ReportLine::measure(
            dimension.label(),
            *value,
            options.unit.as_str(),
        ));
    }
    report.push(ReportLine::text("Part Type", inputs.part_type.as_str()));
    report.push(ReportLine::text("Package Mount", inputs.package_mount.as_str()));
    for value in &derived {
        report.push(ReportLine::measure(value.label, value.value, DerivedValue::UNIT));
    }

    Computation {
        nominals,
        errors,
        derived,
        report,
    }
}
