//! Integration tests for the nominal dimension engine.
//!
//! These tests drive `compute` through the public API the way the CLI and
//! the MCP tools do: raw min/max text in, nominals, derived values and the
//! summary report out.

use package_nominal::nominal::{
    compute, CalculationRequest, Dimension, FieldError, Inputs, LeadHeightRatio, Options,
    PartTypeMode, ToleranceRange, Unit,
};

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or_else(|| panic!("Expected a value close to {expected}"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected {expected}, got {actual}"
    );
}

fn inputs(ranges: &[(Dimension, ToleranceRange)]) -> Inputs {
    let mut inputs = Inputs::default();
    for (dimension, range) in ranges {
        inputs.set(*dimension, range.clone());
    }
    inputs
}

// =============================================================================
// Nominal Resolution Tests
// =============================================================================

#[test]
fn test_single_sided_range_uses_that_value() {
    for dimension in Dimension::ALL {
        let min_only = inputs(&[(dimension, ToleranceRange::new("2.0", ""))]);
        let max_only = inputs(&[(dimension, ToleranceRange::new("", "2.0"))]);

        for inputs in [min_only, max_only] {
            let result = compute(&inputs, &Options::default());
            assert_eq!(result.display(dimension), "2.000", "{dimension}");
        }
    }
}

#[test]
fn test_inch_input_converted_to_mm() {
    let inputs = inputs(&[(Dimension::PadWidth, ToleranceRange::new("0.1", "0.1"))]);
    let options = Options {
        unit: Unit::Inches,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_eq!(result.display(Dimension::PadWidth), "2.540");
    assert_close(result.nominal(Dimension::PadWidth), 2.54);
}

#[test]
fn test_nominal_is_mean_of_range() {
    let inputs = inputs(&[(Dimension::LeadPitch, ToleranceRange::new(" 1.17 ", "1.37"))]);
    let result = compute(&inputs, &Options::default());
    assert_close(result.nominal(Dimension::LeadPitch), 1.27);
}

#[test]
fn test_empty_range_is_absent() {
    let inputs = inputs(&[(Dimension::SinkWidth, ToleranceRange::new("  ", ""))]);
    let result = compute(&inputs, &Options::default());

    assert!(result.nominal(Dimension::SinkWidth).is_none());
    assert!(!result.has_errors());
    assert_eq!(result.display(Dimension::SinkWidth), "0.000");
}

#[test]
fn test_non_finite_text_is_invalid() {
    let inputs = inputs(&[(Dimension::DieThickness, ToleranceRange::new("inf", "1"))]);
    let result = compute(&inputs, &Options::default());
    assert_eq!(
        result.errors.get(&Dimension::DieThickness),
        Some(&FieldError::InvalidNumber)
    );
}

// =============================================================================
// Derived Value Tests
// =============================================================================

#[test]
fn test_bga_split() {
    let inputs = inputs(&[(Dimension::PackageThickness, ToleranceRange::exact("1.000"))]);
    let options = Options {
        bga_mode: true,
        include_standoff_in_thickness: false,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    let overmold = result.derived_value("BGA Overmold Thickness");
    let laminate = result.derived_value("BGA Laminate Thickness");
    assert_close(overmold, 0.67);
    assert_close(laminate, 0.33);
    assert_close(overmold.zip(laminate).map(|(o, l)| o + l), 1.0);
}

#[test]
fn test_bga_split_needs_positive_thickness() {
    let inputs = inputs(&[(Dimension::PackageThickness, ToleranceRange::exact("0"))]);
    let options = Options {
        bga_mode: true,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert!(result.derived_value("BGA Overmold Thickness").is_none());
}

#[test]
fn test_standoff_adjustment_half_ratio() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("1.000")),
        (Dimension::LeadStandoff, ToleranceRange::exact("0.200")),
    ]);

    let result = compute(&inputs, &Options::default());
    assert_close(result.derived_value("Thickness Minus Standoff"), 0.8);
    assert_close(result.derived_value("Adjusted Lead Height"), 0.7);
}

#[test]
fn test_standoff_adjustment_two_thirds_ratio() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("1.2")),
        (Dimension::LeadStandoff, ToleranceRange::exact("0.1")),
        (Dimension::LeadThickness, ToleranceRange::exact("0.2")),
    ]);
    let options = Options {
        lead_height_ratio: LeadHeightRatio::TwoThirds,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    // 1.2 * 2/3 + 0.1 - 0.2 / 2
    assert_close(result.derived_value("Adjusted Lead Height"), 0.8);
}

#[test]
fn test_given_lead_height_wins_over_ratio() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("1.2")),
        (Dimension::LeadStandoff, ToleranceRange::exact("0.1")),
        (Dimension::LeadThickness, ToleranceRange::exact("0.2")),
        (Dimension::LeadHeight, ToleranceRange::exact("0.5")),
    ]);

    let result = compute(&inputs, &Options::default());
    assert_close(result.derived_value("Adjusted Lead Height"), 0.4);
}

#[test]
fn test_standoff_adjustment_switched_off() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("1.0")),
        (Dimension::LeadStandoff, ToleranceRange::exact("0.2")),
    ]);
    let options = Options {
        include_standoff_in_thickness: false,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert!(result.derived.is_empty());
}

#[test]
fn test_die_standard_mode_defaults_length_to_width() {
    let inputs = inputs(&[(Dimension::PackageWidth, ToleranceRange::exact("4.000"))]);
    let options = Options {
        include_die_calculation: true,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_close(result.derived_value("Die Width"), 2.0);
    assert_close(result.derived_value("Die Length"), 2.0);
}

#[test]
fn test_die_diode_mode_uses_width_for_both() {
    let inputs = inputs(&[
        (Dimension::PackageWidth, ToleranceRange::exact("4")),
        (Dimension::PackageLength, ToleranceRange::exact("6")),
    ]);
    let options = Options {
        include_die_calculation: true,
        part_type_mode: PartTypeMode::Diode,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_close(result.derived_value("Die Width"), 2.0);
    assert_close(result.derived_value("Die Length"), 2.0);
}

#[test]
fn test_die_flag_mode_subtracts_clearance() {
    let inputs = inputs(&[(Dimension::PackageWidth, ToleranceRange::exact("4"))]);
    let options = Options {
        include_die_calculation: true,
        part_type_mode: PartTypeMode::Flag,
        flag_length: Some("1.5".to_string()),
        flag_width: Some(" 1.2 ".to_string()),
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_close(result.derived_value("Die Width"), 1.1);
    assert_close(result.derived_value("Die Length"), 1.4);
}

#[test]
fn test_die_flag_mode_invalid_text_gives_zero() {
    let inputs = inputs(&[(Dimension::PackageWidth, ToleranceRange::exact("4"))]);
    let options = Options {
        include_die_calculation: true,
        part_type_mode: PartTypeMode::Flag,
        flag_length: Some("abc".to_string()),
        flag_width: Some("1.0".to_string()),
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert!(!result.has_errors());
    assert_close(result.derived_value("Die Width"), 0.0);
    assert_close(result.derived_value("Die Length"), 0.0);
    assert!(result.report.to_text().contains("Die Width: 0.000 mm\n"));
}

#[test]
fn test_die_skipped_without_package_width() {
    let inputs = inputs(&[(Dimension::PackageLength, ToleranceRange::exact("4"))]);
    let options = Options {
        include_die_calculation: true,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert!(result.derived_value("Die Width").is_none());
}

#[test]
fn test_lead_shoulder_width() {
    let inputs = inputs(&[
        (Dimension::OverallWidth, ToleranceRange::new("5.8", "6.2")),
        (Dimension::PackageWidth, ToleranceRange::new("3.8", "4.0")),
        (Dimension::LeadFootLength, ToleranceRange::new("0.4", "0.8")),
    ]);

    let result = compute(&inputs, &Options::default());
    assert_close(result.derived_value("Lead Shoulder Width"), 0.45);
    assert!(result
        .report
        .to_text()
        .ends_with("Lead Shoulder Width: 0.450 mm\n"));
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_full_report_text() {
    let mut inputs = inputs(&[
        (Dimension::LeadStandoff, ToleranceRange::exact("0.2")),
        (Dimension::PackageThickness, ToleranceRange::new("0.95", "1.05")),
    ]);
    inputs.part_type = "BGA".to_string();
    inputs.package_mount = "SMT".to_string();
    let options = Options {
        bga_mode: true,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_eq!(
        result.report.to_text(),
        "Summary:\n\
         Package Thickness: 1.000 mm\n\
         Lead Standoff: 0.200 mm\n\
         Part Type: BGA\n\
         Package Mount: SMT\n\
         BGA Overmold Thickness: 0.670 mm\n\
         BGA Laminate Thickness: 0.330 mm\n\
         Thickness Minus Standoff: 0.800 mm\n\
         Adjusted Lead Height: 0.700 mm\n"
    );
}

#[test]
fn test_inch_report_labels_nominals_only() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("0.04")),
        (Dimension::LeadStandoff, ToleranceRange::exact("0.002")),
    ]);
    let options = Options {
        unit: Unit::Inches,
        ..Options::default()
    };

    let text = compute(&inputs, &options).report.to_text();
    assert!(text.contains("Package Thickness: 1.016 inches\n"));
    assert!(text.contains("Thickness Minus Standoff: 0.965 mm\n"));
}

#[test]
fn test_compute_is_idempotent() {
    let inputs = inputs(&[
        (Dimension::OverallWidth, ToleranceRange::new("5.8", "6.2")),
        (Dimension::PackageWidth, ToleranceRange::new("3.8", "4.0")),
        (Dimension::PackageThickness, ToleranceRange::new("1.5", "1.75")),
        (Dimension::LeadStandoff, ToleranceRange::new("0.1", "0.25")),
        (Dimension::LeadFootLength, ToleranceRange::new("0.4", "1.27")),
    ]);
    let options = Options {
        bga_mode: true,
        include_die_calculation: true,
        ..Options::default()
    };

    let first = compute(&inputs, &options);
    let second = compute(&inputs, &options);
    assert_eq!(first.report.to_text(), second.report.to_text());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_malformed_field_does_not_block_others() {
    let inputs = inputs(&[
        (Dimension::PackageWidth, ToleranceRange::new("x", "2")),
        (Dimension::PackageThickness, ToleranceRange::new("1", "1")),
    ]);
    let options = Options {
        bga_mode: true,
        include_die_calculation: true,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_eq!(
        result.errors.get(&Dimension::PackageWidth),
        Some(&FieldError::InvalidNumber)
    );
    assert_eq!(result.display(Dimension::PackageWidth), "0.000");
    assert_eq!(result.display(Dimension::PackageThickness), "1.000");
    assert_close(result.derived_value("BGA Overmold Thickness"), 0.67);
    // Die geometry depends on the invalid width and is skipped
    assert!(result.derived_value("Die Width").is_none());
}

// =============================================================================
// Request Parsing Tests
// =============================================================================

#[test]
fn test_request_from_json_file_contents() {
    let json = r#"{
        "dimensions": {
            "Package Width": {"min": 3.8, "max": "4.0"},
            "Package Thickness": {"min": "0.8", "max": "1.0"}
        },
        "part_type": "QFN",
        "package_mount": "SMT",
        "options": {
            "unit": "mm",
            "lead_height_ratio": "2/3",
            "part_type_mode": "Diode",
            "include_die_calculation": true
        }
    }"#;

    let request: CalculationRequest = serde_json::from_str(json).unwrap();
    let (inputs, options) = request.into_parts(Options::default());
    assert_eq!(options.lead_height_ratio, LeadHeightRatio::TwoThirds);
    assert_eq!(options.part_type_mode, PartTypeMode::Diode);

    let result = compute(&inputs, &options);
    assert_eq!(result.display(Dimension::PackageWidth), "3.900");
    assert_close(result.derived_value("Die Length"), 1.95);
}

#[test]
fn test_unknown_mode_text_falls_back_to_standard() {
    let json = r#"{"options": {"part_type_mode": "Transistor"}}"#;
    let request: CalculationRequest = serde_json::from_str(json).unwrap();
    let (_, options) = request.into_parts(Options::default());
    assert_eq!(options.part_type_mode, PartTypeMode::Standard);
}

#[test]
fn test_invalid_unit_rejected() {
    let json = r#"{"options": {"unit": "furlongs"}}"#;
    let result: Result<CalculationRequest, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

#[test]
fn test_request_labels_match_loosely() {
    let json = r#"{"dimensions": {"package width": {"min": "3.9", "max": "4.1"}}}"#;
    let request: CalculationRequest = serde_json::from_str(json).unwrap();
    let (inputs, options) = request.into_parts(Options::default());
    assert_eq!(compute(&inputs, &options).display(Dimension::PackageWidth), "4.000");
}

#[test]
fn test_misspelled_keys_rejected() {
    let misspelled_option = r#"{
        "dimensions": {"Package Thickness": {"min": "1", "max": "1"}},
        "optons": {"bga_mode": true}
    }"#;
    assert!(serde_json::from_str::<CalculationRequest>(misspelled_option).is_err());

    let extra_range_key = r#"{"dimensions": {"Package Thickness": {"min": "1", "nom": "2"}}}"#;
    assert!(serde_json::from_str::<CalculationRequest>(extra_range_key).is_err());
}

#[test]
fn test_huge_values_never_report_inf() {
    let inputs = inputs(&[
        (Dimension::PackageThickness, ToleranceRange::exact("1e308")),
        (Dimension::PackageWidth, ToleranceRange::exact("1e307")),
    ]);
    let options = Options {
        unit: Unit::Inches,
        ..Options::default()
    };

    let result = compute(&inputs, &options);
    assert_eq!(
        result.errors.get(&Dimension::PackageThickness),
        Some(&FieldError::InvalidNumber)
    );
    assert_eq!(
        result.errors.get(&Dimension::PackageWidth),
        Some(&FieldError::InvalidNumber)
    );
    assert!(!result.report.to_text().contains("inf"));

    let millimetres = compute(&inputs, &Options::default());
    assert!(millimetres.nominals.values().all(|v| v.is_finite()));
}
