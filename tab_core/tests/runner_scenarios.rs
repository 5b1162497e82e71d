//! End-to-end runs: record file in, report text out.

use std::fs;

use tab_core::measurement::{Field, MeasurementRecord};
use tab_core::project::TabSettings;
use tab_core::runner::{run, CalculationKind};
use tab_core::units::TemperatureScale;
use tempfile::tempdir;

fn record_from(contents: &str) -> tab_core::CalcResult<MeasurementRecord> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reading.txt");
    fs::write(&path, contents).unwrap();
    MeasurementRecord::from_file(&path)
}

#[test]
fn percent_of_design_from_json_file() {
    let record = record_from(r#"{ "design_cfm": 1000, "measured_cfm": 950 }"#).unwrap();
    let report = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap();

    assert_eq!(report.headline, "95.0% of design airflow.");
    let text = report.to_string();
    assert!(text.contains("Percent of design: 95.0 %"));
    assert!(text.contains("Deviation: -50.0 CFM"));
    assert!(text.contains("Tolerance: within ±10.0 %"));
}

#[test]
fn key_value_file_matches_json_file() {
    let json = record_from(r#"{ "design_cfm": "1000", "measured_cfm": 950 }"#).unwrap();
    let lines = record_from("# AHU-1 supply\ndesign_cfm = 1000\nmeasured-cfm: 950\n").unwrap();
    assert_eq!(json, lines);

    let settings = TabSettings::default();
    let a = run(CalculationKind::PercentOfDesign, &json, &settings).unwrap().to_string();
    let b = run(CalculationKind::PercentOfDesign, &lines, &settings).unwrap().to_string();
    assert_eq!(a, b);
}

#[test]
fn zero_design_is_handled() {
    let record = record_from(r#"{ "design_cfm": 0, "measured_cfm": 950 }"#).unwrap();
    let err = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap_err();
    assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
    assert!(err.is_input_error());
}

#[test]
fn tiny_design_is_an_input_error_not_infinity() {
    let record = record_from("design_cfm = 1e-310\nmeasured_cfm = 950\n").unwrap();
    let err = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap_err();
    assert!(err.is_input_error());
    assert!(!err.to_string().contains("inf"));
}

#[test]
fn overflowing_duct_airflow_is_an_input_error() {
    let record = record_from("velocity = 1e200\nduct_area = 1e200\n").unwrap();
    let err = run(CalculationKind::DuctAirflow, &record, &TabSettings::default()).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}

#[test]
fn non_numeric_value_is_input_error() {
    let err = record_from(r#"{ "design_cfm": "abc", "measured_cfm": 950 }"#).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
    assert!(err.is_input_error());

    let err = record_from("design_cfm = 1,000\n").unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");
}

#[test]
fn unknown_and_missing_fields() {
    let err = record_from("supply_cfm = 1000\n").unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_FIELD");

    let record = record_from("design_cfm = 1000\n").unwrap();
    let err = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap_err();
    assert_eq!(err.error_code(), "MISSING_FIELD");
}

#[test]
fn unused_fields_are_ignored() {
    let record = record_from("design_cfm = 1000\nmeasured_cfm = 950\nfan_rpm = 1200\n").unwrap();
    let report = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap();
    assert_eq!(report.inputs.len(), 2);
}

#[test]
fn duct_airflow_from_rectangular_duct() {
    let record = record_from("velocity = 800\nduct_width = 24\nduct_height = 12\ndesign_cfm = 1600\n").unwrap();
    let report = run(CalculationKind::DuctAirflow, &record, &TabSettings::default()).unwrap();
    assert_eq!(report.headline, "1600 CFM duct airflow.");
    assert!(report.to_string().contains("Percent of design: 100.0 %"));
}

#[test]
fn temperature_split_with_sensible_heat() {
    let record = record_from("entering_air_temp = 75\nleaving_air_temp = 55\nmeasured_cfm = 1000\n").unwrap();
    let report = run(CalculationKind::TemperatureSplit, &record, &TabSettings::default()).unwrap();
    assert_eq!(report.headline, "Temperature split 20.0 °F.");
    assert!(report.to_string().contains("Sensible heat: 21600 Btu/h"));
}

#[test]
fn temperature_split_in_celsius() {
    let settings = TabSettings {
        temperature_scale: TemperatureScale::Celsius,
        ..TabSettings::default()
    };
    let record = MeasurementRecord::new()
        .with(Field::EnteringAirTemp, 24.0)
        .unwrap()
        .with(Field::LeavingAirTemp, 13.0)
        .unwrap();
    let report = run(CalculationKind::TemperatureSplit, &record, &settings).unwrap();
    assert_eq!(report.headline, "Temperature split 11.0 °C.");
    assert!(report.to_string().contains("entering_air_temp: 24 °C"));
}

#[test]
fn fan_law_required_speed() {
    let record = record_from("fan_rpm = 1000\nmeasured_cfm = 900\ndesign_cfm = 1000\n").unwrap();
    let report = run(CalculationKind::FanLaw, &record, &TabSettings::default()).unwrap();
    assert_eq!(report.headline, "Set fan to 1111 RPM for design airflow.");
}

#[test]
fn fan_law_zero_speed_is_handled() {
    let record = record_from("fan_rpm = 0\nmeasured_cfm = 900\ndesign_cfm = 1000\n").unwrap();
    let err = run(CalculationKind::FanLaw, &record, &TabSettings::default()).unwrap_err();
    assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
}

#[test]
fn motor_power_three_phase_default() {
    let record = record_from("motor_voltage = 400\nmotor_current = 10\n").unwrap();
    let report = run(CalculationKind::MotorPower, &record, &TabSettings::default()).unwrap();
    assert_eq!(report.headline, "Motor input 5.89 kW.");
}

#[test]
fn same_record_same_report() {
    let record = record_from("velocity_pressure = 0.25\nduct_area = 2\ndesign_cfm = 4000\n").unwrap();
    let settings = TabSettings::default();
    let first = run(CalculationKind::PitotVelocity, &record, &settings).unwrap().to_string();
    for _ in 0..5 {
        assert_eq!(run(CalculationKind::PitotVelocity, &record, &settings).unwrap().to_string(), first);
    }
}
