//! # Calculation Runner
//!
//! The compute stage of a single run: take a [`MeasurementRecord`], build
//! the calculation the requested [`CalculationKind`] names, evaluate it and
//! produce a [`RunReport`]. Collecting the record (prompts or a file) and
//! writing the report out are left to the front end.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::measurement::MeasurementRecord;
//! use tab_core::project::TabSettings;
//! use tab_core::runner::{run, CalculationKind};
//!
//! let record = MeasurementRecord::parse_str(r#"{"design_cfm": 1000, "measured_cfm": 950}"#).unwrap();
//! let report = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap();
//! assert_eq!(report.headline, "95.0% of design airflow.");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::{
    AirflowCheckInput,
    CalculationItem,
    DuctGeometry,
    DuctTraverseInput,
    FanLawInput,
    MotorPowerInput,
    Phases,
    TemperatureSplitInput,
    TraverseReadings,
};
use crate::calculations::fan::DEFAULT_POWER_FACTOR;
use crate::errors::{CalcError, CalcResult};
use crate::measurement::{Field, MeasurementRecord};
use crate::project::TabSettings;
use crate::report::{summarize, ReportLine};

use Requirement::{Optional, Required};

/// Whether a field must be present for a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    /// May be left blank; the calculation reports less
    Optional,
}

/// Calculation a single run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationKind {
    PercentOfDesign,
    DuctAirflow,
    PitotVelocity,
    TemperatureSplit,
    FanLaw,
    MotorPower,
}

impl CalculationKind {
    pub const ALL: [CalculationKind; 6] = [
        CalculationKind::PercentOfDesign,
        CalculationKind::DuctAirflow,
        CalculationKind::PitotVelocity,
        CalculationKind::TemperatureSplit,
        CalculationKind::FanLaw,
        CalculationKind::MotorPower,
    ];

    /// Name used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            CalculationKind::PercentOfDesign => "percent-of-design",
            CalculationKind::DuctAirflow => "duct-airflow",
            CalculationKind::PitotVelocity => "pitot-velocity",
            CalculationKind::TemperatureSplit => "temperature-split",
            CalculationKind::FanLaw => "fan-law",
            CalculationKind::MotorPower => "motor-power",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationKind::PercentOfDesign => "Percent of Design",
            CalculationKind::DuctAirflow => "Duct Airflow",
            CalculationKind::PitotVelocity => "Pitot Velocity",
            CalculationKind::TemperatureSplit => "Temperature Split",
            CalculationKind::FanLaw => "Fan Law",
            CalculationKind::MotorPower => "Motor Power",
        }
    }

    /// Fields the calculation reads, in prompt order
    pub fn fields(&self) -> &'static [(Field, Requirement)] {
        match self {
            CalculationKind::PercentOfDesign => &[(Field::DesignCfm, Required), (Field::MeasuredCfm, Required)],
            CalculationKind::DuctAirflow => &[
                (Field::Velocity, Required),
                (Field::DuctArea, Optional),
                (Field::DuctWidth, Optional),
                (Field::DuctHeight, Optional),
                (Field::DuctDiameter, Optional),
                (Field::DesignCfm, Optional),
            ],
            CalculationKind::PitotVelocity => &[
                (Field::VelocityPressure, Required),
                (Field::DuctArea, Optional),
                (Field::DesignCfm, Optional),
            ],
            CalculationKind::TemperatureSplit => &[
                (Field::EnteringAirTemp, Required),
                (Field::LeavingAirTemp, Required),
                (Field::MeasuredCfm, Optional),
            ],
            CalculationKind::FanLaw => &[
                (Field::FanRpm, Required),
                (Field::MeasuredCfm, Required),
                (Field::DesignCfm, Required),
                (Field::StaticPressure, Optional),
                (Field::FanBhp, Optional),
            ],
            CalculationKind::MotorPower => &[
                (Field::MotorVoltage, Required),
                (Field::MotorCurrent, Required),
                (Field::PowerFactor, Optional),
                (Field::Phases, Optional),
            ],
        }
    }

    pub fn uses(&self, field: Field) -> bool {
        self.fields().iter().any(|(f, _)| *f == field)
    }

    /// Build the calculation from a record.
    ///
    /// # Errors
    ///
    /// * `MissingField` - a required reading is absent
    /// * `InvalidInput` - a reading is out of range for this calculation
    pub fn build_item(&self, record: &MeasurementRecord, settings: &TabSettings) -> CalcResult<CalculationItem> {
        let label = self.display_name().to_string();
        let item = match self {
            CalculationKind::PercentOfDesign => CalculationItem::AirflowCheck(AirflowCheckInput {
                label,
                design_cfm: record.require(Field::DesignCfm)?,
                measured_cfm: record.require(Field::MeasuredCfm)?,
            }),
            CalculationKind::DuctAirflow => CalculationItem::DuctTraverse(DuctTraverseInput {
                label,
                geometry: Some(duct_geometry(record)?),
                readings: TraverseReadings::Velocity(vec![record.require(Field::Velocity)?]),
                design_cfm: record.get(Field::DesignCfm),
            }),
            CalculationKind::PitotVelocity => CalculationItem::DuctTraverse(DuctTraverseInput {
                label,
                geometry: record.get(Field::DuctArea).map(|area_sqft| DuctGeometry::Area { area_sqft }),
                readings: TraverseReadings::VelocityPressure(vec![record.require(Field::VelocityPressure)?]),
                design_cfm: record.get(Field::DesignCfm),
            }),
            CalculationKind::TemperatureSplit => CalculationItem::TemperatureSplit(TemperatureSplitInput {
                label,
                entering_temp: record.require(Field::EnteringAirTemp)?,
                leaving_temp: record.require(Field::LeavingAirTemp)?,
                scale: settings.temperature_scale,
                airflow_cfm: record.get(Field::MeasuredCfm),
            }),
            CalculationKind::FanLaw => CalculationItem::FanLaw(FanLawInput {
                label,
                fan_rpm: record.require(Field::FanRpm)?,
                measured_cfm: record.require(Field::MeasuredCfm)?,
                design_cfm: record.require(Field::DesignCfm)?,
                static_pressure_in_wg: record.get(Field::StaticPressure),
                fan_bhp: record.get(Field::FanBhp),
            }),
            CalculationKind::MotorPower => CalculationItem::MotorPower(MotorPowerInput {
                label,
                voltage: record.require(Field::MotorVoltage)?,
                current: record.require(Field::MotorCurrent)?,
                power_factor: record.get(Field::PowerFactor).unwrap_or(DEFAULT_POWER_FACTOR),
                phases: match record.get(Field::Phases) {
                    Some(count) => Phases::from_count(count)?,
                    None => Phases::default(),
                },
            }),
        };
        Ok(item)
    }
}

impl fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CalculationKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['_', ' '], "-");
        CalculationKind::ALL
            .iter()
            .copied()
            .find(|k| k.code() == key)
            .ok_or_else(|| {
                CalcError::invalid_input(
                    "calculation",
                    s.trim(),
                    format!(
                        "Expected one of: {}",
                        CalculationKind::ALL.iter().map(|k| k.code()).collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }
}

/// Area from whichever duct description the record carries.
///
/// A free area wins over dimensions; rectangular dimensions over a diameter.
/// Half a rectangle is a `MissingField` for the other half.
pub fn duct_geometry(record: &MeasurementRecord) -> CalcResult<DuctGeometry> {
    if let Some(area_sqft) = record.get(Field::DuctArea) {
        return Ok(DuctGeometry::Area { area_sqft });
    }
    match (record.get(Field::DuctWidth), record.get(Field::DuctHeight)) {
        (Some(width_in), Some(height_in)) => return Ok(DuctGeometry::Rectangular { width_in, height_in }),
        (Some(_), None) => return Err(CalcError::missing_field(Field::DuctHeight.name())),
        (None, Some(_)) => return Err(CalcError::missing_field(Field::DuctWidth.name())),
        (None, None) => {}
    }
    record
        .get(Field::DuctDiameter)
        .map(|diameter_in| DuctGeometry::Round { diameter_in })
        .ok_or_else(|| CalcError::missing_field(Field::DuctArea.name()))
}

/// Unit to show when asking for a field
pub fn field_unit(field: Field, settings: &TabSettings) -> &'static str {
    match field {
        Field::EnteringAirTemp | Field::LeavingAirTemp => settings.temperature_scale.symbol(),
        other => other.unit(),
    }
}

/// Text output of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub kind: CalculationKind,

    /// One-sentence result, printed first
    pub headline: String,

    /// Readings used, as (field, value) in prompt order
    pub inputs: Vec<ReportLine>,

    /// Derived values
    pub results: Vec<ReportLine>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline)?;
        writeln!(f)?;
        writeln!(f, "Calculation: {}", self.kind.display_name())?;
        writeln!(f, "Inputs:")?;
        for line in &self.inputs {
            writeln!(f, "  {}", line)?;
        }
        writeln!(f, "Results:")?;
        for line in &self.results {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Run one calculation over a record.
///
/// Readings the calculation does not use are ignored with a warning. The
/// report contains no timestamps, so the same record always renders the same
/// text.
pub fn run(kind: CalculationKind, record: &MeasurementRecord, settings: &TabSettings) -> CalcResult<RunReport> {
    for (field, _) in record.iter() {
        if !kind.uses(field) {
            warn!(field = %field, calculation = %kind, "ignoring reading not used by this calculation");
        }
    }

    let item = kind.build_item(record, settings)?;
    let result = item.evaluate(settings)?;
    let summary = summarize(&item, &result, settings);

    let inputs = kind
        .fields()
        .iter()
        .filter_map(|(field, _)| {
            record.get(*field).map(|value| {
                let unit = field_unit(*field, settings);
                ReportLine::new(field.name(), format_reading(value, unit))
            })
        })
        .collect();

    debug!(calculation = %kind, headline = %summary.headline, "run complete");

    Ok(RunReport {
        kind,
        headline: summary.headline,
        inputs,
        results: summary.lines,
    })
}

fn format_reading(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{}", value)
    } else {
        format!("{} {}", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(Field, f64)]) -> MeasurementRecord {
        let mut record = MeasurementRecord::new();
        for (field, value) in pairs {
            record.insert(*field, *value).unwrap();
        }
        record
    }

    #[test]
    fn test_percent_of_design_headline() {
        let r = record(&[(Field::DesignCfm, 1000.0), (Field::MeasuredCfm, 950.0)]);
        let report = run(CalculationKind::PercentOfDesign, &r, &TabSettings::default()).unwrap();
        assert_eq!(report.headline, "95.0% of design airflow.");
        assert!(report.to_string().starts_with("95.0% of design airflow.\n"));
    }

    #[test]
    fn test_zero_design_is_division_by_zero() {
        let r = record(&[(Field::DesignCfm, 0.0), (Field::MeasuredCfm, 950.0)]);
        let err = run(CalculationKind::PercentOfDesign, &r, &TabSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_missing_field() {
        let r = record(&[(Field::DesignCfm, 1000.0)]);
        let err = run(CalculationKind::PercentOfDesign, &r, &TabSettings::default()).unwrap_err();
        assert_eq!(err, CalcError::missing_field("measured_cfm"));
    }

    #[test]
    fn test_same_record_same_text() {
        let r = record(&[
            (Field::Velocity, 812.5),
            (Field::DuctWidth, 20.0),
            (Field::DuctHeight, 10.0),
            (Field::DesignCfm, 1200.0),
        ]);
        let settings = TabSettings::default();
        let a = run(CalculationKind::DuctAirflow, &r, &settings).unwrap().to_string();
        let b = run(CalculationKind::DuctAirflow, &r, &settings).unwrap().to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duct_geometry_preference() {
        let r = record(&[(Field::DuctArea, 2.0), (Field::DuctDiameter, 12.0)]);
        assert_eq!(duct_geometry(&r).unwrap(), DuctGeometry::Area { area_sqft: 2.0 });

        let r = record(&[(Field::DuctWidth, 24.0)]);
        assert_eq!(duct_geometry(&r).unwrap_err(), CalcError::missing_field("duct_height"));

        let r = record(&[(Field::DuctDiameter, 12.0)]);
        assert_eq!(duct_geometry(&r).unwrap(), DuctGeometry::Round { diameter_in: 12.0 });

        assert_eq!(
            duct_geometry(&MeasurementRecord::new()).unwrap_err(),
            CalcError::missing_field("duct_area")
        );
    }

    #[test]
    fn test_pitot_without_area() {
        let r = record(&[(Field::VelocityPressure, 1.0)]);
        let report = run(CalculationKind::PitotVelocity, &r, &TabSettings::default()).unwrap();
        assert_eq!(report.headline, "Average velocity 4005 FPM.");
    }

    #[test]
    fn test_motor_defaults() {
        let r = record(&[(Field::MotorVoltage, 400.0), (Field::MotorCurrent, 10.0)]);
        match CalculationKind::MotorPower.build_item(&r, &TabSettings::default()).unwrap() {
            CalculationItem::MotorPower(input) => {
                assert_eq!(input.power_factor, DEFAULT_POWER_FACTOR);
                assert_eq!(input.phases, Phases::Three);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("percent-of-design".parse::<CalculationKind>().unwrap(), CalculationKind::PercentOfDesign);
        assert_eq!("Fan_Law".parse::<CalculationKind>().unwrap(), CalculationKind::FanLaw);
        assert!("psychrometrics".parse::<CalculationKind>().is_err());
        for kind in CalculationKind::ALL {
            assert_eq!(kind.code().parse::<CalculationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_celsius_prompt_unit() {
        let mut settings = TabSettings::default();
        assert_eq!(field_unit(Field::EnteringAirTemp, &settings), "°F");
        settings.temperature_scale = crate::units::TemperatureScale::Celsius;
        assert_eq!(field_unit(Field::EnteringAirTemp, &settings), "°C");
        assert_eq!(field_unit(Field::Velocity, &settings), "FPM");
    }

    #[test]
    fn test_inputs_listed_in_prompt_order() {
        let r = record(&[(Field::MeasuredCfm, 950.0), (Field::DesignCfm, 1000.0)]);
        let report = run(CalculationKind::PercentOfDesign, &r, &TabSettings::default()).unwrap();
        assert_eq!(report.inputs[0].label, "design_cfm");
        assert_eq!(report.inputs[0].value, "1000 CFM");
        assert_eq!(report.inputs[1].label, "measured_cfm");
    }
}
