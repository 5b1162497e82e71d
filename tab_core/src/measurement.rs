//! # Measurement Records
//!
//! A [`MeasurementRecord`] is the set of named readings one run works on:
//! `design_cfm`, `measured_cfm`, `velocity`, `duct_area` and so on. Every
//! value is validated on the way in, so a record that exists is a record
//! the formulas can use.
//!
//! Records come from three places:
//! - interactive prompts (one [`Field`] at a time via [`Field::parse_value`])
//! - a JSON object: `{"design_cfm": 1000, "measured_cfm": "950"}`
//! - `name = value` lines, `#` comments allowed
//!
//! ## Example
//!
//! ```rust
//! use tab_core::measurement::{Field, MeasurementRecord};
//!
//! let record = MeasurementRecord::parse_str("design_cfm = 1000\nmeasured_cfm = 950").unwrap();
//! assert_eq!(record.require(Field::MeasuredCfm).unwrap(), 950.0);
//!
//! let bad = MeasurementRecord::parse_str("measured_cfm = lots");
//! assert!(bad.unwrap_err().is_input_error());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// A named reading in the field catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DesignCfm,
    MeasuredCfm,
    Velocity,
    DuctArea,
    DuctWidth,
    DuctHeight,
    DuctDiameter,
    VelocityPressure,
    EnteringAirTemp,
    LeavingAirTemp,
    FanRpm,
    StaticPressure,
    FanBhp,
    MotorVoltage,
    MotorCurrent,
    PowerFactor,
    Phases,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::DesignCfm,
        Field::MeasuredCfm,
        Field::Velocity,
        Field::DuctArea,
        Field::DuctWidth,
        Field::DuctHeight,
        Field::DuctDiameter,
        Field::VelocityPressure,
        Field::EnteringAirTemp,
        Field::LeavingAirTemp,
        Field::FanRpm,
        Field::StaticPressure,
        Field::FanBhp,
        Field::MotorVoltage,
        Field::MotorCurrent,
        Field::PowerFactor,
        Field::Phases,
    ];

    /// Key used in input files
    pub fn name(&self) -> &'static str {
        match self {
            Field::DesignCfm => "design_cfm",
            Field::MeasuredCfm => "measured_cfm",
            Field::Velocity => "velocity",
            Field::DuctArea => "duct_area",
            Field::DuctWidth => "duct_width",
            Field::DuctHeight => "duct_height",
            Field::DuctDiameter => "duct_diameter",
            Field::VelocityPressure => "velocity_pressure",
            Field::EnteringAirTemp => "entering_air_temp",
            Field::LeavingAirTemp => "leaving_air_temp",
            Field::FanRpm => "fan_rpm",
            Field::StaticPressure => "static_pressure",
            Field::FanBhp => "fan_bhp",
            Field::MotorVoltage => "motor_voltage",
            Field::MotorCurrent => "motor_current",
            Field::PowerFactor => "power_factor",
            Field::Phases => "phases",
        }
    }

    /// Prompt / report label
    pub fn label(&self) -> &'static str {
        match self {
            Field::DesignCfm => "Design airflow",
            Field::MeasuredCfm => "Measured airflow",
            Field::Velocity => "Average duct velocity",
            Field::DuctArea => "Duct free area",
            Field::DuctWidth => "Duct width",
            Field::DuctHeight => "Duct height",
            Field::DuctDiameter => "Duct diameter",
            Field::VelocityPressure => "Velocity pressure",
            Field::EnteringAirTemp => "Entering (on-coil) air temperature",
            Field::LeavingAirTemp => "Leaving (off-coil) air temperature",
            Field::FanRpm => "Fan speed",
            Field::StaticPressure => "Fan static pressure",
            Field::FanBhp => "Fan brake horsepower",
            Field::MotorVoltage => "Motor voltage",
            Field::MotorCurrent => "Motor current",
            Field::PowerFactor => "Motor power factor",
            Field::Phases => "Supply phases",
        }
    }

    /// Unit the value is entered in
    pub fn unit(&self) -> &'static str {
        match self {
            Field::DesignCfm | Field::MeasuredCfm => "CFM",
            Field::Velocity => "FPM",
            Field::DuctArea => "ft²",
            Field::DuctWidth | Field::DuctHeight | Field::DuctDiameter => "in",
            Field::VelocityPressure | Field::StaticPressure => "in. wg",
            Field::EnteringAirTemp | Field::LeavingAirTemp => "°F",
            Field::FanRpm => "RPM",
            Field::FanBhp => "hp",
            Field::MotorVoltage => "V",
            Field::MotorCurrent => "A",
            Field::PowerFactor | Field::Phases => "",
        }
    }

    /// Whether a negative reading is physically meaningful
    pub fn allows_negative(&self) -> bool {
        matches!(self, Field::EnteringAirTemp | Field::LeavingAirTemp)
    }

    /// Look up a field by its input-file key.
    pub fn from_name(name: &str) -> CalcResult<Self> {
        let key = name.trim().to_lowercase().replace(['-', ' '], "_");
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == key)
            .ok_or_else(|| CalcError::unknown_field(name.trim()))
    }

    /// Parse raw text into a validated value for this field.
    pub fn parse_value(&self, text: &str) -> CalcResult<f64> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CalcError::missing_field(self.name()));
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| CalcError::invalid_input(self.name(), trimmed, "Not a number"))?;
        self.validate(value)
    }

    /// Check range constraints on an already-numeric value.
    pub fn validate(&self, value: f64) -> CalcResult<f64> {
        if !value.is_finite() {
            return Err(CalcError::invalid_input(
                self.name(),
                value.to_string(),
                "Value must be finite",
            ));
        }
        if value < 0.0 && !self.allows_negative() {
            return Err(CalcError::invalid_input(
                self.name(),
                value.to_string(),
                format!("{} cannot be negative", self.label()),
            ));
        }
        match self {
            Field::PowerFactor if value > 1.0 => Err(CalcError::invalid_input(
                self.name(),
                value.to_string(),
                "Power factor must be between 0 and 1",
            )),
            Field::Phases if value != 1.0 && value != 3.0 => Err(CalcError::invalid_input(
                self.name(),
                value.to_string(),
                "Supply must be 1 or 3 phase",
            )),
            _ => Ok(value),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named readings for one run.
///
/// Deserializing goes through the same checks as [`MeasurementRecord::from_json_str`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasurementRecord {
    values: BTreeMap<Field, f64>,
}

impl<'de> Deserialize<'de> for MeasurementRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        MeasurementRecord::from_json_value(&raw).map_err(serde::de::Error::custom)
    }
}

impl MeasurementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert with validation.
    pub fn with(mut self, field: Field, value: f64) -> CalcResult<Self> {
        self.insert(field, value)?;
        Ok(self)
    }

    /// Validate and store a reading, replacing any earlier value.
    pub fn insert(&mut self, field: Field, value: f64) -> CalcResult<()> {
        let value = field.validate(value)?;
        self.values.insert(field, value);
        Ok(())
    }

    pub fn remove(&mut self, field: Field) -> Option<f64> {
        self.values.remove(&field)
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// Get a reading the calculation cannot do without.
    pub fn require(&self, field: Field) -> CalcResult<f64> {
        self.get(field)
            .ok_or_else(|| CalcError::missing_field(field.name()))
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Readings in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    /// Parse a JSON object of readings.
    ///
    /// Values may be JSON numbers or numeric strings.
    pub fn from_json_str(text: &str) -> CalcResult<Self> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| CalcError::invalid_input("record", "JSON", format!("Malformed JSON: {}", e)))?;
        Self::from_json_value(&parsed)
    }

    fn from_json_value(parsed: &Value) -> CalcResult<Self> {
        let object = parsed.as_object().ok_or_else(|| {
            CalcError::invalid_input("record", "non-object JSON", "Expected an object of name: value pairs")
        })?;

        let mut record = MeasurementRecord::new();
        for (key, raw) in object {
            let field = Field::from_name(key)?;
            let value = match raw {
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| CalcError::invalid_input(field.name(), n.to_string(), "Not a number"))
                    .and_then(|v| field.validate(v))?,
                Value::String(s) => field.parse_value(s)?,
                Value::Null => return Err(CalcError::missing_field(field.name())),
                other => {
                    return Err(CalcError::invalid_input(field.name(), other.to_string(), "Not a number"));
                }
            };
            record.values.insert(field, value);
        }
        Ok(record)
    }

    /// Parse `name = value` (or `name: value`) lines.
    pub fn from_key_value_str(text: &str) -> CalcResult<Self> {
        let mut record = MeasurementRecord::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .or_else(|| line.split_once(':'))
                .ok_or_else(|| {
                    CalcError::invalid_input(
                        format!("line {}", line_no + 1),
                        line,
                        "Expected 'name = value'",
                    )
                })?;
            let field = Field::from_name(key)?;
            let value = field.parse_value(value)?;
            record.values.insert(field, value);
        }
        Ok(record)
    }

    /// Parse either format, choosing JSON when the text starts with `{`.
    pub fn parse_str(text: &str) -> CalcResult<Self> {
        if text.trim_start().starts_with('{') {
            Self::from_json_str(text)
        } else {
            Self::from_key_value_str(text)
        }
    }

    /// Read a record from an input file.
    pub fn from_file(path: &Path) -> CalcResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        let record = Self::parse_str(&text)?;
        debug!(path = %path.display(), fields = record.len(), "loaded measurement record");
        Ok(record)
    }
}
