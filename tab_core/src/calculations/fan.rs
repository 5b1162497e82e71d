//! # Fan and Motor Checks
//!
//! Fan affinity laws for resetting a fan to design airflow, and electrical
//! input power from measured motor voltage and current.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::calculations::fan::{FanLawInput, calculate_fan_law};
//!
//! let input = FanLawInput {
//!     label: "AHU-1".to_string(),
//!     fan_rpm: 900.0,
//!     measured_cfm: 900.0,
//!     design_cfm: 1000.0,
//!     static_pressure_in_wg: None,
//!     fan_bhp: None,
//! };
//!
//! let result = calculate_fan_law(&input).unwrap();
//! assert!((result.required_rpm - 1000.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{checked_percent, finite};
use crate::equations::{fan_law_power, fan_law_pressure, fan_law_speed, motor_input_kw, Equation};
use crate::errors::{CalcError, CalcResult};

/// Power factor assumed when none was measured
pub const DEFAULT_POWER_FACTOR: f64 = 0.85;

/// Input for a fan-law speed reset.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "AHU-1",
///   "fan_rpm": 900.0,
///   "measured_cfm": 900.0,
///   "design_cfm": 1000.0,
///   "static_pressure_in_wg": 1.5,
///   "fan_bhp": 2.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanLawInput {
    pub label: String,

    /// Current fan speed (RPM)
    pub fan_rpm: f64,

    /// Airflow at the current speed (CFM)
    pub measured_cfm: f64,

    /// Design airflow (CFM)
    pub design_cfm: f64,

    /// Fan static pressure at the current speed (in. wg)
    #[serde(default)]
    pub static_pressure_in_wg: Option<f64>,

    /// Brake horsepower at the current speed
    #[serde(default)]
    pub fan_bhp: Option<f64>,
}

impl FanLawInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        check_reading("fan_rpm", self.fan_rpm)?;
        check_reading("measured_cfm", self.measured_cfm)?;
        check_reading("design_cfm", self.design_cfm)?;
        if let Some(sp) = self.static_pressure_in_wg {
            check_reading("static_pressure", sp)?;
        }
        if let Some(bhp) = self.fan_bhp {
            check_reading("fan_bhp", bhp)?;
        }

        if self.fan_rpm == 0.0 {
            return Err(CalcError::division_by_zero("fan law", "fan_rpm"));
        }
        if self.measured_cfm == 0.0 {
            return Err(CalcError::division_by_zero("fan law", "measured_cfm"));
        }
        if self.design_cfm == 0.0 {
            return Err(CalcError::division_by_zero("percent of design", "design_cfm"));
        }
        Ok(())
    }

    pub fn equations(&self) -> Vec<Equation> {
        let mut used = vec![Equation::PercentOfDesign, Equation::FanLawSpeed];
        if self.static_pressure_in_wg.is_some() {
            used.push(Equation::FanLawPressure);
        }
        if self.fan_bhp.is_some() {
            used.push(Equation::FanLawPower);
        }
        used
    }
}

/// Fan conditions predicted at design airflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanLawResult {
    /// Measured airflow as percent of design
    pub percent_of_design: f64,

    /// Speed needed for design airflow (RPM)
    pub required_rpm: f64,

    /// Change from the current speed (RPM)
    pub rpm_change: f64,

    /// Predicted static pressure at design airflow (in. wg)
    pub predicted_static_in_wg: Option<f64>,

    /// Predicted brake horsepower at design airflow
    pub predicted_bhp: Option<f64>,
}

/// Apply the fan laws to reach design airflow.
///
/// # Errors
///
/// * `InvalidInput` - negative or non-finite reading
/// * `DivisionByZero` - zero fan speed, measured airflow or design airflow
/// * `InvalidInput` - airflow ratio so extreme a prediction overflows
pub fn calculate_fan_law(input: &FanLawInput) -> CalcResult<FanLawResult> {
    input.validate()?;

    let q1 = input.measured_cfm;
    let q2 = input.design_cfm;
    let required_rpm = finite("required_rpm", fan_law_speed(input.fan_rpm, q1, q2))?;

    let result = FanLawResult {
        percent_of_design: checked_percent("percent of design", "design_cfm", q1, q2)?,
        required_rpm,
        rpm_change: required_rpm - input.fan_rpm,
        predicted_static_in_wg: input
            .static_pressure_in_wg
            .map(|sp| finite("predicted_static", fan_law_pressure(sp, q1, q2)))
            .transpose()?,
        predicted_bhp: input
            .fan_bhp
            .map(|bhp| finite("predicted_bhp", fan_law_power(bhp, q1, q2)))
            .transpose()?,
    };

    debug!(label = %input.label, required_rpm, "fan law");
    Ok(result)
}

/// Supply arrangement of a motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phases {
    Single,
    #[default]
    Three,
}

impl Phases {
    /// From a phase count of 1 or 3
    pub fn from_count(count: f64) -> CalcResult<Self> {
        if count == 1.0 {
            Ok(Phases::Single)
        } else if count == 3.0 {
            Ok(Phases::Three)
        } else {
            Err(CalcError::invalid_input("phases", count.to_string(), "Phases must be 1 or 3"))
        }
    }

    pub fn count(&self) -> u8 {
        match self {
            Phases::Single => 1,
            Phases::Three => 3,
        }
    }
}

/// Input for motor electrical input power.
///
/// ## JSON Example
///
/// ```json
/// { "label": "EF-2 motor", "voltage": 400.0, "current": 5.2, "power_factor": 0.85, "phases": "three" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorPowerInput {
    pub label: String,

    /// Measured line voltage (V)
    pub voltage: f64,

    /// Measured line current (A)
    pub current: f64,

    #[serde(default = "default_power_factor")]
    pub power_factor: f64,

    #[serde(default)]
    pub phases: Phases,
}

fn default_power_factor() -> f64 {
    DEFAULT_POWER_FACTOR
}

impl MotorPowerInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        check_reading("motor_voltage", self.voltage)?;
        check_reading("motor_current", self.current)?;
        if !self.power_factor.is_finite() || self.power_factor < 0.0 || self.power_factor > 1.0 {
            return Err(CalcError::invalid_input(
                "power_factor",
                self.power_factor.to_string(),
                "Power factor must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// Motor electrical input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorPowerResult {
    /// Input power (kW)
    pub input_kw: f64,

    /// Apparent power (kVA)
    pub apparent_kva: f64,
}

/// Calculate motor input power.
pub fn calculate_motor_power(input: &MotorPowerInput) -> CalcResult<MotorPowerResult> {
    input.validate()?;

    let three_phase = input.phases == Phases::Three;
    let input_kw = finite(
        "input_kw",
        motor_input_kw(input.voltage, input.current, input.power_factor, three_phase),
    )?;
    let apparent_kva = finite("apparent_kva", motor_input_kw(input.voltage, input.current, 1.0, three_phase))?;

    debug!(label = %input.label, input_kw, "motor power");
    Ok(MotorPowerResult { input_kw, apparent_kva })
}

fn check_reading(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Reading must be a non-negative number",
        ));
    }
    Ok(())
}
