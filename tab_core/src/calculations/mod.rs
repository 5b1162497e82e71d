//! # TAB Calculations
//!
//! Every field calculation follows the same pattern:
//!
//! - `*Input` - readings as entered (JSON-serializable)
//! - `*Result` - derived values (JSON-serializable)
//! - `calculate(input) -> CalcResult<*Result>` - pure function, validates first
//!
//! ## Available Calculations
//!
//! - [`airflow`] - Measured vs design airflow
//! - [`duct`] - Duct traverse (anemometer or pitot)
//! - [`temperature`] - Coil temperature split and sensible heat
//! - [`fan`] - Fan-law speed reset and motor input power
//! - [`balance`] - Proportional balancing sheet

pub mod airflow;
pub mod balance;
pub mod duct;
pub mod fan;
pub mod temperature;

use serde::{Deserialize, Serialize};

use crate::equations::{percent_of_design, Equation};
use crate::errors::{CalcError, CalcResult};
use crate::project::TabSettings;

pub use airflow::{AirflowCheckInput, AirflowCheckResult};
pub use balance::{BalanceInput, BalanceResult, FanReadings, OutletReading, OutletResult};
pub use duct::{DuctGeometry, DuctTraverseInput, DuctTraverseResult, TraverseReadings};
pub use fan::{FanLawInput, FanLawResult, MotorPowerInput, MotorPowerResult, Phases};
pub use temperature::{TemperatureSplitInput, TemperatureSplitResult};

/// Enum wrapper for all calculation types.
///
/// Lets a project store heterogeneous calculations in one collection while
/// keeping a clean tagged JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    AirflowCheck(AirflowCheckInput),
    DuctTraverse(DuctTraverseInput),
    TemperatureSplit(TemperatureSplitInput),
    FanLaw(FanLawInput),
    MotorPower(MotorPowerInput),
    Balance(BalanceInput),
}

/// Result of evaluating a [`CalculationItem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemResult {
    AirflowCheck(AirflowCheckResult),
    DuctTraverse(DuctTraverseResult),
    TemperatureSplit(TemperatureSplitResult),
    FanLaw(FanLawResult),
    MotorPower(MotorPowerResult),
    Balance(BalanceResult),
}

impl CalculationItem {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::AirflowCheck(c) => &c.label,
            CalculationItem::DuctTraverse(c) => &c.label,
            CalculationItem::TemperatureSplit(c) => &c.label,
            CalculationItem::FanLaw(c) => &c.label,
            CalculationItem::MotorPower(c) => &c.label,
            CalculationItem::Balance(c) => &c.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::AirflowCheck(_) => "Airflow Check",
            CalculationItem::DuctTraverse(_) => "Duct Traverse",
            CalculationItem::TemperatureSplit(_) => "Temperature Split",
            CalculationItem::FanLaw(_) => "Fan Law",
            CalculationItem::MotorPower(_) => "Motor Power",
            CalculationItem::Balance(_) => "Air Balance",
        }
    }

    /// Evaluate with the project's settings.
    pub fn evaluate(&self, settings: &TabSettings) -> CalcResult<ItemResult> {
        Ok(match self {
            CalculationItem::AirflowCheck(c) => ItemResult::AirflowCheck(airflow::calculate(c, settings.tolerance_pct)?),
            CalculationItem::DuctTraverse(c) => ItemResult::DuctTraverse(duct::calculate(c)?),
            CalculationItem::TemperatureSplit(c) => ItemResult::TemperatureSplit(temperature::calculate(c)?),
            CalculationItem::FanLaw(c) => ItemResult::FanLaw(fan::calculate_fan_law(c)?),
            CalculationItem::MotorPower(c) => ItemResult::MotorPower(fan::calculate_motor_power(c)?),
            CalculationItem::Balance(c) => ItemResult::Balance(balance::calculate(c)?),
        })
    }

    /// Equations this item applies, for the report appendix
    pub fn equations(&self) -> Vec<Equation> {
        match self {
            CalculationItem::AirflowCheck(_) => vec![Equation::PercentOfDesign],
            CalculationItem::DuctTraverse(c) => c.equations(),
            CalculationItem::TemperatureSplit(c) => c.equations(),
            CalculationItem::FanLaw(c) => c.equations(),
            CalculationItem::MotorPower(_) => vec![Equation::MotorInputPower],
            CalculationItem::Balance(c) => c.equations(),
        }
    }
}

/// Reject a derived quantity that overflowed to `inf` or `NaN`.
pub(crate) fn finite(quantity: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid_input(
            quantity,
            value.to_string(),
            "Result is out of range for the readings given",
        ))
    }
}

/// Percent of design with the denominator checked as used.
///
/// `design` is the value after any unit conversion, so a design that
/// underflows to zero is still a division by zero.
pub(crate) fn checked_percent(calculation: &str, quantity: &str, measured: f64, design: f64) -> CalcResult<f64> {
    if design.is_nan() || design <= 0.0 {
        return Err(CalcError::division_by_zero(calculation, quantity));
    }
    let percent = percent_of_design(measured, design);
    if percent.is_finite() {
        Ok(percent)
    } else {
        Err(CalcError::invalid_input(
            quantity,
            design.to_string(),
            "Design value is too small to divide by",
        ))
    }
}
