//! # Temperature Split
//!
//! Dry-bulb difference across a coil and, when the airflow is known, the
//! sensible heat transferred.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::finite;
use crate::equations::{sensible_heat_btuh, temperature_split, Equation};
use crate::errors::{CalcError, CalcResult};
use crate::units::TemperatureScale;

/// Input for a coil temperature split.
///
/// ## JSON Example
///
/// ```json
/// { "label": "CHW coil", "entering_temp": 75.0, "leaving_temp": 55.0, "airflow_cfm": 1000.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSplitInput {
    pub label: String,

    /// Entering (on-coil) dry bulb
    pub entering_temp: f64,

    /// Leaving (off-coil) dry bulb
    pub leaving_temp: f64,

    /// Scale of both temperatures
    #[serde(default)]
    pub scale: TemperatureScale,

    /// Airflow through the coil (CFM)
    #[serde(default)]
    pub airflow_cfm: Option<f64>,
}

impl TemperatureSplitInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [("entering_air_temp", self.entering_temp), ("leaving_air_temp", self.leaving_temp)] {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(field, value.to_string(), "Temperature must be a finite number"));
            }
        }
        if let Some(cfm) = self.airflow_cfm {
            super::airflow::check_airflow("measured_cfm", cfm)?;
        }
        Ok(())
    }

    pub fn equations(&self) -> Vec<Equation> {
        let mut used = vec![Equation::TemperatureSplit];
        if self.airflow_cfm.is_some() {
            used.push(Equation::SensibleHeat);
        }
        used
    }
}

/// Results of a temperature split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSplitResult {
    /// Entering − leaving, on the input scale
    pub delta_t: f64,

    /// Scale of `delta_t`
    pub scale: TemperatureScale,

    /// Sensible heat (Btu/h); positive for cooling
    pub sensible_heat_btuh: Option<f64>,
}

/// Calculate the temperature split.
pub fn calculate(input: &TemperatureSplitInput) -> CalcResult<TemperatureSplitResult> {
    input.validate()?;

    let delta_t = finite("delta_t", temperature_split(input.entering_temp, input.leaving_temp))?;
    let delta_f = input.scale.delta_to_fahrenheit(delta_t);
    let heat = input
        .airflow_cfm
        .map(|cfm| finite("sensible_heat", sensible_heat_btuh(cfm, delta_f)))
        .transpose()?;

    debug!(label = %input.label, delta_t, ?heat, "temperature split");

    Ok(TemperatureSplitResult {
        delta_t,
        scale: input.scale,
        sensible_heat_btuh: heat,
    })
}
