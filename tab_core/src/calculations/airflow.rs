//! # Airflow Check
//!
//! Compares a measured airflow against design: percent of design, deviation,
//! and whether the reading sits inside the project's tolerance band.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::calculations::airflow::{AirflowCheckInput, calculate};
//!
//! let input = AirflowCheckInput {
//!     label: "AHU-1 supply".to_string(),
//!     design_cfm: 1000.0,
//!     measured_cfm: 950.0,
//! };
//!
//! let result = calculate(&input, 10.0).unwrap();
//! assert_eq!(result.summary(), "95.0% of design airflow.");
//! assert!(result.within_tolerance);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::checked_percent;
use crate::errors::{CalcError, CalcResult};

/// Input for a single percent-of-design check.
///
/// ## JSON Example
///
/// ```json
/// { "label": "AHU-1 supply", "design_cfm": 1000.0, "measured_cfm": 950.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirflowCheckInput {
    /// User label (e.g., "AHU-1 supply", "Branch B")
    pub label: String,

    /// Design airflow (CFM)
    pub design_cfm: f64,

    /// Measured airflow (CFM)
    pub measured_cfm: f64,
}

impl AirflowCheckInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        check_airflow("design_cfm", self.design_cfm)?;
        check_airflow("measured_cfm", self.measured_cfm)?;
        if self.design_cfm == 0.0 {
            return Err(CalcError::division_by_zero("percent of design", "design_cfm"));
        }
        Ok(())
    }
}

/// Results of an airflow check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirflowCheckResult {
    /// Measured / design × 100
    pub percent_of_design: f64,

    /// Measured − design (CFM)
    pub deviation_cfm: f64,

    /// Tolerance band used (± percent)
    pub tolerance_pct: f64,

    /// True when |percent − 100| ≤ tolerance
    pub within_tolerance: bool,
}

impl AirflowCheckResult {
    /// One-line report headline, e.g. "95.0% of design airflow."
    pub fn summary(&self) -> String {
        format!("{:.1}% of design airflow.", self.percent_of_design)
    }
}

/// Check a measured airflow against design.
///
/// # Errors
///
/// * `InvalidInput` - negative or non-finite airflow
/// * `DivisionByZero` - design airflow is zero
/// * `InvalidInput` - design airflow so small the percentage overflows
pub fn calculate(input: &AirflowCheckInput, tolerance_pct: f64) -> CalcResult<AirflowCheckResult> {
    input.validate()?;

    let percent = checked_percent("percent of design", "design_cfm", input.measured_cfm, input.design_cfm)?;
    let result = AirflowCheckResult {
        percent_of_design: percent,
        deviation_cfm: input.measured_cfm - input.design_cfm,
        tolerance_pct,
        within_tolerance: (percent - 100.0).abs() <= tolerance_pct,
    };

    debug!(label = %input.label, percent, "airflow check");
    Ok(result)
}

pub(crate) fn check_airflow(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Airflow must be a non-negative number",
        ));
    }
    Ok(())
}
