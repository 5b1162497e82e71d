//! # Duct Traverse
//!
//! Airflow in a duct from a velocity traverse. Readings are either direct
//! anemometer velocities (FPM) or pitot-tube velocity pressures (in. wg),
//! which are converted to velocity point by point before averaging.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::calculations::duct::{DuctGeometry, DuctTraverseInput, TraverseReadings, calculate};
//!
//! let input = DuctTraverseInput {
//!     label: "Main supply".to_string(),
//!     geometry: Some(DuctGeometry::Rectangular { width_in: 24.0, height_in: 12.0 }),
//!     readings: TraverseReadings::Velocity(vec![480.0, 520.0, 500.0]),
//!     design_cfm: Some(1000.0),
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.area_sqft.unwrap() - 2.0).abs() < 1e-12);
//! assert!((result.airflow_cfm.unwrap() - 1000.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{checked_percent, finite};
use crate::equations::{
    airflow_from_velocity,
    rectangular_duct_area,
    round_duct_area,
    traverse_average,
    velocity_from_pressure,
    Equation,
};
use crate::errors::{CalcError, CalcResult};

/// Cross-section of the traversed duct
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DuctGeometry {
    /// Rectangular duct, inside dimensions in inches
    Rectangular { width_in: f64, height_in: f64 },
    /// Round duct, inside diameter in inches
    Round { diameter_in: f64 },
    /// Free area known directly (ft²), e.g. from a grille schedule
    Area { area_sqft: f64 },
}

impl DuctGeometry {
    /// Free area in ft²
    pub fn area_sqft(&self) -> f64 {
        match *self {
            DuctGeometry::Rectangular { width_in, height_in } => rectangular_duct_area(width_in, height_in),
            DuctGeometry::Round { diameter_in } => round_duct_area(diameter_in),
            DuctGeometry::Area { area_sqft } => area_sqft,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        match *self {
            DuctGeometry::Rectangular { width_in, height_in } => {
                check_dimension("duct_width", width_in)?;
                check_dimension("duct_height", height_in)
            }
            DuctGeometry::Round { diameter_in } => check_dimension("duct_diameter", diameter_in),
            DuctGeometry::Area { area_sqft } => check_dimension("duct_area", area_sqft),
        }
    }

    /// Short description for reports, e.g. "24 x 12 in"
    pub fn describe(&self) -> String {
        match *self {
            DuctGeometry::Rectangular { width_in, height_in } => format!("{} x {} in", width_in, height_in),
            DuctGeometry::Round { diameter_in } => format!("{} in dia.", diameter_in),
            DuctGeometry::Area { area_sqft } => format!("{} ft²", area_sqft),
        }
    }
}

/// Traverse point readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum TraverseReadings {
    /// Point velocities (FPM)
    Velocity(Vec<f64>),
    /// Point velocity pressures (in. wg)
    VelocityPressure(Vec<f64>),
}

impl TraverseReadings {
    fn points(&self) -> &[f64] {
        match self {
            TraverseReadings::Velocity(points) | TraverseReadings::VelocityPressure(points) => points,
        }
    }

    fn field(&self) -> &'static str {
        match self {
            TraverseReadings::Velocity(_) => "velocity",
            TraverseReadings::VelocityPressure(_) => "velocity_pressure",
        }
    }
}

/// Input for a duct traverse.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Main supply",
///   "geometry": { "shape": "round", "diameter_in": 14.0 },
///   "readings": { "kind": "velocity_pressure", "points": [0.06, 0.065, 0.058] },
///   "design_cfm": 1000.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuctTraverseInput {
    pub label: String,

    /// Duct cross-section; without it only velocity is reported
    #[serde(default)]
    pub geometry: Option<DuctGeometry>,

    pub readings: TraverseReadings,

    #[serde(default)]
    pub design_cfm: Option<f64>,
}

impl DuctTraverseInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        let field = self.readings.field();
        let points = self.readings.points();
        if points.is_empty() {
            return Err(CalcError::missing_field(field));
        }
        for &value in points {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Traverse readings must be non-negative numbers",
                ));
            }
        }
        if let Some(geometry) = &self.geometry {
            geometry.validate()?;
        }
        if let Some(design) = self.design_cfm {
            super::airflow::check_airflow("design_cfm", design)?;
            if design == 0.0 {
                return Err(CalcError::division_by_zero("percent of design", "design_cfm"));
            }
        }
        Ok(())
    }

    /// Equations applied by this traverse, for the report appendix
    pub fn equations(&self) -> Vec<Equation> {
        let mut used = Vec::new();
        if let TraverseReadings::VelocityPressure(_) = self.readings {
            used.push(Equation::PitotVelocity);
        }
        if self.readings.points().len() > 1 {
            used.push(Equation::TraverseAverage);
        }
        if let Some(geometry) = &self.geometry {
            match geometry {
                DuctGeometry::Rectangular { .. } => used.push(Equation::RectangularDuctArea),
                DuctGeometry::Round { .. } => used.push(Equation::RoundDuctArea),
                DuctGeometry::Area { .. } => {}
            }
            used.push(Equation::AirflowFromVelocity);
            if self.design_cfm.is_some() {
                used.push(Equation::PercentOfDesign);
            }
        }
        used
    }
}

/// Results of a duct traverse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuctTraverseResult {
    /// Number of traverse points
    pub points: usize,

    /// Mean point velocity (FPM)
    pub average_velocity_fpm: f64,

    /// Free area (ft²), when geometry was given
    pub area_sqft: Option<f64>,

    /// Airflow (CFM), when geometry was given
    pub airflow_cfm: Option<f64>,

    /// Percent of design, when both area and design were given
    pub percent_of_design: Option<f64>,
}

/// Calculate duct airflow from a traverse.
///
/// # Errors
///
/// * `MissingField` - no traverse points
/// * `InvalidInput` - negative reading or dimension, or readings so large the
///   airflow overflows
/// * `DivisionByZero` - design airflow given as zero
pub fn calculate(input: &DuctTraverseInput) -> CalcResult<DuctTraverseResult> {
    input.validate()?;

    let velocities: Vec<f64> = match &input.readings {
        TraverseReadings::Velocity(points) => points.clone(),
        TraverseReadings::VelocityPressure(points) => points.iter().map(|&vp| velocity_from_pressure(vp)).collect(),
    };
    let average = traverse_average(&velocities).ok_or_else(|| CalcError::missing_field(input.readings.field()))?;
    let average = finite("average_velocity", average)?;

    let area = input
        .geometry
        .as_ref()
        .map(|g| finite("duct_area", g.area_sqft()))
        .transpose()?;
    let airflow = area
        .map(|a| finite("airflow_cfm", airflow_from_velocity(average, a)))
        .transpose()?;
    let percent = match (airflow, input.design_cfm) {
        (Some(q), Some(design)) => Some(checked_percent("percent of design", "design_cfm", q, design)?),
        _ => None,
    };

    debug!(label = %input.label, points = velocities.len(), average, ?airflow, "duct traverse");

    Ok(DuctTraverseResult {
        points: velocities.len(),
        average_velocity_fpm: average,
        area_sqft: area,
        airflow_cfm: airflow,
        percent_of_design: percent,
    })
}

fn check_dimension(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Duct dimensions must be non-negative numbers",
        ));
    }
    Ok(())
}
