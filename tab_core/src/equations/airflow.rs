//! # Airflow Formulas
//!
//! Equations for converting field readings (velocity, velocity pressure,
//! duct dimensions) into volumetric airflow, and for comparing that airflow
//! against design.
//!
//! ## Notation
//!
//! - `Q` = Airflow (CFM)
//! - `V` = Average face velocity (FPM)
//! - `A` = Free area of the duct (ft²)
//! - `VP` = Velocity pressure (in. wg)
//! - `w`, `h`, `d` = Duct width, height, diameter (in)
//!
//! ## Assumptions
//!
//! - Standard air (0.075 lb/ft³, sea level, 70 °F)
//! - Velocity is the average over a proper traverse plane
//!
//! ## References
//!
//! - ASHRAE Handbook - Fundamentals, Chapter 36 (Measurement and Instruments)
//! - AABC National Standards for Total System Balance, Chapter 8

use std::f64::consts::PI;

/// Constant relating velocity pressure to velocity for standard air
///
/// V = 4005·√VP comes from V = 1096.7·√(VP/ρ) with ρ = 0.075 lb/ft³.
pub const STANDARD_AIR_VELOCITY_CONSTANT: f64 = 4005.0;

/// Percentage of design airflow
///
/// # Formula
/// - %Design = Q_measured / Q_design × 100
///
/// Returns `inf`/`NaN` like any other float division when the design is
/// zero or tiny; calculations go through `checked_percent` instead.
#[inline]
pub fn percent_of_design(measured: f64, design: f64) -> f64 {
    measured / design * 100.0
}

/// Airflow through a duct from average velocity and area
///
/// # Formula
/// - Q = V × A
///
/// # Arguments
/// * `velocity_fpm` - Average velocity (FPM)
/// * `area_sqft` - Free area (ft²)
#[inline]
pub fn airflow_from_velocity(velocity_fpm: f64, area_sqft: f64) -> f64 {
    velocity_fpm * area_sqft
}

/// Free area of a rectangular duct in ft² from inside dimensions in inches
///
/// ```text
///    ┌──────── w ────────┐
///    │                   │ h
///    └───────────────────┘
/// ```
///
/// # Formula
/// - A = w·h / 144
#[inline]
pub fn rectangular_duct_area(width_in: f64, height_in: f64) -> f64 {
    width_in * height_in / 144.0
}

/// Free area of a round duct in ft² from inside diameter in inches
///
/// # Formula
/// - A = π·d² / 4 / 144
#[inline]
pub fn round_duct_area(diameter_in: f64) -> f64 {
    PI * diameter_in * diameter_in / 4.0 / 144.0
}

/// Velocity from a pitot-tube velocity pressure reading (standard air)
///
/// # Formula
/// - V = 4005 × √VP
#[inline]
pub fn velocity_from_pressure(velocity_pressure_in_wg: f64) -> f64 {
    STANDARD_AIR_VELOCITY_CONSTANT * velocity_pressure_in_wg.sqrt()
}

/// Arithmetic mean of traverse point velocities
///
/// Returns `None` for an empty traverse.
pub fn traverse_average(velocities_fpm: &[f64]) -> Option<f64> {
    if velocities_fpm.is_empty() {
        return None;
    }
    Some(velocities_fpm.iter().sum::<f64>() / velocities_fpm.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_design() {
        assert!((percent_of_design(950.0, 1000.0) - 95.0).abs() < 1e-12);
        assert!((percent_of_design(1100.0, 1000.0) - 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_airflow_from_velocity() {
        // 24x12 duct = 2 ft², 800 FPM -> 1600 CFM
        let area = rectangular_duct_area(24.0, 12.0);
        assert!((area - 2.0).abs() < 1e-12);
        assert!((airflow_from_velocity(800.0, area) - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_duct_area() {
        // 12" round = 0.7854 ft²
        assert!((round_duct_area(12.0) - 0.785_398).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_from_pressure() {
        // VP = 0.04 in. wg -> 4005 × 0.2 = 801 FPM
        assert!((velocity_from_pressure(0.04) - 801.0).abs() < 1e-9);
        assert_eq!(velocity_from_pressure(0.0), 0.0);
    }

    #[test]
    fn test_traverse_average() {
        assert_eq!(traverse_average(&[]), None);
        let avg = traverse_average(&[780.0, 820.0, 800.0, 800.0]).unwrap();
        assert!((avg - 800.0).abs() < 1e-12);
    }
}
