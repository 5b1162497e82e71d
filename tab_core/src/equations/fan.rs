//! # Fan and Motor Formulas
//!
//! Fan affinity laws for re-sheaving a fan to design airflow, and motor
//! input power from measured volts and amps.
//!
//! ## Notation
//!
//! - Subscript 1 = measured condition, subscript 2 = design condition
//! - `Q` = Airflow, `N` = Fan speed (RPM), `SP` = Static pressure, `BHP` = Brake horsepower
//!
//! ## Assumptions
//!
//! - Same fan, same system curve, constant air density
//!
//! ## References
//!
//! - ASHRAE Handbook - HVAC Systems and Equipment, Chapter 21 (Fans)
//! - AABC National Standards for Total System Balance, Chapter 8

/// Fan speed required to deliver a new airflow (first fan law)
///
/// # Formula
/// - N₂ = N₁ × (Q₂ / Q₁)
#[inline]
pub fn fan_law_speed(rpm1: f64, q1: f64, q2: f64) -> f64 {
    rpm1 * (q2 / q1)
}

/// Static pressure at the new airflow (second fan law)
///
/// # Formula
/// - SP₂ = SP₁ × (Q₂ / Q₁)²
#[inline]
pub fn fan_law_pressure(sp1: f64, q1: f64, q2: f64) -> f64 {
    sp1 * (q2 / q1).powi(2)
}

/// Brake horsepower at the new airflow (third fan law)
///
/// # Formula
/// - BHP₂ = BHP₁ × (Q₂ / Q₁)³
#[inline]
pub fn fan_law_power(bhp1: f64, q1: f64, q2: f64) -> f64 {
    bhp1 * (q2 / q1).powi(3)
}

/// Electrical input power of a motor in kW
///
/// # Formulas
/// - Three-phase: P = √3 × V × I × PF / 1000
/// - Single-phase: P = V × I × PF / 1000
///
/// # Arguments
/// * `volts` - Measured line voltage (V)
/// * `amps` - Measured line current (A)
/// * `power_factor` - Motor power factor (0..1)
/// * `three_phase` - True for a three-phase supply
#[inline]
pub fn motor_input_kw(volts: f64, amps: f64, power_factor: f64, three_phase: bool) -> f64 {
    let phase_factor = if three_phase { 3.0_f64.sqrt() } else { 1.0 };
    phase_factor * volts * amps * power_factor / 1000.0
}
