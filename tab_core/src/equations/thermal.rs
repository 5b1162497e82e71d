//! # Thermal Formulas
//!
//! Coil temperature split and air-side sensible heat.
//!
//! ## References
//!
//! - ASHRAE Handbook - Fundamentals, Chapter 1 (Psychrometrics)

/// Standard-air sensible heat factor (Btu/h per CFM per °F)
///
/// 1.08 = 0.075 lb/ft³ × 60 min/h × 0.24 Btu/lb·°F
pub const SENSIBLE_HEAT_FACTOR: f64 = 1.08;

/// Temperature split across a coil
///
/// # Formula
/// - ΔT = T_entering − T_leaving
///
/// Positive for a cooling coil, negative for a heating coil.
#[inline]
pub fn temperature_split(entering: f64, leaving: f64) -> f64 {
    entering - leaving
}

/// Air-side sensible heat transfer
///
/// # Formula
/// - Q_s = 1.08 × CFM × ΔT
///
/// # Arguments
/// * `cfm` - Airflow across the coil (CFM)
/// * `delta_t_f` - Temperature split (°F)
///
/// # Returns
/// Sensible heat in Btu/h (sign follows ΔT)
#[inline]
pub fn sensible_heat_btuh(cfm: f64, delta_t_f: f64) -> f64 {
    SENSIBLE_HEAT_FACTOR * cfm * delta_t_f
}
