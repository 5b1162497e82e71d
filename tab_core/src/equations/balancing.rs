//! # Proportional Balancing Formulas
//!
//! The proportional method keeps the index outlet (the one furthest below
//! design) fully open and throttles every other outlet until all outlets
//! read the same percentage of their design flow.
//!
//! ## References
//!
//! - AABC National Standards for Total System Balance, Chapter 9
//! - CIBSE Commissioning Code A: Air Distribution Systems

/// Target flow for an outlet once balanced to the index percentage
///
/// # Formula
/// - Q_target = Q_design × %index / 100
#[inline]
pub fn index_target_flow(outlet_design: f64, index_percent: f64) -> f64 {
    outlet_design * index_percent / 100.0
}

/// Suggested damper closure for an outlet above its target
///
/// # Formula
/// - close% = 100 × (1 − Q_target / Q_measured)   when Q_measured > Q_target
/// - close% = 0                                     otherwise
///
/// A linear first estimate; the outlet is re-measured after adjustment.
#[inline]
pub fn suggested_damper_close(measured: f64, target: f64) -> f64 {
    if measured <= 0.0 || measured <= target {
        return 0.0;
    }
    (100.0 * (1.0 - target / measured)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_target_flow() {
        assert!((index_target_flow(200.0, 85.0) - 170.0).abs() < 1e-12);
    }

    #[test]
    fn test_suggested_damper_close() {
        // Measured 200, target 170 -> close 15%
        assert!((suggested_damper_close(200.0, 170.0) - 15.0).abs() < 1e-12);
        assert_eq!(suggested_damper_close(150.0, 170.0), 0.0);
        assert_eq!(suggested_damper_close(0.0, 170.0), 0.0);
    }
}
