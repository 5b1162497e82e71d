//! # Unit Types
//!
//! Type-safe wrappers for the airflow units a balancing technician reads off
//! an instrument. These provide compile-time safety against unit confusion
//! while remaining lightweight (just f64 wrappers).
//!
//! Formulas are written in the units used on US TAB report forms (CFM, FPM,
//! ft², in. wg, Btu/h). Metric airflow (m³/s, m³/h, L/s) converts through
//! the `From` impls below. [`FlowUnit`] is the runtime selector used when a
//! whole balancing sheet is entered in one unit.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::units::{Cfm, LitresPerSec, M3PerSec};
//!
//! let supply = Cfm(1000.0);
//! let si: M3PerSec = supply.into();
//! assert!((si.0 - 0.471_947).abs() < 1e-6);
//!
//! let ls: LitresPerSec = si.into();
//! assert!((ls.0 - 471.947).abs() < 1e-3);
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Cubic metres per second in one CFM
pub const M3S_PER_CFM: f64 = 0.000_471_947_45;

// ============================================================================
// Airflow Units
// ============================================================================

/// Airflow in cubic feet per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cfm(pub f64);

/// Airflow in cubic metres per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct M3PerSec(pub f64);

/// Airflow in cubic metres per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct M3PerHour(pub f64);

/// Airflow in litres per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LitresPerSec(pub f64);

impl From<Cfm> for M3PerSec {
    fn from(cfm: Cfm) -> Self {
        M3PerSec(cfm.0 * M3S_PER_CFM)
    }
}

impl From<M3PerSec> for Cfm {
    fn from(q: M3PerSec) -> Self {
        Cfm(q.0 / M3S_PER_CFM)
    }
}

impl From<M3PerHour> for M3PerSec {
    fn from(q: M3PerHour) -> Self {
        M3PerSec(q.0 / 3600.0)
    }
}

impl From<M3PerSec> for M3PerHour {
    fn from(q: M3PerSec) -> Self {
        M3PerHour(q.0 * 3600.0)
    }
}

impl From<LitresPerSec> for M3PerSec {
    fn from(q: LitresPerSec) -> Self {
        M3PerSec(q.0 / 1000.0)
    }
}

impl From<M3PerSec> for LitresPerSec {
    fn from(q: M3PerSec) -> Self {
        LitresPerSec(q.0 * 1000.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), Add::add)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Cfm);
impl_arithmetic!(M3PerSec);
impl_arithmetic!(M3PerHour);
impl_arithmetic!(LitresPerSec);

// ============================================================================
// Runtime Unit Selectors
// ============================================================================

/// Airflow unit chosen for a balancing sheet.
///
/// Readings are stored as entered and normalised to m³/s for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlowUnit {
    #[default]
    #[serde(rename = "CFM")]
    Cfm,
    #[serde(rename = "m3/s")]
    M3PerSec,
    #[serde(rename = "m3/h")]
    M3PerHour,
    #[serde(rename = "L/s")]
    LitresPerSec,
}

impl FlowUnit {
    /// All selectable units, in menu order
    pub const ALL: [FlowUnit; 4] = [
        FlowUnit::Cfm,
        FlowUnit::M3PerSec,
        FlowUnit::M3PerHour,
        FlowUnit::LitresPerSec,
    ];

    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            FlowUnit::Cfm => "CFM",
            FlowUnit::M3PerSec => "m3/s",
            FlowUnit::M3PerHour => "m3/h",
            FlowUnit::LitresPerSec => "L/s",
        }
    }

    /// Convert a reading in this unit to m³/s
    pub fn to_m3s(&self, value: f64) -> M3PerSec {
        match self {
            FlowUnit::Cfm => Cfm(value).into(),
            FlowUnit::M3PerSec => M3PerSec(value),
            FlowUnit::M3PerHour => M3PerHour(value).into(),
            FlowUnit::LitresPerSec => LitresPerSec(value).into(),
        }
    }

    /// Convert m³/s back to a reading in this unit
    pub fn from_m3s(&self, flow: M3PerSec) -> f64 {
        match self {
            FlowUnit::Cfm => Cfm::from(flow).0,
            FlowUnit::M3PerSec => flow.0,
            FlowUnit::M3PerHour => M3PerHour::from(flow).0,
            FlowUnit::LitresPerSec => LitresPerSec::from(flow).0,
        }
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlowUnit {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cfm" => Ok(FlowUnit::Cfm),
            "m3/s" | "m3s" => Ok(FlowUnit::M3PerSec),
            "m3/h" | "m3h" | "cmh" => Ok(FlowUnit::M3PerHour),
            "l/s" | "ls" | "lps" => Ok(FlowUnit::LitresPerSec),
            other => Err(CalcError::invalid_input(
                "flow_unit",
                other,
                "Expected one of CFM, m3/s, m3/h, L/s",
            )),
        }
    }
}

/// Temperature scale for dry-bulb readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureScale {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureScale {
    /// Unit symbol for reports
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureScale::Fahrenheit => "°F",
            TemperatureScale::Celsius => "°C",
        }
    }

    /// Convert a temperature *difference* on this scale to °F
    pub fn delta_to_fahrenheit(&self, delta: f64) -> f64 {
        match self {
            TemperatureScale::Fahrenheit => delta,
            TemperatureScale::Celsius => delta * 1.8,
        }
    }
}
