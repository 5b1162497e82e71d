//! # TAB Equations
//!
//! All formulas applied to field readings live here, as plain `f64`
//! functions. Calculations validate their inputs (non-negative readings,
//! non-zero denominators) before calling into these.
//!
//! ## Modules
//!
//! - [`airflow`] - Duct area, velocity, airflow, percent of design
//! - [`balancing`] - Proportional balancing targets and damper suggestions
//! - [`thermal`] - Temperature split and sensible heat
//! - [`fan`] - Fan affinity laws and motor input power
//! - [`registry`] - Equation metadata and usage tracking for reports
//!
//! ## References
//!
//! - ASHRAE Handbook - Fundamentals (2021)
//! - ASHRAE Handbook - HVAC Systems and Equipment (2020)
//! - AABC National Standards for Total System Balance, 7th Edition
//! - CIBSE Commissioning Code A: Air Distribution Systems

pub mod airflow;
pub mod balancing;
pub mod fan;
pub mod registry;
pub mod thermal;

pub use airflow::{
    airflow_from_velocity,
    percent_of_design,
    rectangular_duct_area,
    round_duct_area,
    traverse_average,
    velocity_from_pressure,
};

pub use balancing::{index_target_flow, suggested_damper_close};

pub use fan::{fan_law_power, fan_law_pressure, fan_law_speed, motor_input_kw};

pub use thermal::{sensible_heat_btuh, temperature_split};

pub use registry::{
    CodeReference,
    Equation,
    EquationCategory,
    EquationMetadata,
    EquationTracker,
    EquationUsage,
    Variable,
    ALL_EQUATIONS,
    generate_equations_markdown,
};
