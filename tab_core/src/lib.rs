//! # tab_core - HVAC Testing, Adjusting and Balancing Engine
//!
//! `tab_core` holds the calculations a balancing technician runs in the
//! field: percent of design airflow, duct traverses, coil temperature
//! splits, fan laws, motor power and proportional air balancing. Inputs and
//! results are plain JSON-serializable structs; every formula is listed in
//! the [`equations`] registry with its reference.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: calculations are pure functions of their input
//! - **Validated**: a reading is checked once on entry, never trusted twice
//! - **Handled errors**: a zero design airflow is an error value, never a panic
//! - **Deterministic**: the same readings always render the same report
//!
//! ## Quick Start
//!
//! ```rust
//! use tab_core::measurement::MeasurementRecord;
//! use tab_core::project::TabSettings;
//! use tab_core::runner::{run, CalculationKind};
//!
//! let record = MeasurementRecord::parse_str("design_cfm = 1000\nmeasured_cfm = 950").unwrap();
//! let report = run(CalculationKind::PercentOfDesign, &record, &TabSettings::default()).unwrap();
//! assert_eq!(report.headline, "95.0% of design airflow.");
//! ```
//!
//! ## Modules
//!
//! - [`measurement`] - Field catalogue and measurement records
//! - [`runner`] - Compute stage of a single calculation run
//! - [`calculations`] - Airflow, traverse, temperature, fan and balance calculations
//! - [`equations`] - Formulas and the equation registry
//! - [`procedures`] - Balancing procedure checklists
//! - [`project`] - Project container, metadata, and settings
//! - [`report`] - Text and CSV reports
//! - [`pdf`] - PDF reports via Typst
//! - [`units`] - Type-safe unit wrappers and flow units
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod file_io;
pub mod measurement;
pub mod pdf;
pub mod procedures;
pub mod project;
pub mod report;
pub mod runner;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use measurement::{Field, MeasurementRecord};
pub use project::{Project, ProjectMetadata, TabSettings};
pub use runner::{run, CalculationKind, RunReport};
