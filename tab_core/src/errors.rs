//! # Error Types
//!
//! Structured error types for tab_core. Every failure a technician can cause
//! by typing the wrong thing (a missing reading, a non-numeric value, a zero
//! design airflow) is an *input error* and is kept separate from I/O and
//! rendering failures so front ends can re-prompt or pick an exit code.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::errors::{CalcError, CalcResult};
//!
//! fn validate_area(area_sqft: f64) -> CalcResult<()> {
//!     if area_sqft <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "duct_area".to_string(),
//!             value: area_sqft.to_string(),
//!             reason: "Duct area must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tab_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A measurement value is malformed, negative, or out of range
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required measurement is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A measurement name that no calculation understands
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// A formula would divide by a zero reading (e.g. design airflow of 0)
    #[error("Division by zero: {quantity} is zero in {calculation}")]
    DivisionByZero {
        calculation: String,
        quantity: String,
    },

    /// Procedure name not in the checklist catalogue
    #[error("Unknown procedure: {name}")]
    UnknownProcedure { name: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Report rendering failed (Typst compile, PDF export)
    #[error("Report rendering failed: {reason}")]
    RenderFailed { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownField error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        CalcError::UnknownField {
            field: field.into(),
        }
    }

    /// Create a DivisionByZero error
    pub fn division_by_zero(calculation: impl Into<String>, quantity: impl Into<String>) -> Self {
        CalcError::DivisionByZero {
            calculation: calculation.into(),
            quantity: quantity.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// True for errors caused by the measurements themselves.
    ///
    /// Interactive front ends re-prompt on these; batch front ends exit
    /// with the input-error status.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::UnknownField { .. }
                | CalcError::DivisionByZero { .. }
                | CalcError::UnknownProcedure { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownField { .. } => "UNKNOWN_FIELD",
            CalcError::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            CalcError::UnknownProcedure { .. } => "UNKNOWN_PROCEDURE",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::RenderFailed { .. } => "RENDER_FAILED",
        }
    }
}
