//! # Balancing Procedures
//!
//! Condensed method-statement checklists for each kind of air system a
//! technician balances. A balancing sheet records which steps are done.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::procedures::ProcedureType;
//!
//! let fcu = ProcedureType::from_str_flexible("fcu").unwrap();
//! assert_eq!(fcu, ProcedureType::FanCoilUnit);
//! assert_eq!(fcu.steps()[0], "Check automatic controls commissioned & operating");
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Kind of system being balanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcedureType {
    /// Fan Coil Unit (FCU)
    #[default]
    FanCoilUnit,
    /// Air Handling Unit (AHU)
    AirHandlingUnit,
    /// Ventilation / Extract Fan
    ExtractFan,
    /// Air Terminals (Diffusers/Grilles)
    AirTerminals,
    /// Staircase Pressurization Fan
    PressurizationFan,
}

const FCU_STEPS: &[&str] = &[
    "Check automatic controls commissioned & operating",
    "Ensure pre-commissioning checks are complete",
    "Select specified fan speed",
    "Open all outlet dampers fully",
    "Take initial total flow (sum outlets)",
    "Compare vs design flow (compute %)",
    "Identify index outlet (lowest %)",
    "Keep index outlet damper fully open",
    "Throttle other outlets proportionally using flow hood",
    "Measure index each time until balanced",
    "Record final readings & save records",
];

const AHU_STEPS: &[&str] = &[
    "Set fan RPM to provide design total air quantity",
    "Ensure fan current ≤ manufacturer limits",
    "Open all main & branch dampers fully",
    "Check total flow by traverse method (set to 105% of design)",
    "Identify index branch",
    "Balance branches proportionally using VCDs",
    "Record fan RPM, motor V/A, entering/leaving static pressures",
];

const EXTRACT_STEPS: &[&str] = &[
    "Pre-commissioning checks complete",
    "Measure motor amperes & fan RPM",
    "Ensure speed/current within allowable range",
    "Open main & branch dampers fully",
    "Check total flow by traverse (105% of design)",
    "Identify index branch & balance branches",
    "Record index branch and final results",
];

const TERMINAL_STEPS: &[&str] = &[
    "Measure flow at each outlet (flow hood preferred)",
    "Find index terminal (lowest percentage)",
    "Adjust other outlets proportionally to index",
    "Re-measure and record terminal flows",
    "Sum to check total vs branch measured flow",
];

const PRESSURIZATION_STEPS: &[&str] = &[
    "Pre-commissioning checks complete",
    "Ensure fire alarm interfacing verified",
    "Open all outlet dampers fully",
    "Take initial outlet readings (sum)",
    "Identify index outlet",
    "Keep index open, throttle others proportionally",
    "Balance outlets proportionally and record readings",
    "Measure differential pressure between floor & stair",
];

// Lower-cased, separator-normalised aliases accepted on the command line
static ALIASES: Lazy<HashMap<&'static str, ProcedureType>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (alias, kind) in [
        ("fcu", ProcedureType::FanCoilUnit),
        ("fan-coil-unit", ProcedureType::FanCoilUnit),
        ("ahu", ProcedureType::AirHandlingUnit),
        ("air-handling-unit", ProcedureType::AirHandlingUnit),
        ("extract", ProcedureType::ExtractFan),
        ("extract-fan", ProcedureType::ExtractFan),
        ("ventilation", ProcedureType::ExtractFan),
        ("ventilation-fan", ProcedureType::ExtractFan),
        ("terminals", ProcedureType::AirTerminals),
        ("air-terminals", ProcedureType::AirTerminals),
        ("diffusers", ProcedureType::AirTerminals),
        ("pressurization", ProcedureType::PressurizationFan),
        ("pressurization-fan", ProcedureType::PressurizationFan),
        ("stair-pressurization", ProcedureType::PressurizationFan),
    ] {
        map.insert(alias, kind);
    }
    map
});

impl ProcedureType {
    /// All procedure types, in menu order
    pub const ALL: [ProcedureType; 5] = [
        ProcedureType::FanCoilUnit,
        ProcedureType::AirHandlingUnit,
        ProcedureType::ExtractFan,
        ProcedureType::AirTerminals,
        ProcedureType::PressurizationFan,
    ];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcedureType::FanCoilUnit => "Fan Coil Unit (FCU)",
            ProcedureType::AirHandlingUnit => "Air Handling Unit (AHU)",
            ProcedureType::ExtractFan => "Ventilation / Extract Fan",
            ProcedureType::AirTerminals => "Air Terminals (Diffusers/Grilles)",
            ProcedureType::PressurizationFan => "Pressurization Fan (Staircase)",
        }
    }

    /// Short code used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            ProcedureType::FanCoilUnit => "fcu",
            ProcedureType::AirHandlingUnit => "ahu",
            ProcedureType::ExtractFan => "extract",
            ProcedureType::AirTerminals => "terminals",
            ProcedureType::PressurizationFan => "pressurization",
        }
    }

    /// Checklist steps in the order they are carried out
    pub fn steps(&self) -> &'static [&'static str] {
        match self {
            ProcedureType::FanCoilUnit => FCU_STEPS,
            ProcedureType::AirHandlingUnit => AHU_STEPS,
            ProcedureType::ExtractFan => EXTRACT_STEPS,
            ProcedureType::AirTerminals => TERMINAL_STEPS,
            ProcedureType::PressurizationFan => PRESSURIZATION_STEPS,
        }
    }

    /// True for fan systems whose total is set by traverse above design
    pub fn uses_total_traverse(&self) -> bool {
        matches!(self, ProcedureType::AirHandlingUnit | ProcedureType::ExtractFan)
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let key = s.trim().to_lowercase().replace([' ', '_', '/'], "-");
        ALIASES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| CalcError::UnknownProcedure { name: s.to_string() })
    }
}

impl std::fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Completed steps for one procedure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    /// Zero-based indices of completed steps, kept sorted
    pub completed: Vec<usize>,
}

impl Checklist {
    /// Mark a step as done.
    pub fn complete(&mut self, procedure: ProcedureType, step: usize) -> CalcResult<()> {
        validate_step(procedure, step)?;
        if let Err(pos) = self.completed.binary_search(&step) {
            self.completed.insert(pos, step);
        }
        Ok(())
    }

    /// Check every recorded index against the procedure's step list.
    pub fn validate(&self, procedure: ProcedureType) -> CalcResult<()> {
        self.completed
            .iter()
            .try_for_each(|&step| validate_step(procedure, step))
    }

    pub fn is_done(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    /// Steps still outstanding, as (index, text)
    pub fn outstanding(&self, procedure: ProcedureType) -> Vec<(usize, &'static str)> {
        procedure
            .steps()
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_done(*i))
            .map(|(i, s)| (i, *s))
            .collect()
    }
}

fn validate_step(procedure: ProcedureType, step: usize) -> CalcResult<()> {
    let count = procedure.steps().len();
    if step >= count {
        return Err(CalcError::invalid_input(
            "checklist.completed",
            step.to_string(),
            format!("{} has {} steps (0-{})", procedure.display_name(), count, count - 1),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counts() {
        assert_eq!(ProcedureType::FanCoilUnit.steps().len(), 11);
        assert_eq!(ProcedureType::AirHandlingUnit.steps().len(), 7);
        assert_eq!(ProcedureType::ExtractFan.steps().len(), 7);
        assert_eq!(ProcedureType::AirTerminals.steps().len(), 5);
        assert_eq!(ProcedureType::PressurizationFan.steps().len(), 8);
    }

    #[test]
    fn test_from_str_flexible() {
        assert_eq!(ProcedureType::from_str_flexible("AHU").unwrap(), ProcedureType::AirHandlingUnit);
        assert_eq!(
            ProcedureType::from_str_flexible("Air Terminals").unwrap(),
            ProcedureType::AirTerminals
        );
        assert_eq!(
            ProcedureType::from_str_flexible("stair_pressurization").unwrap(),
            ProcedureType::PressurizationFan
        );
        let err = ProcedureType::from_str_flexible("chiller").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PROCEDURE");
    }

    #[test]
    fn test_every_code_parses_back() {
        for kind in ProcedureType::ALL {
            assert_eq!(ProcedureType::from_str_flexible(kind.code()).unwrap(), kind);
        }
    }

    #[test]
    fn test_checklist_completion() {
        let mut checklist = Checklist::default();
        checklist.complete(ProcedureType::AirTerminals, 3).unwrap();
        checklist.complete(ProcedureType::AirTerminals, 0).unwrap();
        checklist.complete(ProcedureType::AirTerminals, 3).unwrap();
        assert_eq!(checklist.completed, vec![0, 3]);

        let outstanding = checklist.outstanding(ProcedureType::AirTerminals);
        assert_eq!(outstanding.len(), 3);
        assert_eq!(outstanding[0].0, 1);
    }

    #[test]
    fn test_checklist_out_of_range() {
        let mut checklist = Checklist::default();
        assert!(checklist.complete(ProcedureType::AirTerminals, 5).is_err());

        let bad = Checklist { completed: vec![0, 9] };
        assert!(bad.validate(ProcedureType::AirHandlingUnit).is_err());
        assert!(bad.validate(ProcedureType::FanCoilUnit).is_ok());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&ProcedureType::PressurizationFan).unwrap();
        assert_eq!(json, "\"pressurization-fan\"");
    }
}
