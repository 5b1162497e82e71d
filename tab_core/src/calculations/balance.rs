//! # Proportional Air Balance
//!
//! A balancing sheet for one system: design flow, outlet (or branch)
//! readings, fan/motor readings and the procedure checklist. The result
//! identifies the index outlet and suggests how far to close every other
//! outlet's damper so all outlets end at the index percentage.
//!
//! All flows are entered in the sheet's flow unit and converted to m³/s for
//! the arithmetic.
//!
//! ## Example
//!
//! ```rust
//! use tab_core::calculations::balance::{BalanceInput, OutletReading, calculate};
//! use tab_core::units::FlowUnit;
//!
//! let mut input = BalanceInput::new("FCU-01", 600.0, FlowUnit::Cfm);
//! input.outlets.push(OutletReading::new("D1", 180.0));
//! input.outlets.push(OutletReading::new("D2", 150.0));
//! input.outlets.push(OutletReading::new("D3", 210.0));
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.index_outlet, "D2");
//! assert_eq!(result.outlets[1].suggested_close_pct, 0.0);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{checked_percent, finite};
use crate::equations::{index_target_flow, suggested_damper_close, Equation};
use crate::errors::{CalcError, CalcResult};
use crate::procedures::{Checklist, ProcedureType};
use crate::units::{FlowUnit, M3PerSec};

/// One outlet or branch reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutletReading {
    /// Outlet or branch id (e.g., "D1", "Branch B")
    pub id: String,

    /// Measured flow, in the sheet's flow unit
    pub flow: f64,

    /// Outlet design flow; the system design flow when absent
    #[serde(default)]
    pub design_flow: Option<f64>,

    /// Static pressure at the outlet (Pa)
    #[serde(default)]
    pub static_pa: Option<f64>,

    #[serde(default)]
    pub note: String,
}

impl OutletReading {
    pub fn new(id: impl Into<String>, flow: f64) -> Self {
        Self {
            id: id.into(),
            flow,
            design_flow: None,
            static_pa: None,
            note: String::new(),
        }
    }
}

/// Optional fan, motor and coil readings recorded with the sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanReadings {
    #[serde(default)]
    pub rpm: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    /// Entering static pressure (Pa)
    #[serde(default)]
    pub entering_sp_pa: Option<f64>,
    /// Leaving static pressure (Pa)
    #[serde(default)]
    pub leaving_sp_pa: Option<f64>,
    /// Vibration velocity (mm/s)
    #[serde(default)]
    pub vibration_mm_s: Option<f64>,
    /// On-coil temperature, project scale
    #[serde(default)]
    pub on_coil_temp: Option<f64>,
    /// Off-coil temperature, project scale
    #[serde(default)]
    pub off_coil_temp: Option<f64>,
}

impl FanReadings {
    /// Reading name and value for every non-temperature reading present
    pub fn present(&self) -> Vec<(&'static str, f64)> {
        [
            ("Fan RPM", self.rpm),
            ("Motor Voltage (V)", self.voltage),
            ("Motor Current (A)", self.current),
            ("Entering static pressure (Pa)", self.entering_sp_pa),
            ("Leaving static pressure (Pa)", self.leaving_sp_pa),
            ("Vibration (mm/s)", self.vibration_mm_s),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("fan.rpm", self.rpm),
            ("fan.voltage", self.voltage),
            ("fan.current", self.current),
            ("fan.vibration_mm_s", self.vibration_mm_s),
        ] {
            if let Some(v) = value {
                check_non_negative(field, v)?;
            }
        }
        // Static pressures are signed (suction side reads negative)
        for (field, value) in [
            ("fan.entering_sp_pa", self.entering_sp_pa),
            ("fan.leaving_sp_pa", self.leaving_sp_pa),
            ("fan.on_coil_temp", self.on_coil_temp),
            ("fan.off_coil_temp", self.off_coil_temp),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(CalcError::invalid_input(field, v.to_string(), "Reading must be a finite number"));
                }
            }
        }
        Ok(())
    }
}

/// A balancing sheet.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "AHU-1 supply",
///   "procedure": "air-handling-unit",
///   "flow_unit": "L/s",
///   "design_flow": 1500.0,
///   "outlets": [
///     { "id": "B1", "flow": 520.0, "static_pa": 85.0, "note": "" },
///     { "id": "B2", "flow": 430.0, "design_flow": 450.0 }
///   ],
///   "fan": { "rpm": 1150.0, "on_coil_temp": 26.0, "off_coil_temp": 13.5 },
///   "checklist": { "completed": [0, 1, 2] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceInput {
    pub label: String,

    #[serde(default)]
    pub procedure: ProcedureType,

    /// Unit of the design flow and every outlet flow
    #[serde(default)]
    pub flow_unit: FlowUnit,

    /// System design flow
    pub design_flow: f64,

    /// Outlets in the order they sit on the run
    #[serde(default)]
    pub outlets: Vec<OutletReading>,

    #[serde(default)]
    pub fan: FanReadings,

    #[serde(default)]
    pub checklist: Checklist,
}

impl BalanceInput {
    pub fn new(label: impl Into<String>, design_flow: f64, flow_unit: FlowUnit) -> Self {
        Self {
            label: label.into(),
            procedure: ProcedureType::default(),
            flow_unit,
            design_flow,
            outlets: Vec::new(),
            fan: FanReadings::default(),
            checklist: Checklist::default(),
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        check_non_negative("design_flow", self.design_flow)?;
        if self.design_flow == 0.0 {
            return Err(CalcError::division_by_zero("balance", "design_flow"));
        }
        if self.outlets.is_empty() {
            return Err(CalcError::invalid_input("outlets", "[]", "At least one outlet reading is required"));
        }

        let mut seen = HashSet::new();
        for outlet in &self.outlets {
            if outlet.id.trim().is_empty() {
                return Err(CalcError::invalid_input("outlet.id", "", "Outlet id cannot be empty"));
            }
            if !seen.insert(outlet.id.as_str()) {
                return Err(CalcError::invalid_input("outlet.id", outlet.id.as_str(), "Duplicate outlet id"));
            }
            check_non_negative(&format!("{}.flow", outlet.id), outlet.flow)?;
            if let Some(design) = outlet.design_flow {
                let field = format!("{}.design_flow", outlet.id);
                check_non_negative(&field, design)?;
                if design == 0.0 {
                    return Err(CalcError::division_by_zero("balance", field));
                }
            }
            if let Some(sp) = outlet.static_pa {
                if !sp.is_finite() {
                    return Err(CalcError::invalid_input(
                        format!("{}.static_pa", outlet.id),
                        sp.to_string(),
                        "Static pressure must be a finite number",
                    ));
                }
            }
        }

        self.fan.validate()?;
        self.checklist.validate(self.procedure)
    }

    /// Append an outlet at the end of the run.
    pub fn add_outlet(&mut self, outlet: OutletReading) -> CalcResult<()> {
        if self.outlets.iter().any(|o| o.id == outlet.id) {
            return Err(CalcError::invalid_input("outlet.id", outlet.id, "Duplicate outlet id"));
        }
        self.outlets.push(outlet);
        Ok(())
    }

    pub fn outlet_mut(&mut self, id: &str) -> CalcResult<&mut OutletReading> {
        self.outlets
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| unknown_outlet(id))
    }

    /// Remove an outlet; the last one on a sheet cannot be removed.
    pub fn remove_outlet(&mut self, id: &str) -> CalcResult<OutletReading> {
        let position = self
            .outlets
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| unknown_outlet(id))?;
        if self.outlets.len() == 1 {
            return Err(CalcError::invalid_input("outlets", id, "A sheet needs at least one outlet"));
        }
        Ok(self.outlets.remove(position))
    }

    pub fn equations(&self) -> Vec<Equation> {
        vec![
            Equation::PercentOfDesign,
            Equation::IndexTargetFlow,
            Equation::DamperCloseSuggestion,
        ]
    }
}

/// Balance results for one outlet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutletResult {
    pub id: String,

    /// Measured flow (m³/s)
    pub flow_m3s: f64,

    /// Measured flow in the sheet's unit
    pub flow: f64,

    /// Design flow used for the percentage, in the sheet's unit
    pub design_flow: f64,

    /// Measured / outlet design × 100
    pub percent_of_design: f64,

    /// Flow this outlet should read once balanced, in the sheet's unit
    pub target_flow: f64,

    /// Suggested damper closure (%); zero for the index outlet
    pub suggested_close_pct: f64,

    /// Running total of measured flow up to and including this outlet
    pub cumulative_flow: f64,

    pub static_pa: Option<f64>,

    pub note: String,
}

/// Results of a balancing sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult {
    pub flow_unit: FlowUnit,

    /// System design flow (m³/s)
    pub design_m3s: f64,

    /// Sum of outlet flows (m³/s)
    pub total_m3s: f64,

    /// Sum of outlet flows in the sheet's unit
    pub total_flow: f64,

    /// Total as percent of system design
    pub total_percent: f64,

    /// Id of the outlet with the lowest percent of design
    pub index_outlet: String,

    /// Percentage every outlet is balanced to
    pub target_percent: f64,

    pub outlets: Vec<OutletResult>,

    /// On-coil − off-coil, when both were read
    pub delta_t: Option<f64>,
}

impl BalanceResult {
    /// Outlets whose suggested closure is above zero
    pub fn outlets_to_adjust(&self) -> impl Iterator<Item = &OutletResult> {
        self.outlets.iter().filter(|o| o.suggested_close_pct > 0.0)
    }

    /// Whether the total meets a target percentage (e.g. 105% for fan systems)
    pub fn total_meets(&self, target_percent: f64) -> bool {
        self.total_percent >= target_percent
    }
}

/// Run the proportional balance calculation.
///
/// # Errors
///
/// * `InvalidInput` - no outlets, duplicate outlet ids, negative flows, bad
///   checklist index, or readings so large a result overflows
/// * `DivisionByZero` - system or outlet design flow is zero once converted
///   to m³/s
pub fn calculate(input: &BalanceInput) -> CalcResult<BalanceResult> {
    input.validate()?;

    let unit = input.flow_unit;
    let to_m3s = |value: f64| unit.to_m3s(value).value();
    let design_m3s = to_m3s(input.design_flow);
    if design_m3s <= 0.0 {
        return Err(CalcError::division_by_zero("balance", "design_flow"));
    }

    let mut percents = Vec::with_capacity(input.outlets.len());
    for o in &input.outlets {
        let field = match o.design_flow {
            Some(_) => format!("{}.design_flow", o.id),
            None => "design_flow".to_string(),
        };
        let design = o.design_flow.unwrap_or(input.design_flow);
        percents.push(checked_percent("balance", &field, to_m3s(o.flow), to_m3s(design))?);
    }

    // Lowest percentage; strict comparison keeps the first on ties
    let mut index = 0;
    for (i, pct) in percents.iter().enumerate() {
        if *pct < percents[index] {
            index = i;
        }
    }
    let target_percent = percents[index];

    let mut cumulative = 0.0;
    let mut outlets = Vec::with_capacity(input.outlets.len());
    for (i, (o, &pct)) in input.outlets.iter().zip(&percents).enumerate() {
        let design = o.design_flow.unwrap_or(input.design_flow);
        let flow_m3s = to_m3s(o.flow);
        let target_m3s = index_target_flow(to_m3s(design), target_percent);
        cumulative = finite("cumulative_flow", cumulative + o.flow)?;
        // Index outlet stays fully open
        let close = if i == index { 0.0 } else { suggested_damper_close(flow_m3s, target_m3s) };
        outlets.push(OutletResult {
            id: o.id.clone(),
            flow_m3s,
            flow: o.flow,
            design_flow: design,
            percent_of_design: pct,
            target_flow: finite(&format!("{}.target_flow", o.id), unit.from_m3s(M3PerSec(target_m3s)))?,
            suggested_close_pct: close,
            cumulative_flow: cumulative,
            static_pa: o.static_pa,
            note: o.note.clone(),
        });
    }

    let total_m3s = outlets.iter().map(|o| M3PerSec(o.flow_m3s)).sum::<M3PerSec>().value();
    let total_flow = finite("total_flow", unit.from_m3s(M3PerSec(total_m3s)))?;
    let delta_t = match (input.fan.on_coil_temp, input.fan.off_coil_temp) {
        (Some(on), Some(off)) => Some(finite("delta_t", on - off)?),
        _ => None,
    };

    let result = BalanceResult {
        flow_unit: unit,
        design_m3s,
        total_m3s,
        total_flow,
        total_percent: checked_percent("balance", "design_flow", total_m3s, design_m3s)?,
        index_outlet: input.outlets[index].id.clone(),
        target_percent,
        outlets,
        delta_t,
    };

    debug!(
        label = %input.label,
        outlets = result.outlets.len(),
        index = %result.index_outlet,
        target_percent,
        "balance"
    );
    Ok(result)
}

fn unknown_outlet(id: &str) -> CalcError {
    CalcError::invalid_input("outlet.id", id, "No outlet with this id on the sheet")
}

fn check_non_negative(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Flow readings must be non-negative numbers",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sheet() -> BalanceInput {
        let mut input = BalanceInput::new("FCU-01", 100.0, FlowUnit::LitresPerSec);
        input.outlets = vec![
            OutletReading::new("D1", 30.0),
            OutletReading::new("D2", 20.0),
            OutletReading::new("D3", 40.0),
        ];
        input
    }

    #[test]
    fn test_index_and_suggestions() {
        let result = calculate(&test_sheet()).unwrap();

        assert_eq!(result.index_outlet, "D2");
        assert!((result.target_percent - 20.0).abs() < 1e-9);
        assert!((result.total_flow - 90.0).abs() < 1e-9);
        assert!((result.total_percent - 90.0).abs() < 1e-9);

        let d1 = &result.outlets[0];
        assert!((d1.target_flow - 20.0).abs() < 1e-9);
        // 100 × (1 − 20/30)
        assert!((d1.suggested_close_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.outlets[1].suggested_close_pct, 0.0);
        assert!((result.outlets[2].suggested_close_pct - 50.0).abs() < 1e-9);
        assert_eq!(result.outlets_to_adjust().count(), 2);
    }

    #[test]
    fn test_cumulative_flow() {
        let result = calculate(&test_sheet()).unwrap();
        let cumulative: Vec<f64> = result.outlets.iter().map(|o| o.cumulative_flow).collect();
        assert_eq!(cumulative, vec![30.0, 50.0, 90.0]);
    }

    #[test]
    fn test_outlet_design_overrides_system() {
        let mut input = test_sheet();
        // D3 at 40 of 200 is 20%; D2 at 20 of 100 is also 20%, first wins
        input.outlets[2].design_flow = Some(200.0);
        let result = calculate(&input).unwrap();
        assert_eq!(result.index_outlet, "D2");
        assert!((result.outlets[2].target_flow - 40.0).abs() < 1e-9);
        assert!(result.outlets[2].suggested_close_pct.abs() < 1e-9);
    }

    #[test]
    fn test_tie_keeps_first() {
        let mut input = BalanceInput::new("Tie", 50.0, FlowUnit::Cfm);
        input.outlets = vec![OutletReading::new("A", 25.0), OutletReading::new("B", 25.0)];
        assert_eq!(calculate(&input).unwrap().index_outlet, "A");
    }

    #[test]
    fn test_units_agree() {
        let mut cfm = test_sheet();
        cfm.flow_unit = FlowUnit::Cfm;
        let mut ls = test_sheet();
        ls.flow_unit = FlowUnit::LitresPerSec;
        let a = calculate(&cfm).unwrap();
        let b = calculate(&ls).unwrap();
        assert_eq!(a.index_outlet, b.index_outlet);
        assert!((a.target_percent - b.target_percent).abs() < 1e-9);
    }

    #[test]
    fn test_zero_flow_outlet_is_index() {
        let mut input = test_sheet();
        input.outlets[0].flow = 0.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.index_outlet, "D1");
        assert_eq!(result.target_percent, 0.0);
        assert_eq!(result.outlets[0].suggested_close_pct, 0.0);
        assert!((result.outlets[1].suggested_close_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_delta_t() {
        let mut input = test_sheet();
        input.fan.on_coil_temp = Some(26.0);
        let result = calculate(&input).unwrap();
        assert!(result.delta_t.is_none());

        input.fan.off_coil_temp = Some(13.5);
        let result = calculate(&input).unwrap();
        assert!((result.delta_t.unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_design() {
        let mut input = test_sheet();
        input.design_flow = 0.0;
        assert_eq!(
            calculate(&input).unwrap_err(),
            CalcError::division_by_zero("balance", "design_flow")
        );
    }

    #[test]
    fn test_design_underflowing_to_zero() {
        // 5e-324 CFM is 0.0 once converted to m³/s
        let mut input = test_sheet();
        input.flow_unit = FlowUnit::Cfm;
        input.design_flow = 5e-324;
        assert_eq!(
            calculate(&input).unwrap_err(),
            CalcError::division_by_zero("balance", "design_flow")
        );
    }

    #[test]
    fn test_tiny_outlet_design_is_rejected() {
        let mut input = test_sheet();
        input.outlets[1].design_flow = Some(1e-320);
        let err = calculate(&input).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("D2.design_flow"));
    }

    #[test]
    fn test_huge_flows_are_rejected() {
        let mut input = test_sheet();
        input.flow_unit = FlowUnit::Cfm;
        input.outlets[0].flow = f64::MAX;
        input.outlets[1].flow = f64::MAX;
        assert_eq!(calculate(&input).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_duplicate_outlet_ids() {
        let mut input = test_sheet();
        input.outlets[2].id = "D1".to_string();
        let err = calculate(&input).unwrap_err();
        assert_eq!(err, CalcError::invalid_input("outlet.id", "D1", "Duplicate outlet id"));
    }

    #[test]
    fn test_outlet_editing() {
        let mut input = test_sheet();
        input.add_outlet(OutletReading::new("D4", 10.0)).unwrap();
        assert_eq!(input.outlets.last().unwrap().id, "D4");
        assert!(input.add_outlet(OutletReading::new("D1", 5.0)).is_err());

        input.outlet_mut("D2").unwrap().flow = 25.0;
        assert_eq!(input.outlets[1].flow, 25.0);
        assert!(input.outlet_mut("D9").is_err());

        assert_eq!(input.remove_outlet("D1").unwrap().flow, 30.0);
        assert_eq!(input.outlets.len(), 3);
        assert!(input.remove_outlet("D1").is_err());
    }

    #[test]
    fn test_last_outlet_stays() {
        let mut input = BalanceInput::new("One", 100.0, FlowUnit::Cfm);
        input.outlets.push(OutletReading::new("A", 90.0));
        assert_eq!(input.remove_outlet("A").unwrap_err().error_code(), "INVALID_INPUT");
        assert_eq!(input.outlets.len(), 1);
    }

    #[test]
    fn test_no_outlets() {
        let mut input = test_sheet();
        input.outlets.clear();
        let err = calculate(&input).unwrap_err();
        assert!(err.is_input_error());
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_negative_outlet() {
        let mut input = test_sheet();
        input.outlets[1].flow = -5.0;
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_bad_checklist() {
        let mut input = test_sheet();
        input.procedure = ProcedureType::AirTerminals;
        input.checklist.completed = vec![7];
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_fan_readings_present() {
        let fan = FanReadings {
            rpm: Some(1150.0),
            vibration_mm_s: Some(2.1),
            ..Default::default()
        };
        let present = fan.present();
        assert_eq!(present, vec![("Fan RPM", 1150.0), ("Vibration (mm/s)", 2.1)]);
    }

    #[test]
    fn test_total_meets() {
        let result = calculate(&test_sheet()).unwrap();
        assert!(!result.total_meets(105.0));
        assert!(result.total_meets(90.0 - 1e-9));
    }
}
