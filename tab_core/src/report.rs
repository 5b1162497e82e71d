//! # Text and CSV Reports
//!
//! Plain-text rendering of calculation results, shared by the runner and the
//! project report, plus the CSV export of a balancing sheet.
//!
//! Nothing here reads the clock: the only date printed is the project's own
//! modified timestamp, so a saved project always renders the same text.

use std::fmt;
use std::fmt::Write as _;

use crate::calculations::{BalanceInput, BalanceResult, CalculationItem, ItemResult};
use crate::project::{Project, TabSettings};

/// One `label: value` line of a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

impl ReportLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Headline plus derived values for one evaluated item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub headline: String,
    pub lines: Vec<ReportLine>,
}

/// Describe a result in report lines.
pub fn summarize(item: &CalculationItem, result: &ItemResult, settings: &TabSettings) -> ItemSummary {
    let mut lines = Vec::new();
    let headline = match result {
        ItemResult::AirflowCheck(r) => {
            lines.push(ReportLine::new("Percent of design", format!("{:.1} %", r.percent_of_design)));
            lines.push(ReportLine::new("Deviation", format!("{:+.1} CFM", r.deviation_cfm)));
            let verdict = if r.within_tolerance { "within" } else { "outside" };
            lines.push(ReportLine::new("Tolerance", format!("{} ±{:.1} %", verdict, r.tolerance_pct)));
            r.summary()
        }
        ItemResult::DuctTraverse(r) => {
            lines.push(ReportLine::new("Traverse points", r.points.to_string()));
            lines.push(ReportLine::new("Average velocity", format!("{:.0} FPM", r.average_velocity_fpm)));
            if let Some(area) = r.area_sqft {
                lines.push(ReportLine::new("Duct area", format!("{:.3} ft²", area)));
            }
            if let Some(q) = r.airflow_cfm {
                lines.push(ReportLine::new("Airflow", format!("{:.0} CFM", q)));
            }
            if let Some(pct) = r.percent_of_design {
                lines.push(ReportLine::new("Percent of design", format!("{:.1} %", pct)));
            }
            match r.airflow_cfm {
                Some(q) => format!("{:.0} CFM duct airflow.", q),
                None => format!("Average velocity {:.0} FPM.", r.average_velocity_fpm),
            }
        }
        ItemResult::TemperatureSplit(r) => {
            let symbol = r.scale.symbol();
            lines.push(ReportLine::new("Temperature split", format!("{:.1} {}", r.delta_t, symbol)));
            if let Some(heat) = r.sensible_heat_btuh {
                lines.push(ReportLine::new("Sensible heat", format!("{:.0} Btu/h", heat)));
            }
            format!("Temperature split {:.1} {}.", r.delta_t, symbol)
        }
        ItemResult::FanLaw(r) => {
            lines.push(ReportLine::new("Percent of design", format!("{:.1} %", r.percent_of_design)));
            lines.push(ReportLine::new("Required speed", format!("{:.0} RPM", r.required_rpm)));
            lines.push(ReportLine::new("Speed change", format!("{:+.0} RPM", r.rpm_change)));
            if let Some(sp) = r.predicted_static_in_wg {
                lines.push(ReportLine::new("Predicted static pressure", format!("{:.2} in. wg", sp)));
            }
            if let Some(bhp) = r.predicted_bhp {
                lines.push(ReportLine::new("Predicted brake horsepower", format!("{:.2} hp", bhp)));
            }
            format!("Set fan to {:.0} RPM for design airflow.", r.required_rpm)
        }
        ItemResult::MotorPower(r) => {
            lines.push(ReportLine::new("Input power", format!("{:.2} kW", r.input_kw)));
            lines.push(ReportLine::new("Apparent power", format!("{:.2} kVA", r.apparent_kva)));
            format!("Motor input {:.2} kW.", r.input_kw)
        }
        ItemResult::Balance(r) => {
            let target = match item {
                CalculationItem::Balance(input) if input.procedure.uses_total_traverse() => {
                    Some(settings.fan_total_target_pct)
                }
                _ => None,
            };
            balance_lines(r, target, settings, &mut lines);
            format!("Index outlet {} at {:.1}% of design.", r.index_outlet, r.target_percent)
        }
    };

    ItemSummary { headline, lines }
}

fn balance_lines(r: &BalanceResult, total_target: Option<f64>, settings: &TabSettings, lines: &mut Vec<ReportLine>) {
    let unit = r.flow_unit.label();
    lines.push(ReportLine::new("Total measured flow", format!("{:.6} m3/s", r.total_m3s)));
    lines.push(ReportLine::new("Total measured flow (unit)", format!("{:.3} {}", r.total_flow, unit)));
    lines.push(ReportLine::new("Total percent of design", format!("{:.1} %", r.total_percent)));
    if let Some(target) = total_target {
        let verdict = if r.total_meets(target) { "met" } else { "not met" };
        lines.push(ReportLine::new(format!("Total target {:.0} %", target), verdict));
    }
    lines.push(ReportLine::new("Target percent (index)", format!("{:.1} %", r.target_percent)));
    if let Some(dt) = r.delta_t {
        lines.push(ReportLine::new(
            "ΔT (On - Off)",
            format!("{:.2} {}", dt, settings.temperature_scale.symbol()),
        ));
    }
    for outlet in &r.outlets {
        lines.push(ReportLine::new(
            format!("Outlet {}", outlet.id),
            format!(
                "{:.3} {} ({:.1} % of design), target {:.3} {}, close {:.1} %, cumulative {:.3} {}",
                outlet.flow,
                unit,
                outlet.percent_of_design,
                outlet.target_flow,
                unit,
                outlet.suggested_close_pct,
                outlet.cumulative_flow,
                unit
            ),
        ));
    }
}

/// Readings an item was entered with
pub fn item_inputs(item: &CalculationItem, settings: &TabSettings) -> Vec<ReportLine> {
    let mut lines = Vec::new();
    match item {
        CalculationItem::AirflowCheck(c) => {
            lines.push(ReportLine::new("Design airflow", format!("{} CFM", c.design_cfm)));
            lines.push(ReportLine::new("Measured airflow", format!("{} CFM", c.measured_cfm)));
        }
        CalculationItem::DuctTraverse(c) => {
            if let Some(geometry) = &c.geometry {
                lines.push(ReportLine::new("Duct", geometry.describe()));
            }
            if let Some(design) = c.design_cfm {
                lines.push(ReportLine::new("Design airflow", format!("{} CFM", design)));
            }
        }
        CalculationItem::TemperatureSplit(c) => {
            let symbol = c.scale.symbol();
            lines.push(ReportLine::new("Entering air", format!("{} {}", c.entering_temp, symbol)));
            lines.push(ReportLine::new("Leaving air", format!("{} {}", c.leaving_temp, symbol)));
            if let Some(cfm) = c.airflow_cfm {
                lines.push(ReportLine::new("Airflow", format!("{} CFM", cfm)));
            }
        }
        CalculationItem::FanLaw(c) => {
            lines.push(ReportLine::new("Fan speed", format!("{} RPM", c.fan_rpm)));
            lines.push(ReportLine::new("Measured airflow", format!("{} CFM", c.measured_cfm)));
            lines.push(ReportLine::new("Design airflow", format!("{} CFM", c.design_cfm)));
        }
        CalculationItem::MotorPower(c) => {
            lines.push(ReportLine::new("Voltage", format!("{} V", c.voltage)));
            lines.push(ReportLine::new("Current", format!("{} A", c.current)));
            lines.push(ReportLine::new("Power factor", c.power_factor.to_string()));
            lines.push(ReportLine::new("Phases", c.phases.count().to_string()));
        }
        CalculationItem::Balance(c) => {
            lines.push(ReportLine::new("Procedure", c.procedure.display_name()));
            lines.push(ReportLine::new("Design flow", format!("{} {}", c.design_flow, c.flow_unit)));
            for (name, value) in c.fan.present() {
                lines.push(ReportLine::new(name, value.to_string()));
            }
            let symbol = settings.temperature_scale.symbol();
            if let Some(t) = c.fan.on_coil_temp {
                lines.push(ReportLine::new(format!("On-coil Temp ({})", symbol), t.to_string()));
            }
            if let Some(t) = c.fan.off_coil_temp {
                lines.push(ReportLine::new(format!("Off-coil Temp ({})", symbol), t.to_string()));
            }
            lines.push(ReportLine::new(
                "Checklist",
                format!("{} of {} steps complete", c.checklist.completed.len(), c.procedure.steps().len()),
            ));
        }
    }
    lines
}

/// Full text report of a project, items sorted by label.
///
/// Items that fail to evaluate are listed with their error.
pub fn render_project_text(project: &Project) -> String {
    let mut out = String::new();
    let meta = &project.meta;

    // Writing to a String cannot fail
    let _ = writeln!(out, "HVAC Testing & Air Balancing Report");
    let _ = writeln!(out, "Job: {}", meta.job_id);
    let _ = writeln!(out, "Client: {}", meta.client);
    let _ = writeln!(out, "Operator / Technician: {}", meta.technician);
    let _ = writeln!(out, "Date: {}", meta.modified.format("%Y-%m-%d"));
    let _ = writeln!(out, "Items: {}", project.item_count());

    for (item, result) in project.evaluate_all() {
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} ({}) ==", item.label(), item.calc_type());
        match result {
            Ok(result) => {
                let summary = summarize(item, &result, &project.settings);
                let _ = writeln!(out, "{}", summary.headline);
                for line in item_inputs(item, &project.settings).iter().chain(&summary.lines) {
                    let _ = writeln!(out, "  {}", line);
                }
            }
            Err(e) => {
                let _ = writeln!(out, "ERROR [{}]: {}", e.error_code(), e);
            }
        }
        if let CalculationItem::Balance(input) = item {
            for (index, step) in input.checklist.outstanding(input.procedure) {
                let _ = writeln!(out, "  [ ] {}. {}", index + 1, step);
            }
        }
    }

    if !project.notes.trim().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Final notes:");
        let _ = writeln!(out, "{}", project.notes.trim_end());
    }
    out
}

/// Quote a CSV field when it contains a comma, quote or newline.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(out: &mut String, fields: &[String]) {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

macro_rules! row {
    ($out:expr $(, $field:expr)* $(,)?) => {
        csv_row($out, &[$($field.to_string()),*])
    };
}

/// CSV export of one balancing sheet.
pub fn render_balance_csv(project: &Project, input: &BalanceInput, result: &BalanceResult) -> String {
    let mut out = String::new();
    let meta = &project.meta;
    let unit = result.flow_unit.label();
    let symbol = project.settings.temperature_scale.symbol();

    row!(&mut out, "HVAC Testing & Air Balancing Report");
    row!(&mut out, "System", input.label);
    row!(&mut out, "Procedure Type", input.procedure.display_name());
    row!(&mut out, "Date", meta.modified.format("%Y-%m-%d"));
    row!(&mut out, "Operator / Technician", meta.technician);
    row!(&mut out, "Job", meta.job_id);
    row!(&mut out, "Client", meta.client);
    row!(&mut out);
    row!(&mut out, "Design Flow", format!("{} {}", input.design_flow, unit));
    for (name, value) in input.fan.present() {
        row!(&mut out, name, value);
    }
    if let Some(t) = input.fan.off_coil_temp {
        row!(&mut out, format!("Off-coil Temp ({})", symbol), t);
    }
    if let Some(t) = input.fan.on_coil_temp {
        row!(&mut out, format!("On-coil Temp ({})", symbol), t);
    }
    if let Some(dt) = result.delta_t {
        row!(&mut out, format!("ΔT (On - Off) ({})", symbol), format!("{:.2}", dt));
    }
    row!(&mut out);
    row!(
        &mut out,
        "Outlet/Branch ID",
        "Measured Flow (m3/s)",
        format!("Measured Flow ({})", unit),
        "% of Design",
        "Static Pressure (Pa)",
        "Note",
        "Suggested damper close (%)",
        format!("Target Flow ({})", unit),
        format!("Cumulative Flow ({})", unit),
    );
    for outlet in &result.outlets {
        row!(
            &mut out,
            outlet.id,
            format!("{:.6}", outlet.flow_m3s),
            outlet.flow,
            format!("{:.1}", outlet.percent_of_design),
            outlet.static_pa.map(|sp| sp.to_string()).unwrap_or_default(),
            outlet.note,
            format!("{:.1}", outlet.suggested_close_pct),
            format!("{:.3}", outlet.target_flow),
            outlet.cumulative_flow,
        );
    }
    row!(&mut out);
    row!(&mut out, "Total measured flow (m3/s)", format!("{:.6}", result.total_m3s));
    row!(&mut out, "Total measured flow (unit)", format!("{:.3} {}", result.total_flow, unit));
    row!(&mut out, "% of design (total)", format!("{:.1}", result.total_percent));
    row!(&mut out, "Index outlet", result.index_outlet);
    row!(&mut out);
    row!(&mut out, "Final notes:");
    row!(&mut out, project.notes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{balance, AirflowCheckInput, OutletReading};
    use crate::procedures::ProcedureType;
    use crate::units::FlowUnit;

    fn test_sheet() -> BalanceInput {
        let mut input = BalanceInput::new("AHU-1", 100.0, FlowUnit::LitresPerSec);
        input.procedure = ProcedureType::AirHandlingUnit;
        input.outlets = vec![OutletReading::new("D1", 30.0), OutletReading::new("D2", 20.0)];
        input.outlets[0].note = "Above ceiling, access panel 3".to_string();
        input.outlets[1].static_pa = Some(45.0);
        input.fan.on_coil_temp = Some(26.0);
        input.fan.off_coil_temp = Some(13.5);
        input
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_balance_csv_layout() {
        let mut project = Project::new("Sam", "J-1", "ACME");
        project.notes = "Balanced, re-check D1".to_string();
        let input = test_sheet();
        let result = balance::calculate(&input).unwrap();
        let csv = render_balance_csv(&project, &input, &result);

        assert!(csv.starts_with("HVAC Testing & Air Balancing Report\n"));
        assert!(csv.contains("Design Flow,100 L/s\n"));
        assert!(csv.contains("ΔT (On - Off) (°F),12.50\n"));
        assert!(csv.contains("Outlet/Branch ID,Measured Flow (m3/s),Measured Flow (L/s),% of Design"));
        assert!(csv.contains("Suggested damper close (%),Target Flow (L/s),Cumulative Flow (L/s)\n"));
        assert!(csv.contains("D1,0.030000,30,30.0,,\"Above ceiling, access panel 3\",33.3,20.000,30\n"));
        assert!(csv.contains("D2,0.020000,20,20.0,45,,0.0,20.000,50\n"));
        assert!(csv.contains("Index outlet,D2\n"));
        assert!(csv.ends_with("Final notes:\n\"Balanced, re-check D1\"\n"));
    }

    #[test]
    fn test_summary_headlines() {
        let settings = TabSettings::default();
        let item = CalculationItem::Balance(test_sheet());
        let result = item.evaluate(&settings).unwrap();
        let summary = summarize(&item, &result, &settings);
        assert_eq!(summary.headline, "Index outlet D2 at 20.0% of design.");
        // AHU totals are checked against the fan target
        assert!(summary.lines.iter().any(|l| l.label == "Total target 105 %" && l.value == "not met"));
        let d2 = summary.lines.iter().find(|l| l.label == "Outlet D2").unwrap();
        assert!(d2.value.ends_with("cumulative 50.000 L/s"));
    }

    #[test]
    fn test_project_text_report() {
        let mut project = Project::new("Sam", "J-1", "ACME");
        project.add_item(CalculationItem::Balance(test_sheet()));
        project.add_item(CalculationItem::AirflowCheck(AirflowCheckInput {
            label: "AHU-0".to_string(),
            design_cfm: 0.0,
            measured_cfm: 10.0,
        }));
        let text = render_project_text(&project);

        assert!(text.contains("Operator / Technician: Sam"));
        let broken = text.find("== AHU-0 (Airflow Check) ==").unwrap();
        let sheet = text.find("== AHU-1 (Air Balance) ==").unwrap();
        assert!(broken < sheet);
        assert!(text.contains("ERROR [DIVISION_BY_ZERO]"));
        assert!(text.contains("  [ ] 1. Set fan RPM to provide design total air quantity"));
        assert_eq!(text, render_project_text(&project));
    }
}
