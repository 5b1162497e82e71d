//! # Equation Registry
//!
//! Central registry of every formula applied to field readings. Each
//! equation carries its reference, formula text and variable definitions so
//! reports can print an auditable "List of Equations".
//!
//! ## Usage
//!
//! ```rust
//! use tab_core::equations::registry::{Equation, EquationTracker};
//!
//! let mut tracker = EquationTracker::new();
//! tracker.record_for_item(Equation::PercentOfDesign, "Supply fan total", "AHU-1");
//!
//! let meta = Equation::PercentOfDesign.metadata();
//! println!("Formula: {}", meta.formula_plain);
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// ============================================================================
// References
// ============================================================================

/// Reference to the standard or handbook an equation comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeReference {
    /// ASHRAE Handbook (Fundamentals or Systems and Equipment volume)
    Ashrae {
        volume: &'static str,
        year: u16,
        chapter: u8,
    },
    /// AABC National Standards for Total System Balance
    Aabc { edition: u8, chapter: u8 },
    /// CIBSE Commissioning Code
    Cibse { code: &'static str },
    /// Basic electrical or unit relations
    Fundamentals,
}

impl CodeReference {
    /// Format the reference for display in reports
    pub fn citation(&self) -> String {
        match self {
            CodeReference::Ashrae { volume, year, chapter } => {
                format!("ASHRAE Handbook - {} {}, Ch. {}", volume, year, chapter)
            }
            CodeReference::Aabc { edition, chapter } => {
                format!("AABC National Standards {}ed, Ch. {}", edition, chapter)
            }
            CodeReference::Cibse { code } => format!("CIBSE Commissioning Code {}", code),
            CodeReference::Fundamentals => "Fundamental Relations".to_string(),
        }
    }

    /// Short form for inline references
    pub fn short_form(&self) -> &'static str {
        match self {
            CodeReference::Ashrae { .. } => "ASHRAE",
            CodeReference::Aabc { .. } => "AABC",
            CodeReference::Cibse { .. } => "CIBSE",
            CodeReference::Fundamentals => "Fundamentals",
        }
    }
}

// ============================================================================
// Equation Categories
// ============================================================================

/// Categories for grouping equations in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquationCategory {
    /// Duct free-area geometry
    DuctGeometry,
    /// Velocity and airflow
    Airflow,
    /// Temperature split and heat
    Thermal,
    /// Fan affinity laws
    FanLaws,
    /// Motor electrical readings
    Electrical,
    /// Proportional balancing
    Balancing,
}

impl EquationCategory {
    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            EquationCategory::DuctGeometry => "Duct Geometry",
            EquationCategory::Airflow => "Airflow",
            EquationCategory::Thermal => "Thermal",
            EquationCategory::FanLaws => "Fan Laws",
            EquationCategory::Electrical => "Electrical",
            EquationCategory::Balancing => "Proportional Balancing",
        }
    }

    /// Sort order for reports (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            EquationCategory::DuctGeometry => 1,
            EquationCategory::Airflow => 2,
            EquationCategory::Balancing => 3,
            EquationCategory::Thermal => 4,
            EquationCategory::FanLaws => 5,
            EquationCategory::Electrical => 6,
        }
    }
}

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in an equation.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Symbol (e.g., "Q", "V", "A")
    pub symbol: &'static str,
    /// Description
    pub description: &'static str,
    /// Units (e.g., "CFM", "FPM", "ft²")
    pub units: &'static str,
}

impl Variable {
    pub const fn new(symbol: &'static str, description: &'static str, units: &'static str) -> Self {
        Self { symbol, description, units }
    }
}

// ============================================================================
// Equation Metadata
// ============================================================================

/// Complete metadata for a TAB equation.
#[derive(Debug, Clone)]
pub struct EquationMetadata {
    /// Human-readable name
    pub name: &'static str,
    /// Brief description of what this equation calculates
    pub description: &'static str,
    /// The formula in Typst math notation for PDF rendering
    pub formula_typst: &'static str,
    /// The formula in plain text
    pub formula_plain: &'static str,
    /// Standard reference
    pub reference: CodeReference,
    /// Variable definitions
    pub variables: Vec<Variable>,
    /// Assumptions or limitations
    pub assumptions: Vec<&'static str>,
    /// Category for grouping
    pub category: EquationCategory,
    /// Source module where the equation implementation lives
    pub source_module: &'static str,
    /// Function name implementing the equation
    pub source_function: &'static str,
}

// ============================================================================
// Equation Enum
// ============================================================================

/// All formulas applied by the calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Equation {
    /// A = w·h / 144
    RectangularDuctArea,
    /// A = π·d² / 576
    RoundDuctArea,
    /// Q = V × A
    AirflowFromVelocity,
    /// V = 4005 √VP
    PitotVelocity,
    /// V_avg = ΣV / n
    TraverseAverage,
    /// %design = Q_measured / Q_design × 100
    PercentOfDesign,
    /// Q_target = Q_design × %index / 100
    IndexTargetFlow,
    /// close% = 100 (1 − Q_target / Q_measured)
    DamperCloseSuggestion,
    /// ΔT = T_entering − T_leaving
    TemperatureSplit,
    /// Q_s = 1.08 × CFM × ΔT
    SensibleHeat,
    /// N₂ = N₁ (Q₂/Q₁)
    FanLawSpeed,
    /// SP₂ = SP₁ (Q₂/Q₁)²
    FanLawPressure,
    /// BHP₂ = BHP₁ (Q₂/Q₁)³
    FanLawPower,
    /// P = √3 V I PF / 1000
    MotorInputPower,
}

impl Equation {
    /// Get the full metadata for this equation
    pub fn metadata(&self) -> EquationMetadata {
        match self {
            Equation::RectangularDuctArea => EquationMetadata {
                name: "Rectangular Duct Area",
                description: "Free area of a rectangular duct from inside dimensions",
                formula_typst: r#"$A = (w h) / 144$"#,
                formula_plain: "A = w * h / 144",
                reference: CodeReference::Fundamentals,
                variables: vec![
                    Variable::new("A", "Free area", "ft²"),
                    Variable::new("w", "Inside width", "in"),
                    Variable::new("h", "Inside height", "in"),
                ],
                assumptions: vec!["Inside (clear) dimensions, no liner deduction"],
                category: EquationCategory::DuctGeometry,
                source_module: "equations/airflow.rs",
                source_function: "rectangular_duct_area",
            },

            Equation::RoundDuctArea => EquationMetadata {
                name: "Round Duct Area",
                description: "Free area of a round duct from inside diameter",
                formula_typst: r#"$A = (pi d^2) / (4 dot 144)$"#,
                formula_plain: "A = pi * d^2 / 4 / 144",
                reference: CodeReference::Fundamentals,
                variables: vec![
                    Variable::new("A", "Free area", "ft²"),
                    Variable::new("d", "Inside diameter", "in"),
                ],
                assumptions: vec!["Circular cross-section"],
                category: EquationCategory::DuctGeometry,
                source_module: "equations/airflow.rs",
                source_function: "round_duct_area",
            },

            Equation::AirflowFromVelocity => EquationMetadata {
                name: "Airflow from Velocity",
                description: "Volumetric airflow from average velocity and free area",
                formula_typst: r#"$Q = V A$"#,
                formula_plain: "Q = V * A",
                reference: CodeReference::Ashrae { volume: "Fundamentals", year: 2021, chapter: 36 },
                variables: vec![
                    Variable::new("Q", "Airflow", "CFM"),
                    Variable::new("V", "Average velocity", "FPM"),
                    Variable::new("A", "Free area", "ft²"),
                ],
                assumptions: vec!["Velocity averaged over a full traverse plane"],
                category: EquationCategory::Airflow,
                source_module: "equations/airflow.rs",
                source_function: "airflow_from_velocity",
            },

            Equation::PitotVelocity => EquationMetadata {
                name: "Pitot Tube Velocity",
                description: "Air velocity from a pitot-tube velocity pressure reading",
                formula_typst: r#"$V = 4005 sqrt("VP")$"#,
                formula_plain: "V = 4005 * sqrt(VP)",
                reference: CodeReference::Ashrae { volume: "Fundamentals", year: 2021, chapter: 36 },
                variables: vec![
                    Variable::new("V", "Velocity", "FPM"),
                    Variable::new("VP", "Velocity pressure", "in. wg"),
                ],
                assumptions: vec!["Standard air density 0.075 lb/ft³"],
                category: EquationCategory::Airflow,
                source_module: "equations/airflow.rs",
                source_function: "velocity_from_pressure",
            },

            Equation::TraverseAverage => EquationMetadata {
                name: "Traverse Average Velocity",
                description: "Mean of equal-area traverse point velocities",
                formula_typst: r#"$V_"avg" = (sum V_i) / n$"#,
                formula_plain: "V_avg = sum(V_i) / n",
                reference: CodeReference::Aabc { edition: 7, chapter: 8 },
                variables: vec![
                    Variable::new("V_i", "Point velocity", "FPM"),
                    Variable::new("n", "Number of traverse points", "-"),
                ],
                assumptions: vec!["Points laid out on an equal-area grid"],
                category: EquationCategory::Airflow,
                source_module: "equations/airflow.rs",
                source_function: "traverse_average",
            },

            Equation::PercentOfDesign => EquationMetadata {
                name: "Percent of Design Airflow",
                description: "Measured airflow as a percentage of design airflow",
                formula_typst: r#"$%_"design" = Q_"measured" / Q_"design" times 100$"#,
                formula_plain: "%design = Q_measured / Q_design * 100",
                reference: CodeReference::Aabc { edition: 7, chapter: 9 },
                variables: vec![
                    Variable::new("Q_measured", "Measured airflow", "CFM"),
                    Variable::new("Q_design", "Design airflow", "CFM"),
                ],
                assumptions: vec!["Design airflow is non-zero"],
                category: EquationCategory::Airflow,
                source_module: "equations/airflow.rs",
                source_function: "percent_of_design",
            },

            Equation::IndexTargetFlow => EquationMetadata {
                name: "Index Outlet Target Flow",
                description: "Flow each outlet is throttled to so it matches the index outlet percentage",
                formula_typst: r#"$Q_"target" = Q_"design" times %_"index" / 100$"#,
                formula_plain: "Q_target = Q_design * %index / 100",
                reference: CodeReference::Cibse { code: "A" },
                variables: vec![
                    Variable::new("Q_design", "Outlet design flow", "unit of sheet"),
                    Variable::new("%index", "Index outlet percent of design", "%"),
                ],
                assumptions: vec!["Index outlet damper remains fully open"],
                category: EquationCategory::Balancing,
                source_module: "equations/balancing.rs",
                source_function: "index_target_flow",
            },

            Equation::DamperCloseSuggestion => EquationMetadata {
                name: "Suggested Damper Closure",
                description: "Linear first estimate of how far to close an outlet damper",
                formula_typst: r#"$"close" = 100 (1 - Q_"target" / Q_"measured")$"#,
                formula_plain: "close% = 100 * (1 - Q_target / Q_measured)",
                reference: CodeReference::Cibse { code: "A" },
                variables: vec![
                    Variable::new("Q_target", "Outlet target flow", "unit of sheet"),
                    Variable::new("Q_measured", "Outlet measured flow", "unit of sheet"),
                ],
                assumptions: vec!["Zero when the outlet is at or below target", "Re-measure after every adjustment"],
                category: EquationCategory::Balancing,
                source_module: "equations/balancing.rs",
                source_function: "suggested_damper_close",
            },

            Equation::TemperatureSplit => EquationMetadata {
                name: "Coil Temperature Split",
                description: "Dry-bulb temperature difference across a coil",
                formula_typst: r#"$Delta T = T_"entering" - T_"leaving"$"#,
                formula_plain: "dT = T_entering - T_leaving",
                reference: CodeReference::Fundamentals,
                variables: vec![
                    Variable::new("T_entering", "On-coil dry bulb", "°F or °C"),
                    Variable::new("T_leaving", "Off-coil dry bulb", "°F or °C"),
                ],
                assumptions: vec!["Positive for cooling, negative for heating"],
                category: EquationCategory::Thermal,
                source_module: "equations/thermal.rs",
                source_function: "temperature_split",
            },

            Equation::SensibleHeat => EquationMetadata {
                name: "Sensible Heat",
                description: "Air-side sensible heat from airflow and temperature split",
                formula_typst: r#"$Q_s = 1.08 times "CFM" times Delta T$"#,
                formula_plain: "Q_s = 1.08 * CFM * dT",
                reference: CodeReference::Ashrae { volume: "Fundamentals", year: 2021, chapter: 1 },
                variables: vec![
                    Variable::new("Q_s", "Sensible heat", "Btu/h"),
                    Variable::new("CFM", "Airflow", "CFM"),
                    Variable::new("Delta T", "Temperature split", "°F"),
                ],
                assumptions: vec!["Standard air density and specific heat"],
                category: EquationCategory::Thermal,
                source_module: "equations/thermal.rs",
                source_function: "sensible_heat_btuh",
            },

            Equation::FanLawSpeed => EquationMetadata {
                name: "Fan Law 1 - Speed",
                description: "Fan speed needed for a new airflow",
                formula_typst: r#"$N_2 = N_1 (Q_2 / Q_1)$"#,
                formula_plain: "N2 = N1 * (Q2 / Q1)",
                reference: CodeReference::Ashrae { volume: "Systems and Equipment", year: 2020, chapter: 21 },
                variables: vec![
                    Variable::new("N", "Fan speed", "RPM"),
                    Variable::new("Q", "Airflow", "CFM"),
                ],
                assumptions: vec!["Fixed system curve", "Constant density"],
                category: EquationCategory::FanLaws,
                source_module: "equations/fan.rs",
                source_function: "fan_law_speed",
            },

            Equation::FanLawPressure => EquationMetadata {
                name: "Fan Law 2 - Pressure",
                description: "Static pressure at a new airflow",
                formula_typst: r#"$"SP"_2 = "SP"_1 (Q_2 / Q_1)^2$"#,
                formula_plain: "SP2 = SP1 * (Q2 / Q1)^2",
                reference: CodeReference::Ashrae { volume: "Systems and Equipment", year: 2020, chapter: 21 },
                variables: vec![
                    Variable::new("SP", "Fan static pressure", "in. wg"),
                    Variable::new("Q", "Airflow", "CFM"),
                ],
                assumptions: vec!["Fixed system curve", "Constant density"],
                category: EquationCategory::FanLaws,
                source_module: "equations/fan.rs",
                source_function: "fan_law_pressure",
            },

            Equation::FanLawPower => EquationMetadata {
                name: "Fan Law 3 - Power",
                description: "Brake horsepower at a new airflow",
                formula_typst: r#"$"BHP"_2 = "BHP"_1 (Q_2 / Q_1)^3$"#,
                formula_plain: "BHP2 = BHP1 * (Q2 / Q1)^3",
                reference: CodeReference::Ashrae { volume: "Systems and Equipment", year: 2020, chapter: 21 },
                variables: vec![
                    Variable::new("BHP", "Brake horsepower", "hp"),
                    Variable::new("Q", "Airflow", "CFM"),
                ],
                assumptions: vec!["Fixed system curve", "Constant fan efficiency"],
                category: EquationCategory::FanLaws,
                source_module: "equations/fan.rs",
                source_function: "fan_law_power",
            },

            Equation::MotorInputPower => EquationMetadata {
                name: "Motor Input Power",
                description: "Electrical input power from measured volts and amps",
                formula_typst: r#"$P = sqrt(3) V I "PF" / 1000$"#,
                formula_plain: "P = sqrt(3) * V * I * PF / 1000 (three-phase)",
                reference: CodeReference::Fundamentals,
                variables: vec![
                    Variable::new("P", "Input power", "kW"),
                    Variable::new("V", "Line voltage", "V"),
                    Variable::new("I", "Line current", "A"),
                    Variable::new("PF", "Power factor", "-"),
                ],
                assumptions: vec!["Balanced phases", "Single-phase drops the √3 factor"],
                category: EquationCategory::Electrical,
                source_module: "equations/fan.rs",
                source_function: "motor_input_kw",
            },
        }
    }

    /// Get all equations in a given category
    pub fn in_category(category: EquationCategory) -> Vec<Equation> {
        ALL_EQUATIONS
            .iter()
            .filter(|eq| eq.metadata().category == category)
            .copied()
            .collect()
    }

    /// Get all categories, in report order
    pub fn all_categories() -> Vec<EquationCategory> {
        use EquationCategory::*;
        let mut cats = vec![DuctGeometry, Airflow, Balancing, Thermal, FanLaws, Electrical];
        cats.sort_by_key(|c| c.sort_order());
        cats
    }
}

/// All equations in the registry (for iteration)
pub static ALL_EQUATIONS: &[Equation] = &[
    Equation::RectangularDuctArea,
    Equation::RoundDuctArea,
    Equation::AirflowFromVelocity,
    Equation::PitotVelocity,
    Equation::TraverseAverage,
    Equation::PercentOfDesign,
    Equation::IndexTargetFlow,
    Equation::DamperCloseSuggestion,
    Equation::TemperatureSplit,
    Equation::SensibleHeat,
    Equation::FanLawSpeed,
    Equation::FanLawPressure,
    Equation::FanLawPower,
    Equation::MotorInputPower,
];

// ============================================================================
// Equation Usage Tracking
// ============================================================================

/// Record of an equation being used in a calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationUsage {
    /// The equation that was used
    pub equation: Equation,
    /// Context describing where/why it was used (e.g., "Outlet D-3")
    pub context: String,
    /// The calculation item label this equation was applied to
    pub item_label: Option<String>,
}

impl EquationUsage {
    /// Create a new equation usage record
    pub fn new(equation: Equation, context: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
            item_label: None,
        }
    }

    /// Create usage record with item label
    pub fn for_item(equation: Equation, context: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
            item_label: Some(label.into()),
        }
    }
}

/// Collector for equation usage during a calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquationTracker {
    usages: Vec<EquationUsage>,
}

impl EquationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an equation was used
    pub fn record(&mut self, equation: Equation, context: impl Into<String>) {
        self.usages.push(EquationUsage::new(equation, context));
    }

    /// Record equation usage for a specific calculation item
    pub fn record_for_item(&mut self, equation: Equation, context: impl Into<String>, label: impl Into<String>) {
        self.usages.push(EquationUsage::for_item(equation, context, label));
    }

    /// Get all recorded usages
    pub fn usages(&self) -> &[EquationUsage] {
        &self.usages
    }

    /// Get unique equations used, in first-use order
    pub fn unique_equations(&self) -> Vec<Equation> {
        let mut seen = HashSet::new();
        self.usages
            .iter()
            .filter(|u| seen.insert(u.equation))
            .map(|u| u.equation)
            .collect()
    }

    /// Group usages by equation
    pub fn by_equation(&self) -> HashMap<Equation, Vec<&EquationUsage>> {
        let mut map: HashMap<Equation, Vec<&EquationUsage>> = HashMap::new();
        for usage in &self.usages {
            map.entry(usage.equation).or_default().push(usage);
        }
        map
    }

    /// Group unique equations by category, in report order
    pub fn by_category(&self) -> Vec<(EquationCategory, Vec<Equation>)> {
        let mut by_cat: HashMap<EquationCategory, Vec<Equation>> = HashMap::new();
        for eq in self.unique_equations() {
            by_cat.entry(eq.metadata().category).or_default().push(eq);
        }

        let mut result: Vec<_> = by_cat.into_iter().collect();
        result.sort_by_key(|(cat, _)| cat.sort_order());
        result
    }

    /// Merge another tracker into this one
    pub fn merge(&mut self, other: EquationTracker) {
        self.usages.extend(other.usages);
    }
}

// ============================================================================
// Typst Appendix Generation
// ============================================================================

impl EquationTracker {
    /// Generate Typst markup for the "List of Equations" appendix.
    ///
    /// ```rust
    /// use tab_core::equations::registry::{Equation, EquationTracker};
    ///
    /// let mut tracker = EquationTracker::new();
    /// tracker.record_for_item(Equation::AirflowFromVelocity, "Main duct", "AHU-1 traverse");
    ///
    /// let typst = tracker.generate_appendix_typst();
    /// assert!(typst.contains("Airflow from Velocity"));
    /// ```
    pub fn generate_appendix_typst(&self) -> String {
        let mut output = String::new();

        output.push_str(r##"
#pagebreak()

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Appendix: List of Equations]
  ]
]

#v(12pt)
"##);

        let by_category = self.by_category();
        if by_category.is_empty() {
            output.push_str("#text(style: \"italic\")[No equations recorded for this project.]\n");
            return output;
        }

        let usage_by_eq = self.by_equation();

        for (category, equations) in by_category {
            output.push_str(&format!("\n== {}\n\n", category.display_name()));

            for equation in equations {
                let meta = equation.metadata();
                output.push_str(&format!("=== {}\n\n", meta.name));
                output.push_str(&format!("#text(size: 10pt)[{}]\n\n", meta.description));
                output.push_str(&format!("*Formula:* {}\n\n", meta.formula_typst));
                output.push_str(&format!("*Reference:* {}\n\n", meta.reference.citation()));

                if let Some(usages) = usage_by_eq.get(&equation) {
                    let mut labels: Vec<&str> = usages
                        .iter()
                        .filter_map(|u| u.item_label.as_deref())
                        .collect();
                    labels.sort();
                    labels.dedup();
                    if !labels.is_empty() {
                        let escaped: Vec<String> = labels.iter().map(|l| escape_typst_text(l)).collect();
                        output.push_str(&format!("*Applied to:* {}\n\n", escaped.join(", ")));
                    }
                }

                if !meta.assumptions.is_empty() {
                    output.push_str("*Assumptions:*\n");
                    for assumption in &meta.assumptions {
                        output.push_str(&format!("- {}\n", assumption));
                    }
                    output.push('\n');
                }

                output.push_str("#line(length: 100%, stroke: 0.25pt + gray)\n\n");
            }
        }

        output
    }
}

// Labels are user-entered and may contain Typst markup characters
pub(crate) fn escape_typst_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Generate the EQUATIONS.md reference document from the registry.
///
/// ```rust
/// use tab_core::equations::registry::generate_equations_markdown;
///
/// let markdown = generate_equations_markdown();
/// assert!(markdown.contains("HVAC TAB Equations Reference"));
/// assert!(markdown.contains("## Airflow"));
/// ```
pub fn generate_equations_markdown() -> String {
    let mut output = String::with_capacity(16_000);

    output.push_str(r#"# HVAC TAB Equations Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-equations`

Every formula applied to field readings, with its reference and source location.

## Conventions

| Quantity | Convention |
|----------|------------|
| Air | Standard air, 0.075 lb/ft³ |
| Temperature split | Entering minus leaving |
| Flow units | Normalised to m³/s for balancing sheets |

---

"#);

    let categories = Equation::all_categories();

    for category in &categories {
        let equations = Equation::in_category(*category);
        if equations.is_empty() {
            continue;
        }

        output.push_str(&format!("## {}\n\n", category.display_name()));

        for equation in equations {
            let meta = equation.metadata();
            output.push_str(&format!("### {}\n\n", meta.name));
            output.push_str(&format!("{}\n\n", meta.description));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));

            if !meta.variables.is_empty() {
                output.push_str("| Symbol | Description | Units |\n");
                output.push_str("|--------|-------------|-------|\n");
                for var in &meta.variables {
                    output.push_str(&format!("| {} | {} | {} |\n", var.symbol, var.description, var.units));
                }
                output.push('\n');
            }

            output.push_str(&format!("**Reference:** {}\n\n", meta.reference.citation()));
            output.push_str(&format!(
                "**Source:** [`{}`]({})\n\n",
                meta.source_function, meta.source_module
            ));

            if !meta.assumptions.is_empty() {
                output.push_str("**Assumptions:**\n");
                for assumption in &meta.assumptions {
                    output.push_str(&format!("- {}\n", assumption));
                }
                output.push('\n');
            }

            output.push_str("---\n\n");
        }
    }

    output.push_str(&format!(
        "## Statistics\n\n- **Total Equations:** {}\n- **Categories:** {}\n",
        ALL_EQUATIONS.len(),
        categories.len()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_equations_have_metadata() {
        assert_eq!(ALL_EQUATIONS.len(), 14);

        for eq in ALL_EQUATIONS {
            let meta = eq.metadata();
            assert!(!meta.name.is_empty(), "Equation {:?} has no name", eq);
            assert!(!meta.formula_typst.is_empty(), "Equation {:?} has no formula", eq);
            assert!(!meta.variables.is_empty(), "Equation {:?} has no variables", eq);
            assert!(!meta.source_function.is_empty(), "Equation {:?} has no source", eq);
        }

        let q = Equation::AirflowFromVelocity.metadata();
        assert!(q.formula_plain.contains("V * A"));
    }

    #[test]
    fn test_citation() {
        let ashrae = CodeReference::Ashrae { volume: "Fundamentals", year: 2021, chapter: 36 };
        assert_eq!(ashrae.citation(), "ASHRAE Handbook - Fundamentals 2021, Ch. 36");
        assert_eq!(CodeReference::Aabc { edition: 7, chapter: 9 }.short_form(), "AABC");
    }

    #[test]
    fn test_every_category_has_equations() {
        for cat in Equation::all_categories() {
            assert!(!Equation::in_category(cat).is_empty(), "{:?} is empty", cat);
        }
    }

    #[test]
    fn test_tracker_dedup_and_grouping() {
        let mut tracker = EquationTracker::new();
        tracker.record(Equation::PercentOfDesign, "D-1");
        tracker.record(Equation::PercentOfDesign, "D-2");
        tracker.record(Equation::SensibleHeat, "Coil");

        assert_eq!(tracker.usages().len(), 3);
        assert_eq!(tracker.unique_equations(), vec![Equation::PercentOfDesign, Equation::SensibleHeat]);

        let by_cat = tracker.by_category();
        assert_eq!(by_cat[0].0, EquationCategory::Airflow);
        assert_eq!(by_cat[1].0, EquationCategory::Thermal);
    }

    #[test]
    fn test_appendix_lists_item_labels() {
        let mut tracker = EquationTracker::new();
        tracker.record_for_item(Equation::DamperCloseSuggestion, "Outlet D-2", "FCU_1");
        let typst = tracker.generate_appendix_typst();
        assert!(typst.contains("Suggested Damper Closure"));
        assert!(typst.contains("FCU\\_1"));
    }

    #[test]
    fn test_appendix_empty_tracker() {
        let typst = EquationTracker::new().generate_appendix_typst();
        assert!(typst.contains("No equations recorded"));
    }

    #[test]
    fn test_generate_equations_markdown() {
        let markdown = generate_equations_markdown();
        assert!(markdown.contains("## Fan Laws"));
        assert!(markdown.contains("`Q = V * A`"));
        assert!(markdown.contains("**Total Equations:** 14"));
        assert!(markdown.contains("**Categories:** 6"));
    }
}
