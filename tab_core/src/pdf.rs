//! # PDF Reports
//!
//! Renders a whole project to PDF with an embedded Typst document: cover
//! block, summary table, one section per calculation and an appendix listing
//! every equation applied.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tab_core::pdf::render_project_pdf;
//! use tab_core::project::Project;
//!
//! let project = Project::new("Sam Tech", "J-1042", "ACME Hospital");
//! let pdf = render_project_pdf(&project).unwrap();
//! std::fs::write("tab_report.pdf", pdf).unwrap();
//! ```

use chrono::{Datelike, Utc};
use tracing::{debug, info};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::calculations::{BalanceInput, BalanceResult, CalculationItem, ItemResult};
use crate::equations::registry::{escape_typst_text as escape, EquationTracker};
use crate::errors::{CalcError, CalcResult};
use crate::project::Project;
use crate::report::{item_inputs, summarize, ReportLine};

// ============================================================================
// Typst World
// ============================================================================

/// Single-source Typst world; fonts come from typst-assets.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::new(data.to_vec())))
            .collect();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}

// ============================================================================
// Document
// ============================================================================

const HEADER_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2.5cm, bottom: 2.5cm, left: 2cm, right: 2cm),
  header: align(right)[
    #text(size: 9pt, fill: gray)[HVAC Testing, Adjusting & Balancing]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 10.5pt)

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 20pt, radius: 4pt)[
    #text(size: 22pt, weight: "bold")[HVAC Testing & Air Balancing Report]
    #v(8pt)
    #text(size: 14pt)[{{CLIENT}}]
  ]
]

#v(16pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Operator / Technician:], [{{TECHNICIAN}}],
  [Job:], [{{JOB_ID}}],
  [Client:], [{{CLIENT}}],
  [Date:], [{{DATE}}],
)

#v(16pt)

== Summary

#table(
  columns: (auto, 1fr, auto, 2fr),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, left, left, left),
  table.header([*No.*], [*Item*], [*Type*], [*Result*]),
{{SUMMARY_ROWS}}
)
"##;

/// Render an entire project to a single PDF.
///
/// Items are laid out in label order. An item that fails to evaluate still
/// gets a section showing its error.
///
/// # Errors
///
/// * `RenderFailed` - Typst compilation or PDF export failed
pub fn render_project_pdf(project: &Project) -> CalcResult<Vec<u8>> {
    let source = build_project_source(project);
    debug!(bytes = source.len(), "typst source built");

    let pdf = compile_pdf(source)?;
    info!(job = %project.meta.job_id, bytes = pdf.len(), "PDF rendered");
    Ok(pdf)
}

fn build_project_source(project: &Project) -> String {
    let evaluated = project.evaluate_all();
    let date = project.meta.modified.format("%Y-%m-%d").to_string();

    let summary_rows = evaluated
        .iter()
        .enumerate()
        .map(|(i, (item, result))| {
            let outcome = match result {
                Ok(r) => summarize(item, r, &project.settings).headline,
                Err(e) => format!("ERROR: {}", e),
            };
            format!(
                "  [{}], [{}], [{}], [{}],",
                i + 1,
                escape(item.label()),
                item.calc_type(),
                escape(&outcome)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut source = HEADER_TEMPLATE
        .replace("{{JOB_ID}}", &escape(&project.meta.job_id))
        .replace("{{CLIENT}}", &escape(&project.meta.client))
        .replace("{{TECHNICIAN}}", &escape(&project.meta.technician))
        .replace("{{DATE}}", &date)
        .replace("{{SUMMARY_ROWS}}", &summary_rows);

    let mut tracker = EquationTracker::new();
    for (item, result) in &evaluated {
        source.push_str(&format!("\n#pagebreak()\n\n== {} ({})\n\n", escape(item.label()), item.calc_type()));
        match result {
            Ok(result) => {
                let summary = summarize(item, result, &project.settings);
                source.push_str(&format!("*{}*\n\n", escape(&summary.headline)));
                source.push_str(&lines_table("Readings", &item_inputs(item, &project.settings)));
                if let (CalculationItem::Balance(input), ItemResult::Balance(balance)) = (item, result) {
                    // Outlets get their own table
                    let totals: Vec<ReportLine> = summary
                        .lines
                        .into_iter()
                        .filter(|l| !l.label.starts_with("Outlet "))
                        .collect();
                    source.push_str(&lines_table("Results", &totals));
                    source.push_str(&balance_section(input, balance));
                } else {
                    source.push_str(&lines_table("Results", &summary.lines));
                }
                for equation in item.equations() {
                    tracker.record_for_item(equation, item.calc_type(), item.label());
                }
            }
            Err(e) => {
                source.push_str(&format!(
                    "#block(fill: rgb(\"#f8d7da\"), inset: 10pt, radius: 4pt)[{}]\n",
                    escape(&e.to_string())
                ));
            }
        }
    }

    if !project.notes.trim().is_empty() {
        source.push_str("\n#v(16pt)\n== Final notes\n\n");
        source.push_str(&escape(project.notes.trim()).replace('\n', " \\\n"));
        source.push('\n');
    }

    source.push_str(&tracker.generate_appendix_typst());
    source
}

fn lines_table(title: &str, lines: &[ReportLine]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let rows: Vec<String> = lines
        .iter()
        .map(|l| format!("  [{}], [{}],", escape(&l.label), escape(&l.value)))
        .collect();
    format!(
        "=== {}\n\n#table(\n  columns: (1fr, auto),\n  inset: 6pt,\n  stroke: 0.5pt,\n{}\n)\n\n",
        title,
        rows.join("\n")
    )
}

fn balance_section(input: &BalanceInput, result: &BalanceResult) -> String {
    let unit = escape(result.flow_unit.label());
    let rows: Vec<String> = result
        .outlets
        .iter()
        .map(|o| {
            let id = if o.id == result.index_outlet {
                format!("*{}* (index)", escape(&o.id))
            } else {
                escape(&o.id)
            };
            format!(
                "  [{}], [{:.3}], [{:.1}], [{:.3}], [{:.1}], [{:.3}], [{}], [{}],",
                id,
                o.flow,
                o.percent_of_design,
                o.target_flow,
                o.suggested_close_pct,
                o.cumulative_flow,
                o.static_pa.map(|sp| format!("{}", sp)).unwrap_or_default(),
                escape(&o.note)
            )
        })
        .collect();

    let mut out = format!(
        r##"=== Outlets

#table(
  columns: (auto, auto, auto, auto, auto, auto, auto, 1fr),
  inset: 5pt,
  stroke: 0.5pt,
  align: (left, right, right, right, right, right, right, left),
  table.header([*Outlet*], [*Flow ({unit})*], [*% Design*], [*Target ({unit})*], [*Close %*], [*Cumulative ({unit})*], [*Static (Pa)*], [*Note*]),
{rows}
)

Total {total:.3} {unit} ({total_pct:.1} % of design). Balanced to {target:.1} % of design.

"##,
        unit = unit,
        rows = rows.join("\n"),
        total = result.total_flow,
        total_pct = result.total_percent,
        target = result.target_percent,
    );

    out.push_str(&balance_charts(input, result));

    out.push_str(&format!("=== Procedure: {}\n\n", escape(input.procedure.display_name())));
    for (i, step) in input.procedure.steps().iter().enumerate() {
        let mark = if input.checklist.is_done(i) { "☑" } else { "☐" };
        out.push_str(&format!("{} {}. {} \\\n", mark, i + 1, escape(step)));
    }
    out.push('\n');
    out
}

const MEASURED_FILL: &str = "#4a7ebb";
const TARGET_FILL: &str = "#9bbb59";
const CUMULATIVE_FILL: &str = "#8064a2";

/// Bar charts of measured against target flow, and of cumulative flow
/// along the run.
fn balance_charts(input: &BalanceInput, result: &BalanceResult) -> String {
    let unit = escape(result.flow_unit.label());

    let flow_scale = result
        .outlets
        .iter()
        .flat_map(|o| [o.flow, o.target_flow])
        .fold(0.0, f64::max);
    let flow_rows: Vec<String> = result
        .outlets
        .iter()
        .map(|o| {
            format!(
                "  [{}], stack(spacing: 1pt, {}, {}), [{:.3} / {:.3}],",
                escape(&o.id),
                bar(o.flow, flow_scale, MEASURED_FILL),
                bar(o.target_flow, flow_scale, TARGET_FILL),
                o.flow,
                o.target_flow
            )
        })
        .collect();

    // Cumulative bars share one scale so the last bar reads against design
    let cumulative_scale = result.total_flow.max(input.design_flow);
    let cumulative_rows: Vec<String> = result
        .outlets
        .iter()
        .map(|o| {
            format!(
                "  [{}], {}, [{:.3}],",
                escape(&o.id),
                bar(o.cumulative_flow, cumulative_scale, CUMULATIVE_FILL),
                o.cumulative_flow
            )
        })
        .collect();

    format!(
        r##"=== Measured vs target ({unit})

#box(rect(width: 8pt, height: 6pt, fill: rgb("{measured}"))) Measured #h(8pt) #box(rect(width: 8pt, height: 6pt, fill: rgb("{target}"))) Target

#grid(
  columns: (auto, 1fr, auto),
  column-gutter: 8pt,
  row-gutter: 5pt,
  align: (left + horizon, left + horizon, right + horizon),
{flow_rows}
)

=== Cumulative flow ({unit})

Bars are scaled to {scale:.3} {unit}, the larger of the total and the design flow.

#grid(
  columns: (auto, 1fr, auto),
  column-gutter: 8pt,
  row-gutter: 5pt,
  align: (left + horizon, left + horizon, right + horizon),
{cumulative_rows}
)

"##,
        unit = unit,
        measured = MEASURED_FILL,
        target = TARGET_FILL,
        flow_rows = flow_rows.join("\n"),
        scale = cumulative_scale,
        cumulative_rows = cumulative_rows.join("\n"),
    )
}

/// Typst bar whose width is `value` as a share of `scale`.
fn bar(value: f64, scale: f64, fill: &str) -> String {
    let share = if scale > 0.0 { (value / scale * 100.0).clamp(0.0, 100.0) } else { 0.0 };
    format!(r#"rect(width: {:.1}%, height: 6pt, fill: rgb("{}"))"#, share, fill)
}

fn compile_pdf(source: String) -> CalcResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::RenderFailed {
            reason: format!("Typst compilation failed: {}", messages.join("; ")),
        }
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::RenderFailed {
            reason: format!("PDF export failed: {}", messages.join("; ")),
        }
    })
}
