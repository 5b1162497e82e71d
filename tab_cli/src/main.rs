//! hvac-tab - HVAC testing, adjusting and balancing calculations
//!
//! Runs single calculations from prompts or an input file, and manages
//! `.htab` project files (starter sheets, text/CSV/PDF reports).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tab_core::calculations::{balance, BalanceInput, CalculationItem, OutletReading};
use tab_core::errors::{CalcError, CalcResult};
use tab_core::file_io::{load_project, load_project_with_lock_check, save_project, write_atomic, FileLock};
use tab_core::measurement::{Field, MeasurementRecord};
use tab_core::pdf::render_project_pdf;
use tab_core::procedures::ProcedureType;
use tab_core::project::{Project, TabSettings};
use tab_core::report::{render_balance_csv, render_project_text};
use tab_core::runner::{self, CalculationKind};
use tab_core::units::{Cfm, FlowUnit, TemperatureScale};
use tracing::{info, warn};

mod prompt;

use prompt::Prompter;

/// Exit status for measurement problems; everything else exits 1
const EXIT_INPUT_ERROR: i32 = 2;

/// Lock holder name when no technician is known
const LOCK_USER: &str = "hvac-tab";

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("warning: logging disabled: {error}");
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        process::exit(exit_code(&error));
    }
}

fn exit_code(error: &CalcError) -> i32 {
    if error.is_input_error() {
        EXIT_INPUT_ERROR
    } else {
        1
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("HVAC_TAB_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
}

fn run(cli: Cli) -> CalcResult<()> {
    match cli.command {
        Command::Run(args) => execute_run(args),
        Command::Airflow(args) => execute_airflow(args),
        Command::Checklist { procedure } => execute_checklist(procedure.as_deref()),
        Command::Init(args) => execute_init(args),
        Command::Report(args) => execute_report(args),
        Command::Outlet { action } => execute_outlet(action),
        Command::Step { action } => execute_step(action),
    }
}

fn execute_run(args: RunArgs) -> CalcResult<()> {
    let settings = args.overrides.apply(TabSettings::default())?;

    let record = match &args.input {
        Some(path) => MeasurementRecord::from_file(path)?,
        None => Prompter::new(io::stdin().lock(), io::stdout().lock()).collect(args.kind, &settings)?,
    };

    let text = runner::run(args.kind, &record, &settings)?.to_string();
    emit(&text, None)?;
    if let Some(path) = &args.output {
        write_report(path, text.as_bytes())?;
    }
    Ok(())
}

fn execute_airflow(args: AirflowArgs) -> CalcResult<()> {
    let settings = args.overrides.apply(TabSettings::default())?;
    let to_cfm = |value: f64| Cfm::from(args.unit.to_m3s(value)).value();

    let record = MeasurementRecord::new()
        .with(Field::DesignCfm, to_cfm(args.design))?
        .with(Field::MeasuredCfm, to_cfm(args.measured))?;

    let report = runner::run(CalculationKind::PercentOfDesign, &record, &settings)?;
    emit(&report.to_string(), None)
}

fn execute_checklist(procedure: Option<&str>) -> CalcResult<()> {
    let mut out = String::new();
    match procedure {
        Some(name) => {
            let procedure = ProcedureType::from_str_flexible(name)?;
            out.push_str(&format!("{}\n", procedure.display_name()));
            for (i, step) in procedure.steps().iter().enumerate() {
                out.push_str(&format!("{:>3}. {}\n", i + 1, step));
            }
        }
        None => {
            for procedure in ProcedureType::ALL {
                out.push_str(&format!("{:<16}{}\n", procedure.code(), procedure.display_name()));
            }
        }
    }
    emit(&out, None)
}

fn execute_init(args: InitArgs) -> CalcResult<()> {
    if args.path.exists() && !args.force {
        return Err(CalcError::file_error(
            "create",
            args.path.display().to_string(),
            "file already exists (use --force to overwrite)",
        ));
    }

    let mut project = Project::new(&args.technician, &args.job, &args.client);
    if let Some(unit) = args.unit {
        project.settings.flow_unit = unit;
    }

    if let Some(name) = &args.procedure {
        let procedure = ProcedureType::from_str_flexible(name)?;
        let design = args.design.unwrap_or_default();
        let label = args.system.as_deref().unwrap_or(procedure.code());
        let mut sheet = BalanceInput::new(label, design, project.settings.flow_unit);
        sheet.procedure = procedure;
        sheet.outlets = (1..=args.outlets).map(|n| OutletReading::new(format!("O{}", n), 0.0)).collect();
        sheet.validate()?;
        project.add_item(CalculationItem::Balance(sheet));
    }

    let user = if args.technician.is_empty() { LOCK_USER } else { args.technician.as_str() };
    let _lock = FileLock::acquire(&args.path, user)?;
    save_project(&project, &args.path)?;

    println!("Created {}", args.path.display());
    Ok(())
}

fn execute_report(args: ReportArgs) -> CalcResult<()> {
    let (project, lock) = load_project_with_lock_check(&args.path)?;
    if let Some(holder) = lock {
        warn!(path = %args.path.display(), user = %holder.user_id, "project is open elsewhere; report may be stale");
    }

    emit(&render_project_text(&project), args.output.as_deref())?;

    if let Some(path) = &args.csv {
        write_report(path, project_csv(&project)?.as_bytes())?;
    }
    if let Some(path) = &args.pdf {
        write_report(path, &render_project_pdf(&project)?)?;
    }
    Ok(())
}

fn execute_outlet(action: OutletAction) -> CalcResult<()> {
    match action {
        OutletAction::Add(args) => edit_sheet(&args.target, |sheet| {
            let mut outlet = OutletReading::new(args.id.as_str(), args.flow.unwrap_or_default());
            outlet.design_flow = args.design;
            outlet.static_pa = args.static_pa;
            outlet.note = args.note.clone().unwrap_or_default();
            sheet.add_outlet(outlet)?;
            Ok(format!("added outlet {}", args.id))
        }),
        OutletAction::Set(args) => edit_sheet(&args.target, |sheet| {
            if args.flow.is_none() && args.design.is_none() && args.static_pa.is_none() && args.note.is_none() {
                return Err(CalcError::invalid_input(
                    "outlet",
                    args.id.as_str(),
                    "Nothing to change; give --flow, --design, --static-pa or --note",
                ));
            }
            let outlet = sheet.outlet_mut(&args.id)?;
            if let Some(flow) = args.flow {
                outlet.flow = flow;
            }
            if args.design.is_some() {
                outlet.design_flow = args.design;
            }
            if args.static_pa.is_some() {
                outlet.static_pa = args.static_pa;
            }
            if let Some(note) = &args.note {
                outlet.note = note.clone();
            }
            Ok(format!("updated outlet {}", args.id))
        }),
        OutletAction::Remove(args) => edit_sheet(&args.target, |sheet| {
            sheet.remove_outlet(&args.id)?;
            Ok(format!("removed outlet {}", args.id))
        }),
    }
}

fn execute_step(action: StepAction) -> CalcResult<()> {
    match action {
        StepAction::Done(args) => edit_sheet(&args.target, |sheet| {
            let mut done = Vec::with_capacity(args.steps.len());
            for &number in &args.steps {
                // Steps are numbered from 1 as printed by `checklist`
                let index = number
                    .checked_sub(1)
                    .ok_or_else(|| CalcError::invalid_input("step", "0", "Steps are numbered from 1"))?;
                sheet.checklist.complete(sheet.procedure, index)?;
                done.push(number.to_string());
            }
            let outstanding = sheet.checklist.outstanding(sheet.procedure).len();
            Ok(format!("step {} done, {} outstanding", done.join(", "), outstanding))
        }),
    }
}

/// Lock a project, change one balancing sheet and save it.
///
/// The sheet is validated after the change; nothing is written when the
/// change or the validation fails.
fn edit_sheet<F>(target: &SheetTarget, edit: F) -> CalcResult<()>
where
    F: FnOnce(&mut BalanceInput) -> CalcResult<String>,
{
    let _lock = FileLock::acquire(&target.path, LOCK_USER)?;
    let mut project = load_project(&target.path)?;

    let sheet = project.balance_sheet_mut(target.sheet.as_deref())?;
    let summary = edit(sheet)?;
    sheet.validate()?;
    let label = sheet.label.clone();

    save_project(&project, &target.path)?;
    info!(path = %target.path.display(), sheet = %label, "{}", summary);
    println!("{}: {}", label, summary);
    Ok(())
}

/// Every balancing sheet in the project, one block after another.
fn project_csv(project: &Project) -> CalcResult<String> {
    let mut out = String::new();
    for (_, item) in project.items_sorted() {
        if let CalculationItem::Balance(input) = item {
            let result = balance::calculate(input)?;
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&render_balance_csv(project, input, &result));
        }
    }
    if out.is_empty() {
        return Err(CalcError::invalid_input(
            "csv",
            project.meta.job_id.clone(),
            "Project has no balancing sheets to export",
        ));
    }
    Ok(out)
}

/// Print to stdout, or write to `path` when given.
fn emit(text: &str, path: Option<&Path>) -> CalcResult<()> {
    match path {
        Some(path) => write_report(path, text.as_bytes()),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| CalcError::file_error("write", "<stdout>", e.to_string()))
        }
    }
}

fn write_report(path: &Path, contents: &[u8]) -> CalcResult<()> {
    write_atomic(path, contents)?;
    info!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}

#[derive(Parser)]
#[command(name = "hvac-tab", author, version, about = "HVAC testing, adjusting and balancing calculations.")]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one calculation from prompts or an input file.
    Run(RunArgs),

    /// Percent of design airflow from two readings.
    Airflow(AirflowArgs),

    /// Print the checklist for a procedure, or list the procedures.
    Checklist {
        /// Procedure code or name (fcu, ahu, extract, terminals, pressurization)
        procedure: Option<String>,
    },

    /// Write a starter project file.
    Init(InitArgs),

    /// Render a project as text, CSV or PDF.
    Report(ReportArgs),

    /// Add, change or remove outlet readings on a balancing sheet.
    Outlet {
        #[command(subcommand)]
        action: OutletAction,
    },

    /// Record procedure steps as done on a balancing sheet.
    Step {
        #[command(subcommand)]
        action: StepAction,
    },
}

#[derive(Subcommand)]
enum OutletAction {
    /// Append an outlet to the end of the run.
    Add(OutletArgs),

    /// Change readings on an existing outlet.
    Set(OutletArgs),

    /// Remove an outlet.
    Remove(OutletId),
}

#[derive(Subcommand)]
enum StepAction {
    /// Mark steps done, numbered as `checklist` prints them.
    Done(StepArgs),
}

/// Project file and the balancing sheet within it.
#[derive(Args)]
struct SheetTarget {
    /// Project file
    path: PathBuf,

    /// Label of the balancing sheet; may be left out when there is only one
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Args)]
struct OutletArgs {
    #[command(flatten)]
    target: SheetTarget,

    /// Outlet or branch id (e.g. D1)
    id: String,

    /// Measured flow, in the sheet's unit
    #[arg(long, allow_hyphen_values = true)]
    flow: Option<f64>,

    /// Outlet design flow, when it differs from the system design
    #[arg(long, allow_hyphen_values = true)]
    design: Option<f64>,

    /// Static pressure at the outlet (Pa)
    #[arg(long, allow_hyphen_values = true)]
    static_pa: Option<f64>,

    #[arg(long)]
    note: Option<String>,
}

#[derive(Args)]
struct OutletId {
    #[command(flatten)]
    target: SheetTarget,

    /// Outlet or branch id
    id: String,
}

#[derive(Args)]
struct StepArgs {
    #[command(flatten)]
    target: SheetTarget,

    /// Step numbers
    #[arg(required = true)]
    steps: Vec<usize>,
}

/// Settings a single run may override.
#[derive(Args)]
struct SettingOverrides {
    /// Temperatures are entered in °C
    #[arg(long)]
    celsius: bool,

    /// Acceptance band, ± percent of design
    #[arg(long)]
    tolerance: Option<f64>,
}

impl SettingOverrides {
    fn apply(&self, mut settings: TabSettings) -> CalcResult<TabSettings> {
        if self.celsius {
            settings.temperature_scale = TemperatureScale::Celsius;
        }
        if let Some(tolerance) = self.tolerance {
            settings.tolerance_pct = tolerance;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Args)]
struct RunArgs {
    /// Calculation to perform (percent-of-design, duct-airflow, pitot-velocity,
    /// temperature-split, fan-law, motor-power)
    kind: CalculationKind,

    /// JSON object or `name = value` lines; prompts on stdin when omitted
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Also write the report to this file
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingOverrides,
}

#[derive(Args)]
struct AirflowArgs {
    /// Design airflow
    #[arg(long)]
    design: f64,

    /// Measured airflow
    #[arg(long)]
    measured: f64,

    /// Unit of both readings (CFM, m3/s, m3/h, L/s)
    #[arg(long, default_value = "CFM")]
    unit: FlowUnit,

    #[command(flatten)]
    overrides: SettingOverrides,
}

#[derive(Args)]
struct InitArgs {
    /// Project file to create
    path: PathBuf,

    #[arg(long, default_value = "")]
    technician: String,

    #[arg(long, default_value = "")]
    job: String,

    #[arg(long, default_value = "")]
    client: String,

    /// Add a balancing sheet for this procedure
    #[arg(long, requires = "design")]
    procedure: Option<String>,

    /// System name for the balancing sheet
    #[arg(long)]
    system: Option<String>,

    /// System design flow for the balancing sheet
    #[arg(long)]
    design: Option<f64>,

    /// Flow unit for the project (CFM, m3/s, m3/h, L/s)
    #[arg(long)]
    unit: Option<FlowUnit>,

    /// Number of blank outlet rows on the sheet
    #[arg(long, default_value_t = 1)]
    outlets: usize,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Project file
    path: PathBuf,

    /// Write the text report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Export balancing sheets as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Export the project as PDF
    #[arg(long)]
    pdf: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hvac-tab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = parse(&["-v", "run", "percent-of-design", "--input", "reading.json"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.kind, CalculationKind::PercentOfDesign);
                assert_eq!(args.input, Some(PathBuf::from("reading.json")));
                assert!(args.output.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Cli::try_parse_from(["hvac-tab", "run", "psychrometrics"]).is_err());
    }

    #[test]
    fn test_procedure_requires_design() {
        assert!(Cli::try_parse_from(["hvac-tab", "init", "job.htab", "--procedure", "ahu"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&CalcError::invalid_input("design_cfm", "abc", "Not a number")), 2);
        assert_eq!(exit_code(&CalcError::division_by_zero("percent of design", "design_cfm")), 2);
        assert_eq!(exit_code(&CalcError::missing_field("measured_cfm")), 2);
        assert_eq!(exit_code(&CalcError::file_error("read", "x", "gone")), 1);
    }

    #[test]
    fn test_overrides() {
        let overrides = SettingOverrides { celsius: true, tolerance: Some(5.0) };
        let settings = overrides.apply(TabSettings::default()).unwrap();
        assert_eq!(settings.temperature_scale, TemperatureScale::Celsius);
        assert_eq!(settings.tolerance_pct, 5.0);

        let bad = SettingOverrides { celsius: false, tolerance: Some(-1.0) };
        assert!(bad.apply(TabSettings::default()).unwrap_err().is_input_error());
    }

    #[test]
    fn test_run_from_file_writes_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reading.txt");
        let output = dir.path().join("result.txt");
        fs::write(&input, "design_cfm = 1000\nmeasured_cfm = 950\n").unwrap();

        let cli = parse(&[
            "run",
            "percent-of-design",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        run(cli).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("95.0% of design airflow.\n"));
    }

    #[test]
    fn test_run_with_non_numeric_input_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reading.txt");
        let output = dir.path().join("result.txt");
        fs::write(&input, "design_cfm = lots\nmeasured_cfm = 950\n").unwrap();

        let cli = parse(&["run", "percent-of-design", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
        let err = run(cli).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert!(!output.exists());
    }

    #[test]
    fn test_airflow_zero_design() {
        let cli = parse(&["airflow", "--design", "0", "--measured", "950"]);
        let err = run(cli).unwrap_err();
        assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
    }

    #[test]
    fn test_init_then_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ahu-1.htab");
        let text = dir.path().join("report.txt");
        let csv = dir.path().join("ahu-1.csv");

        let cli = parse(&[
            "init",
            path.to_str().unwrap(),
            "--technician",
            "Sam Tech",
            "--job",
            "J-1042",
            "--procedure",
            "ahu",
            "--system",
            "AHU-1",
            "--design",
            "4000",
            "--outlets",
            "3",
        ]);
        run(cli).unwrap();

        let project = load_project(&path).unwrap();
        assert_eq!(project.item_count(), 1);
        assert!(!path.with_extension("htab.lock").exists());

        let cli = parse(&[
            "report",
            path.to_str().unwrap(),
            "--output",
            text.to_str().unwrap(),
            "--csv",
            csv.to_str().unwrap(),
        ]);
        run(cli).unwrap();

        let report = fs::read_to_string(&text).unwrap();
        assert!(report.contains("Job: J-1042"));
        assert!(report.contains("== AHU-1 (Air Balance) =="));
        let csv = fs::read_to_string(&csv).unwrap();
        assert!(csv.contains("Outlet/Branch ID"));
        assert!(csv.contains("O3"));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.htab");
        fs::write(&path, "{}").unwrap();
        let err = run(parse(&["init", path.to_str().unwrap()])).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    /// Starter project with one AHU sheet of `outlets` blank rows.
    fn starter(dir: &Path, outlets: &str) -> PathBuf {
        let path = dir.join("ahu-1.htab");
        let cli = parse(&[
            "init",
            path.to_str().unwrap(),
            "--procedure",
            "ahu",
            "--system",
            "AHU-1",
            "--design",
            "1000",
            "--unit",
            "L/s",
            "--outlets",
            outlets,
        ]);
        run(cli).unwrap();
        path
    }

    fn only_sheet(path: &Path) -> BalanceInput {
        let mut project = load_project(path).unwrap();
        project.balance_sheet_mut(None).unwrap().clone()
    }

    #[test]
    fn test_parse_outlet_set() {
        let cli = parse(&["outlet", "set", "job.htab", "D1", "--flow", "300", "--static-pa", "-12.5", "--sheet", "AHU-1"]);
        match cli.command {
            Command::Outlet { action: OutletAction::Set(args) } => {
                assert_eq!(args.target.path, PathBuf::from("job.htab"));
                assert_eq!(args.target.sheet.as_deref(), Some("AHU-1"));
                assert_eq!(args.id, "D1");
                assert_eq!(args.flow, Some(300.0));
                assert_eq!(args.static_pa, Some(-12.5));
                assert!(args.design.is_none());
            }
            _ => panic!("expected outlet set"),
        }
    }

    #[test]
    fn test_outlet_add_set_remove() {
        let dir = tempdir().unwrap();
        let path = starter(dir.path(), "1");
        let p = path.to_str().unwrap();

        run(parse(&["outlet", "add", p, "D2", "--flow", "250", "--note", "Above ceiling"])).unwrap();
        run(parse(&["outlet", "set", p, "O1", "--flow", "300", "--design", "600"])).unwrap();

        let sheet = only_sheet(&path);
        assert_eq!(sheet.outlets.len(), 2);
        assert_eq!(sheet.outlets[0].flow, 300.0);
        assert_eq!(sheet.outlets[0].design_flow, Some(600.0));
        assert_eq!(sheet.outlets[1].id, "D2");
        assert_eq!(sheet.outlets[1].note, "Above ceiling");
        assert!(!path.with_extension("htab.lock").exists());

        run(parse(&["outlet", "remove", p, "O1"])).unwrap();
        let sheet = only_sheet(&path);
        assert_eq!(sheet.outlets.len(), 1);
        assert_eq!(sheet.outlets[0].id, "D2");

        let err = run(parse(&["outlet", "remove", p, "D2"])).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert_eq!(only_sheet(&path).outlets.len(), 1);
    }

    #[test]
    fn test_rejected_outlet_edit_leaves_file() {
        let dir = tempdir().unwrap();
        let path = starter(dir.path(), "2");
        let p = path.to_str().unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = run(parse(&["outlet", "add", p, "O1"])).unwrap_err();
        assert_eq!(err, CalcError::invalid_input("outlet.id", "O1", "Duplicate outlet id"));
        assert!(run(parse(&["outlet", "set", p, "O2", "--flow", "-5"])).is_err());
        assert!(run(parse(&["outlet", "set", p, "O2"])).is_err());
        assert!(run(parse(&["outlet", "set", p, "O9", "--flow", "5"])).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_step_done() {
        let dir = tempdir().unwrap();
        let path = starter(dir.path(), "1");
        let p = path.to_str().unwrap();

        run(parse(&["step", "done", p, "1", "3"])).unwrap();
        let sheet = only_sheet(&path);
        assert_eq!(sheet.checklist.completed, vec![0, 2]);

        assert!(run(parse(&["step", "done", p, "0"])).unwrap_err().is_input_error());
        assert!(run(parse(&["step", "done", p, "99"])).unwrap_err().is_input_error());
        assert_eq!(only_sheet(&path).checklist.completed, vec![0, 2]);
    }

    #[test]
    fn test_edit_refused_while_locked() {
        let dir = tempdir().unwrap();
        let path = starter(dir.path(), "1");
        let _held = FileLock::acquire(&path, "alex").unwrap();

        let err = run(parse(&["step", "done", path.to_str().unwrap(), "1"])).unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_csv_needs_balancing_sheet() {
        let project = Project::new("T", "J", "C");
        assert!(project_csv(&project).is_err());
    }
}
