//! Project files on disk: saving, locking, reports.

use std::fs;

use tab_core::calculations::{balance, AirflowCheckInput, BalanceInput, CalculationItem, ItemResult, OutletReading};
use tab_core::file_io::{load_project, save_project, FileLock};
use tab_core::procedures::ProcedureType;
use tab_core::project::Project;
use tab_core::report::{render_balance_csv, render_project_text};
use tab_core::units::FlowUnit;
use tempfile::tempdir;

fn ahu_sheet() -> BalanceInput {
    let mut sheet = BalanceInput::new("AHU-1", 1000.0, FlowUnit::LitresPerSec);
    sheet.procedure = ProcedureType::AirHandlingUnit;
    sheet.outlets = vec![
        OutletReading::new("D1", 300.0),
        OutletReading::new("D2", 250.0),
        OutletReading::new("D3", 280.0),
    ];
    sheet.outlets[0].note = "Riser 2, above ceiling".to_string();
    sheet.fan.rpm = Some(1150.0);
    sheet.fan.on_coil_temp = Some(26.0);
    sheet.fan.off_coil_temp = Some(13.5);
    sheet.checklist.complete(ProcedureType::AirHandlingUnit, 0).unwrap();
    sheet
}

fn sample_project() -> Project {
    let mut project = Project::new("Sam Tech", "J-1042", "ACME Hospital");
    project.notes = "Retest D2 after ceiling works".to_string();
    project.add_item(CalculationItem::Balance(ahu_sheet()));
    project.add_item(CalculationItem::AirflowCheck(AirflowCheckInput {
        label: "EF-1".to_string(),
        design_cfm: 1000.0,
        measured_cfm: 950.0,
    }));
    project
}

#[test]
fn save_and_load_preserves_items() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("acme.htab");
    let project = sample_project();

    save_project(&project, &path).unwrap();
    let loaded = load_project(&path).unwrap();

    assert_eq!(loaded.items, project.items);
    assert_eq!(loaded.notes, project.notes);
    assert_eq!(loaded.meta.modified, project.meta.modified);
}

#[test]
fn loaded_balance_finds_index_outlet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("acme.htab");
    save_project(&sample_project(), &path).unwrap();
    let project = load_project(&path).unwrap();

    let (item, result) = project
        .evaluate_all()
        .into_iter()
        .find(|(item, _)| item.label() == "AHU-1")
        .unwrap();
    assert_eq!(item.calc_type(), "Air Balance");

    match result.unwrap() {
        ItemResult::Balance(r) => {
            assert_eq!(r.index_outlet, "D2");
            assert!((r.target_percent - 25.0).abs() < 1e-9);
            let d2 = r.outlets.iter().find(|o| o.id == "D2").unwrap();
            assert_eq!(d2.suggested_close_pct, 0.0);
            assert!(r.outlets_to_adjust().all(|o| o.id != "D2"));
            assert!(r.outlets[0].suggested_close_pct > 0.0);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn second_lock_on_same_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("acme.htab");
    save_project(&sample_project(), &path).unwrap();

    let first = FileLock::acquire(&path, "sam").unwrap();
    let err = FileLock::acquire(&path, "alex").err().unwrap();
    assert_eq!(err.error_code(), "FILE_LOCKED");
    assert!(err.is_recoverable());

    drop(first);
    assert!(FileLock::acquire(&path, "alex").is_ok());
}

#[test]
fn text_report_is_stable_across_reloads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("acme.htab");
    save_project(&sample_project(), &path).unwrap();

    let first = render_project_text(&load_project(&path).unwrap());
    let second = render_project_text(&load_project(&path).unwrap());
    assert_eq!(first, second);

    assert!(first.contains("Client: ACME Hospital"));
    let ahu = first.find("== AHU-1 (Air Balance) ==").unwrap();
    let ef = first.find("== EF-1 (Airflow Check) ==").unwrap();
    assert!(ahu < ef);
    assert!(first.contains("Index outlet D2 at 25.0% of design."));
    assert!(first.contains("95.0% of design airflow."));
    assert!(first.contains("Final notes:\nRetest D2 after ceiling works"));
}

#[test]
fn failing_item_is_reported_not_fatal() {
    let mut project = sample_project();
    project.add_item(CalculationItem::AirflowCheck(AirflowCheckInput {
        label: "FCU-9".to_string(),
        design_cfm: 0.0,
        measured_cfm: 400.0,
    }));
    let text = render_project_text(&project);
    assert!(text.contains("ERROR [DIVISION_BY_ZERO]"));
    assert!(text.contains("Index outlet D2"));
}

#[test]
fn balance_csv_quotes_notes() {
    let project = sample_project();
    let sheet = ahu_sheet();
    let result = balance::calculate(&sheet).unwrap();
    let csv = render_balance_csv(&project, &sheet, &result);

    assert!(csv.starts_with("HVAC Testing & Air Balancing Report\n"));
    assert!(csv.contains("Procedure Type,Air Handling Unit (AHU)\n"));
    assert!(csv.contains("D1,0.300000,300,30.0,,\"Riser 2, above ceiling\",16.7,250.000,300\n"));
    assert!(csv.contains("D3,0.280000,280,28.0,,,10.7,250.000,830\n"));
    assert!(csv.contains("Index outlet,D2\n"));

    let dir = tempdir().unwrap();
    let path = dir.path().join("ahu-1.csv");
    tab_core::file_io::write_atomic(&path, csv.as_bytes()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), csv);
}
