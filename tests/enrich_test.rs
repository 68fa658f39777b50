//! End-to-end enrichment scenarios

use chrono::NaiveDate;
use workorder_insights::classifier::classify;
use workorder_insights::enrich::{enrich, enrich_row};
use workorder_insights::models::{CellValue, Column, EquipmentType, RawWorkOrder, Status};

fn hoist_row() -> RawWorkOrder {
    RawWorkOrder::new()
        .with(Column::WoKey, "WO001")
        .with(Column::WoName, "STS01 Repair")
        .with(Column::Description, "Hoist brake issue")
        .with(Column::Etatjob, "exe")
        .with(Column::OrderDate, "2024-01-10")
        .with(Column::StartDt, "2024-01-12")
        .with(Column::JobexecDt, "2024-01-15")
        .with(Column::Equipement, "STS01")
}

#[test]
fn test_hoist_brake_scenario() {
    let e = enrich_row(&hoist_row());

    assert_eq!(e.equipment_type, EquipmentType::Sts);
    assert_eq!(e.status, Status::ReadyForWork);
    assert_eq!(
        e.creation_date,
        NaiveDate::from_ymd_opt(2024, 1, 10).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
    assert_eq!(e.duration_days, Some(5));
    assert_eq!(e.failure_cause, "Hoist service brake");
    assert_eq!(e.snag_location, "");
    assert_eq!(e.combined_description, "STS01 Repair Hoist brake issue");
}

#[test]
fn test_snag_scenario() {
    let row = RawWorkOrder::new()
        .with(Column::WoKey, "WO002")
        .with(Column::WoName, "SP02")
        .with(Column::Description, "SNAG FAULT #1 #3")
        .with(Column::Etatjob, "ter")
        .with(Column::Equipement, "SP02");
    let e = enrich_row(&row);

    assert_eq!(e.failure_cause, "SP02 SNAG FAULT #1 #3");
    assert_eq!(e.snag_location, "Cylinder 13");
    assert_eq!(e.equipment_type, EquipmentType::Spreader);
    assert_eq!(e.status, Status::Completed);
    assert_eq!(e.duration_days, None);
}

#[test]
fn test_serial_dates_from_spreadsheet() {
    let row = hoist_row()
        .with(Column::OrderDate, 45_301_i64)
        .with(Column::JobexecDt, 45_306.75);
    let e = enrich_row(&row);

    assert_eq!(e.month.as_deref(), Some("2024-01"));
    assert_eq!(e.duration_days, Some(5));
}

#[test]
fn test_execution_before_creation_is_negative() {
    let row = hoist_row().with(Column::JobexecDt, "2024-01-08");
    assert_eq!(enrich_row(&row).duration_days, Some(-2));
}

#[test]
fn test_breakdown_location() {
    let e = enrich_row(&hoist_row().with(Column::Location, "Berth 3"));
    assert_eq!(e.breakdown_location, "Berth 3");
    let e = enrich_row(&hoist_row().with(Column::Location, ""));
    assert_eq!(e.breakdown_location, "Unknown");
}

#[test]
fn test_re_enrichment_is_stable() {
    let first = enrich_row(&hoist_row());
    let second = enrich_row(&first.raw);
    assert_eq!(first, second);
}

#[test]
fn test_batch_matches_single_row_enrichment() {
    let rows: Vec<RawWorkOrder> = (0..5)
        .map(|i| hoist_row().with(Column::WoKey, format!("WO{i:03}")))
        .collect();
    let batch = enrich(&rows);
    for (row, enriched) in rows.iter().zip(&batch) {
        assert_eq!(&enrich_row(row), enriched);
    }
}

#[test]
fn test_json_shape() {
    let e = enrich_row(&hoist_row());
    let json = serde_json::to_value(&e).expect("serialize");

    assert_eq!(json["WO_key"], "WO001");
    assert_eq!(json["status"], "Ready for Work");
    assert_eq!(json["equipment_type"], "STS");
    assert_eq!(json["duration_days"], 5);
    assert_eq!(json["creation_date"], "2024-01-10T00:00:00");
    assert_eq!(json["quarter"], "2024-Q1");
    assert!(json.get("Location").is_none());
}

#[test]
fn test_unparseable_dates_degrade_to_null() {
    let row = hoist_row()
        .with(Column::OrderDate, "soon")
        .with(Column::JobexecDt, CellValue::Empty);
    let json = serde_json::to_value(enrich_row(&row)).expect("serialize");
    assert!(json["creation_date"].is_null());
    assert!(json["duration_days"].is_null());
    assert!(json["month"].is_null());
    assert_eq!(json["Jobexec_dt"], "");
}

#[test]
fn test_classifier_passthrough_keeps_case() {
    assert_eq!(classify("Routine Inspection"), "Routine Inspection");
}
