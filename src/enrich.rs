//! Work-order enrichment pipeline.
//!
//! Turns raw rows into [`EnrichedWorkOrder`]s. Enrichment is a pure function
//! of a single row: no I/O, no shared state, and output order follows input
//! order, so the streaming read path (one row at a time) and the batch path
//! produce identical records.

use crate::classifier;
use crate::dates;
use crate::models::{CellValue, Column, EnrichedWorkOrder, EquipmentType, RawWorkOrder, Status};
use crate::snag;

/// Value of `breakdown_location` when the row has no `Location`
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Enrich one raw row.
#[must_use]
pub fn enrich_row(row: &RawWorkOrder) -> EnrichedWorkOrder {
    let raw = row.filled();

    let combined_description = format!(
        "{} {}",
        raw.get(Column::WoName).to_text(),
        raw.get(Column::Description).to_text()
    );

    let creation_date = dates::normalize(creation_source(&raw));
    let execution_date = dates::normalize(raw.get(Column::JobexecDt));
    let duration_days = creation_date
        .zip(execution_date)
        .map(|(created, executed)| dates::days_between(created, executed));

    let equipment_type = EquipmentType::from_equipment(&raw.get(Column::Equipement).to_text());
    let status = Status::from_code(&raw.get(Column::Etatjob).to_text());

    let location = raw.get(Column::Location);
    let breakdown_location = if location.is_blank() {
        UNKNOWN_LOCATION.to_string()
    } else {
        location.to_text()
    };

    EnrichedWorkOrder {
        month: creation_date.map(dates::month_bucket),
        quarter: creation_date.map(dates::quarter_bucket),
        year: creation_date.map(dates::year_bucket),
        failure_cause: classifier::classify(&combined_description),
        snag_location: snag::locate(&combined_description),
        combined_description,
        creation_date,
        execution_date,
        duration_days,
        equipment_type,
        status,
        breakdown_location,
        raw,
    }
}

/// Enrich a batch, preserving order.
#[must_use]
pub fn enrich(rows: &[RawWorkOrder]) -> Vec<EnrichedWorkOrder> {
    rows.iter().map(enrich_row).collect()
}

/// Order date when present, otherwise start date.
fn creation_source(raw: &RawWorkOrder) -> &CellValue {
    let order = raw.get(Column::OrderDate);
    if order.is_blank() {
        raw.get(Column::StartDt)
    } else {
        order
    }
}
