//! Reading uploaded work-order files.
//!
//! Spreadsheets (`.xlsx`, `.xls`) are read with `calamine`, CSV files with
//! `csv`. Only the first worksheet is used and its first row is the header.
//! Columns outside the stored schema are dropped; required columns are
//! checked against the header before any row is kept.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveTime;
use tracing::debug;

use crate::dates;
use crate::error::{Result, WorkOrderError};
use crate::models::{CellValue, Column, RawWorkOrder};
use crate::validation::InputValidator;

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Excel workbook, read from its first sheet
    Spreadsheet,
    /// Comma-separated values with a header line
    Csv,
}

impl FileKind {
    /// Format for a lower-cased extension
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Rows read from an upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUpload {
    /// Header row as found in the file
    pub headers: Vec<String>,
    /// One row per non-blank data line, stored columns only
    pub rows: Vec<RawWorkOrder>,
}

/// Read an upload of the given kind and check its required columns.
pub fn read_upload(path: &Path, kind: FileKind) -> Result<ParsedUpload> {
    let parsed = match kind {
        FileKind::Spreadsheet => read_spreadsheet(path)?,
        FileKind::Csv => read_csv(path)?,
    };
    InputValidator::validate_required_columns(&parsed.headers)?;
    Ok(parsed)
}

/// Header positions of the stored columns; first occurrence wins.
fn column_positions(headers: &[String]) -> Vec<(usize, Column)> {
    let mut positions: Vec<(usize, Column)> = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        match Column::from_name(header.trim()) {
            Some(column) if !positions.iter().any(|(_, c)| *c == column) => {
                positions.push((index, column));
            }
            Some(column) => debug!(%column, index, "Ignoring duplicate column"),
            None => debug!(header = header.as_str(), "Dropping column outside the schema"),
        }
    }
    positions
}

/// `WO_key` is always stored as text; whole-number keys lose the `.0`.
fn key_cell(value: CellValue) -> CellValue {
    match value {
        CellValue::Integer(i) => CellValue::Text(i.to_string()),
        #[allow(clippy::cast_possible_truncation)]
        CellValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            CellValue::Text((f as i64).to_string())
        }
        CellValue::Float(f) => CellValue::Text(f.to_string()),
        other => other,
    }
}

fn build_row(positions: &[(usize, Column)], mut cell: impl FnMut(usize) -> CellValue) -> RawWorkOrder {
    positions
        .iter()
        .map(|(index, column)| {
            let value = cell(*index);
            let value = if *column == Column::WoKey {
                key_cell(value)
            } else {
                value
            };
            (*column, value)
        })
        .collect()
}

/// Read the first worksheet of a workbook.
pub fn read_spreadsheet(path: &Path) -> Result<ParsedUpload> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| WorkOrderError::InvalidFileContents("workbook has no worksheets".into()))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|row| row.iter().map(|c| spreadsheet_cell(c).to_text()).collect())
        .unwrap_or_default();
    let positions = column_positions(&headers);

    let rows = rows_iter
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            build_row(&positions, |i| {
                row.get(i).map_or(CellValue::Empty, spreadsheet_cell)
            })
        })
        .collect();

    Ok(ParsedUpload { headers, rows })
}

/// Spreadsheet cell to storable value.
///
/// Date cells without a time part become `YYYY-MM-DD` text; dates with a
/// time part keep their 1900-calendar serial so no precision is lost.
/// Workbooks using the 1904 calendar are shifted onto the 1900 one.
fn spreadsheet_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Integer(i64::from(*b)),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(date) if date.time() == NaiveTime::MIN => {
                CellValue::Text(date.format("%Y-%m-%d").to_string())
            }
            Some(date) => CellValue::Float(dates::to_serial(date)),
            None => CellValue::Float(dt.as_f64()),
        },
    }
}

/// Inferred storage type of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvColumnType {
    Integer,
    Float,
    Text,
}

fn parse_float(text: &str) -> Option<f64> {
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Narrowest type every non-empty value of a column fits.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> CsvColumnType {
    let mut kind = CsvColumnType::Integer;
    for value in values.filter(|v| !v.is_empty()) {
        if kind == CsvColumnType::Integer && value.trim().parse::<i64>().is_err() {
            kind = CsvColumnType::Float;
        }
        if kind == CsvColumnType::Float && parse_float(value).is_none() {
            return CsvColumnType::Text;
        }
    }
    kind
}

fn csv_cell(value: &str, kind: CsvColumnType) -> CellValue {
    if value.is_empty() {
        return CellValue::Empty;
    }
    match kind {
        CsvColumnType::Integer => value
            .trim()
            .parse::<i64>()
            .map_or_else(|_| CellValue::Text(value.to_string()), CellValue::Integer),
        CsvColumnType::Float => {
            parse_float(value).map_or_else(|| CellValue::Text(value.to_string()), CellValue::Float)
        }
        CsvColumnType::Text => CellValue::Text(value.to_string()),
    }
}

/// Read a CSV file with a header line.
///
/// Each column is typed as a whole: integer when every value is an
/// integer, float when every value is numeric, text otherwise.
pub fn read_csv(path: &Path) -> Result<ParsedUpload> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();
    let positions = column_positions(&headers);

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let records: Vec<csv::StringRecord> = records
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.is_empty()))
        .collect();

    let types: Vec<(usize, CsvColumnType)> = positions
        .iter()
        .map(|(index, _)| {
            let kind = infer_column_type(records.iter().map(|r| r.get(*index).unwrap_or("")));
            (*index, kind)
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            build_row(&positions, |i| {
                let kind = types
                    .iter()
                    .find(|(index, _)| *index == i)
                    .map_or(CsvColumnType::Text, |(_, k)| *k);
                csv_cell(record.get(i).unwrap_or(""), kind)
            })
        })
        .collect();

    Ok(ParsedUpload { headers, rows })
}
