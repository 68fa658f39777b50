//! Data models for work-order handling and storage
//!
//! This module contains the raw row as stored, the enriched view derived
//! from it, and the small categorical types the enrichment produces.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::workorders;

/// A single cell as read from storage or an uploaded file
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value (SQL NULL, blank cell)
    #[default]
    Empty,
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Native date/time value
    Date(NaiveDateTime),
}

impl CellValue {
    /// True for `Empty` and for blank text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for classification and string matching.
    ///
    /// `Empty` renders as the empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Replace `Empty` with the empty-string sentinel.
    #[must_use]
    pub fn filled(self) -> Self {
        match self {
            Self::Empty => Self::Text(String::new()),
            other => other,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

/// Raw work-order columns, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    /// `WO_key`
    WoKey,
    /// `WO_name`
    WoName,
    /// `Description`
    Description,
    /// `ETATJOB`
    Etatjob,
    /// `Jobexec_dt`
    JobexecDt,
    /// `Order_date`
    OrderDate,
    /// `Start_dt`
    StartDt,
    /// `Equipement`
    Equipement,
    /// `Job_type`
    JobType,
    /// `Cost_purpose_key`
    CostPurposeKey,
    /// `Location`
    Location,
}

impl Column {
    /// Every stored column
    pub const ALL: [Self; 11] = [
        Self::WoKey,
        Self::WoName,
        Self::Description,
        Self::Etatjob,
        Self::JobexecDt,
        Self::OrderDate,
        Self::StartDt,
        Self::Equipement,
        Self::JobType,
        Self::CostPurposeKey,
        Self::Location,
    ];

    /// Columns an upload must provide
    pub const REQUIRED: [Self; 8] = [
        Self::WoKey,
        Self::WoName,
        Self::Description,
        Self::Etatjob,
        Self::JobexecDt,
        Self::OrderDate,
        Self::StartDt,
        Self::Equipement,
    ];

    /// Column name as it appears in storage and in upload headers
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WoKey => workorders::WO_KEY,
            Self::WoName => workorders::WO_NAME,
            Self::Description => workorders::DESCRIPTION,
            Self::Etatjob => workorders::ETATJOB,
            Self::JobexecDt => workorders::JOBEXEC_DT,
            Self::OrderDate => workorders::ORDER_DATE,
            Self::StartDt => workorders::START_DT,
            Self::Equipement => workorders::EQUIPEMENT,
            Self::JobType => workorders::JOB_TYPE,
            Self::CostPurposeKey => workorders::COST_PURPOSE_KEY,
            Self::Location => workorders::LOCATION,
        }
    }

    /// Look up a column by its exact name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A work order as stored: the subset of columns that was read, by column
///
/// Columns that were not selected are simply absent, and read as
/// [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWorkOrder {
    cells: BTreeMap<Column, CellValue>,
}

impl RawWorkOrder {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    #[must_use]
    pub fn with(mut self, column: Column, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column value
    pub fn set(&mut self, column: Column, value: impl Into<CellValue>) {
        self.cells.insert(column, value.into());
    }

    /// Value of a column, `Empty` when the column is not present
    #[must_use]
    pub fn get(&self, column: Column) -> &CellValue {
        self.cells.get(&column).unwrap_or(&EMPTY_CELL)
    }

    /// True if the column was read for this row
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        self.cells.contains_key(&column)
    }

    /// Columns present on this row, in storage order
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.cells.keys().copied()
    }

    /// Same row with every present `Empty` cell replaced by `""`
    #[must_use]
    pub fn filled(&self) -> Self {
        Self {
            cells: self
                .cells
                .iter()
                .map(|(column, value)| (*column, value.clone().filled()))
                .collect(),
        }
    }
}

impl FromIterator<(Column, CellValue)> for RawWorkOrder {
    fn from_iter<T: IntoIterator<Item = (Column, CellValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for RawWorkOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column.name(), value)?;
        }
        map.end()
    }
}

/// Equipment family derived from the equipment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EquipmentType {
    /// Ship-to-shore crane (`STS...`)
    #[serde(rename = "STS")]
    Sts,
    /// Spreader (`SP...`)
    Spreader,
    /// Anything else
    Other,
}

impl EquipmentType {
    /// Classify an equipment identifier by its case-insensitive prefix
    #[must_use]
    pub fn from_equipment(equipment: &str) -> Self {
        let upper = equipment.to_uppercase();
        if upper.starts_with("STS") {
            Self::Sts
        } else if upper.starts_with("SP") {
            Self::Spreader
        } else {
            Self::Other
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sts => "STS",
            Self::Spreader => "Spreader",
            Self::Other => "Other",
        }
    }
}

/// Work-order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    /// Code `exe`
    #[serde(rename = "Ready for Work")]
    ReadyForWork,
    /// Code `apc`
    #[serde(rename = "Wait for Spare Parts")]
    WaitForSpareParts,
    /// Code `ter`
    Completed,
    /// Code `ini`
    Initiated,
    /// Any other code, including none
    Pending,
}

impl Status {
    /// Code → status table, checked in order
    const CODES: [(&'static str, Self); 4] = [
        ("exe", Self::ReadyForWork),
        ("apc", Self::WaitForSpareParts),
        ("ter", Self::Completed),
        ("ini", Self::Initiated),
    ];

    /// Map a raw status code (case-insensitive); unknown codes are `Pending`
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.to_lowercase();
        Self::CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Self::Pending, |(_, status)| *status)
    }

    /// Raw code for this status; `Pending` has none
    #[must_use]
    pub fn code(self) -> Option<&'static str> {
        Self::CODES
            .iter()
            .find(|(_, status)| *status == self)
            .map(|(c, _)| *c)
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReadyForWork => "Ready for Work",
            Self::WaitForSpareParts => "Wait for Spare Parts",
            Self::Completed => "Completed",
            Self::Initiated => "Initiated",
            Self::Pending => "Pending",
        }
    }

    /// Parse an exact display label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::ReadyForWork,
            Self::WaitForSpareParts,
            Self::Completed,
            Self::Initiated,
            Self::Pending,
        ]
        .into_iter()
        .find(|s| s.label() == label)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A work order with every derived field computed
///
/// Never persisted; recomputed from the raw row on each read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedWorkOrder {
    /// The raw columns that were read, blanks filled with `""`
    #[serde(flatten)]
    pub raw: RawWorkOrder,
    /// `WO_name + " " + Description`
    pub combined_description: String,
    /// First non-empty of order date / start date, normalized
    pub creation_date: Option<NaiveDateTime>,
    /// Normalized execution date
    pub execution_date: Option<NaiveDateTime>,
    /// Whole days from creation to execution
    pub duration_days: Option<i64>,
    /// Equipment family
    pub equipment_type: EquipmentType,
    /// Lifecycle status
    pub status: Status,
    /// `YYYY-MM` of the creation date
    pub month: Option<String>,
    /// `YYYY-Qn` of the creation date
    pub quarter: Option<String>,
    /// `YYYY` of the creation date
    pub year: Option<String>,
    /// Failure category, or the combined description when unclassified
    pub failure_cause: String,
    /// Cylinder location of a snag report, or `""`
    pub snag_location: String,
    /// Reported breakdown location, or `"Unknown"`
    pub breakdown_location: String,
}
