//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.
//! Column names are the spreadsheet headers of the maintenance export, so an
//! uploaded file maps onto the table without renaming.

/// Work-order table schema
pub mod workorders {
    /// Default table name
    pub const TABLE: &str = "Workorders";
    /// Default prefix for timestamped backup tables
    pub const BACKUP_PREFIX: &str = "Workorders_backup_";
    /// Work-order key (primary key)
    pub const WO_KEY: &str = "WO_key";
    /// Short work-order title
    pub const WO_NAME: &str = "WO_name";
    /// Free-text fault description
    pub const DESCRIPTION: &str = "Description";
    /// Lifecycle status code
    pub const ETATJOB: &str = "ETATJOB";
    /// Execution date
    pub const JOBEXEC_DT: &str = "Jobexec_dt";
    /// Order date
    pub const ORDER_DATE: &str = "Order_date";
    /// Start date
    pub const START_DT: &str = "Start_dt";
    /// Equipment identifier
    pub const EQUIPEMENT: &str = "Equipement";
    /// Job type tag
    pub const JOB_TYPE: &str = "Job_type";
    /// Cost purpose key
    pub const COST_PURPOSE_KEY: &str = "Cost_purpose_key";
    /// Breakdown location
    pub const LOCATION: &str = "Location";
}

/// DDL for a work-order table named `table`.
///
/// Only the key has a declared type. The other columns have no affinity so
/// numeric cells (spreadsheet serial dates) keep their storage class.
/// Callers must pass a name that already passed identifier validation.
#[must_use]
pub fn create_workorders_sql(table: &str) -> String {
    use workorders::{
        COST_PURPOSE_KEY, DESCRIPTION, EQUIPEMENT, ETATJOB, JOBEXEC_DT, JOB_TYPE, LOCATION,
        ORDER_DATE, START_DT, WO_KEY, WO_NAME,
    };

    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            {WO_KEY} TEXT PRIMARY KEY,
            {WO_NAME},
            {DESCRIPTION},
            {ETATJOB},
            {JOBEXEC_DT},
            {ORDER_DATE},
            {START_DT},
            {EQUIPEMENT},
            {JOB_TYPE},
            {COST_PURPOSE_KEY},
            {LOCATION}
        )"
    )
}
