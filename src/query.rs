//! Filtered, paginated work-order queries.
//!
//! Request parameters arrive as a flat string map, such as a dashboard
//! query string. [`WorkOrderQuery::from_pairs`] turns them into a
//! typed query; [`WorkOrderFilter::where_clause`] renders the filter as SQL
//! with bound parameters. KPIs are accumulated over the whole filtered set,
//! distinct-value lists over the current page only.

use serde::Serialize;
use tracing::debug;

use crate::config::QueryConfig;
use crate::error::{Result, WorkOrderError};
use crate::models::{CellValue, Column, EnrichedWorkOrder, RawWorkOrder, Status};

/// Columns the KPI pass needs to derive status and duration
pub const KPI_COLUMNS: [Column; 4] = [
    Column::Etatjob,
    Column::OrderDate,
    Column::StartDt,
    Column::JobexecDt,
];

/// Row filter; all present conditions must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    /// Exact `Equipement`
    pub equipment: Option<String>,
    /// Exact `Job_type`
    pub job_type: Option<String>,
    /// Exact `ETATJOB`
    pub status_code: Option<String>,
    /// `ETATJOB` derived from a status label
    pub status_label_code: Option<&'static str>,
    /// Inclusive lower bound on order date or start date
    pub start_date: Option<String>,
    /// Inclusive upper bound on order date or start date
    pub end_date: Option<String>,
}

impl WorkOrderFilter {
    /// True when no condition is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// SQL `WHERE` clause (empty when unfiltered) and its bound parameters.
    ///
    /// Exact matches compare the column's text form, so a value stored as
    /// INTEGER `1` matches the parameter `"1"`.
    #[must_use]
    pub fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        let order = Column::OrderDate.name();
        let start = Column::StartDt.name();
        if let Some(lower) = &self.start_date {
            clauses.push(format!("({order} >= ? OR {start} >= ?)"));
            params.extend([lower.clone(), lower.clone()]);
        }
        if let Some(upper) = &self.end_date {
            clauses.push(format!("({order} <= ? OR {start} <= ?)"));
            params.extend([upper.clone(), upper.clone()]);
        }

        let exact = [
            (Column::Equipement, self.equipment.as_deref()),
            (Column::JobType, self.job_type.as_deref()),
            (Column::Etatjob, self.status_code.as_deref()),
            (Column::Etatjob, self.status_label_code),
        ];
        for (column, value) in exact {
            if let Some(value) = value {
                clauses.push(format!("CAST({column} AS TEXT) = ?"));
                params.push(value.to_string());
            }
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// A fully parsed work-order query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderQuery {
    /// Selected raw columns; empty means all
    pub projection: Vec<Column>,
    /// Row filter
    pub filter: WorkOrderFilter,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Omit the records, return pagination and KPIs only
    pub kpis_only: bool,
    /// Include distinct-value lists for the current page
    pub list_fields: bool,
    /// Emit derived fields alongside the raw columns
    pub enriched: bool,
}

impl WorkOrderQuery {
    /// Default query: first page, everything selected.
    #[must_use]
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            projection: Vec::new(),
            filter: WorkOrderFilter::default(),
            page: 1,
            per_page: config.default_per_page,
            kpis_only: false,
            list_fields: false,
            enriched: true,
        }
    }

    /// Parse request parameters. Unrecognised keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I, config: &QueryConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::new(config);
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "fields" => query.projection = parse_projection(value),
                "start_date" => query.filter.start_date = non_empty(value),
                "end_date" => query.filter.end_date = non_empty(value),
                "Equipement" => query.filter.equipment = Some(value.to_string()),
                "Job_type" => query.filter.job_type = Some(value.to_string()),
                "ETATJOB" => query.filter.status_code = Some(value.to_string()),
                "status" => {
                    query.filter.status_label_code = Status::from_label(value).and_then(Status::code);
                    if query.filter.status_label_code.is_none() {
                        debug!(status = value, "Status label has no code, not filtering on it");
                    }
                }
                "page" => query.page = parse_positive(key, value)?,
                "per_page" => query.per_page = parse_positive(key, value)?,
                "kpis_only" => query.kpis_only = value.eq_ignore_ascii_case("true"),
                "list_fields" => query.list_fields = !value.is_empty(),
                "enriched" => query.enriched = !value.eq_ignore_ascii_case("false"),
                _ => debug!(parameter = key, "Ignoring unrecognised query parameter"),
            }
        }

        if query.per_page > config.max_per_page {
            return Err(WorkOrderError::InvalidQuery(format!(
                "per_page must be at most {}",
                config.max_per_page
            )));
        }
        Ok(query)
    }

    /// Columns to read: the projection, or every column.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        if self.projection.is_empty() {
            Column::ALL.to_vec()
        } else {
            self.projection.clone()
        }
    }

    /// Rows to skip before the current page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(WorkOrderError::InvalidQuery(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}

/// Recognised column names from a comma-separated list, in storage order.
fn parse_projection(fields: &str) -> Vec<Column> {
    let mut columns: Vec<Column> = fields
        .split(',')
        .filter_map(|f| {
            let name = f.trim();
            let column = Column::from_name(name);
            if column.is_none() && !name.is_empty() {
                debug!(field = name, "Ignoring unknown field in projection");
            }
            column
        })
        .collect();
    columns.sort_unstable();
    columns.dedup();
    columns
}

/// Pagination block of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Rows matching the filter
    pub total: u64,
    /// Pages needed for `total` rows
    pub total_pages: u64,
}

impl Pagination {
    /// Pagination for `total` matching rows
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(u64::from(per_page)),
        }
    }
}

/// Aggregate indicators over a filtered set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpis {
    /// Rows in the filtered set
    pub total_workorders: u64,
    /// `Completed` rows
    pub completed: u64,
    /// `Ready for Work` rows
    pub in_progress: u64,
    /// `Pending` rows
    pub pending: u64,
    /// `Wait for Spare Parts` rows
    pub waiting_parts: u64,
    /// Mean `duration_days` over rows where it is defined
    pub average_duration: Option<f64>,
}

/// Running KPI totals, fed one enriched row at a time
#[derive(Debug, Clone, Default)]
pub struct KpiAccumulator {
    rows: u64,
    completed: u64,
    in_progress: u64,
    pending: u64,
    waiting_parts: u64,
    duration_sum: i64,
    duration_count: u64,
}

impl KpiAccumulator {
    /// Start from zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one row
    pub fn add(&mut self, record: &EnrichedWorkOrder) {
        self.rows += 1;
        match record.status {
            Status::Completed => self.completed += 1,
            Status::ReadyForWork => self.in_progress += 1,
            Status::Pending => self.pending += 1,
            Status::WaitForSpareParts => self.waiting_parts += 1,
            Status::Initiated => {}
        }
        if let Some(days) = record.duration_days {
            self.duration_sum += days;
            self.duration_count += 1;
        }
    }

    /// Rows seen so far
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// Final figures
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(&self) -> Kpis {
        Kpis {
            total_workorders: self.rows,
            completed: self.completed,
            in_progress: self.in_progress,
            pending: self.pending,
            waiting_parts: self.waiting_parts,
            average_duration: (self.duration_count > 0)
                .then(|| self.duration_sum as f64 / self.duration_count as f64),
        }
    }
}

/// Distinct values for filter dropdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldLists {
    /// `Equipement` values
    pub equipment: Vec<CellValue>,
    /// `Job_type` values
    pub categories: Vec<CellValue>,
    /// `ETATJOB` values
    pub fault_locations: Vec<CellValue>,
    /// Failure causes
    pub failure_causes: Vec<String>,
    /// Snag locations
    pub snag_locations: Vec<String>,
}

impl FieldLists {
    /// Distinct values over `records`, in first-seen order.
    ///
    /// Callers pass the current page, not the whole filtered set.
    #[must_use]
    pub fn from_records(records: &[EnrichedWorkOrder]) -> Self {
        let mut lists = Self::default();
        for record in records {
            push_distinct(&mut lists.equipment, record.raw.get(Column::Equipement));
            push_distinct(&mut lists.categories, record.raw.get(Column::JobType));
            push_distinct(&mut lists.fault_locations, record.raw.get(Column::Etatjob));
            push_distinct(&mut lists.failure_causes, &record.failure_cause);
            push_distinct(&mut lists.snag_locations, &record.snag_location);
        }
        lists
    }
}

fn push_distinct<T: PartialEq + Clone>(list: &mut Vec<T>, value: &T) {
    if !list.contains(value) {
        list.push(value.clone());
    }
}

/// One output record: raw columns, optionally with derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    /// Raw columns plus derived fields
    Enriched(Box<EnrichedWorkOrder>),
    /// Raw columns only
    Raw(RawWorkOrder),
}

impl OutputRecord {
    /// Shape an enriched row according to the `enriched` flag
    #[must_use]
    pub fn new(record: EnrichedWorkOrder, enriched: bool) -> Self {
        if enriched {
            Self::Enriched(Box::new(record))
        } else {
            Self::Raw(record.raw)
        }
    }
}

/// Response to a paged work-order query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    /// Pagination block
    pub pagination: Pagination,
    /// KPIs over the full filtered set
    pub kpis: Kpis,
    /// Records of the current page, unless `kpis_only`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Vec<OutputRecord>>,
    /// Distinct values of the current page, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lists: Option<FieldLists>,
}

impl QueryResponse {
    /// Assemble a response from an enriched page and the KPI totals.
    #[must_use]
    pub fn build(query: &WorkOrderQuery, total: u64, page: Vec<EnrichedWorkOrder>, kpis: Kpis) -> Self {
        let lists = query.list_fields.then(|| FieldLists::from_records(&page));
        let raw_data = (!query.kpis_only).then(|| {
            page.into_iter()
                .map(|record| OutputRecord::new(record, query.enriched))
                .collect()
        });
        Self {
            pagination: Pagination::new(query.page, query.per_page, total),
            kpis,
            raw_data,
            lists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich_row;

    fn config() -> QueryConfig {
        QueryConfig {
            default_per_page: 100,
            max_per_page: 1000,
        }
    }

    fn parse(pairs: &[(&str, &str)]) -> Result<WorkOrderQuery> {
        WorkOrderQuery::from_pairs(pairs.iter().copied(), &config())
    }

    #[test]
    fn test_defaults() {
        let q = parse(&[]).expect("parse");
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 100);
        assert!(q.filter.is_empty());
        assert!(q.enriched);
        assert_eq!(q.columns().len(), Column::ALL.len());
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_status_label_translates_to_code() {
        let q = parse(&[("status", "Completed")]).expect("parse");
        assert_eq!(q.filter.status_label_code, Some("ter"));
        let (sql, params) = q.filter.where_clause();
        assert_eq!(sql, " WHERE CAST(ETATJOB AS TEXT) = ?");
        assert_eq!(params, vec!["ter".to_string()]);
    }

    #[test]
    fn test_pending_and_unknown_labels_add_no_condition() {
        assert!(parse(&[("status", "Pending")]).expect("parse").filter.is_empty());
        assert!(parse(&[("status", "completed")]).expect("parse").filter.is_empty());
    }

    #[test]
    fn test_date_range_matches_either_source_field() {
        let q = parse(&[("start_date", "2024-01-01"), ("end_date", "2024-03-31")]).expect("parse");
        let (sql, params) = q.filter.where_clause();
        assert_eq!(
            sql,
            " WHERE (Order_date >= ? OR Start_dt >= ?) AND (Order_date <= ? OR Start_dt <= ?)"
        );
        assert_eq!(params, ["2024-01-01", "2024-01-01", "2024-03-31", "2024-03-31"]);
    }

    #[test]
    fn test_projection_ignores_unknown_fields() {
        let q = parse(&[("fields", "Description, WO_key,bogus,WO_key")]).expect("parse");
        assert_eq!(q.projection, vec![Column::WoKey, Column::Description]);
        let q = parse(&[("fields", "bogus")]).expect("parse");
        assert_eq!(q.columns().len(), Column::ALL.len());
    }

    #[test]
    fn test_invalid_pagination() {
        assert!(matches!(parse(&[("page", "0")]), Err(WorkOrderError::InvalidQuery(_))));
        assert!(matches!(parse(&[("per_page", "x")]), Err(WorkOrderError::InvalidQuery(_))));
        assert!(matches!(parse(&[("per_page", "5000")]), Err(WorkOrderError::InvalidQuery(_))));
        let q = parse(&[("page", "3"), ("per_page", "20")]).expect("parse");
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn test_flags() {
        let q = parse(&[("kpis_only", "TRUE"), ("list_fields", "1"), ("enriched", "false")]).expect("parse");
        assert!(q.kpis_only && q.list_fields && !q.enriched);
        let q = parse(&[("kpis_only", "yes"), ("list_fields", "")]).expect("parse");
        assert!(!q.kpis_only && !q.list_fields);
    }

    #[test]
    fn test_pagination_pages() {
        assert_eq!(Pagination::new(1, 100, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 100, 100).total_pages, 1);
        assert_eq!(Pagination::new(2, 100, 101).total_pages, 2);
    }

    fn row(code: &str, created: &str, executed: &str) -> EnrichedWorkOrder {
        enrich_row(
            &RawWorkOrder::new()
                .with(Column::Etatjob, code)
                .with(Column::OrderDate, created)
                .with(Column::JobexecDt, executed),
        )
    }

    #[test]
    fn test_kpi_buckets() {
        let mut acc = KpiAccumulator::new();
        let codes = ["ter", "ter", "ter", "ter", "", "xyz", "", "exe", "EXE", "apc"];
        for code in codes {
            acc.add(&row(code, "", ""));
        }
        let kpis = acc.finish();
        assert_eq!(kpis.total_workorders, 10);
        assert_eq!(kpis.completed, 4);
        assert_eq!(kpis.pending, 3);
        assert_eq!(kpis.in_progress, 2);
        assert_eq!(kpis.waiting_parts, 1);
        assert_eq!(kpis.average_duration, None);
    }

    #[test]
    fn test_kpi_average_ignores_undefined_durations() {
        let mut acc = KpiAccumulator::new();
        acc.add(&row("ter", "2024-01-01", "2024-01-05"));
        acc.add(&row("ter", "2024-01-01", "2024-01-03"));
        acc.add(&row("ter", "2024-01-01", ""));
        assert_eq!(acc.finish().average_duration, Some(3.0));
    }

    #[test]
    fn test_lists_are_distinct_in_first_seen_order() {
        let page: Vec<_> = [("STS01", "a"), ("SP02", "b"), ("STS01", "a")]
            .iter()
            .map(|(eq, job)| {
                enrich_row(
                    &RawWorkOrder::new()
                        .with(Column::Equipement, *eq)
                        .with(Column::JobType, *job)
                        .with(Column::Description, "SNAG FAULT #2"),
                )
            })
            .collect();
        let lists = FieldLists::from_records(&page);
        assert_eq!(lists.equipment, vec![CellValue::from("STS01"), CellValue::from("SP02")]);
        assert_eq!(lists.categories.len(), 2);
        assert_eq!(lists.snag_locations, vec!["Cylinder 2".to_string()]);
        assert_eq!(lists.fault_locations, vec![CellValue::Empty]);
    }
}
