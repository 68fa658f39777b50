use metrics::{counter, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metric names published to the `metrics` facade
pub mod names {
    pub const UPLOADS_TOTAL: &str = "workorders_uploads_total";
    pub const UPLOAD_FAILURES_TOTAL: &str = "workorders_upload_failures_total";
    pub const ROWS_INGESTED_TOTAL: &str = "workorders_rows_ingested_total";
    pub const UPLOAD_DURATION: &str = "workorders_upload_duration_seconds";
    pub const RESTORES_TOTAL: &str = "workorders_restores_total";
    pub const QUERIES_TOTAL: &str = "workorders_queries_total";
    pub const QUERY_DURATION: &str = "workorders_query_duration_seconds";
    pub const ROWS_ENRICHED_TOTAL: &str = "workorders_rows_enriched_total";
    pub const ERRORS_TOTAL: &str = "workorders_errors_total";
}

/// Metrics collection and management
///
/// Every record call updates an in-process counter (readable through
/// [`MetricsCollector::snapshot`]) and mirrors it to the global `metrics`
/// recorder, which is a no-op unless the embedding binary installs one.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    uploads: AtomicU64,
    upload_failures: AtomicU64,
    rows_ingested: AtomicU64,
    restores: AtomicU64,
    queries: AtomicU64,
    rows_enriched: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the collector's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uploads: u64,
    pub upload_failures: u64,
    pub rows_ingested: u64,
    pub restores: u64,
    pub queries: u64,
    pub rows_enriched: u64,
    pub errors: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful upload that replaced the table with `rows` rows
    pub fn record_upload(&self, rows: u64, duration: Duration) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.rows_ingested.fetch_add(rows, Ordering::Relaxed);

        counter!(names::UPLOADS_TOTAL).increment(1);
        counter!(names::ROWS_INGESTED_TOTAL).increment(rows);
        histogram!(names::UPLOAD_DURATION).record(duration.as_secs_f64());
    }

    /// Record a rejected or failed upload
    pub fn record_upload_failure(&self, code: &'static str) {
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
        counter!(names::UPLOAD_FAILURES_TOTAL, "code" => code).increment(1);
        self.record_error(code, "upload");
    }

    /// Record a restore from backup, automatic or explicit
    pub fn record_restore(&self, success: bool) {
        self.restores.fetch_add(1, Ordering::Relaxed);
        counter!(
            names::RESTORES_TOTAL,
            "status" => if success { "success" } else { "error" }
        )
        .increment(1);
    }

    /// Record a query or stream and the rows it enriched
    pub fn record_query(&self, operation: &'static str, rows_enriched: u64, duration: Duration) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.rows_enriched.fetch_add(rows_enriched, Ordering::Relaxed);

        counter!(names::QUERIES_TOTAL, "operation" => operation).increment(1);
        counter!(names::ROWS_ENRICHED_TOTAL).increment(rows_enriched);
        histogram!(names::QUERY_DURATION, "operation" => operation).record(duration.as_secs_f64());
    }

    /// Record error metrics
    pub fn record_error(&self, code: &'static str, operation: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!(names::ERRORS_TOTAL, "code" => code, "operation" => operation).increment(1);
    }

    /// Current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads: self.uploads.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            rows_ingested: self.rows_ingested.load(Ordering::Relaxed),
            restores: self.restores.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            rows_enriched: self.rows_enriched.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_upload_failure_counts_as_error() {
        let collector = MetricsCollector::new();
        collector.record_upload_failure("MISSING_COLUMNS");
        let snap = collector.snapshot();
        assert_eq!(snap.upload_failures, 1);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.uploads, 0);
    }
}
