//! Unit tests for metrics.rs module

use std::time::Duration;
use workorder_insights::metrics::{names, MetricsCollector, MetricsSnapshot};

#[test]
fn test_metrics_collector_default() {
    let collector = MetricsCollector::default();
    let snapshot = collector.snapshot();
    assert_eq!(snapshot, MetricsSnapshot::default());
    assert_eq!(snapshot.uploads, 0);
    assert_eq!(snapshot.errors, 0);
}

#[test]
fn test_record_upload() {
    let collector = MetricsCollector::new();
    collector.record_upload(120, Duration::from_millis(250));
    collector.record_upload(30, Duration::from_millis(50));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.uploads, 2);
    assert_eq!(snapshot.rows_ingested, 150);
    assert_eq!(snapshot.upload_failures, 0);
}

#[test]
fn test_record_upload_failure() {
    let collector = MetricsCollector::new();
    collector.record_upload_failure("INVALID_FILE_TYPE");

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.upload_failures, 1);
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.rows_ingested, 0);
}

#[test]
fn test_record_restore() {
    let collector = MetricsCollector::new();
    collector.record_restore(true);
    collector.record_restore(false);
    assert_eq!(collector.snapshot().restores, 2);
}

#[test]
fn test_record_query() {
    let collector = MetricsCollector::new();
    collector.record_query("query", 110, Duration::from_millis(12));
    collector.record_query("stream", 40, Duration::from_millis(3));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.queries, 2);
    assert_eq!(snapshot.rows_enriched, 150);
}

#[test]
fn test_record_error() {
    let collector = MetricsCollector::new();
    collector.record_error("INTERNAL_ERROR", "stream");
    collector.record_error("INVALID_QUERY", "query");
    assert_eq!(collector.snapshot().errors, 2);
}

#[test]
fn test_collector_is_shareable_across_threads() {
    let collector = std::sync::Arc::new(MetricsCollector::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let collector = std::sync::Arc::clone(&collector);
            std::thread::spawn(move || collector.record_upload(10, Duration::ZERO))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }
    assert_eq!(collector.snapshot().rows_ingested, 40);
}

#[test]
fn test_metric_names_are_prefixed() {
    for name in [
        names::UPLOADS_TOTAL,
        names::UPLOAD_FAILURES_TOTAL,
        names::ROWS_INGESTED_TOTAL,
        names::RESTORES_TOTAL,
        names::QUERIES_TOTAL,
        names::ROWS_ENRICHED_TOTAL,
        names::ERRORS_TOTAL,
    ] {
        assert!(name.starts_with("workorders_"), "{name}");
    }
}
