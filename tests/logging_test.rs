//! Unit tests for logging.rs module
//!
//! The global subscriber can be installed once per process, so this binary
//! holds a single initialization test.

use tempfile::TempDir;
use workorder_insights::logging::{init_logging, OperationTimer};

#[test]
fn test_init_logging_with_json_console_and_file() {
    let dir = TempDir::new().expect("temp dir");
    let log_file = dir.path().join("workorders.log");

    let guard = init_logging(Some("debug"), Some(&log_file), true).expect("install subscriber");
    assert!(guard.is_some());

    OperationTimer::new("logging_test").finish();
    tracing::info!(rows = 3, "Logged through both layers");

    // a second subscriber is refused rather than silently replacing the first
    assert!(init_logging(Some("info"), None, false).is_err());

    drop(guard);
    let written = std::fs::read_dir(dir.path())
        .expect("list log dir")
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with("workorders.log"));
    assert!(written);
}
