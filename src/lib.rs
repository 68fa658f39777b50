//! Work-order insights for crane maintenance
//!
//! A Rust library for ingesting maintenance work-order exports (Excel or
//! CSV) into SQLite and serving enriched, filtered and paginated views of
//! them.
//!
//! # Features
//!
//! - Upload with automatic backup and restore on failure
//! - Date normalization across spreadsheet serials and text layouts
//! - Rule-based failure-cause classification and snag location
//! - KPIs over the filtered set, distinct-value lists, NDJSON streaming

/// Failure-cause classification
pub mod classifier;
/// Configuration management
pub mod config;
/// Date normalization and temporal buckets
pub mod dates;
/// SQLite storage, backups and restore
pub mod db;
/// Per-row enrichment
pub mod enrich;
/// Error types and stable error codes
pub mod error;
/// Spreadsheet and CSV readers
pub mod ingest;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Query parsing, filters, pagination and KPIs
pub mod query;
/// Database schema definitions
pub mod schema;
/// Upload and query orchestration
pub mod service;
/// Snag location lookup
pub mod snag;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use enrich::{enrich, enrich_row};
pub use error::{ErrorResponse, Result, WorkOrderError};
pub use models::{CellValue, Column, EnrichedWorkOrder, EquipmentType, RawWorkOrder, Status};
pub use query::{QueryResponse, WorkOrderQuery};
pub use service::{UploadReport, WorkOrderService};
