use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::db::Database;
use crate::enrich::{enrich, enrich_row};
use crate::error::{ErrorResponse, Result, WorkOrderError};
use crate::ingest::{self, FileKind};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::query::{KpiAccumulator, OutputRecord, QueryResponse, WorkOrderQuery, KPI_COLUMNS};
use crate::validation::InputValidator;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub message: String,
    pub filename: String,
    pub records_updated: u64,
    /// Backup taken before the table was replaced
    pub backup_table: String,
    pub status: &'static str,
}

/// Result of an explicit restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub message: String,
    pub backup_table: String,
    pub records_restored: u64,
    pub status: &'static str,
}

/// Upload, query and recovery operations over one work-order store
pub struct WorkOrderService {
    config: AppConfig,
    db: Database,
    metrics: MetricsCollector,
}

impl WorkOrderService {
    /// Open the configured store, creating the table if needed
    pub fn new(config: AppConfig) -> Result<Self> {
        let db = Database::new(&config.database)?;
        Ok(Self {
            config,
            db,
            metrics: MetricsCollector::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Parse query parameters with this service's limits
    pub fn parse_query<I, K, V>(&self, pairs: I) -> Result<WorkOrderQuery>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        WorkOrderQuery::from_pairs(pairs, &self.config.query)
    }

    /// Replace the work-order table with the contents of an uploaded file.
    ///
    /// Validation and parsing happen before any mutation. The live table is
    /// backed up first and restored from that backup if the replace fails.
    pub fn upload(&self, path: &Path) -> Result<UploadReport> {
        let timer = OperationTimer::new("upload");
        match self.try_upload(path) {
            Ok(report) => {
                self.metrics
                    .record_upload(report.records_updated, timer.elapsed());
                info!(
                    filename = %report.filename,
                    records = report.records_updated,
                    backup_table = %report.backup_table,
                    "Upload complete"
                );
                timer.finish();
                Ok(report)
            }
            Err(err) => {
                self.metrics.record_upload_failure(err.code());
                if err.is_validation() {
                    warn!(code = err.code(), error = %err, "Upload rejected");
                }
                Err(err)
            }
        }
    }

    fn try_upload(&self, path: &Path) -> Result<UploadReport> {
        let upload = &self.config.upload;
        let filename = InputValidator::validate_filename(path)?;
        let extension = InputValidator::validate_extension(&filename, &upload.allowed_extensions)?;
        let kind = FileKind::from_extension(&extension).ok_or_else(|| WorkOrderError::InvalidFileType {
            filename: filename.clone(),
        })?;
        let size = fs::metadata(path)?.len();
        InputValidator::validate_size(&filename, size, upload.max_size_bytes)?;

        let parsed = ingest::read_upload(path, kind)?;
        let expected = parsed.rows.len() as u64;
        info!(filename = %filename, rows = expected, "Parsed upload");

        let backup_table = self.db.create_backup()?;
        let replaced = self.db.replace_all(&parsed.rows).and_then(|count| {
            if count == expected {
                Ok(count)
            } else {
                Err(WorkOrderError::DatabaseUpdateFailed(format!(
                    "expected {expected} rows after update, found {count}"
                )))
            }
        });

        match replaced {
            Ok(records_updated) => Ok(UploadReport {
                message: "Database updated successfully".to_string(),
                filename,
                records_updated,
                backup_table,
                status: "success",
            }),
            Err(err) => Err(self.recover(&backup_table, &err)),
        }
    }

    /// Restore after a failed replace and return the error to report.
    fn recover(&self, backup_table: &str, cause: &WorkOrderError) -> WorkOrderError {
        let original = match cause {
            WorkOrderError::DatabaseUpdateFailed(detail) => detail.clone(),
            other => other.to_string(),
        };
        error!(backup_table, error = %original, "Update failed, restoring backup");

        match self.db.restore_from(backup_table) {
            Ok(rows) => {
                self.metrics.record_restore(true);
                info!(backup_table, rows, "Backup restored after failed update");
                WorkOrderError::DatabaseUpdateFailed(original)
            }
            Err(restore_err) => {
                self.metrics.record_restore(false);
                error!(
                    critical = true,
                    backup_table,
                    original = %original,
                    restore_error = %restore_err,
                    "Restore from backup failed"
                );
                WorkOrderError::RestoreFailed {
                    original,
                    restore: restore_err.to_string(),
                }
            }
        }
    }

    /// One page of enriched work orders with KPIs over the whole filtered set
    pub fn query(&self, query: &WorkOrderQuery) -> Result<QueryResponse> {
        let timer = OperationTimer::new("query");

        let total = self.db.count(&query.filter)?;
        let rows = self
            .db
            .fetch_page(&query.columns(), &query.filter, query.per_page, query.offset())?;
        let page = enrich(&rows);

        let mut kpis = KpiAccumulator::new();
        self.db.for_each_row(&KPI_COLUMNS, &query.filter, |row| {
            kpis.add(&enrich_row(&row));
            Ok(())
        })?;

        let enriched = kpis.rows() + page.len() as u64;
        self.metrics.record_query("query", enriched, timer.elapsed());
        info!(
            page = query.page,
            per_page = query.per_page,
            total,
            returned = page.len(),
            "Query served"
        );
        Ok(QueryResponse::build(query, total, page, kpis.finish()))
    }

    /// Write every filtered row as one NDJSON line, ignoring pagination.
    ///
    /// A failure part-way writes a single error line and is also returned.
    pub fn stream<W: Write>(&self, query: &WorkOrderQuery, writer: &mut W) -> Result<u64> {
        let timer = OperationTimer::new("stream");
        let columns = query.columns();

        let result = self.db.for_each_row(&columns, &query.filter, |row| {
            let record = OutputRecord::new(enrich_row(&row), query.enriched);
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
            Ok(())
        });

        match result {
            Ok(rows) => {
                writer.flush()?;
                self.metrics.record_query("stream", rows, timer.elapsed());
                info!(rows, "Stream complete");
                Ok(rows)
            }
            Err(err) => {
                error!(error = %err, "Stream aborted");
                self.metrics.record_error(err.code(), "stream");
                if let Err(write_err) = write_error_line(writer, &err) {
                    warn!(error = %write_err, "Could not write stream error line");
                }
                Err(err)
            }
        }
    }

    /// Row count of every table, backups included
    pub fn tables(&self) -> Result<BTreeMap<String, u64>> {
        self.db.table_lengths()
    }

    /// Replace the work-order table with a named backup
    pub fn restore(&self, backup_table: &str) -> Result<RestoreReport> {
        InputValidator::validate_table_name(backup_table, &self.config.database.backup_prefix)?;
        match self.db.restore_from(backup_table) {
            Ok(records_restored) => {
                self.metrics.record_restore(true);
                Ok(RestoreReport {
                    message: "Database restored from backup".to_string(),
                    backup_table: backup_table.to_string(),
                    records_restored,
                    status: "success",
                })
            }
            Err(err) => {
                self.metrics.record_restore(false);
                self.metrics.record_error(err.code(), "restore");
                error!(backup_table, error = %err, "Explicit restore failed");
                Err(err)
            }
        }
    }
}

fn write_error_line<W: Write>(writer: &mut W, err: &WorkOrderError) -> Result<()> {
    serde_json::to_writer(&mut *writer, &ErrorResponse::from(err))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
