//! Error types for the workorder-insights library.
//!
//! Every failure that can reach a caller is a [`WorkOrderError`]. Upload and
//! query failures carry a stable machine-readable code (see
//! [`WorkOrderError::code`]) so that clients can react without parsing the
//! message text.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while ingesting, storing or querying work orders.
#[derive(Error, Debug)]
pub enum WorkOrderError {
    /// The upload carried no filename
    #[error("No file selected")]
    EmptyFilename,

    /// The upload extension is not one of the accepted spreadsheet/CSV types
    #[error("Invalid file type - must be Excel (.xlsx, .xls) or CSV: {filename}")]
    InvalidFileType {
        /// Name of the rejected file
        filename: String,
    },

    /// The upload is larger than the configured limit
    #[error("File too large - {filename} is {size} bytes, max size is {max} bytes")]
    FileTooLarge {
        /// Name of the rejected file
        filename: String,
        /// Size of the file in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// Required columns are absent from the upload header
    #[error("File missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The upload could not be read as a spreadsheet or CSV file
    #[error("Invalid file contents - could not read as Excel/CSV: {0}")]
    InvalidFileContents(String),

    /// Replacing the work-order table failed; the previous table was restored
    #[error("Failed to update database: {0}")]
    DatabaseUpdateFailed(String),

    /// Replacing the table failed and restoring the backup failed as well
    #[error("Failed to restore database from backup after update failure ({original}): {restore}")]
    RestoreFailed {
        /// The failure that triggered the restore
        original: String,
        /// The failure of the restore itself
        restore: String,
    },

    /// A query parameter could not be interpreted
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet reading errors
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Result with WorkOrderError
pub type Result<T> = std::result::Result<T, WorkOrderError>;

impl WorkOrderError {
    /// Stable error code reported to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyFilename => "EMPTY_FILENAME",
            Self::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::InvalidFileContents(_) | Self::Csv(_) | Self::Spreadsheet(_) => {
                "INVALID_FILE_CONTENTS"
            }
            Self::DatabaseUpdateFailed(_) => "DATABASE_UPDATE_FAILED",
            Self::RestoreFailed { .. } => "DATABASE_RESTORE_FAILED",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Database(_) | Self::Io(_) | Self::Serialization(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures detected before any storage mutation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyFilename
                | Self::InvalidFileType { .. }
                | Self::FileTooLarge { .. }
                | Self::MissingColumns(_)
                | Self::InvalidFileContents(_)
                | Self::Csv(_)
                | Self::Spreadsheet(_)
                | Self::InvalidQuery(_)
        )
    }
}

/// Structured, user-visible error body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub error: String,
    /// Underlying cause, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Always `"error"`
    pub status: &'static str,
    /// Stable error code, see [`WorkOrderError::code`]
    pub code: &'static str,
}

impl From<&WorkOrderError> for ErrorResponse {
    fn from(err: &WorkOrderError) -> Self {
        let details = match err {
            WorkOrderError::Csv(e) => Some(e.to_string()),
            WorkOrderError::Spreadsheet(e) => Some(e.to_string()),
            WorkOrderError::InvalidFileContents(d) | WorkOrderError::DatabaseUpdateFailed(d) => {
                Some(d.clone())
            }
            WorkOrderError::RestoreFailed { restore, .. } => Some(restore.clone()),
            _ => None,
        };
        Self {
            error: err.to_string(),
            details,
            status: "error",
            code: err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = WorkOrderError::MissingColumns(vec!["WO_key".into(), "ETATJOB".into()]);
        assert_eq!(err.to_string(), "File missing required columns: WO_key, ETATJOB");
        assert_eq!(err.code(), "MISSING_COLUMNS");
        assert!(err.is_validation());
    }

    #[test]
    fn test_restore_failure_is_distinct() {
        let err = WorkOrderError::RestoreFailed {
            original: "constraint failed".into(),
            restore: "no such table".into(),
        };
        assert_eq!(err.code(), "DATABASE_RESTORE_FAILED");
        assert!(!err.is_validation());

        let body = ErrorResponse::from(&err);
        assert_eq!(body.status, "error");
        assert_eq!(body.details.as_deref(), Some("no such table"));
    }
}
