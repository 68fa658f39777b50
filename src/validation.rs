use std::path::Path;

use regex::Regex;

use crate::error::{Result, WorkOrderError};
use crate::models::Column;

/// Validation utilities for uploads and identifiers
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the upload filename and return it
    pub fn validate_filename(path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().trim().to_string())
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(WorkOrderError::EmptyFilename);
        }
        Ok(filename)
    }

    /// Validate the extension against the allowed list, case-insensitively.
    ///
    /// Returns the lower-cased extension.
    pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
            return Err(WorkOrderError::InvalidFileType {
                filename: filename.to_string(),
            });
        }
        Ok(extension)
    }

    /// Validate file size
    pub fn validate_size(filename: &str, size: u64, max: u64) -> Result<()> {
        if size > max {
            return Err(WorkOrderError::FileTooLarge {
                filename: filename.to_string(),
                size,
                max,
            });
        }
        Ok(())
    }

    /// Check that every required column appears in `headers`.
    ///
    /// Missing names are reported in the canonical column order.
    pub fn validate_required_columns<S: AsRef<str>>(headers: &[S]) -> Result<()> {
        let missing: Vec<String> = Column::REQUIRED
            .iter()
            .filter(|col| !headers.iter().any(|h| h.as_ref().trim() == col.name()))
            .map(|col| col.name().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(WorkOrderError::MissingColumns(missing))
        }
    }

    /// Validate a table name supplied by a caller (restore target)
    pub fn validate_table_name(name: &str, prefix: &str) -> Result<()> {
        let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .map_err(|e| WorkOrderError::InvalidQuery(e.to_string()))?;
        if !identifier.is_match(name) {
            return Err(WorkOrderError::InvalidQuery(format!(
                "{name:?} is not a valid table name"
            )));
        }
        if !name.starts_with(prefix) {
            return Err(WorkOrderError::InvalidQuery(format!(
                "{name:?} is not a backup table (expected prefix {prefix:?})"
            )));
        }
        Ok(())
    }
}
