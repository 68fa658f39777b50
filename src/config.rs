use anyhow::Result;
use config::{Config, Environment, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schema::workorders;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub upload: UploadConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: String,
    /// Work-order table name
    pub table: String,
    /// Prefix of backup tables; the unix timestamp is appended
    pub backup_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    pub max_size_bytes: u64,
    /// Lower-case extensions without the dot
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "main.db".to_string(),
                table: workorders::TABLE.to_string(),
                backup_prefix: workorders::BACKUP_PREFIX.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            upload: UploadConfig {
                max_size_bytes: 10 * 1024 * 1024,
                allowed_extensions: vec!["xlsx".to_string(), "xls".to_string(), "csv".to_string()],
            },
            query: QueryConfig {
                default_per_page: 100,
                max_per_page: 1000,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence, plus an
    /// optional explicit file on top of the default locations
    pub fn load_from(extra_file: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("workorders").required(false));
        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("WORKORDERS").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")?;

        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("database.path cannot be empty"));
        }
        for (name, value) in [
            ("database.table", &self.database.table),
            ("database.backup_prefix", &self.database.backup_prefix),
        ] {
            if !identifier.is_match(value) {
                return Err(anyhow::anyhow!(
                    "Invalid {}: {:?} is not a plain SQL identifier",
                    name,
                    value
                ));
            }
        }
        if self.database.table.starts_with(&self.database.backup_prefix) {
            return Err(anyhow::anyhow!(
                "database.table must not start with the backup prefix"
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        if self.upload.max_size_bytes == 0 {
            return Err(anyhow::anyhow!("max_size_bytes must be greater than 0"));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("allowed_extensions cannot be empty"));
        }

        if self.query.default_per_page == 0 || self.query.max_per_page == 0 {
            return Err(anyhow::anyhow!("page sizes must be greater than 0"));
        }
        if self.query.default_per_page > self.query.max_per_page {
            return Err(anyhow::anyhow!(
                "default_per_page ({}) exceeds max_per_page ({})",
                self.query.default_per_page,
                self.query.max_per_page
            ));
        }

        Ok(())
    }

    /// Get database path from environment or config
    ///
    /// `WORKORDERS_DB` is a shorthand for `WORKORDERS__DATABASE__PATH` and
    /// wins over every configured source.
    pub fn get_database_path(&self) -> String {
        std::env::var("WORKORDERS_DB").unwrap_or_else(|_| self.database.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, "main.db");
        assert_eq!(config.database.table, "Workorders");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.upload.max_size_bytes, 10_485_760);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.database.table = "Workorders; DROP TABLE x".to_string();
        assert!(config.validate().is_err());
    }
}
