use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveTime, Utc};
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, ToSql};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{Result, WorkOrderError};
use crate::models::{CellValue, Column, RawWorkOrder};
use crate::query::WorkOrderFilter;
use crate::schema::create_workorders_sql;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Empty => ToSqlOutput::Owned(Value::Null),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Self::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Self::Date(d) => {
                let text = if d.time() == NaiveTime::MIN {
                    d.format("%Y-%m-%d").to_string()
                } else {
                    d.format("%Y-%m-%d %H:%M:%S").to_string()
                };
                ToSqlOutput::Owned(Value::Text(text))
            }
        })
    }
}

impl FromSql for CellValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Empty,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Float(f),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Self::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        })
    }
}

/// Quote an identifier for interpolation into SQL
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| quote(c.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_row(row: &Row<'_>, columns: &[Column]) -> rusqlite::Result<RawWorkOrder> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| Ok((*column, row.get::<_, CellValue>(index)?)))
        .collect()
}

/// Database manager for the work-order table and its backups
///
/// Holds no open handle; every operation opens its own connection.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    table: String,
    backup_prefix: String,
}

impl Database {
    /// Open (creating if needed) the database and the work-order table
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let path = PathBuf::from(&config.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Self {
            path,
            table: config.table.clone(),
            backup_prefix: config.backup_prefix.clone(),
        };
        db.get_connection()?
            .execute_batch(&create_workorders_sql(&db.table))?;
        debug!(path = %db.path.display(), table = %db.table, "Database ready");
        Ok(db)
    }

    /// Database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Work-order table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Open a fresh connection
    pub fn get_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Number of rows matching `filter`
    pub fn count(&self, filter: &WorkOrderFilter) -> Result<u64> {
        let conn = self.get_connection()?;
        let (where_clause, params) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM {}{where_clause}", quote(&self.table));
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// One page of rows matching `filter`, in insertion order
    pub fn fetch_page(
        &self,
        columns: &[Column],
        filter: &WorkOrderFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<RawWorkOrder>> {
        let conn = self.get_connection()?;
        let (where_clause, params) = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM {}{where_clause} ORDER BY rowid LIMIT {limit} OFFSET {offset}",
            column_list(columns),
            quote(&self.table)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| map_row(row, columns))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Visit every row matching `filter` without collecting them.
    ///
    /// Stops at the first error returned by `visit`. Returns the number of
    /// rows visited.
    pub fn for_each_row<F>(&self, columns: &[Column], filter: &WorkOrderFilter, mut visit: F) -> Result<u64>
    where
        F: FnMut(RawWorkOrder) -> Result<()>,
    {
        let conn = self.get_connection()?;
        let (where_clause, params) = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM {}{where_clause} ORDER BY rowid",
            column_list(columns),
            quote(&self.table)
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut visited = 0;
        while let Some(row) = rows.next()? {
            visit(map_row(row, columns)?)?;
            visited += 1;
        }
        Ok(visited)
    }

    /// Copy the work-order table to a new `<prefix><unix seconds>` table.
    ///
    /// A numeric suffix is added when a backup with the same timestamp
    /// already exists.
    pub fn create_backup(&self) -> Result<String> {
        let conn = self.get_connection()?;
        let base = format!("{}{}", self.backup_prefix, Utc::now().timestamp());

        let mut name = base.clone();
        let mut suffix = 1;
        while table_exists(&conn, &name)? {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }

        conn.execute_batch(&format!(
            "CREATE TABLE {} AS SELECT * FROM {}",
            quote(&name),
            quote(&self.table)
        ))?;
        info!(backup_table = %name, "Created backup table");
        Ok(name)
    }

    /// Replace the work-order table with `rows` in one transaction.
    ///
    /// Rows go into a staging table which is then renamed over the live
    /// table, so a failure part-way leaves the live table untouched.
    /// Returns the row count of the new table.
    pub fn replace_all(&self, rows: &[RawWorkOrder]) -> Result<u64> {
        let mut conn = self.get_connection()?;
        let staging = format!("{}_staging", self.table);
        let columns = Column::ALL;

        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(&staging)))?;
        tx.execute_batch(&create_workorders_sql(&staging))?;
        {
            let placeholders = vec!["?"; columns.len()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                quote(&staging),
                column_list(&columns)
            ))?;
            for row in rows {
                stmt.execute(params_from_iter(columns.iter().map(|c| row.get(*c))))?;
            }
        }
        tx.execute_batch(&format!(
            "DROP TABLE {table}; ALTER TABLE {staging} RENAME TO {table};",
            table = quote(&self.table),
            staging = quote(&staging)
        ))?;
        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(&self.table)),
            [],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Recreate the work-order table from a backup table.
    ///
    /// Returns the number of rows restored.
    pub fn restore_from(&self, backup_table: &str) -> Result<u64> {
        let mut conn = self.get_connection()?;
        if !table_exists(&conn, backup_table)? {
            return Err(WorkOrderError::InvalidQuery(format!(
                "backup table {backup_table:?} does not exist"
            )));
        }

        let columns = column_list(&Column::ALL);
        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(&self.table)))?;
        tx.execute_batch(&create_workorders_sql(&self.table))?;
        let restored = tx.execute(
            &format!(
                "INSERT INTO {} ({columns}) SELECT {columns} FROM {}",
                quote(&self.table),
                quote(backup_table)
            ),
            [],
        )?;
        tx.commit()?;

        warn!(backup_table, rows = restored, "Restored work orders from backup");
        Ok(u64::try_from(restored).unwrap_or_default())
    }

    /// True when `name` is an existing table
    pub fn has_table(&self, name: &str) -> Result<bool> {
        table_exists(&self.get_connection()?, name)
    }

    /// Every table in the database with its row count
    pub fn table_lengths(&self) -> Result<BTreeMap<String, u64>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut lengths = BTreeMap::new();
        for name in names {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", quote(&name)),
                [],
                |row| row.get(0),
            )?;
            lengths.insert(name, u64::try_from(count).unwrap_or_default());
        }
        Ok(lengths)
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}
