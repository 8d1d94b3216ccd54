use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::ImportError;
use crate::table::{RawSheet, Value};

/// Reads a whole table out of a SQLite database file.
///
/// The database is opened read-only and never created; a missing file is an
/// open error so the caller can fall back to a flat file.
pub struct SqliteImporter {
    db_path: PathBuf,
}

impl SqliteImporter {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn connect(&self) -> Result<SqlitePool, ImportError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    /// Names of the user tables in the database, in creation order
    pub async fn list_tables(&self) -> Result<Vec<String>, ImportError> {
        let pool = self.connect().await?;
        let names = Self::table_names(&pool).await;
        pool.close().await;
        names
    }

    async fn table_names(pool: &SqlitePool) -> Result<Vec<String>, ImportError> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(ImportError::from))
            .collect()
    }

    /// Read every row of `table` into a sheet
    #[instrument(skip(self), fields(db = %self.db_path.display()))]
    pub async fn read_table(&self, table: &str) -> Result<RawSheet, ImportError> {
        let pool = self.connect().await?;
        let result = Self::read_table_from(&pool, table).await;
        pool.close().await;
        let sheet = result?;

        info!(
            "Read {} rows x {} columns from table {}",
            sheet.rows.len(),
            sheet.headers.len(),
            table
        );
        Ok(sheet)
    }

    async fn read_table_from(pool: &SqlitePool, table: &str) -> Result<RawSheet, ImportError> {
        let tables = Self::table_names(pool).await?;
        if !tables.iter().any(|t| t == table) {
            debug!("Tables present: {:?}", tables);
            return Err(ImportError::TableNotFound(table.to_string()));
        }

        // Column names come from PRAGMA so an empty table still has headers
        let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let headers: Vec<String> = sqlx::query(&pragma)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()?;

        let select = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let rows = sqlx::query(&select).fetch_all(pool).await?;

        let mut data_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            data_rows.push(row_values(row, headers.len())?);
        }

        Ok(RawSheet::new(headers, data_rows))
    }
}

/// Decode a row by the storage class of each value. Numeric text (Numbeo
/// keeps prices in TEXT columns) is parsed into numbers.
fn row_values(row: &SqliteRow, width: usize) -> Result<Vec<Value>, ImportError> {
    let mut values = Vec::with_capacity(width);
    for column in row.columns().iter().take(width) {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_ascii_uppercase();
        let value = match type_name.as_str() {
            "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Value::Integer(row.try_get::<i64, _>(idx)?),
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                let f = row.try_get::<f64, _>(idx)?;
                if f.is_finite() {
                    Value::Number(f)
                } else {
                    Value::Null
                }
            }
            "TEXT" => Value::from_text(&row.try_get::<String, _>(idx)?),
            other => {
                warn!("Unsupported SQLite value type {} in column {}", other, column.name());
                Value::Null
            }
        };
        values.push(value);
    }
    Ok(values)
}
