#![allow(dead_code)]

use price_indices::config::Config;
use price_indices::repository::Repository;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway `DATA_DIR` laid out like `data/raw`.
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    /// Copy a workbook from `sample-data-files/` to `relative`.
    pub fn copy_sample(&self, sample: &str, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        fs::copy(sample_file(sample), &path).expect("Failed to copy sample workbook");
        path
    }

    pub fn config(&self) -> Config {
        Config::with_data_dir(self.dir.path())
    }

    pub fn repository(&self) -> Repository {
        Repository::new(self.config())
    }
}

pub fn sample_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("sample-data-files")
        .join(name)
}

pub const BIG_MAC_CSV: &str = "\
iso_a3,currency_code,name,date,local_price,dollar_ex,USD_raw
USA,USD,United States,2023-07-01,5.58,1,0
USA,USD,United States,2024-01-01,5.69,1,0
USA,USD,United States,2024-07-01,5.69,1,0
CHE,CHF,Switzerland,2024-01-01,7.1,0.86,0.44
CHE,CHF,Switzerland,2024-07-01,7.1,0.88,0.41
";

pub const PENN_CSV: &str = "\
countrycode,country,currency_unit,year,rgdpe,pop,hc
FRA,France,Euro,2018,2900000,64.9,3.1
FRA,France,Euro,2019,2950000,65.1,3.1
CHL,Chile,Chilean Peso,2019,450000,18.9,
";

/// Create a Numbeo-style SQLite database with numbers stored as TEXT.
pub async fn create_numbeo_db(path: &Path, table: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create SQLite fixture");

    sqlx::query(&format!(
        "CREATE TABLE {table} (id_city INTEGER, name TEXT, status TEXT, \"Average Monthly Net Salary\" TEXT, \"Rent 1 Bedroom\" REAL)"
    ))
    .execute(&pool)
    .await
    .expect("Failed to create table");

    for (id, name, status, salary, rent) in [
        (1, "Paris", "ok", "3100", 1200.5),
        (2, "Lyon", "ok", "2600", 750.0),
        (3, "Santiago", "partial", "", 520.0),
    ] {
        sqlx::query(&format!(
            "INSERT INTO {table} (id_city, name, status, \"Average Monthly Net Salary\", \"Rent 1 Bedroom\") VALUES (?, ?, ?, ?, ?)"
        ))
        .bind(id)
        .bind(name)
        .bind(status)
        .bind(salary)
        .bind(rent)
        .execute(&pool)
        .await
        .expect("Failed to insert fixture row");
    }

    pool.close().await;
}
