use std::path::{Path, PathBuf};
use tracing::info;

use super::ImportError;
use crate::table::{RawSheet, Value};

/// Reads a flat CSV export (header row + records) into a [`RawSheet`].
pub struct CsvImporter {
    path: PathBuf,
}

impl CsvImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<RawSheet, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(ImportError::MissingHeader);
        }

        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, _)| i)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let values: Vec<Value> = kept
                .iter()
                .map(|&i| record.get(i).map(Value::from_text).unwrap_or(Value::Null))
                .collect();
            if values.iter().all(Value::is_null) {
                continue;
            }
            rows.push(values);
        }

        info!(
            "Read {} rows x {} columns from {}",
            rows.len(),
            kept.len(),
            self.path.display()
        );

        Ok(RawSheet::new(
            kept.iter().map(|&i| headers[i].clone()).collect(),
            rows,
        ))
    }
}
