//! CSV export of filtered tables.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::Source;
use crate::table::Table;
use crate::utils::file_name_component;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name for an export: the source prefix followed by one component per
/// selection part, `All` for an unrestricted part.
///
/// # Examples
///
/// ```
/// use price_indices::catalog::Source;
/// use price_indices::export::export_file_name;
///
/// let name = export_file_name(
///     Source::WbCpi,
///     &[Some("France".to_string()), Some("Consumer price index".to_string())],
/// );
/// assert_eq!(name, "wb_cpi_France_Consumer_price_index.csv");
/// assert_eq!(export_file_name(Source::BisReer, &[None]), "bis_reer_All.csv");
/// ```
pub fn export_file_name(source: Source, parts: &[Option<String>]) -> String {
    let mut name = source.export_prefix().to_string();
    for part in parts {
        name.push('_');
        match part.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => name.push_str(&file_name_component(value)),
            _ => name.push_str("All"),
        }
    }
    name.push_str(".csv");
    name
}

/// Write `table` as UTF-8 CSV with a header row and no index column.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `table` into `dir` (created if needed) and return the file path.
pub fn export_to_dir(table: &Table, dir: &Path, file_name: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let file = fs::File::create(&path)?;
    write_csv(table, file)?;
    info!("Exported {} rows to {}", table.height(), path.display());
    Ok(path)
}
