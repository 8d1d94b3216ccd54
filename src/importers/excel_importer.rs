use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ImportError;
use crate::table::{RawSheet, Value};

/// Reads one worksheet of an Excel workbook into a [`RawSheet`].
///
/// The first non-empty row is the header row. Columns with a blank header are
/// dropped (stray index columns left over from spreadsheet exports).
pub struct ExcelImporter {
    workbook_path: PathBuf,
}

impl ExcelImporter {
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.workbook_path
    }

    /// Read the first worksheet of the workbook
    pub fn read_first_sheet(&self) -> Result<RawSheet, ImportError> {
        let mut workbook = open_workbook_auto(&self.workbook_path)
            .map_err(|e| ImportError::WorkbookOpen(e.to_string()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::NoSheets(self.workbook_path.display().to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|_| ImportError::SheetNotFound(sheet_name.clone()))?;

        self.sheet_from_range(&sheet_name, &range)
    }

    fn sheet_from_range(
        &self,
        sheet_name: &str,
        range: &Range<Data>,
    ) -> Result<RawSheet, ImportError> {
        let mut rows = range
            .rows()
            .skip_while(|row| row.iter().all(|cell| matches!(cell, Data::Empty)));

        let header_row = rows.next().ok_or(ImportError::MissingHeader)?;
        let headers: Vec<String> = header_row.iter().map(header_text).collect();

        // Keep only columns that carry a header
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, _)| i)
            .collect();
        if kept.len() < headers.len() {
            debug!(
                "Dropping {} unnamed column(s) from sheet {}",
                headers.len() - kept.len(),
                sheet_name
            );
        }

        let mut data_rows = Vec::new();
        for row in rows {
            let values: Vec<Value> = kept
                .iter()
                .map(|&i| row.get(i).map(cell_value).unwrap_or(Value::Null))
                .collect();
            if values.iter().all(Value::is_null) {
                continue;
            }
            data_rows.push(values);
        }

        info!(
            "Read {} rows x {} columns from {} [{}]",
            data_rows.len(),
            kept.len(),
            self.workbook_path.display(),
            sheet_name
        );

        Ok(RawSheet::new(
            kept.iter().map(|&i| headers[i].clone()).collect(),
            data_rows,
        ))
    }
}

/// Render a header cell as text. Date headers (BIS period columns) become
/// ISO dates; whole-number headers (year columns) lose their ".0".
fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .or_else(|| {
                excel_serial_to_date(dt.as_f64()).map(|d| d.format("%Y-%m-%d").to_string())
            })
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.split('T').next().unwrap_or(s).to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) if f.is_finite() => Value::Number(*f),
        Data::String(s) => Value::from_text(s),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Value::Date(d.date()),
            None => excel_serial_to_date(dt.as_f64())
                .map(Value::Date)
                .unwrap_or(Value::Null),
        },
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or_else(|_| Value::Text(s.clone())),
        Data::Error(e) => {
            warn!("Cell error {:?} read as missing value", e);
            Value::Null
        }
        _ => Value::Null,
    }
}

/// Convert an Excel serial day number to a date (1900 date system).
///
/// Returns `None` for serials that are not finite or fall outside the
/// representable date range.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    let base_date = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base_date.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
}

// NaiveDate spans roughly +/- 262,000 years
const MAX_SERIAL_DAYS: f64 = 1.0e8;
