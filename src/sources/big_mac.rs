//! The Economist Big Mac Index: one row per country and publication date.

use chrono::Datelike;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::{normalize_sheet, OptionScope};
use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::importers::excel_importer::excel_serial_to_date;
use crate::table::{RawSheet, Table, Value};
use crate::utils::parse_date_label;

pub const ID_COLUMNS: [&str; 3] = ["iso_a3", "currency_code", "name"];
pub const DATE_COLUMN: &str = "date";

const LEADING: [&str; 4] = ["iso_a3", "currency_code", "name", "date"];
const ALIASES: [(&str, &str); 3] = [
    ("iso", "iso_a3"),
    ("currency", "currency_code"),
    ("country", "name"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct BigMacSelection {
    /// ISO 3166 alpha-3 code
    #[arg(long)]
    pub iso: Option<String>,
    /// ISO 4217 currency code
    #[arg(long)]
    pub currency: Option<String>,
    /// Country name
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub month: Option<u32>,
    #[arg(long)]
    pub day: Option<u32>,
    /// Comma-separated value columns (default: every numeric column)
    #[arg(long = "vars", value_delimiter = ',')]
    pub variables: Option<Vec<String>>,
}

impl BigMacSelection {
    /// Identifier part of the export file name: the first identifier set.
    pub fn export_parts(&self) -> Vec<Option<String>> {
        vec![self
            .iso
            .clone()
            .or_else(|| self.currency.clone())
            .or_else(|| self.name.clone())]
    }
}

/// Normalize headers and coerce the `date` column.
pub fn load(sheet: RawSheet) -> Result<Table, SourceError> {
    let table = normalize_sheet(Source::BigMac, sheet, &ALIASES, &LEADING)?;
    let date_idx = table
        .column_index(DATE_COLUMN)
        .ok_or_else(|| SourceError::MissingColumn {
            dataset: Source::BigMac,
            column: DATE_COLUMN.to_string(),
        })?;

    let columns = table.columns().to_vec();
    let mut rows = Vec::with_capacity(table.height());
    for row in table.rows() {
        let mut row = row.clone();
        row[date_idx] = coerce_date(&row[date_idx])?;
        rows.push(row);
    }

    debug!("Big Mac: {} rows, {} columns", rows.len(), columns.len());
    Ok(Table::new(columns, rows))
}

fn coerce_date(cell: &Value) -> Result<Value, SourceError> {
    let parsed = match cell {
        Value::Null => return Ok(Value::Null),
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_label(s),
        Value::Integer(i) => excel_serial_to_date(*i as f64),
        Value::Number(f) => excel_serial_to_date(*f),
    };
    parsed.map(Value::Date).ok_or_else(|| SourceError::InvalidValue {
        dataset: Source::BigMac,
        column: DATE_COLUMN.to_string(),
        value: cell.to_string(),
    })
}

/// Distinct `(iso_a3, currency_code, name)` combinations, in first-seen order.
pub fn lookup_table(table: &Table) -> Result<Table, QueryError> {
    let ids: Vec<String> = ID_COLUMNS.iter().map(|c| c.to_string()).collect();
    table.distinct_rows(&ids)
}

/// Combinations matching exactly one of iso / currency / name.
pub fn resolve_identity(
    table: &Table,
    iso: Option<&str>,
    currency: Option<&str>,
    name: Option<&str>,
) -> Result<Table, QueryError> {
    let given = [iso, currency, name].iter().filter(|v| v.is_some()).count();
    if given != 1 {
        return Err(QueryError::AmbiguousIdentity(given));
    }
    let lookup = lookup_table(table)?;
    Criteria::new()
        .equals("iso_a3", iso)
        .equals("currency_code", currency)
        .equals("name", name)
        .leading(&ID_COLUMNS)
        .variables(Variables::Only(Vec::new()))
        .apply(&lookup)
}

/// Identifier combinations whose country name matches, ignoring case.
pub fn country_metadata(table: &Table, name: &str) -> Result<Table, QueryError> {
    let lookup = lookup_table(table)?;
    let idx = lookup.require_column("name")?;
    let wanted = name.trim().to_lowercase();
    Ok(lookup.filter_rows(|row| {
        row[idx]
            .as_key()
            .is_some_and(|v| v.trim().to_lowercase() == wanted)
    }))
}

/// Values for one identifier column, narrowed by the other identifiers in scope.
pub fn identifier_options(
    table: &Table,
    column: &str,
    scope: &OptionScope,
) -> Result<Vec<String>, QueryError> {
    let mut criteria = Criteria::new();
    if column != "iso_a3" {
        criteria = criteria.equals("iso_a3", scope.iso.as_deref());
    }
    if column != "currency_code" {
        criteria = criteria.equals("currency_code", scope.currency.as_deref());
    }
    if column != "name" {
        criteria = criteria.equals("name", scope.name.as_deref());
    }
    let narrowed = criteria
        .leading(&ID_COLUMNS)
        .variables(Variables::Only(Vec::new()))
        .apply(&lookup_table(table)?)?;
    narrowed.distinct_values(column)
}

pub fn variable_options(table: &Table) -> Vec<String> {
    table.numeric_columns(&LEADING)
}

fn dates_in_scope(
    table: &Table,
    scope: &OptionScope,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Vec<chrono::NaiveDate>, QueryError> {
    let narrowed = Criteria::new()
        .equals("iso_a3", scope.iso.as_deref())
        .equals("currency_code", scope.currency.as_deref())
        .equals("name", scope.name.as_deref())
        .year(DATE_COLUMN, year)
        .month(DATE_COLUMN, month)
        .leading(&LEADING)
        .variables(Variables::Only(Vec::new()))
        .apply(table)?;
    let dates = narrowed
        .column(DATE_COLUMN)?
        .filter_map(Value::as_date)
        .collect();
    Ok(dates)
}

/// Years with data for the identifiers in scope.
pub fn year_options(table: &Table, scope: &OptionScope) -> Result<Vec<i32>, QueryError> {
    let years: BTreeSet<i32> = dates_in_scope(table, scope, None, None)?
        .iter()
        .map(|d| d.year())
        .collect();
    Ok(years.into_iter().collect())
}

/// Months with data, narrowed by the year in scope when one is set.
pub fn month_options(table: &Table, scope: &OptionScope) -> Result<Vec<u32>, QueryError> {
    let months: BTreeSet<u32> = dates_in_scope(table, scope, scope.year, None)?
        .iter()
        .map(|d| d.month())
        .collect();
    Ok(months.into_iter().collect())
}

/// Days with data, narrowed by the year and month in scope.
pub fn day_options(table: &Table, scope: &OptionScope) -> Result<Vec<u32>, QueryError> {
    let days: BTreeSet<u32> = dates_in_scope(table, scope, scope.year, scope.month)?
        .iter()
        .map(|d| d.day())
        .collect();
    Ok(days.into_iter().collect())
}

pub fn filter(table: &Table, selection: &BigMacSelection) -> Result<Table, QueryError> {
    Criteria::new()
        .equals("iso_a3", selection.iso.as_deref())
        .equals("currency_code", selection.currency.as_deref())
        .equals("name", selection.name.as_deref())
        .year(DATE_COLUMN, selection.year)
        .month(DATE_COLUMN, selection.month)
        .day(DATE_COLUMN, selection.day)
        .leading(&LEADING)
        .variables(Variables::from_selection(selection.variables.as_deref()))
        .apply(table)
}
