//! Penn World Table: country-year panel of national accounts.

use clap::Args;
use serde::{Deserialize, Serialize};

use super::normalize_sheet;
use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::table::{RawSheet, Table, Value};

pub const YEAR_COLUMN: &str = "year";
const LEADING: [&str; 4] = ["countrycode", "country", "currency_unit", "year"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct PennSelection {
    #[arg(long)]
    pub country: Option<String>,
    /// Comma-separated years (default: every year)
    #[arg(long = "year", value_delimiter = ',')]
    pub years: Vec<i32>,
    /// Comma-separated value columns (default: every numeric column)
    #[arg(long = "vars", value_delimiter = ',')]
    pub variables: Option<Vec<String>>,
}

impl PennSelection {
    pub fn export_parts(&self) -> Vec<Option<String>> {
        vec![self.country.clone()]
    }
}

pub fn load(sheet: RawSheet) -> Result<Table, SourceError> {
    let required = ["countrycode", "country", YEAR_COLUMN];
    let table = normalize_sheet(Source::Penn, sheet, &[], &required)?;
    let year_idx = table
        .column_index(YEAR_COLUMN)
        .ok_or_else(|| SourceError::MissingColumn {
            dataset: Source::Penn,
            column: YEAR_COLUMN.to_string(),
        })?;

    let columns = table.columns().to_vec();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let year = match &row[year_idx] {
                Value::Null => Value::Null,
                cell => cell
                    .year()
                    .map(|y| Value::Integer(i64::from(y)))
                    .ok_or_else(|| SourceError::InvalidValue {
                        dataset: Source::Penn,
                        column: YEAR_COLUMN.to_string(),
                        value: cell.to_string(),
                    })?,
            };
            let mut row = row.clone();
            row[year_idx] = year;
            Ok::<_, SourceError>(row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table::new(columns, rows))
}

pub fn country_options(table: &Table) -> Result<Vec<String>, QueryError> {
    table.distinct_values("country")
}

pub fn variable_options(table: &Table) -> Vec<String> {
    table.numeric_columns(&LEADING)
}

pub fn year_options(table: &Table) -> Result<Vec<i32>, QueryError> {
    table.distinct_years(YEAR_COLUMN)
}

pub fn filter(table: &Table, selection: &PennSelection) -> Result<Table, QueryError> {
    Criteria::new()
        .equals("country", selection.country.as_deref())
        .years(YEAR_COLUMN, &selection.years)
        .leading(&LEADING)
        .variables(Variables::from_selection(selection.variables.as_deref()))
        .apply(table)
}
