//! Numbeo cost of living snapshot: one row per city.

use clap::Args;
use serde::{Deserialize, Serialize};

use super::normalize_sheet;
use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::table::{RawSheet, Table};

pub const CITY_COLUMN: &str = "city";
pub const STATUS_COLUMN: &str = "status";

const ALIASES: [(&str, &str); 2] = [("name", "city"), ("city_name", "city")];

/// Internal identifiers of the scraped database, never offered as variables.
const DROPPED: [&str; 2] = ["id_city", "id"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct NumbeoSelection {
    /// Comma-separated cities (default: every city)
    #[arg(long = "city", value_delimiter = ',')]
    pub cities: Vec<String>,
    /// Comma-separated value columns (default: every numeric column)
    #[arg(long = "vars", value_delimiter = ',')]
    pub variables: Option<Vec<String>>,
}

impl NumbeoSelection {
    pub fn export_parts(&self) -> Vec<Option<String>> {
        if self.cities.is_empty() {
            vec![None]
        } else {
            vec![Some(self.cities.join("-"))]
        }
    }
}

pub fn load(sheet: RawSheet) -> Result<Table, SourceError> {
    let table = normalize_sheet(Source::Numbeo, sheet, &ALIASES, &[CITY_COLUMN])?;
    let keep: Vec<usize> = (0..table.width())
        .filter(|&i| !DROPPED.contains(&table.columns()[i].as_str()))
        .collect();

    let columns = keep.iter().map(|&i| table.columns()[i].clone()).collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(Table::new(columns, rows))
}

pub fn city_options(table: &Table) -> Result<Vec<String>, QueryError> {
    table.distinct_values(CITY_COLUMN)
}

pub fn variable_options(table: &Table) -> Vec<String> {
    table.numeric_columns(&[CITY_COLUMN, STATUS_COLUMN])
}

pub fn filter(table: &Table, selection: &NumbeoSelection) -> Result<Table, QueryError> {
    Criteria::new()
        .one_of(CITY_COLUMN, &selection.cities)
        .leading(&[CITY_COLUMN, STATUS_COLUMN])
        .variables(Variables::from_selection(selection.variables.as_deref()))
        .apply(table)
}
