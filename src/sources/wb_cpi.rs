//! World Bank CPI, exported as one wide workbook per range of decades.

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::reshape::{melt_years, WideLayout};
use crate::table::{RawSheet, Table};

pub const METADATA: [&str; 4] = ["country_name", "country_code", "series_name", "series_code"];

const LAYOUT: WideLayout<'static> = WideLayout {
    source: Source::WbCpi,
    metadata: &METADATA,
    required: &METADATA,
    aliases: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct CpiSelection {
    #[arg(long)]
    pub country: Option<String>,
    /// Series name, e.g. "Consumer price index (2010 = 100)"
    #[arg(long)]
    pub series: Option<String>,
    /// Comma-separated years (default: every year)
    #[arg(long = "year", value_delimiter = ',')]
    pub years: Vec<i32>,
}

impl CpiSelection {
    pub fn export_parts(&self) -> Vec<Option<String>> {
        vec![self.country.clone(), self.series.clone()]
    }
}

/// Melt every decade workbook and concatenate them.
pub fn load(sheets: &[RawSheet]) -> Result<Table, SourceError> {
    let table = melt_years(&LAYOUT, sheets, "series_code")?;
    info!("World Bank CPI: {} observations from {} files", table.height(), sheets.len());
    Ok(table)
}

pub fn country_options(table: &Table) -> Result<Vec<String>, QueryError> {
    table.distinct_values("country_name")
}

pub fn series_options(table: &Table) -> Result<Vec<String>, QueryError> {
    table.distinct_values("series_name")
}

pub fn year_options(table: &Table) -> Result<Vec<i32>, QueryError> {
    table.distinct_years("year")
}

pub fn filter(table: &Table, selection: &CpiSelection) -> Result<Table, QueryError> {
    let mut leading: Vec<&str> = METADATA.to_vec();
    leading.push("year");

    Criteria::new()
        .equals("country_name", selection.country.as_deref())
        .equals("series_name", selection.series.as_deref())
        .years("year", &selection.years)
        .leading(&leading)
        .variables(Variables::Only(vec!["value".to_string()]))
        .apply(table)
}
