//! World Bank International Comparison Program: price levels by
//! expenditure classification.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::reshape::{melt_years, WideLayout};
use crate::table::{RawSheet, Table};

pub const METADATA: [&str; 6] = [
    "country_name",
    "country_code",
    "classification_name",
    "classification_code",
    "series_name",
    "series_code",
];

const LAYOUT: WideLayout<'static> = WideLayout {
    source: Source::WbIcp,
    metadata: &METADATA,
    required: &["country_name", "classification_name", "series_name", "series_code"],
    aliases: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct IcpSelection {
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub classification: Option<String>,
    #[arg(long)]
    pub series: Option<String>,
    /// Comma-separated years (default: every year)
    #[arg(long = "year", value_delimiter = ',')]
    pub years: Vec<i32>,
}

impl IcpSelection {
    pub fn export_parts(&self) -> Vec<Option<String>> {
        vec![self.country.clone(), self.series.clone()]
    }
}

pub fn load(sheet: RawSheet) -> Result<Table, SourceError> {
    melt_years(&LAYOUT, std::slice::from_ref(&sheet), "series_code")
}

pub fn country_options(table: &Table) -> Result<Vec<String>, QueryError> {
    table.distinct_values("country_name")
}

/// Classifications available, narrowed to one country when given.
pub fn classification_options(
    table: &Table,
    country: Option<&str>,
) -> Result<Vec<String>, QueryError> {
    narrowed(table, country, None)?.distinct_values("classification_name")
}

/// Series available, narrowed by country and classification when given.
pub fn series_options(
    table: &Table,
    country: Option<&str>,
    classification: Option<&str>,
) -> Result<Vec<String>, QueryError> {
    narrowed(table, country, classification)?.distinct_values("series_name")
}

pub fn year_options(table: &Table) -> Result<Vec<i32>, QueryError> {
    table.distinct_years("year")
}

fn narrowed(
    table: &Table,
    country: Option<&str>,
    classification: Option<&str>,
) -> Result<Table, QueryError> {
    Criteria::new()
        .equals("country_name", country)
        .equals("classification_name", classification)
        .leading(&METADATA)
        .variables(Variables::Only(Vec::new()))
        .apply(table)
}

pub fn filter(table: &Table, selection: &IcpSelection) -> Result<Table, QueryError> {
    let mut leading: Vec<&str> = METADATA.to_vec();
    leading.push("year");

    Criteria::new()
        .equals("country_name", selection.country.as_deref())
        .equals("classification_name", selection.classification.as_deref())
        .equals("series_name", selection.series.as_deref())
        .years("year", &selection.years)
        .leading(&leading)
        .variables(Variables::Only(vec!["value".to_string()]))
        .apply(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        load(RawSheet::from_strs(
            &[
                "Country Name",
                "Country Code",
                "Classification Name",
                "Classification Code",
                "Series Name",
                "Series Code",
                "2017 [YR2017]",
                "2021 [YR2021]",
            ],
            &[
                &[
                    "France",
                    "FRA",
                    "Actual individual consumption",
                    "9020000",
                    "Price level index",
                    "PX.WL",
                    "110",
                    "108",
                ],
                &["France", "FRA", "Food", "1101000", "Price level index", "PX.FD", "112", ".."],
                &["Chile", "CHL", "Food", "1101000", "Expenditure per capita", "EX.PC", "45", "50"],
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_cascading_options() {
        let table = sample();
        assert_eq!(
            classification_options(&table, Some("Chile")).unwrap(),
            vec!["Food"]
        );
        assert_eq!(
            series_options(&table, None, Some("Food")).unwrap(),
            vec!["Expenditure per capita", "Price level index"]
        );
        assert_eq!(
            series_options(&table, Some("France"), Some("Food")).unwrap(),
            vec!["Price level index"]
        );
    }

    #[test]
    fn test_filter_all_dimensions() {
        let selection = IcpSelection {
            country: Some("France".into()),
            classification: Some("Food".into()),
            series: Some("Price level index".into()),
            years: Vec::new(),
        };
        let out = filter(&sample(), &selection).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 8);
    }
}
