//! One module per dataset: canonical schema, load from raw sheets, option
//! lists for each selectable dimension, and the filter.

pub mod big_mac;
pub mod bis;
pub mod numbeo;
pub mod penn;
pub mod wb_cpi;
pub mod wb_icp;

use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::table::{RawSheet, Table};
use crate::utils::canonical_header;

/// Rename headers to their canonical names and check required columns.
///
/// When two raw headers normalize to the same name the later one gets a
/// numeric suffix so no column is silently lost.
pub(crate) fn normalize_sheet(
    source: Source,
    sheet: RawSheet,
    aliases: &[(&str, &str)],
    required: &[&str],
) -> Result<Table, SourceError> {
    let mut seen = HashSet::new();
    let columns: Vec<String> = sheet
        .headers
        .iter()
        .map(|raw| {
            let name = canonical_header(raw, aliases);
            let mut candidate = name.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{name}_{n}");
                n += 1;
            }
            candidate
        })
        .collect();

    for column in required {
        if !columns.iter().any(|c| c == column) {
            return Err(SourceError::MissingColumn {
                dataset: source,
                column: column.to_string(),
            });
        }
    }

    Ok(Table::new(columns, sheet.rows))
}

/// Narrowing context for option lists, so that a dimension only offers
/// values compatible with what has already been picked.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionScope {
    pub iso: Option<String>,
    pub currency: Option<String>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub classification: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Selectable dimensions per source.
pub fn dimensions(source: Source) -> &'static [&'static str] {
    match source {
        Source::BigMac => &["iso", "currency", "name", "variables", "years", "months", "days"],
        Source::BisReer => &["reference_area", "frequency", "type", "basket", "unit", "years"],
        Source::Numbeo => &["cities", "variables"],
        Source::Penn => &["countries", "variables", "years"],
        Source::WbCpi => &["countries", "series", "years"],
        Source::WbIcp => &["countries", "classifications", "series", "years"],
    }
}

/// Valid values for one dimension of a loaded source.
pub fn options(
    source: Source,
    table: &Table,
    dimension: &str,
    scope: &OptionScope,
) -> Result<Vec<String>, QueryError> {
    let years = |ys: Vec<i32>| ys.into_iter().map(|y| y.to_string()).collect::<Vec<_>>();
    let numbers = |ns: Vec<u32>| ns.into_iter().map(|n| n.to_string()).collect::<Vec<_>>();

    match (source, dimension) {
        (Source::BigMac, "iso") => big_mac::identifier_options(table, "iso_a3", scope),
        (Source::BigMac, "currency") => big_mac::identifier_options(table, "currency_code", scope),
        (Source::BigMac, "name") => big_mac::identifier_options(table, "name", scope),
        (Source::BigMac, "variables") => Ok(big_mac::variable_options(table)),
        (Source::BigMac, "years") => big_mac::year_options(table, scope).map(years),
        (Source::BigMac, "months") => big_mac::month_options(table, scope).map(numbers),
        (Source::BigMac, "days") => big_mac::day_options(table, scope).map(numbers),

        (Source::BisReer, "years") => bis::year_options(table).map(years),
        (Source::BisReer, column) if bis::FILTER_COLUMNS.contains(&column) => {
            table.distinct_values(column)
        }

        (Source::Numbeo, "cities") => numbeo::city_options(table),
        (Source::Numbeo, "variables") => Ok(numbeo::variable_options(table)),

        (Source::Penn, "countries") => penn::country_options(table),
        (Source::Penn, "variables") => Ok(penn::variable_options(table)),
        (Source::Penn, "years") => penn::year_options(table).map(years),

        (Source::WbCpi, "countries") => wb_cpi::country_options(table),
        (Source::WbCpi, "series") => wb_cpi::series_options(table),
        (Source::WbCpi, "years") => wb_cpi::year_options(table).map(years),

        (Source::WbIcp, "countries") => wb_icp::country_options(table),
        (Source::WbIcp, "classifications") => {
            wb_icp::classification_options(table, scope.country.as_deref())
        }
        (Source::WbIcp, "series") => wb_icp::series_options(
            table,
            scope.country.as_deref(),
            scope.classification.as_deref(),
        ),
        (Source::WbIcp, "years") => wb_icp::year_options(table).map(years),

        _ => Err(QueryError::UnknownDimension {
            dataset: source,
            dimension: dimension.to_string(),
            expected: dimensions(source).to_vec(),
        }),
    }
}
