//! BIS real effective exchange rates, exported as one wide file per period.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::catalog::Source;
use crate::error::{QueryError, SourceError};
use crate::filter::{Criteria, Variables};
use crate::reshape::{SeriesMerger, WideLayout};
use crate::table::{RawSheet, Table};

pub const KEY_COLUMN: &str = "timeseries_key";

pub const METADATA: [&str; 8] = [
    "timeseries_key",
    "frequency",
    "type",
    "basket",
    "reference_area",
    "unit",
    "unit_multiplier",
    "title",
];

/// Columns that can narrow a query, in the order they are offered.
pub const FILTER_COLUMNS: [&str; 5] = ["reference_area", "frequency", "type", "basket", "unit"];

/// Composite key parts for files without a timeseries key column.
const KEY_PARTS: [&str; 5] = ["reference_area", "type", "basket", "unit", "frequency"];

const ALIASES: [(&str, &str); 9] = [
    ("ref_area", "reference_area"),
    ("reference_area_name", "reference_area"),
    ("timeseries", "timeseries_key"),
    ("time_series_key", "timeseries_key"),
    ("series_key", "timeseries_key"),
    ("key", "timeseries_key"),
    ("freq", "frequency"),
    ("eer_type", "type"),
    ("eer_basket", "basket"),
];

const LAYOUT: WideLayout<'static> = WideLayout {
    source: Source::BisReer,
    metadata: &METADATA,
    required: &["reference_area"],
    aliases: &ALIASES,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Args)]
pub struct BisSelection {
    #[arg(long)]
    pub reference_area: Option<String>,
    #[arg(long)]
    pub frequency: Option<String>,
    #[serde(rename = "type")]
    #[arg(long = "type")]
    pub series_type: Option<String>,
    #[arg(long)]
    pub basket: Option<String>,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
}

impl BisSelection {
    pub fn export_parts(&self) -> Vec<Option<String>> {
        vec![self.reference_area.clone()]
    }
}

/// Merge every period file by timeseries key.
///
/// `sheets` must already be in sorted file-name order; earlier files win for
/// metadata and for any date present in more than one file.
pub fn merge(sheets: &[RawSheet]) -> Result<SeriesMerger<'static>, SourceError> {
    let mut merger = SeriesMerger::new(LAYOUT, KEY_COLUMN, &KEY_PARTS);
    for sheet in sheets {
        merger.absorb(sheet)?;
    }
    Ok(merger)
}

/// Merge and melt into `(timeseries_key, metadata..., date, value)` rows.
pub fn load(sheets: &[RawSheet]) -> Result<Table, SourceError> {
    let merger = merge(sheets)?;
    info!("BIS: merged {} series from {} files", merger.series().len(), sheets.len());
    Ok(merger.into_long())
}

/// Sorted distinct values for every filterable column present in the table.
pub fn filter_options(table: &Table) -> Result<BTreeMap<String, Vec<String>>, QueryError> {
    FILTER_COLUMNS
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| Ok((c.to_string(), table.distinct_values(c)?)))
        .collect()
}

pub fn year_options(table: &Table) -> Result<Vec<i32>, QueryError> {
    table.distinct_years("date")
}

pub fn filter(table: &Table, selection: &BisSelection) -> Result<Table, QueryError> {
    let mut leading: Vec<&str> = METADATA.to_vec();
    leading.push("date");

    Criteria::new()
        .equals("reference_area", selection.reference_area.as_deref())
        .equals("frequency", selection.frequency.as_deref())
        .equals("type", selection.series_type.as_deref())
        .equals("basket", selection.basket.as_deref())
        .equals("unit", selection.unit.as_deref())
        .year("date", selection.year)
        .leading(&leading)
        .variables(Variables::Only(vec!["value".to_string()]))
        .apply(table)
}
