//! Wide-to-long reshaping and multi-file merging.
//!
//! Wide exports carry a fixed set of metadata columns followed by one column
//! per period. Every header is classified up front: a known metadata column,
//! a period label, or a malformed-input error naming the column.

use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

use crate::catalog::Source;
use crate::error::SourceError;
use crate::table::{RawSheet, Table, Value};
use crate::utils::{canonical_header, parse_date_label, parse_year_label};

/// Describes the metadata side of a wide export.
#[derive(Debug, Clone, Copy)]
pub struct WideLayout<'a> {
    pub source: Source,
    /// Canonical metadata columns, in output order.
    pub metadata: &'a [&'a str],
    /// Metadata columns that must be present in every file.
    pub required: &'a [&'a str],
    /// `(normalized variant, canonical)` header aliases.
    pub aliases: &'a [(&'a str, &'a str)],
}

#[derive(Debug, Clone, PartialEq)]
enum HeaderRole<T> {
    Metadata(String),
    Period(T),
}

impl<'a> WideLayout<'a> {
    fn classify<T, F>(
        &self,
        headers: &[String],
        parse_period: F,
    ) -> Result<Vec<HeaderRole<T>>, SourceError>
    where
        F: Fn(&str) -> Option<T>,
    {
        let roles = headers
            .iter()
            .map(|raw| {
                let name = canonical_header(raw, self.aliases);
                if self.metadata.contains(&name.as_str()) {
                    Ok(HeaderRole::Metadata(name))
                } else if let Some(period) = parse_period(raw) {
                    Ok(HeaderRole::Period(period))
                } else {
                    Err(SourceError::InvalidTimeColumn {
                        dataset: self.source,
                        column: raw.clone(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        for column in self.required {
            let present = roles
                .iter()
                .any(|r| matches!(r, HeaderRole::Metadata(name) if name == column));
            if !present {
                return Err(SourceError::MissingColumn {
                    dataset: self.source,
                    column: column.to_string(),
                });
            }
        }
        Ok(roles)
    }
}

/// Melt World Bank style year columns into `(metadata..., year, value)` rows.
///
/// Sheets are concatenated in the order given. Rows whose `row_key` cell is
/// missing (the "Data from database" / "Last Updated" footer lines) are skipped.
/// A `(metadata..., year)` pair seen in an earlier sheet keeps its first value;
/// repeats from overlapping files are dropped with a warning.
pub fn melt_years(
    layout: &WideLayout<'_>,
    sheets: &[RawSheet],
    row_key: &str,
) -> Result<Table, SourceError> {
    let mut columns: Vec<String> = layout.metadata.iter().map(|c| c.to_string()).collect();
    columns.push("year".to_string());
    columns.push("value".to_string());

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    let mut seen: HashSet<(Vec<String>, i32)> = HashSet::new();
    let mut duplicates = 0usize;

    for sheet in sheets {
        let roles = layout.classify(&sheet.headers, parse_year_label)?;

        let meta_positions: Vec<Option<usize>> = layout
            .metadata
            .iter()
            .map(|name| {
                roles
                    .iter()
                    .position(|r| matches!(r, HeaderRole::Metadata(n) if n == name))
            })
            .collect();
        let key_position = roles
            .iter()
            .position(|r| matches!(r, HeaderRole::Metadata(n) if n == row_key));

        for row in &sheet.rows {
            if key_position.map_or(true, |k| row[k].is_null()) {
                skipped += 1;
                continue;
            }
            let metadata: Vec<Value> = meta_positions
                .iter()
                .map(|pos| pos.map(|p| row[p].clone()).unwrap_or(Value::Null))
                .collect();

            let identity: Vec<String> = metadata.iter().map(Value::to_string).collect();

            for (idx, role) in roles.iter().enumerate() {
                if let HeaderRole::Period(year) = role {
                    if !seen.insert((identity.clone(), *year)) {
                        duplicates += 1;
                        continue;
                    }
                    let mut long_row = metadata.clone();
                    long_row.push(Value::Integer(i64::from(*year)));
                    long_row.push(row[idx].clone());
                    rows.push(long_row);
                }
            }
        }
    }

    if skipped > 0 {
        debug!("{}: skipped {} rows without '{}'", layout.source, skipped, row_key);
    }
    if duplicates > 0 {
        warn!(
            "{}: dropped {} repeated observations from overlapping files",
            layout.source, duplicates
        );
    }
    Ok(Table::new(columns, rows))
}

/// One time series after merging: metadata from its first occurrence and
/// the union of observations from every file it appears in.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub key: String,
    pub metadata: BTreeMap<String, Value>,
    pub observations: BTreeMap<NaiveDate, Value>,
}

impl SeriesRow {
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.observations.keys().copied().collect()
    }
}

/// Accumulates wide files keyed by timeseries identifier.
#[derive(Debug)]
pub struct SeriesMerger<'a> {
    layout: WideLayout<'a>,
    key_column: &'a str,
    /// Used to build a key when a file has no key column.
    key_parts: &'a [&'a str],
    series: Vec<SeriesRow>,
    index: HashMap<String, usize>,
    seen_metadata: BTreeSet<String>,
}

impl<'a> SeriesMerger<'a> {
    pub fn new(layout: WideLayout<'a>, key_column: &'a str, key_parts: &'a [&'a str]) -> Self {
        Self {
            layout,
            key_column,
            key_parts,
            series: Vec::new(),
            index: HashMap::new(),
            seen_metadata: BTreeSet::new(),
        }
    }

    /// Fold one wide file into the merged set.
    ///
    /// A date already holding a value for a key is never overwritten; a
    /// missing cell can be filled by a later file.
    pub fn absorb(&mut self, sheet: &RawSheet) -> Result<(), SourceError> {
        let roles = self.layout.classify(&sheet.headers, parse_date_label)?;

        let has_key_column = roles
            .iter()
            .any(|r| matches!(r, HeaderRole::Metadata(n) if n == self.key_column));
        if !has_key_column {
            for part in self.key_parts {
                let present = roles
                    .iter()
                    .any(|r| matches!(r, HeaderRole::Metadata(n) if n == part));
                if !present {
                    return Err(SourceError::MissingColumn {
                        dataset: self.layout.source,
                        column: self.key_column.to_string(),
                    });
                }
            }
        }

        for role in &roles {
            if let HeaderRole::Metadata(name) = role {
                self.seen_metadata.insert(name.clone());
            }
        }

        for row in &sheet.rows {
            let metadata: BTreeMap<String, Value> = roles
                .iter()
                .zip(row)
                .filter_map(|(role, value)| match role {
                    HeaderRole::Metadata(name) => Some((name.clone(), value.clone())),
                    HeaderRole::Period(_) => None,
                })
                .collect();

            let Some(key) = self.series_key(&metadata) else {
                continue;
            };

            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    self.series.push(SeriesRow {
                        key: key.clone(),
                        metadata,
                        observations: BTreeMap::new(),
                    });
                    self.index.insert(key, self.series.len() - 1);
                    self.series.len() - 1
                }
            };

            let observations = &mut self.series[slot].observations;
            for (role, value) in roles.iter().zip(row) {
                if let HeaderRole::Period(date) = role {
                    match observations.entry(*date) {
                        Entry::Vacant(entry) => {
                            entry.insert(value.clone());
                        }
                        Entry::Occupied(mut entry) => {
                            if entry.get().is_null() && !value.is_null() {
                                entry.insert(value.clone());
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn series_key(&self, metadata: &BTreeMap<String, Value>) -> Option<String> {
        if let Some(key) = metadata.get(self.key_column).and_then(Value::as_key) {
            return Some(key);
        }
        let parts: Vec<String> = self
            .key_parts
            .iter()
            .map(|p| metadata.get(*p).and_then(Value::as_key).unwrap_or_default())
            .collect();
        if parts.iter().all(String::is_empty) {
            None
        } else {
            Some(parts.join(":"))
        }
    }

    pub fn series(&self) -> &[SeriesRow] {
        &self.series
    }

    pub fn get(&self, key: &str) -> Option<&SeriesRow> {
        self.index.get(key).map(|&i| &self.series[i])
    }

    /// Melt the merged series into `(metadata..., date, value)` rows, one
    /// row per observed date, series in first-seen order.
    pub fn into_long(self) -> Table {
        let mut metadata_columns: Vec<String> = vec![self.key_column.to_string()];
        metadata_columns.extend(
            self.layout
                .metadata
                .iter()
                .filter(|c| **c != self.key_column && self.seen_metadata.contains(**c))
                .map(|c| c.to_string()),
        );

        let mut columns = metadata_columns.clone();
        columns.push("date".to_string());
        columns.push("value".to_string());

        let mut rows = Vec::new();
        for series in self.series {
            let metadata: Vec<Value> = metadata_columns
                .iter()
                .map(|c| {
                    if c == self.key_column {
                        Value::Text(series.key.clone())
                    } else {
                        series.metadata.get(c).cloned().unwrap_or(Value::Null)
                    }
                })
                .collect();
            for (date, value) in series.observations {
                let mut row = metadata.clone();
                row.push(Value::Date(date));
                row.push(value);
                rows.push(row);
            }
        }
        Table::new(columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WB_META: [&str; 2] = ["country_name", "series_code"];

    fn wb_layout() -> WideLayout<'static> {
        WideLayout {
            source: Source::WbCpi,
            metadata: &WB_META,
            required: &WB_META,
            aliases: &[],
        }
    }

    #[test]
    fn test_melt_years_long_rows_and_footer_skip() {
        let sheet = RawSheet::from_strs(
            &["Country Name", "Series Code", "1960 [YR1960]", "1961 [YR1961]"],
            &[
                &["France", "CPI", "10.5", ".."],
                &["Data from database: WDI", "", "", ""],
            ],
        );
        let table = melt_years(&wb_layout(), &[sheet], "series_code").unwrap();
        assert_eq!(table.columns(), &["country_name", "series_code", "year", "value"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows()[0][2], Value::Integer(1960));
        assert_eq!(table.rows()[0][3], Value::Number(10.5));
        assert_eq!(table.rows()[1][3], Value::Null);
    }

    #[test]
    fn test_melt_years_overlapping_sheets_keep_first_value() {
        let early = RawSheet::from_strs(
            &["Country Name", "Series Code", "1969 [YR1969]", "1970 [YR1970]"],
            &[&["France", "CPI", "20.1", "21.0"]],
        );
        let late = RawSheet::from_strs(
            &["Country Name", "Series Code", "1970 [YR1970]", "1971 [YR1971]"],
            &[&["France", "CPI", "99.9", "22.4"], &["Chile", "CPI", "3.0", "3.5"]],
        );
        let table = melt_years(&wb_layout(), &[early, late], "series_code").unwrap();
        assert_eq!(table.height(), 5);

        let france_1970: Vec<&Value> = table
            .rows()
            .iter()
            .filter(|r| r[0] == Value::Text("France".into()) && r[2] == Value::Integer(1970))
            .map(|r| &r[3])
            .collect();
        assert_eq!(france_1970, vec![&Value::Number(21.0)]);
    }

    #[test]
    fn test_melt_years_rejects_unknown_column() {
        let sheet = RawSheet::from_strs(
            &["Country Name", "Series Code", "Notes", "1960 [YR1960]"],
            &[&["France", "CPI", "x", "1"]],
        );
        match melt_years(&wb_layout(), &[sheet], "series_code") {
            Err(SourceError::InvalidTimeColumn { column, .. }) => assert_eq!(column, "Notes"),
            other => panic!("Expected InvalidTimeColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_melt_years_missing_required_column() {
        let sheet = RawSheet::from_strs(&["Country Name", "1960"], &[&["France", "1"]]);
        match melt_years(&wb_layout(), &[sheet], "series_code") {
            Err(SourceError::MissingColumn { column, .. }) => assert_eq!(column, "series_code"),
            other => panic!("Expected MissingColumn, got {other:?}"),
        }
    }

    const BIS_META: [&str; 3] = ["timeseries_key", "reference_area", "unit"];

    fn merger() -> SeriesMerger<'static> {
        SeriesMerger::new(
            WideLayout {
                source: Source::BisReer,
                metadata: &BIS_META,
                required: &["reference_area"],
                aliases: &[("reference_area_name", "reference_area")],
            },
            "timeseries_key",
            &["reference_area", "unit"],
        )
    }

    #[test]
    fn test_merge_never_overwrites_present_value() {
        let mut merger = merger();
        merger
            .absorb(&RawSheet::from_strs(
                &["Timeseries key", "Reference area", "Unit", "2020-01-01"],
                &[&["M.N.FR", "France", "Index", "100"]],
            ))
            .unwrap();
        merger
            .absorb(&RawSheet::from_strs(
                &["Timeseries key", "Reference area", "Unit", "2020-01-01", "2020-02-01"],
                &[&["M.N.FR", "Somewhere else", "Index", "999", "101"]],
            ))
            .unwrap();

        let series = merger.get("M.N.FR").unwrap();
        assert_eq!(series.metadata["reference_area"], Value::Text("France".into()));
        assert_eq!(series.observations.len(), 2);
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(series.observations[&jan], Value::Integer(100));
    }

    #[test]
    fn test_merge_fills_missing_cell_from_later_file() {
        let mut merger = merger();
        merger
            .absorb(&RawSheet::from_strs(
                &["Timeseries key", "Reference area", "Unit", "2020-01-01"],
                &[&["K", "France", "Index", ""]],
            ))
            .unwrap();
        merger
            .absorb(&RawSheet::from_strs(
                &["Timeseries key", "Reference area", "Unit", "2020-01-01"],
                &[&["K", "France", "Index", "98.5"]],
            ))
            .unwrap();
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(merger.get("K").unwrap().observations[&jan], Value::Number(98.5));
    }

    #[test]
    fn test_merge_composes_key_without_key_column() {
        let mut merger = merger();
        merger
            .absorb(&RawSheet::from_strs(
                &["Reference area", "Unit", "2020-01"],
                &[&["Chile", "Index", "80"]],
            ))
            .unwrap();
        assert!(merger.get("Chile:Index").is_some());

        let table = merger.into_long();
        assert_eq!(
            table.columns(),
            &["timeseries_key", "reference_area", "unit", "date", "value"]
        );
        assert_eq!(table.rows()[0][0], Value::Text("Chile:Index".into()));
    }
}
