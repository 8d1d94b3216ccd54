use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::QueryError;

/// A single cell. Spreadsheet, CSV and SQLite cells all decode into this.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Decode a textual cell (CSV field, SQLite TEXT, Excel string).
    ///
    /// Empty strings and the World Bank ".." placeholder are missing values;
    /// numeric-looking text becomes a number. Zero-padded codes such as
    /// "0012" stay text so they export unchanged.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ".." {
            return Value::Null;
        }
        if is_zero_padded(trimmed) {
            return Value::Text(trimmed.to_string());
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Value::Number(f);
            }
        }
        Value::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Number(_))
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Calendar year carried by this cell: a year number or the year of a date.
    pub fn year(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => i32::try_from(*i).ok(),
            Value::Number(f) if f.fract() == 0.0 => Some(*f as i32),
            Value::Date(d) => Some(d.year()),
            _ => None,
        }
    }

    /// Text used when comparing a cell against a selection or listing options.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn matches(&self, wanted: &str) -> bool {
        match self {
            Value::Text(s) => s == wanted,
            Value::Null => false,
            other => other.to_string() == wanted,
        }
    }
}

fn is_zero_padded(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Header row plus cell rows, exactly as a reader produced them.
///
/// Headers are untouched here; normalization happens per source because the
/// raw header text is needed to recognize date and year columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawSheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// Build a sheet from string literals. Mostly useful for fixtures.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| Value::from_text(c)).collect())
                .collect(),
        }
    }
}

/// An immutable rectangular table with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, or a lookup error listing what the table does have.
    pub fn require_column(&self, name: &str) -> Result<usize, QueryError> {
        self.column_index(name)
            .ok_or_else(|| QueryError::UnknownColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>, QueryError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// A column is numeric when it has at least one value and every
    /// non-missing value is a number.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for row in &self.rows {
            match &row[idx] {
                Value::Null => continue,
                v if v.is_numeric() => seen = true,
                _ => return false,
            }
        }
        seen
    }

    /// Numeric columns in table order, skipping `exclude`.
    pub fn numeric_columns(&self, exclude: &[&str]) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !exclude.contains(&name.as_str()))
            .filter(|(idx, _)| self.is_numeric_column(*idx))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Sorted distinct non-missing values of a column, rendered as text.
    pub fn distinct_values(&self, name: &str) -> Result<Vec<String>, QueryError> {
        let values: BTreeSet<String> = self.column(name)?.filter_map(Value::as_key).collect();
        Ok(values.into_iter().collect())
    }

    /// Sorted distinct years carried by a year or date column.
    pub fn distinct_years(&self, name: &str) -> Result<Vec<i32>, QueryError> {
        let years: BTreeSet<i32> = self.column(name)?.filter_map(Value::year).collect();
        Ok(years.into_iter().collect())
    }

    /// Rows for which `keep` returns true, in their original order.
    pub fn filter_rows<F>(&self, keep: F) -> Table
    where
        F: Fn(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Project onto `names`, in the order given.
    pub fn select(&self, names: &[String]) -> Result<Table, QueryError> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table {
            columns: names.to_vec(),
            rows,
        })
    }

    /// Project onto `names` and drop repeated rows, keeping first occurrences.
    pub fn distinct_rows(&self, names: &[String]) -> Result<Table, QueryError> {
        let projected = self.select(names)?;
        let mut seen = HashSet::new();
        let rows = projected
            .rows
            .into_iter()
            .filter(|row| seen.insert(row.iter().map(|v| v.to_string()).collect::<Vec<_>>()))
            .collect();
        Ok(Table {
            columns: projected.columns,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["country".into(), "year".into(), "pop".into(), "note".into()],
            vec![
                vec![
                    Value::Text("France".into()),
                    Value::Integer(2019),
                    Value::Number(67.1),
                    Value::Null,
                ],
                vec![
                    Value::Text("Chile".into()),
                    Value::Integer(2019),
                    Value::Null,
                    Value::Text("est.".into()),
                ],
                vec![
                    Value::Text("France".into()),
                    Value::Integer(2020),
                    Value::Integer(67),
                    Value::Null,
                ],
            ],
        )
    }

    #[test]
    fn test_from_text_decodes_numbers_and_placeholders() {
        assert_eq!(Value::from_text(" 42 "), Value::Integer(42));
        assert_eq!(Value::from_text("3.25"), Value::Number(3.25));
        assert_eq!(Value::from_text(".."), Value::Null);
        assert_eq!(Value::from_text(""), Value::Null);
        assert_eq!(Value::from_text("juillet 2025"), Value::Text("juillet 2025".into()));
        assert_eq!(Value::from_text("NaN"), Value::Text("NaN".into()));
        assert_eq!(Value::from_text("0012"), Value::Text("0012".into()));
        assert_eq!(Value::from_text("0"), Value::Integer(0));
        assert_eq!(Value::from_text("0.75"), Value::Number(0.75));
    }

    #[test]
    fn test_year_from_cells() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(Value::Date(date).year(), Some(2024));
        assert_eq!(Value::Integer(1999).year(), Some(1999));
        assert_eq!(Value::Number(2001.0).year(), Some(2001));
        assert_eq!(Value::Number(2001.5).year(), None);
        assert_eq!(Value::Text("2001".into()).year(), None);
    }

    #[test]
    fn test_numeric_columns_skip_text_and_excluded() {
        let table = sample();
        assert_eq!(table.numeric_columns(&["year"]), vec!["pop".to_string()]);
    }

    #[test]
    fn test_distinct_values_sorted_without_nulls() {
        let table = sample();
        assert_eq!(
            table.distinct_values("country").unwrap(),
            vec!["Chile".to_string(), "France".to_string()]
        );
        assert_eq!(table.distinct_values("note").unwrap(), vec!["est.".to_string()]);
        assert_eq!(table.distinct_years("year").unwrap(), vec![2019, 2020]);
    }

    #[test]
    fn test_select_unknown_column_is_lookup_error() {
        let table = sample();
        let err = table.select(&["gdp".to_string()]).unwrap_err();
        match err {
            QueryError::UnknownColumn { column, available } => {
                assert_eq!(column, "gdp");
                assert_eq!(available.len(), 4);
            }
            other => panic!("Expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_rows_keeps_order_and_leaves_source_untouched() {
        let table = sample();
        let france = table.filter_rows(|row| row[0].matches("France"));
        assert_eq!(france.height(), 2);
        assert_eq!(france.rows()[0][1], Value::Integer(2019));
        assert_eq!(france.rows()[1][1], Value::Integer(2020));
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_distinct_rows_keeps_first_occurrence() {
        let table = sample();
        let countries = table.distinct_rows(&["country".to_string()]).unwrap();
        assert_eq!(countries.height(), 2);
        assert_eq!(countries.rows()[0][0], Value::Text("France".into()));
    }
}
