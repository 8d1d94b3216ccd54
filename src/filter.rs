//! Row and column selection over a loaded [`Table`].
//!
//! Every dimension is optional: a `None` selection (or an empty list) puts no
//! restriction on that dimension. Conditions are ANDed together.

use chrono::Datelike;

use crate::error::QueryError;
use crate::table::{Table, Value};

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Equals { column: String, value: String },
    OneOf { column: String, values: Vec<String> },
    Year { column: String, year: i32 },
    YearIn { column: String, years: Vec<i32> },
    Month { column: String, month: u32 },
    Day { column: String, day: u32 },
}

impl Condition {
    fn column(&self) -> &str {
        match self {
            Condition::Equals { column, .. }
            | Condition::OneOf { column, .. }
            | Condition::Year { column, .. }
            | Condition::YearIn { column, .. }
            | Condition::Month { column, .. }
            | Condition::Day { column, .. } => column,
        }
    }

    fn accepts(&self, cell: &Value) -> bool {
        match self {
            Condition::Equals { value, .. } => cell.matches(value),
            Condition::OneOf { values, .. } => values.iter().any(|v| cell.matches(v)),
            Condition::Year { year, .. } => cell.year() == Some(*year),
            Condition::YearIn { years, .. } => cell.year().is_some_and(|y| years.contains(&y)),
            Condition::Month { month, .. } => cell.as_date().is_some_and(|d| d.month() == *month),
            Condition::Day { day, .. } => cell.as_date().is_some_and(|d| d.day() == *day),
        }
    }
}

/// Which value columns a filtered table keeps.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variables {
    /// Every numeric column outside the leading (identifier/status/time) set.
    #[default]
    AllNumeric,
    /// Exactly these columns, in this order.
    Only(Vec<String>),
}

impl Variables {
    /// `None` or an empty list means every numeric column.
    pub fn from_selection(selection: Option<&[String]>) -> Self {
        match selection {
            Some(vars) if !vars.is_empty() => Variables::Only(vars.to_vec()),
            _ => Variables::AllNumeric,
        }
    }
}

/// A set of ANDed row conditions plus the output column layout.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    conditions: Vec<Condition>,
    leading: Vec<String>,
    variables: Variables,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`, when a value is selected.
    pub fn equals(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.conditions.push(Condition::Equals {
                column: column.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    /// Keep rows whose `column` is one of `values`; an empty list is no restriction.
    pub fn one_of(mut self, column: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.conditions.push(Condition::OneOf {
                column: column.to_string(),
                values: values.to_vec(),
            });
        }
        self
    }

    pub fn year(mut self, column: &str, year: Option<i32>) -> Self {
        if let Some(year) = year {
            self.conditions.push(Condition::Year {
                column: column.to_string(),
                year,
            });
        }
        self
    }

    /// Keep rows in any of `years`; an empty list is no restriction.
    pub fn years(mut self, column: &str, years: &[i32]) -> Self {
        if !years.is_empty() {
            self.conditions.push(Condition::YearIn {
                column: column.to_string(),
                years: years.to_vec(),
            });
        }
        self
    }

    pub fn month(mut self, column: &str, month: Option<u32>) -> Self {
        if let Some(month) = month {
            self.conditions.push(Condition::Month {
                column: column.to_string(),
                month,
            });
        }
        self
    }

    pub fn day(mut self, column: &str, day: Option<u32>) -> Self {
        if let Some(day) = day {
            self.conditions.push(Condition::Day {
                column: column.to_string(),
                day,
            });
        }
        self
    }

    /// Columns placed first in the output, when the table has them.
    pub fn leading(mut self, columns: &[&str]) -> Self {
        self.leading = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Apply to `table`, producing a new table.
    ///
    /// Unknown variables are a lookup error even when no row matches. Zero
    /// matching rows is an empty table, not an error.
    pub fn apply(&self, table: &Table) -> Result<Table, QueryError> {
        let leading: Vec<String> = self
            .leading
            .iter()
            .filter(|c| table.has_column(c))
            .cloned()
            .collect();

        let values = match &self.variables {
            Variables::AllNumeric => {
                let exclude: Vec<&str> = leading.iter().map(String::as_str).collect();
                table.numeric_columns(&exclude)
            }
            Variables::Only(vars) => {
                for var in vars {
                    table.require_column(var)?;
                }
                vars.iter()
                    .filter(|v| !leading.contains(*v))
                    .cloned()
                    .collect()
            }
        };

        let checks = self
            .conditions
            .iter()
            .map(|c| table.require_column(c.column()).map(|idx| (idx, c)))
            .collect::<Result<Vec<_>, _>>()?;

        let filtered = table.filter_rows(|row| checks.iter().all(|(idx, c)| c.accepts(&row[*idx])));

        let mut output = leading;
        output.extend(values);
        filtered.select(&output)
    }
}
