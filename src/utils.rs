//! Shared helpers for header normalization and time label parsing
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

// World Bank year headers: "2011" or "2011 [YR2011]"
static YEAR_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(?:\s*\[YR\d{4}\])?$").ok());

/// Normalize a raw column header to snake_case.
///
/// Non-breaking spaces and BOMs count as whitespace, runs of whitespace
/// collapse, and spaces, hyphens, dots and slashes all become underscores.
///
/// # Examples
///
/// ```
/// use price_indices::utils::normalize_header;
///
/// assert_eq!(normalize_header("Reference area"), "reference_area");
/// assert_eq!(normalize_header("Reference-area"), "reference_area");
/// assert_eq!(normalize_header("  Country\u{a0} Name "), "country_name");
/// assert_eq!(normalize_header("USD_raw"), "usd_raw");
/// ```
pub fn normalize_header(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '\u{a0}' | '\u{2007}' | '\u{202f}' => ' ',
            '\u{feff}' => ' ',
            '-' | '.' | '/' => ' ',
            c => c,
        })
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalize a header, then map known irregular spellings to their canonical
/// name. `aliases` holds `(normalized variant, canonical)` pairs.
pub fn canonical_header(raw: &str, aliases: &[(&str, &str)]) -> String {
    let normalized = normalize_header(raw);
    aliases
        .iter()
        .find(|(variant, _)| *variant == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Extract the year from a World Bank style year header.
///
/// Accepts `"1960"` and `"1960 [YR1960]"`; anything else is not a year column.
///
/// # Examples
///
/// ```
/// use price_indices::utils::parse_year_label;
///
/// assert_eq!(parse_year_label("1960 [YR1960]"), Some(1960));
/// assert_eq!(parse_year_label("2011"), Some(2011));
/// assert_eq!(parse_year_label("Country Name"), None);
/// ```
pub fn parse_year_label(raw: &str) -> Option<i32> {
    let caps = YEAR_LABEL.as_ref()?.captures(raw.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

/// Parse a date header or cell written as text.
///
/// Monthly labels (`"2020-01"`) resolve to the first day of the month.
pub fn parse_date_label(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%d/%m/%Y",
    ];
    for format in FORMATS {
        if let Some(date) = parse_with(trimmed, format) {
            return Some(date);
        }
    }
    // Year-month periods
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok()
}

fn parse_with(raw: &str, format: &str) -> Option<NaiveDate> {
    if format.contains("%H") {
        chrono::NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(|dt| dt.date())
    } else {
        NaiveDate::parse_from_str(raw, format).ok()
    }
}

/// Turn a selection value into something safe inside a file name.
pub fn file_name_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_collapses_whitespace() {
        assert_eq!(normalize_header("Series   Name"), "series_name");
        assert_eq!(normalize_header("Unit multiplier "), "unit_multiplier");
    }

    #[test]
    fn test_normalize_header_strips_bom_and_nbsp() {
        assert_eq!(normalize_header("\u{feff}iso_a3"), "iso_a3");
        assert_eq!(normalize_header("Reference\u{a0}area"), "reference_area");
    }

    #[test]
    fn test_normalize_header_mixed_separators() {
        assert_eq!(normalize_header("Time-series key"), "time_series_key");
        assert_eq!(normalize_header("GDP_dollar"), "gdp_dollar");
        assert_eq!(normalize_header("a - b"), "a_b");
    }

    #[test]
    fn test_canonical_header_applies_alias() {
        let aliases = [("name", "city"), ("city_name", "city")];
        assert_eq!(canonical_header("Name", &aliases), "city");
        assert_eq!(canonical_header("City Name", &aliases), "city");
        assert_eq!(canonical_header("salary", &aliases), "salary");
    }

    #[test]
    fn test_parse_year_label_rejects_non_years() {
        assert_eq!(parse_year_label("1960 [YR1960]"), Some(1960));
        assert_eq!(parse_year_label(" 1999 "), Some(1999));
        assert_eq!(parse_year_label("19601"), None);
        assert_eq!(parse_year_label("2020-01-01"), None);
        assert_eq!(parse_year_label("Series Code"), None);
    }

    #[test]
    fn test_parse_date_label_formats() {
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1);
        assert_eq!(parse_date_label("2020-01-01"), jan);
        assert_eq!(parse_date_label("2020-01-01 00:00:00"), jan);
        assert_eq!(parse_date_label("2020-01-01T00:00:00"), jan);
        assert_eq!(parse_date_label("2020-01"), jan);
        assert_eq!(parse_date_label("01/01/2020"), jan);
        assert_eq!(parse_date_label("Reference area"), None);
        assert_eq!(parse_date_label("2020"), None);
    }

    #[test]
    fn test_file_name_component() {
        assert_eq!(file_name_component("Consumer price index"), "Consumer_price_index");
        assert_eq!(file_name_component("a/b"), "a_b");
    }
}
