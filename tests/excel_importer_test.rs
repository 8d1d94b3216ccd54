// Reading real workbooks: date-typed cells and headers, numeric year
// headers, unnamed index columns, and workbooks preferred over CSV.

mod common;

use chrono::NaiveDate;
use common::{sample_file, DataDir};
use price_indices::importers::ExcelImporter;
use price_indices::sources::big_mac;
use price_indices::sources::bis::{self, BisSelection};
use price_indices::sources::penn;
use price_indices::sources::wb_cpi;
use price_indices::sources::OptionScope;
use price_indices::table::Value;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_read_first_sheet_drops_unnamed_columns() {
    let importer = ExcelImporter::new(sample_file("Big Mac Index.xlsx"));
    let sheet = importer.read_first_sheet().unwrap();

    assert_eq!(
        sheet.headers,
        vec!["iso_a3", "currency_code", "name", "date", "local_price", "dollar_ex"]
    );
    assert_eq!(sheet.rows.len(), 3);
    assert_eq!(sheet.rows[0][0], Value::Text("USA".to_string()));
    assert_eq!(sheet.rows[0][3], Value::Date(date(2023, 7, 1)));
    assert_eq!(sheet.rows[2][4], Value::Number(7.1));
}

#[test]
fn test_date_headers_render_as_iso_dates() {
    let importer = ExcelImporter::new(sample_file("BIS REER 2020.xlsx"));
    let sheet = importer.read_first_sheet().unwrap();

    assert_eq!(&sheet.headers[6..], &["2020-01-01", "2020-02-01"]);
}

#[tokio::test]
async fn test_big_mac_workbook() {
    let data = DataDir::new();
    data.copy_sample("Big Mac Index.xlsx", "big_mac/Big Mac Index.xlsx");
    let repository = data.repository();
    let table = repository.big_mac().await.unwrap();

    assert_eq!(table.height(), 3);
    assert_eq!(
        big_mac::year_options(table, &OptionScope::default()).unwrap(),
        vec![2023, 2024]
    );
    assert_eq!(big_mac::variable_options(table), vec!["local_price", "dollar_ex"]);
}

#[tokio::test]
async fn test_bis_workbook_is_preferred_over_csv() {
    let data = DataDir::new();
    data.copy_sample("BIS REER 2020.xlsx", "bis/BIS REER 2020.xlsx");
    data.write(
        "bis/BIS REER 2020.csv",
        "Timeseries key,Reference area,2020-01-01\nM.R.B.FR,France,1.0\n",
    );
    let repository = data.repository();
    let table = repository.bis_reer().await.unwrap();

    let france = bis::filter(
        table,
        &BisSelection {
            reference_area: Some("France".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let date_idx = france.columns().iter().position(|c| c == "date").unwrap();
    let value_idx = france.columns().iter().position(|c| c == "value").unwrap();
    let observed: Vec<(Value, Value)> = france
        .rows()
        .iter()
        .map(|r| (r[date_idx].clone(), r[value_idx].clone()))
        .collect();

    assert_eq!(
        observed,
        vec![
            (Value::Date(date(2020, 1, 1)), Value::Number(99.2)),
            (Value::Date(date(2020, 2, 1)), Value::Number(100.4)),
        ]
    );
    assert_eq!(bis::year_options(table).unwrap(), vec![2020]);
}

#[tokio::test]
async fn test_penn_workbook_years_become_integers() {
    let data = DataDir::new();
    data.copy_sample("Penn World Table.xlsx", "penn_world_table/Penn World Table.xlsx");
    let repository = data.repository();
    let table = repository.penn().await.unwrap();

    assert_eq!(table.rows()[0][3], Value::Integer(2018));
    assert_eq!(penn::year_options(table).unwrap(), vec![2018, 2019]);
    assert_eq!(penn::country_options(table).unwrap(), vec!["Chile", "France"]);
}

#[tokio::test]
async fn test_cpi_workbook_with_numeric_year_header() {
    let data = DataDir::new();
    data.copy_sample(
        "World Bank CPI (1960-1961).xlsx",
        "world_bank/World Bank CPI (1960-1961).xlsx",
    );
    let repository = data.repository();
    let table = repository.wb_cpi().await.unwrap();

    // Footer line skipped
    assert_eq!(table.height(), 2);
    assert_eq!(wb_cpi::year_options(table).unwrap(), vec![1960, 1961]);
    assert_eq!(table.rows()[0][5], Value::Number(10.2));
    assert_eq!(table.rows()[1][5], Value::Null);
}
