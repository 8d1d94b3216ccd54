#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no worksheets: {0}")]
    NoSheets(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Table not found in database: {0}")]
    TableNotFound(String),

    #[error("Missing header row")]
    MissingHeader,
}
