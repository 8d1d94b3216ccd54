// Readers that turn raw source files into header + rows sheets

pub mod csv_importer;
pub mod error;
pub mod excel_importer;
pub mod sqlite_importer;

// Re-export commonly used items
pub use csv_importer::CsvImporter;
pub use error::ImportError;
pub use excel_importer::ExcelImporter;
pub use sqlite_importer::SqliteImporter;
