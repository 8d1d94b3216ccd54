//! Loads each source at most once per process and hands out shared tables.
//!
//! Every source has a primary store (workbooks or the SQLite database) and a
//! flat CSV fallback. The fallback is tried once when the primary is missing
//! or unreadable. Content that reads fine but does not match the expected
//! schema is an error straight away.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Source;
use crate::config::{csv_sibling, Config};
use crate::error::SourceError;
use crate::importers::{CsvImporter, ExcelImporter, ImportError, SqliteImporter};
use crate::sources::{big_mac, bis, numbeo, penn, wb_cpi, wb_icp};
use crate::table::{RawSheet, Table};

pub struct Repository {
    config: Config,
    big_mac: OnceCell<Table>,
    bis_reer: OnceCell<Table>,
    numbeo: OnceCell<Table>,
    penn: OnceCell<Table>,
    wb_cpi: OnceCell<Table>,
    wb_icp: OnceCell<Table>,
}

impl Repository {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            big_mac: OnceCell::new(),
            bis_reer: OnceCell::new(),
            numbeo: OnceCell::new(),
            penn: OnceCell::new(),
            wb_cpi: OnceCell::new(),
            wb_icp: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn cell(&self, source: Source) -> &OnceCell<Table> {
        match source {
            Source::BigMac => &self.big_mac,
            Source::BisReer => &self.bis_reer,
            Source::Numbeo => &self.numbeo,
            Source::Penn => &self.penn,
            Source::WbCpi => &self.wb_cpi,
            Source::WbIcp => &self.wb_icp,
        }
    }

    /// Whether `source` has already been loaded by this repository.
    pub fn is_loaded(&self, source: Source) -> bool {
        self.cell(source).initialized()
    }

    /// The normalized table for `source`, loading it on first use.
    pub async fn table(&self, source: Source) -> Result<&Table, SourceError> {
        self.cell(source)
            .get_or_try_init(|| self.load(source))
            .await
    }

    pub async fn big_mac(&self) -> Result<&Table, SourceError> {
        self.table(Source::BigMac).await
    }

    pub async fn bis_reer(&self) -> Result<&Table, SourceError> {
        self.table(Source::BisReer).await
    }

    pub async fn numbeo(&self) -> Result<&Table, SourceError> {
        self.table(Source::Numbeo).await
    }

    pub async fn penn(&self) -> Result<&Table, SourceError> {
        self.table(Source::Penn).await
    }

    pub async fn wb_cpi(&self) -> Result<&Table, SourceError> {
        self.table(Source::WbCpi).await
    }

    pub async fn wb_icp(&self) -> Result<&Table, SourceError> {
        self.table(Source::WbIcp).await
    }

    /// Load every source in turn, reporting row counts or the failure.
    pub async fn preload(&self) -> Vec<(Source, Result<usize, SourceError>)> {
        let mut report = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            let result = self.table(source).await.map(Table::height);
            report.push((source, result));
        }
        report
    }

    #[instrument(skip(self))]
    async fn load(&self, source: Source) -> Result<Table, SourceError> {
        let table = match source {
            Source::BigMac => {
                let sheet = read_workbook_or_csv(source, &self.config.big_mac_workbook())?;
                big_mac::load(sheet)?
            }
            Source::BisReer => {
                let sheets = read_many(source, &self.config.bis_dir(), "*.xlsx", "*.csv")?;
                bis::load(&sheets)?
            }
            Source::Numbeo => {
                let sheet = self.read_numbeo().await?;
                numbeo::load(sheet)?
            }
            Source::Penn => {
                let sheet = read_workbook_or_csv(source, &self.config.penn_workbook())?;
                penn::load(sheet)?
            }
            Source::WbCpi => {
                let sheets = read_many(
                    source,
                    &self.config.world_bank_dir(),
                    "World Bank CPI (*).xlsx",
                    "World Bank CPI (*).csv",
                )?;
                wb_cpi::load(&sheets)?
            }
            Source::WbIcp => {
                let sheet = read_workbook_or_csv(source, &self.config.icp_workbook())?;
                wb_icp::load(sheet)?
            }
        };

        info!(
            "Loaded {}: {} rows x {} columns",
            source,
            table.height(),
            table.width()
        );
        Ok(table)
    }

    async fn read_numbeo(&self) -> Result<RawSheet, SourceError> {
        let db_path = self.config.numbeo_db();
        let csv_path = self.config.numbeo_csv();

        let primary_detail = if db_path.exists() {
            match self.read_numbeo_table(&SqliteImporter::new(&db_path)).await {
                Ok(sheet) => return Ok(sheet),
                Err(e) => {
                    warn!("Numbeo database {} unreadable: {}", db_path.display(), e);
                    e.to_string()
                }
            }
        } else {
            debug!("{} not found, trying {}", db_path.display(), csv_path.display());
            format!("{} not found", db_path.display())
        };

        read_csv_fallback(Source::Numbeo, &db_path, &csv_path, primary_detail)
    }

    /// Read the configured table, or the first table in the database when
    /// the configured one is absent.
    async fn read_numbeo_table(&self, importer: &SqliteImporter) -> Result<RawSheet, ImportError> {
        let wanted = self.config.numbeo_table.as_str();
        let tables = importer.list_tables().await?;
        let table = if tables.iter().any(|t| t == wanted) {
            wanted
        } else {
            let first = tables
                .first()
                .ok_or_else(|| ImportError::TableNotFound(wanted.to_string()))?;
            warn!(
                "Table {} not in {}, using first table {}",
                wanted,
                importer.path().display(),
                first
            );
            first.as_str()
        };
        importer.read_table(table).await
    }
}

/// Read the first sheet of `workbook`, or its sibling CSV when the workbook
/// is missing or cannot be opened.
fn read_workbook_or_csv(source: Source, workbook: &Path) -> Result<RawSheet, SourceError> {
    let csv_path = csv_sibling(workbook);

    let primary_detail = if workbook.exists() {
        match ExcelImporter::new(workbook).read_first_sheet() {
            Ok(sheet) => return Ok(sheet),
            Err(e) => {
                warn!("{}: workbook {} unreadable: {}", source, workbook.display(), e);
                e.to_string()
            }
        }
    } else {
        debug!("{} not found, trying {}", workbook.display(), csv_path.display());
        format!("{} not found", workbook.display())
    };

    read_csv_fallback(source, workbook, &csv_path, primary_detail)
}

fn read_csv_fallback(
    source: Source,
    primary: &Path,
    csv_path: &Path,
    primary_detail: String,
) -> Result<RawSheet, SourceError> {
    let unavailable = |detail: String| SourceError::Unavailable {
        dataset: source,
        paths: vec![primary.to_path_buf(), csv_path.to_path_buf()],
        detail,
    };

    if !csv_path.exists() {
        return Err(unavailable(format!(
            "{primary_detail}; {} not found",
            csv_path.display()
        )));
    }

    info!("{}: reading fallback {}", source, csv_path.display());
    CsvImporter::new(csv_path)
        .read()
        .map_err(|e| unavailable(format!("{primary_detail}; {e}")))
}

/// Files in `dir` matching `pattern`, sorted by name.
fn matching_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let mut files: Vec<PathBuf> = match glob::glob(&full) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            warn!("Invalid file pattern {}: {}", full, e);
            Vec::new()
        }
    };
    files.sort();
    files
}

/// Read every workbook matching `primary` in sorted order; if there are none
/// or any of them fails, read every CSV matching `fallback` instead.
fn read_many(
    source: Source,
    dir: &Path,
    primary: &str,
    fallback: &str,
) -> Result<Vec<RawSheet>, SourceError> {
    let workbooks = matching_files(dir, primary);

    let primary_detail = if workbooks.is_empty() {
        format!("no files matching {primary}")
    } else {
        let read: Result<Vec<RawSheet>, ImportError> = workbooks
            .iter()
            .map(|path| ExcelImporter::new(path).read_first_sheet())
            .collect();
        match read {
            Ok(sheets) => {
                debug!("{}: read {} workbooks", source, sheets.len());
                return Ok(sheets);
            }
            Err(e) => {
                warn!("{}: workbook set in {} unreadable: {}", source, dir.display(), e);
                e.to_string()
            }
        }
    };

    let csv_files = matching_files(dir, fallback);
    let unavailable = |detail: String| SourceError::Unavailable {
        dataset: source,
        paths: vec![dir.join(primary), dir.join(fallback)],
        detail,
    };
    if csv_files.is_empty() {
        return Err(unavailable(format!("{primary_detail}; no files matching {fallback}")));
    }

    info!("{}: reading {} fallback CSV files", source, csv_files.len());
    csv_files
        .iter()
        .map(|path| CsvImporter::new(path).read())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| unavailable(format!("{primary_detail}; {e}")))
}
