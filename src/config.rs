use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the raw data layout (`<data_dir>/<source>/...`).
    pub data_dir: PathBuf,
    /// Table holding the Numbeo rows inside `numbeo.db`.
    pub numbeo_table: String,
    /// Where CSV exports are written.
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            numbeo_table: "cities".to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            numbeo_table: env::var("NUMBEO_TABLE").unwrap_or(defaults.numbeo_table),
            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        }
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            ..Config::default()
        }
    }

    fn source_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn big_mac_workbook(&self) -> PathBuf {
        self.source_dir("big_mac").join("Big Mac Index.xlsx")
    }

    pub fn bis_dir(&self) -> PathBuf {
        self.source_dir("bis")
    }

    pub fn numbeo_db(&self) -> PathBuf {
        self.source_dir("numbeo").join("numbeo.db")
    }

    pub fn numbeo_csv(&self) -> PathBuf {
        self.source_dir("numbeo").join("numbeo.csv")
    }

    pub fn penn_workbook(&self) -> PathBuf {
        self.source_dir("penn_world_table").join("Penn World Table.xlsx")
    }

    pub fn world_bank_dir(&self) -> PathBuf {
        self.source_dir("world_bank")
    }

    pub fn icp_workbook(&self) -> PathBuf {
        self.world_bank_dir().join("World Bank ICP.xlsx")
    }
}

/// The flat-file fallback that sits next to a workbook.
pub fn csv_sibling(path: &Path) -> PathBuf {
    path.with_extension("csv")
}
