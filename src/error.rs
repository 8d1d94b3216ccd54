use std::path::PathBuf;

use crate::catalog::Source;
use crate::importers::ImportError;

/// Failures while turning raw files into a normalized table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{dataset} is unavailable (looked for {}): {detail}", display_paths(.paths))]
    Unavailable {
        dataset: Source,
        paths: Vec<PathBuf>,
        detail: String,
    },

    #[error("{dataset}: expected column '{column}' is missing")]
    MissingColumn { dataset: Source, column: String },

    #[error("{dataset}: column '{column}' is neither metadata nor a recognizable date/year label")]
    InvalidTimeColumn { dataset: Source, column: String },

    #[error("{dataset}: cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        dataset: Source,
        column: String,
        value: String,
    },

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

/// Failures while answering a selection against a loaded table.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown column '{column}' (available: {})", .available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Unknown dimension '{dimension}' for {dataset} (expected one of: {})", .expected.join(", "))]
    UnknownDimension {
        dataset: Source,
        dimension: String,
        expected: Vec<&'static str>,
    },

    #[error("Provide exactly one of iso / currency / name (got {0})")]
    AmbiguousIdentity(usize),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
