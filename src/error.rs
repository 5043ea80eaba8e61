use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type used across loading, reconciliation and export.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Which input table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    /// The registration roster (one row per registrant).
    Registrations,
    /// The check-in scan log (one row per scan event).
    Scans,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registrations => f.write_str("registrations"),
            Self::Scans => f.write_str("scans"),
        }
    }
}

/// Error type returned by every fallible operation in this crate.
///
/// `MissingIdentifierColumn` and `MissingGroupingColumn` are the two input-shape failures that end
/// a run; both carry the column names that *were* available so the input file can be fixed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Underlying I/O error (e.g. permission denied, disk full).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The input path does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[cfg(feature = "excel")]
    /// Excel ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The content is not valid delimited text (ragged rows, broken quoting, ...).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Structural problem that is not one of the named column failures below.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// No identifier column could be located in one of the input tables.
    #[error(
        "no identifier column in {table} (accepted: {}); available columns: {available:?}",
        .accepted.join(", ")
    )]
    MissingIdentifierColumn {
        table: TableRole,
        accepted: Vec<String>,
        available: Vec<String>,
    },

    /// The joined table has no grouping-key column.
    #[error("grouping column '{column}' not found; available columns: {available:?}")]
    MissingGroupingColumn { column: String, available: Vec<String> },
}
