//! Loading entrypoints and implementations.
//!
//! Most callers should use [`load_table`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - keeps cell text as written, or (opt-in) infers one [`crate::types::DataType`] per column
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under [`csv`] and (feature `excel`) `excel`.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod unified;

pub use observability::{
    IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, LogObserver,
};
pub use unified::{
    load_table, ExcelSheetSelection, IngestionFormat, IngestionOptions, DEFAULT_NULL_TOKENS,
};
