//! `checkin-reconcile` turns an event's registration roster and its check-in scan log into one
//! leads report per organization.
//!
//! A run has three stages, each usable on its own:
//!
//! 1. **Load** ([`ingestion::load_table`]): read a delimited file (or, with the `excel` feature, a
//!    workbook sheet) into an in-memory [`types::DataSet`].
//! 2. **Reconcile** ([`processing`]): normalize headers and identifiers, left-join scans against
//!    registrations, and partition the result by organization into de-duplicated reports.
//! 3. **Export** ([`export::write_csv_to_path`]): write each report atomically.
//!
//! [`pipeline::run`] strings the three together and reports progress to a
//! [`pipeline::PipelineObserver`].
//!
//! ## Input shape
//!
//! - **Registrations**: one row per registrant. The identifier column may be called `ticket_id`,
//!   `uuid`, `ticketid` or `id` (any case, surrounding whitespace ignored).
//! - **Scans**: one row per check-in, with an identifier column named `UUID` (any case) and the
//!   organization in `Uni_ID`.
//!
//! Identifiers are compared trimmed and uppercased. Every scan is kept: scans without a
//! registration show up with empty registration columns and are counted as unmatched.
//!
//! ## Quick example
//!
//! ```no_run
//! use checkin_reconcile::pipeline::{run, LogPipelineObserver, PipelineOptions};
//! use checkin_reconcile::processing::ReconcileConfig;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), checkin_reconcile::ReconcileError> {
//! let mut options = PipelineOptions::new("registrations.csv", "raw_scans.csv", "reports");
//! options.observer = Some(Arc::new(LogPipelineObserver));
//!
//! let summary = run(&options, &ReconcileConfig::default())?;
//! for report in &summary.reports {
//!     println!("{} -> {} ({} rows)", report.group, report.path.display(), report.rows);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: table loading, format detection, load observers
//! - [`types`]: schema and in-memory dataset types
//! - [`processing`]: normalization, join, partitioning, and [`processing::ReconcileConfig`]
//! - [`export`]: CSV report writing
//! - [`pipeline`]: end-to-end runs and pipeline events
//! - [`error`]: the crate-wide error type

pub mod error;
pub mod export;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{ReconcileError, ReconcileResult, TableRole};
