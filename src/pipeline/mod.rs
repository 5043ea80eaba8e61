//! End-to-end run: load both tables, reconcile them in memory, write one report per group.
//!
//! [`reconcile`] is the pure composition of [`crate::processing`]; [`run`] adds file I/O around
//! it. Nothing is created on disk until reconciliation has succeeded, so a terminal error
//! (missing identifier or grouping column, unreadable input) leaves the output directory
//! untouched.

pub mod observer;

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ReconcileResult, TableRole};
use crate::export::write_csv_to_path;
use crate::ingestion::{load_table, IngestionOptions};
use crate::processing::{left_join, normalize, partition, JoinOutcome, Partition, ReconcileConfig};
use crate::types::DataSet;

pub use observer::{JsonLinesObserver, LogPipelineObserver, PipelineEvent, PipelineObserver};

/// Where a run reads from and writes to.
#[derive(Clone)]
pub struct PipelineOptions {
    pub registrations_path: PathBuf,
    pub scans_path: PathBuf,
    /// Created (with parents) if absent, once reconciliation has succeeded.
    pub output_dir: PathBuf,
    pub ingestion: IngestionOptions,
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl PipelineOptions {
    pub fn new(
        registrations_path: impl Into<PathBuf>,
        scans_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registrations_path: registrations_path.into(),
            scans_path: scans_path.into(),
            output_dir: output_dir.into(),
            ingestion: IngestionOptions::default(),
            observer: None,
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("registrations_path", &self.registrations_path)
            .field("scans_path", &self.scans_path)
            .field("output_dir", &self.output_dir)
            .field("ingestion", &self.ingestion)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

/// In-memory result of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Registration header the identifier was found under.
    pub identifier_source: String,
    pub join: JoinOutcome,
    /// `None` when the join produced no rows.
    pub partition: Option<Partition>,
}

/// Normalize, join and partition two loaded tables.
pub fn reconcile(
    registrations: DataSet,
    scans: DataSet,
    cfg: &ReconcileConfig,
) -> ReconcileResult<Reconciliation> {
    let inputs = normalize::normalize(registrations, scans, cfg)?;
    let join = left_join(&inputs.scans, &inputs.registrations, cfg)?;
    // An empty join ends the run cleanly, before the grouping column is looked up.
    let partition = if join.dataset.is_empty() {
        None
    } else {
        Some(partition(&join.dataset, cfg)?)
    };
    Ok(Reconciliation {
        identifier_source: inputs.identifier_source,
        join,
        partition,
    })
}

/// One written report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub group: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub registration_rows: usize,
    pub scan_rows: usize,
    pub joined_rows: usize,
    pub unmatched: usize,
    pub fan_out_rows: usize,
    /// Report columns; empty when nothing was exported.
    pub columns: Vec<String>,
    pub reports: Vec<ReportSummary>,
}

impl RunSummary {
    /// Rows written across all reports.
    pub fn total_rows(&self) -> usize {
        self.reports.iter().map(|r| r.rows).sum()
    }
}

/// Load, reconcile and write reports.
///
/// Identifier columns (every alias and the canonical name) always load as text, so type
/// inference can never turn `00420042` into `420042`. Reports are written in grouping-value
/// order as `<output_dir>/<file_name>`, replacing files of the same name. Returns the first
/// terminal error unchanged.
pub fn run(options: &PipelineOptions, cfg: &ReconcileConfig) -> ReconcileResult<RunSummary> {
    let mut ingestion = options.ingestion.clone();
    ingestion.text_columns.extend(cfg.identifier_aliases.iter().cloned());
    ingestion.text_columns.push(cfg.identifier_column.clone());

    let registrations = load_input(options, &ingestion, TableRole::Registrations)?;
    let scans = load_input(options, &ingestion, TableRole::Scans)?;
    let registration_rows = registrations.row_count();
    let scan_rows = scans.row_count();

    let rec = reconcile(registrations, scans, cfg)?;
    options.emit(PipelineEvent::IdentifierResolved {
        source: rec.identifier_source.clone(),
        canonical: cfg.identifier_column.clone(),
    });
    options.emit(PipelineEvent::Joined {
        rows: rec.join.dataset.row_count(),
        scan_rows: rec.join.scan_rows,
        fan_out_rows: rec.join.fan_out_rows,
    });
    if rec.join.unmatched > 0 {
        options.emit(PipelineEvent::UnmatchedScans {
            count: rec.join.unmatched,
            probe_column: rec.join.probe_column.clone(),
        });
    }

    let mut summary = RunSummary {
        output_dir: options.output_dir.clone(),
        registration_rows,
        scan_rows,
        joined_rows: rec.join.dataset.row_count(),
        unmatched: rec.join.unmatched,
        fan_out_rows: rec.join.fan_out_rows,
        columns: Vec::new(),
        reports: Vec::new(),
    };

    let Some(partition) = rec.partition else {
        options.emit(PipelineEvent::NoRowsAfterJoin);
        return Ok(summary);
    };

    options.emit(PipelineEvent::ColumnsSelected {
        strategy: partition.selection.strategy,
        columns: partition.selection.columns.clone(),
    });
    summary.columns = partition.selection.columns.clone();

    fs::create_dir_all(&options.output_dir)?;
    for report in &partition.reports {
        if let Some(natural) = &report.collided_with {
            options.emit(PipelineEvent::FilenameCollision {
                group: report.group.clone(),
                natural: natural.clone(),
                file_name: report.file_name.clone(),
            });
        }
        let path = options.output_dir.join(&report.file_name);
        write_csv_to_path(&report.dataset, &path, Some(&partition.selection.columns))?;
        options.emit(PipelineEvent::ReportWritten {
            group: report.group.clone(),
            path: path.clone(),
            rows: report.row_count(),
        });
        summary.reports.push(ReportSummary {
            group: report.group.clone(),
            path,
            rows: report.row_count(),
        });
    }

    options.emit(PipelineEvent::Finished {
        groups: summary.reports.len(),
        rows: summary.total_rows(),
        output_dir: options.output_dir.clone(),
    });
    Ok(summary)
}

fn load_input(
    options: &PipelineOptions,
    ingestion: &IngestionOptions,
    role: TableRole,
) -> ReconcileResult<DataSet> {
    let path = match role {
        TableRole::Registrations => &options.registrations_path,
        TableRole::Scans => &options.scans_path,
    };
    let table = load_table(path, ingestion)?;
    options.emit(PipelineEvent::InputLoaded {
        role,
        path: path.clone(),
        rows: table.row_count(),
        columns: table.schema.fields.len(),
    });
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use crate::error::ReconcileError;
    use crate::processing::ReconcileConfig;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn table(columns: &[&str], rows: &[&[&str]]) -> DataSet {
        DataSet::new(
            Schema::new(columns.iter().map(|c| Field::new(*c, DataType::Utf8)).collect()),
            rows.iter()
                .map(|r| r.iter().map(|v| Value::Utf8(v.to_string())).collect())
                .collect(),
        )
    }

    #[test]
    fn empty_join_skips_partitioning() {
        let cfg = ReconcileConfig::default();
        let regs = table(&["ticket_id", "Name"], &[&["A1", "Jane"]]);
        // No grouping column either: an empty join must not trip over it.
        let scans = table(&["UUID"], &[]);

        let rec = reconcile(regs, scans, &cfg).unwrap();
        assert!(rec.join.dataset.is_empty());
        assert!(rec.partition.is_none());
    }

    #[test]
    fn missing_grouping_column_surfaces_after_a_non_empty_join() {
        let cfg = ReconcileConfig::default();
        let regs = table(&["ticket_id", "Name"], &[&["A1", "Jane"]]);
        let scans = table(&["UUID"], &[&["A1"]]);

        let err = reconcile(regs, scans, &cfg).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingGroupingColumn { .. }));
    }

    #[test]
    fn identifier_source_is_reported() {
        let cfg = ReconcileConfig::default();
        let regs = table(&[" TicketID ", "Name"], &[&["A1", "Jane"]]);
        let scans = table(&["UUID", "Uni_ID"], &[&["a1", "MIT"]]);

        let rec = reconcile(regs, scans, &cfg).unwrap();
        assert_eq!(rec.identifier_source, "TicketID");
        let partition = rec.partition.unwrap();
        assert_eq!(partition.reports[0].dataset.rows, vec![vec![Value::Utf8("Jane".into())]]);
    }
}
