use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{ReconcileResult, TableRole};
use crate::processing::SelectionStrategy;

/// Progress and diagnostics emitted while a run executes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    InputLoaded {
        role: TableRole,
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
    IdentifierResolved {
        source: String,
        canonical: String,
    },
    Joined {
        rows: usize,
        scan_rows: usize,
        fan_out_rows: usize,
    },
    /// Joined rows whose registration attributes are null.
    UnmatchedScans {
        count: usize,
        probe_column: Option<String>,
    },
    /// The join produced no rows; the run ends without writing anything.
    NoRowsAfterJoin,
    ColumnsSelected {
        strategy: SelectionStrategy,
        columns: Vec<String>,
    },
    /// Two grouping values share a file stem; the later one was written under `file_name`.
    FilenameCollision {
        group: String,
        natural: String,
        file_name: String,
    },
    ReportWritten {
        group: String,
        path: PathBuf,
        rows: usize,
    },
    Finished {
        groups: usize,
        rows: usize,
        output_dir: PathBuf,
    },
}

impl PipelineEvent {
    /// Events that flag something the operator should look at.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::UnmatchedScans { .. } | Self::NoRowsAfterJoin | Self::FilenameCollision { .. }
        )
    }
}

/// Observer hook for pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Human-readable progress lines through the `log` facade (target `reconcile`).
#[derive(Debug, Default)]
pub struct LogPipelineObserver;

impl PipelineObserver for LogPipelineObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::InputLoaded { role, path, rows, columns } => log::info!(
                target: "reconcile",
                "loaded {role}: {rows} rows, {columns} columns from {}",
                path.display()
            ),
            PipelineEvent::IdentifierResolved { source, canonical } => log::info!(
                target: "reconcile",
                "registrations identifier '{source}' -> '{canonical}'"
            ),
            PipelineEvent::Joined { rows, scan_rows, fan_out_rows } => {
                log::info!(target: "reconcile", "merged {scan_rows} scans into {rows} rows");
                if *fan_out_rows > 0 {
                    log::info!(
                        target: "reconcile",
                        "{fan_out_rows} extra rows from registrations sharing an identifier"
                    );
                }
            }
            PipelineEvent::UnmatchedScans { count, probe_column } => match probe_column {
                Some(col) => log::warn!(
                    target: "reconcile",
                    "{count} scanned rows have no registration details ('{col}' is empty)"
                ),
                None => {
                    log::warn!(target: "reconcile", "{count} scanned rows have no registration")
                }
            },
            PipelineEvent::NoRowsAfterJoin => {
                log::warn!(target: "reconcile", "no rows after join; nothing to export")
            }
            PipelineEvent::ColumnsSelected { strategy, columns } => log::info!(
                target: "reconcile",
                "exporting columns ({strategy:?}): {}",
                columns.join(", ")
            ),
            PipelineEvent::FilenameCollision { group, natural, file_name } => log::warn!(
                target: "reconcile",
                "group '{group}' maps to {natural}, already taken; writing {file_name}"
            ),
            PipelineEvent::ReportWritten { path, rows, .. } => {
                log::info!(target: "reconcile", "created {} ({rows} rows)", path.display())
            }
            PipelineEvent::Finished { groups, rows, output_dir } => log::info!(
                target: "reconcile",
                "done: {groups} reports, {rows} rows in {}",
                output_dir.display()
            ),
        }
    }
}

/// Appends one JSON object per event to a file.
#[derive(Debug)]
pub struct JsonLinesObserver {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesObserver {
    /// Open `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> ReconcileResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PipelineObserver for JsonLinesObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!(target: "reconcile", "cannot serialize event {event:?}: {e}");
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            log::warn!(target: "reconcile", "cannot append to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonLinesObserver, PipelineEvent, PipelineObserver};
    use crate::error::TableRole;
    use crate::processing::SelectionStrategy;

    #[test]
    fn events_serialize_with_a_tag() {
        let ev = PipelineEvent::ColumnsSelected {
            strategy: SelectionStrategy::Fallback,
            columns: vec!["Full name".to_string()],
        };
        let v: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "columns_selected");
        assert_eq!(v["strategy"], "fallback");
        assert_eq!(v["columns"][0], "Full name");

        let v = serde_json::to_value(PipelineEvent::NoRowsAfterJoin).unwrap();
        assert_eq!(v, serde_json::json!({"event": "no_rows_after_join"}));
    }

    #[test]
    fn warnings_are_flagged() {
        assert!(PipelineEvent::NoRowsAfterJoin.is_warning());
        assert!(!PipelineEvent::Joined { rows: 1, scan_rows: 1, fan_out_rows: 0 }.is_warning());
    }

    #[test]
    fn json_lines_observer_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let obs = JsonLinesObserver::create(&path).unwrap();

        obs.on_event(&PipelineEvent::InputLoaded {
            role: TableRole::Scans,
            path: "raw_scans.csv".into(),
            rows: 3,
            columns: 2,
        });
        obs.on_event(&PipelineEvent::NoRowsAfterJoin);

        let text = std::fs::read_to_string(obs.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["role"], "scans");
        assert_eq!(first["rows"], 3);
    }
}
