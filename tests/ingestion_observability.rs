use std::sync::{Arc, Mutex};

use checkin_reconcile::ingestion::{
    load_table, IngestionContext, IngestionFormat, IngestionObserver, IngestionOptions,
    IngestionSeverity, IngestionStats,
};
use checkin_reconcile::ReconcileError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &ReconcileError,
    ) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &ReconcileError,
    ) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options(obs: &Arc<RecordingObserver>) -> IngestionOptions {
    IngestionOptions {
        format: Some(IngestionFormat::Csv),
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn missing_file_is_a_critical_alert() {
    let obs = Arc::new(RecordingObserver::default());

    let err = load_table("tests/fixtures/does_not_exist.csv", &options(&obs)).unwrap_err();
    assert!(matches!(err, ReconcileError::FileNotFound { .. }));

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
}

#[test]
fn malformed_csv_fails_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "UUID,Uni_ID\nA1\n").unwrap();

    let _ = load_table(&path, &options(&obs)).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn success_reports_row_and_column_counts() {
    let obs = Arc::new(RecordingObserver::default());

    load_table("tests/fixtures/raw_scans.csv", &options(&obs)).unwrap();

    assert_eq!(
        obs.successes.lock().unwrap().clone(),
        vec![IngestionStats { rows: 4, columns: 3 }]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}
