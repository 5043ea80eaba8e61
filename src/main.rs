use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use checkin_reconcile::ingestion::LogObserver;
use checkin_reconcile::pipeline::{run, LogPipelineObserver, PipelineOptions};
use checkin_reconcile::processing::ReconcileConfig;
use clap::Parser;

/// Join a registration roster with check-in scans and write one leads report per organization.
#[derive(Parser, Debug)]
#[command(name = "checkin-reconcile")]
#[command(version)]
struct Cli {
    /// Registration roster (CSV/TSV, or a workbook with the `excel` feature)
    #[arg(default_value = "registrations.csv")]
    registrations: PathBuf,

    /// Check-in scan log
    #[arg(default_value = "raw_scans.csv")]
    scans: PathBuf,

    /// Directory the reports are written to (created if missing)
    #[arg(default_value = "reports")]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut options = PipelineOptions::new(cli.registrations, cli.scans, cli.output_dir);
    options.ingestion.observer = Some(Arc::new(LogObserver));
    options.observer = Some(Arc::new(LogPipelineObserver));

    match run(&options, &ReconcileConfig::default()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
