use alphago_core::{DrainOutcome, DrainReport};

use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_sync(as_json: bool, session: &Session) -> Result<(), CliError> {
    session.require_orders()?;

    let report = match session.engine.drain_queue().await? {
        DrainOutcome::Offline => return Err(CliError::Offline),
        DrainOutcome::AlreadyRunning => {
            println!("A sync is already running");
            return Ok(());
        }
        DrainOutcome::Completed(report) => report,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summarize_report(&report));
    }
    Ok(())
}

pub fn summarize_report(report: &DrainReport) -> String {
    if report.applied == 0 && report.retried == 0 && report.dropped.is_empty() {
        return "Nothing to sync".to_string();
    }

    let mut summary = format!(
        "Sync completed: {} applied, {} will be retried",
        report.applied, report.retried
    );
    if !report.dropped.is_empty() {
        summary.push_str(&format!(", {} abandoned", report.dropped.len()));
    }
    summary
}
