use alphago_core::SyncStatus;
use serde::Serialize;

use crate::commands::common::{format_pending_lines, format_timestamp, Session};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusItem<'a> {
    profile: &'a str,
    api_base_url: Option<String>,
    #[serde(flatten)]
    status: &'a SyncStatus,
}

pub async fn run_status(
    as_json: bool,
    acknowledge: bool,
    session: &Session,
) -> Result<(), CliError> {
    let status = session.engine.sync_status().await;

    if as_json {
        let item = StatusItem {
            profile: &session.profile_name,
            api_base_url: session.profile.api_base_url(),
            status: &status,
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        for line in format_status_lines(&session.profile_name, &status) {
            println!("{line}");
        }
    }

    if acknowledge {
        let dropped = session.engine.dropped_actions().await;
        if !as_json {
            for line in format_pending_lines(&dropped) {
                println!("  {line}");
            }
        }
        let count = session.engine.acknowledge_dropped().await?;
        tracing::info!("Acknowledged {} abandoned action(s)", count);
    }
    Ok(())
}

pub fn format_status_lines(profile_name: &str, status: &SyncStatus) -> Vec<String> {
    let last_sync = status
        .last_drain_at
        .map_or_else(|| "never".to_string(), format_timestamp);

    let mut lines = vec![
        format!("Profile:   {profile_name}"),
        format!("State:     {}", status.state),
        format!("Online:    {}", if status.online { "yes" } else { "no" }),
        format!("Pending:   {}", status.pending),
        format!("Last sync: {last_sync}"),
    ];
    if status.dropped > 0 {
        lines.push(format!(
            "Abandoned: {} action(s); run `alphago status --acknowledge` to review and clear",
            status.dropped
        ));
    }
    lines
}
