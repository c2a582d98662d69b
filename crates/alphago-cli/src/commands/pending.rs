use crate::commands::common::{
    format_pending_lines, pending_action_to_item, PendingActionItem, Session,
};
use crate::error::CliError;

pub async fn run_pending(as_json: bool, session: &Session) -> Result<(), CliError> {
    let actions = session.engine.pending_actions().await;

    if as_json {
        let json_items = actions
            .iter()
            .map(pending_action_to_item)
            .collect::<Vec<PendingActionItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if actions.is_empty() {
        println!("Nothing waiting to sync.");
        return Ok(());
    }

    for line in format_pending_lines(&actions) {
        println!("{line}");
    }
    Ok(())
}
