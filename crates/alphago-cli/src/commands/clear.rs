use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_clear(force: bool, session: &Session) -> Result<(), CliError> {
    let pending = session.engine.pending_actions().await.len();
    if pending > 0 && !force {
        return Err(CliError::UnsyncedActions(pending));
    }

    session.engine.clear_all().await?;
    println!("Cleared local orders for profile '{}'", session.profile_name);
    Ok(())
}
