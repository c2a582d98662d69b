use crate::commands::common::Session;
use crate::error::CliError;

/// Replace the cached orders with the service's list. Queued actions stay
/// queued; their optimistic edits are overwritten until the next sync.
pub async fn run_refresh(session: &Session) -> Result<(), CliError> {
    let orders = session.require_orders()?;
    if !session.online {
        return Err(CliError::Offline);
    }

    let list = orders.list_orders().await?;
    session.engine.set_cached_orders(&list).await?;
    println!("Cached {} order(s)", list.len());

    let pending = session.engine.pending_actions().await.len();
    if pending > 0 {
        println!("{pending} queued action(s) still waiting; run `alphago sync` to push them");
    }
    Ok(())
}
