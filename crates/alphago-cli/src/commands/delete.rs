use crate::commands::common::{normalize_order_identifier, Session};
use crate::error::CliError;

pub async fn run_delete(id: &str, session: &Session) -> Result<(), CliError> {
    let id = normalize_order_identifier(id)?;
    session.engine.enqueue_delete(&id).await?;
    println!("{id}");
    Ok(())
}
