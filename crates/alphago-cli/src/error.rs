use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] alphago_core::Error),
    #[error(transparent)]
    Storage(#[from] alphago_core::storage::StorageError),
    #[error(transparent)]
    Remote(#[from] alphago_core::remote::RemoteError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Order ID cannot be empty")]
    EmptyOrderId,
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
    #[error("No changes given; pass at least one field to update")]
    NoChanges,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0} pending action(s) have not been synced; pass --force to discard them")]
    UnsyncedActions(usize),
    #[error(
        "Order service is not configured. Run `alphago config init --api-base-url <URL>` first."
    )]
    RemoteNotConfigured,
    #[error("Order service is unreachable; queued actions were kept")]
    Offline,
}
