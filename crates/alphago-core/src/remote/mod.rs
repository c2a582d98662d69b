//! Remote order service boundary
//!
//! The offline engine replays queued actions through [`RemoteOrders`]. It
//! only tells success from failure; the variants of [`RemoteError`] exist for
//! logs and for callers talking to the service directly.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{OrderChanges, OrderDraft, OrderId};

pub use http::HttpOrderService;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid order service configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Order service HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Order service API error: {0}")]
    Api(String),
    #[error("Invalid order service payload: {0}")]
    InvalidPayload(String),
    #[error("Order service unavailable: {0}")]
    Unavailable(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Create/update/delete orders on the authoritative store
#[async_trait]
pub trait RemoteOrders: Send + Sync {
    /// Create an order and return the id the service assigned
    async fn create_order(&self, draft: &OrderDraft) -> RemoteResult<OrderId>;

    async fn update_order(&self, id: &OrderId, changes: &OrderChanges) -> RemoteResult<()>;

    /// Delete an order. Deleting an order that no longer exists succeeds.
    async fn delete_order(&self, id: &OrderId) -> RemoteResult<()>;
}
