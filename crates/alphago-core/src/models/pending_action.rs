//! Pending action model
//!
//! A pending action is a recorded order mutation waiting to be replayed
//! against the remote order service.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{OrderChanges, OrderDraft, OrderId};
use crate::util::unix_millis_now;

/// A unique identifier for a pending action, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Create a new unique action ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of mutation an action replays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific data carried by a pending action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionPayload {
    /// `local_id` is the temporary id the optimistic record was given
    Create { local_id: OrderId, draft: OrderDraft },
    Update { target_id: OrderId, changes: OrderChanges },
    Delete { target_id: OrderId },
}

impl ActionPayload {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Create { .. } => ActionKind::Create,
            Self::Update { .. } => ActionKind::Update,
            Self::Delete { .. } => ActionKind::Delete,
        }
    }

    /// The order this action addresses. For creates this is the temporary id.
    pub const fn target(&self) -> &OrderId {
        match self {
            Self::Create { local_id, .. } => local_id,
            Self::Update { target_id, .. } | Self::Delete { target_id } => target_id,
        }
    }
}

/// A mutation intent awaiting remote confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: ActionId,
    pub payload: ActionPayload,
    /// Enqueue timestamp (Unix ms), informational only
    pub enqueued_at: i64,
    /// Failed replay attempts so far
    #[serde(default)]
    pub retry_count: u32,
}

impl PendingAction {
    /// Create a fresh action with a zero retry count
    #[must_use]
    pub fn new(payload: ActionPayload) -> Self {
        Self {
            id: ActionId::new(),
            payload,
            enqueued_at: unix_millis_now(),
            retry_count: 0,
        }
    }

    pub const fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    pub const fn target(&self) -> &OrderId {
        self.payload.target()
    }

    /// The same action after one more failed attempt
    #[must_use]
    pub fn retried(mut self) -> Self {
        self.retry_count = self.retry_count.saturating_add(1);
        self
    }
}
