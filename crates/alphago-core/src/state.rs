//! Shared sync state types.

/// Coarse sync state shown next to the order list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Device is disconnected; mutations are queued.
    Offline,
    /// A drain is replaying the queue.
    Syncing,
    /// Nothing left to replay.
    Synced,
    /// Actions are still waiting for another attempt.
    Pending,
    /// The last drain abandoned at least one action.
    Failed,
}

impl SyncState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for state in [
            SyncState::Offline,
            SyncState::Syncing,
            SyncState::Synced,
            SyncState::Pending,
            SyncState::Failed,
        ] {
            let serialized = serde_json::to_value(state).unwrap();
            assert_eq!(serialized.as_str(), Some(state.as_str()));
        }
    }
}
