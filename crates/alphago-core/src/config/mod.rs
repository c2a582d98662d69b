//! Offline engine configuration.
//!
//! `EngineConfig` names the durable cache keys the engine owns and the retry
//! ceiling applied to queued actions.

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Default storage key for the serialized pending-action queue
pub const DEFAULT_PENDING_ACTIONS_KEY: &str = "alphago_pending_actions";
/// Default storage key for the last known order list
pub const DEFAULT_CACHED_ORDERS_KEY: &str = "alphago_cached_orders";
/// Default storage key for actions abandoned and not yet acknowledged
pub const DEFAULT_DROPPED_ACTIONS_KEY: &str = "alphago_dropped_actions";
/// Failed replays tolerated before an action is abandoned
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_retry_count: u32,
    pub pending_actions_key: String,
    pub cached_orders_key: String,
    pub dropped_actions_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
            pending_actions_key: DEFAULT_PENDING_ACTIONS_KEY.to_string(),
            cached_orders_key: DEFAULT_CACHED_ORDERS_KEY.to_string(),
            dropped_actions_key: DEFAULT_DROPPED_ACTIONS_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Configuration whose keys are scoped to one logged-in user, so that
    /// several sessions can share a store without seeing each other's queue.
    ///
    /// A blank session falls back to the unscoped default keys.
    pub fn for_session(session: &str) -> Self {
        let Some(session) = normalize_text_option(Some(session.to_string())) else {
            return Self::default();
        };
        Self {
            pending_actions_key: format!("{DEFAULT_PENDING_ACTIONS_KEY}:{session}"),
            cached_orders_key: format!("{DEFAULT_CACHED_ORDERS_KEY}:{session}"),
            dropped_actions_key: format!("{DEFAULT_DROPPED_ACTIONS_KEY}:{session}"),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    /// Every key must be non-blank and distinct from the others
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("pending_actions_key", &self.pending_actions_key),
            ("cached_orders_key", &self.cached_orders_key),
            ("dropped_actions_key", &self.dropped_actions_key),
        ];

        for (name, key) in keys {
            if key.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{name} must not be empty")));
            }
        }
        for (index, (name, key)) in keys.iter().enumerate() {
            if let Some((other, _)) = keys[index + 1..].iter().find(|(_, other)| other == key) {
                return Err(Error::InvalidInput(format!(
                    "{name} and {other} must differ"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_uses_fixed_keys() {
        let config = EngineConfig::default();
        assert_eq!(config.max_retry_count, 3);
        assert_eq!(config.pending_actions_key, "alphago_pending_actions");
        assert_eq!(config.cached_orders_key, "alphago_cached_orders");
        assert_eq!(config.dropped_actions_key, "alphago_dropped_actions");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn for_session_scopes_keys() {
        let config = EngineConfig::for_session(" user-42 ");
        assert_eq!(config.pending_actions_key, "alphago_pending_actions:user-42");
        assert_eq!(config.cached_orders_key, "alphago_cached_orders:user-42");
        assert_eq!(config.dropped_actions_key, "alphago_dropped_actions:user-42");
        assert_eq!(EngineConfig::for_session("  "), EngineConfig::default());
    }

    #[test]
    fn validate_rejects_blank_key() {
        let config = EngineConfig {
            cached_orders_key: "  ".to_string(),
            ..EngineConfig::default()
        };
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("cached_orders_key must not be empty"));
    }

    #[test]
    fn validate_rejects_shared_keys() {
        let config = EngineConfig {
            dropped_actions_key: DEFAULT_PENDING_ACTIONS_KEY.to_string(),
            ..EngineConfig::default()
        };
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("pending_actions_key and dropped_actions_key must differ"));
    }
}
