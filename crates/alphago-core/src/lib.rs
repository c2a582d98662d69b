//! alphago-core - Core library for AlphaGo Delivery
//!
//! This crate contains the order models, the durable key-value cache, the
//! connectivity oracle, the remote order client, and the offline
//! reconciliation engine that replays queued order mutations once the device
//! is back online.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod offline;
pub mod remote;
pub mod state;
pub mod storage;
pub mod util;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::{Order, OrderChanges, OrderDraft, OrderId, OrderStatus, PendingAction};
pub use offline::{DrainOutcome, DrainReport, OfflineEngine, SyncStatus};
