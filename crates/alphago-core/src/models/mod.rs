//! Data models for AlphaGo Delivery

mod order;
mod pending_action;

pub use order::{Coords, Order, OrderChanges, OrderDraft, OrderId, OrderStatus, TEMP_ID_PREFIX};
pub use pending_action::{ActionId, ActionKind, ActionPayload, PendingAction};
