//! Order model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::unix_millis_now;

/// Prefix marking ids that were minted locally and not yet confirmed remotely
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Identifier of an order.
///
/// Remote ids are opaque strings assigned by the order service. Orders created
/// while offline carry a temporary id starting with [`TEMP_ID_PREFIX`] until a
/// fresh list replaces them or the create is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap an id assigned by the remote order service
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a temporary id for an order created locally
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::now_v7().simple()))
    }

    /// Whether this id was minted locally
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Order ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Delivery status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown order status: {other}"
            ))),
        }
    }
}

/// Delivery location
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

/// An order as submitted by the customer, before the server assigns identity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub zone_code: String,
    pub zone_name: String,
    pub coords: Coords,
    #[serde(rename = "priceTND")]
    pub price_tnd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_by: String,
}

/// A full order snapshot, mirroring the remote document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_phone: String,
    pub zone_code: String,
    pub zone_name: String,
    pub coords: Coords,
    #[serde(rename = "priceTND")]
    pub price_tnd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: OrderStatus,
    pub created_by: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Order {
    /// Build an order from a draft, stamping both timestamps with the current time
    #[must_use]
    pub fn from_draft(id: OrderId, draft: OrderDraft) -> Self {
        let now = unix_millis_now();
        Self {
            id,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            zone_code: draft.zone_code,
            zone_name: draft.zone_name,
            coords: draft.coords,
            price_tnd: draft.price_tnd,
            items: draft.items,
            note: draft.note,
            status: draft.status,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the order is only known locally
    pub fn is_local(&self) -> bool {
        self.id.is_temporary()
    }
}

/// A partial order update; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    #[serde(default, rename = "priceTND", skip_serializing_if = "Option::is_none")]
    pub price_tnd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderChanges {
    /// Check if no field is set
    pub const fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.customer_phone.is_none()
            && self.zone_code.is_none()
            && self.zone_name.is_none()
            && self.coords.is_none()
            && self.price_tnd.is_none()
            && self.items.is_none()
            && self.note.is_none()
            && self.status.is_none()
    }

    /// Apply the set fields onto `order`. Timestamps are not touched.
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(value) = &self.customer_name {
            order.customer_name.clone_from(value);
        }
        if let Some(value) = &self.customer_phone {
            order.customer_phone.clone_from(value);
        }
        if let Some(value) = &self.zone_code {
            order.zone_code.clone_from(value);
        }
        if let Some(value) = &self.zone_name {
            order.zone_name.clone_from(value);
        }
        if let Some(value) = self.coords {
            order.coords = value;
        }
        if let Some(value) = self.price_tnd {
            order.price_tnd = value;
        }
        if let Some(value) = &self.items {
            order.items = Some(value.clone());
        }
        if let Some(value) = &self.note {
            order.note = Some(value.clone());
        }
        if let Some(value) = self.status {
            order.status = value;
        }
    }
}
