use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alphago_core::connectivity::{ConnectivityMonitor, HttpProbe};
use alphago_core::remote::{HttpOrderService, RemoteError, RemoteOrders, RemoteResult};
use alphago_core::storage::SqliteStore;
use alphago_core::{
    EngineConfig, OfflineEngine, Order, OrderChanges, OrderDraft, OrderId, PendingAction,
};
use chrono::Utc;
use serde::Serialize;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub const DB_PATH_ENV_VAR: &str = "ALPHAGO_DB_PATH";

/// Everything one CLI invocation needs to drive the engine
pub struct Session {
    pub profile_name: String,
    pub profile: CliProfile,
    pub engine: Arc<OfflineEngine>,
    /// Present when the profile names an order service
    pub orders: Option<HttpOrderService>,
    pub online: bool,
}

impl Session {
    pub fn require_orders(&self) -> Result<&HttpOrderService, CliError> {
        self.orders.as_ref().ok_or(CliError::RemoteNotConfigured)
    }
}

/// Stand-in remote used when no order service is configured. Drains never
/// reach it because the device is reported offline.
struct UnconfiguredRemote;

#[async_trait::async_trait]
impl RemoteOrders for UnconfiguredRemote {
    async fn create_order(&self, _draft: &OrderDraft) -> RemoteResult<OrderId> {
        Err(not_configured())
    }

    async fn update_order(&self, _id: &OrderId, _changes: &OrderChanges) -> RemoteResult<()> {
        Err(not_configured())
    }

    async fn delete_order(&self, _id: &OrderId) -> RemoteResult<()> {
        Err(not_configured())
    }
}

fn not_configured() -> RemoteError {
    RemoteError::InvalidConfiguration("order service URL is not configured".to_string())
}

pub async fn open_session(db_path: &Path, profile: Option<&str>) -> Result<Session, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    open_session_with_profile(db_path, profile_name, profile).await
}

pub async fn open_session_with_profile(
    db_path: &Path,
    profile_name: String,
    profile: CliProfile,
) -> Result<Session, CliError> {
    let store = Arc::new(SqliteStore::open(db_path)?);

    let orders = profile
        .api_base_url()
        .map(|base_url| HttpOrderService::new(base_url, profile.api_token()))
        .transpose()?;

    let monitor = ConnectivityMonitor::new(false);
    let online = match (&orders, profile.probe_url()) {
        (Some(_), Some(url)) => {
            let probe = HttpProbe::new(url)?;
            let online = probe.refresh(&monitor).await;
            if !online {
                tracing::info!("Order service unreachable at {}; working offline", probe.url());
            }
            online
        }
        _ => false,
    };

    let remote: Arc<dyn RemoteOrders> = match &orders {
        Some(service) => Arc::new(service.clone()),
        None => Arc::new(UnconfiguredRemote),
    };

    let engine_config = EngineConfig::for_session(profile.session().as_deref().unwrap_or_default());
    let engine = OfflineEngine::new(store, Arc::new(monitor), remote, engine_config)?
        .on_action_dropped(|action| {
            eprintln!(
                "Gave up on {} for order {} after {} retries",
                action.kind(),
                action.target(),
                action.retry_count
            );
        });

    Ok(Session {
        profile_name,
        profile,
        engine: Arc::new(engine),
        orders,
        online,
    })
}

#[derive(Debug, Serialize)]
pub struct OrderListItem {
    pub id: String,
    pub local: bool,
    pub customer_name: String,
    pub zone_name: String,
    pub price_tnd: f64,
    pub status: String,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct PendingActionItem {
    pub id: String,
    pub kind: String,
    pub target_id: String,
    pub retry_count: u32,
    pub enqueued_at: i64,
    pub enqueued_at_iso: String,
}

pub fn order_to_list_item(order: &Order) -> OrderListItem {
    let now_ms = Utc::now().timestamp_millis();
    OrderListItem {
        id: order.id.to_string(),
        local: order.is_local(),
        customer_name: order.customer_name.clone(),
        zone_name: order.zone_name.clone(),
        price_tnd: order.price_tnd,
        status: order.status.to_string(),
        updated_at: order.updated_at,
        relative_time: format_relative_time(order.updated_at, now_ms),
    }
}

pub fn pending_action_to_item(action: &PendingAction) -> PendingActionItem {
    PendingActionItem {
        id: action.id.to_string(),
        kind: action.kind().to_string(),
        target_id: action.target().to_string(),
        retry_count: action.retry_count,
        enqueued_at: action.enqueued_at,
        enqueued_at_iso: format_timestamp(action.enqueued_at),
    }
}

/// Orders created offline are marked with `*` until the service confirms them
pub fn format_order_lines(orders: &[Order]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    orders
        .iter()
        .map(|order| {
            let marker = if order.is_local() { '*' } else { ' ' };
            let short_id = short_id(order.id.as_str());
            let customer = truncate(&order.customer_name, 20);
            let zone = truncate(&order.zone_name, 16);
            let relative_time = format_relative_time(order.updated_at, now_ms);
            format!(
                "{marker}{short_id:<18}  {customer:<20}  {zone:<16}  {:>9.3} TND  {:<11}  {relative_time}",
                order.price_tnd,
                order.status.as_str()
            )
        })
        .collect()
}

pub fn format_pending_lines(actions: &[PendingAction]) -> Vec<String> {
    actions
        .iter()
        .map(|action| {
            format!(
                "{}  {:<6}  {:<18}  retries={}",
                format_timestamp(action.enqueued_at),
                action.kind().as_str(),
                short_id(action.target().as_str()),
                action.retry_count
            )
        })
        .collect()
}

fn short_id(id: &str) -> String {
    id.chars().take(18).collect()
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn normalize_order_identifier(id: &str) -> Result<OrderId, CliError> {
    id.trim().parse::<OrderId>().map_err(|_| CliError::EmptyOrderId)
}

pub fn require_text(value: &str, field: &'static str) -> Result<String, CliError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn validate_price(price: f64) -> Result<f64, CliError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(CliError::InvalidPrice(price))
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV_VAR).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("alphago").join("alphago.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
