use std::path::PathBuf;

use alphago_core::state::SyncState;
use alphago_core::{DrainReport, Order, OrderDraft, OrderId, OrderStatus, SyncStatus};
use pretty_assertions::assert_eq;

use crate::cli::{CreateArgs, UpdateArgs};
use crate::commands::clear::run_clear;
use crate::commands::common::{
    format_order_lines, format_relative_time, normalize_order_identifier,
    open_session_with_profile, resolve_db_path, validate_price, Session,
};
use crate::commands::config::{apply_profile_updates, validate_profile_urls, ProfileUpdates};
use crate::commands::create::{draft_from_args, run_create};
use crate::commands::delete::run_delete;
use crate::commands::status::{format_status_lines, run_status};
use crate::commands::sync::{run_sync, summarize_report};
use crate::commands::update::changes_from_args;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn create_args() -> CreateArgs {
    CreateArgs {
        customer: " Ahmed ".to_string(),
        phone: "+216 20 000 000".to_string(),
        zone_code: "TUN-01".to_string(),
        zone_name: "Tunis Centre".to_string(),
        lat: 36.8,
        lng: 10.18,
        price: 25.5,
        items: vec!["couscous".to_string(), "  ".to_string()],
        note: Some("  ".to_string()),
        created_by: None,
    }
}

fn update_args(id: &str) -> UpdateArgs {
    UpdateArgs {
        id: id.to_string(),
        customer: None,
        phone: None,
        zone_code: None,
        zone_name: None,
        price: None,
        status: None,
        note: None,
    }
}

async fn offline_session(dir: &tempfile::TempDir) -> Session {
    let profile = CliProfile {
        session: Some("driver-1".to_string()),
        ..CliProfile::default()
    };
    open_session_with_profile(&dir.path().join("alphago.db"), "test".to_string(), profile)
        .await
        .unwrap()
}

#[test]
fn draft_from_args_normalizes_fields() {
    let draft = draft_from_args(create_args(), Some("driver-1".to_string())).unwrap();
    assert_eq!(draft.customer_name, "Ahmed");
    assert_eq!(draft.items, Some(vec!["couscous".to_string()]));
    assert_eq!(draft.note, None);
    assert_eq!(draft.created_by, "driver-1");
    assert_eq!(draft.status, OrderStatus::Pending);
}

#[test]
fn draft_from_args_rejects_blank_customer() {
    let mut args = create_args();
    args.customer = "   ".to_string();
    assert!(matches!(
        draft_from_args(args, None),
        Err(CliError::EmptyField("Customer name"))
    ));
}

#[test]
fn validate_price_rejects_negative_and_nan() {
    assert!(validate_price(0.0).is_ok());
    assert!(matches!(validate_price(-1.0), Err(CliError::InvalidPrice(_))));
    assert!(validate_price(f64::NAN).is_err());
}

#[test]
fn changes_from_args_requires_a_change() {
    assert!(matches!(
        changes_from_args(update_args("srv_001")),
        Err(CliError::NoChanges)
    ));

    let mut args = update_args("srv_001");
    args.status = Some(OrderStatus::Done);
    args.price = Some(30.0);
    let changes = changes_from_args(args).unwrap();
    assert_eq!(changes.status, Some(OrderStatus::Done));
    assert_eq!(changes.price_tnd, Some(30.0));
    assert_eq!(changes.customer_name, None);
}

#[test]
fn normalize_order_identifier_trims_and_rejects_empty() {
    assert_eq!(
        normalize_order_identifier(" srv_001 ").unwrap(),
        OrderId::new("srv_001")
    );
    assert!(matches!(
        normalize_order_identifier("  "),
        Err(CliError::EmptyOrderId)
    ));
}

#[test]
fn resolve_db_path_prefers_explicit_path() {
    let explicit = PathBuf::from("/tmp/alphago-explicit.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())).unwrap(), explicit);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_order_lines_marks_local_orders() {
    let draft = OrderDraft {
        customer_name: "Ahmed".to_string(),
        zone_name: "Tunis Centre".to_string(),
        price_tnd: 25.5,
        ..OrderDraft::default()
    };
    let local = Order::from_draft(OrderId::temporary(), draft.clone());
    let confirmed = Order::from_draft(OrderId::new("srv_001"), draft);

    let lines = format_order_lines(&[local, confirmed]);
    assert!(lines[0].starts_with("*temp_"));
    assert!(lines[1].starts_with(" srv_001"));
    assert!(lines[1].contains("25.500 TND"));
    assert!(lines[1].contains("pending"));
}

#[test]
fn summarize_report_counts() {
    assert_eq!(summarize_report(&DrainReport::default()), "Nothing to sync");
    let report = DrainReport {
        applied: 2,
        retried: 1,
        dropped: Vec::new(),
        remaining: 1,
    };
    assert_eq!(
        summarize_report(&report),
        "Sync completed: 2 applied, 1 will be retried"
    );
}

#[test]
fn format_status_lines_reports_abandoned_actions() {
    let status = SyncStatus {
        state: SyncState::Failed,
        online: true,
        pending: 0,
        last_drain_at: None,
        dropped: 2,
    };
    let lines = format_status_lines("work", &status);
    assert_eq!(lines[0], "Profile:   work");
    assert_eq!(lines[1], "State:     failed");
    assert_eq!(lines[4], "Last sync: never");
    assert!(lines[5].starts_with("Abandoned: 2 action(s)"));
}

#[test]
fn profile_updates_keep_existing_values() {
    let mut profile = CliProfile {
        api_base_url: Some("https://old.example.com".to_string()),
        api_token: Some("token-1".to_string()),
        ..CliProfile::default()
    };
    apply_profile_updates(
        &mut profile,
        ProfileUpdates {
            api_base_url: Some(" https://api.example.com/v1/ ".to_string()),
            session: Some("driver-2".to_string()),
            ..ProfileUpdates::default()
        },
    );

    assert_eq!(
        profile.api_base_url.as_deref(),
        Some("https://api.example.com/v1")
    );
    assert_eq!(profile.api_token.as_deref(), Some("token-1"));
    assert_eq!(profile.session.as_deref(), Some("driver-2"));
    assert!(validate_profile_urls(&profile).is_ok());
}

#[test]
fn validate_profile_urls_requires_http_scheme() {
    let profile = CliProfile {
        health_url: Some("api.example.com/health".to_string()),
        ..CliProfile::default()
    };
    assert!(matches!(
        validate_profile_urls(&profile),
        Err(CliError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_profile_queues_orders_offline() {
    let dir = tempfile::tempdir().unwrap();
    let session = offline_session(&dir).await;
    assert!(!session.online);

    run_create(create_args(), &session).await.unwrap();
    run_delete("srv_009", &session).await.unwrap();

    assert_eq!(session.engine.pending_actions().await.len(), 2);
    let orders = session.engine.cached_orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].created_by, "driver-1");
    assert!(orders[0].is_local());
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_persists_between_invocations() {
    let dir = tempfile::tempdir().unwrap();
    {
        let session = offline_session(&dir).await;
        run_create(create_args(), &session).await.unwrap();
    }

    let session = offline_session(&dir).await;
    assert_eq!(session.engine.pending_actions().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_without_service_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let session = offline_session(&dir).await;

    assert!(matches!(
        run_sync(false, &session).await,
        Err(CliError::RemoteNotConfigured)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_refuses_unsynced_actions_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let session = offline_session(&dir).await;
    run_create(create_args(), &session).await.unwrap();

    assert!(matches!(
        run_clear(false, &session).await,
        Err(CliError::UnsyncedActions(1))
    ));
    run_clear(true, &session).await.unwrap();
    assert!(session.engine.pending_actions().await.is_empty());
    assert!(session.engine.cached_orders().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn status_acknowledge_without_abandoned_actions() {
    let dir = tempfile::tempdir().unwrap();
    let session = offline_session(&dir).await;

    run_status(false, true, &session).await.unwrap();

    let status = session.engine.sync_status().await;
    assert_eq!(status.state, SyncState::Offline);
    assert_eq!(status.dropped, 0);
}
