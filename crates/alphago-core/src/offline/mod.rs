//! Offline reconciliation engine
//!
//! Order mutations are recorded as [`PendingAction`]s and applied to a local
//! order list right away. When the order service is reachable, a drain replays
//! the queue in FIFO order. A failed action stays queued with one more retry
//! until it passes the retry ceiling.
//!
//! Abandoned actions are kept under their own key until the user
//! acknowledges them, so a "sync failed" indicator outlives the process that
//! gave up on them.
//!
//! Every read-modify-write of the persisted lists happens under one
//! in-process lock. The drain itself is guarded separately so that only one
//! pass runs at a time; it releases the lock while waiting on the network.


use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::connectivity::{self, Connectivity, Subscription};
use crate::error::Result;
use crate::models::{ActionId, ActionPayload, Order, OrderChanges, OrderDraft, OrderId, PendingAction};
use crate::remote::{RemoteOrders, RemoteResult};
use crate::state::SyncState;
use crate::storage::{DurableCache, KeyValueStore};
use crate::util::unix_millis_now;

/// Called with every action abandoned after exhausting its retries
pub type DropHook = Arc<dyn Fn(&PendingAction) + Send + Sync>;

/// Result of a drain request
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// Connectivity oracle reported offline; nothing was touched
    Offline,
    /// Another drain was in progress; this request was dropped
    AlreadyRunning,
    Completed(DrainReport),
}

impl DrainOutcome {
    pub const fn report(&self) -> Option<&DrainReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Offline | Self::AlreadyRunning => None,
        }
    }
}

/// What a completed drain did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrainReport {
    /// Actions confirmed by the remote and removed from the queue
    pub applied: usize,
    /// Actions that failed and were kept for another attempt
    pub retried: usize,
    /// Actions abandoned after exhausting their retries
    pub dropped: Vec<PendingAction>,
    /// Queue length after the drain
    pub remaining: usize,
}

/// Snapshot for a "sync pending / sync failed" indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub online: bool,
    pub pending: usize,
    /// End of the last completed drain (Unix ms)
    pub last_drain_at: Option<i64>,
    /// Abandoned actions not yet acknowledged
    pub dropped: usize,
}

pub struct OfflineEngine {
    cache: DurableCache,
    connectivity: Arc<dyn Connectivity>,
    remote: Arc<dyn RemoteOrders>,
    config: EngineConfig,
    lock: Mutex<()>,
    draining: AtomicBool,
    /// Bumped by `clear_all` so an in-flight drain does not resurrect its snapshot
    epoch: AtomicU64,
    last_drain_at: AtomicI64,
    drop_hook: Option<DropHook>,
}

impl std::fmt::Debug for OfflineEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OfflineEngine")
            .field("config", &self.config)
            .field("draining", &self.draining.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl OfflineEngine {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        connectivity: Arc<dyn Connectivity>,
        remote: Arc<dyn RemoteOrders>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: DurableCache::new(store),
            connectivity,
            remote,
            config,
            lock: Mutex::new(()),
            draining: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            last_drain_at: AtomicI64::new(0),
            drop_hook: None,
        })
    }

    /// Observe actions abandoned after exhausting their retries
    #[must_use]
    pub fn on_action_dropped(
        mut self,
        hook: impl Fn(&PendingAction) + Send + Sync + 'static,
    ) -> Self {
        self.drop_hook = Some(Arc::new(hook));
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Queue a create and show the order locally under a temporary id.
    ///
    /// The queue entry is durable when this returns; a storage failure is
    /// returned as an error and nothing is shown locally.
    pub async fn enqueue_create(&self, draft: OrderDraft) -> Result<OrderId> {
        let local_id = OrderId::temporary();
        let order = Order::from_draft(local_id.clone(), draft.clone());

        let _guard = self.lock.lock().await;
        self.append_action(ActionPayload::Create {
            local_id: local_id.clone(),
            draft,
        })
        .await?;

        let mut orders = self.read_orders().await;
        orders.insert(0, order);
        self.write_orders_best_effort(&orders).await;

        Ok(local_id)
    }

    /// Queue an update and apply it to the local copy when there is one
    pub async fn enqueue_update(&self, target_id: &OrderId, changes: OrderChanges) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.append_action(ActionPayload::Update {
            target_id: target_id.clone(),
            changes: changes.clone(),
        })
        .await?;

        let mut orders = self.read_orders().await;
        if let Some(order) = orders.iter_mut().find(|order| &order.id == target_id) {
            changes.apply_to(order);
            order.updated_at = unix_millis_now();
            self.write_orders_best_effort(&orders).await;
        } else {
            tracing::debug!("Order {} not cached locally; update queued only", target_id);
        }

        Ok(())
    }

    /// Queue a delete and drop the local copy immediately
    pub async fn enqueue_delete(&self, target_id: &OrderId) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.append_action(ActionPayload::Delete {
            target_id: target_id.clone(),
        })
        .await?;

        let mut orders = self.read_orders().await;
        orders.retain(|order| &order.id != target_id);
        self.write_orders_best_effort(&orders).await;

        Ok(())
    }

    /// Replay the queue against the remote order service.
    ///
    /// Remote failures never surface as errors; they are accounted in the
    /// returned report. The only error is failing to persist the new queue.
    pub async fn drain_queue(&self) -> Result<DrainOutcome> {
        if !self.connectivity.is_online() {
            tracing::debug!("Skipping drain: offline");
            return Ok(DrainOutcome::Offline);
        }

        let Some(_drain) = DrainGuard::acquire(&self.draining) else {
            tracing::debug!("Skipping drain: another drain is running");
            return Ok(DrainOutcome::AlreadyRunning);
        };

        let (snapshot, epoch) = {
            let _guard = self.lock.lock().await;
            (self.read_queue().await, self.epoch.load(Ordering::SeqCst))
        };

        if snapshot.is_empty() {
            self.record_drain();
            return Ok(DrainOutcome::Completed(DrainReport::default()));
        }

        tracing::debug!("Draining {} pending action(s)", snapshot.len());
        let snapshot_ids = snapshot
            .iter()
            .map(|action| action.id)
            .collect::<HashSet<ActionId>>();

        let mut report = DrainReport::default();
        let mut survivors = Vec::with_capacity(snapshot.len());
        let mut confirmed_creates = Vec::new();

        for action in snapshot {
            match self.replay(&action).await {
                Ok(remote_id) => {
                    tracing::debug!(
                        "Replayed {} action {} for order {}",
                        action.kind(),
                        action.id,
                        action.target()
                    );
                    if let (Some(remote_id), ActionPayload::Create { local_id, .. }) =
                        (remote_id, &action.payload)
                    {
                        confirmed_creates.push((local_id.clone(), remote_id));
                    }
                    report.applied += 1;
                }
                Err(error) if action.retry_count < self.config.max_retry_count => {
                    tracing::debug!(
                        "Replay of {} action {} failed (attempt {}): {}",
                        action.kind(),
                        action.id,
                        action.retry_count + 1,
                        error
                    );
                    survivors.push(action.retried());
                    report.retried += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Dropping {} action {} for order {} after {} retries: {}",
                        action.kind(),
                        action.id,
                        action.target(),
                        action.retry_count,
                        error
                    );
                    if let Some(hook) = &self.drop_hook {
                        hook(&action);
                    }
                    report.dropped.push(action);
                }
            }
        }

        let _guard = self.lock.lock().await;
        let cleared = self.epoch.load(Ordering::SeqCst) != epoch;
        if cleared {
            tracing::debug!("Queue was cleared during drain; discarding survivors");
            survivors.clear();
        }

        // Keep anything enqueued while the pass was running.
        let enqueued_meanwhile = self
            .read_queue()
            .await
            .into_iter()
            .filter(|action| !snapshot_ids.contains(&action.id));
        survivors.extend(enqueued_meanwhile);

        if let Err(error) = self
            .cache
            .write(&self.config.pending_actions_key, &survivors)
            .await
        {
            tracing::error!("Failed to persist pending actions after drain: {}", error);
            return Err(error.into());
        }
        report.remaining = survivors.len();

        if !cleared {
            if !confirmed_creates.is_empty() {
                self.adopt_remote_ids(&confirmed_creates).await;
            }
            if !report.dropped.is_empty() {
                self.remember_dropped(&report.dropped).await;
            }
        }

        self.record_drain();
        tracing::info!(
            "Drain complete: {} applied, {} retried, {} dropped, {} remaining",
            report.applied,
            report.retried,
            report.dropped.len(),
            report.remaining
        );
        Ok(DrainOutcome::Completed(report))
    }

    /// Queued actions in replay order
    pub async fn pending_actions(&self) -> Vec<PendingAction> {
        let _guard = self.lock.lock().await;
        self.read_queue().await
    }

    /// Last known order list, newest local creates first
    pub async fn cached_orders(&self) -> Vec<Order> {
        let _guard = self.lock.lock().await;
        self.read_orders().await
    }

    /// Abandoned actions, oldest first, until [`Self::acknowledge_dropped`]
    pub async fn dropped_actions(&self) -> Vec<PendingAction> {
        let _guard = self.lock.lock().await;
        self.read_dropped().await
    }

    /// Forget abandoned actions once the user has seen them
    pub async fn acknowledge_dropped(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let count = self.read_dropped().await.len();
        self.cache
            .remove(&[self.config.dropped_actions_key.as_str()])
            .await?;
        tracing::debug!("Acknowledged {} abandoned action(s)", count);
        Ok(count)
    }

    /// Replace the local order list with an authoritative one
    pub async fn set_cached_orders(&self, orders: &[Order]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.cache
            .write(&self.config.cached_orders_key, orders)
            .await?;
        tracing::debug!("Cached {} order(s)", orders.len());
        Ok(())
    }

    /// Forget the queue, the cached orders and any abandoned actions
    /// (logout / reset).
    ///
    /// All keys are removed in one call; on error nothing is reported as
    /// cleared and the caller can retry.
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.cache
            .remove(&[
                self.config.pending_actions_key.as_str(),
                self.config.cached_orders_key.as_str(),
                self.config.dropped_actions_key.as_str(),
            ])
            .await?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Cleared pending actions and cached orders");
        Ok(())
    }

    pub async fn sync_status(&self) -> SyncStatus {
        let (pending, dropped) = {
            let _guard = self.lock.lock().await;
            (self.read_queue().await.len(), self.read_dropped().await.len())
        };
        let online = self.connectivity.is_online();
        let last_drain_at = Some(self.last_drain_at.load(Ordering::SeqCst)).filter(|at| *at > 0);

        let state = if self.draining.load(Ordering::SeqCst) {
            SyncState::Syncing
        } else if dropped > 0 {
            SyncState::Failed
        } else if !online {
            SyncState::Offline
        } else if pending > 0 {
            SyncState::Pending
        } else {
            SyncState::Synced
        };

        SyncStatus {
            state,
            online,
            pending,
            last_drain_at,
            dropped,
        }
    }

    /// Drain whenever connectivity comes back, including right away if the
    /// device is already online. Must be called from within a Tokio runtime.
    pub fn spawn_auto_sync(self: &Arc<Self>) -> Subscription {
        let engine = Arc::clone(self);
        connectivity::on_change(
            self.connectivity.as_ref(),
            move || {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    match engine.drain_queue().await {
                        Ok(outcome) => tracing::debug!("Auto sync finished: {:?}", outcome),
                        Err(error) => tracing::error!("Auto sync failed: {}", error),
                    }
                });
            },
            || tracing::info!("Connectivity lost; order changes will be queued locally"),
        )
    }

    async fn replay(&self, action: &PendingAction) -> RemoteResult<Option<OrderId>> {
        match &action.payload {
            ActionPayload::Create { draft, .. } => self.remote.create_order(draft).await.map(Some),
            ActionPayload::Update { target_id, changes } => self
                .remote
                .update_order(target_id, changes)
                .await
                .map(|()| None),
            ActionPayload::Delete { target_id } => {
                self.remote.delete_order(target_id).await.map(|()| None)
            }
        }
    }

    /// Swap temporary ids for the ids the remote assigned. Queued actions that
    /// still reference a temporary id are left as they are.
    async fn adopt_remote_ids(&self, confirmed: &[(OrderId, OrderId)]) {
        let mut orders = self.read_orders().await;
        let mut patched = 0usize;
        for order in &mut orders {
            if let Some((_, remote_id)) = confirmed.iter().find(|(local, _)| local == &order.id) {
                order.id = remote_id.clone();
                patched += 1;
            }
        }
        if patched > 0 {
            tracing::debug!("Adopted {} remote order id(s)", patched);
            self.write_orders_best_effort(&orders).await;
        }
    }

    async fn append_action(&self, payload: ActionPayload) -> Result<()> {
        let action = PendingAction::new(payload);
        let mut queue = self.read_queue().await;
        tracing::debug!(
            "Queuing {} action {} for order {}",
            action.kind(),
            action.id,
            action.target()
        );
        queue.push(action);
        self.cache
            .write(&self.config.pending_actions_key, &queue)
            .await?;
        Ok(())
    }

    async fn read_queue(&self) -> Vec<PendingAction> {
        self.cache
            .read(&self.config.pending_actions_key)
            .await
            .unwrap_or_default()
    }

    async fn read_dropped(&self) -> Vec<PendingAction> {
        self.cache
            .read(&self.config.dropped_actions_key)
            .await
            .unwrap_or_default()
    }

    async fn read_orders(&self) -> Vec<Order> {
        self.cache
            .read(&self.config.cached_orders_key)
            .await
            .unwrap_or_default()
    }

    /// The optimistic copy is a convenience; losing a write here loses no intent.
    async fn write_orders_best_effort(&self, orders: &[Order]) {
        if let Err(error) = self
            .cache
            .write(&self.config.cached_orders_key, orders)
            .await
        {
            tracing::warn!("Failed to update cached orders: {}", error);
        }
    }

    /// The queue write already succeeded; failing here only weakens the indicator.
    async fn remember_dropped(&self, dropped: &[PendingAction]) {
        let mut remembered = self.read_dropped().await;
        remembered.extend_from_slice(dropped);
        if let Err(error) = self
            .cache
            .write(&self.config.dropped_actions_key, &remembered)
            .await
        {
            tracing::warn!("Failed to record abandoned actions: {}", error);
        }
    }

    fn record_drain(&self) {
        self.last_drain_at
            .store(unix_millis_now(), Ordering::SeqCst);
    }
}

/// Holds the drain flag for the lifetime of one pass
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
