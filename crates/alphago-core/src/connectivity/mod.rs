//! Connectivity oracle
//!
//! Reports whether the order service is reachable and notifies listeners on
//! transitions. [`ConnectivityMonitor`] holds the current state in a
//! `tokio::sync::watch` channel; drivers such as [`HttpProbe`] (or a
//! platform network callback) push updates into it.

mod probe;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use probe::HttpProbe;

/// Point-in-time and streaming view of connectivity
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;

    /// A receiver that observes every future state change
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Shared, settable connectivity state
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (sender, _receiver) = watch::channel(initially_online);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Record the latest observation. Repeating the current state notifies nobody.
    pub fn set_online(&self, online: bool) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::debug!("Connectivity changed: online={}", online);
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Handle to a background listener.
///
/// `unsubscribe` stops the listener for good and may be called any number of
/// times. Dropping the handle unsubscribes as well.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
    cancelled: AtomicBool,
}

impl Subscription {
    pub(crate) fn from_task(task: JoinHandle<()>) -> Self {
        Self {
            task,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn unsubscribe(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Register transition callbacks.
///
/// `on_connect` fires on every transition into the connected state, including
/// the first observation when already connected. `on_disconnect` fires on
/// every transition out of it. Must be called from within a Tokio runtime.
pub fn on_change<C, F, G>(connectivity: &C, on_connect: F, on_disconnect: G) -> Subscription
where
    C: Connectivity + ?Sized,
    F: Fn() + Send + 'static,
    G: Fn() + Send + 'static,
{
    let mut receiver = connectivity.watch();
    let task = tokio::spawn(async move {
        let mut last_seen: Option<bool> = None;
        loop {
            let online = *receiver.borrow_and_update();
            if last_seen != Some(online) {
                if online {
                    on_connect();
                } else if last_seen.is_some() {
                    on_disconnect();
                }
                last_seen = Some(online);
            }

            if receiver.changed().await.is_err() {
                break;
            }
        }
    });
    Subscription::from_task(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn test_monitor_reports_state() {
        let monitor = ConnectivityMonitor::new(false);
        assert!(!monitor.is_online());
        monitor.set_online(true);
        assert!(monitor.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_first_observation_fires_connect_when_online() {
        let monitor = ConnectivityMonitor::new(true);
        let (connects, disconnects) = counters();
        let (c, d) = (connects.clone(), disconnects.clone());

        let _subscription = on_change(
            &monitor,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        );
        settle().await;

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(disconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transitions_fire_callbacks() {
        let monitor = ConnectivityMonitor::new(false);
        let (connects, disconnects) = counters();
        let (c, d) = (connects.clone(), disconnects.clone());

        let _subscription = on_change(
            &monitor,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        );
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 0);

        monitor.set_online(true);
        settle().await;
        monitor.set_online(true);
        settle().await;
        monitor.set_online(false);
        settle().await;
        monitor.set_online(true);
        settle().await;

        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unsubscribe_is_idempotent_and_stops_callbacks() {
        let monitor = ConnectivityMonitor::new(false);
        let (connects, _) = counters();
        let c = connects.clone();

        let subscription = on_change(
            &monitor,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            || {},
        );
        settle().await;
        assert!(subscription.is_active());

        subscription.unsubscribe();
        subscription.unsubscribe();
        settle().await;
        assert!(!subscription.is_active());

        monitor.set_online(true);
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }
}
