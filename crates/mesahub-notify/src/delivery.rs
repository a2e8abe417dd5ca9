//! Hybrid push/poll delivery channel.
//!
//! The [`Inbox`] keeps a consumer-facing view of the notification list.
//! It refreshes when the store pushes a change signal and falls back to a
//! coarse polling interval when no signal arrives, so a lost push never
//! strands the view. New unread high-priority notifications additionally
//! fan out on a dedicated interrupt channel.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

use mesahub_core::config::NotifierConfig;
use mesahub_core::result::AppResult;
use mesahub_core::types::id::NotificationId;
use mesahub_entity::notification::Notification;
use mesahub_store::{NotificationFilter, NotificationStore};

/// Lifecycle of the inbox view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxPhase {
    /// No load attempted yet.
    Idle,
    /// A refresh is in flight; the previous list is still shown.
    Loading,
    /// The list reflects the last successful load.
    Ready,
    /// The last refresh failed; the list is the last good one.
    Errored,
}

/// Consumer-facing snapshot of the inbox.
#[derive(Debug, Clone)]
pub struct InboxState {
    pub phase: InboxPhase,
    pub notifications: Vec<Notification>,
    pub last_error: Option<String>,
}

impl InboxState {
    fn idle() -> Self {
        Self {
            phase: InboxPhase::Idle,
            notifications: Vec::new(),
            last_error: None,
        }
    }
}

/// Consumer view of the notification store.
pub struct Inbox {
    store: Arc<dyn NotificationStore>,
    state: RwLock<InboxState>,
    known: Mutex<HashSet<NotificationId>>,
    interrupts: broadcast::Sender<Notification>,
    // First refresh seeds `known` without firing interrupts, so restarting
    // the process does not replay every stored high-priority notification.
    primed: AtomicBool,
    live: AtomicBool,
    poll_interval: Duration,
}

impl Inbox {
    pub fn new(store: Arc<dyn NotificationStore>, config: &NotifierConfig) -> Self {
        let (interrupts, _) = broadcast::channel(config.interrupt_buffer_size);
        Self {
            store,
            state: RwLock::new(InboxState::idle()),
            known: Mutex::new(HashSet::new()),
            interrupts,
            primed: AtomicBool::new(false),
            live: AtomicBool::new(true),
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
        }
    }

    /// Subscribe to new unread high-priority notifications.
    pub fn subscribe_interrupts(&self) -> broadcast::Receiver<Notification> {
        self.interrupts.subscribe()
    }

    /// Current view.
    pub async fn state(&self) -> InboxState {
        self.state.read().await.clone()
    }

    /// The last good notification list, newest first.
    pub async fn list(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    /// Unread count from the last good list.
    pub async fn unread_count(&self) -> usize {
        self.state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.is_unread())
            .count()
    }

    /// Stop applying refresh results. An in-flight refresh that completes
    /// after this call is discarded.
    pub fn shutdown(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    /// Reload the list from the store.
    ///
    /// Failures keep the previous list and record the error; the view
    /// degrades, it never goes blank.
    pub async fn refresh(&self) {
        if !self.live.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.state.write().await;
            state.phase = InboxPhase::Loading;
        }

        let result = self
            .store
            .list(NotificationFilter {
                unread_only: false,
                type_code: None,
                limit: None,
            })
            .await;

        if !self.live.load(Ordering::SeqCst) {
            return;
        }

        match result {
            Ok(notifications) => {
                self.dispatch_interrupts(&notifications);
                let mut state = self.state.write().await;
                state.phase = InboxPhase::Ready;
                state.notifications = notifications;
                state.last_error = None;
            }
            Err(error) => {
                warn!(%error, "inbox refresh failed, keeping previous list");
                let mut state = self.state.write().await;
                state.phase = InboxPhase::Errored;
                state.last_error = Some(error.to_string());
            }
        }
    }

    fn dispatch_interrupts(&self, notifications: &[Notification]) {
        let primed = self.primed.swap(true, Ordering::SeqCst);
        let mut known = self.known.lock().unwrap_or_else(|e| e.into_inner());
        for notification in notifications {
            let is_new = known.insert(notification.id);
            if primed
                && is_new
                && notification.is_unread()
                && notification.priority.interrupts()
            {
                debug!(id = %notification.id, type_code = %notification.type_code,
                    "high-priority interrupt");
                // Send only fails with no subscribers; that is fine.
                let _ = self.interrupts.send(notification.clone());
            }
        }
    }

    /// Mark one notification read, in the store and in the local view.
    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<()> {
        self.store.mark_read(id).await?;
        let now = Utc::now();
        let mut state = self.state.write().await;
        if let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) {
            notification.mark_read(now);
        }
        Ok(())
    }

    /// Mark every notification read.
    pub async fn mark_all_read(&self) -> AppResult<u64> {
        let updated = self.store.mark_all_read().await?;
        let now = Utc::now();
        let mut state = self.state.write().await;
        for notification in &mut state.notifications {
            if notification.is_unread() {
                notification.mark_read(now);
            }
        }
        Ok(updated)
    }

    /// Delivery loop: refresh on push signals, poll as a fallback.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let mut changes = self.store.subscribe_changes();
        let mut push_open = true;
        let mut ticker = interval(self.poll_interval);

        self.refresh().await;
        info!(
            poll_interval_seconds = self.poll_interval.as_secs(),
            "inbox delivery loop started"
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    info!("inbox delivery loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                change = changes.recv(), if push_open => {
                    match change {
                        Ok(change) => {
                            debug!(?change, "store change signal");
                            self.refresh().await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "store change stream lagged, refreshing");
                            self.refresh().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            // Polling alone carries the inbox from here on.
                            warn!("store change stream closed, falling back to polling");
                            push_open = false;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use mesahub_core::events::{Priority, RelatedEntityIds};
    use mesahub_core::types::id::ReservationId;
    use mesahub_entity::notification::NotificationDraft;
    use mesahub_store::MemoryStore;

    use super::*;

    fn draft(type_code: &str, priority: Priority) -> NotificationDraft {
        NotificationDraft {
            type_code: type_code.to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            priority,
            data: Map::new(),
            actions: Vec::new(),
            related: RelatedEntityIds::reservation(ReservationId::new()),
            expires_after: None,
        }
    }

    #[tokio::test]
    async fn first_refresh_never_interrupts() {
        let store = Arc::new(MemoryStore::new());
        store.create(draft("reservation_upcoming", Priority::High)).await.unwrap();

        let inbox = Inbox::new(store.clone(), &NotifierConfig::default());
        let mut interrupts = inbox.subscribe_interrupts();

        inbox.refresh().await;
        assert_eq!(inbox.state().await.phase, InboxPhase::Ready);
        assert!(interrupts.try_recv().is_err());
    }

    #[tokio::test]
    async fn new_high_priority_notification_interrupts_after_priming() {
        let store = Arc::new(MemoryStore::new());
        let inbox = Inbox::new(store.clone(), &NotifierConfig::default());
        let mut interrupts = inbox.subscribe_interrupts();

        inbox.refresh().await;
        store.create(draft("table_overstay", Priority::High)).await.unwrap();
        store.create(draft("table_freed", Priority::Low)).await.unwrap();
        inbox.refresh().await;

        let interrupt = interrupts.try_recv().unwrap();
        assert_eq!(interrupt.type_code, "table_overstay");
        assert!(interrupts.try_recv().is_err(), "low priority must not interrupt");
    }

    #[tokio::test]
    async fn repeated_refresh_interrupts_once_per_notification() {
        let store = Arc::new(MemoryStore::new());
        let inbox = Inbox::new(store.clone(), &NotifierConfig::default());
        let mut interrupts = inbox.subscribe_interrupts();

        inbox.refresh().await;
        store.create(draft("table_overstay", Priority::High)).await.unwrap();
        inbox.refresh().await;
        inbox.refresh().await;

        assert!(interrupts.try_recv().is_ok());
        assert!(interrupts.try_recv().is_err());
    }

    #[tokio::test]
    async fn mark_as_read_updates_store_and_view() {
        let store = Arc::new(MemoryStore::new());
        let stored = store.create(draft("reservation_created", Priority::Normal)).await.unwrap();

        let inbox = Inbox::new(store.clone(), &NotifierConfig::default());
        inbox.refresh().await;
        assert_eq!(inbox.unread_count().await, 1);

        inbox.mark_as_read(stored.id).await.unwrap();
        assert_eq!(inbox.unread_count().await, 0);
        assert_eq!(store.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn refresh_after_shutdown_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        let inbox = Inbox::new(store.clone(), &NotifierConfig::default());
        inbox.refresh().await;

        inbox.shutdown();
        store.create(draft("reservation_created", Priority::Normal)).await.unwrap();
        inbox.refresh().await;

        assert!(inbox.state().await.notifications.is_empty());
    }
}
