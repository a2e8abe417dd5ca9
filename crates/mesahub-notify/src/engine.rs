//! Orchestrator engine.
//!
//! Wires the snapshot differ, temporal scheduler, and inbox delivery loop
//! together, runs each as its own task, and tears them all down on a
//! shared cancel signal.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

use mesahub_core::config::NotifierConfig;
use mesahub_core::events::DomainEvent;
use mesahub_core::types::id::{CustomerId, ReservationId, TableId};
use mesahub_entity::customer::Customer;
use mesahub_entity::reservation::Reservation;
use mesahub_entity::table::DiningTable;
use mesahub_store::{EntityCollection, EntityGateway, NotificationStore};

use crate::delivery::Inbox;
use crate::differ::{Snapshot, Snapshotted, diff};
use crate::emitter::Emitter;
use crate::taxonomy::TypeCatalog;
use crate::temporal::TemporalScheduler;

/// Last observed state of the tracked collections.
///
/// Each slot starts empty and is primed by the first successful fetch
/// without emitting events: on a cold start the world is "new" only to
/// the process, not to the staff.
#[derive(Default)]
struct Snapshots {
    reservations: Option<Snapshot<ReservationId, Reservation>>,
    customers: Option<Snapshot<CustomerId, Customer>>,
    tables: Option<Snapshot<TableId, DiningTable>>,
}

/// Swap a fresh snapshot in, diffing against the previous one when the
/// slot was already primed.
fn apply<T: Snapshotted>(
    slot: &mut Option<Snapshot<T::Id, T>>,
    current: Snapshot<T::Id, T>,
) -> Vec<DomainEvent> {
    match slot.take() {
        None => {
            *slot = Some(current);
            Vec::new()
        }
        Some(previous) => {
            let events = diff(&previous, &current);
            *slot = Some(current);
            events
        }
    }
}

/// Watches the tracked collections and emits events for observed changes.
struct SnapshotTracker {
    gateway: Arc<dyn EntityGateway>,
    emitter: Arc<Emitter>,
    snapshots: Snapshots,
    poll_interval: Duration,
}

impl SnapshotTracker {
    async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        let mut notices = self.gateway.subscribe_entities();
        let mut notices_open = true;
        let mut ticker = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    info!("snapshot tracker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.refresh_all().await;
                }
                notice = notices.recv(), if notices_open => {
                    use tokio::sync::broadcast::error::RecvError;
                    match notice {
                        Ok(collection) => {
                            debug!(?collection, "entity change signal");
                            self.refresh(collection).await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "entity change stream lagged, refreshing all");
                            self.refresh_all().await;
                        }
                        Err(RecvError::Closed) => {
                            warn!("entity change stream closed, falling back to polling");
                            notices_open = false;
                        }
                    }
                }
            }
        }
    }

    async fn refresh_all(&mut self) {
        self.refresh(EntityCollection::Reservations).await;
        self.refresh(EntityCollection::Customers).await;
        self.refresh(EntityCollection::Tables).await;
    }

    /// Fetch one collection and emit events for what changed. A failed
    /// fetch keeps the previous snapshot, so no change is lost; it is
    /// simply detected on the next successful pass.
    async fn refresh(&mut self, collection: EntityCollection) {
        let events = match collection {
            EntityCollection::Reservations => match self.gateway.reservations().await {
                Ok(current) => apply(&mut self.snapshots.reservations, current),
                Err(error) => {
                    warn!(%error, "reservation snapshot fetch failed");
                    return;
                }
            },
            EntityCollection::Customers => match self.gateway.customers().await {
                Ok(current) => apply(&mut self.snapshots.customers, current),
                Err(error) => {
                    warn!(%error, "customer snapshot fetch failed");
                    return;
                }
            },
            EntityCollection::Tables => match self.gateway.tables().await {
                Ok(current) => apply(&mut self.snapshots.tables, current),
                Err(error) => {
                    warn!(%error, "table snapshot fetch failed");
                    return;
                }
            },
        };
        if !events.is_empty() {
            debug!(?collection, count = events.len(), "snapshot diff produced events");
            self.emitter.emit_all(events).await;
        }
    }
}

/// The assembled orchestrator.
pub struct NotifierEngine {
    gateway: Arc<dyn EntityGateway>,
    emitter: Arc<Emitter>,
    inbox: Arc<Inbox>,
    scheduler: Arc<TemporalScheduler>,
    config: NotifierConfig,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NotifierEngine {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        gateway: Arc<dyn EntityGateway>,
        catalog: Arc<TypeCatalog>,
        config: NotifierConfig,
    ) -> Self {
        let emitter = Arc::new(Emitter::new(store.clone(), catalog));
        let inbox = Arc::new(Inbox::new(store.clone(), &config));
        let scheduler = Arc::new(TemporalScheduler::new(
            gateway.clone(),
            emitter.clone(),
            store,
            config.clone(),
        ));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            gateway,
            emitter,
            inbox,
            scheduler,
            config,
            cancel_tx,
            cancel_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The consumer-facing inbox.
    pub fn inbox(&self) -> Arc<Inbox> {
        self.inbox.clone()
    }

    /// Spawn the tracker, scheduler, and delivery tasks.
    pub async fn start(&self) {
        let tracker = SnapshotTracker {
            gateway: self.gateway.clone(),
            emitter: self.emitter.clone(),
            snapshots: Snapshots::default(),
            poll_interval: Duration::from_secs(self.config.poll_interval_seconds),
        };
        let tracker_cancel = self.cancel_rx.clone();
        let scheduler = self.scheduler.clone();
        let scheduler_cancel = self.cancel_rx.clone();
        let inbox = self.inbox.clone();
        let inbox_cancel = self.cancel_rx.clone();

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(async move { tracker.run(tracker_cancel).await }));
        tasks.push(tokio::spawn(
            async move { scheduler.run(scheduler_cancel).await },
        ));
        tasks.push(tokio::spawn(async move { inbox.run(inbox_cancel).await }));
        info!("notifier engine started");
    }

    /// Signal every task to stop and wait for them to finish.
    pub async fn shutdown(&self) {
        // Send only fails if every receiver is gone, which is the goal.
        let _ = self.cancel_tx.send(true);
        self.inbox.shutdown();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            if let Err(error) = task.await {
                warn!(%error, "orchestrator task ended abnormally");
            }
        }
        info!("notifier engine stopped");
    }
}
