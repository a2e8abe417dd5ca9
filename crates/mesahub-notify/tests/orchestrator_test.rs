//! End-to-end orchestrator tests against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Map;
use tokio::time::{sleep, Duration as StdDuration};

use mesahub_core::config::NotifierConfig;
use mesahub_core::events::{DomainEvent, EventKind, Priority, RelatedEntityIds};
use mesahub_core::result::AppResult;
use mesahub_core::types::id::{NotificationId, ReservationId, TableId};
use mesahub_entity::notification::{Notification, NotificationDraft, NotificationTypeDefinition};
use mesahub_entity::reservation::{Reservation, ReservationStatus};
use mesahub_entity::table::{DiningTable, TableState};
use mesahub_notify::delivery::{Inbox, InboxPhase};
use mesahub_notify::emitter::Emitter;
use mesahub_notify::engine::NotifierEngine;
use mesahub_notify::taxonomy::TypeCatalog;
use mesahub_notify::temporal::TemporalScheduler;
use mesahub_store::{MemoryStore, NotificationFilter, NotificationStore};

fn reservation(status: ReservationStatus, starts_in: Duration) -> Reservation {
    Reservation {
        id: ReservationId::new(),
        customer_id: None,
        customer_name: "Lucía Fernández".to_string(),
        table_id: None,
        party_size: 4,
        starts_at: Utc::now() + starts_in,
        status,
        notes: None,
        updated_at: Utc::now(),
    }
}

fn occupied_table(occupied_for: Duration) -> DiningTable {
    DiningTable {
        id: TableId::new(),
        name: "Mesa 7".to_string(),
        zone: "salón".to_string(),
        capacity: 4,
        state: TableState::Ocupada,
        occupied_since: Some(Utc::now() - occupied_for),
        updated_at: Utc::now(),
    }
}

fn emitter(store: &Arc<MemoryStore>) -> Arc<Emitter> {
    Arc::new(Emitter::new(
        store.clone(),
        Arc::new(TypeCatalog::builtin()),
    ))
}

fn confirmed_event(id: ReservationId) -> DomainEvent {
    let mut payload = Map::new();
    payload.insert("customer_name".into(), "Lucía Fernández".into());
    payload.insert("party_size".into(), 4.into());
    DomainEvent::new(
        EventKind::ReservationConfirmed,
        payload,
        RelatedEntityIds::reservation(id),
    )
}

#[tokio::test]
async fn write_time_dedup_collapses_repeat_events() {
    let store = Arc::new(MemoryStore::new());
    let emitter = emitter(&store);
    let id = ReservationId::new();

    let first = emitter.emit(confirmed_event(id)).await.unwrap();
    let second = emitter.emit(confirmed_event(id)).await.unwrap();

    assert_eq!(first.id, second.id, "duplicate draft must return the existing record");
    assert_eq!(store.notification_count(), 1);
}

#[tokio::test]
async fn cleanup_removes_duplicates_keeping_the_earliest() {
    // A zero dedup window disables write-time dedup, so duplicates
    // accumulate the way they would after a missed advisory check.
    let store = Arc::new(MemoryStore::new().with_dedup_window(Duration::zero()));
    let emitter = emitter(&store);
    let id = ReservationId::new();

    let first = emitter.emit(confirmed_event(id)).await.unwrap();
    emitter.emit(confirmed_event(id)).await.unwrap();
    emitter.emit(confirmed_event(id)).await.unwrap();
    assert_eq!(store.notification_count(), 3);

    let removed = store.cleanup_duplicates(Duration::minutes(60)).await.unwrap();
    assert_eq!(removed, 2);

    let remaining = store.list(NotificationFilter::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
}

#[tokio::test]
async fn status_transition_flows_to_a_stored_notification() {
    let store = Arc::new(MemoryStore::new());
    let engine = NotifierEngine::new(
        store.clone(),
        store.clone(),
        Arc::new(TypeCatalog::builtin()),
        NotifierConfig::default(),
    );

    let mut booked = reservation(ReservationStatus::PendienteConfirmacion, Duration::hours(3));
    store.upsert_reservation(booked.clone());

    engine.start().await;
    sleep(StdDuration::from_millis(200)).await;
    assert_eq!(store.notification_count(), 0, "priming must not emit");

    booked.status = ReservationStatus::Confirmada;
    store.upsert_reservation(booked.clone());
    sleep(StdDuration::from_millis(300)).await;

    let stored = store.list(NotificationFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].type_code, "reservation_confirmed");
    assert_eq!(stored[0].priority, Priority::Normal);
    assert_eq!(stored[0].related.reservation_id, Some(booked.id));

    engine.shutdown().await;
}

#[tokio::test]
async fn upcoming_check_fires_once_per_reservation() {
    let store = Arc::new(MemoryStore::new());
    let scheduler = TemporalScheduler::new(
        store.clone(),
        emitter(&store),
        store.clone(),
        NotifierConfig::default(),
    );

    store.upsert_reservation(reservation(
        ReservationStatus::Confirmada,
        Duration::minutes(10),
    ));
    // Outside the 15 minute window, must not fire.
    store.upsert_reservation(reservation(
        ReservationStatus::Confirmada,
        Duration::hours(2),
    ));
    // Unconfirmed, must not fire.
    store.upsert_reservation(reservation(
        ReservationStatus::Pendiente,
        Duration::minutes(10),
    ));

    scheduler.run_once().await;
    scheduler.run_once().await;

    let stored = store.list(NotificationFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1, "the same reservation must not fire twice");
    assert_eq!(stored[0].type_code, "reservation_upcoming");
    assert_eq!(stored[0].priority, Priority::High);
    assert!(stored[0].expires_at.is_some(), "upcoming notifications go stale");
    assert!(stored[0].message.contains("pax"));
}

#[tokio::test]
async fn overstay_check_fires_once_per_table() {
    let store = Arc::new(MemoryStore::new());
    let scheduler = TemporalScheduler::new(
        store.clone(),
        emitter(&store),
        store.clone(),
        NotifierConfig::default(),
    );

    store.upsert_table(occupied_table(Duration::minutes(150)));
    // Within the 120 minute allotment, must not fire.
    store.upsert_table(occupied_table(Duration::minutes(30)));

    scheduler.run_once().await;
    scheduler.run_once().await;

    let stored = store.list(NotificationFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].type_code, "table_overstay");
    assert_eq!(stored[0].priority, Priority::High);
}

#[tokio::test]
async fn read_state_lifecycle_holds_the_invariant() {
    let store = Arc::new(MemoryStore::new());
    let emitter = emitter(&store);

    let a = emitter.emit(confirmed_event(ReservationId::new())).await.unwrap();
    emitter.emit(confirmed_event(ReservationId::new())).await.unwrap();
    assert!(a.is_unread());
    assert!(a.read_at.is_none());
    assert_eq!(store.unread_count().await.unwrap(), 2);

    store.mark_read(a.id).await.unwrap();
    let listed = store.list(NotificationFilter::default()).await.unwrap();
    for n in &listed {
        assert_eq!(n.is_read, n.read_at.is_some(), "is_read must mirror read_at");
    }
    assert_eq!(store.unread_count().await.unwrap(), 1);

    assert_eq!(store.mark_all_read().await.unwrap(), 1);
    assert_eq!(store.unread_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_type_codes_are_dropped_not_defaulted() {
    let store = Arc::new(MemoryStore::new());
    // Catalog missing every reservation type.
    let catalog = TypeCatalog::from_definitions(vec![NotificationTypeDefinition::new(
        "table_overstay",
        "Mesa excedida",
        "clock",
        "red",
    )]);
    let emitter = Emitter::new(store.clone(), Arc::new(catalog));

    let emitted = emitter
        .emit_all(vec![confirmed_event(ReservationId::new())])
        .await;
    assert_eq!(emitted, 0);
    assert_eq!(store.notification_count(), 0);
}

/// Store wrapper that delays reads, for exercising teardown while a
/// refresh is in flight.
struct SlowStore {
    inner: Arc<MemoryStore>,
    delay: StdDuration,
}

#[async_trait::async_trait]
impl NotificationStore for SlowStore {
    async fn create(&self, draft: NotificationDraft) -> AppResult<Notification> {
        self.inner.create(draft).await
    }

    async fn list(&self, filter: NotificationFilter) -> AppResult<Vec<Notification>> {
        sleep(self.delay).await;
        self.inner.list(filter).await
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        self.inner.mark_read(id).await
    }

    async fn mark_all_read(&self) -> AppResult<u64> {
        self.inner.mark_all_read().await
    }

    async fn unread_count(&self) -> AppResult<i64> {
        self.inner.unread_count().await
    }

    async fn cleanup_duplicates(&self, window: Duration) -> AppResult<u64> {
        self.inner.cleanup_duplicates(window).await
    }

    async fn load_type_catalog(&self) -> AppResult<Vec<NotificationTypeDefinition>> {
        self.inner.load_type_catalog().await
    }

    fn subscribe_changes(&self) -> tokio::sync::broadcast::Receiver<mesahub_store::StoreChange> {
        self.inner.subscribe_changes()
    }
}

#[tokio::test]
async fn shutdown_discards_the_in_flight_refresh() {
    let memory = Arc::new(MemoryStore::new());
    memory
        .create(NotificationDraft {
            type_code: "reservation_created".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            priority: Priority::Normal,
            data: Map::new(),
            actions: Vec::new(),
            related: RelatedEntityIds::reservation(ReservationId::new()),
            expires_after: None,
        })
        .await
        .unwrap();

    let slow = Arc::new(SlowStore {
        inner: memory,
        delay: StdDuration::from_millis(200),
    });
    let inbox = Arc::new(Inbox::new(slow, &NotifierConfig::default()));

    let in_flight = {
        let inbox = inbox.clone();
        tokio::spawn(async move { inbox.refresh().await })
    };
    sleep(StdDuration::from_millis(50)).await;
    inbox.shutdown();
    in_flight.await.unwrap();

    let state = inbox.state().await;
    assert!(
        state.notifications.is_empty(),
        "a refresh completing after shutdown must not mutate the view"
    );
    assert_ne!(state.phase, InboxPhase::Ready);
}
