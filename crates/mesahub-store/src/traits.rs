//! Trait seams between the orchestrator and the remote data store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;

use mesahub_core::result::AppResult;
use mesahub_core::types::id::{CustomerId, NotificationId, ReservationId, TableId};
use mesahub_entity::customer::Customer;
use mesahub_entity::notification::{Notification, NotificationDraft, NotificationTypeDefinition};
use mesahub_entity::reservation::Reservation;
use mesahub_entity::table::DiningTable;

/// Push signal emitted when the durable notification record changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A notification row was inserted.
    NotificationCreated,
    /// A notification row was updated (read state, cleanup).
    NotificationUpdated,
}

/// Which tracked entity collection a change notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCollection {
    /// The reservations calendar.
    Reservations,
    /// The customer CRM.
    Customers,
    /// The table floor plan.
    Tables,
}

/// Filter for [`NotificationStore::list`].
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Only return unread notifications.
    pub unread_only: bool,
    /// Only return notifications of this type.
    pub type_code: Option<String>,
    /// Cap the number of returned rows.
    pub limit: Option<i64>,
}

/// CRUD façade over the durable notification record.
///
/// Any operation may fail with a transport error; callers treat failures
/// as skippable for the current tick and retry on the next one.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a draft. The store performs advisory server-side
    /// deduplication: a draft matching an existing notification's type
    /// code and related entity ids within the dedup window returns the
    /// existing record instead of inserting a new one.
    async fn create(&self, draft: NotificationDraft) -> AppResult<Notification>;

    /// List notifications ordered by creation time, newest first.
    async fn list(&self, filter: NotificationFilter) -> AppResult<Vec<Notification>>;

    /// Mark one notification as read.
    async fn mark_read(&self, id: NotificationId) -> AppResult<()>;

    /// Mark every unread notification as read. Returns how many changed.
    async fn mark_all_read(&self) -> AppResult<u64>;

    /// Count unread notifications.
    async fn unread_count(&self) -> AppResult<i64>;

    /// Collapse duplicates created within `window`, keeping the earliest
    /// of each duplicate group. Returns how many rows were removed.
    ///
    /// This is the self-healing pass: write-time deduplication is advisory
    /// and may miss duplicates under concurrent writers.
    async fn cleanup_duplicates(&self, window: chrono::Duration) -> AppResult<u64>;

    /// Load the notification type catalog seeded at startup.
    async fn load_type_catalog(&self) -> AppResult<Vec<NotificationTypeDefinition>>;

    /// Subscribe to push signals for notification changes.
    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange>;
}

/// Read-only gateway to the tracked domain collections.
///
/// Snapshot reads return the whole keyed collection; the windowed queries
/// are server-side scoped so that only entities newly entering the window
/// are returned (the flag lives in the store, not in this process).
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Current snapshot of the reservations collection.
    async fn reservations(&self) -> AppResult<HashMap<ReservationId, Reservation>>;

    /// Current snapshot of the customer collection.
    async fn customers(&self) -> AppResult<HashMap<CustomerId, Customer>>;

    /// Current snapshot of the floor-plan collection.
    async fn tables(&self) -> AppResult<HashMap<TableId, DiningTable>>;

    /// Confirmed reservations newly entering the upcoming window.
    /// Each reservation is returned at most once for its lifetime.
    async fn upcoming_reservations(
        &self,
        window_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<Reservation>>;

    /// Occupied tables newly exceeding their allotted duration.
    /// Each occupation is returned at most once.
    async fn overstayed_tables(
        &self,
        allotted_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<DiningTable>>;

    /// Subscribe to change notices for the tracked collections.
    fn subscribe_entities(&self) -> broadcast::Receiver<EntityCollection>;
}
