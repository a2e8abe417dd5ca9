//! In-memory store used by tests and local development.
//!
//! Mirrors the PostgreSQL implementation's semantics, including advisory
//! write-time deduplication and the server-side "newly entering the
//! window" scoping of the temporal queries.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::broadcast;

use async_trait::async_trait;

use mesahub_core::error::AppError;
use mesahub_core::events::RelatedEntityIds;
use mesahub_core::result::AppResult;
use mesahub_core::types::id::{CustomerId, NotificationId, ReservationId, TableId};
use mesahub_entity::customer::Customer;
use mesahub_entity::notification::{Notification, NotificationDraft, NotificationTypeDefinition};
use mesahub_entity::reservation::{Reservation, ReservationStatus};
use mesahub_entity::table::DiningTable;

use crate::traits::{
    EntityCollection, EntityGateway, NotificationFilter, NotificationStore, StoreChange,
};

/// In-memory implementation of both store seams.
#[derive(Debug)]
pub struct MemoryStore {
    dedup_window: Duration,
    notifications: DashMap<NotificationId, Notification>,
    reservations: DashMap<ReservationId, Reservation>,
    customers: DashMap<CustomerId, Customer>,
    tables: DashMap<TableId, DiningTable>,
    types: DashMap<String, NotificationTypeDefinition>,
    upcoming_flagged: DashSet<ReservationId>,
    overstay_flagged: DashSet<TableId>,
    store_tx: broadcast::Sender<StoreChange>,
    entity_tx: broadcast::Sender<EntityCollection>,
}

impl MemoryStore {
    /// Create an empty store with a 24h dedup window.
    pub fn new() -> Self {
        let (store_tx, _) = broadcast::channel(64);
        let (entity_tx, _) = broadcast::channel(64);
        Self {
            dedup_window: Duration::hours(24),
            notifications: DashMap::new(),
            reservations: DashMap::new(),
            customers: DashMap::new(),
            tables: DashMap::new(),
            types: DashMap::new(),
            upcoming_flagged: DashSet::new(),
            overstay_flagged: DashSet::new(),
            store_tx,
            entity_tx,
        }
    }

    /// Override the write-time dedup window.
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Seed the type catalog.
    pub fn seed_types(&self, types: Vec<NotificationTypeDefinition>) {
        for t in types {
            self.types.insert(t.code.clone(), t);
        }
    }

    /// Insert or replace a reservation and notify subscribers.
    pub fn upsert_reservation(&self, reservation: Reservation) {
        self.reservations.insert(reservation.id, reservation);
        let _ = self.entity_tx.send(EntityCollection::Reservations);
    }

    /// Insert or replace a customer and notify subscribers.
    pub fn upsert_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
        let _ = self.entity_tx.send(EntityCollection::Customers);
    }

    /// Insert or replace a table and notify subscribers.
    pub fn upsert_table(&self, table: DiningTable) {
        self.tables.insert(table.id, table);
        let _ = self.entity_tx.send(EntityCollection::Tables);
    }

    /// Number of stored notifications, read or unread.
    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    fn find_duplicate(&self, draft: &NotificationDraft) -> Option<Notification> {
        let now = Utc::now();
        self.notifications
            .iter()
            .filter(|n| {
                n.type_code == draft.type_code
                    && n.related == draft.related
                    && now - n.created_at < self.dedup_window
            })
            .min_by_key(|n| n.created_at)
            .map(|n| n.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, draft: NotificationDraft) -> AppResult<Notification> {
        if let Some(existing) = self.find_duplicate(&draft) {
            tracing::debug!(
                type_code = %draft.type_code,
                existing = %existing.id,
                "Draft deduplicated against existing notification"
            );
            return Ok(existing);
        }

        let notification = Notification::from_draft(draft, NotificationId::new(), Utc::now());
        self.notifications
            .insert(notification.id, notification.clone());
        let _ = self.store_tx.send(StoreChange::NotificationCreated);
        Ok(notification)
    }

    async fn list(&self, filter: NotificationFilter) -> AppResult<Vec<Notification>> {
        let mut items: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| !filter.unread_only || !n.is_read)
            .filter(|n| {
                filter
                    .type_code
                    .as_deref()
                    .map(|code| n.type_code == code)
                    .unwrap_or(true)
            })
            .map(|n| n.clone())
            .collect();

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        let mut entry = self
            .notifications
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
        if !entry.is_read {
            entry.mark_read(Utc::now());
            drop(entry);
            let _ = self.store_tx.send(StoreChange::NotificationUpdated);
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0u64;
        for mut entry in self.notifications.iter_mut() {
            if !entry.is_read {
                entry.mark_read(now);
                changed += 1;
            }
        }
        if changed > 0 {
            let _ = self.store_tx.send(StoreChange::NotificationUpdated);
        }
        Ok(changed)
    }

    async fn unread_count(&self) -> AppResult<i64> {
        Ok(self.notifications.iter().filter(|n| !n.is_read).count() as i64)
    }

    async fn cleanup_duplicates(&self, window: Duration) -> AppResult<u64> {
        let mut groups: HashMap<(String, RelatedEntityIds), Vec<Notification>> = HashMap::new();
        for n in self.notifications.iter() {
            groups
                .entry((n.type_code.clone(), n.related))
                .or_default()
                .push(n.clone());
        }

        let mut removed = 0u64;
        for (_, mut group) in groups {
            group.sort_by_key(|n| n.created_at);
            let mut kept = group[0].created_at;
            for n in group.iter().skip(1) {
                if n.created_at - kept < window {
                    self.notifications.remove(&n.id);
                    removed += 1;
                } else {
                    kept = n.created_at;
                }
            }
        }

        if removed > 0 {
            let _ = self.store_tx.send(StoreChange::NotificationUpdated);
        }
        Ok(removed)
    }

    async fn load_type_catalog(&self) -> AppResult<Vec<NotificationTypeDefinition>> {
        Ok(self.types.iter().map(|t| t.clone()).collect())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.store_tx.subscribe()
    }
}

#[async_trait]
impl EntityGateway for MemoryStore {
    async fn reservations(&self) -> AppResult<HashMap<ReservationId, Reservation>> {
        Ok(self
            .reservations
            .iter()
            .map(|r| (r.id, r.clone()))
            .collect())
    }

    async fn customers(&self) -> AppResult<HashMap<CustomerId, Customer>> {
        Ok(self.customers.iter().map(|c| (c.id, c.clone())).collect())
    }

    async fn tables(&self) -> AppResult<HashMap<TableId, DiningTable>> {
        Ok(self.tables.iter().map(|t| (t.id, t.clone())).collect())
    }

    async fn upcoming_reservations(
        &self,
        window_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<Reservation>> {
        let now = Utc::now();
        let window = Duration::minutes(window_minutes);

        let mut hits: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| {
                r.status == ReservationStatus::Confirmada
                    && r.starts_at > now
                    && r.starts_at - now <= window
                    && !self.upcoming_flagged.contains(&r.id)
            })
            .map(|r| r.clone())
            .collect();

        hits.sort_by_key(|r| r.starts_at);
        hits.truncate(max_results as usize);
        for r in &hits {
            self.upcoming_flagged.insert(r.id);
        }
        Ok(hits)
    }

    async fn overstayed_tables(
        &self,
        allotted_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<DiningTable>> {
        let now = Utc::now();
        let allotted = Duration::minutes(allotted_minutes);

        let mut hits: Vec<DiningTable> = self
            .tables
            .iter()
            .filter(|t| t.overstayed(allotted, now) && !self.overstay_flagged.contains(&t.id))
            .map(|t| t.clone())
            .collect();

        hits.sort_by_key(|t| t.occupied_since);
        hits.truncate(max_results as usize);
        for t in &hits {
            self.overstay_flagged.insert(t.id);
        }
        Ok(hits)
    }

    fn subscribe_entities(&self) -> broadcast::Receiver<EntityCollection> {
        self.entity_tx.subscribe()
    }
}
