//! Temporal scheduler.
//!
//! Detects conditions that arise from the passage of time rather than
//! from a state change: reservations about to start and tables occupied
//! past their allotment. The store answers each check with a claim-style
//! query that flags the rows it returns, so a condition fires exactly
//! once per entity regardless of how many ticks observe it.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{Duration, interval, sleep};
use tracing::{debug, info, warn};

use mesahub_core::config::NotifierConfig;
use mesahub_core::events::{DomainEvent, EventKind, RelatedEntityIds};
use mesahub_store::{EntityGateway, NotificationStore};

use crate::differ::tracked::{reservation_payload, table_payload};
use crate::emitter::Emitter;

/// Periodic checker for time-derived conditions.
pub struct TemporalScheduler {
    gateway: Arc<dyn EntityGateway>,
    emitter: Arc<Emitter>,
    store: Arc<dyn NotificationStore>,
    config: NotifierConfig,
}

impl TemporalScheduler {
    pub fn new(
        gateway: Arc<dyn EntityGateway>,
        emitter: Arc<Emitter>,
        store: Arc<dyn NotificationStore>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            gateway,
            emitter,
            store,
            config,
        }
    }

    /// Tick loop. Waits out the startup delay, then runs every check on a
    /// fixed interval until the cancel signal flips.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tokio::select! {
            _ = sleep(Duration::from_secs(self.config.scheduler_startup_delay_seconds)) => {}
            _ = cancel.changed() => {
                info!("temporal scheduler cancelled before first tick");
                return;
            }
        }

        let mut ticker = interval(Duration::from_secs(self.config.scheduler_interval_seconds));
        let mut ticks: u64 = 0;
        info!(
            interval_seconds = self.config.scheduler_interval_seconds,
            "temporal scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    ticks += 1;
                    self.run_once().await;
                    if self.config.cleanup_every_ticks > 0
                        && ticks % self.config.cleanup_every_ticks == 0
                    {
                        self.cleanup_pass().await;
                    }
                }
                _ = cancel.changed() => {
                    info!("temporal scheduler stopped");
                    return;
                }
            }
        }
    }

    /// One full pass over all temporal checks. Public so a single tick can
    /// be driven deterministically.
    pub async fn run_once(&self) {
        self.check_upcoming().await;
        self.check_overstays().await;
    }

    async fn check_upcoming(&self) {
        let due = match self
            .gateway
            .upcoming_reservations(
                self.config.upcoming_window_minutes,
                self.config.max_temporal_results,
            )
            .await
        {
            Ok(due) => due,
            Err(error) => {
                warn!(%error, "upcoming-reservation check failed, retrying next tick");
                return;
            }
        };
        if due.is_empty() {
            return;
        }
        debug!(count = due.len(), "reservations entering the upcoming window");

        let now = Utc::now();
        let events = due
            .iter()
            .map(|reservation| {
                let mut payload = reservation_payload(reservation);
                payload.insert(
                    "minutes_until".into(),
                    json!(reservation.minutes_until_start(now).max(0)),
                );
                let mut related = RelatedEntityIds::reservation(reservation.id);
                if let Some(customer_id) = reservation.customer_id {
                    related = related.with_customer(customer_id);
                }
                if let Some(table_id) = reservation.table_id {
                    related = related.with_table(table_id);
                }
                DomainEvent::new(EventKind::ReservationUpcoming, payload, related)
            })
            .collect();
        self.emitter.emit_all(events).await;
    }

    async fn check_overstays(&self) {
        let overstayed = match self
            .gateway
            .overstayed_tables(
                self.config.table_allotted_minutes,
                self.config.max_temporal_results,
            )
            .await
        {
            Ok(overstayed) => overstayed,
            Err(error) => {
                warn!(%error, "table-overstay check failed, retrying next tick");
                return;
            }
        };
        if overstayed.is_empty() {
            return;
        }
        debug!(count = overstayed.len(), "tables past their allotment");

        let now = Utc::now();
        let events = overstayed
            .iter()
            .map(|table| {
                let mut payload = table_payload(table);
                let occupied_minutes = table
                    .occupied_since
                    .map(|since| (now - since).num_minutes())
                    .unwrap_or(0);
                payload.insert("occupied_minutes".into(), json!(occupied_minutes));
                DomainEvent::new(
                    EventKind::TableOverstay,
                    payload,
                    RelatedEntityIds::table(table.id),
                )
            })
            .collect();
        self.emitter.emit_all(events).await;
    }

    async fn cleanup_pass(&self) {
        let window = chrono::Duration::minutes(self.config.dedup_window_minutes);
        match self.store.cleanup_duplicates(window).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "removed duplicate notifications"),
            Err(error) => warn!(%error, "duplicate-cleanup pass failed"),
        }
    }
}
