//! PostgreSQL store client.
//!
//! Implements both store seams over sqlx. Push signals ride on
//! LISTEN/NOTIFY: statement-level triggers (see the migrations) publish on
//! `mesahub_notifications` and `mesahub_entities`, and a background task
//! forwards them into in-process broadcast channels.

mod entities;
mod notifications;
mod rows;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use mesahub_core::config::notifier::NotifierConfig;
use mesahub_core::error::{AppError, ErrorKind};
use mesahub_core::result::AppResult;

use crate::traits::{EntityCollection, StoreChange};

/// Notification channel for durable-record changes.
const NOTIFICATIONS_CHANNEL: &str = "mesahub_notifications";
/// Notification channel for tracked-collection changes.
const ENTITIES_CHANNEL: &str = "mesahub_entities";

/// PostgreSQL-backed store client.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    dedup_window_minutes: i64,
    store_tx: broadcast::Sender<StoreChange>,
    entity_tx: broadcast::Sender<EntityCollection>,
}

impl PgStore {
    /// Create a store client over an existing pool.
    pub fn new(pool: PgPool, config: &NotifierConfig) -> Self {
        let (store_tx, _) = broadcast::channel(64);
        let (entity_tx, _) = broadcast::channel(64);
        Self {
            pool,
            dedup_window_minutes: config.dedup_window_minutes,
            store_tx,
            entity_tx,
        }
    }

    /// Reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start the LISTEN/NOTIFY forwarding task.
    ///
    /// Runs until the cancel signal flips to `true`. A lost connection is
    /// logged and retried; missed notices are harmless because the polling
    /// fallback converges anyway.
    pub async fn start_listener(
        &self,
        mut cancel: watch::Receiver<bool>,
    ) -> AppResult<JoinHandle<()>> {
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to open LISTEN connection: {e}"),
                e,
            )
        })?;

        listener
            .listen_all([NOTIFICATIONS_CHANNEL, ENTITIES_CHANNEL])
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to LISTEN on push channels: {e}"),
                    e,
                )
            })?;

        let store_tx = self.store_tx.clone();
        let entity_tx = self.entity_tx.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            tracing::debug!("Push listener received shutdown signal");
                            break;
                        }
                    }
                    received = listener.recv() => match received {
                        Ok(notice) => match notice.channel() {
                            NOTIFICATIONS_CHANNEL => {
                                let change = if notice.payload() == "insert" {
                                    StoreChange::NotificationCreated
                                } else {
                                    StoreChange::NotificationUpdated
                                };
                                let _ = store_tx.send(change);
                            }
                            ENTITIES_CHANNEL => {
                                let collection = match notice.payload() {
                                    "reservations" => Some(EntityCollection::Reservations),
                                    "customers" => Some(EntityCollection::Customers),
                                    "tables" => Some(EntityCollection::Tables),
                                    other => {
                                        tracing::warn!(payload = other, "Unknown entity notice");
                                        None
                                    }
                                };
                                if let Some(c) = collection {
                                    let _ = entity_tx.send(c);
                                }
                            }
                            other => {
                                tracing::warn!(channel = other, "Notice on unexpected channel");
                            }
                        },
                        Err(e) => {
                            tracing::warn!("Push listener connection error: {e}");
                            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        }
                    }
                }
            }
            tracing::debug!("Push listener stopped");
        });

        Ok(handle)
    }
}
