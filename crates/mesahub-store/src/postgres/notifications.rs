//! `NotificationStore` implementation over PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use mesahub_core::error::AppError;
use mesahub_core::result::AppResult;
use mesahub_core::types::id::NotificationId;
use mesahub_entity::notification::{Notification, NotificationDraft, NotificationTypeDefinition};

use crate::traits::{NotificationFilter, NotificationStore, StoreChange};

use super::PgStore;
use super::rows::{db_err, notification_from_row, type_definition_from_row};

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, draft: NotificationDraft) -> AppResult<Notification> {
        // Advisory write-time dedup. Not transactional; the cleanup pass
        // collapses whatever slips through under concurrent writers.
        let existing = sqlx::query(
            "SELECT * FROM notifications \
             WHERE type_code = $1 \
               AND reservation_id IS NOT DISTINCT FROM $2 \
               AND customer_id IS NOT DISTINCT FROM $3 \
               AND table_id IS NOT DISTINCT FROM $4 \
               AND staff_id IS NOT DISTINCT FROM $5 \
               AND created_at > NOW() - make_interval(mins => $6) \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(&draft.type_code)
        .bind(draft.related.reservation_id)
        .bind(draft.related.customer_id)
        .bind(draft.related.table_id)
        .bind(draft.related.staff_id)
        .bind(self.dedup_window_minutes as i32)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| db_err("Failed to check for duplicate notification", e))?;

        if let Some(row) = existing {
            let kept = notification_from_row(&row)?;
            tracing::debug!(
                type_code = %draft.type_code,
                existing = %kept.id,
                "Draft deduplicated against existing notification"
            );
            return Ok(kept);
        }

        let notification = Notification::from_draft(draft, NotificationId::new(), Utc::now());

        sqlx::query(
            "INSERT INTO notifications \
             (id, type_code, title, message, priority, created_at, is_read, read_at, \
              expires_at, data, actions, reservation_id, customer_id, table_id, staff_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(notification.id)
        .bind(&notification.type_code)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.priority.as_str())
        .bind(notification.created_at)
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.expires_at)
        .bind(serde_json::Value::Object(notification.data.clone()))
        .bind(serde_json::to_value(&notification.actions)?)
        .bind(notification.related.reservation_id)
        .bind(notification.related.customer_id)
        .bind(notification.related.table_id)
        .bind(notification.related.staff_id)
        .execute(self.pool())
        .await
        .map_err(|e| db_err("Failed to create notification", e))?;

        Ok(notification)
    }

    async fn list(&self, filter: NotificationFilter) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications \
             WHERE ($1::bool IS FALSE OR NOT is_read) \
               AND ($2::text IS NULL OR type_code = $2) \
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(filter.unread_only)
        .bind(filter.type_code)
        .bind(filter.limit.unwrap_or(200))
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_err("Failed to list notifications", e))?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(|e| db_err("Failed to mark notification read", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE NOT is_read",
        )
        .execute(self.pool())
        .await
        .map_err(|e| db_err("Failed to mark all read", e))?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE NOT is_read")
            .fetch_one(self.pool())
            .await
            .map_err(|e| db_err("Failed to count unread", e))
    }

    async fn cleanup_duplicates(&self, window: chrono::Duration) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications dup USING notifications keep \
             WHERE dup.id <> keep.id \
               AND dup.type_code = keep.type_code \
               AND dup.reservation_id IS NOT DISTINCT FROM keep.reservation_id \
               AND dup.customer_id IS NOT DISTINCT FROM keep.customer_id \
               AND dup.table_id IS NOT DISTINCT FROM keep.table_id \
               AND dup.staff_id IS NOT DISTINCT FROM keep.staff_id \
               AND keep.created_at < dup.created_at \
               AND dup.created_at - keep.created_at < make_interval(mins => $1)",
        )
        .bind(window.num_minutes() as i32)
        .execute(self.pool())
        .await
        .map_err(|e| db_err("Failed to clean up duplicates", e))?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "Collapsed duplicate notifications");
        }
        Ok(removed)
    }

    async fn load_type_catalog(&self) -> AppResult<Vec<NotificationTypeDefinition>> {
        let rows = sqlx::query("SELECT * FROM notification_types")
            .fetch_all(self.pool())
            .await
            .map_err(|e| db_err("Failed to load type catalog", e))?;

        rows.iter().map(type_definition_from_row).collect()
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.store_tx.subscribe()
    }
}
