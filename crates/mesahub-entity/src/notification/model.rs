//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mesahub_core::events::{Priority, RelatedEntityIds};
use mesahub_core::types::id::NotificationId;

use super::draft::NotificationDraft;

/// The durable, user-facing notification record.
///
/// Invariants: `is_read == false` implies `read_at == None` and vice versa;
/// `expires_at` is computed once at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Notification type code, resolved through the taxonomy registry.
    pub type_code: String,
    /// Rendered title.
    pub title: String,
    /// Rendered body text.
    pub message: String,
    /// Priority level.
    pub priority: Priority,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification expires, if ever.
    pub expires_at: Option<DateTime<Utc>>,
    /// Render-time payload.
    pub data: Map<String, Value>,
    /// Ordered suggested actions.
    pub actions: Vec<String>,
    /// Weak references to the entities involved.
    pub related: RelatedEntityIds,
}

impl Notification {
    /// Materialize a draft into a record, stamping id and creation time.
    pub fn from_draft(draft: NotificationDraft, id: NotificationId, now: DateTime<Utc>) -> Self {
        let expires_at = draft.expires_after.map(|d| now + d);
        Self {
            id,
            type_code: draft.type_code,
            title: draft.title,
            message: draft.message,
            priority: draft.priority,
            created_at: now,
            is_read: false,
            read_at: None,
            expires_at,
            data: draft.data,
            actions: draft.actions,
            related: draft.related,
        }
    }

    /// Mark the record read, keeping the read-state invariant.
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        self.is_read = true;
        self.read_at = Some(at);
    }

    /// Check if the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Check if the notification has expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesahub_core::events::{Priority, RelatedEntityIds};

    fn draft(expires_after: Option<chrono::Duration>) -> NotificationDraft {
        NotificationDraft {
            type_code: "reservation_confirmed".to_string(),
            title: "Reserva confirmada".to_string(),
            message: "García · 4 pax".to_string(),
            priority: Priority::Normal,
            data: Map::new(),
            actions: vec!["ver_reserva".to_string()],
            related: RelatedEntityIds::default(),
            expires_after,
        }
    }

    #[test]
    fn fresh_record_is_unread_with_no_read_at() {
        let n = Notification::from_draft(draft(None), NotificationId::new(), Utc::now());
        assert!(!n.is_read);
        assert!(n.read_at.is_none());
    }

    #[test]
    fn mark_read_sets_both_sides_of_the_invariant() {
        let mut n = Notification::from_draft(draft(None), NotificationId::new(), Utc::now());
        n.mark_read(Utc::now());
        assert!(n.is_read);
        assert!(n.read_at.is_some());
    }

    #[test]
    fn expires_at_is_created_at_plus_expiry() {
        let now = Utc::now();
        let n = Notification::from_draft(
            draft(Some(chrono::Duration::hours(2))),
            NotificationId::new(),
            now,
        );
        assert_eq!(n.expires_at, Some(now + chrono::Duration::hours(2)));
        assert!(!n.is_expired(now));
        assert!(n.is_expired(now + chrono::Duration::hours(3)));
    }
}
