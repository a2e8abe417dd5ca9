//! Notification creation draft.

use serde_json::{Map, Value};

use mesahub_core::events::{Priority, RelatedEntityIds};

/// Everything needed to persist a notification, minus the parts the store
/// assigns at write time (id, creation timestamp, read state).
///
/// Only the emission façade constructs drafts; the UI never creates
/// notifications directly.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    /// Resolved notification type code.
    pub type_code: String,
    /// Rendered title.
    pub title: String,
    /// Rendered body text.
    pub message: String,
    /// Priority level.
    pub priority: Priority,
    /// Render-time payload, echo of the originating event's payload.
    pub data: Map<String, Value>,
    /// Ordered suggested actions.
    pub actions: Vec<String>,
    /// Weak references to the entities involved.
    pub related: RelatedEntityIds,
    /// Relative expiry; the store computes `expires_at` from this once,
    /// at creation.
    pub expires_after: Option<chrono::Duration>,
}
