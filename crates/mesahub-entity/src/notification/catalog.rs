//! Notification type catalog entries.

use serde::{Deserialize, Serialize};

/// An immutable, process-wide catalog entry describing one notification type.
///
/// Seeded at startup from the remote `notification_types` table and cached
/// for the process lifetime; read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTypeDefinition {
    /// Stable type identifier, primary key.
    pub code: String,
    /// Human-readable name shown in settings screens.
    pub display_name: String,
    /// Icon token consumed by the rendering layer.
    pub icon: String,
    /// Color token consumed by the rendering layer.
    pub color: String,
    /// Whether notifications of this type may be emitted.
    pub active: bool,
}

impl NotificationTypeDefinition {
    /// Construct an active entry.
    pub fn new(
        code: impl Into<String>,
        display_name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            icon: icon.into(),
            color: color.into(),
            active: true,
        }
    }
}
