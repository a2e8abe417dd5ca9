//! Customer entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mesahub_core::types::id::CustomerId;

/// A CRM customer as held in the tracked snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier.
    pub id: CustomerId,
    /// Full display name.
    pub full_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
    /// Whether the customer is flagged as VIP.
    pub is_vip: bool,
    /// Total recorded visits.
    pub visit_count: i32,
    /// Last modification time in the store.
    pub updated_at: DateTime<Utc>,
}
