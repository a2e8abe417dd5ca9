//! Reservation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mesahub_core::types::id::{CustomerId, ReservationId, TableId};

use super::status::ReservationStatus;

/// A reservation as held in the tracked snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// The customer who made the reservation, if linked to the CRM.
    pub customer_id: Option<CustomerId>,
    /// Display name of the party, denormalized for rendering.
    pub customer_name: String,
    /// Assigned dining table, if any.
    pub table_id: Option<TableId>,
    /// Number of guests.
    pub party_size: i32,
    /// When the reservation starts.
    pub starts_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: ReservationStatus,
    /// Free-form staff notes.
    pub notes: Option<String>,
    /// Last modification time in the store.
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Minutes from `now` until the reservation starts (negative if past).
    pub fn minutes_until_start(&self, now: DateTime<Utc>) -> i64 {
        (self.starts_at - now).num_minutes()
    }
}
