//! Domain events consumed by the notification orchestrator.
//!
//! A [`DomainEvent`] is a transient, in-process description of a detected
//! state change (snapshot diff) or a temporal condition (scheduler check).
//! Durable notifications are derived from events by the emission façade;
//! events themselves are never persisted.

pub mod kind;
pub mod priority;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::id::{CustomerId, ReservationId, StaffId, TableId};

pub use kind::EventKind;
pub use priority::Priority;

/// Weak back-references from a notification to the entities it concerns.
///
/// These are used only for navigation and deduplication; a notification
/// never owns the referenced entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedEntityIds {
    /// The reservation this event concerns, if any.
    pub reservation_id: Option<ReservationId>,
    /// The customer this event concerns, if any.
    pub customer_id: Option<CustomerId>,
    /// The dining table this event concerns, if any.
    pub table_id: Option<TableId>,
    /// The staff member this event concerns, if any.
    pub staff_id: Option<StaffId>,
}

impl RelatedEntityIds {
    /// References pointing at a single reservation.
    pub fn reservation(id: ReservationId) -> Self {
        Self {
            reservation_id: Some(id),
            ..Self::default()
        }
    }

    /// References pointing at a single customer.
    pub fn customer(id: CustomerId) -> Self {
        Self {
            customer_id: Some(id),
            ..Self::default()
        }
    }

    /// References pointing at a single dining table.
    pub fn table(id: TableId) -> Self {
        Self {
            table_id: Some(id),
            ..Self::default()
        }
    }

    /// Attach a customer reference.
    pub fn with_customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    /// Attach a table reference.
    pub fn with_table(mut self, id: TableId) -> Self {
        self.table_id = Some(id);
        self
    }
}

/// A detected state change or temporal condition, ready for emission.
///
/// Priority, actions, and expiry are normally supplied by the taxonomy
/// registry's per-kind defaults; the optional fields here are overrides
/// for producers that know better (they are rarely needed).
#[derive(Debug, Clone)]
pub struct DomainEvent {
    /// Which kind of event this is. Must resolve through the taxonomy
    /// registry; unmapped kinds are dropped with a warning.
    pub kind: EventKind,
    /// Entity-specific data needed to render the notification message.
    pub payload: Map<String, Value>,
    /// Weak references to the entities involved.
    pub related: RelatedEntityIds,
    /// Priority override; `None` uses the registry default.
    pub priority: Option<Priority>,
    /// Suggested-action override; `None` uses the registry default.
    pub actions: Option<Vec<String>>,
    /// Expiry override; `None` uses the registry default.
    pub expires_after: Option<chrono::Duration>,
}

impl DomainEvent {
    /// Create an event with registry defaults for priority/actions/expiry.
    pub fn new(kind: EventKind, payload: Map<String, Value>, related: RelatedEntityIds) -> Self {
        Self {
            kind,
            payload,
            related,
            priority: None,
            actions: None,
            expires_after: None,
        }
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Override the default expiry.
    pub fn with_expires_after(mut self, expires_after: chrono::Duration) -> Self {
        self.expires_after = Some(expires_after);
        self
    }
}
